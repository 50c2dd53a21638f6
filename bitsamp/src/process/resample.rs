use anyhow::{Result, bail};
use log::{debug, trace, warn};

use crate::process::quantize::{QuantTable, check_bits};
use crate::process::{EngineState, Fill, Filled, Tally, WindowEnd, completed_bytes, window_bytes};
use crate::structs::alignment::{AlignCounter, Alignment};
use crate::structs::repeat::{Repeat, RepeatCounter};
use crate::utils::bits::{BitAccumulator, BitEmitter, ByteSink};
use crate::utils::errors::{ConfigError, StreamError};
use crate::utils::source::SourceRef;

/// Layout of one input window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub samples: u32,
    pub bits_before: u32,
    pub bits_after: u32,
}

impl WindowSpec {
    pub fn input_bits(&self, bits_in: u32) -> u64 {
        self.bits_before as u64 + bits_in as u64 * self.samples as u64 + self.bits_after as u64
    }

    pub fn output_bits(&self, bits_out: u32) -> u64 {
        bits_out as u64 * self.samples as u64
    }
}

/// Validated construction parameters of a [`Resampler`].
///
/// Usually produced by [`ResampleParams::validate`](crate::structs::params::ResampleParams::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleConfig {
    pub bits_in: u32,
    pub bits_out: u32,
    pub window: WindowSpec,
    pub input_align: Alignment,
    pub output_align: Alignment,
    pub repeat: Repeat,
    /// Reposition the source to where the previous fill stopped before every fill.
    pub seek_source: bool,
    /// Explicit lookup table; linear rescaling when absent.
    pub mapping: Option<Vec<u32>>,
}

impl ResampleConfig {
    /// `samples` samples per window, no padding, no alignment, unbounded.
    pub fn new(bits_in: u32, bits_out: u32, samples: u32) -> Self {
        Self {
            bits_in,
            bits_out,
            window: WindowSpec {
                samples,
                bits_before: 0,
                bits_after: 0,
            },
            input_align: Alignment::never(),
            output_align: Alignment::never(),
            repeat: Repeat::Unbounded,
            seek_source: false,
            mapping: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.quant_table().map(|_| ())
    }

    fn quant_table(&self) -> Result<QuantTable> {
        check_bits("InputBits", self.bits_in)?;
        if self.window.samples == 0 {
            bail!(ConfigError::OutOfRange {
                name: "Samples",
                value: 0,
                expected: "a positive integer",
            });
        }
        if self.input_align.unit_bits == 0 {
            bail!(ConfigError::OutOfRange {
                name: "InputAlignBits",
                value: 0,
                expected: "a positive integer",
            });
        }
        check_bits("OutputBits", self.bits_out)?;
        if self.output_align.unit_bits == 0 {
            bail!(ConfigError::OutOfRange {
                name: "OutputAlignBits",
                value: 0,
                expected: "a positive integer",
            });
        }

        match &self.mapping {
            Some(mapping) => QuantTable::from_mapping(self.bits_in, self.bits_out, mapping),
            None => QuantTable::linear(self.bits_in, self.bits_out),
        }
    }
}

/// Everything but the source, so a window can borrow both at once.
#[derive(Debug)]
struct ResampleCore {
    table: QuantTable,
    window: WindowSpec,
    input: BitAccumulator,
    output: BitEmitter,
    input_align: AlignCounter,
    output_align: AlignCounter,
    repeat: RepeatCounter,
    out_bits: u64,
    min_len: usize,
    windows: u64,
}

impl ResampleCore {
    /// Runs windows while the next one's completed bytes fit in `sink`.
    fn run(&mut self, source: &mut Tally, sink: &mut ByteSink) -> std::io::Result<WindowEnd> {
        while sink.remaining() > 0 {
            let bits = self.out_bits + self.output_align.pending();
            if completed_bytes(self.output.valid_bits(), bits) > sink.remaining() {
                break;
            }

            let end = self.window(source, sink)?;
            if end != WindowEnd::Continue {
                return Ok(end);
            }
        }

        Ok(WindowEnd::Continue)
    }

    #[inline(always)]
    fn window(&mut self, source: &mut Tally, sink: &mut ByteSink) -> std::io::Result<WindowEnd> {
        let bits_in = self.table.bits_in();
        let bits_out = self.table.bits_out();

        if !self.input.skip(source, self.window.bits_before as u64)? {
            return Ok(WindowEnd::EndOfData);
        }

        for _ in 0..self.window.samples {
            let Some(sample) = self.input.pull(source, bits_in)? else {
                return Ok(WindowEnd::EndOfData);
            };
            self.output.push(sink, self.table.get(sample), bits_out);
        }

        if !self.input.skip(source, self.window.bits_after as u64)? {
            return Ok(WindowEnd::EndOfData);
        }

        if let Some(padding) = self.input_align.tick() {
            if !self.input.skip(source, padding)? {
                return Ok(WindowEnd::EndOfData);
            }
        }

        if let Some(padding) = self.output_align.tick() {
            self.output.pad(sink, padding);
        }

        self.windows += 1;
        if self.repeat.tick() {
            return Ok(WindowEnd::RepeatDone);
        }

        Ok(WindowEnd::Continue)
    }
}

/// Single-source windowed resampling decoder.
///
/// Each window skips `bits_before` bits, reads `samples` samples of `bits_in`
/// bits, maps each through a [`QuantTable`] and writes it back as `bits_out`
/// bits, then skips `bits_after` bits. Periodic input and output alignment
/// padding and a bounded repeat count are applied between windows.
///
/// # Example
///
/// ```rust
/// use bitsamp::process::Fill;
/// use bitsamp::process::resample::{ResampleConfig, Resampler};
/// use bitsamp::structs::repeat::Repeat;
/// use bitsamp::utils::source::{SliceSource, SourceRef};
///
/// let mut config = ResampleConfig::new(4, 8, 2);
/// config.repeat = Repeat::from_count(1);
///
/// let mut resampler = Resampler::new(SourceRef::owned(SliceSource::new(&[0x3F])), &config)?;
///
/// let mut out = [0u8; 8];
/// let filled = resampler.fill(&mut out)?;
/// assert!(filled.end);
/// assert_eq!(&out[..filled.len], &[0x33, 0xFF]);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Resampler<'a> {
    source: SourceRef<'a>,
    core: ResampleCore,
    seek_offset: Option<u64>,
    state: EngineState,
    /// Why the window loop stopped for good, once it has.
    end: Option<WindowEnd>,
    closed: bool,
}

impl<'a> Resampler<'a> {
    pub fn new(mut source: SourceRef<'a>, config: &ResampleConfig) -> Result<Self> {
        let table = config.quant_table()?;

        let in_bits = config.window.input_bits(config.bits_in);
        let out_bits = config.window.output_bits(config.bits_out);
        let input_align = AlignCounter::new(&config.input_align, in_bits);
        let output_align = AlignCounter::new(&config.output_align, out_bits);

        let seek_offset = if config.seek_source {
            Some(source.as_dyn().position().map_err(StreamError::Position)?)
        } else {
            None
        };

        let min_len = window_bytes(out_bits + output_align.padding_bits());

        debug!(
            "Resampler: {} -> {} bits, {} samples per window ({in_bits} bits in, {out_bits} bits out), \
             padding {} in / {} out, {:?}, seek offset {seek_offset:?}",
            config.bits_in,
            config.bits_out,
            config.window.samples,
            input_align.padding_bits(),
            output_align.padding_bits(),
            config.repeat,
        );

        Ok(Self {
            source,
            core: ResampleCore {
                table,
                window: config.window,
                input: BitAccumulator::default(),
                output: BitEmitter::default(),
                input_align,
                output_align,
                repeat: RepeatCounter::new(config.repeat),
                out_bits,
                min_len,
                windows: 0,
            },
            seek_offset,
            state: EngineState::Constructed,
            end: None,
            closed: false,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn table(&self) -> &QuantTable {
        &self.core.table
    }

    /// Windows completed so far.
    pub fn windows(&self) -> u64 {
        self.core.windows
    }

    /// Byte offset the next fill reseeks to, when `seek_source` is enabled.
    pub fn seek_offset(&self) -> Option<u64> {
        self.seek_offset
    }

    /// Closes the source if owned. Dropping the engine does the same, logging failures.
    pub fn close(mut self) -> std::io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close_if_owned()
    }
}

impl Fill for Resampler<'_> {
    fn fill(&mut self, out: &mut [u8]) -> Result<Filled> {
        if self.state == EngineState::Exhausted {
            return Ok(Filled::end(0));
        }

        if out.len() < self.core.min_len {
            bail!(StreamError::BufferTooSmall {
                needed: self.core.min_len,
                available: out.len(),
            });
        }

        let mut sink = ByteSink::new(out);

        if self.end.is_none() {
            if let Some(offset) = self.seek_offset {
                self.source
                    .as_dyn()
                    .seek(offset)
                    .map_err(|source| StreamError::Reseek { offset, source })?;
            }
            self.state = EngineState::Filling;

            let mut source = Tally::new(self.source.as_dyn());

            let result = self.core.run(&mut source, &mut sink);
            if let Some(offset) = &mut self.seek_offset {
                *offset += source.pulled;
            }

            let end = result.map_err(|source| StreamError::Read {
                written: sink.written(),
                source,
            })?;

            if end != WindowEnd::Continue {
                self.end = Some(end);
            }
        }

        // The residual byte may have to wait for the next buffer
        if let Some(end) = self.end {
            if self.core.output.valid_bits() == 0 || sink.remaining() > 0 {
                self.core.output.flush(&mut sink);
                self.state = EngineState::Exhausted;
                debug!(
                    "Resampler exhausted ({end:?}) after {} windows",
                    self.core.windows
                );
            }
        }

        trace!(
            "Resampler fill: {} bytes written, {} windows total",
            sink.written(),
            self.core.windows
        );

        Ok(Filled {
            len: sink.written(),
            end: self.state == EngineState::Exhausted,
        })
    }

    fn min_buffer_len(&self) -> usize {
        self.core.min_len
    }

    fn is_exhausted(&self) -> bool {
        self.state == EngineState::Exhausted
    }
}

impl Drop for Resampler<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to close resampler source: {e}");
        }
    }
}
