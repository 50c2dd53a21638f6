use anyhow::{Result, bail};
use log::{debug, trace, warn};

use crate::process::quantize::check_bits;
use crate::process::{EngineState, Fill, Filled, WindowEnd, completed_bytes, window_bytes};
use crate::structs::alignment::{AlignCounter, Alignment};
use crate::structs::repeat::{Repeat, RepeatCounter};
use crate::utils::bits::{BitAccumulator, BitEmitter, ByteSink};
use crate::utils::errors::{ConfigError, StreamError};
use crate::utils::source::SourceRef;

/// Per-source sample width and input alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    pub bits_in: u32,
    pub alignment: Alignment,
}

/// Validated construction parameters of an [`Interleaver`].
///
/// `sources` is ordered; the order fixes the byte layout of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleaveConfig {
    pub sources: Vec<SourceSpec>,
    pub output_align: Alignment,
    pub repeat: Repeat,
}

impl InterleaveConfig {
    /// `count` sources of `bits_in` bits, no alignment, unbounded.
    pub fn uniform(count: usize, bits_in: u32) -> Self {
        Self {
            sources: vec![
                SourceSpec {
                    bits_in,
                    alignment: Alignment::never(),
                };
                count
            ],
            output_align: Alignment::never(),
            repeat: Repeat::Unbounded,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!(ConfigError::NoDataSource);
        }

        for spec in &self.sources {
            check_bits("InputBits", spec.bits_in)?;
            if spec.alignment.unit_bits == 0 {
                bail!(ConfigError::OutOfRange {
                    name: "InputAlignBits",
                    value: 0,
                    expected: "a positive integer",
                });
            }
        }

        if self.output_align.unit_bits == 0 {
            bail!(ConfigError::OutOfRange {
                name: "OutputAlignBits",
                value: 0,
                expected: "a positive integer",
            });
        }

        Ok(())
    }

    /// Bits one composite window contributes to the output.
    pub fn composite_bits(&self) -> u64 {
        self.sources.iter().map(|s| s.bits_in as u64).sum()
    }
}

/// One configured data source with its own input residual.
#[derive(Debug)]
struct Lane<'a> {
    bits_in: u32,
    input: BitAccumulator,
    align: AlignCounter,
    source: SourceRef<'a>,
}

/// Multi-source interleaving decoder.
///
/// Every composite window takes one `bits_in[i]`-bit sample from each source
/// in order and appends it, unscaled, to a single output bit stream. Sources
/// have independent input alignment; output alignment and the repeat count
/// are shared. The engine is exhausted as soon as any one source runs dry.
///
/// A composite window is all or nothing. When a source runs dry partway
/// through one, the samples already taken from earlier sources in that window
/// are withdrawn from the output. [`Resampler`](super::resample::Resampler)
/// differs here: it keeps the samples of a cut-short window that it had
/// already written.
///
/// # Example
///
/// ```rust
/// use bitsamp::process::Fill;
/// use bitsamp::process::interleave::{InterleaveConfig, Interleaver};
/// use bitsamp::utils::source::{SliceSource, SourceRef};
///
/// let sources = vec![
///     SourceRef::owned(SliceSource::new(&[0xAB])),
///     SourceRef::owned(SliceSource::new(&[0x12])),
/// ];
/// let mut interleaver = Interleaver::new(sources, &InterleaveConfig::uniform(2, 4))?;
///
/// let mut out = [0u8; 4];
/// let filled = interleaver.fill(&mut out)?;
/// assert_eq!(&out[..filled.len], &[0xA1, 0xB2]);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Interleaver<'a> {
    lanes: Vec<Lane<'a>>,
    output: BitEmitter,
    output_align: AlignCounter,
    repeat: RepeatCounter,
    composite_bits: u64,
    min_len: usize,
    windows: u64,
    state: EngineState,
    end: Option<WindowEnd>,
    closed: bool,
}

impl<'a> Interleaver<'a> {
    pub fn new(sources: Vec<SourceRef<'a>>, config: &InterleaveConfig) -> Result<Self> {
        config.validate()?;

        if sources.len() != config.sources.len() {
            bail!(ConfigError::SourceCountMismatch {
                expected: config.sources.len(),
                actual: sources.len(),
            });
        }

        let composite_bits = config.composite_bits();
        let output_align = AlignCounter::new(&config.output_align, composite_bits);
        let min_len = window_bytes(composite_bits + output_align.padding_bits());

        let lanes: Vec<_> = sources
            .into_iter()
            .zip(&config.sources)
            .map(|(source, spec)| Lane {
                bits_in: spec.bits_in,
                input: BitAccumulator::default(),
                align: AlignCounter::new(&spec.alignment, spec.bits_in as u64),
                source,
            })
            .collect();

        debug!(
            "Interleaver: {} sources, {composite_bits} bits per composite window, \
             output padding {}, {:?}",
            lanes.len(),
            output_align.padding_bits(),
            config.repeat,
        );
        for (i, lane) in lanes.iter().enumerate() {
            debug!(
                "  source {i}: {} bits, input padding {}, owned = {}",
                lane.bits_in,
                lane.align.padding_bits(),
                lane.source.owns_source()
            );
        }

        Ok(Self {
            lanes,
            output: BitEmitter::default(),
            output_align,
            repeat: RepeatCounter::new(config.repeat),
            composite_bits,
            min_len,
            windows: 0,
            state: EngineState::Constructed,
            end: None,
            closed: false,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn source_count(&self) -> usize {
        self.lanes.len()
    }

    /// Composite windows completed so far.
    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Closes every owned source. Dropping the engine does the same, logging failures.
    pub fn close(mut self) -> std::io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_error = None;
        for lane in &mut self.lanes {
            if let Err(e) = lane.source.close_if_owned() {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn run(&mut self, sink: &mut ByteSink) -> std::io::Result<WindowEnd> {
        while sink.remaining() > 0 {
            let bits = self.composite_bits + self.output_align.pending();
            if completed_bytes(self.output.valid_bits(), bits) > sink.remaining() {
                break;
            }

            let end = self.window(sink)?;
            if end != WindowEnd::Continue {
                return Ok(end);
            }
        }

        Ok(WindowEnd::Continue)
    }

    /// One composite window. A window cut short by a dry source is withdrawn
    /// from the output.
    #[inline(always)]
    fn window(&mut self, sink: &mut ByteSink) -> std::io::Result<WindowEnd> {
        let start = sink.written();
        let residual = self.output;

        for lane in &mut self.lanes {
            let source = lane.source.as_dyn();

            let Some(sample) = lane.input.pull(source, lane.bits_in)? else {
                sink.rewind(start);
                self.output = residual;
                return Ok(WindowEnd::EndOfData);
            };
            self.output.push(sink, sample, lane.bits_in);

            if let Some(padding) = lane.align.tick() {
                if !lane.input.skip(source, padding)? {
                    sink.rewind(start);
                    self.output = residual;
                    return Ok(WindowEnd::EndOfData);
                }
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

impl Fill for Interleaver<'_> {
    fn fill(&mut self, out: &mut [u8]) -> Result<Filled> {
        if self.state == EngineState::Exhausted {
            return Ok(Filled::end(0));
        }

        if out.len() < self.min_len {
            bail!(StreamError::BufferTooSmall {
                needed: self.min_len,
                available: out.len(),
            });
        }
        let mut sink = ByteSink::new(out);

        if self.end.is_none() {
            self.state = EngineState::Filling;

            let end = self.run(&mut sink).map_err(|source| StreamError::Read {
                written: sink.written(),
                source,
            })?;
            if end != WindowEnd::Continue {
                self.end = Some(end);
            }
        }

        if let Some(end) = self.end {
            if self.output.valid_bits() == 0 || sink.remaining() > 0 {
                self.output.flush(&mut sink);
                self.state = EngineState::Exhausted;
                debug!(
                    "Interleaver exhausted ({end:?}) after {} composite windows",
                    self.windows
                );
            }
        }

        trace!(
            "Interleaver fill: {} bytes written, {} composite windows total",
            sink.written(),
            self.windows
        );

        Ok(Filled {
            len: sink.written(),
            end: self.state == EngineState::Exhausted,
        })
    }

    fn min_buffer_len(&self) -> usize {
        self.min_len
    }

    fn is_exhausted(&self) -> bool {
        self.state == EngineState::Exhausted
    }
}

impl Drop for Interleaver<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to close interleaver source: {e}");
        }
    }
}
