use std::io;

use anyhow::Result;

use crate::utils::source::ByteSource;

/// Lookup tables mapping input sample values to output sample values.
///
/// Provides [`QuantTable`](quantize::QuantTable), built either from linear
/// rescaling or from an explicit mapping.
pub mod quantize;

/// Single-source windowed resampling decoder.
///
/// Provides the [`Resampler`](resample::Resampler), which extracts windows of
/// samples from one byte stream and rescales each through a lookup table.
pub mod resample;

/// Multi-source interleaving decoder.
///
/// Provides the [`Interleaver`](interleave::Interleaver), which concatenates
/// one sample from each of several byte streams per round.
pub mod interleave;

/// Pull-style adapter over any [`Fill`] engine.
pub mod reader;

/// Outcome of one [`Fill::fill`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filled {
    /// Bytes written to the front of the caller's buffer.
    pub len: usize,
    /// The engine is exhausted; later calls produce nothing.
    pub end: bool,
}

impl Filled {
    pub const fn more(len: usize) -> Self {
        Self { len, end: false }
    }

    pub const fn end(len: usize) -> Self {
        Self { len, end: true }
    }
}

/// A decode engine driven by repeated buffer fills.
///
/// Each call appends whole windows while the bytes the next window completes
/// still fit, carrying residual bits to the next call. A final residual that
/// finds the buffer full is flushed by the following call. Buffers must be at
/// least [`Fill::min_buffer_len`] bytes.
pub trait Fill {
    fn fill(&mut self, out: &mut [u8]) -> Result<Filled>;

    /// Bytes one window occupies, never less than the one byte of a flush.
    fn min_buffer_len(&self) -> usize;

    fn is_exhausted(&self) -> bool;
}

impl<F: Fill + ?Sized> Fill for &mut F {
    fn fill(&mut self, out: &mut [u8]) -> Result<Filled> {
        (**self).fill(out)
    }

    fn min_buffer_len(&self) -> usize {
        (**self).min_buffer_len()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Constructed,
    Filling,
    Exhausted,
}

/// Why a window loop stopped before the buffer filled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowEnd {
    Continue,
    /// A source ran dry inside the window.
    EndOfData,
    /// The last permitted window finished.
    RepeatDone,
}

/// `max(1, ceil(bits / 8))`: the most whole bytes one window of `bits` can
/// complete on top of a residual of up to 7 bits, and room for the final flush.
pub(crate) fn window_bytes(bits: u64) -> usize {
    (bits.div_ceil(8) as usize).max(1)
}

/// Whole bytes a window of `bits` completes on top of `residual` carried bits.
#[inline(always)]
pub(crate) fn completed_bytes(residual: u32, bits: u64) -> usize {
    ((residual as u64 + bits) / 8) as usize
}

/// Counts the bytes pulled through it.
pub(crate) struct Tally<'s> {
    inner: &'s mut dyn ByteSource,
    pub pulled: u64,
}

impl<'s> Tally<'s> {
    pub fn new(inner: &'s mut dyn ByteSource) -> Self {
        Self { inner, pulled: 0 }
    }
}

impl ByteSource for Tally<'_> {
    #[inline(always)]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.inner.next_byte()?;
        if byte.is_some() {
            self.pulled += 1;
        }
        Ok(byte)
    }
}

#[test]
fn window_bytes_is_one_window_or_the_flush() {
    assert_eq!(window_bytes(0), 1);
    assert_eq!(window_bytes(1), 1);
    assert_eq!(window_bytes(8), 1);
    assert_eq!(window_bytes(9), 2);
    assert_eq!(window_bytes(16), 2);
    assert_eq!(window_bytes(22), 3);
}

#[test]
fn window_bytes_bounds_every_residual() {
    for bits in 1..80u64 {
        for residual in 0..8 {
            assert!(completed_bytes(residual, bits) <= window_bytes(bits));
        }
    }
    assert_eq!(completed_bytes(7, 1), 1);
    assert_eq!(completed_bytes(4, 4), 1);
    assert_eq!(completed_bytes(3, 4), 0);
}
