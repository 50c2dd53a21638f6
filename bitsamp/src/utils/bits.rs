//! Residual-carrying bit primitives shared by both engines.
//!
//! [`BitAccumulator`] pulls arbitrary-width big-endian bit runs out of a
//! [`ByteSource`] and [`BitEmitter`] packs them back into bytes. Each keeps
//! fewer than 8 leftover bits between calls so a window can stop on any bit
//! boundary and the next `fill` resumes exactly there.

use std::io;

use crate::utils::source::ByteSource;

/// Widest single extraction or emission.
pub const MAX_WIDTH: u32 = 16;

#[inline(always)]
const fn mask(width: u32) -> u32 {
    (1 << width) - 1
}

/// Input residual: bits already pulled from the source but not yet consumed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BitAccumulator {
    value: u32,
    valid_bits: u32,
}

impl BitAccumulator {
    pub fn valid_bits(&self) -> u32 {
        self.valid_bits
    }

    /// Extracts `width` (1..=16) bits, or `None` when the source runs dry first.
    #[inline(always)]
    pub fn pull<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        width: u32,
    ) -> io::Result<Option<u32>> {
        debug_assert!((1..=MAX_WIDTH).contains(&width));

        while self.valid_bits < width {
            let Some(byte) = source.next_byte()? else {
                return Ok(None);
            };
            self.value = (self.value << 8) | byte as u32;
            self.valid_bits += 8;
        }

        self.valid_bits -= width;
        let bits = (self.value >> self.valid_bits) & mask(width);
        self.value &= mask(self.valid_bits);

        Ok(Some(bits))
    }

    /// Discards `bits` bits. Returns `false` when the source runs dry first.
    pub fn skip<S: ByteSource + ?Sized>(&mut self, source: &mut S, bits: u64) -> io::Result<bool> {
        let mut remaining = bits;
        while remaining > 0 {
            let width = remaining.min(MAX_WIDTH as u64) as u32;
            if self.pull(source, width)?.is_none() {
                return Ok(false);
            }
            remaining -= width as u64;
        }

        Ok(true)
    }
}

/// Bounded writer over the caller's output buffer.
#[derive(Debug)]
pub struct ByteSink<'o> {
    buf: &'o mut [u8],
    pos: usize,
}

impl<'o> ByteSink<'o> {
    pub fn new(buf: &'o mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline(always)]
    fn put(&mut self, byte: u8) {
        // Engines reserve room for a whole window before starting it
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    pub fn written(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Forgets everything written after `pos`.
    pub(crate) fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos);
        self.pos = pos;
    }
}

/// Output residual: bits queued for the next byte boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BitEmitter {
    value: u32,
    valid_bits: u32,
}

impl BitEmitter {
    pub fn valid_bits(&self) -> u32 {
        self.valid_bits
    }

    /// Appends the low `width` (1..=16) bits of `bits`, writing every completed byte.
    #[inline(always)]
    pub fn push(&mut self, sink: &mut ByteSink<'_>, bits: u32, width: u32) {
        debug_assert!((1..=MAX_WIDTH).contains(&width));

        self.value = (self.value << width) | (bits & mask(width));
        self.valid_bits += width;

        while self.valid_bits >= 8 {
            self.valid_bits -= 8;
            sink.put((self.value >> self.valid_bits) as u8);
        }
        self.value &= mask(self.valid_bits);
    }

    /// Appends `bits` zero bits.
    pub fn pad(&mut self, sink: &mut ByteSink<'_>, bits: u64) {
        let mut remaining = bits;
        while remaining > 0 {
            let width = remaining.min(MAX_WIDTH as u64) as u32;
            self.push(sink, 0, width);
            remaining -= width as u64;
        }
    }

    /// Writes any leftover bits as one left-justified, zero-filled byte.
    pub fn flush(&mut self, sink: &mut ByteSink<'_>) {
        if self.valid_bits > 0 {
            sink.put((self.value << (8 - self.valid_bits)) as u8);
        }
        *self = Self::default();
    }
}
