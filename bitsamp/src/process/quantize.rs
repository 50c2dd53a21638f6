//! Sample value lookup used by the resampler.
//!
//! Every possible input sample maps to an output sample, either through a
//! caller-supplied table or through linear rescaling between full scales.

use anyhow::{Result, bail};

use crate::utils::errors::ConfigError;

pub const MIN_BITS: u32 = 1;
pub const MAX_BITS: u32 = 16;

pub(crate) fn check_bits(name: &'static str, bits: u32) -> Result<()> {
    if !(MIN_BITS..=MAX_BITS).contains(&bits) {
        bail!(ConfigError::OutOfRange {
            name,
            value: bits as i64,
            expected: "between 1 and 16",
        });
    }
    Ok(())
}

/// Precomputed `2^bits_in`-entry lookup from input to output sample values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    bits_in: u32,
    bits_out: u32,
    entries: Box<[u16]>,
}

impl QuantTable {
    /// Linear rescale from `bits_in` to `bits_out` full scale, rounding to nearest.
    ///
    /// Evaluates `(i * maxout + maxin / 2) / maxin` in `u32`. The intermediate
    /// peaks at `65535 * 65535 + 32767`, which still fits.
    pub fn linear(bits_in: u32, bits_out: u32) -> Result<Self> {
        check_bits("InputBits", bits_in)?;
        check_bits("OutputBits", bits_out)?;

        let max_in: u32 = (1 << bits_in) - 1;
        let max_out: u32 = (1 << bits_out) - 1;

        let entries = (0..=max_in)
            .map(|i| ((i * max_out + max_in / 2) / max_in) as u16)
            .collect();

        Ok(Self {
            bits_in,
            bits_out,
            entries,
        })
    }

    /// Explicit table. Must hold exactly `2^bits_in` entries, each below `2^bits_out`.
    pub fn from_mapping(bits_in: u32, bits_out: u32, mapping: &[u32]) -> Result<Self> {
        check_bits("InputBits", bits_in)?;
        check_bits("OutputBits", bits_out)?;

        let expected = 1usize << bits_in;
        if mapping.len() != expected {
            bail!(ConfigError::MappingLength {
                expected,
                actual: mapping.len(),
            });
        }

        let max = (1u32 << bits_out) - 1;
        if let Some((index, &value)) = mapping.iter().enumerate().find(|&(_, &v)| v > max) {
            bail!(ConfigError::MappingEntryOutOfRange {
                index,
                value: value as i64,
                max,
            });
        }

        Ok(Self {
            bits_in,
            bits_out,
            entries: mapping.iter().map(|&v| v as u16).collect(),
        })
    }

    pub fn bits_in(&self) -> u32 {
        self.bits_in
    }

    pub fn bits_out(&self) -> u32 {
        self.bits_out
    }

    pub fn entries(&self) -> &[u16] {
        &self.entries
    }

    #[inline(always)]
    pub fn get(&self, sample: u32) -> u32 {
        self.entries[sample as usize] as u32
    }
}
