#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! ### Windows
//!
//! A window is the unit both engines repeat. For the resampler it is
//! `BitsBefore` skipped bits, `Samples` extracted samples and `BitsAfter`
//! skipped bits. For the interleaver it is one sample from every source in
//! configuration order.
//!
//! ### Alignment
//!
//! After every `AlignRepeat` windows a stream is padded up to the next
//! multiple of `AlignBits`. Input padding is skipped; output padding is
//! written as zero bits. Multi-byte samples are big-endian, most significant
//! bit first.
//!
//! ### End of Stream
//!
//! An engine is exhausted when a source runs dry or the `Repeat` count is
//! reached. Leftover output bits are then flushed as one zero-filled byte and
//! every later `fill` returns nothing.
//!
//! ## Quick Start
//!
//! 1. Validate a parameter dictionary with
//!    [`structs::params::ResampleParams::validate`] or build a
//!    [`process::resample::ResampleConfig`] directly
//! 2. Wrap the input in a [`utils::source::SourceRef`]
//! 3. Call [`process::Fill::fill`] until it reports the end, or wrap the
//!    engine in a [`process::reader::FillReader`]
//!
//! ```rust
//! use bitsamp::process::{Fill, resample::Resampler};
//! use bitsamp::structs::params::ResampleParams;
//! use bitsamp::utils::source::{SliceSource, SourceRef};
//!
//! let params = ResampleParams {
//!     input_bits: 4,
//!     output_bits: Some(8),
//!     samples: Some(2),
//!     ..Default::default()
//! };
//! let config = params.validate()?;
//!
//! let data = [0x0F, 0xF0];
//! let mut resampler = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config)?;
//!
//! let mut out = vec![0u8; resampler.min_buffer_len().max(64)];
//! let mut decoded = Vec::new();
//! loop {
//!     let filled = resampler.fill(&mut out)?;
//!     decoded.extend_from_slice(&out[..filled.len]);
//!     if filled.end {
//!         break;
//!     }
//! }
//! assert_eq!(decoded, [0x00, 0xFF, 0xFF, 0x00]);
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Decode engines and the fill protocol they share.
///
/// 1. **Quantization** ([`process::quantize`]): Input to output sample tables.
///
/// 2. **Resampling** ([`process::resample`]): Single-source windowed decoding.
///
/// 3. **Interleaving** ([`process::interleave`]): Multi-source concatenation.
///
/// 4. **Reading** ([`process::reader`]): [`std::io::Read`] over any engine.
pub mod process;

/// Engine configuration.
///
/// - **Alignment** ([`structs::alignment`]): Periodic unit-boundary padding
/// - **Repeat** ([`structs::repeat`]): Window count limits
/// - **Parameters** ([`structs::params`]): Keyed dictionaries and validation
pub mod structs;

/// Supporting infrastructure.
///
/// - **Bit I/O** ([`utils::bits`]): Residual-carrying bit extraction and emission
/// - **Sources** ([`utils::source`]): Byte sources and ownership
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
