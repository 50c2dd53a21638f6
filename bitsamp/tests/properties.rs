use bitsamp::process::interleave::{InterleaveConfig, Interleaver, SourceSpec};
use bitsamp::process::quantize::QuantTable;
use bitsamp::process::resample::{ResampleConfig, Resampler, WindowSpec};
use bitsamp::process::{Fill, Filled};
use bitsamp::structs::alignment::Alignment;
use bitsamp::structs::repeat::Repeat;
use bitsamp::utils::source::{SliceSource, SourceRef};
use proptest::prelude::*;

/// Drains `engine` with buffers cycling through `chunks`, each at least one window.
/// A chunk of `0` means exactly `min_buffer_len` bytes.
fn drain(engine: &mut impl Fill, chunks: &[usize]) -> Vec<u8> {
    let min = engine.min_buffer_len();
    let mut out = Vec::new();
    for &chunk in chunks.iter().cycle() {
        let mut buf = vec![0u8; chunk.max(min)];
        let Filled { len, end } = engine.fill(&mut buf).unwrap();
        out.extend_from_slice(&buf[..len]);
        if end {
            break;
        }
    }
    out
}

prop_compose! {
    fn resample_config()(
        bits_in in 1u32..=16,
        bits_out in 1u32..=16,
        samples in 1u32..6,
        bits_before in 0u32..20,
        bits_after in 0u32..20,
        input_align in (0u32..4, 1u32..33),
        output_align in (0u32..4, 1u32..33),
        repeat in 0u64..12,
    ) -> ResampleConfig {
        ResampleConfig {
            bits_in,
            bits_out,
            window: WindowSpec { samples, bits_before, bits_after },
            input_align: Alignment::every(input_align.0, input_align.1),
            output_align: Alignment::every(output_align.0, output_align.1),
            repeat: Repeat::from_count(repeat),
            seek_source: false,
            mapping: None,
        }
    }
}

// Linear tables never decrease and span the full output range
proptest! {
    #[test]
    fn prop_linear_table_monotonic(bits_in in 1u32..=16, bits_out in 1u32..=16) {
        let table = QuantTable::linear(bits_in, bits_out).unwrap();
        let entries = table.entries();

        prop_assert_eq!(entries.len(), 1 << bits_in);
        prop_assert!(entries.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(entries[0], 0);
        prop_assert_eq!(*entries.last().unwrap() as u32, (1u32 << bits_out) - 1);
    }

    #[test]
    fn prop_equal_depths_are_identity(bits in 1u32..=16) {
        let table = QuantTable::linear(bits, bits).unwrap();
        for (i, &entry) in table.entries().iter().enumerate() {
            prop_assert_eq!(entry as usize, i);
        }
    }
}

// Output does not depend on how the caller splits its buffers
proptest! {
    #[test]
    fn prop_resample_resumable(
        config in resample_config(),
        data in prop::collection::vec(any::<u8>(), 0..256),
        chunks in prop::collection::vec(1usize..40, 1..8),
    ) {
        let mut whole = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
        let expected = drain(&mut whole, &[1 << 16]);

        let mut split = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
        prop_assert_eq!(drain(&mut split, &chunks), expected);
        prop_assert_eq!(split.windows(), whole.windows());
    }

    #[test]
    fn prop_resample_deterministic(
        config in resample_config(),
        data in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let run = || {
            let mut engine =
                Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
            drain(&mut engine, &[64])
        };
        prop_assert_eq!(run(), run());
    }
}

// Buffers of exactly min_buffer_len bytes reproduce the single-fill output
proptest! {
    #[test]
    fn prop_resample_minimal_buffers(
        config in resample_config(),
        data in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let mut whole = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
        let expected = drain(&mut whole, &[1 << 16]);

        let mut tight = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
        prop_assert_eq!(drain(&mut tight, &[0]), expected);
    }

    #[test]
    fn prop_interleave_minimal_buffers(
        sources in prop::collection::vec((1u32..=16, prop::collection::vec(any::<u8>(), 0..24)), 1..4),
        output_align in (0u32..4, 1u32..33),
    ) {
        let config = InterleaveConfig {
            sources: sources
                .iter()
                .map(|(bits_in, _)| SourceSpec { bits_in: *bits_in, alignment: Alignment::never() })
                .collect(),
            output_align: Alignment::every(output_align.0, output_align.1),
            repeat: Repeat::Unbounded,
        };
        let engine = || {
            let refs = sources
                .iter()
                .map(|(_, data)| SourceRef::owned(SliceSource::new(data)))
                .collect();
            Interleaver::new(refs, &config).unwrap()
        };

        let expected = drain(&mut engine(), &[1 << 16]);
        prop_assert_eq!(drain(&mut engine(), &[0]), expected);
    }
}

// A bounded repeat stops after exactly that many windows when data suffices
proptest! {
    #[test]
    fn prop_bounded_repeat_exact(
        bits_in in 1u32..=16,
        bits_out in 1u32..=16,
        samples in 1u32..5,
        count in 1u64..20,
    ) {
        let data = vec![0x5Au8; 256];
        let config = ResampleConfig {
            repeat: Repeat::from_count(count),
            ..ResampleConfig::new(bits_in, bits_out, samples)
        };

        let mut engine = Resampler::new(SourceRef::owned(SliceSource::new(&data)), &config).unwrap();
        let out = drain(&mut engine, &[32]);

        prop_assert_eq!(engine.windows(), count);
        let bits = count * samples as u64 * bits_out as u64;
        prop_assert_eq!(out.len() as u64, bits.div_ceil(8));
    }
}

// Interleaving ends with the shortest source, whichever position it holds
proptest! {
    #[test]
    fn prop_interleave_stops_at_shortest(
        sources in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..24), 1..5),
    ) {
        let refs = sources
            .iter()
            .map(|d| SourceRef::owned(SliceSource::new(d)))
            .collect();
        let mut engine = Interleaver::new(refs, &InterleaveConfig::uniform(sources.len(), 8)).unwrap();
        let out = drain(&mut engine, &[7]);

        let rounds = sources.iter().map(Vec::len).min().unwrap_or(0);
        let expected: Vec<u8> = (0..rounds)
            .flat_map(|r| sources.iter().map(move |s| s[r]))
            .collect();

        prop_assert_eq!(out, expected);
        prop_assert_eq!(engine.windows(), rounds as u64);
    }
}

// Alignment padding reaches the next unit boundary without overshooting
proptest! {
    #[test]
    fn prop_padding_below_unit(
        window_bits in any::<u64>(),
        windows in 1u32..,
        unit_bits in 1u32..,
    ) {
        let padding = Alignment::every(windows, unit_bits).padding_bits(window_bits);
        let unit = unit_bits as u128;

        prop_assert!((padding as u128) < unit);
        prop_assert_eq!((window_bits as u128 * windows as u128 + padding as u128) % unit, 0);
        if (window_bits as u128 * windows as u128) % unit == 0 {
            prop_assert_eq!(padding, 0);
        }
    }
}
