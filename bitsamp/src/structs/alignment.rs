//! Periodic re-synchronization of a bit position to a unit boundary.
//!
//! After every `n` windows the position has advanced `window_bits * n` bits;
//! padding the remainder up to the next multiple of `unit_bits` restores
//! alignment. The amount is fixed per stream, so it is computed once.

use std::num::NonZeroU32;

/// How often alignment padding is applied, counted in windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignCycle {
    #[default]
    Never,
    Every(NonZeroU32),
}

impl AlignCycle {
    /// Maps the parameter convention `0 = never`.
    pub fn from_interval(interval: u32) -> Self {
        NonZeroU32::new(interval).map_or(Self::Never, Self::Every)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub cycle: AlignCycle,
    pub unit_bits: u32,
}

impl Default for Alignment {
    fn default() -> Self {
        Self {
            cycle: AlignCycle::Never,
            unit_bits: 8,
        }
    }
}

impl Alignment {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn every(windows: u32, unit_bits: u32) -> Self {
        Self {
            cycle: AlignCycle::from_interval(windows),
            unit_bits,
        }
    }

    /// Bits needed after each cycle of windows of `window_bits` to reach a unit boundary.
    ///
    /// Zero for [`AlignCycle::Never`].
    pub fn padding_bits(&self, window_bits: u64) -> u64 {
        let AlignCycle::Every(windows) = self.cycle else {
            return 0;
        };

        let unit = self.unit_bits.max(1) as u128;
        let advanced = window_bits as u128 * windows.get() as u128;

        ((unit - advanced % unit) % unit) as u64
    }
}

/// Countdown that fires every cycle with the precomputed padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignCounter {
    period: Option<NonZeroU32>,
    remaining: u32,
    padding_bits: u64,
}

impl AlignCounter {
    pub fn new(alignment: &Alignment, window_bits: u64) -> Self {
        let period = match alignment.cycle {
            AlignCycle::Never => None,
            AlignCycle::Every(n) => Some(n),
        };

        Self {
            period,
            remaining: period.map_or(0, NonZeroU32::get),
            padding_bits: alignment.padding_bits(window_bits),
        }
    }

    pub fn padding_bits(&self) -> u64 {
        self.padding_bits
    }

    /// Padding the next [`tick`](Self::tick) will return, or zero.
    pub fn pending(&self) -> u64 {
        match self.period {
            Some(_) if self.remaining == 1 => self.padding_bits,
            _ => 0,
        }
    }

    /// Counts one finished window. Returns the padding to apply when the cycle completes.
    #[inline(always)]
    pub fn tick(&mut self) -> Option<u64> {
        let period = self.period?;

        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }

        self.remaining = period.get();
        Some(self.padding_bits)
    }
}

#[test]
fn padding_stays_below_unit() {
    for unit_bits in 1..=40 {
        for window_bits in 0..70 {
            for windows in 1..5 {
                let padding = Alignment::every(windows, unit_bits).padding_bits(window_bits);
                assert!(padding < unit_bits as u64);
                assert_eq!((window_bits * windows as u64 + padding) % unit_bits as u64, 0);
            }
        }
    }
}

#[test]
fn aligned_position_needs_no_padding() {
    assert_eq!(Alignment::every(1, 8).padding_bits(16), 0);
    assert_eq!(Alignment::every(4, 8).padding_bits(6), 0);
    assert_eq!(Alignment::every(3, 8).padding_bits(6), 6);
    assert_eq!(Alignment::every(1, 32).padding_bits(12), 20);
    assert_eq!(Alignment::never().padding_bits(3), 0);
}

#[test]
fn padding_survives_huge_products() {
    let alignment = Alignment::every(u32::MAX, 7);
    let window_bits = u64::MAX / 2;
    let expected = (7 - (window_bits as u128 * u32::MAX as u128) % 7) % 7;
    assert_eq!(alignment.padding_bits(window_bits) as u128, expected);
}

#[test]
fn counter_fires_once_per_cycle() {
    let mut counter = AlignCounter::new(&Alignment::every(3, 8), 4);
    let fired: Vec<_> = (0..7).map(|_| counter.tick()).collect();
    assert_eq!(
        fired,
        vec![None, None, Some(4), None, None, Some(4), None]
    );

    let mut never = AlignCounter::new(&Alignment::never(), 4);
    assert!((0..100).all(|_| never.tick().is_none()));
}

#[test]
fn pending_announces_the_next_tick() {
    let mut counter = AlignCounter::new(&Alignment::every(2, 8), 3);
    for _ in 0..3 {
        assert_eq!(counter.pending(), 0);
        assert_eq!(counter.tick(), None);
        assert_eq!(counter.pending(), 2);
        assert_eq!(counter.tick(), Some(2));
    }

    let mut every = AlignCounter::new(&Alignment::every(1, 8), 3);
    assert_eq!(every.pending(), 5);
    assert_eq!(every.tick(), Some(5));
    assert_eq!(every.pending(), 5);

    assert_eq!(AlignCounter::new(&Alignment::never(), 3).pending(), 0);
}
