use std::num::NonZeroU64;

/// Number of windows an engine produces over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Unbounded,
    Bounded(NonZeroU64),
}

impl Repeat {
    /// Maps the parameter convention `0 = unbounded`.
    pub fn from_count(count: u64) -> Self {
        NonZeroU64::new(count).map_or(Self::Unbounded, Self::Bounded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RepeatCounter {
    remaining: Option<u64>,
}

impl RepeatCounter {
    pub fn new(repeat: Repeat) -> Self {
        Self {
            remaining: match repeat {
                Repeat::Unbounded => None,
                Repeat::Bounded(count) => Some(count.get()),
            },
        }
    }

    /// Counts one finished window. Returns `true` once the last permitted window is done.
    #[inline(always)]
    pub fn tick(&mut self) -> bool {
        match &mut self.remaining {
            None => false,
            Some(remaining) => {
                *remaining -= 1;
                *remaining == 0
            }
        }
    }
}

#[test]
fn bounded_counter_stops_at_count() {
    let mut counter = RepeatCounter::new(Repeat::from_count(3));
    assert_eq!(
        (0..3).map(|_| counter.tick()).collect::<Vec<_>>(),
        vec![false, false, true]
    );

    let mut counter = RepeatCounter::new(Repeat::from_count(0));
    assert!((0..1000).all(|_| !counter.tick()));
}
