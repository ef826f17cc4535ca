//! Clock counts.

use std::fmt;
use std::ops::{Add, AddAssign};

/// A monotonic count of processor clocks.
///
/// Counters saturate instead of wrapping: a session that has run long
/// enough to exhaust 64 bits reports `u64::MAX` forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Clocks elapsed since `earlier`, zero if `earlier` is later.
    #[must_use]
    pub const fn since(self, earlier: Self) -> Self {
        Self(self.0.saturating_sub(earlier.0))
    }
}

impl Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl AddAssign<u32> for Ticks {
    fn add_assign(&mut self, rhs: u32) {
        self.0 = self.0.saturating_add(u64::from(rhs));
    }
}

impl From<u32> for Ticks {
    fn from(count: u32) -> Self {
        Self(u64::from(count))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} clocks", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_instruction_costs() {
        let mut t = Ticks::ZERO;
        t += 4u32;
        t += Ticks::new(16);
        assert_eq!(t.get(), 20);
        assert_eq!(t.since(Ticks::new(8)), Ticks::new(12));
        assert_eq!(Ticks::new(8).since(t), Ticks::ZERO);
    }

    #[test]
    fn saturates_at_the_top() {
        let mut t = Ticks::new(u64::MAX - 1);
        t += 10u32;
        assert_eq!(t.get(), u64::MAX);
    }
}
