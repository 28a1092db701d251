//! Time representations for propagation.
//!
//! Integrators advance time by adding step sizes (in seconds) to a time value.
//! With plain `f64` seconds, every addition rounds to the spacing of the
//! current magnitude, so long propagations accumulate drift. [`Epoch`] stores
//! time as an unevaluated sum of two `f64` values and carries the rounding
//! error of every addition forward instead of discarding it.

use std::cmp::Ordering;
use std::fmt;

/// A time representation an integrator can advance.
///
/// Step sizes and differences between times are always plain `f64` seconds;
/// only the accumulated absolute time needs extended precision.
pub trait TimeType: Copy + fmt::Debug + PartialOrd + Send + Sync + 'static {
    /// Creates a time from seconds since the reference epoch.
    fn from_seconds(seconds: f64) -> Self;

    /// Returns the time in seconds since the reference epoch, rounded to `f64`.
    fn to_seconds(self) -> f64;

    /// Returns this time advanced by `seconds`.
    #[must_use]
    fn add_seconds(self, seconds: f64) -> Self;

    /// Returns the number of seconds elapsed from `earlier` to `self`.
    fn seconds_since(self, earlier: Self) -> f64;
}

impl TimeType for f64 {
    fn from_seconds(seconds: f64) -> Self {
        seconds
    }

    fn to_seconds(self) -> f64 {
        self
    }

    fn add_seconds(self, seconds: f64) -> Self {
        self + seconds
    }

    fn seconds_since(self, earlier: Self) -> f64 {
        self - earlier
    }
}

/// A compensated (dual-double) time in seconds since a reference epoch.
///
/// The value is `hi + lo` with `|lo| <= ulp(hi) / 2`, which gives roughly 32
/// significant digits. Additions use error-free transformations, so adding
/// many small steps to a large epoch does not drift.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch {
    hi: f64,
    lo: f64,
}

impl Epoch {
    /// Creates an epoch from two components whose exact sum is the time.
    #[must_use]
    pub fn from_parts(hi: f64, lo: f64) -> Self {
        let (hi, lo) = two_sum(hi, lo);
        Self { hi, lo }
    }

    /// Returns the leading component.
    #[must_use]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Returns the trailing (error) component.
    #[must_use]
    pub fn lo(&self) -> f64 {
        self.lo
    }
}

impl TimeType for Epoch {
    fn from_seconds(seconds: f64) -> Self {
        Self {
            hi: seconds,
            lo: 0.0,
        }
    }

    fn to_seconds(self) -> f64 {
        self.hi + self.lo
    }

    fn add_seconds(self, seconds: f64) -> Self {
        let (sum, err) = two_sum(self.hi, seconds);
        let (hi, lo) = fast_two_sum(sum, err + self.lo);
        Self { hi, lo }
    }

    fn seconds_since(self, earlier: Self) -> f64 {
        let (diff, err) = two_sum(self.hi, -earlier.hi);
        diff + (err + (self.lo - earlier.lo))
    }
}

impl PartialOrd for Epoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.to_seconds())
    }
}

/// Knuth's two-sum: `a + b == s + e` exactly.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Dekker's fast two-sum, valid when `|a| >= |b|`.
fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn epoch_accumulates_without_drift() {
        let start = 1.0e9;
        let step = 0.1;
        let count = 100_000;

        let mut epoch = Epoch::from_seconds(start);
        let mut naive = start;
        for _ in 0..count {
            epoch = epoch.add_seconds(step);
            naive = naive.add_seconds(step);
        }

        let expected = step * f64::from(count);
        let epoch_error = (epoch.seconds_since(Epoch::from_seconds(start)) - expected).abs();
        let naive_error = (naive.seconds_since(start) - expected).abs();

        assert!(epoch_error < 1e-9, "epoch drifted by {epoch_error}");
        assert!(naive_error > 1e-4, "naive sum unexpectedly exact: {naive_error}");
    }

    #[test]
    fn epoch_ordering_uses_trailing_component() {
        let base = Epoch::from_seconds(1.0e9);
        let later = base.add_seconds(1.0e-9);

        assert_eq!(base.to_seconds(), later.to_seconds());
        assert!(later > base);
        assert_relative_eq!(later.seconds_since(base), 1.0e-9, max_relative = 1e-6);
    }

    #[test]
    fn from_parts_normalizes() {
        let epoch = Epoch::from_parts(1.0, 1.0e9);
        assert_eq!(epoch.hi(), 1.0e9 + 1.0);
        assert_eq!(epoch.lo(), 0.0);
    }

    #[test]
    fn negative_steps_move_backwards() {
        let epoch = Epoch::from_seconds(10.0).add_seconds(-2.5);
        assert_relative_eq!(epoch.to_seconds(), 7.5);
        assert!(epoch < Epoch::from_seconds(10.0));
    }
}
