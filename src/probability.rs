use std::fmt;

use num_integer::Integer;

/// Probability that a successor edge is taken, kept as an exact ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchProbability {
    numerator: u64,
    denominator: u64,
}

impl BranchProbability {
    /// Denominator used when converting from a float.
    pub const SCALE: u64 = 1 << 31;

    pub const ZERO: BranchProbability = BranchProbability {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: BranchProbability = BranchProbability {
        numerator: 1,
        denominator: 1,
    };

    /// `numerator / denominator`, reduced. Returns `None` unless `0 <= numerator <= denominator`
    /// and `denominator != 0`.
    pub fn new(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 || numerator > denominator {
            return None;
        }

        let gcd = numerator.gcd(&denominator);

        Some(Self {
            numerator: numerator / gcd,
            denominator: denominator / gcd,
        })
    }

    /// Nearest ratio over [`Self::SCALE`]. Returns `None` for values outside `[0, 1]` and NaN.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&value) {
            return None;
        }

        Self::new((value * Self::SCALE as f64).round() as u64, Self::SCALE)
    }

    pub fn numerator(self) -> u64 {
        self.numerator
    }

    pub fn denominator(self) -> u64 {
        self.denominator
    }

    /// Whether this edge is taken strictly more than 80% of the time.
    pub fn is_biased(self) -> bool {
        // n / d > 4 / 5, without going through floating point.
        self.numerator as u128 * 5 > self.denominator as u128 * 4
    }
}

impl fmt::Display for BranchProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces() {
        let p = BranchProbability::new(8, 10).unwrap();
        assert_eq!((p.numerator(), p.denominator()), (4, 5));
        assert_eq!(BranchProbability::new(0, 7), Some(BranchProbability::ZERO));
        assert_eq!(BranchProbability::new(3, 3), Some(BranchProbability::ONE));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(BranchProbability::new(1, 0), None);
        assert_eq!(BranchProbability::new(3, 2), None);
        assert_eq!(BranchProbability::from_f64(1.5), None);
        assert_eq!(BranchProbability::from_f64(-0.1), None);
        assert_eq!(BranchProbability::from_f64(f64::NAN), None);
    }

    #[test]
    fn bias_threshold_is_exclusive() {
        assert!(!BranchProbability::new(4, 5).unwrap().is_biased());
        assert!(!BranchProbability::new(80, 100).unwrap().is_biased());
        assert!(BranchProbability::new(81, 100).unwrap().is_biased());
        assert!(BranchProbability::ONE.is_biased());
        assert!(!BranchProbability::ZERO.is_biased());
        assert!(BranchProbability::from_f64(0.81).unwrap().is_biased());
        assert!(!BranchProbability::from_f64(0.19).unwrap().is_biased());
    }
}
