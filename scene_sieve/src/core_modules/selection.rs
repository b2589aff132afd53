// THEORY:
// The selection stage is a pure predicate over probed sizes. It has no access to
// the filesystem and no state, so the same sizes always yield the same indices.
//
// The ratio test deserves care. The historical behavior compares the floating-point
// quotient `width / height` against `4.0 / 3.0` with exact equality, and that is
// kept as the default `RatioMatch::Exact`. For integer dimensions where
// `3 * width == 4 * height` the correctly rounded quotient is the same double as
// `4.0 / 3.0`, so exact equality accepts precisely the true 4:3 images; dimensions
// that are merely close (1025x768) are rejected. `Tolerance` and `Rational` are
// available as explicit, opt-in changes of behavior.

use crate::core_modules::record::ProbedSize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MIN_WIDTH: u32 = 1024;
pub const DEFAULT_MIN_HEIGHT: u32 = 768;

/// A width:height ratio such as 4:3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub num: u32,
    pub den: u32,
}

impl AspectRatio {
    pub const FOUR_THIRDS: AspectRatio = AspectRatio { num: 4, den: 3 };

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::FOUR_THIRDS
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once(':')
            .ok_or_else(|| format!("ratio `{s}` must look like W:H"))?;
        let num: u32 = num.trim().parse().map_err(|e| format!("ratio width: {e}"))?;
        let den: u32 = den.trim().parse().map_err(|e| format!("ratio height: {e}"))?;
        if num == 0 || den == 0 {
            return Err(format!("ratio `{s}` must have non-zero terms"));
        }
        Ok(Self { num, den })
    }
}

/// How the width/height quotient is compared against the target ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum RatioMatch {
    /// `w as f64 / h as f64 == num as f64 / den as f64`.
    #[default]
    Exact,
    /// `|w/h - num/den| <= epsilon`.
    Tolerance(f64),
    /// `w * den == h * num` in integer arithmetic.
    Rational,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCriteria {
    pub min_width: u32,
    pub min_height: u32,
    pub ratio: AspectRatio,
    pub ratio_match: RatioMatch,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            ratio: AspectRatio::default(),
            ratio_match: RatioMatch::default(),
        }
    }
}

impl SelectionCriteria {
    pub fn matches(&self, size: ProbedSize) -> bool {
        size.height > 0
            && size.width >= self.min_width
            && size.height >= self.min_height
            && self.ratio_holds(size)
    }

    #[allow(clippy::float_cmp)]
    fn ratio_holds(&self, size: ProbedSize) -> bool {
        let quotient = size.width as f64 / size.height as f64;
        match self.ratio_match {
            RatioMatch::Exact => quotient == self.ratio.as_f64(),
            RatioMatch::Tolerance(epsilon) => (quotient - self.ratio.as_f64()).abs() <= epsilon,
            RatioMatch::Rational => {
                u64::from(size.width) * u64::from(self.ratio.den)
                    == u64::from(size.height) * u64::from(self.ratio.num)
            }
        }
    }
}

/// Ordered indices of the sizes that passed the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// Returns, in input order, the index of every size that satisfies `criteria`.
pub fn select<I>(sizes: I, criteria: &SelectionCriteria) -> Selection
where
    I: IntoIterator<Item = ProbedSize>,
{
    let indices = sizes
        .into_iter()
        .enumerate()
        .filter(|(_, size)| criteria.matches(*size))
        .map(|(index, _)| index)
        .collect();
    Selection { indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(dims: &[(u32, u32)]) -> Vec<ProbedSize> {
        dims.iter().copied().map(ProbedSize::from).collect()
    }

    #[test]
    fn keeps_large_four_thirds_images() {
        let input = sizes(&[(1024, 768), (800, 600), (1200, 900), (1920, 1080)]);

        let selection = select(input, &SelectionCriteria::default());

        assert_eq!(selection.indices(), &[0, 2]);
    }

    #[test]
    fn near_ratios_are_rejected_by_exact_matching() {
        let input = sizes(&[(1025, 768), (1024, 767), (2048, 1536)]);

        let selection = select(input, &SelectionCriteria::default());

        assert_eq!(selection.indices(), &[2]);
    }

    #[test]
    fn exact_matching_agrees_with_integer_cross_multiplication() {
        let exact = SelectionCriteria::default();
        let rational = SelectionCriteria {
            ratio_match: RatioMatch::Rational,
            ..SelectionCriteria::default()
        };
        for height in 768..2000u32 {
            for width in [height * 4 / 3, height * 4 / 3 + 1] {
                let size = ProbedSize::new(width, height);
                assert_eq!(exact.matches(size), rational.matches(size), "{width}x{height}");
            }
        }
    }

    #[test]
    fn tolerance_admits_near_ratios() {
        let criteria = SelectionCriteria {
            ratio_match: RatioMatch::Tolerance(2e-3),
            ..SelectionCriteria::default()
        };

        assert!(criteria.matches(ProbedSize::new(1025, 768)));
        assert!(!criteria.matches(ProbedSize::new(1100, 768)));
    }

    #[test]
    fn selection_is_deterministic_and_sound() {
        let input = sizes(&[(1024, 768), (0, 0), (4000, 3000), (1024, 0), (1600, 1200), (5, 5)]);
        let criteria = SelectionCriteria::default();

        let first = select(input.clone(), &criteria);
        let second = select(input.clone(), &criteria);

        assert_eq!(first, second);
        for index in first.iter() {
            let size = input[index];
            assert!(size.width >= 1024 && size.height >= 768);
            assert!(criteria.matches(size));
        }
        assert_eq!(first.indices(), &[0, 2, 4]);
    }

    #[test]
    fn zero_height_never_matches() {
        let criteria = SelectionCriteria {
            min_width: 0,
            min_height: 0,
            ratio_match: RatioMatch::Tolerance(f64::INFINITY),
            ..SelectionCriteria::default()
        };

        assert!(!criteria.matches(ProbedSize::new(10, 0)));
    }

    #[test]
    fn parses_ratios() {
        assert_eq!("16:9".parse(), Ok(AspectRatio { num: 16, den: 9 }));
        assert_eq!(" 4 : 3 ".trim().parse(), Ok(AspectRatio::FOUR_THIRDS));
        assert!("4/3".parse::<AspectRatio>().is_err());
        assert!("4:0".parse::<AspectRatio>().is_err());
    }
}
