use std::fmt;

use serde::{Deserialize, Serialize};

/// Round `x` down to a multiple of `multiple`. A zero multiple leaves `x` untouched.
pub fn align_multiple_floor(x: u64, multiple: u64) -> u64 {
    if multiple == 0 {
        return x;
    }
    (x / multiple) * multiple
}

/// Round `x` up to a multiple of `multiple`. A zero multiple leaves `x` untouched.
pub fn align_multiple_ceil(x: u64, multiple: u64) -> u64 {
    if multiple == 0 {
        return x;
    }
    x.div_ceil(multiple) * multiple
}

/// Number of bytes needed to store `pixels` samples of the given depth.
pub fn multiply_by_depth_ceil(pixels: u64, depth: u64) -> u64 {
    if depth == 1 {
        pixels.div_ceil(8)
    } else {
        pixels * (depth / 8)
    }
}

pub fn abs_diff<T: PartialOrd + std::ops::Sub<Output = T>>(a: T, b: T) -> T {
    if a < b {
        b - a
    } else {
        a - b
    }
}

/// Integer ratio `multiplier / divisor` applied to pixel and resolution values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub multiplier: u32,
    pub divisor: u32,
}

impl Default for Ratio {
    fn default() -> Self {
        Self {
            multiplier: 1,
            divisor: 1,
        }
    }
}

impl Ratio {
    pub fn new(multiplier: u32, divisor: u32) -> Self {
        Self {
            multiplier,
            divisor,
        }
    }

    pub fn apply(&self, arg: u32) -> u32 {
        (u64::from(arg) * u64::from(self.multiplier) / u64::from(self.divisor)) as u32
    }

    pub fn apply_signed(&self, arg: i32) -> i32 {
        (i64::from(arg) * i64::from(self.multiplier) / i64::from(self.divisor)) as i32
    }

    pub fn apply_f32(&self, arg: f32) -> f32 {
        arg * self.multiplier as f32 / self.divisor as f32
    }

    pub fn apply_inverse(&self, arg: u32) -> u32 {
        (u64::from(arg) * u64::from(self.divisor) / u64::from(self.multiplier)) as u32
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.multiplier, self.divisor)
    }
}

/// Set of accepted values. `Any` matches everything, `Values` matches only the listed ones.
///
/// An empty `Values` list matches nothing, which is how sensors that do not support
/// a particular scan method are expressed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFilter<T> {
    Any,
    Values(Vec<T>),
}

impl<T> Default for ValueFilter<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T: PartialEq> ValueFilter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Values(values) => values.contains(value),
        }
    }

    pub fn matches_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl<T: fmt::Display> fmt::Display for ValueFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Values(values) if values.is_empty() => f.write_str("(none)"),
            Self::Values(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{ {} }}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_rounds_to_multiple() {
        assert_eq!(align_multiple_floor(10, 4), 8);
        assert_eq!(align_multiple_ceil(10, 4), 12);
        assert_eq!(align_multiple_ceil(12, 4), 12);
        assert_eq!(align_multiple_floor(7, 0), 7);
    }

    #[test]
    fn depth_multiplication() {
        assert_eq!(multiply_by_depth_ceil(9, 1), 2);
        assert_eq!(multiply_by_depth_ceil(9, 8), 9);
        assert_eq!(multiply_by_depth_ceil(9, 16), 18);
    }

    #[test]
    fn ratio_apply() {
        let r = Ratio::new(1, 4);
        assert_eq!(r.apply(1200), 300);
        assert_eq!(r.apply_inverse(300), 1200);
        assert_eq!(r.to_string(), "1/4");
    }

    #[test]
    fn value_filter_matching() {
        let any: ValueFilter<u32> = ValueFilter::Any;
        assert!(any.matches(&300));
        let some = ValueFilter::Values(vec![300, 600]);
        assert!(some.matches(&600));
        assert!(!some.matches(&1200));
        assert!(!ValueFilter::<u32>::Values(vec![]).matches(&300));
    }
}
