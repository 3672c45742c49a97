//! Inclusive integer transposition ranges

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Inclusive range of integer shifts, in the session's pitch unit
///
/// Parsed from `"-2..2"`, `"-2..=2"` or `"-2,2"`. Both bounds are inclusive,
/// so `"-1..1"` yields the shifts `-1, 0, 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftRange {
    min: i32,
    max: i32,
}

impl ShiftRange {
    /// Create a range, rejecting `min > max`
    pub fn new(min: i32, max: i32) -> Result<Self, String> {
        if min > max {
            return Err(format!("shift range start {} exceeds end {}", min, max));
        }
        Ok(Self { min, max })
    }

    /// A range containing a single shift
    pub const fn single(shift: i32) -> Self {
        Self {
            min: shift,
            max: shift,
        }
    }

    /// Range `0..=max`
    pub const fn from_zero(max: u16) -> Self {
        Self {
            min: 0,
            max: max as i32,
        }
    }

    /// Symmetric range `-radius..=radius`
    pub const fn symmetric(radius: u16) -> Self {
        Self {
            min: -(radius as i32),
            max: radius as i32,
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Number of shifts in the range (never zero)
    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, shift: i32) -> bool {
        (self.min..=self.max).contains(&shift)
    }

    /// Iterate the shifts in ascending order
    pub fn iter(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }
}

impl IntoIterator for ShiftRange {
    type Item = i32;
    type IntoIter = RangeInclusive<i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::str::FromStr for ShiftRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = if let Some((a, b)) = s.split_once("..=") {
            (a, b)
        } else if let Some((a, b)) = s.split_once("..") {
            (a, b)
        } else if let Some((a, b)) = s.split_once(',') {
            (a, b)
        } else {
            // A lone integer is a single-shift range
            (s, s)
        };

        let min: i32 = start
            .trim()
            .parse()
            .map_err(|e| format!("invalid shift range start '{}': {}", start.trim(), e))?;
        let max: i32 = end
            .trim()
            .parse()
            .map_err(|e| format!("invalid shift range end '{}': {}", end.trim(), e))?;

        Self::new(min, max)
    }
}

impl std::fmt::Display for ShiftRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("-2..2".parse::<ShiftRange>().unwrap(), ShiftRange::symmetric(2));
        assert_eq!("-2..=2".parse::<ShiftRange>().unwrap(), ShiftRange::symmetric(2));
        assert_eq!(" -1 , 1 ".parse::<ShiftRange>().unwrap(), ShiftRange::symmetric(1));
        assert_eq!("0".parse::<ShiftRange>().unwrap(), ShiftRange::single(0));
        assert_eq!("0..11".parse::<ShiftRange>().unwrap(), ShiftRange::from_zero(11));
        assert_eq!(ShiftRange::from_zero(11).len(), 12);
    }

    #[test]
    fn test_rejects_reversed_and_garbage() {
        assert!("2..-2".parse::<ShiftRange>().is_err());
        assert!("a..b".parse::<ShiftRange>().is_err());
        assert!("".parse::<ShiftRange>().is_err());
    }

    #[test]
    fn test_iteration_is_inclusive() {
        let shifts: Vec<i32> = ShiftRange::symmetric(1).into_iter().collect();
        assert_eq!(shifts, vec![-1, 0, 1]);
        assert!(ShiftRange::symmetric(1).contains(-1));
        assert!(!ShiftRange::symmetric(1).contains(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(ShiftRange::symmetric(2).to_string(), "-2..2");
    }
}
