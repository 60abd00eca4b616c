//! Progress maps and the clamping law.
//!
//! Progress is a step count in `[0, requirement]`. Every write in the
//! engine goes through [`clamp_progress`], so stored values never leave
//! that range.

use std::collections::BTreeMap;

use crate::ids::AchievementId;

/// Progress keyed by achievement; an absent key reads as zero.
pub type ProgressMap = BTreeMap<AchievementId, u32>;

/// Clamp a raw (possibly negative or oversized) value into `[0, requirement]`.
pub fn clamp_progress(value: i64, requirement: u32) -> u32 {
    let clamped = value.clamp(0, i64::from(requirement));
    u32::try_from(clamped).unwrap_or(requirement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_below_zero() {
        assert_eq!(clamp_progress(-5, 10), 0);
    }

    #[test]
    fn clamps_above_requirement() {
        assert_eq!(clamp_progress(11, 10), 10);
        assert_eq!(clamp_progress(i64::MAX, 3), 3);
    }

    #[test]
    fn passes_through_in_range() {
        assert_eq!(clamp_progress(0, 10), 0);
        assert_eq!(clamp_progress(7, 10), 7);
        assert_eq!(clamp_progress(10, 10), 10);
    }

    #[test]
    fn handles_maximum_requirement() {
        assert_eq!(clamp_progress(i64::from(u32::MAX), u32::MAX), u32::MAX);
    }
}
