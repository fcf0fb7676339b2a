//! Scoring module - points awarded for one resolved round
//!
//! Rules:
//! - Incorrect answers score nothing.
//! - Base 4, minus one per hint used (at most 3), plus 1 when no hint was used.
//! - First attempts answered within the fast threshold get +1; retry attempts get -1
//!   instead, however fast they were.
//! - Clamp at zero, then double for hidden treasure.
//!
//! The streak bonus is not part of this function; the run adds it separately.

use std::time::Duration;

pub const BASE_POINTS: i64 = 4;
pub const MAX_HINT_DEDUCTION: u8 = 3;
#[cfg(test)]
pub const DEFAULT_FAST_THRESHOLD: Duration = Duration::from_secs(30);

/// Inputs describing how a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput {
    pub correct: bool,
    pub used_hints: u8,
    pub retry_mode: bool,
    pub hidden_treasure: bool,
    pub elapsed: Duration,
}

/// Calculate the points for a round with the default 30s fast threshold
#[cfg(test)]
pub fn compute_score(input: ScoreInput) -> u32 {
    compute_score_with(input, DEFAULT_FAST_THRESHOLD)
}

/// Calculate the points for a round
///
/// `retry_mode` alone selects between the speed bonus and the retry penalty.
pub fn compute_score_with(input: ScoreInput, fast_threshold: Duration) -> u32 {
    if !input.correct {
        return 0;
    }

    let mut pts = BASE_POINTS;
    pts -= i64::from(input.used_hints.min(MAX_HINT_DEDUCTION));
    if input.used_hints == 0 {
        pts += 1;
    }
    if !input.retry_mode {
        if input.elapsed <= fast_threshold {
            pts += 1;
        }
    } else {
        pts -= 1;
    }

    let clamped = pts.max(0) as u32;
    if input.hidden_treasure {
        clamped * 2
    } else {
        clamped
    }
}

/// Is `streak` a positive multiple of `every`?
pub fn earns_streak_bonus(streak: u32, every: u32) -> bool {
    every > 0 && streak > 0 && streak % every == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(correct: bool, used_hints: u8, retry_mode: bool, hidden_treasure: bool, ms: u64) -> ScoreInput {
        ScoreInput {
            correct,
            used_hints,
            retry_mode,
            hidden_treasure,
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_reference_scores() {
        assert_eq!(compute_score(input(true, 3, false, false, 10_000)), 2);
        assert_eq!(compute_score(input(true, 0, false, false, 10_000)), 6);
        assert_eq!(compute_score(input(true, 0, true, false, 10_000)), 4);
        assert_eq!(compute_score(input(true, 0, false, true, 40_000)), 10);
    }

    #[test]
    fn test_fast_retry_gets_penalty_not_bonus() {
        // 4 - 1 hint - 1 retry
        assert_eq!(compute_score(input(true, 1, true, false, 1_000)), 2);
        // 4 - 1 hint + 1 speed
        assert_eq!(compute_score(input(true, 1, false, false, 1_000)), 4);
    }

    #[test]
    fn test_speed_threshold_is_inclusive() {
        assert_eq!(compute_score(input(true, 0, false, false, 30_000)), 6);
        assert_eq!(compute_score(input(true, 0, false, false, 30_001)), 5);
    }

    #[test]
    fn test_clamp_happens_before_doubling() {
        // 4 - 3 - 1 retry = 0, doubled stays 0
        assert_eq!(compute_score(input(true, 3, true, true, 50_000)), 0);
        // 4 - 3 + 1 speed = 2, doubled = 4
        assert_eq!(compute_score(input(true, 3, false, true, 5_000)), 4);
    }

    #[test]
    fn test_hint_deduction_caps_at_three() {
        assert_eq!(
            compute_score(input(true, 9, false, false, 5_000)),
            compute_score(input(true, 3, false, false, 5_000))
        );
    }

    #[test]
    fn test_custom_threshold() {
        let fast = input(true, 0, false, false, 12_000);
        assert_eq!(compute_score_with(fast, Duration::from_secs(10)), 5);
        assert_eq!(compute_score_with(fast, Duration::from_secs(15)), 6);
    }

    #[test]
    fn test_streak_bonus_multiples() {
        assert!(!earns_streak_bonus(0, 3));
        assert!(!earns_streak_bonus(2, 3));
        assert!(earns_streak_bonus(3, 3));
        assert!(!earns_streak_bonus(4, 3));
        assert!(earns_streak_bonus(6, 3));
        assert!(!earns_streak_bonus(3, 0));
    }

    proptest! {
        #[test]
        fn incorrect_always_scores_zero(hints in 0u8..10, retry in any::<bool>(), treasure in any::<bool>(), ms in 0u64..200_000) {
            prop_assert_eq!(compute_score(input(false, hints, retry, treasure, ms)), 0);
        }

        #[test]
        fn correct_score_is_bounded(hints in 0u8..10, retry in any::<bool>(), treasure in any::<bool>(), ms in 0u64..200_000) {
            let pts = compute_score(input(true, hints, retry, treasure, ms));
            prop_assert!(pts <= 12);
            if treasure {
                prop_assert_eq!(pts % 2, 0);
            }
        }

        #[test]
        fn treasure_exactly_doubles(hints in 0u8..10, retry in any::<bool>(), ms in 0u64..200_000) {
            let plain = compute_score(input(true, hints, retry, false, ms));
            let doubled = compute_score(input(true, hints, retry, true, ms));
            prop_assert_eq!(doubled, plain * 2);
        }
    }
}
