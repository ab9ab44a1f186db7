//! Score rules per game kind and the verdict on a submitted pair of scores.

use serde::{Deserialize, Serialize};

use crate::dao::models::Slot;

/// Score rule of a game kind: first side to reach `target` exactly wins.
///
/// Any entered score above `max_valid` is treated as a typo and replaced by `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRule {
    /// Exact score that wins the match.
    pub target: u32,
    /// Highest score accepted as entered. Never below `target`.
    pub max_valid: u32,
    /// Value stored in place of an out-of-range score. Never above `max_valid`.
    pub fallback: u32,
}

/// Outcome of judging a pair of submitted scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreVerdict {
    /// At least one score was out of range; these are the values to store instead.
    Corrected {
        /// Corrected score for slot A.
        score_a: u32,
        /// Corrected score for slot B.
        score_b: u32,
    },
    /// The side that reached the target.
    Winner(Slot),
    /// Valid scores, nobody at the target yet.
    Undecided,
}

impl ScoreRule {
    /// Cornhole: first to 21, anything past 21 busts back to 11.
    pub const CORNHOLE: ScoreRule = ScoreRule {
        target: 21,
        max_valid: 21,
        fallback: 11,
    };

    fn correct(&self, score: u32) -> u32 {
        if score > self.max_valid {
            self.fallback
        } else {
            score
        }
    }

    /// Judge a submission. Slot A is checked first when both sides are at the target.
    pub fn judge(&self, score_a: u32, score_b: u32) -> ScoreVerdict {
        let (fixed_a, fixed_b) = (self.correct(score_a), self.correct(score_b));
        if (fixed_a, fixed_b) != (score_a, score_b) {
            return ScoreVerdict::Corrected {
                score_a: fixed_a,
                score_b: fixed_b,
            };
        }

        if score_a == self.target {
            ScoreVerdict::Winner(Slot::A)
        } else if score_b == self.target {
            ScoreVerdict::Winner(Slot::B)
        } else {
            ScoreVerdict::Undecided
        }
    }
}

impl Default for ScoreRule {
    fn default() -> Self {
        Self::CORNHOLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_target_wins() {
        let rule = ScoreRule::CORNHOLE;
        assert_eq!(rule.judge(21, 15), ScoreVerdict::Winner(Slot::A));
        assert_eq!(rule.judge(3, 21), ScoreVerdict::Winner(Slot::B));
    }

    #[test]
    fn over_the_max_is_corrected_to_fallback() {
        let rule = ScoreRule::CORNHOLE;
        assert_eq!(
            rule.judge(25, 10),
            ScoreVerdict::Corrected {
                score_a: 11,
                score_b: 10
            }
        );
        // A correction on one side hides a winner on the other.
        assert_eq!(
            rule.judge(21, 30),
            ScoreVerdict::Corrected {
                score_a: 21,
                score_b: 11
            }
        );
    }

    #[test]
    fn below_target_is_undecided() {
        assert_eq!(ScoreRule::CORNHOLE.judge(18, 20), ScoreVerdict::Undecided);
        assert_eq!(ScoreRule::CORNHOLE.judge(0, 0), ScoreVerdict::Undecided);
    }

    #[test]
    fn both_at_target_favours_slot_a() {
        assert_eq!(ScoreRule::CORNHOLE.judge(21, 21), ScoreVerdict::Winner(Slot::A));
    }

    #[test]
    fn custom_rule_uses_its_own_bounds() {
        let rule = ScoreRule {
            target: 11,
            max_valid: 15,
            fallback: 0,
        };
        assert_eq!(rule.judge(11, 4), ScoreVerdict::Winner(Slot::A));
        assert_eq!(rule.judge(13, 12), ScoreVerdict::Undecided);
        assert_eq!(
            rule.judge(16, 2),
            ScoreVerdict::Corrected {
                score_a: 0,
                score_b: 2
            }
        );
    }
}
