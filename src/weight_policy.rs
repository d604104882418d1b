use crate::stats::ItemStat;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_WEIGHT: f64 = 0.1;
pub const DEFAULT_MAX_WEIGHT: f64 = 2.0;
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// Weight of a marked item that has never been answered
pub const MARKED_UNSEEN_WEIGHT: f64 = 1.8;
/// Lowest weight a marked item may reach
pub const MARKED_FLOOR: f64 = 1.2;

/// Inclusive bounds every stored weight is kept within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WEIGHT,
            max: DEFAULT_MAX_WEIGHT,
        }
    }
}

impl WeightBounds {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn clamp(&self, weight: f64) -> f64 {
        if weight.is_nan() {
            return NEUTRAL_WEIGHT.clamp(self.min, self.max);
        }
        weight.clamp(self.min, self.max)
    }
}

/// Recompute the weight for `stat`, choosing the rule by its mark state.
///
/// Unmarked items drift below 1.0 as they are mastered and above 1.0 as they
/// are missed. Marked items follow a slower rule: they only decay after
/// sustained accuracy over several attempts and never fall below
/// [`MARKED_FLOOR`] while marked.
pub fn compute_weight(stat: &ItemStat, bounds: &WeightBounds) -> f64 {
    let weight = if stat.is_marked() {
        marked_weight(stat, bounds)
    } else {
        unmarked_weight(stat, bounds)
    };
    bounds.clamp(weight)
}

/// Accuracy-driven weight for items without a difficulty mark
pub fn unmarked_weight(stat: &ItemStat, bounds: &WeightBounds) -> f64 {
    let (Some(correct_rate), Some(incorrect_rate)) = (stat.correct_rate(), stat.incorrect_rate())
    else {
        return NEUTRAL_WEIGHT;
    };

    let weight = if correct_rate > 0.7 {
        NEUTRAL_WEIGHT - (correct_rate - 0.7) * 2.0
    } else if incorrect_rate > 0.5 {
        NEUTRAL_WEIGHT + (incorrect_rate - 0.5) * 2.0
    } else {
        NEUTRAL_WEIGHT
    };

    bounds.clamp(weight)
}

/// Progressive weight for marked items, stepping from the current weight
pub fn marked_weight(stat: &ItemStat, bounds: &WeightBounds) -> f64 {
    let Some(correct_rate) = stat.correct_rate() else {
        return MARKED_UNSEEN_WEIGHT;
    };
    let seen = stat.total_seen;

    let weight = if correct_rate >= 0.85 && seen >= 8 {
        (stat.weight - 0.1).max(MARKED_FLOOR)
    } else if correct_rate >= 0.75 && seen >= 6 {
        (stat.weight - 0.05).max(1.4)
    } else if correct_rate >= 0.65 && seen >= 4 {
        stat.weight
    } else {
        (stat.weight + 0.15).min(bounds.max)
    };

    weight.max(MARKED_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(correct: u32, incorrect: u32) -> ItemStat {
        ItemStat {
            correct_count: correct,
            incorrect_count: incorrect,
            total_seen: correct + incorrect,
            ..ItemStat::default()
        }
    }

    fn marked(correct: u32, incorrect: u32, weight: f64) -> ItemStat {
        ItemStat {
            weight,
            marked_count: Some(1),
            ..stat(correct, incorrect)
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn unseen_unmarked_is_neutral() {
        assert_eq!(compute_weight(&stat(0, 0), &WeightBounds::default()), 1.0);
    }

    #[test]
    fn mostly_correct_lowers_weight() {
        let w = compute_weight(&stat(8, 2), &WeightBounds::default());
        assert!(approx(w, 0.8), "got {w}");
    }

    #[test]
    fn perfect_accuracy_reaches_point_four() {
        let w = compute_weight(&stat(10, 0), &WeightBounds::default());
        assert!(approx(w, 0.4), "got {w}");
    }

    #[test]
    fn mostly_incorrect_raises_weight() {
        let w = compute_weight(&stat(4, 6), &WeightBounds::default());
        assert!(approx(w, 1.2), "got {w}");
    }

    #[test]
    fn always_incorrect_reaches_max() {
        let w = compute_weight(&stat(0, 5), &WeightBounds::default());
        assert!(approx(w, 2.0), "got {w}");
    }

    #[test]
    fn neutral_band_keeps_weight_at_one() {
        // 60% correct, 40% incorrect: neither threshold triggers
        assert_eq!(compute_weight(&stat(6, 4), &WeightBounds::default()), 1.0);
        assert_eq!(compute_weight(&stat(1, 1), &WeightBounds::default()), 1.0);
    }

    #[test]
    fn narrow_bounds_clamp_unmarked_weight() {
        let bounds = WeightBounds::new(0.5, 1.5);
        assert_eq!(compute_weight(&stat(10, 0), &bounds), 0.5);
        assert_eq!(compute_weight(&stat(0, 10), &bounds), 1.5);
    }

    #[test]
    fn bounds_are_normalized() {
        let bounds = WeightBounds::new(2.0, 0.1);
        assert_eq!(bounds.min, 0.1);
        assert_eq!(bounds.max, 2.0);
        assert_eq!(bounds.clamp(f64::NAN), 1.0);
    }

    #[test]
    fn unseen_marked_item_gets_high_default() {
        let w = compute_weight(&marked(0, 0, 1.5), &WeightBounds::default());
        assert!(approx(w, 1.8));
    }

    #[test]
    fn sustained_accuracy_decays_marked_weight() {
        // 9/10 correct over 10 attempts
        let w = compute_weight(&marked(9, 1, 1.8), &WeightBounds::default());
        assert!(approx(w, 1.7), "got {w}");
    }

    #[test]
    fn sustained_decay_stops_at_floor() {
        let w = compute_weight(&marked(10, 0, 1.25), &WeightBounds::default());
        assert!(approx(w, MARKED_FLOOR), "got {w}");
    }

    #[test]
    fn good_accuracy_decays_slowly_to_one_point_four() {
        // 6/8 = 0.75 with 8 attempts: second tier
        let w = compute_weight(&marked(6, 2, 1.8), &WeightBounds::default());
        assert!(approx(w, 1.75), "got {w}");
        let w = compute_weight(&marked(6, 2, 1.42), &WeightBounds::default());
        assert!(approx(w, 1.4), "got {w}");
    }

    #[test]
    fn adequate_accuracy_holds_marked_weight() {
        // 3/4 = 0.75 but only 4 attempts: third tier
        let w = compute_weight(&marked(3, 1, 1.6), &WeightBounds::default());
        assert!(approx(w, 1.6), "got {w}");
    }

    #[test]
    fn single_lucky_streak_does_not_decay_marked_item() {
        // 100% correct but only 2 attempts: insufficient evidence, weight rises
        let w = compute_weight(&marked(2, 0, 1.5), &WeightBounds::default());
        assert!(approx(w, 1.65), "got {w}");
    }

    #[test]
    fn poor_accuracy_raises_marked_weight_up_to_max() {
        let w = compute_weight(&marked(1, 4, 1.95), &WeightBounds::default());
        assert!(approx(w, 2.0), "got {w}");
    }

    #[test]
    fn marked_weight_never_below_floor() {
        // Stored weight below the floor is lifted even when held
        let w = compute_weight(&marked(3, 1, 0.5), &WeightBounds::default());
        assert!(approx(w, MARKED_FLOOR), "got {w}");
    }
}
