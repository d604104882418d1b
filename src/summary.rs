use crate::mark::MarkedItem;
use crate::stats::{round_weight, ItemStat};
use crate::store::StatStore;
use crate::tracker::StatTracker;
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;

/// Accuracy at or above which an item no longer needs practice
pub const NEEDS_PRACTICE_ACCURACY: f64 = 0.7;
pub const NEEDS_PRACTICE_MIN_SEEN: u32 = 3;
pub const LEAST_ACCURATE_MIN_SEEN: u32 = 2;
pub const DEFAULT_REPORT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncorrectEntry {
    pub word: String,
    pub incorrect_count: u32,
    pub correct_count: u32,
    pub accuracy: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyEntry {
    pub word: String,
    pub accuracy: u32,
    pub attempts: u32,
    pub incorrect_count: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SummaryReport {
    pub total_pairs_in_catalog: usize,
    pub items_played: usize,
    pub total_attempts: u64,
    pub total_correct: u64,
    /// Whole-number percentage
    pub overall_accuracy: u32,
    pub most_incorrect: Vec<IncorrectEntry>,
    pub least_accurate: Vec<AccuracyEntry>,
    pub needs_practice: Vec<AccuracyEntry>,
    pub marked_difficult: Vec<MarkedItem>,
}

fn accuracy_entry(word: &str, stat: &ItemStat) -> AccuracyEntry {
    AccuracyEntry {
        word: word.to_string(),
        accuracy: stat.accuracy_percent(),
        attempts: stat.total_seen,
        incorrect_count: stat.incorrect_count,
        weight: round_weight(stat.weight),
    }
}

fn by_accuracy(a: &(&str, &ItemStat), b: &(&str, &ItemStat)) -> Ordering {
    let rate = |s: &ItemStat| s.correct_rate().unwrap_or(0.0);
    rate(a.1).partial_cmp(&rate(b.1)).unwrap_or(Ordering::Equal)
}

impl<S: StatStore> StatTracker<S> {
    /// Rebuild the front-side report from the current table
    pub fn get_summary(&self) -> SummaryReport {
        self.get_summary_limited(DEFAULT_REPORT_LIMIT)
    }

    pub fn get_summary_limited(&self, limit: usize) -> SummaryReport {
        let played: Vec<(&str, &ItemStat)> = self
            .table()
            .iter()
            .filter(|(_, s)| s.is_front() && s.total_seen > 0)
            .map(|(id, s)| (id.as_str(), s))
            .collect();

        let total_attempts: u64 = played.iter().map(|(_, s)| s.total_seen as u64).sum();
        let total_correct: u64 = played.iter().map(|(_, s)| s.correct_count as u64).sum();
        let overall_accuracy = if total_attempts > 0 {
            (total_correct as f64 / total_attempts as f64 * 100.0).round() as u32
        } else {
            0
        };

        let with_errors = || played.iter().filter(|(_, s)| s.incorrect_count > 0);

        let most_incorrect = with_errors()
            .sorted_by(|a, b| b.1.incorrect_count.cmp(&a.1.incorrect_count))
            .take(limit)
            .map(|(word, s)| IncorrectEntry {
                word: word.to_string(),
                incorrect_count: s.incorrect_count,
                correct_count: s.correct_count,
                accuracy: s.accuracy_percent(),
            })
            .collect();

        let least_accurate = with_errors()
            .filter(|(_, s)| s.total_seen >= LEAST_ACCURATE_MIN_SEEN)
            .sorted_by(|a, b| by_accuracy(a, b))
            .take(limit)
            .map(|(word, s)| accuracy_entry(word, s))
            .collect();

        let needs_practice = with_errors()
            .filter(|(_, s)| {
                s.total_seen >= NEEDS_PRACTICE_MIN_SEEN
                    && s.correct_rate().unwrap_or(0.0) < NEEDS_PRACTICE_ACCURACY
            })
            .sorted_by(|a, b| by_accuracy(a, b))
            .map(|(word, s)| accuracy_entry(word, s))
            .collect();

        SummaryReport {
            total_pairs_in_catalog: self.catalog().len(),
            items_played: played.len(),
            total_attempts,
            total_correct,
            overall_accuracy,
            most_incorrect,
            least_accurate,
            needs_practice,
            // Includes marked items that were never answered
            marked_difficult: self.get_marked_list(),
        }
    }
}
