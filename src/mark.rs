use crate::catalog::{WordPair, MISSING_TRANSLATION};
use crate::stats::{round_weight, ItemStat};
use crate::store::StatStore;
use crate::tracker::StatTracker;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Weight a freshly marked item is raised to at minimum
pub const MARK_MIN_WEIGHT: f64 = 1.5;
/// Added to the current weight on each mark
pub const MARK_BOOST: f64 = 0.3;

/// A marked front-side item joined back to its catalog translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkedItem {
    pub front: String,
    pub back: String,
    pub marked_count: u32,
    pub weight: f64,
    pub last_marked: Option<DateTime<Utc>>,
    pub accuracy: u32,
    pub attempts: u32,
}

impl MarkedItem {
    pub fn pair(&self) -> WordPair {
        WordPair::new(self.front.clone(), self.back.clone())
    }
}

/// Learner-driven "mark as difficult" override.
///
/// Marking raises an item's weight immediately and switches it to the
/// progressive weight rule. Marks are counted: each `remove_mark` undoes one
/// `mark_difficult`, and the item only returns to the accuracy rule once the
/// count reaches zero.
impl<S: StatStore> StatTracker<S> {
    /// Mark `id` as difficult and return its new weight
    pub fn mark_difficult(&mut self, id: &str) -> f64 {
        let max = self.bounds().max;
        let stat = self.entry(id);

        stat.weight = (stat.weight + MARK_BOOST).max(MARK_MIN_WEIGHT).min(max);
        stat.marked_count = Some(stat.marked_count.unwrap_or(0).saturating_add(1));
        stat.last_marked_at = Some(Utc::now());
        let weight = stat.weight;

        log::debug!("Marked {id:?} as difficult, weight={weight:.2}");
        self.persist();
        weight
    }

    /// Undo one mark; returns false when `id` carries no mark
    pub fn remove_mark(&mut self, id: &str) -> bool {
        let Some(stat) = self.table.get_mut(id).filter(|s| s.is_marked()) else {
            return false;
        };

        let remaining = stat.marked_count.unwrap_or(1) - 1;
        if remaining == 0 {
            stat.marked_count = None;
            stat.last_marked_at = None;
        } else {
            stat.marked_count = Some(remaining);
        }

        self.recompute_weight(id);
        self.persist();
        true
    }

    /// Remove every mark from `id`, however many times it was marked
    pub fn clear_marks(&mut self, id: &str) -> u32 {
        let mut removed = 0;
        while self.remove_mark(id) {
            removed += 1;
        }
        removed
    }

    /// Front-side identifiers currently marked, in identifier order
    pub fn marked_fronts(&self) -> impl Iterator<Item = (&str, &ItemStat)> {
        self.table
            .iter()
            .filter(|(_, s)| s.is_front() && s.is_marked())
            .map(|(id, s)| (id.as_str(), s))
    }

    pub fn marked_len(&self) -> usize {
        self.marked_fronts().count()
    }

    /// Marked items with translations, most-marked first
    pub fn get_marked_list(&self) -> Vec<MarkedItem> {
        let mut items: Vec<MarkedItem> = self
            .marked_fronts()
            .map(|(id, stat)| MarkedItem {
                front: id.to_string(),
                back: self
                    .catalog()
                    .pair_for_front(id)
                    .map(|p| p.back.clone())
                    .unwrap_or_else(|| MISSING_TRANSLATION.to_string()),
                marked_count: stat.marked_count.unwrap_or(0),
                weight: round_weight(stat.weight),
                last_marked: stat.last_marked_at,
                accuracy: stat.accuracy_percent(),
                attempts: stat.total_seen,
            })
            .collect();
        items.sort_by(|a, b| b.marked_count.cmp(&a.marked_count));
        items
    }
}
