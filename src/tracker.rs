use crate::catalog::Catalog;
use crate::stats::{ItemStat, StatTable};
use crate::store::{sanitize_table, StatStore};
use crate::weight_policy::{compute_weight, WeightBounds, NEUTRAL_WEIGHT};
use chrono::Utc;

/// Owns the stat table and is the only place it is mutated.
///
/// Every mutation is followed by a full save through the injected store.
/// Save failures are logged and otherwise ignored so a broken disk never
/// interrupts a session.
#[derive(Debug)]
pub struct StatTracker<S: StatStore> {
    pub(crate) store: S,
    pub(crate) table: StatTable,
    catalog: Catalog,
    bounds: WeightBounds,
}

impl<S: StatStore> StatTracker<S> {
    pub fn new(store: S, catalog: Catalog, bounds: WeightBounds) -> Self {
        let mut table = store.load();
        sanitize_table(&mut table, &bounds);

        // Tag loaded records with their side so reports never have to guess
        for (id, stat) in table.iter_mut() {
            if let Some(side) = catalog.side_of(id) {
                stat.side = Some(side);
            }
        }

        Self {
            store,
            table,
            catalog,
            bounds,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn bounds(&self) -> WeightBounds {
        self.bounds
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only view for the sampler and reporter
    pub fn table(&self) -> &StatTable {
        &self.table
    }

    pub fn stat(&self, id: &str) -> Option<&ItemStat> {
        self.table.get(id)
    }

    /// Current weight, treating untracked items as neutral
    pub fn weight_of(&self, id: &str) -> f64 {
        self.table
            .get(id)
            .map(|s| s.weight)
            .unwrap_or(NEUTRAL_WEIGHT)
    }

    /// Get-or-create: inserts a default record for unknown identifiers.
    ///
    /// The new record lives in memory until the next persisted mutation.
    pub fn get_stat(&mut self, id: &str) -> &ItemStat {
        self.entry(id)
    }

    pub(crate) fn entry(&mut self, id: &str) -> &mut ItemStat {
        let catalog = &self.catalog;
        self.table
            .entry(id.to_string())
            .or_insert_with(|| ItemStat::with_side(catalog.side_of(id)))
    }

    /// Count one answer for `id` and re-weight it
    pub fn record_answer(&mut self, id: &str, correct: bool) {
        let stat = self.entry(id);
        // total_seen bounds both counts, so room here means room in each
        let Some(seen) = stat.total_seen.checked_add(1) else {
            log::warn!("Answer count for {id:?} is saturated; not recording");
            return;
        };
        if correct {
            stat.correct_count += 1;
        } else {
            stat.incorrect_count += 1;
        }
        stat.total_seen = seen;
        stat.last_seen_at = Some(Utc::now());

        self.recompute_weight(id);
        self.persist();
    }

    /// Record the same outcome for both texts of an attempted match
    pub fn record_pair_attempt(&mut self, front: &str, back: &str, matched: bool) {
        self.record_answer(front, matched);
        self.record_answer(back, matched);
    }

    pub(crate) fn recompute_weight(&mut self, id: &str) {
        let bounds = self.bounds;
        let stat = self.entry(id);
        stat.weight = compute_weight(stat, &bounds);

        if stat.is_marked() {
            log::debug!(
                "Update marked word {id:?}: accuracy={}%, attempts={}, weight={:.2}",
                stat.accuracy_percent(),
                stat.total_seen,
                stat.weight
            );
        }
    }

    /// Drop every record and persist the empty table
    pub fn reset_all(&mut self) {
        self.table.clear();
        self.persist();
    }

    pub(crate) fn persist(&self) {
        if let Err(e) = self.store.save(&self.table) {
            log::warn!("Failed to save word stats: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WordPair;
    use crate::stats::Side;
    use crate::store::MemoryStatStore;

    fn catalog() -> Catalog {
        Catalog::new(
            "test",
            vec![
                WordPair::new("apple", "manzana"),
                WordPair::new("dog", "perro"),
            ],
        )
    }

    fn tracker() -> StatTracker<MemoryStatStore> {
        StatTracker::new(MemoryStatStore::new(), catalog(), WeightBounds::default())
    }

    #[test]
    fn get_stat_lazily_creates_default() {
        let mut t = tracker();
        assert!(t.stat("apple").is_none());
        let stat = t.get_stat("apple").clone();
        assert_eq!(stat.weight, 1.0);
        assert_eq!(stat.total_seen, 0);
        assert_eq!(stat.side, Some(Side::Front));
        assert!(t.stat("apple").is_some());
    }

    #[test]
    fn weight_of_unknown_is_neutral_and_read_only() {
        let t = tracker();
        assert_eq!(t.weight_of("nothing"), 1.0);
        assert!(t.table().is_empty());
    }

    #[test]
    fn record_answer_updates_counts_and_persists() {
        let mut t = tracker();
        t.record_answer("apple", true);
        t.record_answer("apple", false);
        t.record_answer("apple", true);

        let stat = t.stat("apple").unwrap();
        assert_eq!(stat.correct_count, 2);
        assert_eq!(stat.incorrect_count, 1);
        assert_eq!(stat.total_seen, 3);
        assert!(stat.last_seen_at.is_some());

        let persisted = t.store().load();
        assert_eq!(persisted["apple"].total_seen, 3);
    }

    #[test]
    fn eight_of_ten_correct_gives_point_eight() {
        let mut t = tracker();
        for i in 0..10 {
            t.record_answer("apple", i < 8);
        }
        assert!((t.weight_of("apple") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn six_of_ten_incorrect_gives_one_point_two() {
        let mut t = tracker();
        for i in 0..10 {
            t.record_answer("apple", i >= 6);
        }
        assert!((t.weight_of("apple") - 1.2).abs() < 1e-9);
    }

    #[test]
    fn pair_attempt_records_both_sides() {
        let mut t = tracker();
        t.record_pair_attempt("apple", "perro", false);
        assert_eq!(t.stat("apple").unwrap().incorrect_count, 1);
        assert_eq!(t.stat("perro").unwrap().incorrect_count, 1);
        assert_eq!(t.stat("perro").unwrap().side, Some(Side::Back));
    }

    #[test]
    fn reset_all_clears_and_persists() {
        let mut t = tracker();
        t.record_answer("dog", true);
        t.reset_all();
        assert!(t.table().is_empty());
        assert!(t.store().load().is_empty());
    }

    #[test]
    fn loading_backfills_sides_and_sanitizes() {
        let raw = r#"{
            "apple": {"correct":1,"incorrect":0,"totalSeen":1,"lastSeen":0,"weight":7.5},
            "perro": {"correct":0,"incorrect":1,"totalSeen":1,"lastSeen":0,"weight":1.0},
            "ghost": {"correct":0,"incorrect":0,"totalSeen":0,"lastSeen":0,"weight":1.0}
        }"#;
        let t = StatTracker::new(
            MemoryStatStore::with_raw(raw),
            catalog(),
            WeightBounds::default(),
        );
        assert_eq!(t.stat("apple").unwrap().side, Some(Side::Front));
        assert_eq!(t.stat("apple").unwrap().weight, 2.0);
        assert_eq!(t.stat("perro").unwrap().side, Some(Side::Back));
        assert_eq!(t.stat("ghost").unwrap().side, None);
    }

    #[test]
    fn saturated_counts_do_not_panic() {
        let raw = r#"{"apple": {"correct":4294967295,"incorrect":0,"totalSeen":4294967295,"lastSeen":0,"weight":0.5}}"#;
        let mut t = StatTracker::new(
            MemoryStatStore::with_raw(raw),
            catalog(),
            WeightBounds::default(),
        );
        t.record_answer("apple", true);
        t.record_answer("apple", false);

        let stat = t.stat("apple").unwrap();
        assert_eq!(stat.correct_count, u32::MAX);
        assert_eq!(stat.incorrect_count, 0);
        assert_eq!(stat.total_seen, stat.correct_count + stat.incorrect_count);
    }

    #[test]
    fn overflowing_record_loads_reset() {
        let raw = r#"{"apple": {"correct":4294967295,"incorrect":1,"totalSeen":4294967295,"lastSeen":0,"weight":1.0}}"#;
        let mut t = StatTracker::new(
            MemoryStatStore::with_raw(raw),
            catalog(),
            WeightBounds::default(),
        );
        assert_eq!(t.stat("apple").unwrap().total_seen, 0);

        t.record_answer("apple", true);
        let stat = t.stat("apple").unwrap();
        assert_eq!((stat.correct_count, stat.total_seen), (1, 1));
    }

    #[test]
    fn loaded_marked_item_keeps_marked_floor() {
        let raw = r#"{"apple": {"correct":0,"incorrect":0,"totalSeen":0,"lastSeen":0,"weight":0.5,"markedDifficult":1}}"#;
        let t = StatTracker::new(
            MemoryStatStore::with_raw(raw),
            catalog(),
            WeightBounds::default(),
        );
        let marked = t.get_marked_list();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].weight, 1.2);
        assert_eq!(t.weight_of("apple"), 1.2);
    }

    #[test]
    fn corrupt_store_starts_empty() {
        let t = StatTracker::new(
            MemoryStatStore::with_raw("{{{{"),
            catalog(),
            WeightBounds::default(),
        );
        assert!(t.table().is_empty());
    }
}
