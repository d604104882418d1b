use crate::catalog::WordPair;
use crate::stats::StatTable;
use crate::store::StatStore;
use crate::tracker::StatTracker;
use crate::weight_policy::NEUTRAL_WEIGHT;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Read access to item weights
pub trait WeightLookup {
    fn weight_of(&self, id: &str) -> f64;
}

impl WeightLookup for StatTable {
    fn weight_of(&self, id: &str) -> f64 {
        self.get(id).map(|s| s.weight).unwrap_or(NEUTRAL_WEIGHT)
    }
}

impl<S: StatStore> WeightLookup for StatTracker<S> {
    fn weight_of(&self, id: &str) -> f64 {
        StatTracker::weight_of(self, id)
    }
}

/// Trait for different pair selection strategies
pub trait PairSelector {
    /// Pick up to `count` distinct pairs from `population`
    fn select_pairs(
        &self,
        weights: &dyn WeightLookup,
        population: &[WordPair],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<WordPair>;
}

/// Every pair equally likely
pub struct UniformSelector;

impl PairSelector for UniformSelector {
    fn select_pairs(
        &self,
        _weights: &dyn WeightLookup,
        population: &[WordPair],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<WordPair> {
        population.choose_multiple(rng, count).cloned().collect()
    }
}

/// Pair weight is the mean of both sides' weights
pub struct WeightedSelector;

impl PairSelector for WeightedSelector {
    fn select_pairs(
        &self,
        weights: &dyn WeightLookup,
        population: &[WordPair],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<WordPair> {
        let pair_weights = population
            .iter()
            .map(|p| (weights.weight_of(&p.front) + weights.weight_of(&p.back)) / 2.0)
            .collect();
        weighted_sample(population.to_vec(), pair_weights, count, rng)
    }
}

/// Pair weight is the front side's weight alone, where marks live
pub struct MarkedSelector;

impl PairSelector for MarkedSelector {
    fn select_pairs(
        &self,
        weights: &dyn WeightLookup,
        population: &[WordPair],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<WordPair> {
        let front_weights = population
            .iter()
            .map(|p| weights.weight_of(&p.front))
            .collect();
        weighted_sample(population.to_vec(), front_weights, count, rng)
    }
}

/// Roulette-wheel selection without replacement.
///
/// Each round draws from `[0, remaining total)` and walks the candidates until
/// the running sum passes the draw; the winner leaves the pool. Falls back to
/// a uniform pick if no positive weight remains.
pub fn weighted_sample<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    weights: Vec<f64>,
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    debug_assert_eq!(items.len(), weights.len());
    let mut weights: Vec<f64> = weights
        .into_iter()
        .map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();

    let rounds = count.min(items.len());
    let mut selected = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let total: f64 = weights.iter().sum();
        let index = if total > 0.0 {
            let draw = rng.gen_range(0.0..total);
            let mut running = 0.0;
            weights
                .iter()
                .position(|w| {
                    running += w;
                    running > draw
                })
                // Rounding can leave the draw just past the final sum
                .or_else(|| weights.iter().rposition(|w| *w > 0.0))
                .unwrap_or(0)
        } else {
            log::debug!("No positive weight among {} candidates; picking uniformly", items.len());
            rng.gen_range(0..items.len())
        };

        weights.remove(index);
        selected.push(items.remove(index));
    }

    selected
}

impl<S: StatStore> StatTracker<S> {
    /// Weighted pick of `count` distinct pairs from `population`
    pub fn sample(&self, population: &[WordPair], count: usize) -> Vec<WordPair> {
        self.sample_with_rng(population, count, &mut rand::thread_rng())
    }

    pub fn sample_with_rng(
        &self,
        population: &[WordPair],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<WordPair> {
        if population.len() <= count {
            return population.to_vec();
        }
        WeightedSelector.select_pairs(self, population, count, rng)
    }

    /// Weighted pick among marked items only; returns all of them if there are too few
    pub fn sample_marked_only(&self, count: usize) -> Vec<WordPair> {
        self.sample_marked_only_with_rng(count, &mut rand::thread_rng())
    }

    pub fn sample_marked_only_with_rng(&self, count: usize, rng: &mut dyn RngCore) -> Vec<WordPair> {
        let marked: Vec<WordPair> = self.get_marked_list().iter().map(|m| m.pair()).collect();
        if marked.len() <= count {
            return marked;
        }
        MarkedSelector.select_pairs(self, &marked, count, rng)
    }

    pub fn can_sample_marked_only(&self, min_count: usize) -> bool {
        self.marked_len() >= min_count
    }
}
