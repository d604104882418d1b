use crate::catalog::WordPair;
use crate::sampler::{PairSelector, UniformSelector};
use crate::store::StatStore;
use crate::tracker::StatTracker;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

/// Which population a round draws from, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RoundMode {
    /// Whole catalog, weighted toward weak words
    All,
    /// Only words marked as difficult
    MarkedOnly,
    /// Whole catalog, every pair equally likely
    Shuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    Mismatched,
    /// Pair was already matched earlier in the round; nothing recorded
    AlreadyMatched,
    /// One of the texts is not on the board; nothing recorded
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct RoundConfig {
    pub round_size: usize,
    pub marked_mode_min: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_size: 4,
            marked_mode_min: 10,
        }
    }
}

/// One board of pairs to match
#[derive(Debug, Clone)]
pub struct Round {
    pub pairs: Vec<WordPair>,
    pub mode: RoundMode,
    /// A marked-only round was requested without enough marked items
    pub fell_back: bool,
    pub fronts: Vec<String>,
    pub backs: Vec<String>,
    matched: HashSet<usize>,
}

impl Round {
    pub fn start<S: StatStore>(
        tracker: &StatTracker<S>,
        mode: RoundMode,
        config: RoundConfig,
    ) -> Self {
        Self::start_with_rng(tracker, mode, config, &mut rand::thread_rng())
    }

    pub fn start_with_rng<S: StatStore>(
        tracker: &StatTracker<S>,
        mode: RoundMode,
        config: RoundConfig,
        rng: &mut dyn RngCore,
    ) -> Self {
        let marked_ready = tracker.can_sample_marked_only(config.marked_mode_min);
        let (pairs, fell_back) = match mode {
            RoundMode::MarkedOnly if marked_ready => (
                tracker.sample_marked_only_with_rng(config.round_size, rng),
                false,
            ),
            RoundMode::MarkedOnly => {
                log::info!(
                    "Only {} marked words (need {}); using the full catalog",
                    tracker.marked_len(),
                    config.marked_mode_min
                );
                (
                    tracker.sample_with_rng(&tracker.catalog().pairs, config.round_size, rng),
                    true,
                )
            }
            RoundMode::All => (
                tracker.sample_with_rng(&tracker.catalog().pairs, config.round_size, rng),
                false,
            ),
            RoundMode::Shuffle => (
                UniformSelector.select_pairs(
                    tracker,
                    &tracker.catalog().pairs,
                    config.round_size,
                    rng,
                ),
                false,
            ),
        };
        Self::from_pairs(pairs, mode, fell_back, rng)
    }

    /// Lay out `pairs` with both columns shuffled independently
    pub fn from_pairs(
        pairs: Vec<WordPair>,
        mode: RoundMode,
        fell_back: bool,
        rng: &mut dyn RngCore,
    ) -> Self {
        let mut fronts: Vec<String> = pairs.iter().map(|p| p.front.clone()).collect();
        let mut backs: Vec<String> = pairs.iter().map(|p| p.back.clone()).collect();
        fronts.shuffle(rng);
        backs.shuffle(rng);
        Self {
            pairs,
            mode,
            fell_back,
            fronts,
            backs,
            matched: HashSet::new(),
        }
    }

    fn on_board(&self, front: &str, back: &str) -> bool {
        self.pairs.iter().any(|p| p.front == front) && self.pairs.iter().any(|p| p.back == back)
    }

    /// Try to match `front` with `back`, recording the outcome for both texts
    pub fn attempt<S: StatStore>(
        &mut self,
        tracker: &mut StatTracker<S>,
        front: &str,
        back: &str,
    ) -> MatchOutcome {
        if !self.on_board(front, back) {
            return MatchOutcome::Unknown;
        }
        if self.is_matched(front) || self.is_matched(back) {
            return MatchOutcome::AlreadyMatched;
        }

        match self
            .pairs
            .iter()
            .position(|p| p.front == front && p.back == back)
        {
            Some(index) => {
                tracker.record_pair_attempt(front, back, true);
                self.matched.insert(index);
                MatchOutcome::Matched
            }
            None => {
                tracker.record_pair_attempt(front, back, false);
                MatchOutcome::Mismatched
            }
        }
    }

    /// True if `text` belongs to a pair already matched this round
    pub fn is_matched(&self, text: &str) -> bool {
        self.matched
            .iter()
            .any(|&i| self.pairs[i].front == text || self.pairs[i].back == text)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.pairs.len()
    }
}
