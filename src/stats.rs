use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side of a word pair an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

/// Per-item performance record, keyed in the [`StatTable`] by the item's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStat {
    #[serde(rename = "correct")]
    pub correct_count: u32,
    #[serde(rename = "incorrect")]
    pub incorrect_count: u32,
    pub total_seen: u32,
    #[serde(rename = "lastSeen", default, with = "epoch_millis")]
    pub last_seen_at: Option<DateTime<Utc>>,
    pub weight: f64,
    #[serde(
        rename = "markedDifficult",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub marked_count: Option<u32>,
    #[serde(
        rename = "lastMarked",
        default,
        skip_serializing_if = "Option::is_none",
        with = "epoch_millis"
    )]
    pub last_marked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl Default for ItemStat {
    fn default() -> Self {
        Self {
            correct_count: 0,
            incorrect_count: 0,
            total_seen: 0,
            last_seen_at: None,
            weight: 1.0,
            marked_count: None,
            last_marked_at: None,
            side: None,
        }
    }
}

impl ItemStat {
    pub fn with_side(side: Option<Side>) -> Self {
        Self {
            side,
            ..Self::default()
        }
    }

    /// True while the learner's "difficult" mark is in force
    pub fn is_marked(&self) -> bool {
        self.marked_count.is_some_and(|c| c > 0)
    }

    pub fn is_front(&self) -> bool {
        self.side == Some(Side::Front)
    }

    /// Fraction of answers that were correct, `None` if never seen
    pub fn correct_rate(&self) -> Option<f64> {
        (self.total_seen > 0).then(|| self.correct_count as f64 / self.total_seen as f64)
    }

    pub fn incorrect_rate(&self) -> Option<f64> {
        (self.total_seen > 0).then(|| self.incorrect_count as f64 / self.total_seen as f64)
    }

    /// Accuracy as a whole-number percentage (0 when unseen)
    pub fn accuracy_percent(&self) -> u32 {
        self.correct_rate()
            .map(|r| (r * 100.0).round() as u32)
            .unwrap_or(0)
    }
}

/// All tracked items, ordered by identifier
pub type StatTable = BTreeMap<String, ItemStat>;

/// Round a weight to two decimals for display
pub fn round_weight(weight: f64) -> f64 {
    (weight * 100.0).round() / 100.0
}

/// Epoch-millisecond timestamps where `0` (or `null`) means unset
mod epoch_millis {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.map(|t| t.timestamp_millis()).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let millis: Option<f64> = Option::deserialize(deserializer)?;
        Ok(match millis {
            Some(ms) if ms > 0.0 => Utc.timestamp_millis_opt(ms as i64).single(),
            _ => None,
        })
    }
}
