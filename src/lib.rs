// Library surface for the binary and integration tests.
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod mark;
pub mod sampler;
pub mod session;
pub mod stats;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod weight_policy;

pub use catalog::{Catalog, WordPair};
pub use mark::MarkedItem;
pub use stats::{ItemStat, Side, StatTable};
pub use store::{JsonFileStatStore, MemoryStatStore, SqliteStatStore, StatStore};
pub use summary::SummaryReport;
pub use tracker::StatTracker;
pub use weight_policy::WeightBounds;
