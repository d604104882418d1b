pub mod core;

// Re-export the main types for convenience
pub use self::core::{Catalog, CatalogError, WordPair};

/// Shown when a marked identifier has no pair in the catalog
pub const MISSING_TRANSLATION: &str = "(no translation)";
