use crate::stats::Side;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

static CATALOG_DIR: Dir = include_dir!("src/catalogs");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog not found: {0}")]
    NotFound(String),

    #[error("Catalog {0} has no word pairs")]
    Empty(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// One immutable catalog entry, e.g. a word and its translation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordPair {
    pub front: String,
    pub back: String,
}

impl WordPair {
    pub fn new<F: Into<String>, B: Into<String>>(front: F, back: B) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Ordered, read-only set of word pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    pub pairs: Vec<WordPair>,
}

impl Catalog {
    pub fn new<N: Into<String>>(name: N, pairs: Vec<WordPair>) -> Self {
        Self {
            name: name.into(),
            pairs,
        }
    }

    /// Load one of the catalogs compiled into the binary
    pub fn bundled(name: &str) -> Result<Self> {
        let file = CATALOG_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        let catalog: Catalog = serde_json::from_str(contents)?;
        catalog.non_empty()
    }

    /// Names of the catalogs compiled into the binary
    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = CATALOG_DIR
            .files()
            .filter_map(|f| {
                let path = f.path();
                if path.extension()? != "json" {
                    return None;
                }
                path.file_stem()?.to_str().map(String::from)
            })
            .collect();
        names.sort();
        names
    }

    /// Load a user catalog; `.csv` files need a `front,back` header, anything else is JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();

        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {
                let mut reader = csv::ReaderBuilder::new()
                    .trim(csv::Trim::All)
                    .from_reader(File::open(path)?);
                let pairs = reader
                    .deserialize::<WordPair>()
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Catalog::new(name, pairs)
            }
            _ => serde_json::from_reader(File::open(path)?)?,
        };
        catalog.non_empty()
    }

    fn non_empty(self) -> Result<Self> {
        if self.pairs.is_empty() {
            Err(CatalogError::Empty(self.name))
        } else {
            Ok(self)
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pair_for_front(&self, front: &str) -> Option<&WordPair> {
        self.pairs.iter().find(|p| p.front == front)
    }

    /// Which side `id` appears on; a front match wins over a back match
    pub fn side_of(&self, id: &str) -> Option<Side> {
        if self.pairs.iter().any(|p| p.front == id) {
            Some(Side::Front)
        } else if self.pairs.iter().any(|p| p.back == id) {
            Some(Side::Back)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_default_catalog() {
        let catalog = Catalog::bundled("en-th").unwrap();
        assert_eq!(catalog.name, "en-th");
        assert!(catalog.len() >= 10);
        assert_eq!(catalog.pair_for_front("apple").unwrap().back, "แอปเปิ้ล");
    }

    #[test]
    fn test_bundled_names() {
        let names = Catalog::bundled_names();
        assert!(names.contains(&"en-th".to_string()));
        assert!(names.contains(&"en-es".to_string()));
    }

    #[test]
    fn test_missing_bundled_catalog() {
        let err = Catalog::bundled("klingon").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(name) if name == "klingon"));
    }

    #[test]
    fn test_side_of() {
        let catalog = Catalog::new(
            "t",
            vec![WordPair::new("apple", "manzana"), WordPair::new("dog", "perro")],
        );
        assert_eq!(catalog.side_of("apple"), Some(Side::Front));
        assert_eq!(catalog.side_of("perro"), Some(Side::Back));
        assert_eq!(catalog.side_of("pear"), None);
    }

    #[test]
    fn test_csv_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fruits.csv");
        fs::write(&path, "front,back\napple, pomme\npear,poire\n").unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.name, "fruits");
        assert_eq!(
            catalog.pairs,
            vec![WordPair::new("apple", "pomme"), WordPair::new("pear", "poire")]
        );
    }

    #[test]
    fn test_json_catalog_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mine.json");
        fs::write(
            &path,
            r#"{"name":"mine","pairs":[{"front":"hello","back":"hola"}]}"#,
        )
        .unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.name, "mine");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_empty_csv_catalog_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "front,back\n").unwrap();
        assert!(matches!(
            Catalog::from_path(&path),
            Err(CatalogError::Empty(_))
        ));
    }
}
