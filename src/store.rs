use crate::app_dirs::AppDirs;
use crate::stats::StatTable;
use crate::stats::ItemStat;
use crate::weight_policy::{WeightBounds, MARKED_FLOOR};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Name of the single record holding the serialized stat table
pub const STATS_RECORD_KEY: &str = "wordMatchGameStats";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to persist stats file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable home for the stat table.
///
/// `load` never fails: absent, empty or malformed data yields an empty table
/// and a logged warning. `save` always writes the whole table.
pub trait StatStore {
    fn load(&self) -> StatTable;
    fn save(&self, table: &StatTable) -> Result<()>;
}

impl<S: StatStore + ?Sized> StatStore for Box<S> {
    fn load(&self) -> StatTable {
        (**self).load()
    }

    fn save(&self, table: &StatTable) -> Result<()> {
        (**self).save(table)
    }
}

/// Decode a persisted table, treating anything unreadable as empty
pub fn decode_table(raw: Option<&str>, source: &str) -> StatTable {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return StatTable::new();
    };
    match serde_json::from_str::<StatTable>(raw) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("Failed to load word stats from {source}, starting fresh: {e}");
            StatTable::new()
        }
    }
}

/// Repair records so every loaded item satisfies the table invariants
pub fn sanitize_table(table: &mut StatTable, bounds: &WeightBounds) {
    for (id, stat) in table.iter_mut() {
        let Some(seen) = stat.correct_count.checked_add(stat.incorrect_count) else {
            log::warn!("Stats for {id:?} overflow the answer count; resetting the record");
            *stat = ItemStat::with_side(stat.side);
            continue;
        };
        if stat.total_seen != seen {
            log::warn!(
                "Stats for {id:?} report {} views but {seen} answers; using answer count",
                stat.total_seen
            );
            stat.total_seen = seen;
        }
        if stat.is_marked() {
            stat.weight = bounds.clamp(stat.weight.max(MARKED_FLOOR));
        } else {
            stat.weight = bounds.clamp(stat.weight);
            stat.marked_count = None;
            stat.last_marked_at = None;
        }
    }
}

/// Key-value table in a SQLite database holding the stat table as JSON
#[derive(Debug)]
pub struct SqliteStatStore {
    conn: Connection,
}

impl SqliteStatStore {
    /// Open the store at the default state directory
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wordmatch_stats.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn read_raw(&self) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [STATS_RECORD_KEY],
                |row| row.get(0),
            )
            .optional()
    }

    /// Overwrite the stored record verbatim
    pub fn write_raw(&self, raw: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![STATS_RECORD_KEY, raw],
        )?;
        Ok(())
    }
}

impl StatStore for SqliteStatStore {
    fn load(&self) -> StatTable {
        match self.read_raw() {
            Ok(raw) => decode_table(raw.as_deref(), "sqlite"),
            Err(e) => {
                log::warn!("Failed to read word stats record: {e}");
                StatTable::new()
            }
        }
    }

    fn save(&self, table: &StatTable) -> Result<()> {
        self.write_raw(&serde_json::to_string(table)?)
    }
}

/// Plain JSON file, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonFileStatStore {
    path: PathBuf,
}

impl JsonFileStatStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::stats_json_path().unwrap_or_else(|| PathBuf::from("wordmatch_stats.json")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for JsonFileStatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatStore for JsonFileStatStore {
    fn load(&self) -> StatTable {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode_table(Some(&raw), &self.path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatTable::new(),
            Err(e) => {
                log::warn!("Failed to read {}: {e}", self.path.display());
                StatTable::new()
            }
        }
    }

    fn save(&self, table: &StatTable) -> Result<()> {
        let parent_dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        serde_json::to_writer(&mut temp_file, table)?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }
}

/// Keeps the serialized table in memory; used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStatStore {
    raw: RefCell<Option<String>>,
}

impl MemoryStatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary stored text, e.g. to simulate corruption
    pub fn with_raw<S: Into<String>>(raw: S) -> Self {
        Self {
            raw: RefCell::new(Some(raw.into())),
        }
    }
}

impl StatStore for MemoryStatStore {
    fn load(&self) -> StatTable {
        decode_table(self.raw.borrow().as_deref(), "memory")
    }

    fn save(&self, table: &StatTable) -> Result<()> {
        *self.raw.borrow_mut() = Some(serde_json::to_string(table)?);
        Ok(())
    }
}
