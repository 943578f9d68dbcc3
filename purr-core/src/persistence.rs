//! Long-term baseline persistence.
//!
//! Exactly two floats survive a restart: the long-term valence and arousal.
//! They are stored as keyed rows in a small SQLite table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS affect_baseline (
//!     key        TEXT PRIMARY KEY,
//!     value      REAL NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```
//!
//! A missing key means "use the configured default", so a fresh database
//! and a database holding only one of the two keys are both valid.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::Affect;

/// Row key for the long-term valence.
pub const VALENCE_KEY: &str = "long_term_valence";
/// Row key for the long-term arousal.
pub const AROUSAL_KEY: &str = "long_term_arousal";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS affect_baseline (
    key        TEXT PRIMARY KEY,
    value      REAL NOT NULL,
    updated_at TEXT NOT NULL
);";

/// What a store returned. `None` means the key was never written.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StoredBaseline {
    /// Persisted long-term valence.
    pub valence: Option<f32>,
    /// Persisted long-term arousal.
    pub arousal: Option<f32>,
}

impl StoredBaseline {
    /// Fill missing keys from the given defaults and clamp.
    #[must_use]
    pub fn or_defaults(self, default_valence: f32, default_arousal: f32) -> Affect {
        Affect::new(
            self.valence.unwrap_or(default_valence),
            self.arousal.unwrap_or(default_arousal),
        )
    }
}

/// Somewhere the long-term baseline can be loaded from and saved to.
pub trait BaselineStore {
    /// Read both keys.
    ///
    /// # Errors
    /// Implementation-specific I/O or database errors.
    fn load(&self) -> Result<StoredBaseline>;

    /// Write both keys.
    ///
    /// # Errors
    /// Implementation-specific I/O or database errors.
    fn save(&mut self, baseline: &Affect) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

/// Baseline store backed by an SQLite file.
pub struct SqliteBaselineStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteBaselineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBaselineStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteBaselineStore {
    /// Open (or create) the database at `path`, creating the table if needed.
    ///
    /// # Errors
    /// Returns `PurrError::Database` on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, wal_mode: bool) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = wal_mode, "baseline store opened");
        Ok(Self { conn, db_path })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns `PurrError::Database` on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn read_key(&self, key: &str) -> Result<Option<f32>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM affect_baseline WHERE key = ?1")?;
        let value: Option<f64> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(value.map(|v| v as f32))
    }

    /// When a key was last written (RFC 3339), if ever.
    ///
    /// # Errors
    /// Returns `PurrError::Database` on SQLite failures.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT updated_at FROM affect_baseline WHERE key = ?1")?;
        Ok(stmt.query_row(params![key], |row| row.get(0)).optional()?)
    }
}

impl BaselineStore for SqliteBaselineStore {
    fn load(&self) -> Result<StoredBaseline> {
        let stored = StoredBaseline {
            valence: self.read_key(VALENCE_KEY)?,
            arousal: self.read_key(AROUSAL_KEY)?,
        };
        debug!(valence = ?stored.valence, arousal = ?stored.arousal, "baseline loaded");
        Ok(stored)
    }

    fn save(&mut self, baseline: &Affect) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for (key, value) in [(VALENCE_KEY, baseline.valence), (AROUSAL_KEY, baseline.arousal)] {
            tx.execute(
                "INSERT INTO affect_baseline (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, f64::from(value), now],
            )?;
        }
        tx.commit()?;
        debug!(valence = baseline.valence, arousal = baseline.arousal, "baseline saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Baseline store that keeps keys in a map. Starts empty.
#[derive(Debug, Clone, Default)]
pub struct MemoryBaselineStore {
    values: HashMap<&'static str, f32>,
}

impl MemoryBaselineStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding a baseline.
    #[must_use]
    pub fn with_baseline(baseline: Affect) -> Self {
        let mut store = Self::new();
        store.values.insert(VALENCE_KEY, baseline.valence);
        store.values.insert(AROUSAL_KEY, baseline.arousal);
        store
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn load(&self) -> Result<StoredBaseline> {
        Ok(StoredBaseline {
            valence: self.values.get(VALENCE_KEY).copied(),
            arousal: self.values.get(AROUSAL_KEY).copied(),
        })
    }

    fn save(&mut self, baseline: &Affect) -> Result<()> {
        self.values.insert(VALENCE_KEY, baseline.valence);
        self.values.insert(AROUSAL_KEY, baseline.arousal);
        Ok(())
    }
}
