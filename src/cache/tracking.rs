//! Cache-bust tracking table
//!
//! One row per cache entry holding the UTC date after which the entry is stale.
//! Dates are stored as `YYYY-MM-DD HH:MM:SS` text so `<=` compares correctly.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::unsync::OnceCell;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Table holding cache-bust dates
pub const TRACKING_TABLE: &str = "static_cache_tracking";

/// Storage format of `cacheBustOnUtcDate`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type Result<T> = std::result::Result<T, CacheError>;

/// A tracked cache entry and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRecord {
    /// Relative cache entry (see [`crate::cache::path::cache_entry`])
    pub entry: String,
    pub cache_bust_on: DateTime<Utc>,
}

/// Summary of the tracking table relative to a cutoff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub total: usize,
    pub expired: usize,
    pub next_bust: Option<DateTime<Utc>>,
}

/// Persistent store of cache-bust dates
pub trait TrackingStore {
    /// Insert or replace the expiry for an entry
    fn record(&self, entry: &str, bust_on: DateTime<Utc>) -> Result<()>;

    /// Rows with `cacheBustOnUtcDate <= cutoff`
    fn expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<TrackingRecord>>;

    /// Delete rows with `cacheBustOnUtcDate <= cutoff`, returning the count
    fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Delete every row, returning the count
    fn delete_all(&self) -> Result<usize>;

    fn stats(&self, cutoff: DateTime<Utc>) -> Result<TrackingStats>;
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| CacheError::Tracking(format!("Bad date '{}': {}", raw, e)))
}

/// SQLite-backed tracking table
pub struct SqliteTrackingStore {
    conn: Connection,
}

impl SqliteTrackingStore {
    /// Open or create the tracking database at `path`
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Io(format!("Failed to create tracking dir: {}", e)))?;
        }

        let conn = Connection::open(path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Tracking schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(path)
                .map_err(|e| CacheError::Io(format!("Failed to remove tracking DB: {}", e)))?;
            return Self::open_at(path);
        }

        Self::init(conn)
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                entry TEXT PRIMARY KEY NOT NULL,
                cacheBustOnUtcDate TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cache_bust_on
                ON {table}(cacheBustOnUtcDate);
            "#,
            table = TRACKING_TABLE
        ))?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self { conn })
    }
}

impl TrackingStore for SqliteTrackingStore {
    fn record(&self, entry: &str, bust_on: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (entry, cacheBustOnUtcDate) VALUES (?1, ?2)",
                TRACKING_TABLE
            ),
            params![entry, format_date(bust_on)],
        )?;
        Ok(())
    }

    fn expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<TrackingRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT entry, cacheBustOnUtcDate FROM {}
             WHERE cacheBustOnUtcDate <= ?1
             ORDER BY entry",
            TRACKING_TABLE
        ))?;

        let rows = stmt
            .query_map([format_date(cutoff)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(entry, date)| -> Result<TrackingRecord> {
                Ok(TrackingRecord {
                    entry,
                    cache_bust_on: parse_date(&date)?,
                })
            })
            .collect()
    }

    fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE cacheBustOnUtcDate <= ?1",
                TRACKING_TABLE
            ),
            [format_date(cutoff)],
        )?;
        Ok(deleted)
    }

    fn delete_all(&self) -> Result<usize> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {}", TRACKING_TABLE), [])?;
        Ok(deleted)
    }

    fn stats(&self, cutoff: DateTime<Utc>) -> Result<TrackingStats> {
        let cutoff = format_date(cutoff);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", TRACKING_TABLE),
            [],
            |r| r.get(0),
        )?;

        let expired: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE cacheBustOnUtcDate <= ?1",
                TRACKING_TABLE
            ),
            [&cutoff],
            |r| r.get(0),
        )?;

        let next: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT MIN(cacheBustOnUtcDate) FROM {} WHERE cacheBustOnUtcDate > ?1",
                    TRACKING_TABLE
                ),
                [&cutoff],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        Ok(TrackingStats {
            total: total as usize,
            expired: expired as usize,
            next_bust: next.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// SQLite tracking table opened on first use.
///
/// Writing pages never reads the tracking table, so a missing or unusable
/// database only surfaces from the operations that need it.
pub struct LazyTrackingStore {
    path: PathBuf,
    store: OnceCell<SqliteTrackingStore>,
}

impl LazyTrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: OnceCell::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.store.get().is_some()
    }

    fn store(&self) -> Result<&SqliteTrackingStore> {
        self.store.get_or_try_init(|| {
            log::debug!("Opening tracking table at {}", self.path.display());
            SqliteTrackingStore::open_at(&self.path)
        })
    }
}

impl TrackingStore for LazyTrackingStore {
    fn record(&self, entry: &str, bust_on: DateTime<Utc>) -> Result<()> {
        self.store()?.record(entry, bust_on)
    }

    fn expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<TrackingRecord>> {
        self.store()?.expired(cutoff)
    }

    fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.store()?.delete_expired(cutoff)
    }

    fn delete_all(&self) -> Result<usize> {
        self.store()?.delete_all()
    }

    fn stats(&self, cutoff: DateTime<Utc>) -> Result<TrackingStats> {
        self.store()?.stats(cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_delete_expired_uses_inclusive_cutoff() {
        let store = SqliteTrackingStore::open_in_memory().unwrap();
        store.record("example.com/old", at(8)).unwrap();
        store.record("example.com/now", at(10)).unwrap();
        store.record("example.com/later", at(12)).unwrap();

        let deleted = store.delete_expired(at(10)).unwrap();
        assert_eq!(deleted, 2);

        let stats = store.stats(at(10)).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.expired, 0);
        assert_eq!(stats.next_bust, Some(at(12)));
    }

    #[test]
    fn test_expired_lists_entries() {
        let store = SqliteTrackingStore::open_in_memory().unwrap();
        store.record("b", at(9)).unwrap();
        store.record("a", at(8)).unwrap();
        store.record("c", at(11)).unwrap();

        let expired = store.expired(at(10)).unwrap();
        let entries: Vec<_> = expired.iter().map(|r| r.entry.as_str()).collect();
        assert_eq!(entries, vec!["a", "b"]);
        assert_eq!(expired[0].cache_bust_on, at(8));
    }

    #[test]
    fn test_record_replaces_existing() {
        let store = SqliteTrackingStore::open_in_memory().unwrap();
        store.record("page", at(8)).unwrap();
        store.record("page", at(20)).unwrap();

        let stats = store.stats(at(10)).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_delete_all() {
        let store = SqliteTrackingStore::open_in_memory().unwrap();
        store.record("a", at(8)).unwrap();
        store.record("b", at(20)).unwrap();

        assert_eq!(store.delete_all().unwrap(), 2);
        assert_eq!(store.stats(at(10)).unwrap(), TrackingStats::default());
    }

    #[test]
    fn test_subsecond_bust_dates_truncate() {
        let store = SqliteTrackingStore::open_in_memory().unwrap();
        let bust = at(10) + Duration::milliseconds(500);
        store.record("page", bust).unwrap();

        assert_eq!(store.delete_expired(at(10)).unwrap(), 1);
    }

    #[test]
    fn test_open_at_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tracking.db");

        {
            let store = SqliteTrackingStore::open_at(&path).unwrap();
            store.record("page", at(8)).unwrap();
        }

        let store = SqliteTrackingStore::open_at(&path).unwrap();
        assert_eq!(store.stats(at(10)).unwrap().total, 1);
    }

    #[test]
    fn test_open_at_rebuilds_on_version_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracking.db");

        {
            let store = SqliteTrackingStore::open_at(&path).unwrap();
            store.record("page", at(8)).unwrap();
            store
                .conn
                .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
                .unwrap();
        }

        let store = SqliteTrackingStore::open_at(&path).unwrap();
        assert_eq!(store.stats(at(10)).unwrap().total, 0);
    }

    #[test]
    fn test_lazy_store_opens_on_first_use() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tracking.db");

        let store = LazyTrackingStore::new(&path);
        assert!(!store.is_open());
        assert!(!path.exists());

        store.record("page", at(8)).unwrap();
        assert!(store.is_open());
        assert!(path.exists());
        assert_eq!(store.stats(at(10)).unwrap().expired, 1);
    }

    #[test]
    fn test_lazy_store_reports_open_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let store = LazyTrackingStore::new(blocker.join("tracking.db"));
        assert!(matches!(store.delete_all(), Err(CacheError::Io(_))));
        assert!(!store.is_open());
    }
}
