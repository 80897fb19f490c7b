use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info, warn};

use cleanslate_core::{Action, ActionRecord, ExtStat, bias_for};

use crate::error::LearnError;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// SQLite-backed record of user feedback and the per-extension bias learned
/// from it.
///
/// All access goes through one connection behind a mutex, so concurrent
/// `record_action` calls are applied one at a time.
pub struct LearningStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl LearningStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LearnError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LearnError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Learning store opened");
        Ok(store)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, LearnError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    /// Well-known location of the store: `<data dir>/cleanslate/learning.sqlite3`.
    pub fn default_path() -> Result<PathBuf, LearnError> {
        dirs::data_dir()
            .map(|dir| dir.join("cleanslate").join("learning.sqlite3"))
            .ok_or(LearnError::NoDataDir)
    }

    /// File backing the store, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, LearnError> {
        configure_pragmas(&conn)?;
        migrate_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LearnError> {
        self.conn.lock().map_err(|_| LearnError::Poisoned)
    }

    /// Log one action and update the extension's stat, in one transaction.
    /// Returns the updated stat.
    pub fn record_action(&self, extension: &str, action: Action) -> Result<ExtStat, LearnError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO action_log (extension, action, recorded_at) VALUES (?1, ?2, ?3)",
            params![extension, action.as_ref(), Utc::now().to_rfc3339()],
        )?;

        let mut stat = read_stat(&tx, extension)?
            .unwrap_or_else(|| ExtStat::new(extension));
        stat.apply(action);
        write_stat(&tx, &stat)?;
        tx.commit()?;

        debug!(
            extension,
            %action,
            deletes = stat.delete_count,
            keeps = stat.keep_count,
            bias = stat.bias,
            "Recorded action"
        );
        Ok(stat)
    }

    /// Current bias for an extension, 0 if nothing was recorded for it.
    pub fn get_bias(&self, extension: &str) -> Result<i64, LearnError> {
        Ok(self.stat(extension)?.map_or(0, |s| s.bias))
    }

    /// Stat for an extension, if any action was recorded for it.
    pub fn stat(&self, extension: &str) -> Result<Option<ExtStat>, LearnError> {
        let conn = self.lock()?;
        read_stat(&conn, extension)
    }

    /// All stats, ordered by extension.
    pub fn stats(&self) -> Result<Vec<ExtStat>, LearnError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT extension, delete_count, keep_count, bias FROM ext_stats ORDER BY extension",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut stats = Vec::new();
        for row in rows {
            let (extension, deletes, keeps, bias) = row?;
            stats.push(stat_from_row(&extension, deletes, keeps, bias)?);
        }
        Ok(stats)
    }

    /// Bias of every known extension.
    pub fn biases(&self) -> Result<HashMap<CompactString, i64>, LearnError> {
        Ok(self
            .stats()?
            .into_iter()
            .map(|s| (s.extension, s.bias))
            .collect())
    }

    /// The whole action log, oldest first.
    pub fn actions(&self) -> Result<Vec<ActionRecord>, LearnError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT extension, action, recorded_at FROM action_log ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut actions = Vec::new();
        for row in rows {
            let (extension, action, recorded_at) = row?;
            actions.push(ActionRecord {
                extension: extension.into(),
                action: parse_action(&action)?,
                timestamp: DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| LearnError::corrupt("action_log", format!("{recorded_at}: {e}")))?
                    .with_timezone(&Utc),
            });
        }
        Ok(actions)
    }

    /// Recompute every stat by replaying the action log, in one transaction.
    pub fn rebuild_stats(&self) -> Result<Vec<ExtStat>, LearnError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut rebuilt: BTreeMap<String, ExtStat> = BTreeMap::new();
        {
            let mut stmt = tx.prepare_cached(
                "SELECT extension, action FROM action_log ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (extension, action) = row?;
                let action = parse_action(&action)?;
                rebuilt
                    .entry(extension)
                    .or_insert_with_key(|ext| ExtStat::new(ext.as_str()))
                    .apply(action);
            }
        }

        tx.execute("DELETE FROM ext_stats", [])?;
        for stat in rebuilt.values() {
            write_stat(&tx, stat)?;
        }
        tx.commit()?;

        info!(extensions = rebuilt.len(), "Rebuilt extension stats");
        Ok(rebuilt.into_values().collect())
    }

    /// Delete every action and stat, in one transaction.
    pub fn reset(&self) -> Result<(), LearnError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM action_log;
             DELETE FROM ext_stats;",
        )?;
        tx.commit()?;
        info!("Learning data reset");
        Ok(())
    }
}

fn configure_pragmas(conn: &Connection) -> Result<(), LearnError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    debug!("SQLite pragmas configured (WAL mode)");
    Ok(())
}

fn migrate_schema(conn: &Connection) -> Result<(), LearnError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(LearnError::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(include_str!("schema.sql"))?;
    debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
    Ok(())
}

fn read_stat(conn: &Connection, extension: &str) -> Result<Option<ExtStat>, LearnError> {
    let row = conn
        .prepare_cached(
            "SELECT delete_count, keep_count, bias FROM ext_stats WHERE extension = ?1",
        )?
        .query_row(params![extension], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .optional()?;

    row.map(|(deletes, keeps, bias)| stat_from_row(extension, deletes, keeps, bias))
        .transpose()
}

fn write_stat(tx: &Transaction<'_>, stat: &ExtStat) -> Result<(), LearnError> {
    let deletes = count_to_sql(stat.delete_count)?;
    let keeps = count_to_sql(stat.keep_count)?;
    tx.prepare_cached(
        "INSERT INTO ext_stats (extension, delete_count, keep_count, bias) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(extension) DO UPDATE SET \
             delete_count = excluded.delete_count, \
             keep_count = excluded.keep_count, \
             bias = excluded.bias",
    )?
    .execute(params![stat.extension.as_str(), deletes, keeps, stat.bias])?;
    Ok(())
}

fn stat_from_row(
    extension: &str,
    deletes: i64,
    keeps: i64,
    stored_bias: i64,
) -> Result<ExtStat, LearnError> {
    let delete_count = u64::try_from(deletes)
        .map_err(|_| corrupt_count(extension, "delete_count", deletes))?;
    let keep_count = u64::try_from(keeps)
        .map_err(|_| corrupt_count(extension, "keep_count", keeps))?;

    let bias = bias_for(delete_count, keep_count);
    if bias != stored_bias {
        warn!(
            extension,
            stored_bias,
            bias,
            "Stored bias out of date, using recomputed value"
        );
    }

    Ok(ExtStat {
        extension: extension.into(),
        delete_count,
        keep_count,
        bias,
    })
}

fn corrupt_count(extension: &str, column: &str, value: i64) -> LearnError {
    LearnError::corrupt("ext_stats", format!("{extension}: {column} {value}"))
}

fn count_to_sql(count: u64) -> Result<i64, LearnError> {
    i64::try_from(count)
        .map_err(|_| LearnError::corrupt("ext_stats", format!("count {count} overflows")))
}

fn parse_action(raw: &str) -> Result<Action, LearnError> {
    Action::from_str(raw)
        .map_err(|_| LearnError::corrupt("action_log", format!("unknown action {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_has_zero_bias() {
        let store = LearningStore::open_in_memory().unwrap();
        assert_eq!(store.get_bias(".nothing").unwrap(), 0);
        assert!(store.stat(".nothing").unwrap().is_none());
    }

    #[test]
    fn test_record_action_updates_stat() {
        let store = LearningStore::open_in_memory().unwrap();
        let stat = store.record_action(".tmp", Action::Delete).unwrap();
        assert_eq!(stat.delete_count, 1);
        assert_eq!(stat.bias, 10);

        let stat = store.record_action(".tmp", Action::Keep).unwrap();
        assert_eq!(stat.keep_count, 1);
        assert_eq!(stat.bias, 0);
        assert_eq!(store.actions().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_version_is_set() {
        let store = LearningStore::open_in_memory().unwrap();
        let conn = store.lock().unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_stale_stored_bias_is_recomputed() {
        let store = LearningStore::open_in_memory().unwrap();
        store.record_action(".log", Action::Delete).unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE ext_stats SET bias = -3 WHERE extension = '.log'",
                [],
            )
            .unwrap();
        assert_eq!(store.get_bias(".log").unwrap(), 10);
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let store = LearningStore::open_in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO action_log (extension, action, recorded_at) \
                 VALUES ('.a', 'keep', 'yesterday')",
                [],
            )
            .unwrap();
        assert!(matches!(
            store.actions(),
            Err(LearnError::CorruptRow {
                table: "action_log",
                ..
            })
        ));
    }
}
