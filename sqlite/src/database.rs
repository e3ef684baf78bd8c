//! Shared database handle and table lifecycle.
//!
//! A [`Database`] owns the one connection every record type uses. It applies
//! the configured pragmas, keeps the store's schema version in
//! `PRAGMA user_version`, and creates a record type's table the first time
//! a repository for it is opened.
//!
//! # Example
//!
//! ```
//! use recordlite_core::{record, Entity};
//! use recordlite_sqlite::Database;
//!
//! record! {
//!     pub struct Note {
//!         pub body: String,
//!     }
//! }
//!
//! let db = Database::open_in_memory().unwrap();
//! let notes = db.repository::<Note>().unwrap();
//!
//! let mut note = Entity::new(Note { body: "hello".into() });
//! let id = notes.save(&mut note).unwrap().id();
//! assert_eq!(notes.find(id).unwrap().body, "hello");
//! assert_eq!(notes.count().unwrap(), 1);
//! ```

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use recordlite_core::{Record, Repository};
use rusqlite::Connection;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::{Result, SqliteError};
use crate::storage::SqliteStorage;

/// Called when the stored version is older than the configured one, with
/// the connection, the stored version and the configured version.
pub type UpgradeHook<'a> = &'a dyn Fn(&Connection, u32, u32) -> rusqlite::Result<()>;

/// The shared SQLite handle behind every repository.
pub struct Database {
    storage: SqliteStorage,
    config: StoreConfig,
    opened: Mutex<HashSet<String>>,
}

impl Database {
    /// Opens the store described by `config`.
    ///
    /// A version bump is accepted without running any upgrade logic; use
    /// [`open_with_upgrade`](Self::open_with_upgrade) to migrate data.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ConfigError`] for an invalid configuration or
    /// a store newer than the configured version, and
    /// [`SqliteError::DatabaseError`] if SQLite fails.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_upgrade(config, &|_, _, _| Ok(()))
    }

    /// Opens the store, running `upgrade` if its version is older than the
    /// configured one.
    ///
    /// The hook and the version update run in one transaction.
    ///
    /// # Errors
    ///
    /// As for [`open`](Self::open), plus any error returned by the hook.
    pub fn open_with_upgrade(config: StoreConfig, upgrade: UpgradeHook<'_>) -> Result<Self> {
        config.validate()?;
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };

        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        apply_version(&conn, config.version, upgrade)?;

        Ok(Self {
            storage: SqliteStorage::new(conn),
            config,
            opened: Mutex::new(HashSet::new()),
        })
    }

    /// Opens a private in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory())
    }

    /// Returns a repository for `R`, creating its table on first open.
    ///
    /// The create hook runs at most once per table for this handle, and
    /// only if the table does not already exist.
    ///
    /// # Errors
    ///
    /// Fails if `R`'s schema cannot be derived or the table cannot be
    /// created.
    pub fn repository<R: Record>(&self) -> Result<Repository<'_, R, SqliteStorage>> {
        let repo = Repository::new(&self.storage)?;

        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if !opened.contains(repo.table_name()) {
            if !self.table_exists(repo.table_name())? {
                repo.create_table()?;
                info!(table = repo.table_name(), "Created table");
            }
            opened.insert(repo.table_name().to_string());
        }
        Ok(repo)
    }

    /// Issues `R`'s `CREATE TABLE` DDL.
    ///
    /// This is how a table is brought back after
    /// [`Repository::drop_table`].
    pub fn create_table<R: Record>(&self) -> Result<()> {
        let repo: Repository<'_, R, SqliteStorage> = Repository::new(&self.storage)?;
        repo.create_table()?;
        info!(table = repo.table_name(), "Created table");
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(repo.table_name().to_string());
        Ok(())
    }

    /// Checks whether a table exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = self.storage.lock();
        let mut stmt =
            conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// The version currently recorded in the store.
    pub fn version(&self) -> Result<u32> {
        read_version(&self.storage.lock())
    }

    /// The configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The storage handle shared by all repositories.
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Locks the underlying connection.
    ///
    /// Repository calls on this handle block until the guard is dropped.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.storage.lock()
    }

    /// Runs `f` with the underlying connection locked.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        Ok(f(&self.storage.lock())?)
    }

    /// Consumes the handle and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.storage.into_connection()
    }
}

fn read_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn apply_version(conn: &Connection, target: u32, upgrade: UpgradeHook<'_>) -> Result<()> {
    let current = read_version(conn)?;
    if current > target {
        return Err(SqliteError::ConfigError(format!(
            "store is at version {current}, newer than configured version {target}"
        )));
    }
    if current == target {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    if current == 0 {
        info!(version = target, "Initializing store version");
    } else {
        info!(from = current, to = target, "Upgrading store");
        upgrade(&tx, current, target)?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {target};"))?;
    tx.commit()?;
    Ok(())
}
