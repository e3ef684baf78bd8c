//! SQLite backend for the record mapping engine.
//!
//! This crate implements the [`Storage`](recordlite_core::Storage) trait over
//! a `rusqlite` connection and wraps it in a [`Database`] handle that owns
//! the store's lifecycle: opening from a [`StoreConfig`], tracking the
//! schema version and creating record tables on first use.
//!
//! # Architecture
//!
//! - **`config`**: serializable store settings (YAML or JSON)
//! - **`storage`**: statement execution and value conversion
//! - **`database`**: open, version upgrades and table creation
//!
//! # Quick start
//!
//! ```no_run
//! use recordlite_core::{record, Conditions, Entity};
//! use recordlite_sqlite::{Database, StoreConfig};
//!
//! record! {
//!     pub struct Contact {
//!         pub name: String,
//!         pub email: Option<String>,
//!     }
//! }
//!
//! let db = Database::open(StoreConfig::new("contacts.db")).unwrap();
//! let contacts = db.repository::<Contact>().unwrap();
//!
//! let mut ada = Entity::new(Contact { name: "Ada".into(), email: None });
//! contacts.save(&mut ada).unwrap();
//!
//! let found = contacts
//!     .find_by(&Conditions::new().with("name", "Ada"), 1)
//!     .unwrap();
//! println!("{} contact(s) named Ada", found.len());
//! ```
//!
//! # Versioning
//!
//! The configured version is stored in `PRAGMA user_version`. Opening an
//! older store with [`Database::open_with_upgrade`] runs the upgrade hook
//! before the new version is recorded; a newer store is refused.

mod config;
mod database;
mod error;
mod storage;

pub use config::{MEMORY_PATH, StoreConfig};
pub use database::{Database, UpgradeHook};
pub use error::{Result, SqliteError};
pub use storage::SqliteStorage;
