//! Record mapping engine: declare a record type once, get a table schema,
//! CRUD statements, equality queries and row hydration without writing SQL
//! or mapping code by hand.
//!
//! # Architecture
//!
//! The crate is organized as a pipeline of small stages:
//!
//! - **`mapper`**: semantic field types ↔ storage column kinds and values
//! - **`schema`**: derives a [`Schema`] from a [`Record`] and caches it
//! - **`query`**: pure SQL builders producing [`Statement`]s
//! - **`convert`**: records → bind values, result rows → [`Entity`]
//! - **`repository`**: the per-table facade driving a [`Storage`] handle
//!
//! The database itself is a collaborator behind the [`Storage`] trait; the
//! `recordlite-sqlite` crate provides the SQLite implementation.
//!
//! # Example
//!
//! ```
//! use recordlite_core::{build_select, record, schema_for, Conditions};
//!
//! record! {
//!     #[derive(Debug, Clone)]
//!     pub struct Person {
//!         pub name: String,
//!         pub age: Option<i32>,
//!     }
//! }
//!
//! let schema = schema_for::<Person>().unwrap();
//! let conditions = Conditions::new().with("name", "Alice").with("age", 30);
//! let select = build_select(&schema, &conditions, 0).unwrap();
//!
//! assert_eq!(
//!     select.sql,
//!     "SELECT _id, name, age FROM Person WHERE name = ?  and  age = ?"
//! );
//! ```

mod convert;
mod error;
mod mapper;
mod query;
mod record;
mod repository;
mod schema;
mod storage;
mod types;

pub use convert::{hydrate, to_storage_values};
pub use error::{RecordError, Result};
pub use mapper::{
    BOOLEAN_FALSE, BOOLEAN_TRUE, FieldType, bind_text, column_kind, column_kind_for, from_storage,
    to_storage,
};
pub use query::{
    Conditions, build_count, build_create_table, build_delete, build_drop, build_insert,
    build_select, build_select_by_id, build_truncate, build_update,
};
pub use record::{Entity, Fields, Record};
pub use repository::{Repository, SaveOutcome};
pub use schema::{SchemaRegistry, introspect, schema_for};
pub use storage::{Storage, StorageError, StorageResult};
pub use types::*;
