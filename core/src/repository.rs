//! Per-table persistence facade.
//!
//! [`Repository`] ties a record type to a [`Storage`] handle and drives the
//! other stages: it derives (or fetches) the schema, converts records into
//! statement binds, hands statements to storage and hydrates the rows that
//! come back.
//!
//! # Instance lifecycle
//!
//! ```text
//! Entity::new ──save──▶ persisted ──save──▶ persisted (same identity)
//!                           │
//!                           └──delete──▶ gone (the Entity is consumed)
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::convert::{hydrate, to_storage_values};
use crate::error::{RecordError, Result};
use crate::query::{
    Conditions, build_count, build_create_table, build_delete, build_drop, build_insert,
    build_select, build_select_by_id, build_truncate, build_update,
};
use crate::record::{Entity, Record};
use crate::schema::SchemaRegistry;
use crate::storage::{Storage, StorageError};
use crate::types::{Schema, Statement};

/// Result of [`Repository::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new row was inserted with this identity.
    Inserted(i64),
    /// The existing row with this identity was updated.
    Updated(i64),
    /// No row with this identity exists any more; nothing was written.
    Stale(i64),
}

impl SaveOutcome {
    /// The identity the save was about.
    pub fn id(self) -> i64 {
        match self {
            SaveOutcome::Inserted(id) | SaveOutcome::Updated(id) | SaveOutcome::Stale(id) => id,
        }
    }

    /// `true` when the handle no longer matched a stored row.
    pub fn is_stale(self) -> bool {
        matches!(self, SaveOutcome::Stale(_))
    }
}

/// CRUD and query operations for one record type against one storage handle.
pub struct Repository<'s, R, S: ?Sized> {
    storage: &'s S,
    schema: Arc<Schema>,
    _record: PhantomData<fn() -> R>,
}

impl<'s, R: Record, S: Storage + ?Sized> Repository<'s, R, S> {
    /// Creates a repository using the process-wide schema registry.
    ///
    /// # Errors
    ///
    /// Fails if `R`'s schema cannot be derived (see
    /// [`introspect`](crate::introspect)).
    pub fn new(storage: &'s S) -> Result<Self> {
        Self::with_registry(storage, SchemaRegistry::global())
    }

    /// Creates a repository using the given schema registry.
    ///
    /// # Errors
    ///
    /// Fails if `R`'s schema cannot be derived.
    pub fn with_registry(storage: &'s S, registry: &SchemaRegistry) -> Result<Self> {
        Ok(Self {
            storage,
            schema: registry.schema_for::<R>()?,
            _record: PhantomData,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        self.schema.table()
    }

    /// The `CREATE TABLE` DDL for this record type.
    pub fn create_table_sql(&self) -> String {
        build_create_table(&self.schema).sql
    }

    /// Issues the `CREATE TABLE IF NOT EXISTS` DDL.
    pub fn create_table(&self) -> Result<()> {
        self.execute(&build_create_table(&self.schema))?;
        Ok(())
    }

    fn trace(&self, statement: &Statement) {
        debug!(
            table = self.schema.table(),
            sql = %statement.sql,
            binds = statement.binds.len(),
            "Issuing statement"
        );
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        self.trace(statement);
        Ok(self.storage.execute(statement)?)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Entity<R>>> {
        self.trace(statement);
        let rows = self.storage.query(statement)?;
        rows.iter().map(|row| hydrate(&self.schema, row)).collect()
    }

    /// Persists the entity.
    ///
    /// A new entity is inserted and receives the storage-assigned identity.
    /// A persisted entity is updated in place; if its row has disappeared
    /// the result is [`SaveOutcome::Stale`] and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns conversion errors for field values that do not match their
    /// declarations, and [`RecordError::Storage`] when storage fails or
    /// does not report an identity for an insert.
    pub fn save(&self, entity: &mut Entity<R>) -> Result<SaveOutcome> {
        let values = to_storage_values(&self.schema, entity.record())?;

        if let (false, Some(id)) = (entity.is_new(), entity.id()) {
            let statement = build_update(&self.schema, &values, id)?;
            if self.execute(&statement)? == 0 {
                warn!(table = self.schema.table(), id, "Save found no row to update");
                return Ok(SaveOutcome::Stale(id));
            }
            return Ok(SaveOutcome::Updated(id));
        }

        let statement = build_insert(&self.schema, &values)?;
        self.trace(&statement);
        let id = self.storage.insert(&statement)?;
        if id < 0 {
            return Err(StorageError::new(format!(
                "insert into '{}' did not return a row identity",
                self.schema.table()
            ))
            .into());
        }
        entity.mark_persisted(id);
        Ok(SaveOutcome::Inserted(id))
    }

    /// Loads the row with the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] if no row has that identity.
    pub fn find(&self, id: i64) -> Result<Entity<R>> {
        self.query(&build_select_by_id(&self.schema, id))?
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::NotFound {
                table: self.schema.table().to_string(),
                id,
            })
    }

    /// Loads rows matching every condition, in storage order.
    ///
    /// `limit == 0` means no limit.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] for a negative limit, an
    /// unknown condition column or an absent condition value.
    pub fn find_by(&self, conditions: &Conditions, limit: i64) -> Result<Vec<Entity<R>>> {
        self.query(&build_select(&self.schema, conditions, limit)?)
    }

    /// Loads every row, up to `limit` (`0` for all).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] for a negative limit.
    pub fn find_all(&self, limit: i64) -> Result<Vec<Entity<R>>> {
        self.find_by(&Conditions::new(), limit)
    }

    /// Deletes the entity's row and consumes the handle.
    ///
    /// Returns `true` if a row was removed. An entity that was never saved
    /// has no row and yields `false` without touching storage.
    pub fn delete(&self, entity: Entity<R>) -> Result<bool> {
        let Some(id) = entity.id() else {
            debug!(table = self.schema.table(), "Delete of unsaved entity ignored");
            return Ok(false);
        };
        Ok(self.execute(&build_delete(&self.schema, id))? > 0)
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<i64> {
        let statement = build_count(&self.schema);
        self.trace(&statement);
        Ok(self.storage.query_scalar(&statement)?)
    }

    /// Deletes every row and returns how many were removed.
    pub fn truncate(&self) -> Result<usize> {
        self.execute(&build_truncate(&self.schema))
    }

    /// Drops the table.
    ///
    /// The table must be recreated (for example with
    /// [`create_table`](Self::create_table)) before this repository is used
    /// again.
    pub fn drop_table(&self) -> Result<()> {
        self.execute(&build_drop(&self.schema))?;
        Ok(())
    }
}
