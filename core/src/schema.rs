//! Schema derivation from record declarations.
//!
//! [`introspect`] walks a record type's descriptor table once and produces
//! its [`Schema`]. [`SchemaRegistry`] memoizes the result per type so every
//! later caller shares the same `Arc<Schema>`.
//!
//! # Concurrency
//!
//! Lookups take a read lock. On a miss the registry takes the write lock,
//! checks again, and only then introspects, so racing first callers run the
//! introspection once and nobody observes a partially built schema. Failed
//! introspections are not cached.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::{RecordError, Result};
use crate::mapper::column_kind_for;
use crate::record::Record;
use crate::types::{Column, ID_COLUMN, Schema};

/// SQLite keywords, uppercase and sorted for binary search.
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER",
    "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION",
    "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE", "WINDOW",
    "WITH", "WITHOUT",
];

fn is_keyword(name: &str) -> bool {
    SQLITE_KEYWORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Validates that a table or column name is a plain SQL identifier.
///
/// Names are spliced into statements unquoted, so SQLite keywords are
/// rejected along with anything that is not `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        || is_keyword(name)
    {
        return Err(RecordError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Derives the schema of a record type without caching.
///
/// # Errors
///
/// - [`RecordError::UnsupportedType`] if a field's type has no mapping.
/// - [`RecordError::InvalidIdentifier`] if the table or a field name is not
///   a plain identifier, a field is named `_id`, or two fields share a name.
pub fn introspect<R: Record>() -> Result<Schema> {
    let table = R::table_name();
    validate_identifier(table)?;

    let fields = R::fields();
    let mut seen = HashSet::with_capacity(fields.len() + 1);
    seen.insert(ID_COLUMN.to_string());

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        validate_identifier(field.name)?;
        // SQLite column names are case-insensitive.
        if !seen.insert(field.name.to_ascii_lowercase()) {
            return Err(RecordError::InvalidIdentifier(field.name.to_string()));
        }
        columns.push(Column::new(field.name, column_kind_for(field)?));
    }

    debug!(table, columns = columns.len(), "Introspected record type");
    Ok(Schema::new(table, columns))
}

/// Process-lifetime cache of derived schemas, keyed by record type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

static GLOBAL: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::new);

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry behind [`schema_for`].
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL
    }

    /// Returns the cached schema for `R`, introspecting it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`introspect`]; the failure is returned to
    /// every caller until the record type is fixed.
    pub fn schema_for<R: Record>(&self) -> Result<Arc<Schema>> {
        let key = TypeId::of::<R>();
        {
            let schemas = self.schemas.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(schema) = schemas.get(&key) {
                return Ok(Arc::clone(schema));
            }
        }

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = schemas.get(&key) {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(introspect::<R>()?);
        schemas.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    /// Returns `true` if `R`'s schema has already been derived.
    pub fn contains<R: Record>(&self) -> bool {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<R>())
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the schema of `R` from the process-wide registry.
///
/// # Examples
///
/// ```
/// use recordlite_core::{record, schema_for, ColumnKind};
///
/// record! {
///     struct Reading {
///         sensor: String,
///         celsius: f64,
///     }
/// }
///
/// let schema = schema_for::<Reading>().unwrap();
/// assert_eq!(schema.table(), "Reading");
/// assert_eq!(schema.column_names(), vec!["_id", "sensor", "celsius"]);
/// assert_eq!(schema.column("celsius").unwrap().kind(), ColumnKind::Real);
/// ```
pub fn schema_for<R: Record>() -> Result<Arc<Schema>> {
    SchemaRegistry::global().schema_for::<R>()
}
