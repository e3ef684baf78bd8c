//! Parameterized SQL generation.
//!
//! Every builder is a pure function of a [`Schema`] and its arguments and
//! returns a [`Statement`]: SQL text with `?` placeholders plus the bind
//! values in placeholder order. Nothing here touches a database, so the
//! output can be asserted as plain strings.
//!
//! Identifiers are spliced into the SQL text unquoted. Table and column
//! names are validated during introspection, and condition columns must
//! belong to the schema.

use crate::error::{RecordError, Result};
use crate::mapper::bind_text;
use crate::types::{FieldValue, ID_COLUMN, Schema, Statement, Value};

/// Separator between equality clauses in a `WHERE`.
const AND: &str = "  and  ";

/// Equality filters, ANDed together in insertion order.
///
/// # Examples
///
/// ```
/// use recordlite_core::Conditions;
///
/// let conditions = Conditions::new().with("name", "Alice").with("age", 30);
/// assert_eq!(conditions.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, FieldValue)>,
}

impl Conditions {
    /// An empty condition set, which matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value`, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Adds `column = value`.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.entries.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

fn column_list(schema: &Schema) -> String {
    schema.column_names().join(", ")
}

fn where_clause(schema: &Schema, conditions: &Conditions) -> Result<(String, Vec<Value>)> {
    let mut clauses = Vec::with_capacity(conditions.len());
    let mut binds = Vec::with_capacity(conditions.len());
    for (column, value) in conditions.iter() {
        if schema.column(column).is_none() {
            return Err(RecordError::InvalidArgument(format!(
                "unknown column '{column}' in conditions for '{}'",
                schema.table()
            )));
        }
        let text = bind_text(value).ok_or_else(|| {
            RecordError::InvalidArgument(format!("condition value for '{column}' is absent"))
        })?;
        clauses.push(format!("{column} = ?"));
        binds.push(Value::Text(text));
    }
    Ok((clauses.join(AND), binds))
}

/// Builds `SELECT <columns> FROM <table> [WHERE ...] [LIMIT n]`.
///
/// An empty condition set produces no `WHERE`; `limit == 0` produces no
/// `LIMIT`. Condition values are bound as text.
///
/// # Errors
///
/// Returns [`RecordError::InvalidArgument`] for a negative limit, a
/// condition on a column the schema does not have, or an absent condition
/// value.
pub fn build_select(schema: &Schema, conditions: &Conditions, limit: i64) -> Result<Statement> {
    if limit < 0 {
        return Err(RecordError::InvalidArgument(format!(
            "limit must be 0 (unlimited) or positive, got {limit}"
        )));
    }

    let mut sql = format!("SELECT {} FROM {}", column_list(schema), schema.table());
    let mut binds = Vec::new();
    if !conditions.is_empty() {
        let (clause, values) = where_clause(schema, conditions)?;
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
        binds = values;
    }
    if limit > 0 {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(Statement { sql, binds })
}

/// Builds the single-row select by identity.
pub fn build_select_by_id(schema: &Schema, id: i64) -> Statement {
    Statement {
        sql: format!(
            "SELECT {} FROM {} WHERE {ID_COLUMN} = ?",
            column_list(schema),
            schema.table()
        ),
        binds: vec![Value::Integer(id)],
    }
}

fn check_arity(schema: &Schema, values: &[Value]) -> Result<()> {
    let expected = schema.data_columns().len();
    if values.len() != expected {
        return Err(RecordError::InvalidArgument(format!(
            "'{}' has {expected} data columns but {} values were given",
            schema.table(),
            values.len()
        )));
    }
    Ok(())
}

/// Builds an `INSERT` for every column except the identity.
///
/// `values` are storage primitives in data-column order.
///
/// # Errors
///
/// Returns [`RecordError::InvalidArgument`] if the number of values does not
/// match the number of data columns.
pub fn build_insert(schema: &Schema, values: &[Value]) -> Result<Statement> {
    check_arity(schema, values)?;
    if values.is_empty() {
        return Ok(Statement::new(format!(
            "INSERT INTO {} DEFAULT VALUES",
            schema.table()
        )));
    }

    let names: Vec<&str> = schema.data_columns().iter().map(|c| c.name()).collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            schema.table(),
            names.join(", ")
        ),
        binds: values.to_vec(),
    })
}

/// Builds an `UPDATE` of every data column, keyed on identity.
///
/// # Errors
///
/// Returns [`RecordError::InvalidArgument`] if the number of values does not
/// match the number of data columns.
pub fn build_update(schema: &Schema, values: &[Value], id: i64) -> Result<Statement> {
    check_arity(schema, values)?;

    let assignments = if values.is_empty() {
        // Touch the row anyway so the affected count still reports existence.
        format!("{ID_COLUMN} = {ID_COLUMN}")
    } else {
        schema
            .data_columns()
            .iter()
            .map(|c| format!("{} = ?", c.name()))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut binds = values.to_vec();
    binds.push(Value::Integer(id));
    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {assignments} WHERE {ID_COLUMN} = ?",
            schema.table()
        ),
        binds,
    })
}

/// Builds a `DELETE` of one row by identity.
pub fn build_delete(schema: &Schema, id: i64) -> Statement {
    Statement {
        sql: format!("DELETE FROM {} WHERE {ID_COLUMN} = ?", schema.table()),
        binds: vec![Value::Integer(id)],
    }
}

/// Builds a `DELETE` of every row.
pub fn build_truncate(schema: &Schema) -> Statement {
    Statement::new(format!("DELETE FROM {}", schema.table()))
}

/// Builds a `DROP TABLE`.
pub fn build_drop(schema: &Schema) -> Statement {
    Statement::new(format!("DROP TABLE {}", schema.table()))
}

/// Builds a `SELECT COUNT(*)`.
pub fn build_count(schema: &Schema) -> Statement {
    Statement::new(format!("SELECT COUNT(*) FROM {}", schema.table()))
}

/// Builds the `CREATE TABLE` DDL.
///
/// The identity column always comes first as an auto-incrementing primary
/// key, followed by each data column with its storage type keyword.
///
/// # Examples
///
/// ```
/// use recordlite_core::{build_create_table, Column, ColumnKind, Schema};
///
/// let schema = Schema::new("Note", vec![Column::new("body", ColumnKind::Text)]);
/// assert_eq!(
///     build_create_table(&schema).sql,
///     "CREATE TABLE IF NOT EXISTS Note (_id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT)"
/// );
/// ```
pub fn build_create_table(schema: &Schema) -> Statement {
    let mut definitions = vec![format!("{ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    definitions.extend(
        schema
            .data_columns()
            .iter()
            .map(|c| format!("{} {}", c.name(), c.kind().keyword())),
    );
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.table(),
        definitions.join(", ")
    ))
}
