//! Data model shared by every stage of the engine.
//!
//! The types fall into three groups:
//!
//! - **Declarations**: [`SemanticType`] and [`FieldDef`] describe what a
//!   record type declares.
//! - **Schema**: [`ColumnKind`], [`Column`] and [`Schema`] describe the table
//!   derived from those declarations.
//! - **Values**: [`FieldValue`] is a typed field value as the application
//!   sees it, [`Value`] is the primitive cell the storage engine sees, and
//!   [`Row`] / [`Statement`] carry them across the storage boundary.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of the implicit identity column present in every table.
pub const ID_COLUMN: &str = "_id";

/// Primitive column category understood by the storage engine.
///
/// # Examples
///
/// ```
/// use recordlite_core::ColumnKind;
///
/// assert_eq!(ColumnKind::Real.keyword(), "REAL");
/// assert_eq!(ColumnKind::Text.to_string(), "TEXT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnKind {
    /// Returns the type keyword used in `CREATE TABLE` statements.
    pub fn keyword(self) -> &'static str {
        match self {
            ColumnKind::Null => "NULL",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
            ColumnKind::Blob => "BLOB",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Declared semantic type of a record field.
///
/// [`Other`](SemanticType::Other) names a declared type the engine has no
/// column mapping for; introspecting a record that declares one fails with
/// [`RecordError::UnsupportedType`](crate::RecordError::UnsupportedType).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// UTF-8 text.
    Text,
    /// Arbitrary-precision decimal, stored as plain text.
    Decimal,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// Boolean, stored as `1` / `0`.
    Boolean,
    /// UTC timestamp, stored as epoch milliseconds.
    Timestamp,
    /// Double-precision float.
    Double,
    /// Single-precision float.
    Float,
    /// Any other declared type, by name.
    Other(&'static str),
}

impl SemanticType {
    /// Returns a short human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            SemanticType::Text => "text",
            SemanticType::Decimal => "decimal",
            SemanticType::Integer => "integer",
            SemanticType::Long => "long",
            SemanticType::Boolean => "boolean",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Double => "double",
            SemanticType::Float => "float",
            SemanticType::Other(name) => name,
        }
    }
}

/// Static descriptor of one application-declared field.
///
/// Record types publish a table of these in declaration order; the engine
/// consumes that table instead of inspecting the type at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, which doubles as the column name.
    pub name: &'static str,
    /// Declared semantic type.
    pub ty: SemanticType,
}

impl FieldDef {
    /// Creates a descriptor. Usable in `const` and `static` tables.
    pub const fn new(name: &'static str, ty: SemanticType) -> Self {
        Self { name, ty }
    }
}

/// One column of a derived table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    /// Creates a column description.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage column kind.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Returns `true` for the implicit identity column.
    pub fn is_identity(&self) -> bool {
        self.name == ID_COLUMN
    }
}

/// Table schema derived from a record type.
///
/// The first column is always the identity column [`ID_COLUMN`]; the rest
/// follow the record's field declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    table: String,
    columns: Vec<Column>,
}

impl Schema {
    /// Builds a schema from a table name and the application columns,
    /// prepending the identity column.
    pub fn new(table: impl Into<String>, data_columns: Vec<Column>) -> Self {
        let mut columns = Vec::with_capacity(data_columns.len() + 1);
        columns.push(Column::new(ID_COLUMN, ColumnKind::Integer));
        columns.extend(data_columns);
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All columns, identity first.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Columns excluding the identity column.
    pub fn data_columns(&self) -> &[Column] {
        &self.columns[1..]
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A primitive cell value as stored by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Returns the column kind this value naturally belongs to.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Null => ColumnKind::Null,
            Value::Integer(_) => ColumnKind::Integer,
            Value::Real(_) => ColumnKind::Real,
            Value::Text(_) => ColumnKind::Text,
            Value::Blob(_) => ColumnKind::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

/// A typed field value as the application declares it.
///
/// [`Absent`](FieldValue::Absent) is the value of an unset optional field
/// and maps to SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Decimal(BigDecimal),
    Integer(i32),
    Long(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Double(f64),
    Float(f32),
}

impl FieldValue {
    /// Semantic type of the value, or `None` when absent.
    pub fn semantic_type(&self) -> Option<SemanticType> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Text(_) => Some(SemanticType::Text),
            FieldValue::Decimal(_) => Some(SemanticType::Decimal),
            FieldValue::Integer(_) => Some(SemanticType::Integer),
            FieldValue::Long(_) => Some(SemanticType::Long),
            FieldValue::Boolean(_) => Some(SemanticType::Boolean),
            FieldValue::Timestamp(_) => Some(SemanticType::Timestamp),
            FieldValue::Double(_) => Some(SemanticType::Double),
            FieldValue::Float(_) => Some(SemanticType::Float),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

/// One result row: column names paired with primitive cells, in select
/// order.
///
/// # Examples
///
/// ```
/// use recordlite_core::{Row, Value};
///
/// let row = Row::new()
///     .with("_id", Value::Integer(7))
///     .with("name", Value::Text("Alice".into()))
///     .with("age", Value::Null);
///
/// assert_eq!(row.get_i64("_id"), Some(7));
/// assert_eq!(row.get_str("name"), Some("Alice"));
/// assert!(row.is_null("age"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.cells.push((column.into(), value));
    }

    /// Appends a cell, builder style.
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over `(column, cell)` pairs in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the cell for a column, if the row has that column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the column holds `NULL` or is not in the row.
    pub fn is_null(&self, column: &str) -> bool {
        self.get(column).is_none_or(Value::is_null)
    }

    /// Reads a cell as a 64-bit integer.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(v) => Some(*v),
            Value::Real(v) => Some(*v as i64),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Reads a cell as a double.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Reads a text cell.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// SQL text plus its positional bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Statement {
    /// A statement without bind values.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    pub fn with_binds(mut self, binds: Vec<Value>) -> Self {
        self.binds = binds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_prepends_identity_column() {
        let schema = Schema::new(
            "Person",
            vec![
                Column::new("name", ColumnKind::Text),
                Column::new("age", ColumnKind::Integer),
            ],
        );
        assert_eq!(schema.column_names(), vec!["_id", "name", "age"]);
        assert!(schema.columns()[0].is_identity());
        assert_eq!(schema.data_columns().len(), 2);
        assert_eq!(schema.column("age").unwrap().kind(), ColumnKind::Integer);
        assert!(schema.column("missing").is_none());
    }

    #[test]
    fn test_schema_serializes_for_diagnostics() {
        let schema = Schema::new("Note", vec![Column::new("body", ColumnKind::Text)]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["table"], "Note");
        assert_eq!(json["columns"][0]["name"], "_id");
        assert_eq!(json["columns"][1]["kind"], "Text");
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new()
            .with("a", Value::Integer(3))
            .with("b", Value::Real(2.5))
            .with("c", Value::Text("12".into()))
            .with("d", Value::Null);

        assert_eq!(row.len(), 4);
        assert_eq!(row.get_i64("a"), Some(3));
        assert_eq!(row.get_f64("a"), Some(3.0));
        assert_eq!(row.get_f64("b"), Some(2.5));
        assert_eq!(row.get_i64("c"), Some(12));
        assert_eq!(row.get_str("c"), Some("12"));
        assert!(row.is_null("d"));
        assert!(row.is_null("nope"));
        assert!(!row.is_null("a"));
        assert_eq!(row.get_i64("d"), None);
    }

    #[test]
    fn test_field_value_semantic_type() {
        assert_eq!(FieldValue::Absent.semantic_type(), None);
        assert_eq!(
            FieldValue::Boolean(true).semantic_type(),
            Some(SemanticType::Boolean)
        );
        assert!(FieldValue::Absent.is_absent());
    }
}
