//! [`Storage`] implementation over a single `rusqlite` connection.
//!
//! The connection sits behind a mutex so one handle can be shared by every
//! repository and thread; statements run one at a time, in the order the
//! callers reach the lock.

use std::str::Utf8Error;
use std::sync::{Mutex, MutexGuard, PoisonError};

use recordlite_core::{Row, Statement, Storage, StorageError, StorageResult, Value};
use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};

/// Converts an engine value into a `rusqlite` bind value.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Converts a result cell into an engine value.
///
/// `TEXT` cells must hold valid UTF-8.
pub(crate) fn from_sql(cell: ValueRef<'_>) -> Result<Value, Utf8Error> {
    Ok(match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(std::str::from_utf8(bytes)?.to_string()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

fn failed(operation: &str, statement: &Statement, err: rusqlite::Error) -> StorageError {
    StorageError::with_source(format!("{operation} '{}'", statement.sql), err)
}

/// A shared SQLite connection exposed through the [`Storage`] trait.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Wraps an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Locks the connection for direct use.
    ///
    /// A panic while the lock was held does not leave the connection in an
    /// unusable state, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consumes the storage and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for SqliteStorage {
    fn execute(&self, statement: &Statement) -> StorageResult<usize> {
        let conn = self.lock();
        conn.execute(&statement.sql, params_from_iter(statement.binds.iter().map(to_sql)))
            .map_err(|e| failed("execute", statement, e))
    }

    fn query_scalar(&self, statement: &Statement) -> StorageResult<i64> {
        let conn = self.lock();
        conn.query_row(
            &statement.sql,
            params_from_iter(statement.binds.iter().map(to_sql)),
            |row| row.get::<_, i64>(0),
        )
        .map_err(|e| failed("query scalar", statement, e))
    }

    fn query(&self, statement: &Statement) -> StorageResult<Vec<Row>> {
        let conn = self.lock();
        let run = || -> rusqlite::Result<Vec<Row>> {
            let mut stmt = conn.prepare(&statement.sql)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(statement.binds.iter().map(to_sql)))?;

            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut out = Row::new();
                for (i, name) in names.iter().enumerate() {
                    let value = from_sql(row.get_ref(i)?).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(i, Type::Text, Box::new(e))
                    })?;
                    out.push(name.as_str(), value);
                }
                result.push(out);
            }
            Ok(result)
        };
        run().map_err(|e| failed("query", statement, e))
    }

    fn insert(&self, statement: &Statement) -> StorageResult<i64> {
        let conn = self.lock();
        conn.execute(&statement.sql, params_from_iter(statement.binds.iter().map(to_sql)))
            .map_err(|e| failed("insert", statement, e))?;
        Ok(conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SqliteStorage {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (_id INTEGER PRIMARY KEY AUTOINCREMENT, a TEXT, b REAL);",
        )
        .unwrap();
        SqliteStorage::new(conn)
    }

    #[test]
    fn test_value_conversion_covers_every_kind() {
        for value in [
            Value::Null,
            Value::Integer(-3),
            Value::Real(0.5),
            Value::Text("x".into()),
            Value::Blob(vec![0, 255]),
        ] {
            let sql = to_sql(&value);
            assert_eq!(from_sql(ValueRef::from(&sql)).unwrap(), value);
        }
    }

    #[test]
    fn test_insert_returns_row_identity() {
        let storage = storage();
        let insert = Statement::new("INSERT INTO t (a, b) VALUES (?, ?)")
            .with_binds(vec![Value::Text("one".into()), Value::Real(1.0)]);
        assert_eq!(storage.insert(&insert).unwrap(), 1);
        assert_eq!(storage.insert(&insert).unwrap(), 2);

        let count = storage
            .query_scalar(&Statement::new("SELECT COUNT(*) FROM t"))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_query_preserves_column_names_and_order() {
        let storage = storage();
        storage
            .execute(
                &Statement::new("INSERT INTO t (a, b) VALUES (?, ?)")
                    .with_binds(vec![Value::Null, Value::Real(2.5)]),
            )
            .unwrap();

        let rows = storage
            .query(&Statement::new("SELECT _id, a, b FROM t"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        let columns: Vec<_> = rows[0].iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["_id", "a", "b"]);
        assert!(rows[0].is_null("a"));
        assert_eq!(rows[0].get_f64("b"), Some(2.5));
    }

    #[test]
    fn test_invalid_utf8_text_is_an_error() {
        let storage = storage();
        let err = storage
            .query(&Statement::new("SELECT CAST(X'FF' AS TEXT) AS a"))
            .unwrap_err();
        assert!(err.message().contains("SELECT CAST"));
        assert!(std::error::Error::source(&err).is_some());

        let rows = storage
            .query(&Statement::new("SELECT CAST(X'C3A9' AS TEXT) AS a"))
            .unwrap();
        assert_eq!(rows[0].get_str("a"), Some("\u{e9}"));
    }

    #[test]
    fn test_failures_carry_sql_and_source() {
        let storage = storage();
        let err = storage
            .execute(&Statement::new("DELETE FROM missing_table"))
            .unwrap_err();
        assert!(err.message().contains("missing_table"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
