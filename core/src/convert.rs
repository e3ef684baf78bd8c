//! Conversion between records and storage rows.
//!
//! [`to_storage_values`] flattens a record into the primitive values bound
//! by insert and update statements. [`hydrate`] goes the other way: it turns
//! a result row into a fresh [`Entity`], with the identity taken from the
//! `_id` cell and every other cell converted to its field's declared type.
//!
//! Hydration is strict about the column set. A row carrying a column the
//! record does not declare, or missing a declared one, fails with
//! [`RecordError::SchemaMismatch`] instead of being patched over.

use crate::error::{RecordError, Result};
use crate::mapper::{from_storage, to_storage};
use crate::record::{Entity, Fields, Record};
use crate::types::{FieldValue, ID_COLUMN, Row, Schema, Value};

fn mismatch(schema: &Schema, column: &str) -> RecordError {
    RecordError::SchemaMismatch {
        table: schema.table().to_string(),
        column: column.to_string(),
    }
}

/// Converts a record's fields into storage values in data-column order.
///
/// # Errors
///
/// Returns [`RecordError::SchemaMismatch`] if the record reports a different
/// number of values than it declares fields, and [`RecordError::Conversion`]
/// if a value's type differs from its declared type or a float is NaN or
/// infinite.
pub fn to_storage_values<R: Record>(schema: &Schema, record: &R) -> Result<Vec<Value>> {
    let defs = R::fields();
    let values = record.to_fields();
    if values.len() != defs.len() {
        let column = defs
            .get(values.len())
            .map_or(ID_COLUMN, |def| def.name);
        return Err(mismatch(schema, column));
    }

    defs.iter()
        .zip(&values)
        .map(|(def, value)| match value.semantic_type() {
            Some(ty) if ty != def.ty => Err(RecordError::Conversion(format!(
                "field '{}' is declared {} but holds a {} value",
                def.name,
                def.ty.name(),
                ty.name()
            ))),
            _ if !is_storable(value) => Err(RecordError::Conversion(format!(
                "field '{}' holds a non-finite {} value, which cannot be stored",
                def.name,
                def.ty.name()
            ))),
            _ => Ok(to_storage(value)),
        })
        .collect()
}

/// SQLite stores NaN as NULL, so non-finite floats would not read back.
fn is_storable(value: &FieldValue) -> bool {
    match value {
        FieldValue::Double(v) => v.is_finite(),
        FieldValue::Float(v) => v.is_finite(),
        _ => true,
    }
}

/// Builds a persisted [`Entity`] from a result row.
///
/// # Errors
///
/// - [`RecordError::SchemaMismatch`] if the row has a column with no
///   matching field, lacks a declared field, or lacks the identity.
/// - [`RecordError::Conversion`] if a cell cannot be read as its field's
///   type, or the identity cell is not an integer.
pub fn hydrate<R: Record>(schema: &Schema, row: &Row) -> Result<Entity<R>> {
    let defs = R::fields();
    let mut identity = None;
    let mut fields = Fields::with_capacity(defs.len());

    for (column, cell) in row.iter() {
        if column == ID_COLUMN {
            identity = match cell {
                Value::Integer(id) => Some(*id),
                other => {
                    return Err(RecordError::Conversion(format!(
                        "identity of '{}' holds a {} cell",
                        schema.table(),
                        other.kind()
                    )));
                }
            };
            continue;
        }

        let def = defs
            .iter()
            .find(|def| def.name == column)
            .ok_or_else(|| mismatch(schema, column))?;
        fields.insert(def.name, from_storage(def, cell)?);
    }

    if let Some(missing) = defs.iter().find(|def| !fields.contains(def.name)) {
        return Err(mismatch(schema, missing.name));
    }
    let id = identity.ok_or_else(|| mismatch(schema, ID_COLUMN))?;

    let record = R::from_fields(&mut fields)?;
    Ok(Entity::loaded(id, record))
}
