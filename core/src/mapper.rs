//! Mapping between declared field types and storage column kinds.
//!
//! | semantic type | column kind | stored as |
//! |---|---|---|
//! | text | `TEXT` | the string |
//! | decimal | `TEXT` | plain decimal text, never scientific notation |
//! | integer, long | `INTEGER` | the number |
//! | timestamp | `INTEGER` | epoch milliseconds |
//! | boolean | `INTEGER` | `1` / `0` |
//! | double, float | `REAL` | the number |
//!
//! Reading a boolean back treats exactly `1` as `true` and every other
//! integer as `false`.
//!
//! The [`FieldType`] trait ties Rust types to their [`SemanticType`], which
//! is what lets [`record!`](crate::record!) derive a descriptor table from a
//! plain struct definition.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::error::{RecordError, Result};
use crate::types::{ColumnKind, FieldDef, FieldValue, SemanticType, Value};

/// Stored value of a `true` boolean.
pub const BOOLEAN_TRUE: i64 = 1;
/// Stored value of a `false` boolean.
pub const BOOLEAN_FALSE: i64 = 0;

/// Maps a semantic type to its column kind, or `None` when unsupported.
///
/// # Examples
///
/// ```
/// use recordlite_core::{column_kind, ColumnKind, SemanticType};
///
/// assert_eq!(column_kind(SemanticType::Decimal), Some(ColumnKind::Text));
/// assert_eq!(column_kind(SemanticType::Timestamp), Some(ColumnKind::Integer));
/// assert_eq!(column_kind(SemanticType::Other("Vec<u8>")), None);
/// ```
pub fn column_kind(ty: SemanticType) -> Option<ColumnKind> {
    match ty {
        SemanticType::Text | SemanticType::Decimal => Some(ColumnKind::Text),
        SemanticType::Integer
        | SemanticType::Long
        | SemanticType::Timestamp
        | SemanticType::Boolean => Some(ColumnKind::Integer),
        SemanticType::Double | SemanticType::Float => Some(ColumnKind::Real),
        SemanticType::Other(_) => None,
    }
}

/// Maps a declared field to its column kind.
///
/// # Errors
///
/// Returns [`RecordError::UnsupportedType`] if the field's type has no
/// column mapping.
pub fn column_kind_for(field: &FieldDef) -> Result<ColumnKind> {
    column_kind(field.ty).ok_or_else(|| RecordError::UnsupportedType {
        field: field.name.to_string(),
        type_name: field.ty.name().to_string(),
    })
}

/// Converts a field value into the primitive cell stored for it.
pub fn to_storage(value: &FieldValue) -> Value {
    match value {
        FieldValue::Absent => Value::Null,
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Decimal(d) => Value::Text(d.to_plain_string()),
        FieldValue::Integer(v) => Value::Integer(i64::from(*v)),
        FieldValue::Long(v) => Value::Integer(*v),
        FieldValue::Boolean(b) => Value::Integer(if *b { BOOLEAN_TRUE } else { BOOLEAN_FALSE }),
        FieldValue::Timestamp(t) => Value::Integer(t.timestamp_millis()),
        FieldValue::Double(v) => Value::Real(*v),
        FieldValue::Float(v) => Value::Real(f64::from(*v)),
    }
}

/// Converts a stored cell back into a value of the field's declared type.
///
/// `NULL` always becomes [`FieldValue::Absent`].
///
/// # Errors
///
/// Returns [`RecordError::Conversion`] when the cell cannot represent a
/// value of the declared type (a blob in a text field, an out-of-range
/// integer, unparseable decimal text), and
/// [`RecordError::UnsupportedType`] for a field with no mapping.
pub fn from_storage(field: &FieldDef, cell: &Value) -> Result<FieldValue> {
    if cell.is_null() {
        return Ok(FieldValue::Absent);
    }
    let value = match (field.ty, cell) {
        (SemanticType::Text, Value::Text(s)) => FieldValue::Text(s.clone()),
        (SemanticType::Text, Value::Integer(v)) => FieldValue::Text(v.to_string()),
        (SemanticType::Text, Value::Real(v)) => FieldValue::Text(v.to_string()),

        (SemanticType::Decimal, Value::Text(s)) => {
            let d = BigDecimal::from_str(s.trim()).map_err(|e| {
                RecordError::Conversion(format!(
                    "field '{}': invalid decimal text '{s}': {e}",
                    field.name
                ))
            })?;
            FieldValue::Decimal(d)
        }
        (SemanticType::Decimal, Value::Integer(v)) => FieldValue::Decimal(BigDecimal::from(*v)),

        (SemanticType::Integer, Value::Integer(v)) => {
            let narrowed = i32::try_from(*v).map_err(|_| {
                RecordError::Conversion(format!(
                    "field '{}': {v} does not fit in a 32-bit integer",
                    field.name
                ))
            })?;
            FieldValue::Integer(narrowed)
        }
        (SemanticType::Long, Value::Integer(v)) => FieldValue::Long(*v),
        (SemanticType::Boolean, Value::Integer(v)) => FieldValue::Boolean(*v == BOOLEAN_TRUE),
        (SemanticType::Timestamp, Value::Integer(ms)) => {
            let t = DateTime::<Utc>::from_timestamp_millis(*ms).ok_or_else(|| {
                RecordError::Conversion(format!(
                    "field '{}': timestamp {ms}ms is out of range",
                    field.name
                ))
            })?;
            FieldValue::Timestamp(t)
        }

        (SemanticType::Double, Value::Real(v)) => FieldValue::Double(*v),
        (SemanticType::Double, Value::Integer(v)) => FieldValue::Double(*v as f64),
        (SemanticType::Float, Value::Real(v)) => FieldValue::Float(*v as f32),
        (SemanticType::Float, Value::Integer(v)) => FieldValue::Float(*v as f32),

        (SemanticType::Other(_), _) => {
            return Err(RecordError::UnsupportedType {
                field: field.name.to_string(),
                type_name: field.ty.name().to_string(),
            });
        }
        (ty, cell) => {
            return Err(RecordError::Conversion(format!(
                "field '{}': cannot read {} cell as {}",
                field.name,
                cell.kind(),
                ty.name()
            )));
        }
    };
    Ok(value)
}

/// Renders a field value as the text bound for an equality condition.
///
/// Returns `None` for [`FieldValue::Absent`]; equality conditions never
/// mean "matches NULL". Single-precision floats are widened before
/// rendering so the text compares equal to the stored `REAL`.
///
/// # Examples
///
/// ```
/// use recordlite_core::{bind_text, FieldValue};
///
/// assert_eq!(bind_text(&FieldValue::Integer(30)).as_deref(), Some("30"));
/// assert_eq!(bind_text(&FieldValue::Boolean(true)).as_deref(), Some("1"));
/// assert_eq!(bind_text(&FieldValue::Absent), None);
/// ```
pub fn bind_text(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Absent => return None,
        FieldValue::Text(s) => s.clone(),
        FieldValue::Decimal(d) => d.to_plain_string(),
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Long(v) => v.to_string(),
        FieldValue::Boolean(b) => (if *b { BOOLEAN_TRUE } else { BOOLEAN_FALSE }).to_string(),
        FieldValue::Timestamp(t) => t.timestamp_millis().to_string(),
        FieldValue::Double(v) => v.to_string(),
        FieldValue::Float(v) => f64::from(*v).to_string(),
    };
    Some(text)
}

/// A Rust type usable as a record field.
///
/// Implemented for the supported scalar types and for `Option<T>` of each,
/// where `None` is an absent value.
pub trait FieldType: Sized {
    /// Semantic type recorded in the field descriptor.
    const SEMANTIC: SemanticType;

    /// Converts the field into its typed value.
    fn to_field_value(&self) -> FieldValue;

    /// Rebuilds the field from a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Conversion`] if the value has another type,
    /// or is absent for a non-optional field.
    fn from_field_value(value: FieldValue) -> Result<Self>;
}

fn type_mismatch(expected: SemanticType, found: &FieldValue) -> RecordError {
    match found.semantic_type() {
        None => RecordError::Conversion(format!(
            "absent value for non-optional {} field",
            expected.name()
        )),
        Some(ty) => RecordError::Conversion(format!(
            "expected {} value, found {}",
            expected.name(),
            ty.name()
        )),
    }
}

macro_rules! scalar_field_type {
    ($ty:ty => $variant:ident) => {
        impl FieldType for $ty {
            const SEMANTIC: SemanticType = SemanticType::$variant;

            fn to_field_value(&self) -> FieldValue {
                FieldValue::$variant(self.clone())
            }

            fn from_field_value(value: FieldValue) -> Result<Self> {
                match value {
                    FieldValue::$variant(v) => Ok(v),
                    other => Err(type_mismatch(Self::SEMANTIC, &other)),
                }
            }
        }

        impl From<$ty> for FieldValue {
            fn from(v: $ty) -> Self {
                FieldValue::$variant(v)
            }
        }
    };
}

scalar_field_type!(String => Text);
scalar_field_type!(BigDecimal => Decimal);
scalar_field_type!(i32 => Integer);
scalar_field_type!(i64 => Long);
scalar_field_type!(bool => Boolean);
scalar_field_type!(DateTime<Utc> => Timestamp);
scalar_field_type!(f64 => Double);
scalar_field_type!(f32 => Float);

impl<T: FieldType> FieldType for Option<T> {
    const SEMANTIC: SemanticType = T::SEMANTIC;

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field_value(),
            None => FieldValue::Absent,
        }
    }

    fn from_field_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Absent => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Absent, Into::into)
    }
}
