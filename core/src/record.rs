//! Record declaration and per-instance persistence state.
//!
//! A record type implements [`Record`] by publishing a static table of
//! [`FieldDef`]s and two conversions: record to [`FieldValue`]s in
//! declaration order, and [`Fields`] back to a record. The [`record!`]
//! macro writes all of that from an ordinary struct definition.
//!
//! The identity of a stored row is not an application field. It lives on
//! [`Entity`], the wrapper the engine hands out and takes back.
//!
//! # Example
//!
//! ```
//! use recordlite_core::{record, Entity, Record, SemanticType};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Person {
//!         pub name: String,
//!         pub age: Option<i32>,
//!     }
//! }
//!
//! assert_eq!(Person::table_name(), "Person");
//! assert_eq!(Person::fields()[1].ty, SemanticType::Integer);
//!
//! let alice = Entity::new(Person { name: "Alice".into(), age: Some(30) });
//! assert!(alice.is_new());
//! assert_eq!(alice.id(), None);
//! assert_eq!(alice.name, "Alice");
//! ```

use std::ops::{Deref, DerefMut};

use crate::error::{RecordError, Result};
use crate::mapper::FieldType;
use crate::types::{FieldDef, FieldValue};

/// An application-defined type persisted as one table row.
pub trait Record: Sized + 'static {
    /// Name of the backing table.
    ///
    /// Defaults to the type's own name with any module path stripped.
    fn table_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Declared fields, in declaration order. Must not include the identity.
    fn fields() -> &'static [FieldDef];

    /// Current field values, in the same order as [`fields`](Self::fields).
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Builds a record from hydrated field values.
    ///
    /// # Errors
    ///
    /// Implementations return [`RecordError::Conversion`] when a value does
    /// not fit its field.
    fn from_fields(fields: &mut Fields) -> Result<Self>;
}

/// Named field values handed to [`Record::from_fields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: Vec<(&'static str, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Sets a field value, replacing any earlier value for the same name.
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Sets a field value, builder style.
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Moves a field value out, converted to the field's Rust type.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Conversion`] if the field is missing or the
    /// value does not convert.
    pub fn take<T: FieldType>(&mut self, name: &str) -> Result<T> {
        let value = self
            .values
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| std::mem::replace(value, FieldValue::Absent))
            .ok_or_else(|| RecordError::Conversion(format!("no value for field '{name}'")))?;
        T::from_field_value(value).map_err(|e| match e {
            RecordError::Conversion(msg) => {
                RecordError::Conversion(format!("field '{name}': {msg}"))
            }
            other => other,
        })
    }
}

/// A record together with its persistence state.
///
/// Created by application code with [`Entity::new`] (new, no identity) or
/// by the engine when hydrating query results (persisted, identity set).
/// Dereferences to the wrapped record, so fields read and write as usual.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<R> {
    identity: Option<i64>,
    is_new: bool,
    record: R,
}

impl<R> Entity<R> {
    /// Wraps a record that has not been saved yet.
    pub fn new(record: R) -> Self {
        Self {
            identity: None,
            is_new: true,
            record,
        }
    }

    /// Wraps a record read back from storage.
    pub(crate) fn loaded(identity: i64, record: R) -> Self {
        Self {
            identity: Some(identity),
            is_new: false,
            record,
        }
    }

    pub(crate) fn mark_persisted(&mut self, identity: i64) {
        self.identity = Some(identity);
        self.is_new = false;
    }

    /// Storage-assigned identity, or `None` before the first save.
    pub fn id(&self) -> Option<i64> {
        self.identity
    }

    /// `true` until the record has been saved or was loaded from storage.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub fn into_record(self) -> R {
        self.record
    }
}

impl<R> From<R> for Entity<R> {
    fn from(record: R) -> Self {
        Entity::new(record)
    }
}

impl<R> Deref for Entity<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R> DerefMut for Entity<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

/// Declares a struct and implements [`Record`] for it.
///
/// Every field type must implement [`FieldType`]; anything else fails to
/// compile. Field names become column names and the struct name becomes
/// the table name.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> &'static [$crate::FieldDef] {
                static FIELDS: &[$crate::FieldDef] = &[
                    $(
                        $crate::FieldDef::new(
                            stringify!($field),
                            <$ty as $crate::FieldType>::SEMANTIC,
                        ),
                    )*
                ];
                FIELDS
            }

            fn to_fields(&self) -> ::std::vec::Vec<$crate::FieldValue> {
                ::std::vec![
                    $( $crate::FieldType::to_field_value(&self.$field), )*
                ]
            }

            #[allow(unused_variables)]
            fn from_fields(fields: &mut $crate::Fields) -> $crate::Result<Self> {
                Ok(Self {
                    $( $field: fields.take(stringify!($field))?, )*
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::types::SemanticType;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Everything {
            text: String,
            amount: Option<BigDecimal>,
            small: i32,
            big: Option<i64>,
            flag: bool,
            at: Option<DateTime<Utc>>,
            ratio: f64,
            weight: Option<f32>,
        }
    }

    crate::record! {
        struct Empty {}
    }

    #[test]
    fn test_macro_builds_descriptor_table_in_order() {
        let names: Vec<_> = Everything::fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["text", "amount", "small", "big", "flag", "at", "ratio", "weight"]
        );
        let types: Vec<_> = Everything::fields().iter().map(|f| f.ty).collect();
        assert_eq!(
            types,
            vec![
                SemanticType::Text,
                SemanticType::Decimal,
                SemanticType::Integer,
                SemanticType::Long,
                SemanticType::Boolean,
                SemanticType::Timestamp,
                SemanticType::Double,
                SemanticType::Float,
            ]
        );
        assert_eq!(Everything::table_name(), "Everything");
        assert!(Empty::fields().is_empty());
    }

    #[test]
    fn test_macro_round_trips_through_fields() {
        let original = Everything {
            text: "x".into(),
            amount: None,
            small: 7,
            big: Some(1 << 40),
            flag: true,
            at: None,
            ratio: 0.25,
            weight: Some(1.5),
        };

        let mut fields = Fields::new();
        for (def, value) in Everything::fields().iter().zip(original.to_fields()) {
            fields.insert(def.name, value);
        }
        let rebuilt = Everything::from_fields(&mut fields).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_take_reports_field_name() {
        let mut fields = Fields::new().with("small", FieldValue::Absent);
        let err = fields.take::<i32>("small").unwrap_err();
        assert!(err.to_string().contains("small"));

        let err = fields.take::<i32>("missing").unwrap_err();
        assert!(matches!(err, RecordError::Conversion(_)));
    }

    #[test]
    fn test_entity_state() {
        let mut entity = Entity::new(Empty {});
        assert!(entity.is_new());
        assert_eq!(entity.id(), None);

        entity.mark_persisted(5);
        assert!(!entity.is_new());
        assert_eq!(entity.id(), Some(5));

        let loaded = Entity::loaded(9, Empty {});
        assert!(!loaded.is_new());
        assert_eq!(loaded.id(), Some(9));
    }

    #[test]
    fn test_default_table_name_strips_module_path() {
        struct Plain;
        impl Record for Plain {
            fn fields() -> &'static [FieldDef] {
                &[]
            }
            fn to_fields(&self) -> Vec<FieldValue> {
                Vec::new()
            }
            fn from_fields(_: &mut Fields) -> Result<Self> {
                Ok(Plain)
            }
        }
        assert_eq!(Plain::table_name(), "Plain");
    }
}
