//! Record trait - common interface for all input record types
//!
//! Rows arrive from the data-access layer as loosely-typed JSON objects.
//! [`from_row`] checks required fields up front so a caller bug is reported
//! by field name instead of surfacing as a generic deserialization failure.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::error::{Error, Result};

/// Common trait for all input records
pub trait Record: DeserializeOwned {
    /// Record kind used in error messages (e.g., "Sprint")
    const KIND: &'static str;

    /// Fields that must be present (and non-null) in every row
    const REQUIRED_FIELDS: &'static [&'static str];
}

/// Convert one row into a typed record
pub fn from_row<T: Record>(row: &Map<String, Value>) -> Result<T> {
    for &field in T::REQUIRED_FIELDS {
        match row.get(field) {
            None | Some(Value::Null) => {
                return Err(Error::MissingField {
                    record: T::KIND,
                    field,
                });
            }
            Some(_) => {}
        }
    }

    serde_json::from_value(Value::Object(row.clone())).map_err(|e| Error::InvalidField {
        record: T::KIND,
        message: e.to_string(),
    })
}

/// Convert a batch of rows, stopping at the first bad row
pub fn from_rows<T: Record>(rows: &[Map<String, Value>]) -> Result<Vec<T>> {
    rows.iter().map(from_row::<T>).collect()
}
