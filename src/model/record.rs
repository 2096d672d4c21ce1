use crate::model::Value;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of named field values, either a full record or a partial one sent for create or update.
pub type Fields = BTreeMap<String, Value>;

/// One decoded row of a table: an account, a transaction, a goal, and so on.
///
/// Serializes flat, with the identifier next to the fields: `{"id": "rec1", "Amount": -150.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The identifier assigned by the store. Absent for rows whose identifier cell is blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The text of `field`, if it has any.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// The number in `field`, if it holds one.
    pub fn number(&self, field: &str) -> Option<Decimal> {
        self.get(field).and_then(Value::as_decimal)
    }
}

/// The answer to a successful delete.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub id: String,
    pub deleted: bool,
}

impl Confirmation {
    pub fn deleted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: true,
        }
    }
}

/// Extracts the fields from a create or update request body.
///
/// The body is normally `{"fields": {...}}`, but a flat object is accepted as well. Anything that
/// is not an object, or an object with no fields, is `Error::EmptyPayload`.
pub fn fields_from_body(body: serde_json::Value) -> Result<Fields> {
    let object = match body {
        serde_json::Value::Object(mut map) => match map.remove("fields") {
            Some(serde_json::Value::Object(inner)) => inner,
            Some(other) => {
                map.insert("fields".to_string(), other);
                map
            }
            None => map,
        },
        _ => return Err(Error::EmptyPayload),
    };
    if object.is_empty() {
        return Err(Error::EmptyPayload);
    }
    Ok(object
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect())
}
