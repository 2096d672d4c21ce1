use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// The value of one field in a `Record`.
///
/// `Date` and `Category` hold the text exactly as given: a date is validated but never
/// reformatted, and a category holds the store label. `Other` keeps values of unknown fields
/// verbatim, such as Airtable's linked-record arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The field has no value, e.g. a trailing cell missing from a short row.
    #[default]
    Absent,
    Text(String),
    Number(Decimal),
    Date(String),
    Category(String),
    Other(serde_json::Value),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// The textual content of `Text`, `Date` and `Category` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) | Value::Category(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// Renders the value as a spreadsheet cell. Numbers are written without formatting so that
    /// the sheet parses them as numbers.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Absent => String::new(),
            Value::Text(s) | Value::Date(s) | Value::Category(s) => s.clone(),
            Value::Number(d) => d.normalize().to_string(),
            Value::Other(serde_json::Value::String(s)) => s.clone(),
            Value::Other(v) => v.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Number(n) => {
                let s = n.to_string();
                match Decimal::from_str(&s).or_else(|_| Decimal::from_scientific(&s)) {
                    Ok(d) => Value::Number(d),
                    Err(_) => Value::Other(serde_json::Value::Number(n)),
                }
            }
            other => Value::Other(other),
        }
    }
}

/// A `Number` is written as a JSON integer when it is whole and fits in an `i64`, and as a JSON
/// float when the `f64` reads back as the same decimal. Any other number is written as a string
/// holding every digit, since a float would round it.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Absent => serializer.serialize_none(),
            Value::Text(s) | Value::Date(s) | Value::Category(s) => serializer.serialize_str(s),
            Value::Number(d) => {
                if d.fract().is_zero() {
                    if let Some(i) = d.to_i64() {
                        return serializer.serialize_i64(i);
                    }
                }
                match d.to_f64() {
                    // `f64` displays as the shortest text that reads back as the same float.
                    Some(f) if Decimal::from_str(&f.to_string()).ok() == Some(d.normalize()) => {
                        serializer.serialize_f64(f)
                    }
                    _ => serializer.collect_str(&d.normalize()),
                }
            }
            Value::Other(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(serde_json::Value::deserialize(deserializer)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(json!(null)), Value::Absent);
        assert_eq!(Value::from(json!("x")), Value::Text("x".into()));
        assert_eq!(
            Value::from(json!(150.5)),
            Value::Number(Decimal::from_str("150.5").unwrap())
        );
        assert_eq!(
            Value::from(json!(["recA", "recB"])),
            Value::Other(json!(["recA", "recB"]))
        );
    }

    #[test]
    fn test_serialize_numbers() {
        let whole = Value::Number(Decimal::from_str("-15000").unwrap());
        assert_eq!(serde_json::to_string(&whole).unwrap(), "-15000");
        let frac = Value::Number(Decimal::from_str("-150.50").unwrap());
        assert_eq!(serde_json::to_string(&frac).unwrap(), "-150.5");
        let cents = Value::Number(Decimal::from_str("1234.56").unwrap());
        assert_eq!(serde_json::to_value(&cents).unwrap(), json!(1234.56));
    }

    #[test]
    fn test_serialize_keeps_precision() {
        let precise = Value::Number(Decimal::from_str("0.1234567890123456789").unwrap());
        assert_eq!(
            serde_json::to_value(&precise).unwrap(),
            json!("0.1234567890123456789")
        );
        let huge = Value::Number(Decimal::from_str("12345678901234567890.12").unwrap());
        assert_eq!(
            serde_json::to_value(&huge).unwrap(),
            json!("12345678901234567890.12")
        );
    }

    #[test]
    fn test_serialize_text_kinds() {
        assert_eq!(
            serde_json::to_string(&Value::Date("2025-01-15".into())).unwrap(),
            "\"2025-01-15\""
        );
        assert_eq!(serde_json::to_string(&Value::Absent).unwrap(), "null");
    }

    #[test]
    fn test_to_cell() {
        assert_eq!(Value::Absent.to_cell(), "");
        assert_eq!(
            Value::Number(Decimal::from_str("-150.50").unwrap()).to_cell(),
            "-150.5"
        );
        assert_eq!(Value::Category("Gasto".into()).to_cell(), "Gasto");
        assert_eq!(Value::Other(json!(true)).to_cell(), "true");
    }
}
