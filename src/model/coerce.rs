//! Field coercion: turning loosely-typed input into typed field values.
//!
//! Every function here is pure. Failures are returned, never defaulted, because a silently
//! defaulted amount or date would corrupt financial data.

use crate::model::{
    Amount, CategoryMap, Column, FieldKind, Fields, TableSchema, TransactionType, Value,
};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

/// Date-only formats accepted in addition to RFC 3339 and RFC 2822.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

/// Date-time formats without an offset.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Coerces text or a number into a `Decimal` at full precision.
pub fn coerce_number(value: &Value) -> Result<Decimal> {
    match value {
        Value::Number(d) => Ok(*d),
        Value::Text(s) => Ok(Amount::from_str(s)?.value()),
        other => Err(Error::InvalidNumber(other.to_cell())),
    }
}

/// Parses `s` as a date. The caller keeps the original string; the parsed date is only used to
/// validate it, or to compare dates.
pub fn coerce_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.date_naive());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.date());
        }
    }
    Err(Error::InvalidDate(s.to_string()))
}

/// Applies the sign convention: expenses are negative, income is non-negative. Unknown types
/// leave the amount as it is. Accepts both the code (`gasto`) and the store label (`Gasto`).
pub fn normalize_amount(amount: Decimal, transaction_type: &str) -> Decimal {
    match TransactionType::recognize(transaction_type) {
        Some(TransactionType::Expense) => -amount.abs(),
        Some(TransactionType::Income) => amount.abs(),
        None => amount,
    }
}

/// Coerces one value according to the kind of `column`.
///
/// Blank text in a number, date or category column becomes `Value::Absent`. Text columns keep
/// whatever they are given.
pub fn coerce_value(column: &Column, value: Value) -> Result<Value> {
    if let Value::Text(s) = &value {
        if s.trim().is_empty() && column.kind() != FieldKind::Text {
            return Ok(Value::Absent);
        }
    }
    let coerced = match (column.kind(), value) {
        (_, Value::Absent) => Value::Absent,
        (FieldKind::Text, v) => v,
        (FieldKind::Number, v) => Value::Number(coerce_number(&v)?),
        (FieldKind::Date, Value::Text(s) | Value::Date(s)) => {
            coerce_date(&s)?;
            Value::Date(s)
        }
        (FieldKind::Date, v) => return Err(Error::InvalidDate(v.to_cell())),
        (FieldKind::Category(kind), Value::Text(s) | Value::Category(s)) => {
            Value::Category(kind.map_code(&s))
        }
        (FieldKind::Category(_), v) => v,
    };
    Ok(coerced)
}

/// Normalizes a full or partial field set before it is written to the store.
///
/// Known columns are coerced by kind, then the table's sign rule is applied when both the amount
/// and the type are present. Unknown fields pass through unchanged; whether a store can keep them
/// is up to the store.
pub fn normalize_fields(schema: &TableSchema, fields: Fields) -> Result<Fields> {
    let mut normalized = Fields::new();
    for (name, value) in fields {
        let value = match schema.column(&name) {
            Some(column) => coerce_value(column, value)?,
            None => value,
        };
        normalized.insert(name, value);
    }

    sign_against(schema, &mut normalized, &Fields::new());
    Ok(normalized)
}

/// True when `fields` holds only one of the amount and the type named by the table's sign rule.
/// Such an update can only be signed with the other half from the stored record.
pub fn needs_stored_sign(schema: &TableSchema, fields: &Fields) -> bool {
    schema
        .sign_rule()
        .is_some_and(|rule| fields.contains_key(rule.amount) != fields.contains_key(rule.kind))
}

/// Applies the table's sign rule to `fields`, taking the amount or the type from `stored` when
/// `fields` lacks it. The signed amount is written into `fields`, so a type-only update also
/// rewrites the stored amount with its new sign.
pub fn sign_against(schema: &TableSchema, fields: &mut Fields, stored: &Fields) {
    let Some(rule) = schema.sign_rule() else {
        return;
    };
    let kind = fields
        .get(rule.kind)
        .or_else(|| stored.get(rule.kind))
        .and_then(Value::as_str)
        .map(str::to_string);
    let amount = fields
        .get(rule.amount)
        .or_else(|| stored.get(rule.amount))
        .and_then(Value::as_decimal);
    if let (Some(kind), Some(amount)) = (kind, amount) {
        let signed = normalize_amount(amount, &kind);
        trace!("Normalized {} from {amount} to {signed} for '{kind}'", rule.amount);
        fields.insert(rule.amount.to_string(), Value::Number(signed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::{AMOUNT_STR, DATE_STR, FREQUENCY_STR, NOTES_STR, TYPE_STR};
    use crate::model::Table;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_coerce_number_text_and_number() {
        assert_eq!(coerce_number(&Value::Text("150.50".into())).unwrap(), dec("150.50"));
        assert_eq!(coerce_number(&Value::Number(dec("-3"))).unwrap(), dec("-3"));
        assert_eq!(coerce_number(&Value::Text("$1,200".into())).unwrap(), dec("1200"));
    }

    #[test]
    fn test_coerce_number_invalid() {
        let err = coerce_number(&Value::Text("abc".into())).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber(ref v) if v == "abc"));
        let err = coerce_number(&Value::Other(json!(true))).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber(_)));
    }

    #[test]
    fn test_coerce_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        for s in [
            "2025-10-20",
            "10/20/2025",
            "2025/10/20",
            "October 20, 2025",
            "Oct 20, 2025",
            "2025-10-20T09:15:30Z",
            "2025-10-20T09:15:30",
            "Mon, 20 Oct 2025 09:15:30 +0000",
        ] {
            assert_eq!(coerce_date(s).unwrap(), expected, "{s}");
        }
    }

    #[test]
    fn test_coerce_date_invalid() {
        for s in ["", "yesterday", "2025-13-01", "2025-02-30"] {
            assert!(
                matches!(coerce_date(s), Err(Error::InvalidDate(ref v)) if v == s),
                "{s}"
            );
        }
    }

    #[test]
    fn test_expense_amount_is_negative() {
        assert_eq!(normalize_amount(dec("150.50"), "gasto"), dec("-150.50"));
        assert_eq!(normalize_amount(dec("-150.50"), "gasto"), dec("-150.50"));
        assert_eq!(normalize_amount(dec("150.50"), "Gasto"), dec("-150.50"));
    }

    #[test]
    fn test_income_amount_is_non_negative() {
        assert_eq!(normalize_amount(dec("-20"), "ingreso"), dec("20"));
        assert_eq!(normalize_amount(dec("20"), "Ingreso"), dec("20"));
    }

    #[test]
    fn test_unknown_type_leaves_amount() {
        assert_eq!(normalize_amount(dec("-7"), "transfer"), dec("-7"));
    }

    #[test]
    fn test_normalize_amount_is_idempotent() {
        for s in ["0", "1", "-1", "150.50", "-99999.999", "0.0001"] {
            let once = normalize_amount(dec(s), "gasto");
            let twice = normalize_amount(once, "gasto");
            assert_eq!(once, twice, "{s}");
        }
    }

    #[test]
    fn test_normalize_fields_transaction() {
        let schema = Table::Transactions.schema();
        let input = fields(&[
            (AMOUNT_STR, Value::Text("150.50".into())),
            (TYPE_STR, Value::Text("gasto".into())),
            (FREQUENCY_STR, Value::Text("monthly".into())),
            (DATE_STR, Value::Text("2025-01-15".into())),
            ("Receipt", Value::Text("kept as is".into())),
        ]);
        let out = normalize_fields(schema, input).unwrap();
        assert_eq!(out[AMOUNT_STR], Value::Number(dec("-150.50")));
        assert_eq!(out[TYPE_STR], Value::Category("Gasto".into()));
        assert_eq!(out[FREQUENCY_STR], Value::Category("Mensual".into()));
        assert_eq!(out[DATE_STR], Value::Date("2025-01-15".into()));
        assert_eq!(out["Receipt"], Value::Text("kept as is".into()));
    }

    #[test]
    fn test_normalize_fields_keeps_date_string() {
        let schema = Table::Transactions.schema();
        let input = fields(&[(DATE_STR, Value::Text("10/20/2025".into()))]);
        let out = normalize_fields(schema, input).unwrap();
        assert_eq!(out[DATE_STR], Value::Date("10/20/2025".into()));
    }

    #[test]
    fn test_normalize_fields_invalid_amount() {
        let schema = Table::Transactions.schema();
        let input = fields(&[(AMOUNT_STR, Value::Text("abc".into()))]);
        assert!(matches!(
            normalize_fields(schema, input),
            Err(Error::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_normalize_fields_invalid_date() {
        let schema = Table::Transactions.schema();
        let input = fields(&[(DATE_STR, Value::Text("not a date".into()))]);
        assert!(matches!(
            normalize_fields(schema, input),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_amount_without_type_is_unsigned_as_given() {
        let schema = Table::Transactions.schema();
        let input = fields(&[(AMOUNT_STR, Value::Number(dec("42")))]);
        let out = normalize_fields(schema, input).unwrap();
        assert_eq!(out[AMOUNT_STR], Value::Number(dec("42")));
    }

    #[test]
    fn test_needs_stored_sign() {
        let tx = Table::Transactions.schema();
        let amount_only = fields(&[(AMOUNT_STR, Value::Number(dec("50")))]);
        let type_only = fields(&[(TYPE_STR, Value::Category("Gasto".into()))]);
        let both = fields(&[
            (AMOUNT_STR, Value::Number(dec("50"))),
            (TYPE_STR, Value::Category("Gasto".into())),
        ]);
        let neither = fields(&[(NOTES_STR, Value::Text("x".into()))]);
        assert!(needs_stored_sign(tx, &amount_only));
        assert!(needs_stored_sign(tx, &type_only));
        assert!(!needs_stored_sign(tx, &both));
        assert!(!needs_stored_sign(tx, &neither));
        assert!(!needs_stored_sign(Table::Accounts.schema(), &amount_only));
    }

    #[test]
    fn test_amount_only_is_signed_by_stored_type() {
        let schema = Table::Transactions.schema();
        let stored = fields(&[
            (AMOUNT_STR, Value::Number(dec("-520000"))),
            (TYPE_STR, Value::Category("Gasto".into())),
        ]);
        let mut update = fields(&[(AMOUNT_STR, Value::Number(dec("50")))]);
        sign_against(schema, &mut update, &stored);
        assert_eq!(update[AMOUNT_STR], Value::Number(dec("-50")));
        assert!(!update.contains_key(TYPE_STR));
    }

    #[test]
    fn test_type_only_resigns_stored_amount() {
        let schema = Table::Transactions.schema();
        let stored = fields(&[
            (AMOUNT_STR, Value::Number(dec("1850000"))),
            (TYPE_STR, Value::Category("Ingreso".into())),
        ]);
        let mut update = fields(&[(TYPE_STR, Value::Category("Gasto".into()))]);
        sign_against(schema, &mut update, &stored);
        assert_eq!(update[AMOUNT_STR], Value::Number(dec("-1850000")));
    }

    #[test]
    fn test_sign_against_without_stored_amount() {
        let schema = Table::Transactions.schema();
        let stored = fields(&[(AMOUNT_STR, Value::Absent)]);
        let mut update = fields(&[(TYPE_STR, Value::Category("Gasto".into()))]);
        sign_against(schema, &mut update, &stored);
        assert!(!update.contains_key(AMOUNT_STR));
    }

    #[test]
    fn test_unmapped_type_passes_through() {
        let schema = Table::Transactions.schema();
        let input = fields(&[
            (AMOUNT_STR, Value::Number(dec("-5"))),
            (TYPE_STR, Value::Text("transfer".into())),
        ]);
        let out = normalize_fields(schema, input).unwrap();
        assert_eq!(out[TYPE_STR], Value::Category("transfer".into()));
        assert_eq!(out[AMOUNT_STR], Value::Number(dec("-5")));
    }

    #[test]
    fn test_blank_number_is_absent_and_blank_text_is_kept() {
        let schema = Table::Transactions.schema();
        let input = fields(&[
            (AMOUNT_STR, Value::Text("  ".into())),
            (NOTES_STR, Value::Text(String::new())),
        ]);
        let out = normalize_fields(schema, input).unwrap();
        assert_eq!(out[AMOUNT_STR], Value::Absent);
        assert_eq!(out[NOTES_STR], Value::Text(String::new()));
    }
}
