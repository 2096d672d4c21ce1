//! The tabular decoder: header + rows in, keyed records out.

use crate::model::coerce::coerce_value;
use crate::model::{Fields, Record, TableSchema, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A header row and the data rows beneath it, exactly as the store returned them.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Splits a grid into its header (the first row) and data rows. An empty grid has an empty
    /// header and no rows.
    ///
    /// Think of `grid` as something that looks like `Vec<Vec<String>>`.
    pub fn from_grid<S, R, I>(grid: I) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows = grid
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>());
        let header = rows.next().unwrap_or_default();
        Self {
            header,
            rows: rows.collect(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Decodes `raw` into records, in row order.
///
/// - No data rows is a valid, empty result, whatever the header.
/// - Otherwise the header must equal the schema's labels exactly, or the whole table is rejected
///   with `Error::HeaderMismatch`.
/// - Short rows are padded with `Value::Absent`; cells past the last column are ignored.
/// - Rows where every cell is blank (cleared rows) are skipped.
pub fn decode(raw: RawTable, schema: &TableSchema) -> Result<Vec<Record>> {
    if raw.rows.is_empty() {
        debug!("The {} table has no data rows", schema.name());
        return Ok(Vec::new());
    }
    check_header(&raw.header, schema)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (row_ix, row) in raw.rows.into_iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        // Row 1 is the header, so data starts at sheet row 2.
        let record = decode_row(schema, row).inspect_err(|e| {
            warn!(
                "Unable to decode row {} of the {} table: {e}",
                row_ix + 2,
                schema.name()
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Fails with `Error::HeaderMismatch` unless `observed` equals the schema's labels element-wise.
pub fn check_header(observed: &[String], schema: &TableSchema) -> Result<()> {
    let expected = schema.labels();
    if observed == expected.as_slice() {
        return Ok(());
    }
    Err(Error::HeaderMismatch {
        table: schema.name(),
        expected,
        observed: observed.to_vec(),
    })
}

/// Decodes one data row whose header is already known to match. The first column becomes the
/// record identifier.
pub fn decode_row(schema: &TableSchema, row: Vec<String>) -> Result<Record> {
    let mut cells = row.into_iter();
    let mut record = Record::default();
    for (ix, column) in schema.columns().iter().enumerate() {
        let raw = cells.next().map(Value::Text).unwrap_or(Value::Absent);
        if ix == 0 {
            record.id = raw.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
            continue;
        }
        record
            .fields
            .insert(column.label().to_string(), coerce_value(column, raw)?);
    }
    Ok(record)
}

/// Decodes a record from a keyed-record store, which delivers an identifier and a map of fields
/// rather than a header row. Known fields are coerced by kind; unknown fields are kept verbatim.
pub fn decode_keyed(schema: &TableSchema, id: impl Into<String>, fields: Fields) -> Result<Record> {
    let mut decoded = Fields::new();
    for (name, value) in fields {
        let value = match schema.column(&name) {
            Some(column) if column.label() != schema.id_label() => coerce_value(column, value)?,
            _ => value,
        };
        decoded.insert(name, value);
    }
    Ok(Record::new(id, decoded))
}

/// Renders `fields` as a row in column order with `id` in the first column.
pub fn encode_row(schema: &TableSchema, id: &str, fields: &Fields) -> Result<Vec<String>> {
    check_writable(schema, fields)?;
    Ok(schema
        .columns()
        .iter()
        .enumerate()
        .map(|(ix, column)| match ix {
            0 => id.to_string(),
            _ => fields
                .get(column.label())
                .map(Value::to_cell)
                .unwrap_or_default(),
        })
        .collect())
}

/// Overwrites the cells of `row` named in `fields`, leaving the others as they are. The row is
/// padded to the width of the schema first.
pub fn merge_row(schema: &TableSchema, row: &mut Vec<String>, fields: &Fields) -> Result<()> {
    check_writable(schema, fields)?;
    let width = schema.columns().len().max(row.len());
    row.resize(width, String::new());
    for (ix, column) in schema.columns().iter().enumerate().skip(1) {
        if let Some(value) = fields.get(column.label()) {
            row[ix] = value.to_cell();
        }
    }
    Ok(())
}

/// Fails with `Error::UnknownField` for the first field a row of this table has no cell for. The
/// identifier column is assigned by the store and counts as unwritable.
pub fn check_writable(schema: &TableSchema, fields: &Fields) -> Result<()> {
    match fields
        .keys()
        .find(|name| schema.column(name).is_none() || *name == schema.id_label())
    {
        Some(name) => {
            debug!("The {} table has no writable column '{name}'", schema.name());
            Err(Error::UnknownField {
                table: schema.name(),
                field: name.clone(),
            })
        }
        None => Ok(()),
    }
}
