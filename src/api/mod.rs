//! The `Store` trait abstracts the remote data store (a spreadsheet or a record API) and the
//! `Gateway` trait is the single integration point the rest of the program uses to read and write
//! records through it.

mod airtable;
mod gateway;
mod memory;
mod sheets;

pub use gateway::GatewayImpl;
pub use memory::TestStore;

use crate::config::Backend;
use crate::model::{Confirmation, Fields, RawTable, Record, TableSchema};
use crate::{Config, Error, Result};
use airtable::AirtableStore;
use sheets::GoogleSheetStore;
use tracing::debug;

const IN_TEST_MODE: &str = "FINBOARD_IN_TEST_MODE";

/// Chooses between the configured remote store and the in-memory test store.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Use the backend named in the configuration.
    #[default]
    Remote,
    /// Use a `TestStore` seeded with sample data. Nothing leaves the process.
    Testing,
}

impl Mode {
    /// Returns `Mode::Testing` when `FINBOARD_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Remote,
        }
    }
}

/// What a store returns when a whole table is read.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// A header row and data rows, from a spreadsheet-like store.
    Rows(RawTable),
    /// Identifier and field pairs, from a keyed-record store.
    Keyed(Vec<(String, Fields)>),
}

/// The operations every backend provides. Each is a single logical remote call with no retry.
///
/// The fields passed to `create` and `update` are already normalized.
#[async_trait::async_trait]
pub trait Store {
    /// Reads every row of the table described by `schema`.
    async fn fetch(&mut self, schema: &TableSchema) -> Result<Fetched>;

    /// Reads the single record with `id`.
    async fn get(&mut self, schema: &TableSchema, id: &str) -> Result<Record>;

    /// Adds a record and returns it with its store-assigned identifier.
    async fn create(&mut self, schema: &TableSchema, fields: &Fields) -> Result<Record>;

    /// Overwrites the given fields of the record with `id` and returns the updated record.
    async fn update(&mut self, schema: &TableSchema, id: &str, fields: &Fields) -> Result<Record>;

    /// Removes the record with `id`.
    async fn delete(&mut self, schema: &TableSchema, id: &str) -> Result<()>;
}

/// The record operations offered to callers. Inputs are validated and normalized here, so every
/// backend sees the same clean data.
#[async_trait::async_trait]
pub trait Gateway {
    /// Reads and decodes every record of `table`, in store order.
    async fn fetch_all(&mut self, table: &str) -> Result<Vec<Record>>;

    /// Creates a record. `fields` must not be empty.
    async fn create(&mut self, table: &str, fields: Fields) -> Result<Record>;

    /// Updates some or all fields of the record with `id`.
    async fn update(&mut self, table: &str, id: &str, fields: Fields) -> Result<Record>;

    /// Deletes the record with `id`.
    async fn delete_by_id(&mut self, table: &str, id: &str) -> Result<Confirmation>;
}

/// Builds the store selected by `mode` and the configured backend.
pub async fn store(config: &Config, mode: Mode) -> Result<Box<dyn Store + Send>> {
    if mode == Mode::Testing {
        debug!("Using the in-memory test store");
        return Ok(Box::new(TestStore::default()));
    }
    match config.backend() {
        Backend::Sheets => {
            debug!("Using Google Sheets {}", config.spreadsheet_id());
            Ok(Box::new(GoogleSheetStore::new(config).await?))
        }
        Backend::Airtable => {
            debug!("Using Airtable base {}", config.airtable_base_id());
            Ok(Box::new(AirtableStore::new(config)?))
        }
    }
}

/// Wraps `store` in the `Gateway` implementation.
pub fn gateway(store: Box<dyn Store + Send>) -> Box<dyn Gateway + Send> {
    Box::new(GatewayImpl::new(store))
}

/// Finds the index, within `rows`, of the data row whose first cell is `id`.
pub(crate) fn find_row(rows: &[Vec<String>], id: &str) -> Option<usize> {
    rows.iter()
        .position(|row| row.first().is_some_and(|cell| cell.trim() == id))
}

/// Builds the `Gateway` error for a record that is not in the store.
pub(crate) fn not_found(schema: &TableSchema, id: &str) -> Error {
    Error::gateway(
        format!("Record '{id}' was not found in {}", schema.name()),
        Some(404),
    )
}

/// Turns a failed upstream response into a `Gateway` error carrying the upstream status and the
/// most useful message the body offers. Handles the Google shape `{"error": {"message": ...}}` and
/// both Airtable shapes `{"error": {"type": ..., "message": ...}}` and `{"error": "NOT_FOUND"}`.
pub(crate) fn upstream_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error")? {
            serde_json::Value::String(s) => Some(s.clone()),
            obj => obj
                .get("message")
                .or_else(|| obj.get("type"))
                .and_then(serde_json::Value::as_str)
                .map(String::from),
        });
    let cause = match message {
        Some(message) => message,
        None if body.trim().is_empty() => format!("Upstream responded with status {status}"),
        None => body.trim().to_string(),
    };
    Error::gateway(cause, Some(status))
}

/// Sends `request` with bearer authentication and turns any non-success status into a `Gateway`
/// error.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    token: &str,
) -> Result<reqwest::Response> {
    let response = request
        .bearer_auth(token)
        .send()
        .await
        .map_err(transport_error)?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(upstream_error(status, &body));
    }
    Ok(response)
}

/// Converts a transport failure into a `Gateway` error.
pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    let status = e.status().map(|s| s.as_u16());
    // Strip the URL so that query parameters never end up in an error message.
    Error::gateway(e.without_url(), status)
}
