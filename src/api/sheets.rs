//! Implements the `Store` trait against the Google Sheets v4 REST API.
//!
//! Reads use `values.get` on the table's locator. Creates use `values.append`. Updates and deletes
//! read the table once to find the row holding the identifier, then write (`values.update`) or
//! clear (`values.clear`) that single row. A cleared row reads back as blank and is skipped by the
//! decoder.
//!
//! Writes use the `RAW` input option: text is stored exactly as given, so a value starting with
//! `=` stays text and a date string is not reformatted by the sheet's locale. Number columns are
//! sent as JSON numbers so they remain numeric cells.

use crate::api::{find_row, not_found, send, Fetched, Store};
use crate::model::decode::{check_header, decode_row, encode_row, merge_row};
use crate::model::{Amount, FieldKind, Fields, RawTable, Record, TableSchema, Value};
use crate::{Config, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;
use yup_oauth2::ServiceAccountKey;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const VALUE_INPUT_OPTION: &str = "RAW";

/// Implements the `Store` trait using a Google Sheet. Authenticates with a token minted from the
/// service account key in the credentials file, or else with its raw access token.
pub(super) struct GoogleSheetStore {
    client: reqwest::Client,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheetStore {
    pub(super) async fn new(config: &Config) -> Result<Self> {
        let spreadsheet_id = config.spreadsheet_id();
        if spreadsheet_id.is_empty() {
            return Err(Error::Config(
                "No Google Sheet is configured, set sheet_url in config.json".into(),
            ));
        }
        let token = match (config.google_service_account(), config.sheets_access_token()) {
            (Some(key), _) => service_account_token(key.clone()).await?,
            (None, Some(token)) => token.to_string(),
            (None, None) => {
                return Err(Error::Config(
                    "The credentials file has neither google_service_account nor sheets_access_token"
                        .into(),
                ))
            }
        };
        Ok(Self {
            client: reqwest::Client::new(),
            spreadsheet_id: spreadsheet_id.to_string(),
            token,
        })
    }

    async fn get_grid(&self, schema: &TableSchema) -> Result<Vec<Vec<String>>> {
        let url = values_url(&self.spreadsheet_id, schema.locator(), "")?;
        let request = self
            .client
            .get(url)
            .query(&[("majorDimension", "ROWS")]);
        let response = send(request, &self.token).await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::gateway(format!("Unexpected values response: {e}"), None))?;
        Ok(into_grid(range))
    }

    /// Reads the table and returns the 1-based sheet row number and current cells of the row
    /// holding `id`.
    async fn locate(&self, schema: &TableSchema, id: &str) -> Result<(usize, Vec<String>)> {
        let raw = RawTable::from_grid(self.get_grid(schema).await?);
        if raw.rows().is_empty() {
            return Err(not_found(schema, id));
        }
        check_header(raw.header(), schema)?;
        let ix = find_row(raw.rows(), id).ok_or_else(|| not_found(schema, id))?;
        // The header is row 1.
        Ok((ix + 2, raw.rows()[ix].clone()))
    }
}

/// Exchanges a signed JWT for an access token with the spreadsheets scope.
async fn service_account_token(key: ServiceAccountKey) -> Result<String> {
    debug!("Authenticating as {}", key.client_email);
    let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| Error::Config(format!("The service account key is not usable: {e}")))?;
    let token = auth
        .token(&[SPREADSHEETS_SCOPE])
        .await
        .map_err(|e| Error::gateway(format!("Unable to get a service account token: {e}"), None))?;
    token
        .token()
        .map(String::from)
        .ok_or_else(|| Error::gateway("The token response has no access token", None))
}

#[async_trait::async_trait]
impl Store for GoogleSheetStore {
    async fn fetch(&mut self, schema: &TableSchema) -> Result<Fetched> {
        trace!("values.get {}", schema.locator());
        Ok(Fetched::Rows(RawTable::from_grid(
            self.get_grid(schema).await?,
        )))
    }

    async fn get(&mut self, schema: &TableSchema, id: &str) -> Result<Record> {
        let (_, row) = self.locate(schema, id).await?;
        decode_row(schema, row)
    }

    async fn create(&mut self, schema: &TableSchema, fields: &Fields) -> Result<Record> {
        trace!("values.append {}", schema.locator());
        let id = Uuid::new_v4().to_string();
        let row = encode_row(schema, &id, fields)?;
        let url = values_url(&self.spreadsheet_id, schema.locator(), ":append")?;
        let body = ValueRangeBody::new(None, into_cells(schema, &row));
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body);
        send(request, &self.token).await?;
        decode_row(schema, row)
    }

    async fn update(&mut self, schema: &TableSchema, id: &str, fields: &Fields) -> Result<Record> {
        let (sheet_row, mut row) = self.locate(schema, id).await?;
        merge_row(schema, &mut row, fields)?;
        row.truncate(schema.columns().len());
        let range = row_range(schema, sheet_row);
        trace!("values.update {range}");
        let url = values_url(&self.spreadsheet_id, &range, "")?;
        let body = ValueRangeBody::new(Some(&range), into_cells(schema, &row));
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&body);
        send(request, &self.token).await?;
        decode_row(schema, row)
    }

    async fn delete(&mut self, schema: &TableSchema, id: &str) -> Result<()> {
        let (sheet_row, _) = self.locate(schema, id).await?;
        let range = row_range(schema, sheet_row);
        trace!("values.clear {range}");
        let url = values_url(&self.spreadsheet_id, &range, ":clear")?;
        let request = self.client.post(url).json(&serde_json::json!({}));
        send(request, &self.token).await?;
        Ok(())
    }
}

/// The response of `values.get`. Google omits `values` entirely for an empty range.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// The request body of `values.append` and `values.update`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<&'a str>,
    major_dimension: &'static str,
    values: [Vec<serde_json::Value>; 1],
}

impl<'a> ValueRangeBody<'a> {
    fn new(range: Option<&'a str>, cells: Vec<serde_json::Value>) -> Self {
        Self {
            range,
            major_dimension: "ROWS",
            values: [cells],
        }
    }
}

/// Converts an encoded row into the JSON cells of a `RAW` write. Filled cells of number columns
/// become JSON numbers. Everything else, blank cells included, is sent as a string.
fn into_cells(schema: &TableSchema, row: &[String]) -> Vec<serde_json::Value> {
    row.iter()
        .enumerate()
        .map(|(ix, cell)| {
            let is_number = schema
                .columns()
                .get(ix)
                .is_some_and(|column| column.kind() == FieldKind::Number);
            if is_number && !cell.trim().is_empty() {
                if let Some(number) = Amount::from_str(cell)
                    .ok()
                    .and_then(|a| serde_json::to_value(Value::Number(a.value())).ok())
                {
                    return number;
                }
            }
            serde_json::Value::String(cell.clone())
        })
        .collect()
}

/// Builds `{SHEETS_API}/{spreadsheet_id}/values/{range}{suffix}` with the range escaped as a single
/// path segment.
fn values_url(spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API).map_err(|e| Error::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("'{SHEETS_API}' cannot be a base URL")))?
        .push(spreadsheet_id)
        .push("values")
        .push(&format!("{range}{suffix}"));
    Ok(url)
}

/// The A1 range of a single row, e.g. `Transactions!A7:J7`.
fn row_range(schema: &TableSchema, sheet_row: usize) -> String {
    format!(
        "{}!A{sheet_row}:{}{sheet_row}",
        schema.sheet_name(),
        column_letter(schema.columns().len())
    )
}

/// The letter(s) of the 1-based column `n`: 1 is `A`, 26 is `Z`, 27 is `AA`.
fn column_letter(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Converts the JSON cells of a `values.get` response into text. Formatted values arrive as
/// strings already; anything else is rendered as JSON.
fn into_grid(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}
