//! Implements the `Store` trait against the Airtable REST API, where each table is a list of
//! `{id, fields}` records rather than a grid.

use crate::api::{send, Fetched, Store};
use crate::model::decode::decode_keyed;
use crate::model::{Fields, Record, TableSchema};
use crate::{Config, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

const AIRTABLE_API: &str = "https://api.airtable.com/v0";

pub(super) struct AirtableStore {
    client: reqwest::Client,
    base_id: String,
    api_key: String,
}

impl AirtableStore {
    pub(super) fn new(config: &Config) -> Result<Self> {
        let base_id = config.airtable_base_id();
        if base_id.is_empty() {
            return Err(Error::Config(
                "No Airtable base is configured, set airtable_base_id in config.json".into(),
            ));
        }
        let api_key = config
            .airtable_api_key()
            .ok_or_else(|| Error::Config("The credentials file has no airtable_api_key".into()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_id: base_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Sends a create or update body and returns the single record Airtable answers with.
    async fn write(
        &self,
        schema: &TableSchema,
        request: reqwest::RequestBuilder,
    ) -> Result<Record> {
        let response: RecordsResponse = send(request, &self.api_key)
            .await?
            .json()
            .await
            .map_err(|e| Error::gateway(format!("Unexpected Airtable response: {e}"), None))?;
        let record = response
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::gateway("Airtable returned no record", None))?;
        decode_keyed(schema, record.id, record.fields)
    }
}

#[async_trait::async_trait]
impl Store for AirtableStore {
    async fn fetch(&mut self, schema: &TableSchema) -> Result<Fetched> {
        let url = table_url(&self.base_id, &schema.name(), None)?;
        let mut items = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            trace!("list {} offset {offset:?}", schema.name());
            let mut request = self.client.get(url.clone());
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset)]);
            }
            let page: ListResponse = send(request, &self.api_key)
                .await?
                .json()
                .await
                .map_err(|e| Error::gateway(format!("Unexpected Airtable response: {e}"), None))?;
            items.extend(page.records.into_iter().map(|r| (r.id, r.fields)));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        debug!("Listed {} Airtable records from {}", items.len(), schema.name());
        Ok(Fetched::Keyed(items))
    }

    async fn get(&mut self, schema: &TableSchema, id: &str) -> Result<Record> {
        let url = table_url(&self.base_id, &schema.name(), Some(id))?;
        trace!("get {} {id}", schema.name());
        let record: AirtableRecord = send(self.client.get(url), &self.api_key)
            .await?
            .json()
            .await
            .map_err(|e| Error::gateway(format!("Unexpected Airtable response: {e}"), None))?;
        decode_keyed(schema, record.id, record.fields)
    }

    async fn create(&mut self, schema: &TableSchema, fields: &Fields) -> Result<Record> {
        let url = table_url(&self.base_id, &schema.name(), None)?;
        let body = WriteBody {
            records: [WriteRecord { id: None, fields }],
        };
        self.write(schema, self.client.post(url).json(&body)).await
    }

    async fn update(&mut self, schema: &TableSchema, id: &str, fields: &Fields) -> Result<Record> {
        let url = table_url(&self.base_id, &schema.name(), None)?;
        let body = WriteBody {
            records: [WriteRecord {
                id: Some(id),
                fields,
            }],
        };
        self.write(schema, self.client.patch(url).json(&body)).await
    }

    async fn delete(&mut self, schema: &TableSchema, id: &str) -> Result<()> {
        let url = table_url(&self.base_id, &schema.name(), Some(id))?;
        let response: DeleteResponse = send(self.client.delete(url), &self.api_key)
            .await?
            .json()
            .await
            .map_err(|e| Error::gateway(format!("Unexpected Airtable response: {e}"), None))?;
        if !response.deleted {
            return Err(Error::gateway(
                format!("Airtable did not delete record '{id}'"),
                None,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: Fields,
}

/// One page of a list request. `offset` is present when there are more pages.
#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<AirtableRecord>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    records: [WriteRecord<'a>; 1],
}

#[derive(Debug, Serialize)]
struct WriteRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    fields: &'a Fields,
}

/// Builds `{AIRTABLE_API}/{base_id}/{table}` or `.../{table}/{record_id}`.
fn table_url(base_id: &str, table: &str, record_id: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(AIRTABLE_API).map_err(|e| Error::Config(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("'{AIRTABLE_API}' cannot be a base URL")))?;
        segments.push(base_id).push(table);
        if let Some(record_id) = record_id {
            segments.push(record_id);
        }
    }
    Ok(url)
}
