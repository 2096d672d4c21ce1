//! Implements the `Gateway` trait on top of any `Store`.

use crate::api::{Fetched, Gateway, Store};
use crate::model::coerce::{needs_stored_sign, normalize_fields, sign_against};
use crate::model::decode::{decode, decode_keyed};
use crate::model::{lookup, Confirmation, Fields, Record};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Implements the `Gateway` trait by validating requests, normalizing fields and decoding what a
/// dynamically-dispatched `store` returns.
pub struct GatewayImpl {
    store: Box<dyn Store + Send>,
}

impl GatewayImpl {
    pub fn new(store: Box<dyn Store + Send>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Gateway for GatewayImpl {
    async fn fetch_all(&mut self, table: &str) -> Result<Vec<Record>> {
        let schema = lookup(table)?;
        let records = match self.store.fetch(schema).await? {
            Fetched::Rows(raw) => decode(raw, schema),
            Fetched::Keyed(items) => items
                .into_iter()
                .map(|(id, fields)| decode_keyed(schema, id, fields))
                .collect(),
        }
        .inspect_err(|e| warn!("Unable to decode the {table} table: {e}"))?;
        debug!("Fetched {} records from {table}", records.len());
        Ok(records)
    }

    async fn create(&mut self, table: &str, fields: Fields) -> Result<Record> {
        let schema = lookup(table)?;
        if fields.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let fields = normalize_fields(schema, fields)?;
        let record = self.store.create(schema, &fields).await?;
        info!(
            "Created record {} in {table}",
            record.id().unwrap_or_default()
        );
        Ok(record)
    }

    async fn update(&mut self, table: &str, id: &str, fields: Fields) -> Result<Record> {
        let schema = lookup(table)?;
        let id = required_id(id)?;
        if fields.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let mut fields = normalize_fields(schema, fields)?;
        if needs_stored_sign(schema, &fields) {
            let stored = self.store.get(schema, id).await?;
            sign_against(schema, &mut fields, &stored.fields);
        }
        let record = self.store.update(schema, id, &fields).await?;
        info!("Updated {} fields of record {id} in {table}", fields.len());
        Ok(record)
    }

    async fn delete_by_id(&mut self, table: &str, id: &str) -> Result<Confirmation> {
        let schema = lookup(table)?;
        let id = required_id(id)?;
        self.store.delete(schema, id).await?;
        info!("Deleted record {id} from {table}");
        Ok(Confirmation::deleted(id))
    }
}

/// A blank identifier counts as a missing one.
fn required_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::MissingId);
    }
    Ok(id)
}
