use crate::api::{self, Gateway, Mode};
use crate::commands::Response;
use crate::model::{fields_from_body, Table};
use crate::{Config, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// The methods a record handler answers to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

serde_plain::derive_display_from_serialize!(Method);
serde_plain::derive_fromstr_from_deserialize!(Method);

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];
}

/// One record request, independent of the transport it arrived on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// The method name as received, e.g. `GET`. Unsupported methods get a 405.
    pub method: String,
    pub table: String,
    /// The record ID for `PUT` and `DELETE`. For `PUT` it may also come in the body.
    pub id: Option<String>,
    /// The JSON body for `POST` and `PUT`.
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(method: Method, table: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Loads the store for `config` and wraps it in a `Gateway`.
pub async fn connect(config: &Config, mode: Mode) -> Result<Box<dyn Gateway + Send>> {
    let store = api::store(config, mode).await?;
    Ok(api::gateway(store))
}

/// Answers `request` through `gateway`. Every outcome, failure included, becomes a `Response`.
pub async fn handle(gateway: &mut (dyn Gateway + Send), request: Request) -> Response {
    let method = match Method::from_str(request.method.trim()) {
        Ok(method) => method,
        Err(_) => return Response::method_not_allowed(&request.method),
    };
    debug!("{method} {}", request.table);
    let result = match method {
        Method::Get => gateway
            .fetch_all(&request.table)
            .await
            .map(|records| Response::success(200, &records)),
        Method::Post => match fields_from_body(request.body.unwrap_or_default()) {
            Ok(fields) => gateway
                .create(&request.table, fields)
                .await
                .map(|record| Response::success(201, &record)),
            Err(e) => Err(e),
        },
        Method::Put => update(gateway, request).await,
        Method::Delete => {
            let id = request.id.unwrap_or_default();
            gateway
                .delete_by_id(&request.table, &id)
                .await
                .map(|confirmation| Response::success(200, &confirmation))
        }
    };
    result.unwrap_or_else(Response::from)
}

/// `PUT` takes the ID from the request, or else from an `id` member of the body, and the fields
/// from the rest of the body.
async fn update(gateway: &mut (dyn Gateway + Send), request: Request) -> Result<Response> {
    let mut body = request.body.unwrap_or_default();
    let body_id = body
        .as_object_mut()
        .and_then(|object| object.remove("id"))
        .and_then(|id| id.as_str().map(String::from));
    let id = request.id.or(body_id).unwrap_or_default();
    if id.trim().is_empty() {
        return Err(Error::MissingId);
    }
    let fields = fields_from_body(body)?;
    let record = gateway.update(&request.table, &id, fields).await?;
    Ok(Response::success(200, &record))
}

/// Describes every registered table: its name, locator and header labels.
pub fn tables() -> Response {
    let tables: Vec<_> = Table::ALL
        .iter()
        .map(|table| {
            let schema = table.schema();
            serde_json::json!({
                "name": schema.name(),
                "locator": schema.locator(),
                "columns": schema.labels(),
            })
        })
        .collect();
    Response::success(200, &tables)
}
