//! Command handlers for the finboard CLI.
//!
//! Record commands answer with a `Response`: the JSON envelope printed to stdout plus the HTTP
//! status a web handler would send with it. Setup commands answer with an `Out`, which is logged.

mod init;
mod records;
mod summary;

use crate::Error;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use init::init;
pub use records::{connect, handle, tables, Method, Request};
pub use summary::summary;

/// The output type for a setup command: a message for the user and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The JSON body of every record response: `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ..., "statusCode": ..., "upstreamMessage": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success {
        data: serde_json::Value,
    },
    Error {
        message: String,
        /// The upstream store's own status code, when it answered with one.
        #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        /// The upstream store's message, when it gave one.
        #[serde(rename = "upstreamMessage", skip_serializing_if = "Option::is_none")]
        upstream_message: Option<String>,
    },
}

/// A record command's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// The HTTP status: 200 for reads, updates and deletes, 201 for creates, 400 for invalid
    /// input, 404 for an unknown table, 405 for an unsupported method, 500 (or the upstream
    /// status) when the store fails.
    #[serde(skip)]
    status: u16,
    /// The methods a handler supports, sent as `Allow` with a 405.
    #[serde(skip)]
    allow: Option<Vec<Method>>,
    #[serde(flatten)]
    envelope: Envelope,
}

impl Response {
    /// A success envelope around `data`.
    pub fn success<T: Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status,
                allow: None,
                envelope: Envelope::Success { data },
            },
            Err(e) => Self::message(500, format!("Unable to serialize the response: {e}")),
        }
    }

    /// An error envelope with no upstream details.
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            allow: None,
            envelope: Envelope::Error {
                message: message.into(),
                status_code: None,
                upstream_message: None,
            },
        }
    }

    /// The 405 answer for a method the handler does not support.
    pub fn method_not_allowed(method: &str) -> Self {
        Self {
            allow: Some(Method::ALL.to_vec()),
            ..Self::message(405, format!("Method {method} Not Allowed"))
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The value of the `Allow` header, when there is one.
    pub fn allow(&self) -> Option<String> {
        self.allow.as_ref().map(|methods| {
            methods
                .iter()
                .map(Method::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn is_success(&self) -> bool {
        matches!(self.envelope, Envelope::Success { .. })
    }

    /// Print the envelope as JSON to stdout.
    pub fn print(&self) {
        debug!("Response status {}", self.status);
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("Unable to print the response: {e}"),
        }
    }
}

impl From<Error> for Response {
    /// Store failures get a generic message, with the upstream status and message alongside.
    fn from(e: Error) -> Self {
        let status = e.http_status();
        let envelope = match e {
            Error::Gateway { cause, status } => Envelope::Error {
                message: "Store request failed.".to_string(),
                status_code: status,
                upstream_message: Some(cause),
            },
            other => Envelope::Error {
                message: other.to_string(),
                status_code: None,
                upstream_message: None,
            },
        };
        Self {
            status,
            allow: None,
            envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = Response::success(201, &json!({"id": "rec1"}));
        assert_eq!(response.status(), 201);
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "success", "data": {"id": "rec1"}})
        );
    }

    #[test]
    fn test_validation_error_envelope() {
        let response = Response::from(Error::EmptyPayload);
        assert_eq!(response.status(), 400);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "error", "message": "Request body must include fields"})
        );
    }

    #[test]
    fn test_gateway_error_envelope() {
        let response = Response::from(Error::gateway("NOT_FOUND", Some(404)));
        assert_eq!(response.status(), 404);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "error",
                "message": "Store request failed.",
                "statusCode": 404,
                "upstreamMessage": "NOT_FOUND"
            })
        );

        let response = Response::from(Error::gateway("connection refused", None));
        assert_eq!(response.status(), 500);
        assert!(serde_json::to_value(&response)
            .unwrap()
            .get("statusCode")
            .is_none());
    }

    #[test]
    fn test_method_not_allowed() {
        let response = Response::method_not_allowed("PATCH");
        assert_eq!(response.status(), 405);
        assert_eq!(response.allow().as_deref(), Some("GET, POST, PUT, DELETE"));
        assert!(!response.is_success());
    }
}
