use std::fmt::Display;
use thiserror::Error;

/// The result type returned by coercion, decoding and gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal plumbing (files, config) reports errors with `anyhow` context and converts them into
/// `Error::Config` at the public boundary.
pub(crate) type Res<T> = anyhow::Result<T>;

/// Everything that can go wrong between a caller and the external store.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric field could not be parsed as a decimal number.
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    /// A date field could not be parsed by any of the accepted date formats.
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),

    /// No schema is registered under this table name.
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    /// The header row in the store does not match the registered schema. The sheet structure
    /// changed and no row can be trusted.
    #[error(
        "The header row of the '{table}' table does not match. Expected {expected:?}, found {observed:?}"
    )]
    HeaderMismatch {
        table: String,
        expected: Vec<String>,
        observed: Vec<String>,
    },

    /// A create or update was requested without any fields.
    #[error("Request body must include fields")]
    EmptyPayload,

    /// An update or delete was requested without a record ID.
    #[error("A record ID is required")]
    MissingId,

    /// A create or update named a field the table has no writable column for. Tabular stores
    /// cannot keep such a field, so the write is refused rather than losing it.
    #[error("The '{table}' table has no writable column '{field}'")]
    UnknownField { table: String, field: String },

    /// A total could not be computed because it exceeds the range of a decimal.
    #[error("The {0} total is too large to compute")]
    Overflow(String),

    /// The store request failed. `status` is the upstream HTTP status when the store gave one.
    #[error("Store request failed: {cause}")]
    Gateway { cause: String, status: Option<u16> },

    /// The local configuration could not be loaded or is incomplete.
    #[error("{0}")]
    Config(String),
}

impl Error {
    pub(crate) fn gateway(cause: impl Display, status: Option<u16>) -> Self {
        Error::Gateway {
            cause: cause.to_string(),
            status,
        }
    }

    /// Converts an `anyhow` error chain into a `Config` error, keeping every context message.
    pub(crate) fn config(e: anyhow::Error) -> Self {
        Error::Config(format!("{e:#}"))
    }

    /// A stable name for the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidNumber(_) => "InvalidNumber",
            Error::InvalidDate(_) => "InvalidDate",
            Error::UnknownTable(_) => "UnknownTable",
            Error::HeaderMismatch { .. } => "HeaderMismatch",
            Error::EmptyPayload => "EmptyPayload",
            Error::MissingId => "MissingId",
            Error::UnknownField { .. } => "UnknownField",
            Error::Overflow(_) => "Overflow",
            Error::Gateway { .. } => "GatewayError",
            Error::Config(_) => "ConfigError",
        }
    }

    /// The HTTP status a transport layer should answer with for this error.
    ///
    /// Validation problems with the caller's input are `400`, an unknown table is `404`, and store
    /// failures use the upstream status when there is one, otherwise `500`. A header mismatch is
    /// a fault in the store's data rather than the request, so it is `500` as well.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidNumber(_)
            | Error::InvalidDate(_)
            | Error::EmptyPayload
            | Error::MissingId
            | Error::UnknownField { .. } => 400,
            Error::UnknownTable(_) => 404,
            Error::Gateway { status, .. } => status.unwrap_or(500),
            Error::HeaderMismatch { .. } | Error::Overflow(_) | Error::Config(_) => 500,
        }
    }

    /// The upstream status code, only present on `Gateway` errors that received a response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Gateway { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        assert_eq!(Error::InvalidNumber("abc".into()).http_status(), 400);
        assert_eq!(Error::InvalidDate("x".into()).http_status(), 400);
        assert_eq!(Error::EmptyPayload.http_status(), 400);
        assert_eq!(Error::MissingId.http_status(), 400);
        let unknown = Error::UnknownField {
            table: "Transactions".into(),
            field: "Receipt".into(),
        };
        assert_eq!(unknown.http_status(), 400);
        assert_eq!(
            unknown.to_string(),
            "The 'Transactions' table has no writable column 'Receipt'"
        );
    }

    #[test]
    fn test_gateway_status_passthrough() {
        let e = Error::gateway("NOT_FOUND", Some(404));
        assert_eq!(e.http_status(), 404);
        assert_eq!(e.upstream_status(), Some(404));

        let e = Error::gateway("connection reset", None);
        assert_eq!(e.http_status(), 500);
        assert_eq!(e.kind(), "GatewayError");
    }

    #[test]
    fn test_header_mismatch_message() {
        let e = Error::HeaderMismatch {
            table: "Accounts".into(),
            expected: vec!["Account ID".into()],
            observed: vec!["ID".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("Accounts"));
        assert!(msg.contains("Account ID"));
        assert!(msg.contains("\"ID\""));
        assert_eq!(e.http_status(), 500);
    }

    #[test]
    fn test_overflow_is_a_server_error() {
        let e = Error::Overflow("income".into());
        assert_eq!(e.http_status(), 500);
        assert_eq!(e.to_string(), "The income total is too large to compute");
    }

    #[test]
    fn test_config_keeps_context_chain() {
        let inner = anyhow::anyhow!("file missing").context("Unable to load config");
        let e = Error::config(inner);
        assert_eq!(e.to_string(), "Unable to load config: file missing");
    }
}
