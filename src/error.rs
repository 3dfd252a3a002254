//! Error types for the Airtable client.

use crate::mapper::{type_name, Kind};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Result type for Airtable operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Airtable client.
#[derive(Error, Debug)]
pub enum Error {
    /// The client is missing required configuration. No request was sent.
    #[error("client setup error: {0}")]
    Setup(String),

    /// Network or HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error envelope.
    ///
    /// The raw response body is kept so callers can still inspect it.
    #[error("API error ({error_type}): {message}")]
    Request {
        /// Error type reported by the API, e.g. `INVALID_FILTER`
        error_type: String,
        /// Error message reported by the API
        message: String,
        /// Raw response body
        body: Vec<u8>,
    },

    /// The response body is not JSON or does not have the expected envelope shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field value does not match the declared kind of its destination.
    #[error("could not parse field '{field}' as {expected} (found {found})")]
    Coercion {
        /// External key of the field
        field: String,
        /// Declared kind of the destination slot
        expected: Kind,
        /// JSON type actually received
        found: &'static str,
    },

    /// The record shape declares a kind the mapper cannot fill.
    #[error("unsupported kind {kind} for field '{field}'")]
    UnsupportedKind {
        /// External key of the field
        field: String,
        /// Description of the unsupported kind
        kind: String,
    },
}

impl Error {
    /// Build a coercion error for `field` from the value that failed to match.
    pub fn coercion(field: &str, expected: Kind, found: &Value) -> Self {
        Error::Coercion {
            field: field.to_string(),
            expected,
            found: type_name(found),
        }
    }

    /// Returns `true` if the API answered with an error envelope.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Error::Request { .. })
    }

    /// Raw response body attached to an API request error.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Error::Request { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Inspect a response body for an API error envelope.
    ///
    /// Returns `None` for bodies that are not error envelopes, including bodies
    /// that are not JSON at all; those are left to the envelope decoder.
    pub(crate) fn from_body(body: &[u8]) -> Option<Self> {
        let envelope: ErrorResponse = serde_json::from_slice(body).ok()?;
        let (error_type, message) = match envelope.error? {
            ErrorDetail::Typed {
                error_type,
                message,
            } => (error_type, message.unwrap_or_default()),
            // Some endpoints answer with a bare string, e.g. {"error": "NOT_FOUND"}
            ErrorDetail::Bare(error_type) => (error_type.clone(), error_type),
        };

        if error_type.is_empty() {
            return None;
        }

        Some(Error::Request {
            error_type,
            message,
            body: body.to_vec(),
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Typed {
        #[serde(rename = "type", default)]
        error_type: String,
        message: Option<String>,
    },
    Bare(String),
}
