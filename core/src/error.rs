//! Error types for the fetch client.
//!
//! # Design
//! Every failed request ends up as exactly one `RequestError`, whatever went
//! wrong underneath. Callers tell failures apart by `status`, following the
//! HTTP convention: the real status for HTTP errors, `408` for a timeout, `0`
//! for an unreachable host and `500` for anything the client could not
//! classify. `data` holds the parsed error body when the server sent one.

use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::types::ResponseCode;

/// Status reported when the host could not be reached at all.
pub const STATUS_UNREACHABLE: u16 = 0;

/// Status reported when the request did not settle before its timeout.
pub const STATUS_TIMEOUT: u16 = 408;

/// Status reported for failures the client could not classify.
pub const STATUS_UNKNOWN: u16 = 500;

pub(crate) const TIMEOUT_MESSAGE: &str = "Request timed out";
pub(crate) const UNREACHABLE_MESSAGE: &str = "Unable to reach the server";
pub(crate) const UNKNOWN_MESSAGE: &str = "Unexpected request failure";

/// The single error shape produced by `FetchClient`.
///
/// Cheap to clone so response interceptors can inspect and re-raise it.
#[derive(Debug, Clone, Error)]
#[error("{message} (status {status})")]
pub struct RequestError {
    /// Human-readable description, taken from the server payload when possible.
    pub message: String,

    /// HTTP-style status; see the module docs for the sentinel values.
    pub status: u16,

    /// Parsed error body, or the original error text for unknown failures.
    pub data: Option<Value>,

    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl RequestError {
    pub fn new(message: impl Into<String>, status: u16, data: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status,
            data,
            source: None,
        }
    }

    /// Error for a non-OK HTTP response.
    ///
    /// The message comes from the payload's `message` field if it is a
    /// string, otherwise it falls back to `HTTP {status} {status_text}`.
    pub fn http(status: u16, status_text: &str, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(|payload| payload.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status} {status_text}").trim_end().to_string());
        Self::new(message, status, data)
    }

    pub fn timeout() -> Self {
        Self::new(TIMEOUT_MESSAGE, STATUS_TIMEOUT, None)
    }

    pub fn unreachable() -> Self {
        Self::new(UNREACHABLE_MESSAGE, STATUS_UNREACHABLE, None)
    }

    /// Wrap an unclassified failure, keeping the original as the source.
    pub fn unknown<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: UNKNOWN_MESSAGE.to_string(),
            status: STATUS_UNKNOWN,
            data: Some(Value::String(err.to_string())),
            source: Some(Arc::new(err)),
        }
    }

    /// Same as [`RequestError::unknown`] for an already boxed error.
    pub fn unknown_boxed(err: Box<dyn StdError + Send + Sync>) -> Self {
        Self {
            message: UNKNOWN_MESSAGE.to_string(),
            status: STATUS_UNKNOWN,
            data: Some(Value::String(err.to_string())),
            source: Some(Arc::from(err)),
        }
    }

    /// Replace the data payload, keeping message, status and source.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.status == STATUS_TIMEOUT && self.message == TIMEOUT_MESSAGE
    }

    pub fn is_unreachable(&self) -> bool {
        self.status == STATUS_UNREACHABLE
    }

    /// True when the error came from a real HTTP status rather than a
    /// client-side classification.
    pub fn is_http(&self) -> bool {
        !self.is_unreachable() && !self.is_timeout() && self.source.is_none()
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::try_from(i64::from(self.status)).ok()
    }
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}
