//! Turning `RequestOptions` into a transport-ready `HttpRequest`.
//!
//! Pure and synchronous: everything here is decided from the options alone,
//! after request interceptors have run and before the transport is called.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::HttpRequest;
use crate::options::{BodyEncoding, RequestOptions};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Failure to encode the query string or body.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to encode query string: {0}")]
    Query(#[source] serde_urlencoded::ser::Error),

    #[error("failed to encode form body: {0}")]
    Form(#[source] serde_urlencoded::ser::Error),

    #[error("form data must be a string or an object, got {0}")]
    UnsupportedForm(&'static str),

    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Concatenate base and path verbatim. Slashes are not normalized.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}

/// Build the request a transport will execute.
///
/// Encodes `params` into the query string, folds `data` into the body, and
/// drops the client-only directives (`encoding`, `timeout`, `base_url`).
pub fn build_request(
    url: &str,
    options: RequestOptions,
    default_timeout: Duration,
) -> Result<HttpRequest, BuildError> {
    let RequestOptions {
        method,
        headers,
        params,
        data,
        body,
        encoding,
        timeout,
        cache,
        revalidate,
        base_url: _,
    } = options;

    let mut url = url.to_string();
    if let Some(params) = params {
        let query = encode_query(&params)?;
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
    }

    let mut headers: Vec<(String, String)> = headers.into_iter().collect();
    let has_content_type = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE));

    let body = match data {
        Some(data) => {
            let (encoded, content_type) = match encoding.unwrap_or_default() {
                BodyEncoding::Form => (encode_form(data)?, FORM_CONTENT_TYPE),
                BodyEncoding::Json => (serde_json::to_string(&data)?, JSON_CONTENT_TYPE),
            };
            if !has_content_type {
                headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
            }
            Some(encoded)
        }
        None => body,
    };

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
        timeout: timeout.unwrap_or(default_timeout),
        cache,
        revalidate,
    })
}

/// Urlencode the non-null parameters. Objects and arrays become JSON text.
pub fn encode_query(params: &Map<String, Value>) -> Result<String, BuildError> {
    serde_urlencoded::to_string(scalar_pairs(params)).map_err(BuildError::Query)
}

fn encode_form(data: Value) -> Result<String, BuildError> {
    match data {
        Value::String(raw) => Ok(raw),
        Value::Object(fields) => {
            serde_urlencoded::to_string(scalar_pairs(&fields)).map_err(BuildError::Form)
        }
        Value::Null => Err(BuildError::UnsupportedForm("null")),
        Value::Bool(_) => Err(BuildError::UnsupportedForm("a boolean")),
        Value::Number(_) => Err(BuildError::UnsupportedForm("a number")),
        Value::Array(_) => Err(BuildError::UnsupportedForm("an array")),
    }
}

fn scalar_pairs(fields: &Map<String, Value>) -> Vec<(&str, String)> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                // Display on Value is compact JSON; numbers and bools print bare.
                other => other.to_string(),
            };
            Some((key.as_str(), text))
        })
        .collect()
}
