//! Per-request options.
//!
//! `RequestOptions` is what callers and request interceptors work with. Some
//! fields only steer the client (`encoding`, `timeout`, `base_url`) and never
//! reach the transport; `cache` and `revalidate` are carried through
//! untouched for transports that understand them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpMethod;

/// How structured `data` is encoded into the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    #[default]
    Json,
    Form,
}

/// Cache mode hint, mirroring the usual fetch cache modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

/// Revalidation hints for platforms with a data cache in front of fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateHints {
    /// Seconds after which a cached response should be revalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revalidate: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Options for a single `FetchClient::request` call.
///
/// Only one of `data` and `body` should be set. `data` is encoded according
/// to `encoding` and replaces `body` when the request is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub params: Option<Map<String, Value>>,
    pub data: Option<Value>,
    pub body: Option<String>,
    pub encoding: Option<BodyEncoding>,
    #[serde(with = "duration_ms")]
    pub timeout: Option<Duration>,
    pub cache: Option<CachePolicy>,
    pub revalidate: Option<RevalidateHints>,
    pub base_url: Option<String>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn put() -> Self {
        Self::new(HttpMethod::Put)
    }

    pub fn patch() -> Self {
        Self::new(HttpMethod::Patch)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    /// Set a header, replacing any existing one that differs only in case.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Add a query parameter. `Value::Null` parameters are dropped when the
    /// URL is built.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    /// Structured body, JSON-encoded unless `form` is used instead.
    pub fn json(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self.encoding = Some(BodyEncoding::Json);
        self
    }

    /// Form body. A string is sent verbatim, a flat object is urlencoded.
    pub fn form(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self.encoding = Some(BodyEncoding::Form);
        self
    }

    /// Pre-serialized body, sent as is.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn revalidate(mut self, hints: RevalidateHints) -> Self {
        self.revalidate = Some(hints);
        self
    }

    /// Override the client's base URL for this call only.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Timeouts travel as integer milliseconds in serialized options.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
