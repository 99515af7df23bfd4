//! Async JSON HTTP client with request and response interceptor chains.
//!
//! # Overview
//! `FetchClient` prefixes paths with a configured base URL, applies a default
//! timeout, encodes query parameters and JSON or form bodies, and reports
//! every failure as one `RequestError` shape. Interceptors can rewrite
//! outgoing options and rework settled outcomes.
//!
//! # Design
//! - Request construction is pure (`request::build_request`); the network
//!   lives behind the `Transport` trait, with `UreqTransport` as the default.
//! - Transports report *why* they failed through the tagged
//!   `TransportError`, so failure classification is a `match`.
//! - Request and response plain-data types (`HttpRequest`, `HttpResponse`)
//!   use owned fields so transports can move them across threads freely.
//! - No retries, pooling, caching or streaming.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod options;
pub mod request;
pub mod transport;
pub mod types;

pub use client::FetchClient;
pub use config::ClientConfig;
pub use error::{ConfigError, RequestError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{
    request_interceptor_fn, response_interceptor_fn, HeaderInterceptor, InterceptorId, RequestInterceptor,
    ResponseInterceptor,
};
pub use options::{BodyEncoding, CachePolicy, RequestOptions, RevalidateHints};
pub use request::{build_request, BuildError};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{ApiEnvelope, ResponseCode};
