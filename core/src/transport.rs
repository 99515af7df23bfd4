//! The network seam.
//!
//! # Design
//! A `Transport` executes one `HttpRequest` and reports a tagged outcome:
//! either a response (whatever its status) or a `TransportError` saying *why*
//! there is no response. The client classifies failures by matching on that
//! tag, never by inspecting error messages.
//!
//! `UreqTransport` is the default. ureq is blocking, so each call runs on
//! tokio's blocking pool; the client's timeout race only needs the returned
//! future to be droppable.

use std::error::Error as StdError;
use std::io;

use async_trait::async_trait;
use thiserror::Error;
use ureq::Agent;

use crate::error::RequestError;
use crate::http::{canonical_reason, HttpMethod, HttpRequest, HttpResponse};

/// Why a transport produced no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport gave up waiting on its own.
    #[error("request timed out")]
    Timeout,

    /// Name resolution or connection establishment failed.
    #[error("host unreachable: {0}")]
    Unreachable(String),

    /// A layer below already produced the final error; pass it on as is.
    #[error(transparent)]
    Rejected(RequestError),

    /// Anything else.
    #[error("transport failure: {0}")]
    Other(#[source] Box<dyn StdError + Send + Sync>),
}

/// Executes requests on behalf of `FetchClient`.
///
/// Implementations must return non-2xx statuses as `Ok(HttpResponse)`; only
/// failures to obtain a response belong in `TransportError`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl UreqTransport {
    /// Use a preconfigured agent. Status-as-error must be disabled on it, or
    /// non-2xx responses will surface as `TransportError::Other`.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|err| TransportError::Other(Box::new(err)))?
    }
}

fn execute_blocking(agent: &Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
        timeout,
        ..
    } = request;

    // GET and DELETE builders carry no body by default; a body handed to us
    // is forced onto the wire rather than dropped.
    let result = match method {
        HttpMethod::Get | HttpMethod::Delete => {
            let builder = match method {
                HttpMethod::Get => agent.get(&url),
                _ => agent.delete(&url),
            };
            let builder = configure(builder, &headers, timeout);
            match body {
                Some(body) => builder.force_send_body().send(body.as_bytes()),
                None => builder.call(),
            }
        }
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
            let builder = match method {
                HttpMethod::Post => agent.post(&url),
                HttpMethod::Put => agent.put(&url),
                _ => agent.patch(&url),
            };
            let builder = configure(builder, &headers, timeout);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(classify)?;

    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    // Error pages are not always UTF-8; keep the status and decode lossily.
    let bytes = response.body_mut().read_to_vec().map_err(classify)?;
    let body = String::from_utf8_lossy(&bytes).into_owned();

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text: status
            .canonical_reason()
            .unwrap_or_else(|| canonical_reason(status.as_u16()))
            .to_string(),
        headers,
        body,
    })
}

fn configure<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: std::time::Duration,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.config().timeout_global(Some(timeout)).build()
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Unreachable(err.to_string())
        }
        ureq::Error::Io(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut => TransportError::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable => TransportError::Unreachable(io_err.to_string()),
            _ => TransportError::Other(Box::new(io_err)),
        },
        other => TransportError::Other(Box::new(other)),
    }
}
