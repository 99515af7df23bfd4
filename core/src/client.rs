//! The interceptor-driven HTTP client.
//!
//! # Design
//! `FetchClient` holds a base URL, a default timeout, a transport and two
//! interceptor chains. Registration takes `&mut self`, so chains cannot change
//! while a request borrows the client. A call is one straight pipeline:
//!
//! 1. apply defaults and resolve the URL,
//! 2. run request interceptors in order,
//! 3. build the `HttpRequest` (query string, body, headers),
//! 4. race the transport against the timeout,
//! 5. classify the outcome into `Value` or `RequestError`,
//! 6. run response interceptors in order.
//!
//! No retries happen anywhere.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ConfigError, RequestError};
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::{Chain, InterceptorId, RequestInterceptor, ResponseInterceptor};
use crate::options::RequestOptions;
use crate::request::{build_request, resolve_url};
use crate::transport::{Transport, TransportError, UreqTransport};

#[derive(Clone)]
pub struct FetchClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    request_interceptors: Chain<dyn RequestInterceptor>,
    response_interceptors: Chain<dyn ResponseInterceptor>,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}

impl FetchClient {
    /// Client using the default ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, Arc::new(UreqTransport::default()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url,
            timeout: config.timeout,
            transport,
            request_interceptors: Chain::new(),
            response_interceptors: Chain::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn add_request_interceptor<I>(&mut self, interceptor: I) -> InterceptorId
    where
        I: RequestInterceptor + 'static,
    {
        self.request_interceptors.push(Arc::new(interceptor))
    }

    pub fn add_response_interceptor<I>(&mut self, interceptor: I) -> InterceptorId
    where
        I: ResponseInterceptor + 'static,
    {
        self.response_interceptors.push(Arc::new(interceptor))
    }

    /// Returns false if `id` was not registered (or was already removed).
    pub fn remove_request_interceptor(&mut self, id: InterceptorId) -> bool {
        self.request_interceptors.remove(id)
    }

    pub fn remove_response_interceptor(&mut self, id: InterceptorId) -> bool {
        self.response_interceptors.remove(id)
    }

    /// Perform a request and decode the final value into `T`.
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T, RequestError> {
        let value = self.request_json(path, options).await?;
        serde_json::from_value(value.clone()).map_err(|err| {
            error!(path, error = %err, "response did not decode into the requested type");
            RequestError::unknown(err).with_data(value)
        })
    }

    /// Perform a request and return the JSON value left after the response
    /// interceptors ran.
    pub async fn request_json(&self, path: &str, options: RequestOptions) -> Result<Value, RequestError> {
        let url = self.resolve(path, &options);
        let outcome = self.dispatch(&url, options).await;
        self.response_interceptors.run(outcome).await
    }

    /// Build the request that would be sent for `path`, without sending it.
    ///
    /// Runs the request interceptors, so the result is exactly what the
    /// transport would receive.
    pub async fn prepare(&self, path: &str, options: RequestOptions) -> Result<HttpRequest, RequestError> {
        let url = self.resolve(path, &options);
        let options = self.request_interceptors.run(&url, options).await?;
        build_request(&url, options, self.timeout).map_err(RequestError::unknown)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, data: impl Into<Value>) -> Result<T, RequestError> {
        self.request(path, RequestOptions::post().json(data)).await
    }

    pub async fn put_json<T: DeserializeOwned>(&self, path: &str, data: impl Into<Value>) -> Result<T, RequestError> {
        self.request(path, RequestOptions::put().json(data)).await
    }

    pub async fn patch_json<T: DeserializeOwned>(&self, path: &str, data: impl Into<Value>) -> Result<T, RequestError> {
        self.request(path, RequestOptions::patch().json(data)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.request(path, RequestOptions::delete()).await
    }

    fn resolve(&self, path: &str, options: &RequestOptions) -> String {
        let base_url = options.base_url.as_deref().unwrap_or(&self.base_url);
        resolve_url(base_url, path)
    }

    /// Everything up to, but not including, the response interceptors.
    async fn dispatch(&self, url: &str, options: RequestOptions) -> Result<Value, RequestError> {
        let options = self.request_interceptors.run(url, options).await?;

        let request = build_request(url, options, self.timeout).map_err(|err| {
            error!(url, error = %err, "failed to build request");
            RequestError::unknown(err)
        })?;

        debug!(method = %request.method, url = %request.url, "sending request");
        let method = request.method;
        let timeout = request.timeout;

        // Dropping the transport future when the timer wins is what discards
        // a late response; the timer itself is dropped as soon as the
        // transport settles.
        let settled = match tokio::time::timeout(timeout, self.transport.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        match settled {
            Ok(response) => {
                debug!(%method, url, status = response.status, "request settled");
                classify_response(url, response)
            }
            Err(TransportError::Timeout) => {
                warn!(%method, url, ?timeout, "request timed out");
                Err(RequestError::timeout())
            }
            Err(TransportError::Unreachable(reason)) => {
                warn!(%method, url, %reason, "host unreachable");
                Err(RequestError::unreachable())
            }
            Err(TransportError::Rejected(err)) => Err(err),
            Err(TransportError::Other(err)) => {
                error!(%method, url, error = %err, "request failed with an unexpected error");
                Err(RequestError::unknown_boxed(err))
            }
        }
    }
}

/// Map a settled response to the success value or an HTTP `RequestError`.
fn classify_response(url: &str, response: HttpResponse) -> Result<Value, RequestError> {
    if response.is_ok() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body).map_err(|err| {
            error!(url, status = response.status, error = %err, "response body is not valid JSON");
            RequestError::unknown(err)
        });
    }

    // Error bodies are parsed best-effort; anything unparseable means no payload.
    let payload = serde_json::from_str::<Value>(&response.body).ok();
    Err(RequestError::http(response.status, &response.status_text, payload))
}
