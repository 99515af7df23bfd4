//! Request and response interceptors.
//!
//! Request interceptors see the resolved URL and the options before anything
//! is encoded, and return the options to use instead. Response interceptors
//! see the settled outcome, success or failure, and may turn one into the
//! other. Both kinds run strictly in registration order, one at a time.
//!
//! ```ignore
//! use fetch_core::{request_interceptor_fn, response_interceptor_fn, FetchClient};
//!
//! let mut client = FetchClient::new(ClientConfig::new("http://localhost:3000"))?;
//! client.add_request_interceptor(request_interceptor_fn(|_url, opts| async move {
//!     Ok(opts.header("authorization", "Bearer token123"))
//! }));
//! client.add_response_interceptor(response_interceptor_fn(
//!     |value| async move { Ok(value) },
//!     |err| async move { if err.status == 404 { Ok(Value::Null) } else { Err(err) } },
//! ));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RequestError;
use crate::options::RequestOptions;

/// Stable handle for a registered interceptor, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

impl InterceptorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Transforms request options before the request is built.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, url: &str, options: RequestOptions) -> Result<RequestOptions, RequestError>;
}

/// Handles the settled outcome of a request.
///
/// Both methods default to passing their input through.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_fulfilled(&self, value: Value) -> Result<Value, RequestError> {
        Ok(value)
    }

    async fn on_rejected(&self, error: RequestError) -> Result<Value, RequestError> {
        Err(error)
    }
}

/// Closure-backed request interceptor; see [`request_interceptor_fn`].
#[derive(Clone)]
pub struct RequestInterceptorFn<F> {
    f: F,
}

/// Wrap an async closure `(url, options) -> Result<options>` as an interceptor.
pub fn request_interceptor_fn<F, Fut>(f: F) -> RequestInterceptorFn<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestOptions, RequestError>> + Send + 'static,
{
    RequestInterceptorFn { f }
}

#[async_trait]
impl<F, Fut> RequestInterceptor for RequestInterceptorFn<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestOptions, RequestError>> + Send + 'static,
{
    async fn intercept(&self, url: &str, options: RequestOptions) -> Result<RequestOptions, RequestError> {
        (self.f)(url.to_string(), options).await
    }
}

impl<F> fmt::Debug for RequestInterceptorFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInterceptorFn").finish_non_exhaustive()
    }
}

/// Closure-backed response interceptor; see [`response_interceptor_fn`].
#[derive(Clone)]
pub struct ResponseInterceptorFn<S, R> {
    on_fulfilled: S,
    on_rejected: R,
}

/// Wrap a pair of async closures as a response interceptor.
pub fn response_interceptor_fn<S, SFut, R, RFut>(on_fulfilled: S, on_rejected: R) -> ResponseInterceptorFn<S, R>
where
    S: Fn(Value) -> SFut + Send + Sync,
    SFut: Future<Output = Result<Value, RequestError>> + Send + 'static,
    R: Fn(RequestError) -> RFut + Send + Sync,
    RFut: Future<Output = Result<Value, RequestError>> + Send + 'static,
{
    ResponseInterceptorFn {
        on_fulfilled,
        on_rejected,
    }
}

#[async_trait]
impl<S, SFut, R, RFut> ResponseInterceptor for ResponseInterceptorFn<S, R>
where
    S: Fn(Value) -> SFut + Send + Sync,
    SFut: Future<Output = Result<Value, RequestError>> + Send + 'static,
    R: Fn(RequestError) -> RFut + Send + Sync,
    RFut: Future<Output = Result<Value, RequestError>> + Send + 'static,
{
    async fn on_fulfilled(&self, value: Value) -> Result<Value, RequestError> {
        (self.on_fulfilled)(value).await
    }

    async fn on_rejected(&self, error: RequestError) -> Result<Value, RequestError> {
        (self.on_rejected)(error).await
    }
}

impl<S, R> fmt::Debug for ResponseInterceptorFn<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseInterceptorFn").finish_non_exhaustive()
    }
}

/// Sets a header on every request, replacing any value of the same name.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    name: String,
    value: String,
}

impl HeaderInterceptor {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
impl RequestInterceptor for HeaderInterceptor {
    async fn intercept(&self, _url: &str, mut options: RequestOptions) -> Result<RequestOptions, RequestError> {
        options
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case(&self.name));
        options.headers.insert(self.name.clone(), self.value.clone());
        Ok(options)
    }
}

/// Ordered list of interceptors with stable ids.
pub(crate) struct Chain<T: ?Sized> {
    entries: Vec<(InterceptorId, Arc<T>)>,
}

impl<T: ?Sized> Chain<T> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn push(&mut self, interceptor: Arc<T>) -> InterceptorId {
        let id = InterceptorId::next();
        self.entries.push((id, interceptor));
        id
    }

    pub(crate) fn remove(&mut self, id: InterceptorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter().map(|(_, interceptor)| interceptor)
    }
}

impl<T: ?Sized> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("count", &self.entries.len()).finish()
    }
}

impl Chain<dyn RequestInterceptor> {
    /// Feed the options through every interceptor in order.
    pub(crate) async fn run(&self, url: &str, mut options: RequestOptions) -> Result<RequestOptions, RequestError> {
        for interceptor in self.iter() {
            options = interceptor.intercept(url, options).await?;
        }
        Ok(options)
    }
}

impl Chain<dyn ResponseInterceptor> {
    /// Settle-then-chain: each interceptor receives the previous one's outcome.
    pub(crate) async fn run(&self, mut outcome: Result<Value, RequestError>) -> Result<Value, RequestError> {
        for interceptor in self.iter() {
            outcome = match outcome {
                Ok(value) => interceptor.on_fulfilled(value).await,
                Err(error) => interceptor.on_rejected(error).await,
            };
        }
        outcome
    }
}
