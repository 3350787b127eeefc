//! Caller-supplied hooks run at fixed stages of every logical request.
//!
//! All three kinds run in registration order, and each one is awaited before
//! the next starts. Plain closures with the matching signature implement the
//! traits directly; wrap an async closure in [`AsyncHook`] to await inside a
//! hook (refreshing a token before a request, for example).

use crate::core::{ApiError, Payload, RequestSpec, ResponseMeta};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::future::Future;
use std::sync::Arc;

/// Observes or rewrites an outgoing request before its first attempt.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, req: RequestSpec) -> BoxFuture<'_, RequestSpec>;
}

/// Observes or rewrites a successfully decoded response.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response<'a>(&'a self, payload: Payload, meta: &'a ResponseMeta) -> BoxFuture<'a, Payload>;
}

/// Inspects a terminal failure. Resolving to `Some` replaces the error with a
/// successful value and stops the remaining error interceptors.
pub trait ErrorInterceptor: Send + Sync {
    fn on_error<'a>(&'a self, err: &'a ApiError) -> BoxFuture<'a, Option<Payload>>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestSpec) -> RequestSpec + Send + Sync,
{
    fn on_request(&self, req: RequestSpec) -> BoxFuture<'_, RequestSpec> {
        future::ready(self(req)).boxed()
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(Payload, &ResponseMeta) -> Payload + Send + Sync,
{
    fn on_response<'a>(&'a self, payload: Payload, meta: &'a ResponseMeta) -> BoxFuture<'a, Payload> {
        future::ready(self(payload, meta)).boxed()
    }
}

impl<F> ErrorInterceptor for F
where
    F: Fn(&ApiError) -> Option<Payload> + Send + Sync,
{
    fn on_error<'a>(&'a self, err: &'a ApiError) -> BoxFuture<'a, Option<Payload>> {
        future::ready(self(err)).boxed()
    }
}

/// Adapts an async closure into an interceptor.
///
/// The closure receives owned arguments (response metadata and errors are
/// cloned), so the future it returns can be `'static`.
///
/// ```no_run
/// # use pandora_http::{ApiClient, AsyncHook, RequestSpec};
/// # use reqwest::header::{AUTHORIZATION, HeaderValue};
/// # async fn fetch_token() -> String { String::new() }
/// let client = ApiClient::builder()
///     .request_interceptor(AsyncHook(|mut req: RequestSpec| async move {
///         if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", fetch_token().await)) {
///             req.headers.insert(AUTHORIZATION, value);
///         }
///         req
///     }))
///     .build();
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AsyncHook<F>(pub F);

impl<F, Fut> RequestInterceptor for AsyncHook<F>
where
    F: Fn(RequestSpec) -> Fut + Send + Sync,
    Fut: Future<Output = RequestSpec> + Send + 'static,
{
    fn on_request(&self, req: RequestSpec) -> BoxFuture<'_, RequestSpec> {
        (self.0)(req).boxed()
    }
}

impl<F, Fut> ResponseInterceptor for AsyncHook<F>
where
    F: Fn(Payload, ResponseMeta) -> Fut + Send + Sync,
    Fut: Future<Output = Payload> + Send + 'static,
{
    fn on_response<'a>(&'a self, payload: Payload, meta: &'a ResponseMeta) -> BoxFuture<'a, Payload> {
        (self.0)(payload, meta.clone()).boxed()
    }
}

impl<F, Fut> ErrorInterceptor for AsyncHook<F>
where
    F: Fn(ApiError) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Payload>> + Send + 'static,
{
    fn on_error<'a>(&'a self, err: &'a ApiError) -> BoxFuture<'a, Option<Payload>> {
        (self.0)(err.clone()).boxed()
    }
}

#[derive(Clone, Default)]
pub(crate) struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
    error: Vec<Arc<dyn ErrorInterceptor>>,
}

impl Interceptors {
    pub(crate) fn push_request(&mut self, i: Arc<dyn RequestInterceptor>) {
        self.request.push(i);
    }

    pub(crate) fn push_response(&mut self, i: Arc<dyn ResponseInterceptor>) {
        self.response.push(i);
    }

    pub(crate) fn push_error(&mut self, i: Arc<dyn ErrorInterceptor>) {
        self.error.push(i);
    }

    pub(crate) async fn apply_request(&self, mut req: RequestSpec) -> RequestSpec {
        for interceptor in &self.request {
            req = interceptor.on_request(req).await;
        }
        req
    }

    pub(crate) async fn apply_response(&self, mut payload: Payload, meta: &ResponseMeta) -> Payload {
        for interceptor in &self.response {
            payload = interceptor.on_response(payload, meta).await;
        }
        payload
    }

    pub(crate) async fn recover(&self, err: &ApiError) -> Option<Payload> {
        for interceptor in &self.error {
            if let Some(payload) = interceptor.on_error(err).await {
                return Some(payload);
            }
        }
        None
    }

    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        (self.request.len(), self.response.len(), self.error.len())
    }
}
