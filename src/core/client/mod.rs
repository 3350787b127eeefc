//! Public client surface + builder.
//! Internals are split into `cache` (TTL store), `inflight` (deduplication),
//! `executor` (timeout + retry), `interceptor` (hooks) and `constants`.

mod cache;
mod constants;
mod executor;
mod inflight;
pub mod interceptor;
mod retry;

pub use retry::{Backoff, CacheMode, RequestOptions, RetryConfig};

use crate::core::net::{ReqwestTransport, Transport};
use crate::core::{ApiError, EndpointKey, Payload, RequestSpec, Verb};
use cache::CacheStore;
use constants::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT, JSON_MIME, REQUESTED_WITH, USER_AGENT,
};
use executor::Executor;
use futures::FutureExt;
use futures::future::Abortable;
use inflight::InFlightTable;
use interceptor::{ErrorInterceptor, Interceptors, RequestInterceptor, ResponseInterceptor};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The validated configuration of an [`ApiClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base that relative endpoints are appended to. Default: `http://127.0.0.1:8000/api`.
    pub base_url: Url,
    /// Per-attempt timeout. Default: 30 s.
    pub timeout: Duration,
    /// Retry budget and backoff. Default: 3 attempts, exponential from 1 s.
    pub retry: RetryConfig,
    /// Lifetime of cached GET responses; `None` when caching is disabled. Default: 60 s.
    pub cache_ttl: Option<Duration>,
}

/// An HTTP+JSON client with response caching, retry, and in-flight deduplication.
///
/// Cloning is cheap: clones share the cache, the in-flight registry and the
/// connection pool. Build one at the composition root and hand it to callers.
///
/// # Example
///
/// ```no_run
/// # use pandora_http::{ApiClient, RequestOptions};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder()
///     .base_url(url::Url::parse("http://127.0.0.1:8000/api")?)
///     .build()?;
///
/// let prompts = client.get("/prompts", RequestOptions::new()).await?;
/// client
///     .post("/prompts", &serde_json::json!({ "title": "Haiku" }), RequestOptions::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    default_headers: HeaderMap,
    executor: Executor,
    cache: Option<Arc<CacheStore>>,
    in_flight: Arc<InFlightTable>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("default_headers", &self.default_headers)
            .field("interceptors", &self.executor.interceptors().counts())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http://` and `https://` endpoints are used as-is.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, ApiError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(Url::parse(endpoint)?);
        }
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /* ----------------------- verbs ----------------------- */

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, opts), err))]
    pub async fn get(&self, endpoint: &str, opts: RequestOptions) -> Result<Payload, ApiError> {
        self.send(Verb::Get, endpoint, None, opts).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, body, opts), err))]
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> Result<Payload, ApiError> {
        let body = serde_json::to_string(body)?;
        self.send(Verb::Post, endpoint, Some(body), opts).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, body, opts), err))]
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> Result<Payload, ApiError> {
        let body = serde_json::to_string(body)?;
        self.send(Verb::Put, endpoint, Some(body), opts).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, opts), err))]
    pub async fn delete(&self, endpoint: &str, opts: RequestOptions) -> Result<Payload, ApiError> {
        self.send(Verb::Delete, endpoint, None, opts).await
    }

    /// GET and decode the JSON response into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.resolve(endpoint)?;
        self.get(endpoint, opts).await?.decode(url.as_str())
    }

    /// POST a JSON body and decode the JSON response into `T`.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.resolve(endpoint)?;
        self.post(endpoint, body, opts).await?.decode(url.as_str())
    }

    /// Dispatch any verb. `body` must already be JSON-serialized.
    pub async fn send(
        &self,
        verb: Verb,
        endpoint: &str,
        body: Option<String>,
        opts: RequestOptions,
    ) -> Result<Payload, ApiError> {
        let RequestOptions {
            cache_mode,
            timeout,
            headers,
            abort,
        } = opts;

        let call = self.dispatch(verb, endpoint, body, cache_mode, timeout, headers);
        match abort {
            Some(registration) => Abortable::new(call, registration)
                .await
                .unwrap_or(Err(ApiError::Aborted)),
            None => call.await,
        }
    }

    async fn dispatch(
        &self,
        verb: Verb,
        endpoint: &str,
        body: Option<String>,
        cache_mode: CacheMode,
        timeout: Option<Duration>,
        overrides: HeaderMap,
    ) -> Result<Payload, ApiError> {
        let url = self.resolve(endpoint)?;
        let key = EndpointKey::new(verb, &url, body.as_deref());

        if !verb.is_mutating() {
            // A call already on the wire wins over the cache, so nobody issued
            // during a flight sees a value from before it.
            if let Some(call) = self.in_flight.attach(&key) {
                #[cfg(feature = "tracing")]
                tracing::debug!(%key, "joined in-flight request");
                return call.await;
            }
            if cache_mode.reads()
                && let Some(cache) = &self.cache
                && let Some(hit) = cache.get(&url).await
            {
                #[cfg(feature = "tracing")]
                tracing::debug!(%key, "cache hit");
                return Ok(hit);
            }
        }

        let req = RequestSpec {
            verb,
            url: url.clone(),
            headers: self.headers_for(verb, &overrides),
            body,
            timeout: timeout.unwrap_or(self.config.timeout),
        };
        let executor = self.executor.clone();
        let cache = self.cache.clone();

        let call = self.in_flight.join_or_start(key, move || {
            // Read before the request goes out, so a write that lands while
            // it is on the wire keeps its result out of the cache.
            let generation = cache.as_ref().map_or(0, |cache| cache.generation());
            async move {
                let settled = executor.execute(req).await?;
                if !settled.recovered
                    && let Some(cache) = cache
                {
                    if verb.is_mutating() {
                        let _dropped = cache.invalidate_related(&url).await;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(url = %url, dropped = _dropped, "invalidated related cache entries");
                    } else if cache_mode.writes() {
                        let _stored = cache
                            .put_if_unchanged(&url, settled.payload.clone(), generation)
                            .await;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(url = %url, stored = _stored, "cached response");
                    }
                }
                Ok::<_, ApiError>(settled.payload)
            }
            .boxed()
        });

        call.await
    }

    fn headers_for(&self, verb: Verb, overrides: &HeaderMap) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        if verb.has_body() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME));
        }
        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /* ----------------------- cache management ----------------------- */

    /// Drop every cached response.
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }

    /// Drop cached responses related to `endpoint` (same path, its parents and children).
    pub async fn invalidate(&self, endpoint: &str) -> Result<usize, ApiError> {
        let url = self.resolve(endpoint)?;
        Ok(match &self.cache {
            Some(cache) => cache.invalidate_related(&url).await,
            None => 0,
        })
    }

    /// Store a value for `endpoint` as if it had been fetched.
    /// `ttl` overrides the configured cache TTL for this entry.
    pub async fn prime_cache(
        &self,
        endpoint: &str,
        payload: Payload,
        ttl: Option<Duration>,
    ) -> Result<(), ApiError> {
        let url = self.resolve(endpoint)?;
        if let Some(cache) = &self.cache {
            cache.put(&url, payload, ttl).await;
        }
        Ok(())
    }

    /// Remove expired entries now instead of on their next read.
    pub async fn purge_expired(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.purge_expired().await,
            None => 0,
        }
    }

    /// Number of live cache entries.
    pub async fn cached_entries(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.len().await,
            None => 0,
        }
    }

    /// Number of distinct requests currently on the wire.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    cache_ttl: Option<Duration>,
    cache_disabled: bool,
    headers: Vec<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    interceptors: Interceptors,
}

impl ApiClientBuilder {
    /// Override the API base (e.g., `https://pandora.example.com/api`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the per-attempt timeout. Default: 30 s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Replace the retry policy.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Total attempts per logical request. Default: 3.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry.get_or_insert_with(RetryConfig::default).max_attempts = attempts;
        self
    }

    /// Base delay of the backoff. Default: 1 s, doubled on every retry.
    pub fn retry_delay(mut self, base: Duration) -> Self {
        let retry = self.retry.get_or_insert_with(RetryConfig::default);
        retry.backoff = match retry.backoff {
            Backoff::Fixed(_) => Backoff::Fixed(base),
            Backoff::Exponential { factor, max, .. } => Backoff::Exponential { base, factor, max },
        };
        self
    }

    /// Lifetime of cached GET responses. Default: 60 s.
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self.cache_disabled = false;
        self
    }

    /// Turn the response cache off. Deduplication stays active.
    pub fn disable_cache(mut self) -> Self {
        self.cache_disabled = true;
        self
    }

    /// Send an extra header with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the reqwest-backed transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn request_interceptor(mut self, i: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push_request(Arc::new(i));
        self
    }

    pub fn response_interceptor(mut self, i: impl ResponseInterceptor + 'static) -> Self {
        self.interceptors.push_response(Arc::new(i));
        self
    }

    pub fn error_interceptor(mut self, i: impl ErrorInterceptor + 'static) -> Self {
        self.interceptors.push_error(Arc::new(i));
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if !matches!(base_url.scheme(), "http" | "https") || !base_url.has_host() {
            return Err(ApiError::Config(format!(
                "base URL must be an absolute http(s) URL, got {base_url}"
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ApiError::Config("timeout must be greater than zero".into()));
        }

        let retry = self.retry.unwrap_or_default();
        retry.validate().map_err(ApiError::Config)?;

        let cache_ttl = if self.cache_disabled {
            None
        } else {
            Some(self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))
        };
        if cache_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ApiError::Config("cache TTL must be greater than zero".into()));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_MIME));
        default_headers.insert(
            HeaderName::from_static(REQUESTED_WITH.0),
            HeaderValue::from_static(REQUESTED_WITH.1),
        );
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Config(format!("invalid value for header {name}: {e}")))?;
            default_headers.insert(name, value);
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let mut httpb = reqwest::Client::builder()
                    .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));
                if let Some(ct) = self.connect_timeout {
                    httpb = httpb.connect_timeout(ct);
                }
                let http = httpb
                    .build()
                    .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;
                Arc::new(ReqwestTransport::new(http))
            }
        };

        Ok(ApiClient {
            config: Arc::new(ClientConfig {
                base_url,
                timeout,
                retry: retry.clone(),
                cache_ttl,
            }),
            default_headers,
            executor: Executor::new(transport, retry, Arc::new(self.interceptors)),
            cache: cache_ttl.map(|ttl| Arc::new(CacheStore::new(ttl))),
            in_flight: Arc::new(InFlightTable::default()),
        })
    }
}
