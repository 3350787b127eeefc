use futures::future::AbortRegistration;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Specifies the backoff strategy for retrying failed requests.
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed(Duration),
    /// Uses an exponential delay between retries.
    /// The delay is calculated as `base * (factor ^ retry_index)`.
    Exponential {
        /// The delay before the first retry.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the failed attempt with 0-based index `retry_index`.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { base, factor, max } => {
                let exp = i32::try_from(retry_index).unwrap_or(i32::MAX);
                let secs = base.as_secs_f64() * factor.powi(exp);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    *max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts for one logical request, the first one included.
    /// `1` disables retrying.
    pub max_attempts: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: super::constants::DEFAULT_RETRY_ATTEMPTS,
            backoff: Backoff::Exponential {
                base: super::constants::DEFAULT_RETRY_DELAY,
                factor: 2.0,
                max: super::constants::DEFAULT_RETRY_DELAY_MAX,
            },
        }
    }
}

impl RetryConfig {
    /// Exponential backoff doubling from `base`, with the given attempt budget.
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                base,
                factor: 2.0,
                max: super::constants::DEFAULT_RETRY_DELAY_MAX,
            },
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry max_attempts must be at least 1".into());
        }
        if let Backoff::Exponential { factor, .. } = self.backoff
            && !(factor.is_finite() && factor >= 1.0)
        {
            return Err(format!("backoff factor must be finite and >= 1, got {factor}"));
        }
        Ok(())
    }
}

/// Defines the behavior of the in-memory cache for an API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present; otherwise, fetch from the network
    /// and write the response to the cache. (Default)
    #[default]
    Use,
    /// Always fetch from the network, bypassing any cached entry, and write the new response to the cache.
    Refresh,
    /// Always fetch from the network and do not read from or write to the cache.
    Bypass,
}

impl CacheMode {
    pub(crate) fn reads(self) -> bool {
        matches!(self, CacheMode::Use)
    }

    pub(crate) fn writes(self) -> bool {
        !matches!(self, CacheMode::Bypass)
    }
}

/// Per-call options for [`ApiClient`](super::ApiClient) requests.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub(crate) cache_mode: CacheMode,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
    pub(crate) abort: Option<AbortRegistration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how this call interacts with the response cache.
    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Skip the cache entirely: no cached read, and the response is not stored.
    pub fn skip_cache(self) -> Self {
        self.cache_mode(CacheMode::Bypass)
    }

    /// Override the client's per-attempt timeout for this call.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Add a header, replacing any default header with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Stop waiting when the paired `AbortHandle` fires.
    ///
    /// Only this caller is released with `ApiError::Aborted`; a request shared
    /// with other callers keeps running for them.
    pub fn cancel_on(mut self, registration: AbortRegistration) -> Self {
        self.abort = Some(registration);
        self
    }
}
