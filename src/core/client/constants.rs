//! Centralized constants for default endpoints, headers and timings.

use std::time::Duration;

/// Default client UA.
pub(crate) const USER_AGENT: &str = concat!("pandora-http/", env!("CARGO_PKG_VERSION"));

/// Pandora backend API base (endpoints are appended).
pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Marks requests as XHR so the backend answers with JSON errors instead of pages.
pub(crate) const REQUESTED_WITH: (&str, &str) = ("x-requested-with", "XMLHttpRequest");

pub(crate) const JSON_MIME: &str = "application/json";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

pub(crate) const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Base of the exponential backoff.
pub(crate) const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

pub(crate) const DEFAULT_RETRY_DELAY_MAX: Duration = Duration::from_secs(30);

pub(crate) const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(60_000);
