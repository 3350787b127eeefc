//! pandora-http: the HTTP core of the Pandora prompt manager.
//!
//! [`ApiClient`] talks JSON to the Pandora backend and layers three
//! behaviours over every call:
//!
//! - **Caching**: successful GET responses are kept for a TTL and served
//!   without touching the network; writes invalidate related entries.
//! - **Retry**: timeouts, connection failures and 5xx responses are retried
//!   with exponential backoff; 4xx and parse failures surface immediately.
//! - **Deduplication**: concurrent identical requests share one network call
//!   and all observe the same outcome.
//!
//! Request, response and error interceptors let the application attach auth
//! headers, logging or fallbacks without the core knowing about them.

pub mod core;

pub use core::client::interceptor::{
    AsyncHook, ErrorInterceptor, RequestInterceptor, ResponseInterceptor,
};
pub use core::client::{Backoff, RetryConfig};
pub use core::{
    ApiClient, ApiClientBuilder, ApiError, CacheMode, ClientConfig, EndpointKey, Payload,
    RawResponse, RequestOptions, RequestSpec, ReqwestTransport, ResponseMeta, Transport,
    TransportError, Verb,
};
