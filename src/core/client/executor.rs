//! One logical request: interceptors, per-attempt timeout, and the retry loop.
//!
//! The executor knows nothing about the cache or the in-flight registry.

use super::interceptor::Interceptors;
use super::retry::RetryConfig;
use crate::core::net::{RawResponse, Transport, decode_body};
use crate::core::{ApiError, Payload, RequestSpec, ResponseMeta};
use std::sync::Arc;

/// Result of a logical request that reached the caller as a value.
#[derive(Clone, Debug)]
pub(crate) struct Settled {
    pub(crate) payload: Payload,
    /// The value was substituted by an error interceptor.
    pub(crate) recovered: bool,
}

#[derive(Clone)]
pub(crate) struct Executor {
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    interceptors: Arc<Interceptors>,
}

impl Executor {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        retry: RetryConfig,
        interceptors: Arc<Interceptors>,
    ) -> Self {
        Self {
            transport,
            retry,
            interceptors,
        }
    }

    pub(crate) fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    pub(crate) async fn execute(&self, req: RequestSpec) -> Result<Settled, ApiError> {
        let req = self.interceptors.apply_request(req).await;

        match self.execute_with_retry(req).await {
            Ok((payload, meta)) => Ok(Settled {
                payload: self.interceptors.apply_response(payload, &meta).await,
                recovered: false,
            }),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, status = ?err.status(), attempts = err.attempts(), "request failed");

                match self.interceptors.recover(&err).await {
                    Some(payload) => Ok(Settled {
                        payload,
                        recovered: true,
                    }),
                    None => Err(err),
                }
            }
        }
    }

    async fn execute_with_retry(&self, req: RequestSpec) -> Result<(Payload, ResponseMeta), ApiError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, max = self.retry.max_attempts, verb = %req.verb, url = %req.url, "dispatch");

            match self.attempt(req.clone()).await {
                Ok(done) => return Ok(done),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff.delay_for(attempt - 1);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %err, ?delay, "retrying");

                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.with_attempts(attempt)),
            }
        }
    }

    /// A single exchange raced against the per-attempt timeout. The losing
    /// transport future is dropped, which aborts the connection.
    async fn attempt(&self, req: RequestSpec) -> Result<(Payload, ResponseMeta), ApiError> {
        let url = req.url.to_string();
        let timeout = req.timeout;

        let raw = match tokio::time::timeout(timeout, self.transport.send(req)).await {
            Err(_) => return Err(ApiError::Timeout { url, attempts: 1 }),
            Ok(Err(e)) => {
                return Err(ApiError::NetworkUnavailable {
                    url,
                    message: e.message,
                    attempts: 1,
                });
            }
            Ok(Ok(raw)) => raw,
        };

        check_status(&raw, &url)?;
        let payload = decode_body(&raw, &url)?;
        Ok((
            payload,
            ResponseMeta {
                status: raw.status,
                url,
                headers: raw.headers,
            },
        ))
    }
}

fn check_status(raw: &RawResponse, url: &str) -> Result<(), ApiError> {
    match raw.status {
        200..=299 => Ok(()),
        status if status >= 500 => Err(ApiError::Server {
            status,
            url: url.to_string(),
            attempts: 1,
        }),
        status @ 400..=499 => Err(ApiError::Client {
            status,
            url: url.to_string(),
            body: raw.body.clone(),
        }),
        status => Err(ApiError::UnexpectedStatus {
            status,
            url: url.to_string(),
        }),
    }
}
