//! The network seam: one physical HTTP exchange, and decoding of its body.

use crate::core::models::{Payload, RequestSpec};
use crate::core::ApiError;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::future::Future;
use std::pin::Pin;

/// A raw HTTP response with its body fully read.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub(crate) fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Failure to complete an exchange at the transport level.
#[derive(Clone, Debug)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Performs one physical HTTP exchange.
///
/// Implemented by [`ReqwestTransport`]; tests and embedders can supply their
/// own implementation through `ApiClientBuilder::transport`. Timeouts and
/// retries are applied around this call, never inside it.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        req: RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>>;
}

/// The default transport, backed by a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        req: RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self
                .http
                .request(req.verb.to_method(), req.url)
                .headers(req.headers);
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await.map_err(describe)?;
            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            let body = resp.text().await.map_err(describe)?;
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn describe(e: reqwest::Error) -> TransportError {
    let kind = if e.is_connect() {
        "connect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    };
    TransportError::new(format!("{kind}: {e}"))
}

/// Decode a successful response body.
///
/// Declared JSON must parse; anything else is kept as text.
pub(crate) fn decode_body(resp: &RawResponse, url: &str) -> Result<Payload, ApiError> {
    if resp.status == 204 || resp.body.trim().is_empty() {
        return Ok(Payload::Empty);
    }
    if resp.is_json() {
        return serde_json::from_str(&resp.body)
            .map(Payload::Json)
            .map_err(|e| ApiError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            });
    }
    Ok(Payload::Text(resp.body.clone()))
}
