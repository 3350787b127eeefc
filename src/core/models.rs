use crate::core::ApiError;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use url::Url;

/// The HTTP verbs the client dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Read-style request; served from cache when possible.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Verb {
    /// Whether the verb changes server state and must invalidate cached reads.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Verb::Get)
    }

    /// Whether the verb carries a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    pub(crate) fn to_method(self) -> reqwest::Method {
        match self {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Body of a response that declared `application/json`.
    Json(serde_json::Value),
    /// Body of any other response, as text.
    Text(String),
    /// No body at all (e.g. `204 No Content`).
    Empty,
}

impl Payload {
    /// Borrow the JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the text body, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Deserialize the payload into a typed value.
    ///
    /// Text payloads are parsed as JSON too, since some endpoints answer JSON
    /// without declaring it. An empty payload decodes as JSON `null`.
    pub fn decode<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let parsed = match self {
            Payload::Json(v) => T::deserialize(v),
            Payload::Text(s) => serde_json::from_str(s),
            Payload::Empty => T::deserialize(serde_json::Value::Null),
        };
        parsed.map_err(|e| ApiError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Identity of a logical request, used as the deduplication key.
///
/// Reads are identified by verb and resolved URL. Writes also carry the
/// serialized body so that distinct concurrent writes to one URL are never
/// collapsed into a single call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    verb: Verb,
    url: String,
    body: Option<String>,
}

impl EndpointKey {
    pub fn new(verb: Verb, url: &Url, body: Option<&str>) -> Self {
        Self {
            verb,
            url: url.as_str().to_string(),
            body: if verb.is_mutating() {
                body.map(str::to_string)
            } else {
                None
            },
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.verb, self.url)
    }
}

/// A fully prepared outgoing request, as seen by request interceptors and transports.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub verb: Verb,
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON-serialized body for POST/PUT.
    pub body: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

/// Metadata of a successful response, handed to response interceptors.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    pub status: u16,
    pub url: String,
    pub headers: HeaderMap,
}
