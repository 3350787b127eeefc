//! Core components of the `pandora-http` client.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`ApiClient`] and its builder.
//! - The primary [`ApiError`] type.
//! - Request/response models like [`Verb`] and [`Payload`].
//! - The [`Transport`] seam that performs the physical HTTP exchange.

/// The main client (`ApiClient`), builder, and configuration.
pub mod client;
/// The primary error type (`ApiError`) for the crate.
pub mod error;
/// Request and response models shared by the client and its hooks.
pub mod models;
/// The transport trait and its reqwest implementation.
pub mod net;

// convenient re-exports so most code can just `use crate::core::ApiClient`
pub use client::{ApiClient, ApiClientBuilder, CacheMode, ClientConfig, RequestOptions};
pub use error::ApiError;
pub use models::{EndpointKey, Payload, RequestSpec, ResponseMeta, Verb};
pub use net::{RawResponse, ReqwestTransport, Transport, TransportError};
