//! REST API client module for the Flockhub backend.
//!
//! This module provides the `ApiClient` facade, the `HttpTransport` it is
//! built on, and the `ApiError` taxonomy shared by every layer above.
//!
//! Requests authenticate with a bearer token read from the token store on
//! every call, optionally alongside a cookie session.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, ApiClientConfig, Envelope, Instance};
pub use error::ApiError;
pub use transport::{HttpTransport, RequestDescriptor, TransportConfig};
