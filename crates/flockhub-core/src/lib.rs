//! Flockhub client core.
//!
//! The data-access layer shared by every Flockhub client:
//!
//! - [`auth`]: token store, current-user marker and the 401 interceptor
//! - [`api`]: HTTP transport and the `ApiClient` facade
//! - [`services`]: typed per-resource request builders
//! - [`query`]: cache-aware queries with per-key request de-duplication
//! - [`config`], [`state`]: persisted settings and explicit app state
//! - [`mock`]: canned responses for offline mode

pub mod api;
pub mod auth;
pub mod config;
pub mod mock;
pub mod models;
pub mod query;
pub mod services;
pub mod state;

pub use api::{ApiClient, ApiClientConfig, ApiError, Envelope, Instance};
pub use config::Config;
pub use query::{QueryClient, QueryKey, QueryOptions, QueryResult, QueryStatus, Queries};
pub use services::{create_services, Services};
pub use state::AppState;
