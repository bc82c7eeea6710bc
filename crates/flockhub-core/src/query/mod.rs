//! Cache-aware query layer over the domain services.
//!
//! Results are cached per `QueryKey` and refetched when missing, stale
//! (older than `QueryOptions::stale_time`, five minutes by default) or
//! invalidated. At most one fetch per key is in flight; concurrent callers
//! share it. Reads retry once on retryable errors, writes never by default.
//! A query whose prerequisite ids are missing stays idle and never fetches.

mod client;
mod hooks;
mod key;
mod options;
mod result;

pub use client::QueryClient;
pub use hooks::Queries;
pub use key::QueryKey;
pub use options::{
    MutationOptions, QueryOptions, DEFAULT_CACHE_TIME, DEFAULT_RETRY_DELAY, DEFAULT_STALE_TIME,
};
pub use result::{QueryObserver, QueryResult, QueryStatus};
