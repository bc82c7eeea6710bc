//! Authentication state for API clients.
//!
//! This module provides:
//! - `Storage`: synchronous key/value media (memory, JSON file, OS keyring)
//! - `TokenStore`: the persisted session token behind the `TokenProvider` accessors
//! - `Session`: the persisted "current user" marker
//! - `UnauthorizedInterceptor`: session teardown on 401 responses

pub mod interceptor;
pub mod session;
pub mod storage;
pub mod token_store;

pub use interceptor::{UnauthorizedHandler, UnauthorizedInterceptor, LOGIN_ROUTE};
pub use session::{CurrentUser, Session, USER_KEY};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage};
pub use token_store::{TokenProvider, TokenStore, TOKEN_KEY};
