//! Core library for the libris library-management client.
//!
//! - `auth`: session identity types and persistent credential storage
//! - `api`: the authenticated REST client, its single-flight token refresh
//!   and typed wrappers for every backend resource
//! - `models`: response and request bodies shared with the backend
//! - `config`: on-disk client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiClientBuilder, ApiError, ApiRequest, RefreshFailure};
pub use auth::{CredentialStore, Role, SessionIdentity};
pub use config::Config;
