//! REST API client module for the library backend.
//!
//! This module provides the `ApiClient` for communicating with the library
//! service: catalogue, borrowing, reservations, fines, users and admin data.
//!
//! The API uses JWT bearer token authentication. Access tokens are renewed
//! through `/auth/refresh-token` by a single-flight `RefreshCoordinator`,
//! so concurrent requests that hit an expired token share one refresh call.

pub mod books;
pub mod circulation;
pub mod client;
pub mod error;
pub mod fines;
pub mod refresh;
pub mod request;
pub mod users;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ErrorBody};
pub use refresh::{RefreshCoordinator, RefreshFailure, RefreshedTokens, SessionExpiredHook};
pub use request::ApiRequest;
