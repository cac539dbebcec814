//! Authentication module for session identity and credential persistence.
//!
//! This module provides:
//! - `SessionIdentity`, `Role`: the cached user profile shown without a round-trip
//! - `CredentialStore`: reads and writes the token pair and identity as one unit
//! - `KeyValueStore` backends: in-memory, JSON file, and OS keychain
//!
//! Three logical entries are kept: access token, refresh token, and identity.
//! They are written together on login and cleared together on logout.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{AuthResponse, CredentialPair, RegisterOutcome, Role, SessionIdentity};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
