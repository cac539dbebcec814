use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::session::{CredentialPair, SessionIdentity};
use super::store::{KeyValueStore, MemoryStore};

const ACCESS_TOKEN_KEY: &str = "library_access_token";
const REFRESH_TOKEN_KEY: &str = "library_refresh_token";
const USER_KEY: &str = "library_user";

/// Reads and writes the credential pair and session identity.
///
/// Clone is cheap; clones share the backend and the write lock, so
/// `save_session` and `clear_all` are atomic with respect to each other.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.backend.get(key)?.filter(|v| !v.is_empty()))
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Store a new access token, and the refresh token only when one is given.
    ///
    /// An absent or empty refresh token keeps the stored one, which lets the
    /// backend rotate access tokens alone.
    pub fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend
            .set(ACCESS_TOKEN_KEY, access_token)
            .context("Failed to store access token")?;
        if let Some(refresh) = refresh_token.filter(|t| !t.is_empty()) {
            self.backend
                .set(REFRESH_TOKEN_KEY, refresh)
                .context("Failed to store refresh token")?;
        }
        Ok(())
    }

    /// The cached identity. A value that no longer parses clears the whole session.
    pub fn identity(&self) -> Result<Option<SessionIdentity>> {
        let Some(raw) = self.read(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                warn!(error = %e, "Stored session identity is corrupt, clearing credentials");
                self.clear_all()?;
                Ok(None)
            }
        }
    }

    /// Persist a full session from a login or registration response.
    pub fn save_session(&self, pair: &CredentialPair, identity: &SessionIdentity) -> Result<()> {
        let user = serde_json::to_string(identity)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend
            .set(ACCESS_TOKEN_KEY, &pair.access_token)
            .context("Failed to store access token")?;
        if !pair.refresh_token.is_empty() {
            self.backend
                .set(REFRESH_TOKEN_KEY, &pair.refresh_token)
                .context("Failed to store refresh token")?;
        }
        self.backend
            .set(USER_KEY, &user)
            .context("Failed to store session identity")?;
        debug!(user_id = identity.user_id, role = %identity.role, "Session saved");
        Ok(())
    }

    /// Replace the cached identity, e.g. after a profile edit.
    pub fn update_identity(&self, identity: &SessionIdentity) -> Result<()> {
        let user = serde_json::to_string(identity)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend
            .set(USER_KEY, &user)
            .context("Failed to store session identity")
    }

    /// Remove access token, refresh token and identity.
    ///
    /// Every key is attempted; the first failure is returned afterwards.
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut first_error = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove stored credential");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.context("Failed to clear credentials")),
            None => {
                debug!("Credentials cleared");
                Ok(())
            }
        }
    }

    /// True when both an access token and an identity are stored.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_))) && matches!(self.identity(), Ok(Some(_)))
    }
}
