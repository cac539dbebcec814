//! Account (`/users`) and admin dashboard (`/admin/stats`) endpoints.

use tracing::warn;

use crate::auth::SessionIdentity;
use crate::models::{AdminStats, Book, PasswordChange, UserAccount, UserProfile, UserUpdate};

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    pub async fn fetch_current_user(&self) -> Result<UserProfile, ApiError> {
        self.get("/users/me").await
    }

    pub async fn fetch_user(&self, user_id: i64) -> Result<UserAccount, ApiError> {
        self.get(&format!("/users/{}", user_id)).await
    }

    /// Update a profile; when it is the logged-in user, the cached identity follows.
    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<UserAccount, ApiError> {
        let account: UserAccount = self.put(&format!("/users/{}", user_id), update).await?;

        if let Ok(Some(identity)) = self.credentials().identity() {
            if identity.user_id == account.id {
                let refreshed = SessionIdentity {
                    user_id: account.id,
                    name: account.name.clone(),
                    email: account.email.clone(),
                    role: account.role.unwrap_or(identity.role),
                };
                if let Err(e) = self.credentials().update_identity(&refreshed) {
                    warn!(error = %e, "Failed to update cached session identity");
                }
            }
        }
        Ok(account)
    }

    pub async fn change_password(&self, user_id: i64, change: &PasswordChange) -> Result<(), ApiError> {
        let request = ApiRequest::put(format!("/users/{}/password", user_id)).json(change)?;
        self.send_empty(request).await
    }

    pub async fn fetch_all_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        self.get("/users").await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/users/{}", user_id)).await
    }

    pub async fn fetch_recommendations(&self, user_id: i64) -> Result<Vec<Book>, ApiError> {
        self.get(&format!("/users/{}/recommendations", user_id)).await
    }

    pub async fn fetch_admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get("/admin/stats").await
    }
}
