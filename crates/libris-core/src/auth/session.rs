use serde::{Deserialize, Serialize};

/// Authorization level granted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged-in user, cached next to the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl SessionIdentity {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Opaque bearer credentials. Neither token is parsed client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body returned by `/auth/login` and `/auth/register`.
///
/// Every field is optional because registration may answer without tokens,
/// meaning the account exists but the user still has to log in.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl AuthResponse {
    /// Split into the credential pair and identity, or `None` when the
    /// response does not carry a complete session.
    pub fn into_session(self) -> Option<(CredentialPair, SessionIdentity)> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let identity = SessionIdentity {
            user_id: self.user_id?,
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            role: self.role.unwrap_or(Role::User),
        };
        let pair = CredentialPair {
            access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
        };
        Some((pair, identity))
    }
}

/// Result of a registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The backend issued tokens and the session is now stored.
    LoggedIn(SessionIdentity),
    /// The account was created but no tokens were issued.
    PendingLogin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"accessToken":"A1","refreshToken":"R1","userId":7,"name":"Ada","email":"ada@example.com","role":"ADMIN"}"#;
        let resp: AuthResponse = serde_json::from_str(json).expect("valid auth json");

        let (pair, identity) = resp.into_session().expect("complete session");
        assert_eq!(pair.access_token, "A1");
        assert_eq!(pair.refresh_token, "R1");
        assert_eq!(identity.user_id, 7);
        assert!(identity.is_admin());
    }

    #[test]
    fn test_register_without_token_is_not_a_session() {
        let json = r#"{"userId":7,"name":"Ada","email":"ada@example.com","role":"USER"}"#;
        let resp: AuthResponse = serde_json::from_str(json).expect("valid auth json");
        assert!(resp.into_session().is_none());
    }

    #[test]
    fn test_identity_round_trips_with_camel_case_keys() {
        let identity = SessionIdentity {
            user_id: 3,
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            role: Role::User,
        };
        let json = serde_json::to_string(&identity).expect("serialize");
        assert!(json.contains("\"userId\":3"));
        assert!(json.contains("\"role\":\"USER\""));
        assert!(!identity.is_admin());
    }
}
