use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Account as embedded in borrow and reservation records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// `/users/me`: the account plus circulation counters.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub borrowed_count: i64,
    #[serde(default)]
    pub current_borrows: i64,
    #[serde(default)]
    pub reservation_count: i64,
    #[serde(default)]
    pub overdue_count: i64,
    #[serde(default)]
    pub unpaid_fines_count: i64,
    #[serde(default)]
    pub total_unpaid_fines: f64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub total_books: i64,
    #[serde(default)]
    pub total_borrows: i64,
    #[serde(default)]
    pub total_reservations: i64,
    #[serde(default)]
    pub overdue_borrows: i64,
    #[serde(default)]
    pub active_fines: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{"id":1,"name":"Ada","email":"ada@example.com","role":"ADMIN","createdAt":"2024-01-01T12:00:00","borrowedCount":10,"currentBorrows":2,"reservationCount":1,"overdueCount":0,"unpaidFinesCount":1,"totalUnpaidFines":2.5}"#;
        let profile: UserProfile = serde_json::from_str(json).expect("Failed to parse profile JSON");

        assert_eq!(profile.role, Some(Role::Admin));
        assert_eq!(profile.current_borrows, 2);
        assert!(profile.phone.is_none());
    }

    #[test]
    fn test_user_update_omits_unset_fields() {
        let update = UserUpdate {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"phone":"555-0100"}"#);
    }
}
