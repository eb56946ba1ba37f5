//! Authenticated users.

use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId, UserRole};

/// The signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    /// Whether the user may access the dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Successful login/register response: a bearer token plus the user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_auth_session() {
        let json = r#"{
            "token": "jwt.token.value",
            "user": {"id": "u1", "email": "reader@example.com", "name": "Mona", "role": "admin"}
        }"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.token, "jwt.token.value");
        assert!(session.user.is_admin());
    }

    #[test]
    fn test_user_accepts_mongo_style_id() {
        let json = r#"{"_id": "u2", "email": "a@example.com", "name": "Ali", "role": "user"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new("u2"));
        assert!(!user.is_admin());
    }
}
