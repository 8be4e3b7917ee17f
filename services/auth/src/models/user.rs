//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// User entity as persisted
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub failed_login_attempts: i32,
    pub blocked: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Snapshot of the fields carried in a session token
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Authenticated identity, embedded as-is in the session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Lockout fields after a failed attempt has been recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutState {
    pub failed_login_attempts: i32,
    pub blocked: bool,
}

/// New user creation payload; `password_hash` is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// User update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub disabled: Option<bool>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.disabled.is_none()
    }
}

/// User login credentials; absent fields deserialize as empty strings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Account view returned by the administration endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub failed_login_attempts: i32,
    pub blocked: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            failed_login_attempts: user.failed_login_attempts,
            blocked: user.blocked,
            disabled: user.disabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_credentials_default_missing_fields() {
        let creds: LoginCredentials = serde_json::from_str(r#"{"username":"tech1"}"#).unwrap();
        assert_eq!(creds.username, "tech1");
        assert!(creds.password.is_empty());
    }

    #[test]
    fn user_response_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 7,
            username: "tech1".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "Técnico Uno".to_string(),
            email: "tech1@colegio.edu".to_string(),
            phone: None,
            role: Role::Collaborator,
            failed_login_attempts: 2,
            blocked: false,
            disabled: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["failed_login_attempts"], 2);
        assert_eq!(json["role"], "COLLABORATOR");
    }
}
