use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, role: UserRole) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            role,
            logged_in: false,
            last_login: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Partial update applied atomically by the credential store.
/// Only the fields that are `Some` are written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserPatch {
    pub fn login(at: DateTime<Utc>) -> Self {
        Self {
            logged_in: Some(true),
            last_login: Some(at),
            ..Default::default()
        }
    }

    pub fn logout() -> Self {
        Self {
            logged_in: Some(false),
            ..Default::default()
        }
    }

    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(logged_in) = self.logged_in {
            user.logged_in = logged_in;
        }
        if let Some(last_login) = self.last_login {
            user.last_login = Some(last_login);
        }
    }
}

#[cfg(test)]
impl User {
    pub fn test_user(email: &str, role: UserRole) -> Self {
        User::new("Test User", email, "not-a-real-hash".to_string(), role)
    }
}
