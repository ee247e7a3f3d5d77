use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: UserRole,
    pub token_type: TokenType,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at (as UTC timestamp)
    pub jti: String,
}

impl Claims {
    pub fn new(
        user_id: &str,
        role: UserRole,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let exp = issued_at + ttl;

        Self {
            sub: user_id.to_string(),
            role,
            token_type,
            iat: issued_at.timestamp() as usize,
            exp: exp.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp as i64, 0)
    }
}
