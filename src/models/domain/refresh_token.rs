use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Server-side record of an issued refresh token. Only the digest is kept,
/// so a leaked collection cannot be replayed as cookies.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RefreshToken {
    pub user_id: String,
    pub token_hash: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    pub fn issue(user_id: &str, raw_token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            token_hash: hash_token(raw_token),
            expires_at,
            created_at: Utc::now(),
            revoked: false,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_issue_stores_digest_not_token() {
        let expires_at = Utc::now() + Duration::days(7);
        let token = RefreshToken::issue("user-1", "raw.jwt.value", expires_at);

        assert_eq!(token.user_id, "user-1");
        assert_ne!(token.token_hash, "raw.jwt.value");
        assert_eq!(token.token_hash, hash_token("raw.jwt.value"));
        assert!(token.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_expired_or_revoked_tokens_are_invalid() {
        let now = Utc::now();
        let expired = RefreshToken::issue("user-1", "t", now - Duration::seconds(1));
        assert!(!expired.is_valid_at(now));

        let mut revoked = RefreshToken::issue("user-1", "t", now + Duration::days(7));
        revoked.revoked = true;
        assert!(!revoked.is_valid_at(now));
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = hash_token("my-secret-token");

        assert_eq!(hash, hash_token("my-secret-token"));
        assert_ne!(hash, hash_token("my-other-token"));
        assert_eq!(hash.len(), 64);
    }
}
