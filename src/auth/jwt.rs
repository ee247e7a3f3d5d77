use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::claims::{Claims, TokenType},
    config::{Config, MAX_ACCESS_TOKEN_TTL_MINUTES},
    errors::{AppError, AppResult},
    models::domain::user::UserRole,
};

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Signs and verifies session tokens. Access and refresh tokens use separate
/// secrets so that one kind can never be forged from the other.
#[derive(Clone)]
pub struct JwtService {
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> AppResult<Self> {
        if access_secret.expose_secret() == refresh_secret.expose_secret() {
            return Err(AppError::InternalError(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            access_keys: KeyPair::from_secret(access_secret),
            refresh_keys: KeyPair::from_secret(refresh_secret),
            validation,
            access_ttl: access_ttl.min(Duration::minutes(MAX_ACCESS_TOKEN_TTL_MINUTES)),
            refresh_ttl,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.jwt_secret,
            &config.refresh_token_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    fn keys(&self, token_type: TokenType) -> &KeyPair {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    pub(crate) fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.keys(claims.token_type).encoding)
            .map_err(|e| AppError::InternalError(format!("Failed to create JWT: {}", e)))
    }

    pub fn create_access_token(&self, user_id: &str, role: UserRole) -> AppResult<String> {
        let claims = Claims::new(user_id, role, TokenType::Access, Utc::now(), self.access_ttl);
        self.sign(&claims)
    }

    /// Returns the token and the instant it stops being honored.
    pub fn create_refresh_token(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<(String, DateTime<Utc>)> {
        let issued_at = Utc::now();
        let claims = Claims::new(user_id, role, TokenType::Refresh, issued_at, self.refresh_ttl);
        let token = self.sign(&claims)?;
        Ok((token, issued_at + self.refresh_ttl))
    }

    fn verify(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map(|data| data.claims)?;

        if claims.token_type != expected {
            return Err(AppError::TokenInvalid(format!(
                "expected a {:?} token",
                expected
            )));
        }

        Ok(claims)
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenType::Refresh)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
