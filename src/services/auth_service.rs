use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        Claims, JwtService,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{refresh_token::hash_token, RefreshToken, User, UserPatch, UserRole},
        dto::request::{RegisterRequest, UpdatePasswordRequest},
    },
    repositories::{RefreshTokenRepository, UserRepository},
};

/// Tokens handed out by a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: User,
}

/// Owns the session lifecycle: login, access renewal, logout and password changes.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: JwtService,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                request.email.trim().to_lowercase()
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(&request.name, &request.email, password_hash, UserRole::Student);
        let user = self.users.create(user).await?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredential);
        }

        let user = self
            .users
            .update(&user.id, UserPatch::login(Utc::now()))
            .await?;

        let access_token = self.jwt.create_access_token(&user.id, user.role)?;
        let (refresh_token, refresh_expires_at) =
            self.jwt.create_refresh_token(&user.id, user.role)?;

        self.refresh_tokens
            .create(RefreshToken::issue(&user.id, &refresh_token, refresh_expires_at))
            .await?;

        log::info!("User {} logged in", user.id);
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_expires_at,
            user,
        })
    }

    /// Mints a new access token; the refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        let stored = self
            .refresh_tokens
            .find_by_token_hash(&hash_token(refresh_token))
            .await?;
        match stored {
            Some(token) if token.is_valid_at(Utc::now()) && token.user_id == claims.sub => {}
            _ => {
                return Err(AppError::TokenInvalid(
                    "Refresh token has been revoked".to_string(),
                ))
            }
        }

        let user = self
            .users
            .find_by_id(claims.user_id())
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.jwt.create_access_token(&user.id, claims.role)
    }

    pub async fn logout(&self, user_id: Option<&str>) -> AppResult<()> {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AppError::MissingUserId)?;

        self.users.update(user_id, UserPatch::logout()).await?;
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;

        log::info!("User {} logged out, {} refresh token(s) revoked", user_id, revoked);
        Ok(())
    }

    pub fn validate(&self, access_token: &str) -> AppResult<Claims> {
        self.jwt.validate_token(access_token)
    }

    pub async fn update_password(&self, request: UpdatePasswordRequest) -> AppResult<()> {
        request.validate()?;

        if request.password != request.confirm_password {
            return Err(AppError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let password_hash = hash_password(&request.password)?;
        self.users
            .update(&user.id, UserPatch::password(password_hash))
            .await?;
        self.refresh_tokens.revoke_all_for_user(&user.id).await?;

        log::info!("Password updated for user {}", user.id);
        Ok(())
    }

    pub async fn profile(&self, user_id: &str) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn list_users(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        self.users.list_users(offset, limit).await
    }

    /// Seeds an admin account once; an existing account with that email is left untouched.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<User> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if !existing.is_admin() {
                log::warn!("Bootstrap admin email {} belongs to a non-admin account", email);
            }
            return Ok(existing);
        }

        let password_hash = hash_password(password)?;
        let admin = self
            .users
            .create(User::new("Administrator", email, password_hash, UserRole::Admin))
            .await?;

        log::info!("Created bootstrap admin account {}", admin.id);
        Ok(admin)
    }
}
