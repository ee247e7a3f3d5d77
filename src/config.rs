use std::env;

use secrecy::SecretString;

/// Access tokens never live longer than this, whatever the environment says.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

pub const MAX_ATTEMPT_WINDOW_HOURS: i64 = 24 * 365;
pub const MAX_ORACLE_RETRIES: u32 = 5;

const DEFAULT_JWT_SECRET: &str = "dev_access_secret_change_in_production";
const DEFAULT_REFRESH_SECRET: &str = "dev_refresh_secret_change_in_production";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub store_backend: StoreBackend,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub app_env: String,
    pub frontend_cors_origin: String,
    pub jwt_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub openai_api_key: SecretString,
    pub oracle_base_url: String,
    pub oracle_model: String,
    pub oracle_timeout_secs: u64,
    pub oracle_max_retries: u32,
    pub max_quiz_attempts: usize,
    pub attempt_window_hours: i64,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<SecretString>,
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        };

        let access_token_ttl_minutes = parsed_var("ACCESS_TOKEN_TTL_MINUTES", 15);
        if access_token_ttl_minutes > MAX_ACCESS_TOKEN_TTL_MINUTES {
            log::warn!(
                "ACCESS_TOKEN_TTL_MINUTES={} exceeds the {} minute ceiling, clamping",
                access_token_ttl_minutes,
                MAX_ACCESS_TOKEN_TTL_MINUTES
            );
        }

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "assigntrack-local".to_string()),
            store_backend,
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parsed_var("WEB_SERVER_PORT", 8000),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            frontend_cors_origin: env::var("FRONTEND_CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            refresh_token_secret: SecretString::from(
                env::var("REFRESH_TOKEN_SECRET")
                    .unwrap_or_else(|_| DEFAULT_REFRESH_SECRET.to_string()),
            ),
            access_token_ttl_minutes: access_token_ttl_minutes
                .clamp(1, MAX_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl_days: parsed_var("REFRESH_TOKEN_TTL_DAYS", 7),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            oracle_base_url: env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            oracle_model: env::var("ORACLE_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            oracle_timeout_secs: parsed_var("ORACLE_TIMEOUT_SECS", 20),
            oracle_max_retries: parsed_var("ORACLE_MAX_RETRIES", 2u32).min(MAX_ORACLE_RETRIES),
            max_quiz_attempts: parsed_var("MAX_QUIZ_ATTEMPTS", 3),
            attempt_window_hours: parsed_var("ATTEMPT_WINDOW_HOURS", 12i64)
                .clamp(1, MAX_ATTEMPT_WINDOW_HOURS),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .map(SecretString::from),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();
        let refresh_secret = self.refresh_token_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if refresh_secret == DEFAULT_REFRESH_SECRET {
            panic!(
                "FATAL: REFRESH_TOKEN_SECRET is using default value! Set REFRESH_TOKEN_SECRET environment variable."
            );
        }

        for (name, secret) in [("JWT_SECRET", jwt_secret), ("REFRESH_TOKEN_SECRET", refresh_secret)] {
            if secret.len() < 32 {
                panic!(
                    "FATAL: {} is too short ({}). Must be at least 32 characters for security.",
                    name,
                    secret.len()
                );
            }
        }

        if jwt_secret == refresh_secret {
            panic!("FATAL: JWT_SECRET and REFRESH_TOKEN_SECRET must differ.");
        }

        if self.openai_api_key.expose_secret().is_empty() {
            panic!("FATAL: OPENAI_API_KEY is not set; open-ended questions cannot be graded.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "assigntrack-test".to_string(),
            store_backend: StoreBackend::Memory,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            app_env: "test".to_string(),
            frontend_cors_origin: "http://localhost:5173".to_string(),
            jwt_secret: SecretString::from("test_access_secret_key".to_string()),
            refresh_token_secret: SecretString::from("test_refresh_secret_key".to_string()),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            openai_api_key: SecretString::from("test-key".to_string()),
            oracle_base_url: "http://127.0.0.1:9".to_string(),
            oracle_model: "gpt-3.5-turbo".to_string(),
            oracle_timeout_secs: 1,
            oracle_max_retries: 0,
            max_quiz_attempts: 3,
            attempt_window_hours: 12,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(config.access_token_ttl_minutes <= MAX_ACCESS_TOKEN_TTL_MINUTES);
        assert!(config.access_token_ttl_minutes >= 1);
        assert!((1..=MAX_ATTEMPT_WINDOW_HOURS).contains(&config.attempt_window_hours));
        assert!(config.oracle_max_retries <= MAX_ORACLE_RETRIES);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.max_quiz_attempts, 3);
        assert_eq!(config.attempt_window_hours, 12);
        assert_eq!(config.refresh_token_ttl_days, 7);
        assert!(!config.is_production());
    }

    #[test]
    #[should_panic(expected = "JWT_SECRET is using default value")]
    fn test_production_validation_rejects_default_secret() {
        let mut config = Config::test_config();
        config.jwt_secret = SecretString::from(DEFAULT_JWT_SECRET.to_string());
        config.validate_for_production();
    }

    #[test]
    #[should_panic(expected = "must differ")]
    fn test_production_validation_rejects_shared_secret() {
        let mut config = Config::test_config();
        let shared = "a".repeat(40);
        config.jwt_secret = SecretString::from(shared.clone());
        config.refresh_token_secret = SecretString::from(shared);
        config.validate_for_production();
    }
}
