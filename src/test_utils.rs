#[cfg(test)]
pub mod fixtures {
    use std::sync::Arc;

    use crate::{
        app_state::AppState,
        auth::password::hash_password,
        config::Config,
        models::domain::{User, UserRole},
        repositories::Repositories,
        services::grading_oracle::{GradingOracle, MockGradingOracle},
    };

    pub const TEST_PASSWORD: &str = "password123";

    /// App state over fresh in-memory stores. The stores are returned too so
    /// tests can seed and inspect them directly.
    pub fn test_state(oracle: impl GradingOracle + 'static) -> (AppState, Repositories) {
        let repositories = Repositories::in_memory();
        let state = AppState::with_repositories(
            Config::test_config(),
            repositories.clone(),
            Arc::new(oracle),
        )
        .expect("test state should build");
        (state, repositories)
    }

    /// State whose oracle must never be consulted.
    pub fn test_state_without_oracle() -> (AppState, Repositories) {
        let mut oracle = MockGradingOracle::new();
        oracle.expect_grade().never();
        test_state(oracle)
    }

    /// Stores a user with `TEST_PASSWORD` and returns it with a valid access token.
    pub async fn seeded_user(
        state: &AppState,
        repositories: &Repositories,
        email: &str,
        role: UserRole,
    ) -> (User, String) {
        let hash = hash_password(TEST_PASSWORD).unwrap();
        let user = repositories
            .users
            .create(User::new("Test User", email, hash, role))
            .await
            .unwrap();
        let token = state
            .auth_service
            .jwt()
            .create_access_token(&user.id, role)
            .unwrap();
        (user, token)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }

    pub fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}
