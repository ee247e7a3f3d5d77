use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::{
    auth::JwtService,
    config::{Config, StoreBackend},
    db::Database,
    errors::AppResult,
    repositories::Repositories,
    services::{
        AttemptPolicy, AuthService, CertificateService, GradingAggregator, GradingOracle,
        GradingService, OpenAiGradingOracle, QuizAttemptTracker, QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub quiz_service: Arc<QuizService>,
    pub grading_service: Arc<GradingService>,
    pub certificate_service: Arc<CertificateService>,
    database: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let (repositories, database) = match config.store_backend {
            StoreBackend::Mongo => {
                let db = Database::connect(&config).await?;
                let repositories = Repositories::mongo(&db);
                repositories.ensure_indexes().await?;
                (repositories, Some(db))
            }
            StoreBackend::Memory => {
                log::warn!("Using in-memory storage; data is lost on restart");
                (Repositories::in_memory(), None)
            }
        };

        let purged = repositories.refresh_tokens.delete_expired().await?;
        if purged > 0 {
            log::info!("Purged {} expired refresh token(s)", purged);
        }

        let oracle: Arc<dyn GradingOracle> = Arc::new(OpenAiGradingOracle::from_config(&config)?);
        let mut state = Self::with_repositories(config, repositories, oracle)?;
        state.database = database;

        if let (Some(email), Some(password)) = (
            state.config.bootstrap_admin_email.as_deref(),
            state.config.bootstrap_admin_password.as_ref(),
        ) {
            state
                .auth_service
                .ensure_admin(email, password.expose_secret())
                .await?;
        }

        Ok(state)
    }

    /// Wires the services over the given stores and oracle.
    pub fn with_repositories(
        config: Config,
        repositories: Repositories,
        oracle: Arc<dyn GradingOracle>,
    ) -> AppResult<Self> {
        let jwt = JwtService::from_config(&config)?;
        let auth_service = Arc::new(AuthService::new(
            repositories.users.clone(),
            repositories.refresh_tokens.clone(),
            jwt,
        ));

        let tracker = Arc::new(QuizAttemptTracker::new(
            repositories.attempts.clone(),
            repositories.quizzes.clone(),
            AttemptPolicy::from_config(&config),
        ));
        let aggregator = Arc::new(GradingAggregator::new(oracle));
        let quiz_service = Arc::new(QuizService::new(
            repositories.quizzes.clone(),
            tracker,
            aggregator,
        ));

        let grading_service = Arc::new(GradingService::new(
            repositories.submissions.clone(),
            repositories.gradings.clone(),
        ));
        let certificate_service = Arc::new(CertificateService::new(
            repositories.gradings.clone(),
            repositories.mint_status.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            auth_service,
            quiz_service,
            grading_service,
            certificate_service,
            database: None,
        })
    }

    /// Readiness: the database answers a ping (always ready in memory mode).
    pub async fn check_ready(&self) -> AppResult<()> {
        match &self.database {
            Some(db) => db.ping().await,
            None => Ok(()),
        }
    }
}
