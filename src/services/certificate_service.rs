use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::AppResult,
    models::domain::MintStatus,
    repositories::{GradingRepository, MintStatusRepository},
    services::grading_aggregator::{is_eligible, project_percentage},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
    pub user_id: String,
    /// `None` until the user has at least one non-zero coursework grade.
    pub percentage: Option<f64>,
    pub eligible: bool,
    pub minting_allowed: bool,
}

pub struct CertificateService {
    gradings: Arc<dyn GradingRepository>,
    mint_status: Arc<dyn MintStatusRepository>,
}

impl CertificateService {
    pub fn new(
        gradings: Arc<dyn GradingRepository>,
        mint_status: Arc<dyn MintStatusRepository>,
    ) -> Self {
        Self {
            gradings,
            mint_status,
        }
    }

    pub async fn eligibility(&self, user_id: &str) -> AppResult<Eligibility> {
        let gradings = self.gradings.find_by_student(user_id).await?;
        let percentage = project_percentage(&gradings);
        let minting_allowed = self.mint_status.get().await?.allowed;

        Ok(Eligibility {
            user_id: user_id.to_string(),
            percentage,
            eligible: is_eligible(percentage),
            minting_allowed,
        })
    }

    pub async fn mint_status(&self) -> AppResult<MintStatus> {
        self.mint_status.get().await
    }

    pub async fn toggle_mint_status(&self) -> AppResult<MintStatus> {
        let status = self.mint_status.toggle().await?;
        log::info!("Certificate minting allowed set to {}", status.allowed);
        Ok(status)
    }
}
