use async_trait::async_trait;
use chrono::Utc;
use mongodb::{bson::doc, options::ReturnDocument, Collection};
use tokio::sync::RwLock;

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::MintStatus,
};

const MINT_STATUS_ID: &str = "global";

#[async_trait]
pub trait MintStatusRepository: Send + Sync {
    async fn get(&self) -> AppResult<MintStatus>;
    /// Flips `allowed` atomically; the first toggle creates the record as allowed.
    async fn toggle(&self) -> AppResult<MintStatus>;
}

pub struct MongoMintStatusRepository {
    collection: Collection<MintStatus>,
}

impl MongoMintStatusRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("mint_status");
        Self { collection }
    }
}

#[async_trait]
impl MintStatusRepository for MongoMintStatusRepository {
    async fn get(&self) -> AppResult<MintStatus> {
        let status = self
            .collection
            .find_one(doc! { "_id": MINT_STATUS_ID })
            .await?;
        Ok(status.unwrap_or_default())
    }

    async fn toggle(&self) -> AppResult<MintStatus> {
        let pipeline = vec![doc! {
            "$set": {
                "allowed": { "$not": [{ "$ifNull": ["$allowed", false] }] },
                "updated_at": Utc::now().to_rfc3339(),
            }
        }];

        self.collection
            .find_one_and_update(doc! { "_id": MINT_STATUS_ID }, pipeline)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::InternalError("Mint status upsert returned nothing".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryMintStatusRepository {
    status: RwLock<Option<MintStatus>>,
}

impl InMemoryMintStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MintStatusRepository for InMemoryMintStatusRepository {
    async fn get(&self) -> AppResult<MintStatus> {
        Ok(self.status.read().await.clone().unwrap_or_default())
    }

    async fn toggle(&self) -> AppResult<MintStatus> {
        let mut status = self.status.write().await;
        let toggled = status.clone().unwrap_or_default().toggled();
        *status = Some(toggled.clone());
        Ok(toggled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mint_status_defaults_to_not_allowed_and_toggles() {
        let repo = InMemoryMintStatusRepository::new();
        assert!(!repo.get().await.unwrap().allowed);

        let first = repo.toggle().await.unwrap();
        assert!(first.allowed);
        assert!(first.updated_at.is_some());

        assert!(!repo.toggle().await.unwrap().allowed);
        assert!(!repo.get().await.unwrap().allowed);
    }
}
