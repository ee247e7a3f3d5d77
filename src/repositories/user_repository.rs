use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_document},
    options::{FindOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use tokio::sync::RwLock;

use crate::{
    db::{is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::{User, UserPatch},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    /// Applies only the fields set in `patch` and returns the updated user.
    async fn update(&self, id: &str, patch: UserPatch) -> AppResult<User>;
    /// Ordered by email. Returns the page and the total user count.
    async fn list_users(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("users");
        Self { collection }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = self.collection.find_one(doc! { "id": id }).await?;
        Ok(user)
    }

    async fn update(&self, id: &str, patch: UserPatch) -> AppResult<User> {
        if patch.is_empty() {
            return self.find_by_id(id).await?.ok_or(AppError::UserNotFound);
        }

        let set = to_document(&patch)?;
        self.collection
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn list_users(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let total = self.collection.count_documents(doc! {}).await? as i64;

        let find_options = FindOptions::builder()
            .sort(doc! { "email": 1 })
            .skip(Some(offset.max(0) as u64))
            .limit(Some(limit))
            .build();

        let cursor = self.collection.find(doc! {}).with_options(find_options).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok((users, total))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(email_index).await?;
        self.collection.create_index(id_index).await?;
        log::info!("Created unique indexes on users.email and users.id");

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: UserPatch) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(AppError::UserNotFound)?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn list_users(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let users = self.users.read().await;
        let mut items: Vec<User> = users.values().cloned().collect();
        items.sort_by(|a, b| a.email.cmp(&b.email));

        let total = items.len() as i64;
        let page = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
