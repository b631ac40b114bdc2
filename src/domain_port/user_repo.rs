use super::StoreError;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn update_user(&self, user_id: UserId, user: NewUser)
    -> Result<UserRecord, StoreError>;

    /// Sets the premium flag. Already-premium users succeed unchanged.
    async fn upgrade_entitlement(&self, user_id: UserId) -> Result<(), StoreError>;

    async fn delete_all(&self) -> Result<u64, StoreError>;
}
