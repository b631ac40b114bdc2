use super::StoreError;
use crate::domain_model::*;

/// Persistent home of refresh tokens and the only writer of their
/// `revoked_at` and `expires_at` fields.
///
/// Each call is atomic on its own: a `revoke` racing a `lookup` of the same
/// token yields either the old or the new record, never a mix.
#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    /// Generate a new opaque value for `user_id`, expiring one TTL from now.
    async fn create(&self, user_id: UserId) -> Result<RefreshTokenRecord, StoreError>;

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, StoreError>;

    /// Stamp `revoked_at` if it is still null. Revoking twice is a no-op.
    async fn revoke(&self, token: &str) -> Result<(), StoreError>;

    /// Administrative wipe; returns the number of rows removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
