use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserProfile};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UpdateCredentialsInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub users: u64,
    pub refresh_tokens: u64,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserProfile, AuthError>;
    async fn update_credentials(
        &self,
        user_id: UserId,
        request: UpdateCredentialsInput,
    ) -> Result<UserProfile, AuthError>;
    /// Wipes every user and refresh token. Only allowed on dev deployments.
    async fn reset(&self) -> Result<ResetSummary, AuthError>;
}
