use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAccountService {
    user_repo: Arc<dyn UserRepo>,
    refresh_token_repo: Arc<dyn RefreshTokenRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    platform: Platform,
}

impl RealAccountService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        refresh_token_repo: Arc<dyn RefreshTokenRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        platform: Platform,
    ) -> Self {
        Self {
            user_repo,
            refresh_token_repo,
            credential_hasher,
            platform,
        }
    }

    fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn signup(&self, request: SignupInput) -> Result<UserProfile, AuthError> {
        let SignupInput { email, password } = request;
        Self::validate_credentials(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let rec = self
            .user_repo
            .create_user(NewUser {
                email: email.trim().to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %rec.user_id, "user created");
        Ok(UserProfile::from(&rec))
    }

    async fn update_credentials(
        &self,
        user_id: UserId,
        request: UpdateCredentialsInput,
    ) -> Result<UserProfile, AuthError> {
        let UpdateCredentialsInput { email, password } = request;
        Self::validate_credentials(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let rec = self
            .user_repo
            .update_user(
                user_id,
                NewUser {
                    email: email.trim().to_string(),
                    password_hash,
                },
            )
            .await?;

        info!(user_id = %rec.user_id, "user credentials updated");
        Ok(UserProfile::from(&rec))
    }

    async fn reset(&self) -> Result<ResetSummary, AuthError> {
        if self.platform != Platform::Dev {
            warn!(platform = ?self.platform, "reset refused outside dev");
            return Err(AuthError::Forbidden);
        }

        let refresh_tokens = self.refresh_token_repo.delete_all().await?;
        let users = self.user_repo.delete_all().await?;

        warn!(users, refresh_tokens, "store reset");
        Ok(ResetSummary {
            users,
            refresh_tokens,
        })
    }
}
