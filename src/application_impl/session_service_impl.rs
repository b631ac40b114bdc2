use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;
use tokio::sync::OnceCell;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

pub struct RealSessionService {
    user_repo: Arc<dyn UserRepo>,
    refresh_token_repo: Arc<dyn RefreshTokenRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    decoy_hash: OnceCell<String>,
}

impl RealSessionService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        refresh_token_repo: Arc<dyn RefreshTokenRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            refresh_token_repo,
            credential_hasher,
            token_codec,
            clock,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Spend one verification on a throwaway digest so an unknown email costs
    /// as much as a wrong password.
    async fn verify_against_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DECOY_PASSWORD))
            .await;
        match decoy {
            Ok(hash) => {
                let _ = self.credential_hasher.verify_password(password, hash).await;
            }
            Err(e) => warn!("could not prepare decoy hash: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let Some(rec) = self.user_repo.find_by_email(email.trim()).await? else {
            self.verify_against_decoy(&password).await;
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, access_exp) =
            self.token_codec.issue_access_token(rec.user_id).await?;
        let refresh = self.refresh_token_repo.create(rec.user_id).await?;

        info!(user_id = %rec.user_id, "user logged in");

        Ok(LoginResult {
            user: UserProfile::from(&rec),
            access_token,
            access_token_expires_at: access_exp,
            refresh_token: RefreshToken(refresh.token),
            refresh_token_expires_at: refresh.expires_at,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        let rec = match self.refresh_token_repo.lookup(refresh_token).await {
            Ok(rec) => rec,
            Err(StoreError::NotFound) => {
                return Err(AuthError::Unauthenticated(UnauthenticatedReason::NotFound));
            }
            Err(e) => return Err(e.into()),
        };

        match rec.state_at(self.clock.now()) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Expired => {
                return Err(AuthError::Unauthenticated(UnauthenticatedReason::Expired));
            }
            RefreshTokenState::Revoked => {
                return Err(AuthError::Unauthenticated(UnauthenticatedReason::Revoked));
            }
        }

        let (access_token, access_exp) =
            self.token_codec.issue_access_token(rec.user_id).await?;
        debug!(user_id = %rec.user_id, "access token refreshed");

        Ok(RefreshResult {
            access_token,
            access_token_expires_at: access_exp,
        })
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_token_repo.revoke(refresh_token).await?;
        debug!("refresh token revoked");
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError> {
        let user_id = self.token_codec.verify_access_token(access_token).await?;
        Ok(user_id)
    }

    async fn upgrade_entitlement(&self, user_id: UserId) -> Result<(), AuthError> {
        self.user_repo.upgrade_entitlement(user_id).await?;
        info!(user_id = %user_id, "entitlement upgraded");
        Ok(())
    }
}
