use crate::domain_model::{UserId, UserProfile};
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token uses an unexpected signing algorithm")]
    WrongAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnauthenticatedReason {
    #[error("not found")]
    NotFound,
    #[error("expired")]
    Expired,
    #[error("revoked")]
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("authorization header malformed")]
    MalformedHeader,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("access token rejected: {0}")]
    InvalidToken(TokenError),
    #[error("refresh token rejected: {0}")]
    Unauthenticated(UnauthenticatedReason),
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("user already exists")]
    UserExists,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("signing failure: {0}")]
    SigningFailure(String),
    #[error("hashing failure: {0}")]
    HashingFailure(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::InvalidToken(err)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Conflict => AuthError::UserExists,
            StoreError::Backend(e) => AuthError::Store(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserProfile,
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &str) -> Result<UserId, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// `false` for a wrong password and for an unparseable digest alike.
    async fn verify_password(&self, password: &str, password_hash: &str) -> bool;
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError>;
    async fn upgrade_entitlement(&self, user_id: UserId) -> Result<(), AuthError>;
}
