use crate::application_port::{AccessToken, AuthError, TokenCodec, TokenError};
use crate::domain_model::UserId;
use crate::domain_port::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ISSUER: &str = "chirpy";
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl JwtConfig {
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        JwtConfig {
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: DEFAULT_ACCESS_TTL,
            signing_key: signing_key.into(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    iss: String,
    sub: String, // user id as string
    iat: i64,
    exp: i64,
}

/// HS256 access tokens. Verification order: algorithm and signature, then
/// issuer, then expiry against the injected clock, and only then the subject.
pub struct JwtHs256Codec {
    cfg: JwtConfig,
    clock: Arc<dyn Clock>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is judged against `clock`, with zero leeway
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.clone()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            cfg,
            clock,
            validation,
        }
    }

    pub fn encode_access(&self, uid: UserId) -> Result<(String, DateTime<Utc>), AuthError> {
        let iat_dt = self.clock.now();
        let exp_dt = chrono::Duration::from_std(self.cfg.access_ttl)
            .ok()
            .and_then(|ttl| iat_dt.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::SigningFailure("access token expiry out of range".into()))?;
        let claims = AccessClaims {
            iss: self.cfg.issuer.clone(),
            sub: uid.0.to_string(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningFailure(e.to_string()))?;
        Ok((token, exp_dt))
    }

    pub fn decode_access(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?;
        let claims = data.claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Malformed)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => TokenError::WrongAlgorithm,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = self.encode_access(user)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &str) -> Result<UserId, TokenError> {
        self.decode_access(token)
    }
}

/// Mint a token with the default issuer and TTL on the system clock.
pub fn mint(user_id: UserId, secret: &str) -> Result<String, AuthError> {
    let codec = JwtHs256Codec::new(JwtConfig::new(secret), Arc::new(SystemClock));
    codec.encode_access(user_id).map(|(token, _)| token)
}

pub fn verify(token: &str, secret: &str) -> Result<UserId, TokenError> {
    let codec = JwtHs256Codec::new(JwtConfig::new(secret), Arc::new(SystemClock));
    codec.decode_access(token)
}
