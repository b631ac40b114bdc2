#![allow(dead_code)]

use chirpy_auth::application_port::*;
use chirpy_auth::domain_port::{Clock, ManualClock};
use chirpy_auth::infra_memory::{MemoryRefreshTokenRepo, MemoryUserRepo};
use chirpy_auth::server::{Components, Server};
use chirpy_auth::settings::{Settings, parse_settings_with_env};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";
pub const WEBHOOK_KEY: &str = "test-webhook-key";

/// Stores passwords as `plain:<password>` and counts verifications, so tests
/// can check that both login failure paths do the same work without paying
/// for Argon2.
#[derive(Default)]
pub struct PlainHasher {
    pub verifications: AtomicUsize,
}

impl PlainHasher {
    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        password_hash.strip_prefix("plain:") == Some(password)
    }
}

pub struct TestContext {
    pub server: Arc<Server>,
    pub clock: Arc<ManualClock>,
    pub hasher: Arc<PlainHasher>,
    pub refresh_tokens: Arc<MemoryRefreshTokenRepo>,
}

pub fn settings(platform: &str) -> Settings {
    settings_with(platform, &[])
}

/// Test settings with extra `CHIRPY__...` variables layered on top.
pub fn settings_with(platform: &str, extra: &[(&str, &str)]) -> Settings {
    let mut env = HashMap::from([
        ("CHIRPY__PLATFORM".to_string(), platform.to_string()),
        (
            "CHIRPY__AUTH__JWT_SECRET".to_string(),
            "test-jwt-secret".to_string(),
        ),
        (
            "CHIRPY__AUTH__WEBHOOK_API_KEY".to_string(),
            WEBHOOK_KEY.to_string(),
        ),
    ]);
    for (key, value) in extra {
        env.insert(key.to_string(), value.to_string());
    }
    parse_settings_with_env(Some("settings/dev.toml"), Some(env)).expect("dev settings load")
}

pub fn context(platform: &str) -> TestContext {
    let settings = settings(platform);
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    ));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let hasher = Arc::new(PlainHasher::default());
    let refresh_tokens = Arc::new(MemoryRefreshTokenRepo::new(
        settings.auth.refresh_ttl().expect("valid refresh ttl"),
        dyn_clock.clone(),
    ));

    let components = Components {
        user_repo: Arc::new(MemoryUserRepo::new(dyn_clock.clone())),
        refresh_token_repo: refresh_tokens.clone(),
        credential_hasher: hasher.clone(),
        clock: dyn_clock,
    };
    let server = Server::assemble(&settings, components).expect("server assembles");

    TestContext {
        server: Arc::new(server),
        clock,
        hasher,
        refresh_tokens,
    }
}

impl TestContext {
    pub async fn signup(&self, email: &str, password: &str) -> chirpy_auth::domain_model::UserProfile {
        self.server
            .account_service
            .signup(SignupInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("signup succeeds")
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        self.server
            .session_service
            .login(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }
}
