use crate::application_impl::*;
use crate::application_port::*;
use crate::credential::ApiKeyVerifier;
use crate::domain_model::Platform;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Storage and capabilities the services are built on.
pub struct Components {
    pub user_repo: Arc<dyn UserRepo>,
    pub refresh_token_repo: Arc<dyn RefreshTokenRepo>,
    pub credential_hasher: Arc<dyn CredentialHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct Server {
    pub session_service: Arc<dyn SessionService>,
    pub account_service: Arc<dyn AccountService>,
    pub api_key_verifier: Arc<ApiKeyVerifier>,
    pub platform: Platform,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let refresh_ttl = settings.auth.refresh_ttl()?;

        let (components, pool) = match settings.store.backend.as_str() {
            "memory" => {
                warn!("using in-memory store; nothing survives a restart");
                let components = Components {
                    user_repo: Arc::new(MemoryUserRepo::new(clock.clone())),
                    refresh_token_repo: Arc::new(MemoryRefreshTokenRepo::new(
                        refresh_ttl,
                        clock.clone(),
                    )),
                    credential_hasher,
                    clock,
                };
                (components, None)
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.dsn is required for the mysql backend"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.store.max_connections)
                    .acquire_timeout(Duration::from_secs(settings.store.acquire_timeout_secs))
                    .connect(dsn)
                    .await?;
                let components = Components {
                    user_repo: Arc::new(MySqlUserRepo::new(pool.clone(), clock.clone())),
                    refresh_token_repo: Arc::new(MySqlRefreshTokenRepo::new(
                        pool.clone(),
                        refresh_ttl,
                        clock.clone(),
                    )),
                    credential_hasher,
                    clock,
                };
                (components, Some(pool))
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let mut server = Self::assemble(settings, components)?;
        server.pool = pool;

        info!(backend = %settings.store.backend, platform = ?settings.platform, "server started");
        Ok(server)
    }

    /// Wire services over caller-provided components. `try_new` uses this
    /// after picking a backend; tests use it directly with in-memory stores.
    pub fn assemble(settings: &Settings, components: Components) -> anyhow::Result<Self> {
        if settings.auth.jwt_secret.is_empty() {
            return Err(anyhow!("auth.jwt_secret must be set"));
        }
        let access_ttl = settings.auth.access_ttl()?;
        settings.auth.refresh_ttl()?;
        if settings.auth.webhook_api_key.is_empty() {
            warn!("auth.webhook_api_key is empty; webhook calls will be rejected");
        }

        let Components {
            user_repo,
            refresh_token_repo,
            credential_hasher,
            clock,
        } = components;

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: settings.auth.issuer.clone(),
                access_ttl,
                signing_key: settings.auth.jwt_secret.clone().into_bytes(),
            },
            clock.clone(),
        ));

        let session_service: Arc<dyn SessionService> = Arc::new(RealSessionService::new(
            user_repo.clone(),
            refresh_token_repo.clone(),
            credential_hasher.clone(),
            token_codec,
            clock,
        ));
        let account_service: Arc<dyn AccountService> = Arc::new(RealAccountService::new(
            user_repo,
            refresh_token_repo,
            credential_hasher,
            settings.platform,
        ));

        Ok(Self {
            session_service,
            account_service,
            api_key_verifier: Arc::new(ApiKeyVerifier::new(&settings.auth.webhook_api_key)),
            platform: settings.platform,
            pool: None,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
