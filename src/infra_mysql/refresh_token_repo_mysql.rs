use super::util::{is_dup_key, uid_as_bytes, uid_from_bytes};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;

const MAX_CREATE_ATTEMPTS: usize = 3;

/// Every write is one statement, so a cancelled request leaves either the full
/// row or nothing.
pub struct MySqlRefreshTokenRepo {
    pool: MySqlPool,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MySqlRefreshTokenRepo {
    pub fn new(pool: MySqlPool, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        MySqlRefreshTokenRepo { pool, ttl, clock }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, StoreError> {
        let token: String = row.try_get("token")?;
        let user_id_bytes: Vec<u8> = row.try_get("user_id")?;
        let user_id = uid_from_bytes(&user_id_bytes)?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        let revoked_at: Option<DateTime<Utc>> = row.try_get("revoked_at")?;

        Ok(RefreshTokenRecord {
            token,
            user_id,
            created_at,
            updated_at,
            expires_at,
            revoked_at,
        })
    }

    async fn insert(&self, rec: &RefreshTokenRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
VALUES (?, ?, ?, ?, ?, NULL)
"#,
        )
        .bind(&rec.token)
        .bind(uid_as_bytes(&rec.user_id))
        .bind(rec.created_at)
        .bind(rec.updated_at)
        .bind(rec.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MySqlRefreshTokenRepo {
    async fn create(&self, user_id: UserId) -> Result<RefreshTokenRecord, StoreError> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let rec = RefreshTokenRecord::issue(user_id, self.ttl, self.clock.now()).ok_or_else(
                || StoreError::Backend("refresh token expiry out of range".to_string()),
            )?;
            match self.insert(&rec).await {
                Ok(()) => return Ok(rec),
                Err(e) if is_dup_key(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::Backend(
            "could not generate a unique refresh token".to_string(),
        ))
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
FROM refresh_tokens
WHERE token = ?
"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        let now = self.clock.now();
        let result = sqlx::query(
            r#"
UPDATE refresh_tokens
SET revoked_at = ?, updated_at = ?
WHERE token = ? AND revoked_at IS NULL
"#,
        )
        .bind(now)
        .bind(now)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // nothing changed: either already revoked or never issued
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM refresh_tokens WHERE token = ?")
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        if count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
