use super::util::{is_dup_key, uid_as_bytes, uid_from_bytes};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;

pub struct MySqlUserRepo {
    pool: MySqlPool,
    clock: Arc<dyn Clock>,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool, clock: Arc<dyn Clock>) -> Self {
        MySqlUserRepo { pool, clock }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, StoreError> {
        let user_id_bytes: Vec<u8> = row.try_get("user_id")?;
        let user_id = uid_from_bytes(&user_id_bytes)?;

        let email: String = row.try_get("email")?;
        let password_hash: String = row.try_get("password_hash")?;
        let is_premium: bool = row.try_get("is_premium")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(UserRecord {
            user_id,
            email,
            password_hash,
            is_premium,
            created_at,
            updated_at,
        })
    }

    async fn exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE user_id = ?")
            .bind(uid_as_bytes(&user_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, is_premium, created_at, updated_at
FROM users
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let now = self.clock.now();
        let rec = UserRecord {
            user_id: UserId::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            is_premium: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
INSERT INTO users (user_id, email, password_hash, is_premium, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(uid_as_bytes(&rec.user_id))
        .bind(&rec.email)
        .bind(&rec.password_hash)
        .bind(rec.is_premium)
        .bind(rec.created_at)
        .bind(rec.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                StoreError::Conflict
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(rec)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        user: NewUser,
    ) -> Result<UserRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
UPDATE users
SET email = ?, password_hash = ?, updated_at = ?
WHERE user_id = ?
"#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(self.clock.now())
        .bind(uid_as_bytes(&user_id))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                StoreError::Conflict
            } else {
                StoreError::from(e)
            }
        })?;

        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, is_premium, created_at, updated_at
FROM users
WHERE user_id = ?
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .fetch_optional(&mut *tx)
        .await?;

        let rec = row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(StoreError::NotFound)?;

        tx.commit().await?;
        Ok(rec)
    }

    async fn upgrade_entitlement(&self, user_id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
UPDATE users
SET is_premium = TRUE, updated_at = ?
WHERE user_id = ? AND is_premium = FALSE
"#,
        )
        .bind(self.clock.now())
        .bind(uid_as_bytes(&user_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 && !self.exists(user_id).await? {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
