use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

const MAX_CREATE_ATTEMPTS: usize = 3;

/// Refresh tokens keyed by value. Every operation goes through a single
/// DashMap shard lock, which is what makes create/lookup/revoke atomic with
/// respect to each other.
pub struct MemoryRefreshTokenRepo {
    tokens: DashMap<String, RefreshTokenRecord>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryRefreshTokenRepo {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        MemoryRefreshTokenRepo {
            tokens: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MemoryRefreshTokenRepo {
    async fn create(&self, user_id: UserId) -> Result<RefreshTokenRecord, StoreError> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let rec = RefreshTokenRecord::issue(user_id, self.ttl, self.clock.now()).ok_or_else(
                || StoreError::Backend("refresh token expiry out of range".to_string()),
            )?;
            match self.tokens.entry(rec.token.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(rec.clone());
                    return Ok(rec);
                }
            }
        }
        Err(StoreError::Backend(
            "could not generate a unique refresh token".to_string(),
        ))
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, StoreError> {
        self.tokens
            .get(token)
            .map(|rec| rec.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        let mut rec = self.tokens.get_mut(token).ok_or(StoreError::NotFound)?;
        if rec.revoked_at.is_none() {
            let now = self.clock.now();
            rec.revoked_at = Some(now);
            rec.updated_at = now;
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        self.tokens.retain(|_, _| {
            removed += 1;
            false
        });
        Ok(removed)
    }
}
