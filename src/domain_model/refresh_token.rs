use super::UserId;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Bytes of entropy behind every refresh token value.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// A persisted refresh token. The value is opaque to callers: 64 hex chars with
/// no embedded structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

impl RefreshTokenRecord {
    /// Builds a fresh, unrevoked record for `user_id` valid for `ttl` from `now`.
    /// `None` when the expiry falls outside the representable date range.
    pub fn issue(user_id: UserId, ttl: Duration, now: DateTime<Utc>) -> Option<Self> {
        let expires_at = now.checked_add_signed(ttl)?;
        Some(RefreshTokenRecord {
            token: generate_token_value(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        })
    }

    /// Revocation wins over expiry: a revoked token reports `Revoked` even
    /// after its natural lifetime ends.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now >= self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

pub fn generate_token_value() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_values_are_hex_and_distinct() {
        let a = generate_token_value();
        let b = generate_token_value();
        assert_eq!(a.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn state_follows_expiry_and_revocation() {
        let now = Utc::now();
        let mut rec =
            RefreshTokenRecord::issue(UserId::new_v4(), Duration::days(60), now).unwrap();
        assert_eq!(rec.state_at(now), RefreshTokenState::Active);
        assert_eq!(
            rec.state_at(now + Duration::days(60)),
            RefreshTokenState::Expired
        );

        rec.revoked_at = Some(now);
        assert_eq!(rec.state_at(now), RefreshTokenState::Revoked);
        assert_eq!(
            rec.state_at(now + Duration::days(61)),
            RefreshTokenState::Revoked
        );
    }

    #[test]
    fn expiry_past_the_calendar_is_refused() {
        let ttl = Duration::days(100_000_000);
        assert!(RefreshTokenRecord::issue(UserId::new_v4(), ttl, Utc::now()).is_none());
    }
}
