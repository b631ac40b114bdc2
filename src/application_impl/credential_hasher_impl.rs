use crate::application_port::{AuthError, CredentialHasher};
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Argon2id with a fresh salt per hash. Hashing and verification run on the
/// blocking pool so a burst of logins cannot starve the async workers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    fn hash_blocking(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify_blocking(password: &str, password_hash: &str) -> bool {
        let parsed = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("stored password hash is not a valid PHC string: {}", e);
                return false;
            }
        };

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                warn!("password verification error: {}", e);
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash_blocking(&password))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        match tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &password_hash))
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                error!("password verification task failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("secret1").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify_password("secret1", &hash).await);
        assert!(!hasher.verify_password("wrong", &hash).await);
    }

    #[tokio::test]
    async fn equal_passwords_get_different_digests() {
        let hasher = Argon2PasswordHasher;
        let a = hasher.hash_password("secret1").await.unwrap();
        let b = hasher.hash_password("secret1").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_digest_is_a_plain_mismatch() {
        let hasher = Argon2PasswordHasher;
        assert!(!hasher.verify_password("secret1", "").await);
        assert!(!hasher.verify_password("secret1", "not-a-phc-string").await);
        assert!(!hasher.verify_password("secret1", "$argon2id$v=19$broken").await);
    }
}
