use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, UserRecord>,
    id_by_email: HashMap<String, UserId>,
}

/// Both indexes sit behind one lock so an email can never point at a missing
/// or different user.
pub struct MemoryUserRepo {
    table: Mutex<UserTable>,
    clock: Arc<dyn Clock>,
}

impl MemoryUserRepo {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryUserRepo {
            table: Mutex::new(UserTable::default()),
            clock,
        }
    }

    fn table(&self) -> Result<MutexGuard<'_, UserTable>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Backend("user table lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let table = self.table()?;
        Ok(table
            .id_by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut table = self.table()?;
        if table.id_by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict);
        }

        let now = self.clock.now();
        let rec = UserRecord {
            user_id: UserId::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            is_premium: false,
            created_at: now,
            updated_at: now,
        };
        table.id_by_email.insert(rec.email.clone(), rec.user_id);
        table.by_id.insert(rec.user_id, rec.clone());
        Ok(rec)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        user: NewUser,
    ) -> Result<UserRecord, StoreError> {
        let mut table = self.table()?;
        if let Some(owner) = table.id_by_email.get(&user.email) {
            if *owner != user_id {
                return Err(StoreError::Conflict);
            }
        }

        let now = self.clock.now();
        let rec = table.by_id.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let old_email = std::mem::replace(&mut rec.email, user.email);
        rec.password_hash = user.password_hash;
        rec.updated_at = now;
        let rec = rec.clone();

        table.id_by_email.remove(&old_email);
        table.id_by_email.insert(rec.email.clone(), user_id);
        Ok(rec)
    }

    async fn upgrade_entitlement(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut table = self.table()?;
        let now = self.clock.now();
        let rec = table.by_id.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        if !rec.is_premium {
            rec.is_premium = true;
            rec.updated_at = now;
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut table = self.table()?;
        let removed = table.by_id.len() as u64;
        table.by_id.clear();
        table.id_by_email.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn repo() -> MemoryUserRepo {
        MemoryUserRepo::new(Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let repo = repo();
        let rec = repo.create_user(new_user("a@b.com")).await.unwrap();
        let found = repo.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(found.user_id, rec.user_id);
        assert!(!found.is_premium);
        assert!(repo.find_by_email("x@y.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = repo();
        repo.create_user(new_user("a@b.com")).await.unwrap();
        assert!(matches!(
            repo.create_user(new_user("a@b.com")).await,
            Err(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_moves_the_email_index() {
        let repo = repo();
        let rec = repo.create_user(new_user("a@b.com")).await.unwrap();
        let updated = repo
            .update_user(rec.user_id, new_user("c@d.com"))
            .await
            .unwrap();
        assert_eq!(updated.email, "c@d.com");
        assert!(repo.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(repo.find_by_email("c@d.com").await.unwrap().is_some());

        let other = repo.create_user(new_user("e@f.com")).await.unwrap();
        assert!(matches!(
            repo.update_user(other.user_id, new_user("c@d.com")).await,
            Err(StoreError::Conflict)
        ));
        assert!(matches!(
            repo.update_user(UserId::new_v4(), new_user("z@z.com")).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn upgrade_is_idempotent() {
        let repo = repo();
        let rec = repo.create_user(new_user("a@b.com")).await.unwrap();
        repo.upgrade_entitlement(rec.user_id).await.unwrap();
        repo.upgrade_entitlement(rec.user_id).await.unwrap();
        let found = repo.find_by_email("a@b.com").await.unwrap().unwrap();
        assert!(found.is_premium);

        assert!(matches!(
            repo.upgrade_entitlement(UserId::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }
}
