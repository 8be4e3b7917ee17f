//! In-memory user store for tests and local development

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{StoreError, StoreResult, UserStore};
use crate::models::{LockoutState, NewUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    users: BTreeMap<i32, User>,
}

/// User store kept in process memory
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn record_failed_login(&self, id: i32, threshold: i32) -> StoreResult<LockoutState> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("no user with id {id}")))?;

        user.failed_login_attempts += 1;
        if user.failed_login_attempts >= threshold {
            user.blocked = true;
        }
        user.updated_at = Utc::now();

        Ok(LockoutState {
            failed_login_attempts: user.failed_login_attempts,
            blocked: user.blocked,
        })
    }

    async fn reset_login_state(&self, id: i32) -> StoreResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner
            .users
            .get_mut(&id)
            .filter(|user| !user.disabled && !user.blocked)
        else {
            return Ok(None);
        };

        user.failed_login_attempts = 0;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn create(&self, new_user: &NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(StoreError::DuplicateUsername(new_user.username.clone()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            phone: new_user.phone.clone(),
            role: new_user.role,
            failed_login_attempts: 0,
            blocked: false,
            disabled: false,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, id: i32, changes: &UpdateUser) -> StoreResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            user.phone = Some(phone.clone()).filter(|phone| !phone.is_empty());
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(disabled) = changes.disabled {
            user.disabled = disabled;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn unlock(&self, id: i32) -> StoreResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        user.failed_login_attempts = 0;
        user.blocked = false;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            name: "Técnico".to_string(),
            email: format!("{username}@colegio.edu"),
            phone: None,
            role: Role::Collaborator,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_usernames() {
        let store = InMemoryUserStore::new();
        store.create(&new_user("tech1")).await.unwrap();

        let err = store.create(&new_user("tech1")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(name) if name == "tech1"));
    }

    #[tokio::test]
    async fn failed_logins_block_at_threshold() {
        let store = InMemoryUserStore::new();
        let user = store.create(&new_user("tech1")).await.unwrap();

        for expected in 1..5 {
            let state = store.record_failed_login(user.id, 5).await.unwrap();
            assert_eq!(state.failed_login_attempts, expected);
            assert!(!state.blocked);
        }

        let state = store.record_failed_login(user.id, 5).await.unwrap();
        assert_eq!(
            state,
            LockoutState {
                failed_login_attempts: 5,
                blocked: true
            }
        );
    }

    #[tokio::test]
    async fn concurrent_failures_are_not_lost() {
        let store = InMemoryUserStore::new();
        let id = store.create(&new_user("tech1")).await.unwrap().id;

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_failed_login(id, 5).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 10);
        assert!(stored.blocked);
    }

    #[tokio::test]
    async fn unlock_clears_lockout_state() {
        let store = InMemoryUserStore::new();
        let user = store.create(&new_user("tech1")).await.unwrap();
        for _ in 0..5 {
            store.record_failed_login(user.id, 5).await.unwrap();
        }

        let unlocked = store.unlock(user.id).await.unwrap().unwrap();
        assert_eq!(unlocked.failed_login_attempts, 0);
        assert!(!unlocked.blocked);
        assert!(store.unlock(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_skips_blocked_and_disabled_accounts() {
        let store = InMemoryUserStore::new();
        let id = store.create(&new_user("tech1")).await.unwrap().id;
        store.record_failed_login(id, 5).await.unwrap();

        let reset = store.reset_login_state(id).await.unwrap().unwrap();
        assert_eq!(reset.failed_login_attempts, 0);

        for _ in 0..5 {
            store.record_failed_login(id, 5).await.unwrap();
        }
        assert!(store.reset_login_state(id).await.unwrap().is_none());
        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert!(stored.blocked);
        assert_eq!(stored.failed_login_attempts, 5);

        store.unlock(id).await.unwrap();
        let changes = UpdateUser {
            disabled: Some(true),
            ..Default::default()
        };
        store.update(id, &changes).await.unwrap();
        assert!(store.reset_login_state(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_phone_update_clears_number() {
        let store = InMemoryUserStore::new();
        let mut user = new_user("tech1");
        user.phone = Some("555-0101".to_string());
        let id = store.create(&user).await.unwrap().id;

        let changes = UpdateUser {
            phone: Some(String::new()),
            ..Default::default()
        };
        let updated = store.update(id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.phone, None);
    }
}
