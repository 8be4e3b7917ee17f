//! Credential validation with failed-login lockout
//!
//! Checks a username/password pair against the stored Argon2 hash and keeps
//! the per-account lockout state up to date. Disabled and blocked accounts are
//! rejected before the password is compared. A failed comparison increments
//! the counter in a single store operation, which also blocks the account once
//! the policy threshold is reached. Blocked accounts stay blocked until an
//! administrator unlocks them.

use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::UserIdentity,
    password::{hash_password, verify_password},
    repositories::{StoreError, UserStore},
};

/// Consecutive failures after which an account is blocked
pub const DEFAULT_LOCKOUT_THRESHOLD: i32 = 5;

/// Reasons a login attempt is rejected
///
/// The display strings are the messages returned to the client.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credenciales incompletas")]
    IncompleteCredentials,

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Cuenta deshabilitada")]
    AccountDisabled,

    #[error("Cuenta bloqueada temporalmente")]
    AccountBlocked,

    #[error("user store failure: {0}")]
    Store(#[from] StoreError),
}

/// Lockout policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Number of failed attempts that blocks the account
    pub max_failed_attempts: i32,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_LOCKOUT_THRESHOLD,
        }
    }
}

/// Credential validator
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn UserStore>,
    policy: LockoutPolicy,
    /// Hash compared against when the username does not exist
    dummy_hash: Arc<str>,
}

impl CredentialValidator {
    /// Create a validator; hashes the placeholder credential once up front
    pub fn new(store: Arc<dyn UserStore>, policy: LockoutPolicy) -> Result<Self> {
        let dummy_hash = hash_password("helpdesk-placeholder-credential")?;

        Ok(Self {
            store,
            policy,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Validate a login attempt and return the identity on success
    pub async fn validate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserIdentity, CredentialError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CredentialError::IncompleteCredentials);
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            // Same Argon2 cost as a real comparison; the result is irrelevant.
            let _ = verify_password(&self.dummy_hash, password);
            warn!(username, "Login attempt for unknown user");
            return Err(CredentialError::InvalidCredentials);
        };

        if user.disabled {
            warn!(user_id = user.id, username, "Login attempt on disabled account");
            return Err(CredentialError::AccountDisabled);
        }

        if user.blocked {
            warn!(user_id = user.id, username, "Login attempt on blocked account");
            return Err(CredentialError::AccountBlocked);
        }

        if !verify_password(&user.password_hash, password) {
            let state = self
                .store
                .record_failed_login(user.id, self.policy.max_failed_attempts)
                .await?;

            warn!(
                user_id = user.id,
                username,
                failed_login_attempts = state.failed_login_attempts,
                blocked = state.blocked,
                "Invalid password"
            );

            return Err(if state.blocked {
                CredentialError::AccountBlocked
            } else {
                CredentialError::InvalidCredentials
            });
        }

        // The account may have been disabled or blocked since it was read.
        let Some(user) = self.store.reset_login_state(user.id).await? else {
            return Err(self.rejection_after_reset(user.id).await?);
        };
        info!(user_id = user.id, username, "User authenticated");

        Ok(user.identity())
    }

    async fn rejection_after_reset(&self, id: i32) -> Result<CredentialError, CredentialError> {
        let current = self.store.find_by_id(id).await?;
        warn!(user_id = id, "Account changed state during login");

        Ok(match current {
            Some(user) if user.disabled => CredentialError::AccountDisabled,
            Some(user) if user.blocked => CredentialError::AccountBlocked,
            _ => CredentialError::InvalidCredentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LockoutState, NewUser, Role, UpdateUser, User};
    use crate::repositories::{InMemoryUserStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PASSWORD: &str = "Cl4ve!Segura";

    /// Counts lookups so tests can assert none happened
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryUserStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_username(username).await
        }

        async fn find_by_id(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn record_failed_login(&self, id: i32, threshold: i32) -> StoreResult<LockoutState> {
            self.inner.record_failed_login(id, threshold).await
        }

        async fn reset_login_state(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.reset_login_state(id).await
        }

        async fn create(&self, new_user: &NewUser) -> StoreResult<User> {
            self.inner.create(new_user).await
        }

        async fn update(&self, id: i32, changes: &UpdateUser) -> StoreResult<Option<User>> {
            self.inner.update(id, changes).await
        }

        async fn unlock(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.unlock(id).await
        }

        async fn health_check(&self) -> StoreResult<bool> {
            Ok(true)
        }
    }

    /// State change applied right after the lookup, as a concurrent request would
    #[derive(Clone, Copy)]
    enum Interleaved {
        Disable,
        Block,
    }

    struct InterleavingStore {
        inner: InMemoryUserStore,
        change: Interleaved,
    }

    #[async_trait]
    impl UserStore for InterleavingStore {
        async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
            let found = self.inner.find_by_username(username).await?;
            if let Some(user) = &found {
                match self.change {
                    Interleaved::Disable => {
                        let changes = UpdateUser {
                            disabled: Some(true),
                            ..Default::default()
                        };
                        self.inner.update(user.id, &changes).await?;
                    }
                    Interleaved::Block => {
                        for _ in 0..DEFAULT_LOCKOUT_THRESHOLD {
                            self.inner
                                .record_failed_login(user.id, DEFAULT_LOCKOUT_THRESHOLD)
                                .await?;
                        }
                    }
                }
            }
            Ok(found)
        }

        async fn find_by_id(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn record_failed_login(&self, id: i32, threshold: i32) -> StoreResult<LockoutState> {
            self.inner.record_failed_login(id, threshold).await
        }

        async fn reset_login_state(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.reset_login_state(id).await
        }

        async fn create(&self, new_user: &NewUser) -> StoreResult<User> {
            self.inner.create(new_user).await
        }

        async fn update(&self, id: i32, changes: &UpdateUser) -> StoreResult<Option<User>> {
            self.inner.update(id, changes).await
        }

        async fn unlock(&self, id: i32) -> StoreResult<Option<User>> {
            self.inner.unlock(id).await
        }

        async fn health_check(&self) -> StoreResult<bool> {
            Ok(true)
        }
    }

    async fn interleaved_setup(change: Interleaved) -> (CredentialValidator, InMemoryUserStore, User) {
        let inner = InMemoryUserStore::new();
        let user = inner
            .create(&NewUser {
                username: "tech1".to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                name: "Técnico Uno".to_string(),
                email: "tech1@colegio.edu".to_string(),
                phone: None,
                role: Role::Collaborator,
            })
            .await
            .unwrap();
        let store = Arc::new(InterleavingStore {
            inner: inner.clone(),
            change,
        });
        let validator = CredentialValidator::new(store, LockoutPolicy::default()).unwrap();
        (validator, inner, user)
    }

    async fn setup() -> (CredentialValidator, Arc<CountingStore>, User) {
        let store = Arc::new(CountingStore::default());
        let user = store
            .create(&NewUser {
                username: "tech1".to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                name: "Técnico Uno".to_string(),
                email: "tech1@colegio.edu".to_string(),
                phone: Some("555-0101".to_string()),
                role: Role::Collaborator,
            })
            .await
            .unwrap();
        let validator = CredentialValidator::new(store.clone(), LockoutPolicy::default()).unwrap();
        (validator, store, user)
    }

    #[tokio::test]
    async fn valid_credentials_return_identity() {
        let (validator, _, user) = setup().await;

        let identity = validator.validate("tech1", PASSWORD).await.unwrap();
        assert_eq!(identity, user.identity());
        assert_eq!(identity.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn empty_fields_fail_without_lookup() {
        let (validator, store, _) = setup().await;

        for (username, password) in [("tech1", ""), ("", PASSWORD), ("   ", PASSWORD)] {
            let err = validator.validate(username, password).await.unwrap_err();
            assert!(matches!(err, CredentialError::IncompleteCredentials));
        }
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_invalid_credentials() {
        let (validator, _, _) = setup().await;

        let err = validator.validate("nobody", PASSWORD).await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_account_fails_regardless_of_password() {
        let (validator, store, user) = setup().await;
        let changes = UpdateUser {
            disabled: Some(true),
            ..Default::default()
        };
        store.update(user.id, &changes).await.unwrap();

        for password in [PASSWORD, "wrong"] {
            let err = validator.validate("tech1", password).await.unwrap_err();
            assert!(matches!(err, CredentialError::AccountDisabled));
        }

        // Disabled accounts never reach the password check, so nothing is counted.
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn blocked_account_fails_regardless_of_password() {
        let (validator, store, user) = setup().await;
        for _ in 0..DEFAULT_LOCKOUT_THRESHOLD {
            store.record_failed_login(user.id, DEFAULT_LOCKOUT_THRESHOLD).await.unwrap();
        }

        for password in [PASSWORD, "wrong"] {
            let err = validator.validate("tech1", password).await.unwrap_err();
            assert!(matches!(err, CredentialError::AccountBlocked));
        }

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, DEFAULT_LOCKOUT_THRESHOLD);
    }

    #[tokio::test]
    async fn failure_at_threshold_minus_one_blocks() {
        let (validator, store, user) = setup().await;
        for _ in 0..DEFAULT_LOCKOUT_THRESHOLD - 1 {
            let err = validator.validate("tech1", "wrong").await.unwrap_err();
            assert!(matches!(err, CredentialError::InvalidCredentials));
        }

        let err = validator.validate("tech1", "wrong").await.unwrap_err();
        assert!(matches!(err, CredentialError::AccountBlocked));

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 5);
        assert!(stored.blocked);
    }

    #[tokio::test]
    async fn success_resets_lockout_state() {
        let (validator, store, user) = setup().await;
        for _ in 0..3 {
            let _ = validator.validate("tech1", "wrong").await;
        }

        validator.validate("tech1", PASSWORD).await.unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 0);
        assert!(!stored.blocked);
    }

    #[tokio::test]
    async fn custom_threshold_is_honoured() {
        let (_, store, user) = setup().await;
        let validator = CredentialValidator::new(
            store.clone(),
            LockoutPolicy {
                max_failed_attempts: 2,
            },
        )
        .unwrap();

        assert!(matches!(
            validator.validate("tech1", "wrong").await.unwrap_err(),
            CredentialError::InvalidCredentials
        ));
        assert!(matches!(
            validator.validate("tech1", "wrong").await.unwrap_err(),
            CredentialError::AccountBlocked
        ));
        assert!(store.find_by_id(user.id).await.unwrap().unwrap().blocked);
    }

    #[tokio::test]
    async fn disable_during_login_is_honoured() {
        let (validator, _, _) = interleaved_setup(Interleaved::Disable).await;

        let err = validator.validate("tech1", PASSWORD).await.unwrap_err();
        assert!(matches!(err, CredentialError::AccountDisabled));
    }

    #[tokio::test]
    async fn block_during_login_is_kept() {
        let (validator, store, user) = interleaved_setup(Interleaved::Block).await;

        let err = validator.validate("tech1", PASSWORD).await.unwrap_err();
        assert!(matches!(err, CredentialError::AccountBlocked));

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.blocked);
        assert_eq!(stored.failed_login_attempts, DEFAULT_LOCKOUT_THRESHOLD);
    }
}
