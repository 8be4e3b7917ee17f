//! User persistence
//!
//! [`UserStore`] is the seam between the authentication logic and storage.
//! [`UserRepository`] is the PostgreSQL implementation used in production;
//! [`InMemoryUserStore`] backs tests and local development.

use async_trait::async_trait;
use common::error::DatabaseError;
use thiserror::Error;

use crate::models::{LockoutState, NewUser, UpdateUser, User};

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::UserRepository;

/// Errors raised by a [`UserStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The username is already taken
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// A stored row could not be mapped to a [`User`]
    #[error("corrupt user record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations needed by authentication and user administration
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by login name
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<User>>;

    /// Atomically increment the failed-attempt counter and set `blocked`
    /// once the new value reaches `threshold`. Returns the state after the write.
    async fn record_failed_login(&self, id: i32, threshold: i32) -> StoreResult<LockoutState>;

    /// Reset the counter to zero after a successful login
    ///
    /// Only applies while the account is neither disabled nor blocked; returns
    /// the updated user, or `None` when the account changed state since it was read.
    async fn reset_login_state(&self, id: i32) -> StoreResult<Option<User>>;

    async fn create(&self, new_user: &NewUser) -> StoreResult<User>;

    /// Apply the present fields of `changes`; `None` when the id is unknown.
    /// An empty `phone` clears the stored number.
    async fn update(&self, id: i32, changes: &UpdateUser) -> StoreResult<Option<User>>;

    /// Administrative unlock: clear `blocked` and reset the counter
    async fn unlock(&self, id: i32) -> StoreResult<Option<User>>;

    async fn health_check(&self) -> StoreResult<bool>;
}
