//! Authentication and session gate for the helpdesk application
//!
//! Validates staff credentials with failed-login lockout, issues stateless
//! signed session tokens carried in an HTTP-only cookie, and gates every
//! non-public path behind a valid session.

pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod session;
pub mod settings;
pub mod validation;

use std::sync::Arc;

use crate::{
    credentials::{CredentialValidator, LockoutPolicy},
    jwt::JwtService,
    repositories::UserStore,
    settings::Settings,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<dyn UserStore>,
    pub validator: CredentialValidator,
    pub jwt_service: JwtService,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the validator to `user_store` with the default lockout policy
    pub fn new(
        user_store: Arc<dyn UserStore>,
        jwt_service: JwtService,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        let validator = CredentialValidator::new(user_store.clone(), LockoutPolicy::default())?;

        Ok(Self {
            user_store,
            validator,
            jwt_service,
            settings: Arc::new(settings),
        })
    }
}
