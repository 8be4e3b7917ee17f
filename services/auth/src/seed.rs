//! Bootstrap administrator account

use anyhow::Result;
use tracing::info;

use crate::{
    models::{NewUser, Role},
    password::hash_password,
    repositories::UserStore,
};

/// Administrator to create on start when none exists under that username
#[derive(Clone)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

impl SeedAdmin {
    /// Read the seed account from the environment
    ///
    /// Returns `None` unless both `SEED_ADMIN_USERNAME` and
    /// `SEED_ADMIN_PASSWORD` are set and non-empty.
    ///
    /// # Environment Variables
    /// - `SEED_ADMIN_USERNAME`
    /// - `SEED_ADMIN_PASSWORD`
    /// - `SEED_ADMIN_NAME` (default: "Administrador")
    /// - `SEED_ADMIN_EMAIL` (default: "admin@helpdesk.local")
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Some(SeedAdmin {
            username: non_empty("SEED_ADMIN_USERNAME")?,
            password: non_empty("SEED_ADMIN_PASSWORD")?,
            name: non_empty("SEED_ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
            email: non_empty("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|| "admin@helpdesk.local".to_string()),
        })
    }
}

/// Create the seed administrator unless the username is already taken
///
/// Returns whether an account was created. An existing account is left
/// untouched, including its password and lockout state.
pub async fn ensure_admin(store: &dyn UserStore, seed: &SeedAdmin) -> Result<bool> {
    if store.find_by_username(&seed.username).await?.is_some() {
        info!(username = %seed.username, "Seed administrator already present");
        return Ok(false);
    }

    let user = store
        .create(&NewUser {
            username: seed.username.clone(),
            password_hash: hash_password(&seed.password)?,
            name: seed.name.clone(),
            email: seed.email.clone(),
            phone: None,
            role: Role::Administrator,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "Seed administrator created");
    Ok(true)
}
