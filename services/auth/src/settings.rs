//! Service settings
//!
//! Loaded from built-in defaults overridden by `HELPDESK__*` environment
//! variables, e.g. `HELPDESK__BIND_ADDRESS=127.0.0.1:8080` or
//! `HELPDESK__PUBLIC_PREFIXES=/api,/static`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Login entry point; unauthenticated requests are redirected here
pub const LOGIN_PATH: &str = "/";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Mark the session cookie `Secure` (production deployments)
    pub secure_cookies: bool,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Directory holding the built frontend, if this service hosts it
    pub frontend_dir: Option<String>,
    /// Path prefixes that bypass the route gate
    pub public_prefixes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            secure_cookies: false,
            cookie_name: "token".to_string(),
            frontend_dir: None,
            public_prefixes: default_public_prefixes(),
        }
    }
}

fn default_public_prefixes() -> Vec<String> {
    ["/api", "/static", "/assets", "/favicon.ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Settings {
    /// Load settings from defaults and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("secure_cookies", defaults.secure_cookies)?
            .set_default("cookie_name", defaults.cookie_name)?
            .set_default("public_prefixes", defaults.public_prefixes)?
            .add_source(
                Environment::with_prefix("HELPDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("public_prefixes"),
            )
            .build()?
            .try_deserialize()
    }
}
