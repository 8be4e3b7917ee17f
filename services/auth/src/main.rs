use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use helpdesk_auth::{
    AppState,
    jwt::{JwtConfig, JwtService},
    repositories::UserRepository,
    routes,
    seed::{SeedAdmin, ensure_admin},
    settings::Settings,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting helpdesk authentication service");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    // The signing secret is read once here and handed to the token service.
    let jwt_service = JwtService::new(JwtConfig::from_env()?);

    let user_repository = Arc::new(UserRepository::new(pool));
    if let Some(seed) = SeedAdmin::from_env() {
        ensure_admin(user_repository.as_ref(), &seed).await?;
    }

    let bind_address = settings.bind_address.clone();
    let app_state = AppState::new(user_repository, jwt_service, settings)?;

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Authentication service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
