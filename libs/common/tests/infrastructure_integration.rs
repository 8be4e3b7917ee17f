//! Integration tests for the database infrastructure
//!
//! These tests need a reachable PostgreSQL instance (`DATABASE_URL`) and are
//! ignored by default. Run them with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

/// Verifies connectivity and that the migrated schema carries the lockout columns
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS columns
        FROM information_schema.columns
        WHERE table_name = 'users'
          AND column_name IN ('failed_login_attempts', 'blocked', 'disabled')
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let columns: i64 = row.get("columns");
    assert_eq!(columns, 3, "users table is missing lockout columns");

    Ok(())
}
