use agent_market::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const TEST_ADMIN_PWD: &str = "test-admin";

/// Connect to the test database, or return `None` (callers skip) when
/// no TEST_DATABASE_URL is configured.
pub async fn setup_test_db() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        println!("Skipping database-backed test - set TEST_DATABASE_URL to enable");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: database_url.to_string(),
        admin_pwd: Some(TEST_ADMIN_PWD.to_string()),
    }
}
