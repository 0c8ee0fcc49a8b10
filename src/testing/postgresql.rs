//! PostgreSQL test database setup and cleanup

use anyhow::{Context, Result};
use tokio_postgres::Client;

/// Environment variable naming the database PostgreSQL tests run against.
///
/// Tests that need a database return early when it is unset.
pub const TEST_DATABASE_ENV: &str = "KITCHEN_SYNC_TEST_DB";

/// Tables created by [`create_seed_tables`], in drop order.
pub const SEED_TABLES: &[&str] = &["posts", "users"];

#[derive(Clone)]
pub struct PostgresConfig {
    connection_string: String,
}

impl PostgresConfig {
    pub fn get_connection_string(&self) -> String {
        self.connection_string.clone()
    }
}

/// The test database configuration, if one was provided.
pub fn create_postgres_config() -> Option<PostgresConfig> {
    std::env::var(TEST_DATABASE_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(|connection_string| PostgresConfig { connection_string })
}

/// Drop the seed tables and the ledger, then create `users` and `posts`
/// with serial ids.
pub async fn create_seed_tables(client: &Client) -> Result<()> {
    drop_seed_tables(client).await?;

    client
        .batch_execute(
            "CREATE TABLE users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'member',
                bio TEXT,
                active BOOLEAN,
                score INTEGER,
                joined DATE
            );
            CREATE TABLE posts (
                id SERIAL PRIMARY KEY,
                author BIGINT REFERENCES users (id),
                title TEXT NOT NULL,
                body TEXT,
                views INTEGER NOT NULL DEFAULT 0
            );",
        )
        .await
        .context("Failed to create seed tables")
}

/// Drop everything [`create_seed_tables`] and a sync pass create.
pub async fn drop_seed_tables(client: &Client) -> Result<()> {
    for table in SEED_TABLES.iter().chain(std::iter::once(&ledger::LEDGER_TABLE)) {
        client
            .execute(&format!("DROP TABLE IF EXISTS {table} CASCADE"), &[])
            .await
            .with_context(|| format!("Failed to drop {table}"))?;
    }
    Ok(())
}
