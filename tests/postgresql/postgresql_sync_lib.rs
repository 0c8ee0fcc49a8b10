//! Sync passes against a real PostgreSQL database

use kitchen_sync::testing::postgresql::{
    create_postgres_config, create_seed_tables, drop_seed_tables,
};
use kitchen_sync_postgresql::PostgresTarget;
use tempfile::TempDir;
use tokio_postgres::Client;

async fn single_string(client: &Client, sql: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(client.query_one(sql, &[]).await?.get(0))
}

async fn count(client: &Client, table: &str) -> Result<i64, Box<dyn std::error::Error>> {
    Ok(client
        .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await?
        .get(0))
}

#[tokio::test]
async fn test_postgresql_sync_lib() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("kitchen_sync=debug,kitchen_sync_postgresql=debug")
        .try_init()
        .ok();

    let Some(pg_config) = create_postgres_config() else {
        eprintln!("KITCHEN_SYNC_TEST_DB is not set, skipping");
        return Ok(());
    };

    let (client, connection) =
        tokio_postgres::connect(&pg_config.get_connection_string(), tokio_postgres::NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("PostgreSQL connection error: {e}");
        }
    });

    create_seed_tables(&client).await?;

    let seeds = TempDir::new()?;
    std::fs::write(
        seeds.path().join("users.toml"),
        r#"
[users.admin]
name = "O'Brien"
active = true
score = 12
joined = "2024-01-02"

[users.admin._defaults]
role = "admin"
"#,
    )?;
    std::fs::write(
        seeds.path().join("posts.toml"),
        r#"
[posts.welcome]
author = "${users.admin}"
title = "Hi"
body = "$file(welcome.md)"
"#,
    )?;
    std::fs::write(seeds.path().join("welcome.md"), "It's 'quoted'\n")?;

    let target = PostgresTarget::connect(&pg_config.get_connection_string()).await?;
    kitchen_sync::init(&target).await?;
    // Idempotent
    kitchen_sync::init(&target).await?;

    // First pass creates both rows, the user first
    let report = kitchen_sync::sync(&target, seeds.path(), false).await?;
    assert_eq!(report.created, 2);

    let user = client
        .query_one(
            "SELECT id, name, role, active, score, joined::text FROM users",
            &[],
        )
        .await?;
    let admin_id: i64 = user.get(0);
    assert_eq!(user.get::<_, String>(1), "O'Brien");
    assert_eq!(user.get::<_, String>(2), "admin");
    assert!(user.get::<_, bool>(3));
    assert_eq!(user.get::<_, i32>(4), 12);
    assert_eq!(user.get::<_, String>(5), "2024-01-02");

    let post = client
        .query_one("SELECT id, author, body FROM posts", &[])
        .await?;
    assert_eq!(post.get::<_, i64>(1), admin_id);
    assert_eq!(post.get::<_, String>(2), "It's 'quoted'\n");

    // Second pass changes nothing
    let report = kitchen_sync::sync(&target, seeds.path(), false).await?;
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 2);
    assert_eq!(count(&client, "users").await?, 1);
    assert_eq!(count(&client, "posts").await?, 1);
    assert_eq!(count(&client, "_kitchensync").await?, 2);

    // A deleted row comes back with a new id
    client.execute("DELETE FROM posts", &[]).await?;
    let report = kitchen_sync::sync(&target, seeds.path(), false).await?;
    assert_eq!(report.recreated, 1);
    let post_id: i32 = client.query_one("SELECT id FROM posts", &[]).await?.get(0);
    assert_eq!(post_id, 2);
    let ledger_id: i64 = client
        .query_one(
            "SELECT id FROM _kitchensync WHERE tablename = 'posts' AND name = 'welcome'",
            &[],
        )
        .await?
        .get(0);
    assert_eq!(ledger_id, 2);

    // Defaults only come back with reset
    client
        .execute("UPDATE users SET role = 'member'", &[])
        .await?;
    kitchen_sync::sync(&target, seeds.path(), false).await?;
    assert_eq!(single_string(&client, "SELECT role FROM users").await?, "member");
    kitchen_sync::sync(&target, seeds.path(), true).await?;
    assert_eq!(single_string(&client, "SELECT role FROM users").await?, "admin");

    // Drop empties everything, the ledger included
    let truncated = kitchen_sync::drop_all(&target).await?;
    for table in ["_kitchensync", "posts", "users"] {
        assert!(truncated.iter().any(|t| t == table), "{table} not truncated");
        assert_eq!(count(&client, table).await?, 0);
    }

    drop_seed_tables(&client).await?;
    Ok(())
}
