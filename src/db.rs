use crate::config::Config;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;

pub type DbPool = Arc<SqlitePool>;

/// Connects to the configured database and creates the schema.
pub async fn init_db(config: &Config) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    create_schema(&pool, config).await?;

    Ok(Arc::new(pool))
}

/// Creates the two tables plus the conversation index. Table names come from
/// configuration, so the DDL is assembled with `format!`; value parameters
/// everywhere else stay bound.
pub async fn create_schema(pool: &SqlitePool, config: &Config) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            username TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            last_active TEXT NOT NULL
        )
        "#,
        config.users_table
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            message_id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            from_user TEXT NOT NULL,
            to_user TEXT NOT NULL,
            message_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        config.messages_table
    ))
    .execute(pool)
    .await?;

    // Secondary index: one conversation's messages, newest first.
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{t}_conversation ON {t}(conversation_id, timestamp DESC)",
        t = config.messages_table
    ))
    .execute(pool)
    .await?;

    Ok(())
}
