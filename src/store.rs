use crate::conversation::conversation_id;
use crate::db::DbPool;
use crate::models::{Message, User};
use chrono::Utc;
use uuid::Uuid;

/// Message window for the HTML chat view.
pub const VIEW_LIMIT: i64 = 25;
/// Message window for the JSON API.
pub const API_LIMIT: i64 = 50;

/// Record store keyed by username. Table name comes from configuration, so
/// queries interpolate it; all values stay bound.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
    table: String,
}

impl UserStore {
    pub fn new(pool: DbPool, table: String) -> Self {
        UserStore { pool, table }
    }

    /// Looks up a user by exact username, creating the record on first login
    /// and bumping `last_active` on every later one. `created_at` is set once
    /// and never touched again.
    pub async fn get_or_create(&self, username: &str) -> Result<User, sqlx::Error> {
        let existing = self.find(username).await?;

        let now = Utc::now();
        match existing {
            Some(mut user) => {
                sqlx::query(&format!(
                    "UPDATE {} SET last_active = ? WHERE username = ?",
                    self.table
                ))
                .bind(now.to_rfc3339())
                .bind(username)
                .execute(self.pool.as_ref())
                .await?;
                user.last_active = now;
                Ok(user)
            }
            None => {
                let user = User {
                    username: username.to_string(),
                    created_at: now,
                    last_active: now,
                };
                sqlx::query(&format!(
                    "INSERT INTO {} (username, created_at, last_active) VALUES (?, ?, ?)",
                    self.table
                ))
                .bind(&user.username)
                .bind(user.created_at.to_rfc3339())
                .bind(user.last_active.to_rfc3339())
                .execute(self.pool.as_ref())
                .await?;
                Ok(user)
            }
        }
    }

    pub async fn find(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT username, created_at, last_active FROM {} WHERE username = ?",
            self.table
        ))
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await
    }

    /// Full roster, sorted ascending by username. No pagination; the
    /// directory is expected to stay small.
    pub async fn list_all(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT username, created_at, last_active FROM {} ORDER BY username ASC",
            self.table
        ))
        .fetch_all(self.pool.as_ref())
        .await
    }

    /// Cheap reachability probe used by the health endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

/// Append-only log of chat messages, addressed by conversation id and read
/// through the (conversation_id, timestamp DESC) index.
#[derive(Clone)]
pub struct MessageStore {
    pool: DbPool,
    table: String,
}

impl MessageStore {
    pub fn new(pool: DbPool, table: String) -> Self {
        MessageStore { pool, table }
    }

    /// Writes one message. Callers must reject empty text before calling;
    /// duplicate calls write duplicate messages. Same-millisecond messages
    /// have no defined relative order.
    pub async fn append(
        &self,
        from_user: &str,
        to_user: &str,
        text: &str,
    ) -> Result<Message, sqlx::Error> {
        let now = Utc::now();
        let message = Message {
            message_id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id(from_user, to_user),
            timestamp: now.timestamp_millis(),
            from_user: from_user.to_string(),
            to_user: to_user.to_string(),
            message_text: text.to_string(),
            created_at: now,
        };

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (message_id, conversation_id, timestamp, from_user, to_user, message_text, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            self.table
        ))
        .bind(&message.message_id)
        .bind(&message.conversation_id)
        .bind(message.timestamp)
        .bind(&message.from_user)
        .bind(&message.to_user)
        .bind(&message.message_text)
        .bind(message.created_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;

        Ok(message)
    }

    /// The `limit` most recent messages for the pair, reversed into ascending
    /// chronological order for display.
    pub async fn fetch_recent(
        &self,
        user_a: &str,
        user_b: &str,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let mut messages = self.fetch_latest(user_a, user_b, limit).await?;
        messages.reverse();
        Ok(messages)
    }

    /// The `limit` most recent messages for the pair, newest first, straight
    /// off the index scan. This is what the JSON API serves.
    pub async fn fetch_latest(
        &self,
        user_a: &str,
        user_b: &str,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT message_id, conversation_id, timestamp, from_user, to_user, message_text, created_at
            FROM {}
            WHERE conversation_id = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
            self.table
        ))
        .bind(conversation_id(user_a, user_b))
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            users_table: "users".to_string(),
            messages_table: "messages".to_string(),
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            port: 0,
        }
    }

    async fn test_stores() -> (UserStore, MessageStore) {
        let config = test_config();
        // A single connection keeps every query on the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.database_url)
            .await
            .unwrap();
        db::create_schema(&pool, &config).await.unwrap();
        let pool = Arc::new(pool);
        (
            UserStore::new(pool.clone(), config.users_table),
            MessageStore::new(pool, config.messages_table),
        )
    }

    #[tokio::test]
    async fn get_or_create_preserves_created_at() {
        let (users, _) = test_stores().await;

        let first = users.get_or_create("alice").await.unwrap();
        assert_eq!(first.created_at, first.last_active);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = users.get_or_create("alice").await.unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_active >= first.last_active);
    }

    #[tokio::test]
    async fn roster_is_sorted_by_username() {
        let (users, _) = test_stores().await;
        for name in ["zeta", "alpha", "mike"] {
            users.get_or_create(name).await.unwrap();
        }

        let roster: Vec<String> = users
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(roster, vec!["alpha", "mike", "zeta"]);
    }

    #[tokio::test]
    async fn fetch_recent_is_chronological() {
        let (_, messages) = test_stores().await;
        for text in ["hi", "there", "!"] {
            messages.append("alice", "bob", text).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let thread = messages.fetch_recent("alice", "bob", VIEW_LIMIT).await.unwrap();
        let texts: Vec<&str> = thread.iter().map(|m| m.message_text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "there", "!"]);
    }

    #[tokio::test]
    async fn fetch_recent_is_symmetric_in_participants() {
        let (_, messages) = test_stores().await;
        messages.append("alice", "bob", "hey").await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        messages.append("bob", "alice", "hey yourself").await.unwrap();

        let ab = messages.fetch_recent("alice", "bob", VIEW_LIMIT).await.unwrap();
        let ba = messages.fetch_recent("bob", "alice", VIEW_LIMIT).await.unwrap();
        let ids = |ms: &[Message]| ms.iter().map(|m| m.message_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&ab), ids(&ba));
        assert_eq!(ab.len(), 2);
    }

    #[tokio::test]
    async fn fetch_recent_honors_the_window() {
        let (_, messages) = test_stores().await;
        for i in 0..30 {
            messages.append("alice", "bob", &format!("m{i}")).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let thread = messages.fetch_recent("alice", "bob", VIEW_LIMIT).await.unwrap();
        assert_eq!(thread.len(), VIEW_LIMIT as usize);
        // Oldest five fall off; the window still reads oldest-to-newest.
        assert_eq!(thread.first().unwrap().message_text, "m5");
        assert_eq!(thread.last().unwrap().message_text, "m29");
    }

    #[tokio::test]
    async fn fetch_latest_is_newest_first() {
        let (_, messages) = test_stores().await;
        for text in ["one", "two", "three"] {
            messages.append("alice", "bob", text).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let latest = messages.fetch_latest("alice", "bob", API_LIMIT).await.unwrap();
        let texts: Vec<&str> = latest.iter().map(|m| m.message_text.as_str()).collect();
        assert_eq!(texts, vec!["three", "two", "one"]);
    }
}
