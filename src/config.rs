use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SESSION_SECRET must be set")]
    MissingSecret,
    #[error("SESSION_SECRET must be at least 32 bytes")]
    WeakSecret,
}

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub users_table: String,
    pub messages_table: String,
    pub session_secret: String,
    pub port: u16,
}

impl Config {
    /// Reads configuration from the environment. A missing or too-short
    /// session secret is fatal; everything else has a local-dev default.
    pub fn from_env() -> Result<Config, ConfigError> {
        let session_secret = env::var("SESSION_SECRET").map_err(|_| ConfigError::MissingSecret)?;
        if session_secret.len() < 32 {
            return Err(ConfigError::WeakSecret);
        }

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            std::fs::create_dir_all("./data").ok();
            "sqlite:./data/pairchat.db?mode=rwc".to_string()
        });

        Ok(Config {
            database_url,
            users_table: env::var("USERS_TABLE").unwrap_or_else(|_| "users".to_string()),
            messages_table: env::var("MESSAGES_TABLE").unwrap_or_else(|_| "messages".to_string()),
            session_secret,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        })
    }
}
