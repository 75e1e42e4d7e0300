//! Durable login state: the current session and the e-mail of the last login.
//! Passwords are never stored.

use std::{collections::HashMap, future::Future, path::Path};

use const_format::formatcp;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    Pool, SqlitePool,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    types::user::Session,
};

const KEY_SESSION: &str = "session";
const KEY_LAST_EMAIL: &str = "last_email";

pub trait SessionStore {
    fn load(&self) -> impl Future<Output = Result<Option<Session>>> + Send;

    fn save(&self, session: &Session) -> impl Future<Output = Result<()>> + Send;

    /// Drops the session, the remembered e-mail stays.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;

    fn last_email(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn remember_email(&self, email: &str) -> impl Future<Output = Result<()>> + Send;
}

const TABLE_NAME: &str = "session";
const CREATE_TABLE: &str = formatcp!(
    "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)",
    TABLE_NAME
);
const SELECT: &str = formatcp!("SELECT value FROM {} WHERE key = ?", TABLE_NAME);
const UPSERT: &str = formatcp!(
    "INSERT INTO {} (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    TABLE_NAME
);
const DELETE: &str = formatcp!("DELETE FROM {} WHERE key = ?", TABLE_NAME);

/// Key/value rows in a small SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Opens (creating if needed) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(path = %path.display(), "opening session store");
        let pool = Pool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true),
        )
        .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(sqlx::query_scalar::<_, String>(SELECT)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query(DELETE).bind(key).execute(&self.pool).await?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        match self.get(KEY_SESSION).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable stored session");
                    self.delete(KEY_SESSION).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).map_err(|e| Error::Parse(e.to_string()))?;
        self.set(KEY_SESSION, &json).await
    }

    async fn clear(&self) -> Result<()> {
        self.delete(KEY_SESSION).await
    }

    async fn last_email(&self) -> Result<Option<String>> {
        self.get(KEY_LAST_EMAIL).await
    }

    async fn remember_email(&self, email: &str) -> Result<()> {
        self.set(KEY_LAST_EMAIL, email).await
    }
}

/// Keeps everything in memory, for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<&'static str, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        match self.values.lock().await.get(KEY_SESSION) {
            Some(json) => Ok(serde_json::from_str(json).ok()),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).map_err(|e| Error::Parse(e.to_string()))?;
        self.values.lock().await.insert(KEY_SESSION, json);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values.lock().await.remove(KEY_SESSION);
        Ok(())
    }

    async fn last_email(&self) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(KEY_LAST_EMAIL).cloned())
    }

    async fn remember_email(&self, email: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(KEY_LAST_EMAIL, email.to_string());
        Ok(())
    }
}
