//! SQLite chat transcript store
//!
//! Messages are keyed by session id and returned in timestamp order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ChatRole, TranscriptMessage};

/// Persistent per-session chat transcripts
pub trait ChatTranscriptStore: Send + Sync {
    /// Append one message to a session
    fn append(&self, session_id: &str, role: ChatRole, message: &str) -> Result<()>;

    /// All messages of a session, oldest first
    fn history(&self, session_id: &str) -> Result<Vec<TranscriptMessage>>;

    /// Delete a session's messages, returning how many were removed
    fn clear(&self, session_id: &str) -> Result<usize>;
}

/// Run a transcript operation on the blocking pool; SQLite calls block
pub async fn run_blocking<T, F>(store: Arc<dyn ChatTranscriptStore>, op: F) -> Result<T>
where
    F: FnOnce(&dyn ChatTranscriptStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| Error::persistence(format!("Transcript task failed: {}", e)))?
}

/// SQLite-backed transcript store
pub struct SqliteTranscriptStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTranscriptStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::persistence(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory database (for tests and offline runs)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::persistence(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::persistence(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id);
        "#,
        )
        .map_err(|e| Error::persistence(format!("Failed to run migrations: {}", e)))?;

        Ok(())
    }

    /// Number of stored messages across all sessions
    pub fn message_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))
            .map_err(|e| Error::persistence(format!("Failed to count messages: {}", e)))?;
        Ok(count as usize)
    }
}

impl ChatTranscriptStore for SqliteTranscriptStore {
    fn append(&self, session_id: &str, role: ChatRole, message: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chat_messages (session_id, role, message, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, role.as_str(), message, Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::persistence(format!("Failed to store message: {}", e)))?;
        Ok(())
    }

    fn history(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT role, message, timestamp FROM chat_messages \
                 WHERE session_id = ?1 ORDER BY timestamp ASC, id ASC",
            )
            .map_err(|e| Error::persistence(format!("Failed to prepare query: {}", e)))?;

        let messages = stmt
            .query_map(params![session_id], row_to_message)
            .map_err(|e| Error::persistence(format!("Failed to load history: {}", e)))?
            .filter_map(|r| r.ok())
            .flatten()
            .collect();

        Ok(messages)
    }

    fn clear(&self, session_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM chat_messages WHERE session_id = ?1", params![session_id])
            .map_err(|e| Error::persistence(format!("Failed to clear history: {}", e)))?;
        Ok(removed)
    }
}

/// Rows with an unknown role are skipped
fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Option<TranscriptMessage>> {
    let role: String = row.get(0)?;
    let message: String = row.get(1)?;
    let timestamp: String = row.get(2)?;

    Ok(ChatRole::parse(&role).map(|role| TranscriptMessage {
        role,
        message,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }))
}
