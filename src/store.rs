// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history storage.
//!
//! Conversations are keyed by an opaque id and hold messages in the order
//! they were appended. The SQLite backend keeps history across runs.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::chat::{ChatMessage, Role};
use crate::config::{StoreBackend, StoreConfig};

const SCHEMA_VERSION: &str = "1";

/// Ordered message history per conversation.
pub trait ConversationStore {
    fn append(&mut self, conversation_id: &str, message: ChatMessage) -> Result<()>;

    /// Messages of one conversation, oldest first; empty when unknown.
    fn history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>>;

    /// Forgets a conversation, returning how many messages were removed.
    fn clear(&mut self, conversation_id: &str) -> Result<usize>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    conversations: HashMap<String, Vec<ChatMessage>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryStore {
    fn append(&mut self, conversation_id: &str, message: ChatMessage) -> Result<()> {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
        Ok(())
    }

    fn history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .conversations
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    fn clear(&mut self, conversation_id: &str) -> Result<usize> {
        Ok(self
            .conversations
            .remove(conversation_id)
            .map(|messages| messages.len())
            .unwrap_or(0))
    }
}

/// SQLite-backed store.
///
/// Stores conversations in `.ragctx/conversations.sqlite` by default.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens or creates a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let store = Self { conn, path };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                conversation_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (conversation_id, seq)
            );
            "#,
            )
            .context("Failed to initialize database schema")?;

        if self.get_meta("schema_version")?.is_none() {
            self.set_meta("schema_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ConversationStore for SqliteStore {
    fn append(&mut self, conversation_id: &str, message: ChatMessage) -> Result<()> {
        let tx = self.conn.transaction()?;
        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        tx.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                conversation_id,
                next_seq,
                message.role.as_str(),
                message.content,
                created_at
            ],
        )?;
        tx.commit()
            .with_context(|| format!("Failed to append to conversation {conversation_id}"))?;
        Ok(())
    }

    fn history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT role, content FROM messages WHERE conversation_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![conversation_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content) = row?;
            let role: Role = role
                .parse()
                .with_context(|| format!("Corrupt message in conversation {conversation_id}"))?;
            messages.push(ChatMessage::new(role, content));
        }
        Ok(messages)
    }

    fn clear(&mut self, conversation_id: &str) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
        )?;
        Ok(removed)
    }
}

/// Opens the backend named in the config.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn ConversationStore>> {
    match config.backend() {
        StoreBackend::Memory => Ok(Box::new(InMemoryStore::new())),
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(config.path())?;
            tracing::debug!(path = %store.path().display(), "opened conversation store");
            Ok(Box::new(store))
        }
    }
}
