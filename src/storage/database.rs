//! SQLite database management with migrations
//!
//! Provides structured storage for providers, conversations, messages,
//! chunks, agent outputs, and media records

use crate::error::{CarchiveError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::params;
use std::path::Path;
use std::sync::Arc;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled connection handle
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection
    pub fn new(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CarchiveError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        // Every pooled connection gets the pragmas and the REGEXP function
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            register_regexp(conn)
        });

        let pool = Pool::builder()
            .max_size(16)
            .build(manager)
            .map_err(|e| CarchiveError::Storage(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };

        // Run migrations
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .map_err(|e| CarchiveError::Storage(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        // Create migrations table if it doesn't exist
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        // Get current version
        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        // Apply migrations
        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let provider_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM providers", [], |row| row.get(0))?;

        let conversation_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;

        let message_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;

        let chunk_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;

        let gencom_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM agent_outputs
             WHERE output_type = 'gencom' OR output_type LIKE 'gencom\\_%' ESCAPE '\\'",
            [],
            |row| row.get(0),
        )?;

        let media_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;

        Ok(DbStats {
            provider_count: provider_count as usize,
            conversation_count: conversation_count as usize,
            message_count: message_count as usize,
            chunk_count: chunk_count as usize,
            gencom_count: gencom_count as usize,
            media_count: media_count as usize,
        })
    }
}

/// Register a case-insensitive REGEXP function so `column REGEXP ?` works.
///
/// The compiled regex is cached per prepared statement via the auxiliary-data
/// slot, so repeated row evaluations do not recompile the pattern.
fn register_regexp(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regexp: Arc<Regex> = ctx.get_or_create_aux(
                0,
                |vr| -> std::result::Result<_, Box<dyn std::error::Error + Send + Sync + 'static>> {
                    Ok(Regex::new(&format!("(?i){}", vr.as_str()?))?)
                },
            )?;

            let text: Option<String> = ctx.get(1)?;
            Ok(text.map(|t| regexp.is_match(&t)).unwrap_or(false))
        },
    )
}

/// Database statistics
#[derive(Debug)]
pub struct DbStats {
    pub provider_count: usize,
    pub conversation_count: usize,
    pub message_count: usize,
    pub chunk_count: usize,
    pub gencom_count: usize,
    pub media_count: usize,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- Source systems the archives were exported from (chatgpt, claude, ...)
    CREATE TABLE providers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    -- Conversations table
    CREATE TABLE conversations (
        id TEXT PRIMARY KEY,
        provider_id TEXT NOT NULL,
        title TEXT NOT NULL,
        meta TEXT,  -- JSON metadata from the export
        created_at INTEGER NOT NULL,
        updated_at INTEGER,
        FOREIGN KEY (provider_id) REFERENCES providers(id)
    );

    CREATE INDEX idx_conversations_provider ON conversations(provider_id);
    CREATE INDEX idx_conversations_created_at ON conversations(created_at);

    -- Messages table
    CREATE TABLE messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        parent_id TEXT,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER,
        FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_messages_conversation ON messages(conversation_id);
    CREATE INDEX idx_messages_role ON messages(role);
    CREATE INDEX idx_messages_created_at ON messages(created_at);

    -- Chunks table (message text split for embedding)
    CREATE TABLE chunks (
        id TEXT PRIMARY KEY,
        message_id TEXT NOT NULL,
        position INTEGER,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_chunks_message ON chunks(message_id);
    CREATE INDEX idx_chunks_created_at ON chunks(created_at);

    -- Agent outputs (AI-generated commentary; gencom rows have
    -- output_type 'gencom' or 'gencom_<subtype>')
    CREATE TABLE agent_outputs (
        id TEXT PRIMARY KEY,
        target_type TEXT NOT NULL CHECK (target_type IN ('message', 'conversation', 'chunk')),
        target_id TEXT NOT NULL,
        output_type TEXT NOT NULL,
        content TEXT NOT NULL,
        agent_name TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER
    );

    CREATE INDEX idx_agent_outputs_target ON agent_outputs(target_type, target_id);
    CREATE INDEX idx_agent_outputs_type ON agent_outputs(output_type);
    CREATE INDEX idx_agent_outputs_created_at ON agent_outputs(created_at);

    -- Media table (created_at may be missing in older exports)
    CREATE TABLE media (
        id TEXT PRIMARY KEY,
        file_path TEXT NOT NULL,
        media_type TEXT,
        description TEXT,
        file_size INTEGER,
        created_at INTEGER
    );

    CREATE INDEX idx_media_type ON media(media_type);

    -- Message <-> media association
    CREATE TABLE message_media (
        message_id TEXT NOT NULL,
        media_id TEXT NOT NULL,
        PRIMARY KEY (message_id, media_id),
        FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE,
        FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_message_media_media ON message_media(media_id);
    "#,
];
