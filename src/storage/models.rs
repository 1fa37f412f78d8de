//! Typed record structs and read/write helpers over the database
//!
//! These helpers are the storage surface used by ingestion adapters and by
//! the search core. The search core only reads; inserts exist for importers
//! and tests.

use crate::error::Result;
use crate::storage::Database;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source system an archive was exported from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
}

/// A single conversation from an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub provider_id: String,
    pub title: String,
    /// Raw JSON metadata carried over from the export
    pub meta: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub parent_id: Option<String>,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A slice of message text prepared for embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub message_id: String,
    pub position: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What an agent output is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Message,
    Conversation,
    Chunk,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Message => "message",
            TargetType::Conversation => "conversation",
            TargetType::Chunk => "chunk",
        }
    }
}

/// AI-generated output attached to a message, conversation, or chunk.
/// Commentary rows ("gencom") use output_type `gencom` or `gencom_<subtype>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub id: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub output_type: String,
    pub content: String,
    pub agent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A media record (image, audio, attachment) referenced by messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub file_path: String,
    pub media_type: Option<String>,
    pub description: Option<String>,
    pub file_size: Option<i64>,
    /// Missing in some older exports
    pub created_at: Option<DateTime<Utc>>,
}

/// Generate a fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn ts(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn opt_ts(dt: Option<DateTime<Utc>>) -> Option<i64> {
    dt.map(|d| d.timestamp())
}

impl Database {
    /// Insert a provider, returning its id. Existing names are reused.
    pub fn insert_provider(&self, name: &str) -> Result<String> {
        let conn = self.get_conn()?;

        if let Some(id) = conn
            .query_row(
                "SELECT id FROM providers WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
        {
            return Ok(id);
        }

        let id = new_id();
        conn.execute(
            "INSERT INTO providers (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(id)
    }

    /// Resolve human-readable provider names to internal ids.
    ///
    /// Matching is a case-insensitive exact match on name. Unmatched names
    /// contribute nothing; they are not an error.
    pub fn resolve_provider_ids(&self, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = names
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id FROM providers WHERE LOWER(name) IN ({}) ORDER BY name",
            placeholders
        );

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(rusqlite::params_from_iter(lowered.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    pub fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO conversations (id, provider_id, title, meta, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                conversation.id,
                conversation.provider_id,
                conversation.title,
                conversation.meta,
                ts(conversation.created_at),
                opt_ts(conversation.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_message(&self, message: &Message) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO messages (id, conversation_id, parent_id, role, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message.id,
                message.conversation_id,
                message.parent_id,
                message.role,
                message.content,
                ts(message.created_at),
                opt_ts(message.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO chunks (id, message_id, position, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                chunk.id,
                chunk.message_id,
                chunk.position,
                chunk.content,
                ts(chunk.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_agent_output(&self, output: &AgentOutput) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO agent_outputs (id, target_type, target_id, output_type, content, agent_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                output.id,
                output.target_type.as_str(),
                output.target_id,
                output.output_type,
                output.content,
                output.agent_name,
                ts(output.created_at),
                opt_ts(output.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_media(&self, media: &Media) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO media (id, file_path, media_type, description, file_size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                media.id,
                media.file_path,
                media.media_type,
                media.description,
                media.file_size,
                opt_ts(media.created_at),
            ],
        )?;
        Ok(())
    }

    /// Associate a media record with a message
    pub fn attach_media(&self, message_id: &str, media_id: &str) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO message_media (message_id, media_id) VALUES (?1, ?2)",
            params![message_id, media_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_insert_provider_is_idempotent() {
        let (_tmp, db) = test_db();

        let first = db.insert_provider("chatgpt").unwrap();
        let second = db.insert_provider("chatgpt").unwrap();
        assert_eq!(first, second);

        let other = db.insert_provider("claude").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_resolve_provider_ids_case_insensitive() {
        let (_tmp, db) = test_db();

        let chatgpt = db.insert_provider("chatgpt").unwrap();
        db.insert_provider("claude").unwrap();

        let ids = db
            .resolve_provider_ids(&["ChatGPT".to_string()])
            .unwrap();
        assert_eq!(ids, vec![chatgpt]);
    }

    #[test]
    fn test_resolve_provider_ids_unknown_name_is_not_an_error() {
        let (_tmp, db) = test_db();
        db.insert_provider("chatgpt").unwrap();

        let ids = db
            .resolve_provider_ids(&["nonexistent-provider".to_string()])
            .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_insert_conversation_and_message() {
        let (_tmp, db) = test_db();

        let provider_id = db.insert_provider("chatgpt").unwrap();
        let conversation = Conversation {
            id: new_id(),
            provider_id,
            title: "Test conversation".to_string(),
            meta: Some(r#"{"model":"gpt-4"}"#.to_string()),
            created_at: Utc::now(),
            updated_at: None,
        };
        db.insert_conversation(&conversation).unwrap();

        let message = Message {
            id: new_id(),
            conversation_id: conversation.id.clone(),
            parent_id: None,
            role: "user".to_string(),
            content: "Hello there".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        db.insert_message(&message).unwrap();

        let conn = db.get_conn().unwrap();
        let content: String = conn
            .query_row(
                "SELECT content FROM messages WHERE conversation_id = ?1",
                params![conversation.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(content, "Hello there");
    }

    #[test]
    fn test_foreign_key_enforced_for_messages() {
        let (_tmp, db) = test_db();

        let message = Message {
            id: new_id(),
            conversation_id: "missing-conversation".to_string(),
            parent_id: None,
            role: "user".to_string(),
            content: "orphan".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(db.insert_message(&message).is_err());
    }
}
