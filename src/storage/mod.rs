//! Storage layer for carchive
//!
//! Provides the SQLite database, typed record structs, and the read/write
//! helpers consumed by the search core and by ingestion adapters

pub mod database;
pub mod models;

pub use database::{Database, DbConnection, DbPool, DbStats};
pub use models::{
    new_id, AgentOutput, Chunk, Conversation, Media, Message, Provider, TargetType,
};
