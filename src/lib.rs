//! Carchive - Chat Archive Manager
//!
//! Ingest-agnostic storage and unified search for exported AI-chat archives.
//! Conversations, messages, text chunks, AI-generated commentary ("gencom")
//! and media records live in a local SQLite database; the search module
//! provides one entry point that queries all five entity types with a shared
//! criteria model.

pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod storage;

pub use error::{CarchiveError, Result};
