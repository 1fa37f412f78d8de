//! Uniform search output records
//!
//! Every searcher maps its rows into [`SearchResult`], tagged with an
//! explicit entity type so downstream consumers never inspect runtime types.

use crate::search::criteria::{EntityType, SearchCriteria};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One matched entity instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,

    /// Always one of the five concrete types, never `All`
    pub entity_type: EntityType,

    /// Primary textual representation: message/chunk text, conversation
    /// title, commentary text, media file path
    pub content: String,

    /// Constant 1.0; there is no ranking model
    pub relevance_score: f32,

    /// Missing for media records from older exports
    pub created_at: Option<DateTime<Utc>>,

    pub updated_at: Option<DateTime<Utc>>,

    pub conversation_id: Option<String>,

    /// Author role, for message-backed results
    pub role: Option<String>,

    pub title: Option<String>,

    /// Entity-specific extras (parent id, output_type, target_type/target_id,
    /// file attributes)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Results envelope returned by the search manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Already paginated
    pub results: Vec<SearchResult>,

    /// Matches before pagination, summed across searched entity types
    pub total_count: usize,

    /// Wall-clock time of the whole search call
    pub query_time_ms: f64,

    /// The originating criteria, echoed for traceability
    pub criteria: SearchCriteria,
}
