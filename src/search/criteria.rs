//! Search criteria model
//!
//! A validated, immutable description of one search request. Construction
//! goes through [`SearchCriteriaBuilder`]; shape violations surface as
//! [`CarchiveError::InvalidCriteria`] before any storage access.

use crate::error::{CarchiveError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Searchable entity kinds. `All` is a request-level shorthand that the
/// manager expands to the five concrete types before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Message,
    Conversation,
    Chunk,
    Gencom,
    Media,
    All,
}

impl EntityType {
    /// The five concrete entity types, in canonical dispatch order
    pub const CONCRETE: [EntityType; 5] = [
        EntityType::Message,
        EntityType::Conversation,
        EntityType::Chunk,
        EntityType::Gencom,
        EntityType::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Message => "message",
            EntityType::Conversation => "conversation",
            EntityType::Chunk => "chunk",
            EntityType::Gencom => "gencom",
            EntityType::Media => "media",
            EntityType::All => "all",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CarchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "message" | "messages" => Ok(EntityType::Message),
            "conversation" | "conversations" => Ok(EntityType::Conversation),
            "chunk" | "chunks" => Ok(EntityType::Chunk),
            "gencom" => Ok(EntityType::Gencom),
            "media" => Ok(EntityType::Media),
            "all" => Ok(EntityType::All),
            other => Err(CarchiveError::InvalidCriteria(format!(
                "Unknown entity type: {}",
                other
            ))),
        }
    }
}

/// How the text query is matched against an entity's text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Case-insensitive "contains" match of the literal query
    #[default]
    Substring,
    /// Case-sensitive full-value equality
    Exact,
    /// Any whitespace-separated word matches as a substring
    AnyWord,
    /// All words appear as substrings, in any order
    AllWords,
    /// The query is a case-insensitive regular expression
    Regex,
}

impl FromStr for SearchMode {
    type Err = CarchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(SearchMode::Substring),
            "exact" => Ok(SearchMode::Exact),
            "any_word" | "any-word" => Ok(SearchMode::AnyWord),
            "all_words" | "all-words" => Ok(SearchMode::AllWords),
            "regex" => Ok(SearchMode::Regex),
            other => Err(CarchiveError::InvalidCriteria(format!(
                "Unknown search mode: {}",
                other
            ))),
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first (default)
    #[default]
    DateDesc,
    /// Oldest first
    DateAsc,
    /// Content field, A to Z
    AlphaAsc,
    /// Content field, Z to A
    AlphaDesc,
}

impl FromStr for SortOrder {
    type Err = CarchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date_desc" | "date-desc" => Ok(SortOrder::DateDesc),
            "date_asc" | "date-asc" => Ok(SortOrder::DateAsc),
            "alpha_asc" | "alpha-asc" => Ok(SortOrder::AlphaAsc),
            "alpha_desc" | "alpha-desc" => Ok(SortOrder::AlphaDesc),
            other => Err(CarchiveError::InvalidCriteria(format!(
                "Unknown sort order: {}",
                other
            ))),
        }
    }
}

/// Inclusive creation-date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A validated search request. Treated as read-only once built; the manager
/// passes the same criteria to every searcher without mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Search string; empty means "no text filter"
    pub text_query: String,
    pub search_mode: SearchMode,
    /// Requested entity types (non-empty; may contain `All`)
    pub entity_types: Vec<EntityType>,
    /// Message-author roles to filter by (case-insensitive)
    pub roles: Vec<String>,
    /// Source-system names, e.g. "chatgpt", "claude" (case-insensitive)
    pub providers: Vec<String>,
    /// Gencom subtypes ("summary", "category"); empty means all gencom rows
    pub gencom_types: Vec<String>,
    /// Restrict to one conversation
    pub conversation_id: Option<String>,
    /// Only items created within the last N days
    pub days: Option<i64>,
    /// Explicit inclusive bounds; ANDed with `days` when both are set
    pub date_range: Option<DateRange>,
    pub sort_by: SortOrder,
    pub offset: usize,
    pub limit: usize,
}

impl SearchCriteria {
    pub fn builder() -> SearchCriteriaBuilder {
        SearchCriteriaBuilder::default()
    }

    /// Shape validation. Never touches storage.
    pub fn validate(&self) -> Result<()> {
        if self.entity_types.is_empty() {
            return Err(CarchiveError::InvalidCriteria(
                "entity_types must not be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(CarchiveError::InvalidCriteria(
                "limit must be greater than zero".to_string(),
            ));
        }
        if let Some(days) = self.days {
            if days <= 0 {
                return Err(CarchiveError::InvalidCriteria(
                    "days must be greater than zero".to_string(),
                ));
            }
        }
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(CarchiveError::InvalidCriteria(
                    "date_range start must not be after end".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Expand `All` and drop duplicates, preserving canonical dispatch order
    pub fn resolved_entity_types(&self) -> Vec<EntityType> {
        if self.entity_types.contains(&EntityType::All) {
            return EntityType::CONCRETE.to_vec();
        }
        EntityType::CONCRETE
            .iter()
            .copied()
            .filter(|ty| self.entity_types.contains(ty))
            .collect()
    }
}

/// Builder for [`SearchCriteria`]; `build()` runs shape validation
#[derive(Debug, Clone)]
pub struct SearchCriteriaBuilder {
    criteria: SearchCriteria,
}

impl Default for SearchCriteriaBuilder {
    fn default() -> Self {
        Self {
            criteria: SearchCriteria {
                text_query: String::new(),
                search_mode: SearchMode::default(),
                entity_types: vec![EntityType::All],
                roles: Vec::new(),
                providers: Vec::new(),
                gencom_types: Vec::new(),
                conversation_id: None,
                days: None,
                date_range: None,
                sort_by: SortOrder::default(),
                offset: 0,
                limit: 20,
            },
        }
    }
}

impl SearchCriteriaBuilder {
    pub fn text_query(mut self, query: impl Into<String>) -> Self {
        self.criteria.text_query = query.into();
        self
    }

    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.criteria.search_mode = mode;
        self
    }

    pub fn entity_types(mut self, types: impl IntoIterator<Item = EntityType>) -> Self {
        self.criteria.entity_types = types.into_iter().collect();
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.criteria.roles = roles.into_iter().collect();
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = String>) -> Self {
        self.criteria.providers = providers.into_iter().collect();
        self
    }

    pub fn gencom_types(mut self, types: impl IntoIterator<Item = String>) -> Self {
        self.criteria.gencom_types = types.into_iter().collect();
        self
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.criteria.conversation_id = Some(id.into());
        self
    }

    pub fn days(mut self, days: i64) -> Self {
        self.criteria.days = Some(days);
        self
    }

    pub fn date_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.criteria.date_range = Some(DateRange { start, end });
        self
    }

    pub fn sort_by(mut self, sort: SortOrder) -> Self {
        self.criteria.sort_by = sort;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.criteria.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.criteria.limit = limit;
        self
    }

    pub fn build(self) -> Result<SearchCriteria> {
        self.criteria.validate()?;
        Ok(self.criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let criteria = SearchCriteria::builder().build().unwrap();
        assert_eq!(criteria.search_mode, SearchMode::Substring);
        assert_eq!(criteria.sort_by, SortOrder::DateDesc);
        assert_eq!(criteria.entity_types, vec![EntityType::All]);
        assert_eq!(criteria.limit, 20);
        assert_eq!(criteria.offset, 0);
    }

    #[test]
    fn test_empty_entity_types_rejected() {
        let result = SearchCriteria::builder().entity_types([]).build();
        assert!(matches!(result, Err(CarchiveError::InvalidCriteria(_))));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = SearchCriteria::builder().limit(0).build();
        assert!(matches!(result, Err(CarchiveError::InvalidCriteria(_))));
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let now = Utc::now();
        let result = SearchCriteria::builder()
            .date_range(now, now - chrono::Duration::days(1))
            .build();
        assert!(matches!(result, Err(CarchiveError::InvalidCriteria(_))));
    }

    #[test]
    fn test_all_expands_to_concrete_types() {
        let criteria = SearchCriteria::builder()
            .entity_types([EntityType::All])
            .build()
            .unwrap();
        assert_eq!(criteria.resolved_entity_types(), EntityType::CONCRETE);
    }

    #[test]
    fn test_resolution_deduplicates_and_keeps_canonical_order() {
        let criteria = SearchCriteria::builder()
            .entity_types([
                EntityType::Media,
                EntityType::Message,
                EntityType::Message,
            ])
            .build()
            .unwrap();
        assert_eq!(
            criteria.resolved_entity_types(),
            vec![EntityType::Message, EntityType::Media]
        );
    }

    #[test]
    fn test_entity_type_parsing() {
        assert_eq!(
            "conversations".parse::<EntityType>().unwrap(),
            EntityType::Conversation
        );
        assert!("bogus".parse::<EntityType>().is_err());
    }
}
