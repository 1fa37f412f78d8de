//! Unified search across the five archive entity types
//!
//! One entry point ([`SearchManager::search`]) runs the same criteria
//! against messages, conversations, chunks, gencom commentary, and media,
//! then merges the per-entity result sets into one globally sorted,
//! paginated envelope.

pub mod condition;
pub mod criteria;
pub mod filters;
pub mod merge;
pub mod results;
pub mod searchers;

pub use condition::SqlCondition;
pub use criteria::{
    DateRange, EntityType, SearchCriteria, SearchCriteriaBuilder, SearchMode, SortOrder,
};
pub use merge::merge_results;
pub use results::{SearchResult, SearchResults};

use crate::config::SearchConfig;
use crate::error::{CarchiveError, Result};
use crate::storage::Database;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;

/// Facade orchestrating the per-entity searchers.
///
/// Stateless per call: the criteria is read-only, each searcher runs
/// sequentially on its own short-lived pooled connection, and nothing is
/// shared across calls.
pub struct SearchManager {
    database: Arc<Database>,
    config: SearchConfig,
}

impl SearchManager {
    pub fn new(database: Arc<Database>, config: SearchConfig) -> Self {
        Self { database, config }
    }

    /// Run one search call: validate, resolve providers, invoke each
    /// requested searcher, merge and paginate, wrap with timing.
    pub fn search(&self, criteria: &SearchCriteria) -> Result<SearchResults> {
        criteria.validate()?;
        if criteria.limit > self.config.max_limit {
            return Err(CarchiveError::InvalidCriteria(format!(
                "limit {} exceeds the configured maximum of {}",
                criteria.limit, self.config.max_limit
            )));
        }

        let started = Instant::now();

        // Provider names resolve once per call; unknown names simply yield
        // fewer (possibly zero) ids
        let provider_ids: Option<Vec<String>> = if criteria.providers.is_empty() {
            None
        } else {
            Some(self.database.resolve_provider_ids(&criteria.providers)?)
        };

        let entity_types = criteria.resolved_entity_types();
        // With a single entity type the searcher paginates in SQL; with
        // several, pagination is deferred to the merge step and each
        // searcher returns its entire filtered, sorted match set
        let paginate_per_entity = entity_types.len() == 1;

        let mut gathered = Vec::new();
        let mut total_count = 0usize;

        for entity_type in &entity_types {
            let outcome = {
                let conn = self.database.get_conn()?;
                dispatch(
                    *entity_type,
                    &conn,
                    criteria,
                    provider_ids.as_deref(),
                    paginate_per_entity,
                )
                // conn drops here, before the next searcher runs
            };

            match outcome {
                Ok((results, count)) => {
                    tracing::debug!(
                        entity_type = %entity_type,
                        matches = count,
                        "searcher finished"
                    );
                    total_count += count;
                    gathered.extend(results);
                }
                Err(CarchiveError::UnsupportedEntityType { entity_type }) => {
                    tracing::warn!(
                        "No searcher registered for entity type '{}'; it contributes no results",
                        entity_type
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let results = if paginate_per_entity {
            gathered
        } else {
            merge_results(gathered, criteria.sort_by, criteria.offset, criteria.limit)
        };

        Ok(SearchResults {
            results,
            total_count,
            query_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            criteria: criteria.clone(),
        })
    }
}

fn dispatch(
    entity_type: EntityType,
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    match entity_type {
        EntityType::Message => searchers::message::search(conn, criteria, provider_ids, paginate),
        EntityType::Conversation => {
            searchers::conversation::search(conn, criteria, provider_ids, paginate)
        }
        EntityType::Chunk => searchers::chunk::search(conn, criteria, provider_ids, paginate),
        EntityType::Gencom => searchers::gencom::search(conn, criteria, provider_ids, paginate),
        EntityType::Media => searchers::media::search(conn, criteria, provider_ids, paginate),
        // Requested types are expanded before dispatch; `All` arriving here
        // is a criteria/manager mismatch
        EntityType::All => Err(CarchiveError::UnsupportedEntityType {
            entity_type: entity_type.to_string(),
        }),
    }
}
