//! Per-entity searchers
//!
//! One module per searchable entity type. Every searcher follows the same
//! skeleton: base query, text condition, entity-specific categorical
//! filters, common filters, unpaginated count, sort, pagination when this
//! is the sole requested type, row-to-result mapping.

pub mod chunk;
pub mod conversation;
pub mod gencom;
pub mod media;
pub mod message;

use crate::error::Result;
use crate::search::criteria::SortOrder;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;

/// `expr IN (?, ?, ...)` with bound values, or a match-nothing predicate
/// when the value list is empty (an unresolvable filter matches nothing,
/// it does not error)
pub(crate) fn sql_in(expr: &str, values: &[String], params: &mut Vec<Value>) -> String {
    if values.is_empty() {
        return "0=1".to_string();
    }
    let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    for value in values {
        params.push(Value::Text(value.clone()));
    }
    format!("{} IN ({})", expr, placeholders)
}

/// Lowercase a role/name list for case-insensitive membership tests
pub(crate) fn lowercased(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// ORDER BY expression shared by all searchers. Rows missing a creation
/// timestamp sort last under both date directions (`IS NULL` ranks non-null
/// rows first); alpha sorts compare the content field case-insensitively;
/// the id column breaks ties so orderings are deterministic.
pub(crate) fn order_clause(
    sort: SortOrder,
    content_col: &str,
    date_col: &str,
    id_col: &str,
) -> String {
    match sort {
        SortOrder::DateDesc => format!("{d} IS NULL, {d} DESC, {id}", d = date_col, id = id_col),
        SortOrder::DateAsc => format!("{d} IS NULL, {d} ASC, {id}", d = date_col, id = id_col),
        SortOrder::AlphaAsc => format!("{c} COLLATE NOCASE ASC, {id}", c = content_col, id = id_col),
        SortOrder::AlphaDesc => {
            format!("{c} COLLATE NOCASE DESC, {id}", c = content_col, id = id_col)
        }
    }
}

/// Count the filtered-but-unpaginated match set
pub(crate) fn count_rows(conn: &Connection, sql: &str, params: &[Value]) -> Result<usize> {
    let count: i64 = conn.query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

pub(crate) fn from_ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

pub(crate) fn opt_from_ts(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.map(from_ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_in_binds_each_value() {
        let mut params = Vec::new();
        let clause = sql_in(
            "c.provider_id",
            &["p1".to_string(), "p2".to_string()],
            &mut params,
        );
        assert_eq!(clause, "c.provider_id IN (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_sql_in_empty_matches_nothing() {
        let mut params = Vec::new();
        let clause = sql_in("c.provider_id", &[], &mut params);
        assert_eq!(clause, "0=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_order_clause_date_desc_ranks_missing_timestamps_last() {
        let clause = order_clause(SortOrder::DateDesc, "content", "created_at", "id");
        assert_eq!(clause, "created_at IS NULL, created_at DESC, id");
    }

    #[test]
    fn test_order_clause_alpha_is_case_insensitive() {
        let clause = order_clause(SortOrder::AlphaAsc, "md.file_path", "md.created_at", "md.id");
        assert_eq!(clause, "md.file_path COLLATE NOCASE ASC, md.id");
    }
}
