//! Common-filter applier
//!
//! Attaches the cross-entity filters (date window, explicit date range,
//! conversation scoping) to a partially built per-entity query. Only extends
//! the clause/parameter lists; never executes anything.

use crate::search::criteria::SearchCriteria;
use chrono::{Duration, Utc};
use rusqlite::types::Value;

/// How the common filters map onto one entity's query
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonFilterColumns<'a> {
    /// Creation-timestamp expression; `None` for entities without one
    pub created_at: Option<&'a str>,
    /// Predicate scoping the row to a conversation, with exactly one `?`
    /// placeholder for the conversation id. Entities without a direct
    /// conversation column supply a join/EXISTS predicate here; the filter
    /// is never silently dropped.
    pub conversation_scope: Option<&'a str>,
}

/// Extend `clauses`/`params` with the filters meaningful for this entity.
///
/// `days` and `date_range` are independent filters and are ANDed when both
/// are present.
pub fn apply_common_filters(
    criteria: &SearchCriteria,
    columns: CommonFilterColumns<'_>,
    clauses: &mut Vec<String>,
    params: &mut Vec<Value>,
) {
    if let Some(created_at) = columns.created_at {
        if let Some(days) = criteria.days {
            let cutoff = Utc::now() - Duration::days(days);
            clauses.push(format!("{} >= ?", created_at));
            params.push(Value::Integer(cutoff.timestamp()));
        }

        if let Some(range) = &criteria.date_range {
            clauses.push(format!("{} >= ?", created_at));
            params.push(Value::Integer(range.start.timestamp()));
            clauses.push(format!("{} <= ?", created_at));
            params.push(Value::Integer(range.end.timestamp()));
        }
    }

    if let (Some(scope), Some(conversation_id)) =
        (columns.conversation_scope, &criteria.conversation_id)
    {
        clauses.push(scope.to_string());
        params.push(Value::Text(conversation_id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::criteria::SearchCriteria;
    use chrono::TimeZone;

    #[test]
    fn test_no_filters_no_clauses() {
        let criteria = SearchCriteria::builder().build().unwrap();
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        apply_common_filters(
            &criteria,
            CommonFilterColumns {
                created_at: Some("m.created_at"),
                conversation_scope: Some("m.conversation_id = ?"),
            },
            &mut clauses,
            &mut params,
        );

        assert!(clauses.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_days_and_range_are_anded() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let criteria = SearchCriteria::builder()
            .days(7)
            .date_range(start, end)
            .build()
            .unwrap();

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        apply_common_filters(
            &criteria,
            CommonFilterColumns {
                created_at: Some("created_at"),
                conversation_scope: None,
            },
            &mut clauses,
            &mut params,
        );

        assert_eq!(
            clauses,
            vec!["created_at >= ?", "created_at >= ?", "created_at <= ?"]
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_date_filters_skipped_without_timestamp_column() {
        let criteria = SearchCriteria::builder().days(7).build().unwrap();

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        apply_common_filters(
            &criteria,
            CommonFilterColumns::default(),
            &mut clauses,
            &mut params,
        );

        assert!(clauses.is_empty());
    }

    #[test]
    fn test_conversation_scope_uses_supplied_predicate() {
        let criteria = SearchCriteria::builder()
            .conversation_id("conv-1")
            .build()
            .unwrap();

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        apply_common_filters(
            &criteria,
            CommonFilterColumns {
                created_at: None,
                conversation_scope: Some(
                    "EXISTS (SELECT 1 FROM messages m WHERE m.id = ch.message_id AND m.conversation_id = ?)",
                ),
            },
            &mut clauses,
            &mut params,
        );

        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].starts_with("EXISTS"));
        assert_eq!(params, vec![Value::Text("conv-1".to_string())]);
    }
}
