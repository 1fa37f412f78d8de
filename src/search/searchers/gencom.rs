//! Gencom (AI commentary) searcher
//!
//! Searches agent_outputs rows in the gencom output-type namespace. Two
//! filters here are deliberately asymmetric:
//!
//! - the role filter only constrains commentary whose target is a message;
//!   commentary on conversations and chunks is unconditionally retained
//! - the provider filter is the union of the message-target and
//!   conversation-target arms, so chunk-targeted commentary can never match
//!   a provider filter (a known gap, kept for compatibility)

use crate::error::Result;
use crate::search::condition::text_condition;
use crate::search::criteria::{EntityType, SearchCriteria};
use crate::search::filters::{apply_common_filters, CommonFilterColumns};
use crate::search::results::SearchResult;
use crate::search::searchers::{count_rows, from_ts, lowercased, opt_from_ts, order_clause, sql_in};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::json;
use std::collections::HashMap;

const FROM: &str = "FROM agent_outputs g";

/// Conversation the commentary belongs to, resolved through its target
const CONVERSATION_EXPR: &str = "(CASE g.target_type \
     WHEN 'conversation' THEN g.target_id \
     WHEN 'message' THEN (SELECT conversation_id FROM messages WHERE id = g.target_id) \
     WHEN 'chunk' THEN (SELECT m.conversation_id FROM chunks ch \
         JOIN messages m ON m.id = ch.message_id WHERE ch.id = g.target_id) \
     END)";

/// Gencom rows are agent outputs whose output_type is exactly 'gencom' or
/// namespaced 'gencom_<subtype>'
const GENCOM_NAMESPACE: &str =
    "(g.output_type = 'gencom' OR g.output_type LIKE 'gencom\\_%' ESCAPE '\\')";

pub fn search(
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    let mut clauses = vec![GENCOM_NAMESPACE.to_string()];
    let mut params: Vec<Value> = Vec::new();

    let text = text_condition(&["g.content"], &criteria.text_query, criteria.search_mode);
    clauses.push(text.sql);
    params.extend(text.params);

    if !criteria.gencom_types.is_empty() {
        let normalized: Vec<String> = criteria
            .gencom_types
            .iter()
            .map(|t| normalize_gencom_type(t))
            .collect();
        clauses.push(sql_in("g.output_type", &normalized, &mut params));
    }

    if !criteria.roles.is_empty() {
        let roles_in = sql_in("LOWER(m.role)", &lowercased(&criteria.roles), &mut params);
        clauses.push(format!(
            "(g.target_type != 'message' OR EXISTS \
             (SELECT 1 FROM messages m WHERE m.id = g.target_id AND {}))",
            roles_in
        ));
    }

    if let Some(ids) = provider_ids {
        clauses.push(provider_union_clause(ids, &mut params));
    }

    let conversation_scope = format!("{} = ?", CONVERSATION_EXPR);
    apply_common_filters(
        criteria,
        CommonFilterColumns {
            created_at: Some("g.created_at"),
            conversation_scope: Some(&conversation_scope),
        },
        &mut clauses,
        &mut params,
    );

    let where_sql = clauses.join(" AND ");
    let total = count_rows(
        conn,
        &format!("SELECT COUNT(*) {} WHERE {}", FROM, where_sql),
        &params,
    )?;

    let mut sql = format!(
        "SELECT g.id, g.target_type, g.target_id, g.output_type, g.content, g.agent_name, \
         g.created_at, g.updated_at, {} {} WHERE {} ORDER BY {}",
        CONVERSATION_EXPR,
        FROM,
        where_sql,
        order_clause(criteria.sort_by, "g.content", "g.created_at", "g.id"),
    );
    if paginate {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(criteria.limit as i64));
        params.push(Value::Integer(criteria.offset as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let results = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((results, total))
}

/// Map a requested subtype onto the stored output_type: "summary" means
/// "gencom_summary", bare "gencom" (or an already-namespaced value) is kept
fn normalize_gencom_type(requested: &str) -> String {
    if requested == "gencom" || requested.starts_with("gencom_") {
        requested.to_string()
    } else {
        format!("gencom_{}", requested)
    }
}

fn provider_union_clause(provider_ids: &[String], params: &mut Vec<Value>) -> String {
    if provider_ids.is_empty() {
        return "0=1".to_string();
    }

    let message_arm = sql_in("c.provider_id", provider_ids, params);
    let message_arm = format!(
        "(g.target_type = 'message' AND EXISTS \
         (SELECT 1 FROM messages m JOIN conversations c ON c.id = m.conversation_id \
          WHERE m.id = g.target_id AND {}))",
        message_arm
    );

    let conversation_arm = sql_in("c.provider_id", provider_ids, params);
    let conversation_arm = format!(
        "(g.target_type = 'conversation' AND EXISTS \
         (SELECT 1 FROM conversations c WHERE c.id = g.target_id AND {}))",
        conversation_arm
    );

    format!("({} OR {})", message_arm, conversation_arm)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<SearchResult> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "target_type".to_string(),
        json!(row.get::<_, String>(1)?),
    );
    metadata.insert(
        "target_id".to_string(),
        json!(row.get::<_, String>(2)?),
    );
    metadata.insert(
        "output_type".to_string(),
        json!(row.get::<_, String>(3)?),
    );
    if let Some(agent_name) = row.get::<_, Option<String>>(5)? {
        metadata.insert("agent_name".to_string(), json!(agent_name));
    }

    Ok(SearchResult {
        id: row.get(0)?,
        entity_type: EntityType::Gencom,
        content: row.get(4)?,
        relevance_score: 1.0,
        created_at: Some(from_ts(row.get(6)?)),
        updated_at: opt_from_ts(row.get(7)?),
        conversation_id: row.get(8)?,
        role: None,
        title: None,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_gencom_type() {
        assert_eq!(normalize_gencom_type("summary"), "gencom_summary");
        assert_eq!(normalize_gencom_type("gencom"), "gencom");
        assert_eq!(normalize_gencom_type("gencom_category"), "gencom_category");
    }

    #[test]
    fn test_provider_union_skips_chunk_targets() {
        let mut params = Vec::new();
        let clause = provider_union_clause(&["p1".to_string()], &mut params);

        assert!(clause.contains("g.target_type = 'message'"));
        assert!(clause.contains("g.target_type = 'conversation'"));
        assert!(!clause.contains("'chunk'"));
        // Both arms bind the id list independently
        assert_eq!(params.len(), 2);
    }
}
