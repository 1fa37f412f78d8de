//! Chunk searcher
//!
//! Role and provider filters reach through the owning message (and its
//! conversation for the provider).

use crate::error::Result;
use crate::search::condition::text_condition;
use crate::search::criteria::{EntityType, SearchCriteria};
use crate::search::filters::{apply_common_filters, CommonFilterColumns};
use crate::search::results::SearchResult;
use crate::search::searchers::{count_rows, from_ts, lowercased, order_clause, sql_in};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::json;
use std::collections::HashMap;

const FROM: &str = "FROM chunks ch \
     JOIN messages m ON m.id = ch.message_id \
     JOIN conversations c ON c.id = m.conversation_id";

const COLUMNS: &str =
    "ch.id, ch.message_id, ch.position, ch.content, ch.created_at, m.conversation_id, m.role";

pub fn search(
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    let mut clauses = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let text = text_condition(&["ch.content"], &criteria.text_query, criteria.search_mode);
    clauses.push(text.sql);
    params.extend(text.params);

    if !criteria.roles.is_empty() {
        clauses.push(sql_in(
            "LOWER(m.role)",
            &lowercased(&criteria.roles),
            &mut params,
        ));
    }

    if let Some(ids) = provider_ids {
        clauses.push(sql_in("c.provider_id", ids, &mut params));
    }

    apply_common_filters(
        criteria,
        CommonFilterColumns {
            created_at: Some("ch.created_at"),
            conversation_scope: Some("m.conversation_id = ?"),
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
        "SELECT {} {} WHERE {} ORDER BY {}",
        COLUMNS,
        FROM,
        where_sql,
        order_clause(criteria.sort_by, "ch.content", "ch.created_at", "ch.id"),
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

fn map_row(row: &Row<'_>) -> rusqlite::Result<SearchResult> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "message_id".to_string(),
        json!(row.get::<_, String>(1)?),
    );
    if let Some(position) = row.get::<_, Option<i64>>(2)? {
        metadata.insert("position".to_string(), json!(position));
    }

    Ok(SearchResult {
        id: row.get(0)?,
        entity_type: EntityType::Chunk,
        content: row.get(3)?,
        relevance_score: 1.0,
        created_at: Some(from_ts(row.get(4)?)),
        updated_at: None,
        conversation_id: Some(row.get(5)?),
        role: Some(row.get(6)?),
        title: None,
        metadata,
    })
}
