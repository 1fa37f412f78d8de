//! Conversation searcher
//!
//! The text condition covers the title and the serialized export metadata.

use crate::error::Result;
use crate::search::condition::text_condition;
use crate::search::criteria::{EntityType, SearchCriteria};
use crate::search::filters::{apply_common_filters, CommonFilterColumns};
use crate::search::results::SearchResult;
use crate::search::searchers::{count_rows, from_ts, opt_from_ts, order_clause, sql_in};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::json;
use std::collections::HashMap;

const FROM: &str = "FROM conversations c";

const COLUMNS: &str = "c.id, c.provider_id, c.title, c.meta, c.created_at, c.updated_at";

pub fn search(
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    let mut clauses = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let text = text_condition(
        &["c.title", "c.meta"],
        &criteria.text_query,
        criteria.search_mode,
    );
    clauses.push(text.sql);
    params.extend(text.params);

    if let Some(ids) = provider_ids {
        clauses.push(sql_in("c.provider_id", ids, &mut params));
    }

    apply_common_filters(
        criteria,
        CommonFilterColumns {
            created_at: Some("c.created_at"),
            conversation_scope: Some("c.id = ?"),
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
        order_clause(criteria.sort_by, "c.title", "c.created_at", "c.id"),
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
    let id: String = row.get(0)?;
    let title: String = row.get(2)?;

    let mut metadata = HashMap::new();
    metadata.insert(
        "provider_id".to_string(),
        json!(row.get::<_, String>(1)?),
    );
    if let Some(meta) = row.get::<_, Option<String>>(3)? {
        metadata.insert("meta".to_string(), json!(meta));
    }

    Ok(SearchResult {
        id: id.clone(),
        entity_type: EntityType::Conversation,
        content: title.clone(),
        relevance_score: 1.0,
        created_at: Some(from_ts(row.get(4)?)),
        updated_at: opt_from_ts(row.get(5)?),
        conversation_id: Some(id),
        role: None,
        title: Some(title),
        metadata,
    })
}
