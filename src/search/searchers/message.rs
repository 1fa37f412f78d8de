//! Message searcher

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

const FROM: &str = "FROM messages m JOIN conversations c ON c.id = m.conversation_id";

const COLUMNS: &str =
    "m.id, m.conversation_id, m.parent_id, m.role, m.content, m.created_at, m.updated_at, c.title";

pub fn search(
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    let mut clauses = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let text = text_condition(&["m.content"], &criteria.text_query, criteria.search_mode);
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
            created_at: Some("m.created_at"),
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
        order_clause(criteria.sort_by, "m.content", "m.created_at", "m.id"),
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
    if let Some(parent_id) = row.get::<_, Option<String>>(2)? {
        metadata.insert("parent_id".to_string(), json!(parent_id));
    }

    Ok(SearchResult {
        id: row.get(0)?,
        entity_type: EntityType::Message,
        content: row.get(4)?,
        relevance_score: 1.0,
        created_at: Some(from_ts(row.get(5)?)),
        updated_at: opt_from_ts(row.get(6)?),
        conversation_id: Some(row.get(1)?),
        role: Some(row.get(3)?),
        title: row.get(7)?,
        metadata,
    })
}
