//! Media searcher
//!
//! Role, provider, and conversation filters all reach through the
//! message_media association; media with no message association cannot
//! match any of them.

use crate::error::Result;
use crate::search::condition::text_condition;
use crate::search::criteria::{EntityType, SearchCriteria};
use crate::search::filters::{apply_common_filters, CommonFilterColumns};
use crate::search::results::SearchResult;
use crate::search::searchers::{count_rows, lowercased, opt_from_ts, order_clause, sql_in};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::json;
use std::collections::HashMap;

const FROM: &str = "FROM media md";

const COLUMNS: &str =
    "md.id, md.file_path, md.media_type, md.description, md.file_size, md.created_at";

const CONVERSATION_SCOPE: &str = "EXISTS (SELECT 1 FROM message_media mm \
     JOIN messages m ON m.id = mm.message_id \
     WHERE mm.media_id = md.id AND m.conversation_id = ?)";

pub fn search(
    conn: &Connection,
    criteria: &SearchCriteria,
    provider_ids: Option<&[String]>,
    paginate: bool,
) -> Result<(Vec<SearchResult>, usize)> {
    let mut clauses = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    let text = text_condition(
        &["md.file_path", "md.media_type", "md.description"],
        &criteria.text_query,
        criteria.search_mode,
    );
    clauses.push(text.sql);
    params.extend(text.params);

    if !criteria.roles.is_empty() {
        let roles_in = sql_in("LOWER(m.role)", &lowercased(&criteria.roles), &mut params);
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM message_media mm \
             JOIN messages m ON m.id = mm.message_id \
             WHERE mm.media_id = md.id AND {})",
            roles_in
        ));
    }

    if let Some(ids) = provider_ids {
        let providers_in = sql_in("c.provider_id", ids, &mut params);
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM message_media mm \
             JOIN messages m ON m.id = mm.message_id \
             JOIN conversations c ON c.id = m.conversation_id \
             WHERE mm.media_id = md.id AND {})",
            providers_in
        ));
    }

    apply_common_filters(
        criteria,
        CommonFilterColumns {
            created_at: Some("md.created_at"),
            conversation_scope: Some(CONVERSATION_SCOPE),
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
        order_clause(criteria.sort_by, "md.file_path", "md.created_at", "md.id"),
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
    if let Some(media_type) = row.get::<_, Option<String>>(2)? {
        metadata.insert("media_type".to_string(), json!(media_type));
    }
    if let Some(description) = row.get::<_, Option<String>>(3)? {
        metadata.insert("description".to_string(), json!(description));
    }
    if let Some(file_size) = row.get::<_, Option<i64>>(4)? {
        metadata.insert("file_size".to_string(), json!(file_size));
    }

    Ok(SearchResult {
        id: row.get(0)?,
        entity_type: EntityType::Media,
        content: row.get(1)?,
        relevance_score: 1.0,
        created_at: opt_from_ts(row.get(5)?),
        updated_at: None,
        conversation_id: None,
        role: None,
        title: None,
        metadata,
    })
}
