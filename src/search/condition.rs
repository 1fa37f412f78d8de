//! Text-condition builder
//!
//! Translates (text columns, query string, search mode) into a parameterized
//! SQL predicate. Values are always bound, never interpolated.

use crate::search::criteria::SearchMode;
use regex::Regex;
use rusqlite::types::Value;

/// A WHERE-clause fragment plus its bound parameters
#[derive(Debug, Clone)]
pub struct SqlCondition {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlCondition {
    /// Predicate that matches every row
    pub fn all() -> Self {
        Self {
            sql: "1=1".to_string(),
            params: Vec::new(),
        }
    }

    /// Predicate that matches no row
    pub fn none() -> Self {
        Self {
            sql: "0=1".to_string(),
            params: Vec::new(),
        }
    }
}

/// Escape LIKE wildcards and wrap the term for a "contains" match
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if c == '\\' || c == '%' || c == '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring test of `term` against one column.
/// SQLite LIKE is case-insensitive for ASCII, matching the archive content.
fn contains(column: &str, term: &str, params: &mut Vec<Value>) -> String {
    params.push(Value::Text(like_pattern(term)));
    format!("{} LIKE ? ESCAPE '\\'", column)
}

/// Build the text predicate for one entity's designated text columns.
///
/// Multiple columns are ORed (a match in any column is a match). An empty or
/// whitespace-only query yields a match-everything predicate: the text filter
/// is a no-op, never an error and never a filter that matches nothing.
pub fn text_condition(columns: &[&str], query: &str, mode: SearchMode) -> SqlCondition {
    if query.trim().is_empty() {
        return SqlCondition::all();
    }

    match mode {
        SearchMode::Substring => substring_condition(columns, query),
        SearchMode::Exact => exact_condition(columns, query),
        SearchMode::AnyWord => word_condition(columns, query, " OR "),
        SearchMode::AllWords => word_condition(columns, query, " AND "),
        SearchMode::Regex => regex_condition(columns, query),
    }
}

fn substring_condition(columns: &[&str], query: &str) -> SqlCondition {
    let mut params = Vec::new();
    let per_column: Vec<String> = columns
        .iter()
        .map(|col| contains(col, query, &mut params))
        .collect();
    SqlCondition {
        sql: format!("({})", per_column.join(" OR ")),
        params,
    }
}

fn exact_condition(columns: &[&str], query: &str) -> SqlCondition {
    let mut params = Vec::new();
    let per_column: Vec<String> = columns
        .iter()
        .map(|col| {
            params.push(Value::Text(query.to_string()));
            format!("{} = ?", col)
        })
        .collect();
    SqlCondition {
        sql: format!("({})", per_column.join(" OR ")),
        params,
    }
}

/// ANY_WORD joins per-word substring tests with OR, ALL_WORDS with AND
/// (order-independent conjunction). An empty word list after splitting falls
/// back to a plain substring test of the whole query.
fn word_condition(columns: &[&str], query: &str, joiner: &str) -> SqlCondition {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return substring_condition(columns, query);
    }

    let mut params = Vec::new();
    let per_column: Vec<String> = columns
        .iter()
        .map(|col| {
            let per_word: Vec<String> = words
                .iter()
                .map(|word| contains(col, word, &mut params))
                .collect();
            format!("({})", per_word.join(joiner))
        })
        .collect();
    SqlCondition {
        sql: format!("({})", per_column.join(" OR ")),
        params,
    }
}

/// The pattern is validated here, under the same `(?i)` prefix the backend
/// REGEXP function applies. A malformed pattern yields zero matches for the
/// text filter instead of raising past the searcher boundary.
fn regex_condition(columns: &[&str], query: &str) -> SqlCondition {
    if let Err(e) = Regex::new(&format!("(?i){}", query)) {
        tracing::warn!("Malformed regex pattern in text query, matching nothing: {}", e);
        return SqlCondition::none();
    }

    let mut params = Vec::new();
    let per_column: Vec<String> = columns
        .iter()
        .map(|col| {
            params.push(Value::Text(query.to_string()));
            format!("{} REGEXP ?", col)
        })
        .collect();
    SqlCondition {
        sql: format!("({})", per_column.join(" OR ")),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }

    #[test]
    fn test_empty_query_matches_everything() {
        for mode in [
            SearchMode::Substring,
            SearchMode::Exact,
            SearchMode::AnyWord,
            SearchMode::AllWords,
            SearchMode::Regex,
        ] {
            let condition = text_condition(&["content"], "   ", mode);
            assert_eq!(condition.sql, "1=1");
            assert!(condition.params.is_empty());
        }
    }

    #[test]
    fn test_substring_shape() {
        let condition = text_condition(&["content"], "alpha beta", SearchMode::Substring);
        assert_eq!(condition.sql, "(content LIKE ? ESCAPE '\\')");
        assert_eq!(condition.params.len(), 1);
    }

    #[test]
    fn test_multiple_columns_are_ored() {
        let condition = text_condition(&["title", "meta"], "alpha", SearchMode::Substring);
        assert_eq!(
            condition.sql,
            "(title LIKE ? ESCAPE '\\' OR meta LIKE ? ESCAPE '\\')"
        );
        assert_eq!(condition.params.len(), 2);
    }

    #[test]
    fn test_exact_shape() {
        let condition = text_condition(&["content"], "alpha beta", SearchMode::Exact);
        assert_eq!(condition.sql, "(content = ?)");
        assert_eq!(
            condition.params,
            vec![Value::Text("alpha beta".to_string())]
        );
    }

    #[test]
    fn test_any_word_ors_per_word() {
        let condition = text_condition(&["content"], "alpha beta", SearchMode::AnyWord);
        assert_eq!(
            condition.sql,
            "((content LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\'))"
        );
        assert_eq!(condition.params.len(), 2);
    }

    #[test]
    fn test_all_words_ands_per_word() {
        let condition = text_condition(&["content"], "alpha beta", SearchMode::AllWords);
        assert_eq!(
            condition.sql,
            "((content LIKE ? ESCAPE '\\' AND content LIKE ? ESCAPE '\\'))"
        );
        assert_eq!(condition.params.len(), 2);
    }

    #[test]
    fn test_regex_shape() {
        let condition = text_condition(&["content"], "al.ha", SearchMode::Regex);
        assert_eq!(condition.sql, "(content REGEXP ?)");
        assert_eq!(condition.params, vec![Value::Text("al.ha".to_string())]);
    }

    #[test]
    fn test_malformed_regex_matches_nothing() {
        let condition = text_condition(&["content"], "([unclosed", SearchMode::Regex);
        assert_eq!(condition.sql, "0=1");
        assert!(condition.params.is_empty());
    }
}
