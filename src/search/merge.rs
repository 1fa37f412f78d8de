//! Result merger / paginator
//!
//! Pure function over the concatenated per-entity result lists: globally
//! re-sort with the same ordering the searchers used in SQL, then slice
//! `[offset, offset + limit)`. No re-querying.

use crate::search::criteria::SortOrder;
use crate::search::results::SearchResult;
use std::cmp::Ordering;

/// Comparator matching the searchers' ORDER BY clauses exactly: rows without
/// a creation timestamp sort last under both date directions, alpha sorts
/// compare the content field case-insensitively, and ties break on id so
/// repeated searches return identical orderings.
pub fn compare_results(a: &SearchResult, b: &SearchResult, sort: SortOrder) -> Ordering {
    let ordering = match sort {
        SortOrder::DateDesc | SortOrder::DateAsc => {
            match (a.created_at, b.created_at) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    if sort == SortOrder::DateDesc {
                        y.cmp(&x)
                    } else {
                        x.cmp(&y)
                    }
                }
            }
        }
        SortOrder::AlphaAsc => a.content.to_lowercase().cmp(&b.content.to_lowercase()),
        SortOrder::AlphaDesc => b.content.to_lowercase().cmp(&a.content.to_lowercase()),
    };

    ordering.then_with(|| a.id.cmp(&b.id))
}

/// Merge already-sorted per-entity result sets into one globally sorted,
/// paginated sequence
pub fn merge_results(
    mut results: Vec<SearchResult>,
    sort: SortOrder,
    offset: usize,
    limit: usize,
) -> Vec<SearchResult> {
    results.sort_by(|a, b| compare_results(a, b, sort));
    results.into_iter().skip(offset).take(limit).collect()
}
