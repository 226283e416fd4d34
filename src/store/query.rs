//! In-memory filtering, sorting and pagination over a loaded collection.
//!
//! This is a full-table scan by design: collections are bounded by one
//! organization's document volume, not internet scale. Ownership/visibility
//! filtering is a caller-supplied predicate applied before pagination, not
//! stored state.

use crate::model::{DocumentPayload, Record};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Case-insensitive substring match over number, creator and the
    /// payload's searchable fields.
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort: SortKey,
    pub order: SortOrder,
    /// 1-based page index.
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            created_from: None,
            created_to: None,
            sort: SortKey::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            per_page: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

fn matches_search<P: DocumentPayload>(record: &Record<P>, needle: &str) -> bool {
    if record.number.to_lowercase().contains(needle) {
        return true;
    }
    if record.created_by.to_lowercase().contains(needle) {
        return true;
    }
    record
        .payload
        .search_texts()
        .iter()
        .any(|text| text.to_lowercase().contains(needle))
}

/// Apply visibility predicate, filters, sort and pagination, in that order.
pub fn select<P, F>(records: Vec<Record<P>>, query: &ListQuery, visible: F) -> Page<Record<P>>
where
    P: DocumentPayload,
    F: Fn(&Record<P>) -> bool,
{
    let needle = query.search.as_deref().map(str::to_lowercase);

    let mut hits: Vec<Record<P>> = records
        .into_iter()
        .filter(|record| visible(record))
        .filter(|record| match query.created_from {
            Some(from) => record.created_at >= from,
            None => true,
        })
        .filter(|record| match query.created_to {
            Some(to) => record.created_at <= to,
            None => true,
        })
        .filter(|record| match &needle {
            Some(needle) => matches_search(record, needle),
            None => true,
        })
        .collect();

    hits.sort_by(|a, b| {
        // Fixed-width zero padding makes the lexicographic number order
        // match numeric order.
        let ordering = match query.sort {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Number => a.number.cmp(&b.number),
        };
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = hits.len();
    let per_page = query.per_page.max(1);
    let pages = total.div_ceil(per_page).max(1);
    let page = query.page.clamp(1, pages);
    let start = (page - 1) * per_page;
    let items: Vec<Record<P>> = hits
        .into_iter()
        .skip(start)
        .take(per_page)
        .collect();

    Page {
        items,
        total,
        page,
        pages,
    }
}
