use super::{FilterCriteria, Page, Searchable};

/// Whether `item` passes both the search and the category restriction
pub fn matches<T: Searchable>(item: &T, criteria: &FilterCriteria) -> bool {
    matches_term(item, criteria.search_term().as_deref()) && matches_category(item, criteria.category())
}

fn matches_term<T: Searchable>(item: &T, term: Option<&str>) -> bool {
    match term {
        None => true,
        Some(term) => item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(term)),
    }
}

fn matches_category<T: Searchable>(item: &T, category: Option<&str>) -> bool {
    match category {
        None => true,
        Some(category) => item.category_id() == Some(category),
    }
}

/// Items matching `criteria`, in input order
pub fn filter<T: Searchable + Clone>(items: &[T], criteria: &FilterCriteria) -> Vec<T> {
    let term = criteria.search_term();
    let category = criteria.category();

    items
        .iter()
        .filter(|item| matches_term(*item, term.as_deref()) && matches_category(*item, category))
        .cloned()
        .collect()
}

/// Slices out 1-based `page` of `page_size` items.
///
/// Pages past the end (and page 0) come back empty rather than failing. A
/// zero page size yields an empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let total_pages = if page_size == 0 {
        1
    } else {
        total.div_ceil(page_size).max(1)
    };

    let data = if page == 0 || page_size == 0 {
        Vec::new()
    } else {
        let start = (page - 1).saturating_mul(page_size);
        let end = start.saturating_add(page_size).min(total);
        if start >= total {
            Vec::new()
        } else {
            items[start..end].to_vec()
        }
    };

    Page {
        page,
        total_pages,
        total,
        data,
    }
}

/// Filters the full collection then returns the requested page
pub fn filter_and_paginate<T: Searchable + Clone>(
    items: &[T],
    criteria: &FilterCriteria,
    page: usize,
    page_size: usize,
) -> Page<T> {
    let filtered = filter(items, criteria);
    tracing::debug!(
        total = items.len(),
        matched = filtered.len(),
        page,
        page_size,
        "filtered collection"
    );
    paginate(&filtered, page, page_size)
}
