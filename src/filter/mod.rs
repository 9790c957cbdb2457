//! In-memory search and pagination over fetched entity collections.
//!
//! Every view is recomputed from the full collection: `filter` then
//! `paginate`. Nothing is cached between calls, so the same inputs always
//! produce the same page.

pub mod engine;
pub mod page;

pub use engine::{filter, filter_and_paginate, matches, paginate};
pub use page::{Listing, Page};

use serde::{Deserialize, Serialize};

/// Entities the engine can search
pub trait Searchable {
    /// Text fields checked by the search term. Any one match is enough.
    fn search_fields(&self) -> Vec<&str>;

    /// Category the entity belongs to, if it belongs to one
    fn category_id(&self) -> Option<&str> {
        None
    }
}

/// Search text plus optional category restriction, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl FilterCriteria {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            category_id: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Lower-cased trimmed search term, or `None` when it matches everything
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        if term.is_empty() {
            None
        } else {
            Some(term.to_lowercase())
        }
    }

    /// Category to restrict to, or `None` when blank
    pub fn category(&self) -> Option<&str> {
        self.category_id.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}
