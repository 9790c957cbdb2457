use serde::{Deserialize, Serialize};

/// One page of a collection plus the metadata needed to page through it.
///
/// This is the only list shape the portal works with past the API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// A whole collection presented as a single page
    pub fn single(data: Vec<T>) -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total: data.len(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total: self.total,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// List responses as the backend sends them: a flat array or an envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Flat(Vec<T>),
    Envelope {
        data: Vec<T>,
        #[serde(default)]
        page: Option<usize>,
        #[serde(default)]
        total: Option<usize>,
        #[serde(default, rename = "totalPages")]
        total_pages: Option<usize>,
    },
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Flat(data) => Page::single(data),
            Listing::Envelope {
                data,
                page,
                total,
                total_pages,
            } => {
                let total = total.unwrap_or(data.len());
                Page {
                    page: page.unwrap_or(1),
                    total_pages: total_pages.unwrap_or(1).max(1),
                    total,
                    data,
                }
            }
        }
    }
}
