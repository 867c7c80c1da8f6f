//! Pagination data model
//!
//! Values here are created once per retrieval and never mutated afterwards.

use crate::http::RawResponse;
use crate::types::{envelope, Record, ResourceKind};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU32;
use std::ops::RangeInclusive;

/// Raw `Link` header value captured from a probe response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    header_value: String,
}

impl PaginationCursor {
    /// Wrap a header value
    pub fn new(header_value: impl Into<String>) -> Self {
        Self {
            header_value: header_value.into(),
        }
    }

    /// Capture the `Link` header of a response.
    ///
    /// Repeated `Link` headers are joined; a blank header counts as absent.
    pub fn from_response(response: &RawResponse) -> Option<Self> {
        response
            .joined_header("link")
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
    }

    /// The raw header value
    pub fn as_str(&self) -> &str {
        &self.header_value
    }
}

/// Total number of pages in a collection; always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageCount(NonZeroU32);

impl PageCount {
    /// A collection that fits on one page
    pub const SINGLE: Self = Self(NonZeroU32::MIN);

    /// Returns `None` for zero
    pub fn new(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(Self)
    }

    /// Number of pages
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// 1-based page indices `1..=count`
    pub fn indices(self) -> RangeInclusive<u32> {
        1..=self.get()
    }
}

impl Default for PageCount {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fetched page of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page index
    pub index: u32,
    /// Records in the order the server returned them
    pub items: Vec<Record>,
}

impl Page {
    /// Create a page
    pub fn new(index: u32, items: Vec<Record>) -> Self {
        Self { index, items }
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// All pages of a collection concatenated in ascending page order
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCollection {
    items: Vec<Record>,
    page_count: PageCount,
}

impl MergedCollection {
    /// Concatenate pages. `pages` must already be sorted by index.
    pub(crate) fn from_ordered_pages(pages: Vec<Page>, page_count: PageCount) -> Self {
        let total = pages.iter().map(Page::len).sum();
        let mut items = Vec::with_capacity(total);
        for page in pages {
            items.extend(page.items);
        }
        Self { items, page_count }
    }

    /// Merged records
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Number of pages the collection was assembled from
    pub fn page_count(&self) -> PageCount {
        self.page_count
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the records
    pub fn into_items(self) -> Vec<Record> {
        self.items
    }

    /// Wrap in the `{ "<kind>": [...] }` envelope
    pub fn into_envelope(self, kind: ResourceKind) -> Value {
        envelope(kind, self.items)
    }
}

/// Anything that can produce one page of a collection.
///
/// [`super::PageFetcher`] is the network implementation; tests substitute
/// in-memory sources.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch page `page_index` of `uri` with `page_size` records per page
    async fn fetch_page(&self, uri: &str, page_index: u32, page_size: u32)
        -> crate::Result<Page>;
}
