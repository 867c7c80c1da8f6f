//! Pagination module
//!
//! Discovers how many pages a collection has from the `Link` header of a
//! probe response, fetches every page and merges them in page order.
//!
//! # Overview
//!
//! ```text
//! probe (page 1) ──► Link header ──► parse_page_count ──► PageCount
//!                                                            │
//!     PageOrchestrator ◄─────────────────────────────────────┘
//!        │  pages 2..=N, concurrently
//!        ▼
//!     PageFetcher ──► Page ──► MergedCollection (ascending page order)
//! ```

mod fetcher;
mod link;
mod orchestrator;
mod types;

pub use fetcher::{decode_object, decode_page, PageFetcher, ProbedPage};
pub use link::{last_page_url, parse_link_header, parse_page_count, LinkRelation};
pub use orchestrator::{PageOrchestrator, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES};
pub use types::{MergedCollection, Page, PageCount, PageSource, PaginationCursor};

#[cfg(test)]
mod tests;
