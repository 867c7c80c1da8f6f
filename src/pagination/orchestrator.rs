//! Multi-page retrieval
//!
//! Fans out one fetch per page with bounded concurrency and merges the pages
//! in page order. A single failed page fails the whole retrieval: no further
//! pages are requested, fetches already in flight settle, and the failure
//! with the lowest page index is returned.

use super::types::{MergedCollection, Page, PageCount, PageSource};
use crate::error::{Error, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// Default number of page requests in flight for one retrieval
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default upper bound on the page count a retrieval accepts
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Fetches pages `1..=N` from a [`PageSource`] and merges them
#[derive(Debug, Clone)]
pub struct PageOrchestrator<S> {
    source: S,
    max_concurrency: usize,
    max_pages: u32,
}

impl<S: PageSource> PageOrchestrator<S> {
    /// Create an orchestrator over a page source
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Bound the number of concurrent page fetches (minimum 1)
    #[must_use]
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Refuse collections with more than `max_pages` pages (minimum 1)
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// The underlying page source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every page `1..=page_count` and merge them
    pub async fn retrieve_all<F>(
        &self,
        uri_for_page: F,
        page_count: PageCount,
        page_size: u32,
    ) -> Result<MergedCollection>
    where
        F: Fn(u32) -> String,
    {
        self.check_page_limit(page_count)?;
        let pages = self
            .fetch_range(&uri_for_page, page_count.indices(), page_size)
            .await?;
        Ok(MergedCollection::from_ordered_pages(pages, page_count))
    }

    /// Merge an already fetched first page with pages `2..=page_count`.
    ///
    /// Used when page 1 doubled as the probe request, so it is never fetched
    /// twice.
    pub async fn retrieve_remaining<F>(
        &self,
        first_page: Page,
        uri_for_page: F,
        page_count: PageCount,
        page_size: u32,
    ) -> Result<MergedCollection>
    where
        F: Fn(u32) -> String,
    {
        if first_page.index != 1 {
            return Err(Error::Other(format!(
                "first page has index {}, expected 1",
                first_page.index
            )));
        }
        self.check_page_limit(page_count)?;

        let mut pages = vec![first_page];
        if page_count.get() > 1 {
            let rest = self
                .fetch_range(&uri_for_page, 2..=page_count.get(), page_size)
                .await?;
            pages.extend(rest);
        }
        Ok(MergedCollection::from_ordered_pages(pages, page_count))
    }

    fn check_page_limit(&self, page_count: PageCount) -> Result<()> {
        if page_count.get() > self.max_pages {
            return Err(Error::PageLimitExceeded {
                page_count: page_count.get(),
                max_pages: self.max_pages,
            });
        }
        Ok(())
    }

    /// Fetch a range of pages, returning them sorted by index.
    ///
    /// Pages are started in ascending order. Once a fetch fails no new page is
    /// started, so every page below the failing one has already been started
    /// and the lowest failing index is the same on every run.
    async fn fetch_range<F>(
        &self,
        uri_for_page: &F,
        indices: RangeInclusive<u32>,
        page_size: u32,
    ) -> Result<Vec<Page>>
    where
        F: Fn(u32) -> String,
    {
        let fetch = |index: u32| {
            let uri = uri_for_page(index);
            async move {
                let result = self.source.fetch_page(&uri, index, page_size).await;
                (index, result)
            }
        };

        let mut pending = indices;
        let mut in_flight: FuturesUnordered<_> = pending
            .by_ref()
            .take(self.max_concurrency)
            .map(&fetch)
            .collect();

        let mut pages = BTreeMap::new();
        let mut first_failure: Option<(u32, Error)> = None;

        while let Some((index, result)) = in_flight.next().await {
            match result {
                Ok(page) => {
                    debug!(page = index, records = page.len(), "Page fetched");
                    pages.insert(index, page);
                }
                Err(e) => {
                    warn!(page = index, error = %e, "Page fetch failed");
                    if first_failure.as_ref().map_or(true, |(i, _)| index < *i) {
                        first_failure = Some((index, e));
                    }
                }
            }

            if first_failure.is_none() {
                if let Some(next) = pending.next() {
                    in_flight.push(fetch(next));
                }
            }
        }

        match first_failure {
            Some((_, e)) => Err(e),
            None => Ok(pages.into_values().collect()),
        }
    }
}
