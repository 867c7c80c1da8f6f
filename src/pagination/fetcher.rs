//! Fetching one page of a collection over HTTP

use super::types::{Page, PageSource, PaginationCursor};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RawResponse, RequestConfig};
use crate::types::Record;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// A page together with the pagination header of its response
#[derive(Debug, Clone)]
pub struct ProbedPage {
    /// The decoded page
    pub page: Page,
    /// `Link` header, if the server sent one
    pub cursor: Option<PaginationCursor>,
}

/// Issues one GET per page through the shared [`HttpClient`].
///
/// Transport failures come back as [`Error::PageFetch`] tagged with the page
/// index; bodies that are not an array of objects come back as
/// [`Error::MalformedResponse`].
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: HttpClient,
    query: Vec<(String, String)>,
}

impl PageFetcher {
    /// Create a fetcher over the given client
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            query: Vec::new(),
        }
    }

    /// Add a query parameter sent with every page request
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Fetch a page and keep its `Link` header
    pub async fn fetch_probe(&self, uri: &str, page_index: u32, page_size: u32) -> Result<ProbedPage> {
        let response = self.get(uri, page_index, page_size).await?;
        let cursor = PaginationCursor::from_response(&response);
        let page = decode_page(page_index, &response.body)?;
        Ok(ProbedPage { page, cursor })
    }

    async fn get(&self, uri: &str, page_index: u32, page_size: u32) -> Result<RawResponse> {
        let mut config = RequestConfig::new()
            .query("page", page_index.to_string())
            .query("per_page", page_size.to_string());
        config.query.extend(self.query.iter().cloned());

        debug!(page = page_index, per_page = page_size, "Fetching page");
        self.client
            .execute_get_with_config(uri, config)
            .await
            .map_err(|e| Error::page_fetch(page_index, e))
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self, uri: &str, page_index: u32, page_size: u32) -> Result<Page> {
        let response = self.get(uri, page_index, page_size).await?;
        decode_page(page_index, &response.body)
    }
}

/// Decode a page body: a JSON array whose elements are all objects
pub fn decode_page(page_index: u32, body: &str) -> Result<Page> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        Error::malformed(Some(page_index), format!("body is not valid JSON: {e}"))
    })?;

    let Value::Array(elements) = value else {
        return Err(Error::malformed(
            Some(page_index),
            format!("expected a JSON array, got {}", json_kind(&value)),
        ));
    };

    let items = elements
        .into_iter()
        .enumerate()
        .map(|(position, element)| match element {
            Value::Object(record) => Ok(record),
            other => Err(Error::malformed(
                Some(page_index),
                format!("element {position} is {}, expected an object", json_kind(&other)),
            )),
        })
        .collect::<Result<Vec<Record>>>()?;

    Ok(Page::new(page_index, items))
}

/// Decode a single JSON object body
pub fn decode_object(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::malformed(None, format!("body is not valid JSON: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(Error::malformed(
            None,
            format!("expected a JSON object, got {}", json_kind(&value)),
        ))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
