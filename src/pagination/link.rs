//! `Link` header parsing (RFC 8288)
//!
//! Format: `<https://api.github.com/...?page=2>; rel="next", <...?page=5>; rel="last"`

use super::types::PageCount;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `<url>` followed by its parameters up to the next element
static ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?P<url>[^>]*)>(?P<params>[^<]*)").expect("valid regex"));

/// `rel=next`, `rel="next"` or `rel="prev last"`
static REL_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i);\s*rel\s*=\s*(?:"(?P<quoted>[^"]*)"|(?P<bare>[^;,\s]+))"#)
        .expect("valid regex")
});

/// `page=<n>` as a query parameter (not `per_page`)
static PAGE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]page=(?P<page>[^&#]*)").expect("valid regex"));

/// One element of a `Link` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    /// Target URL
    pub url: String,
    /// Relation types, lower-cased (`next`, `last`, ...)
    pub rels: Vec<String>,
    /// Raw value of the URL's `page` query parameter
    pub page: Option<String>,
}

impl LinkRelation {
    /// Whether this element carries the given relation
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }

    /// The `page` parameter as a positive integer
    pub fn page_number(&self) -> Option<u32> {
        self.page
            .as_deref()
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p > 0)
    }
}

/// Split a `Link` header into its elements
pub fn parse_link_header(header: &str) -> Vec<LinkRelation> {
    ELEMENT
        .captures_iter(header)
        .map(|caps| {
            let url = caps["url"].trim().to_string();
            let params = &caps["params"];
            let rels = REL_PARAM
                .captures_iter(params)
                .filter_map(|rel| rel.name("quoted").or_else(|| rel.name("bare")))
                .flat_map(|m| {
                    m.as_str()
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect::<Vec<_>>()
                })
                .collect();
            let page = PAGE_PARAM
                .captures(&url)
                .map(|p| p["page"].to_string());
            LinkRelation { url, rels, page }
        })
        .collect()
}

/// Find the `rel="last"` element of a header
fn last_relation(header: &str) -> Result<LinkRelation> {
    parse_link_header(header)
        .into_iter()
        .find(|link| link.has_rel("last"))
        .ok_or_else(|| Error::link_parse(header, "no element with rel=\"last\""))
}

/// Number of pages announced by a `Link` header.
///
/// No header means the collection fits on one page. A header without a
/// usable `rel="last"` page number is an error: the page count is never
/// guessed.
pub fn parse_page_count(header: Option<&str>) -> Result<PageCount> {
    let Some(header) = header else {
        return Ok(PageCount::SINGLE);
    };

    let last = last_relation(header)?;
    let page = last.page_number().ok_or_else(|| {
        Error::link_parse(
            header,
            format!("rel=\"last\" URL '{}' has no positive page parameter", last.url),
        )
    })?;

    PageCount::new(page).ok_or_else(|| Error::link_parse(header, "page count is zero"))
}

/// URL of the last page
pub fn last_page_url(header: &str) -> Result<String> {
    let last = last_relation(header)?;
    if last.url.is_empty() {
        return Err(Error::link_parse(header, "rel=\"last\" URL is empty"));
    }
    Ok(last.url)
}
