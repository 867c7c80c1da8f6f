//! Common types used throughout the crate

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Records
// ============================================================================

/// A single remote record: field name to JSON value.
///
/// Shape is checked once when a page body is decoded; past that point
/// records are carried around untouched.
pub type Record = Map<String, Value>;

// ============================================================================
// Resource Kind
// ============================================================================

/// Kind of collection exposed by a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Commit history
    Commits,
    /// Contributors (including anonymous ones)
    Contributors,
    /// Top-level repository contents
    Contents,
    /// Repositories of an organisation
    Repositories,
}

impl ResourceKind {
    /// Key used for the caller-facing envelope, e.g. `{"contributors": [...]}`
    pub fn envelope_key(self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::Contributors => "contributors",
            Self::Contents => "contents",
            Self::Repositories => "repositories",
        }
    }

    /// Path segment below `/repos/{owner}/{repo}`
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::Contributors => "contributors",
            Self::Contents => "contents",
            Self::Repositories => "repos",
        }
    }

    /// Extra query parameters the remote expects for this collection
    pub fn extra_query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Contributors => &[("anon", "1")],
            _ => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.envelope_key())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "commits" => Ok(Self::Commits),
            "contributors" => Ok(Self::Contributors),
            "contents" => Ok(Self::Contents),
            "repositories" | "repos" => Ok(Self::Repositories),
            other => Err(crate::Error::config(format!(
                "Unknown resource kind: {other}"
            ))),
        }
    }
}

/// Wrap records in the `{ "<kind>": [...] }` envelope
pub fn envelope(kind: ResourceKind, items: Vec<Record>) -> Value {
    let array = items.into_iter().map(Value::Object).collect();
    let mut map = Map::with_capacity(1);
    map.insert(kind.envelope_key().to_string(), Value::Array(array));
    Value::Object(map)
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_keys() {
        assert_eq!(ResourceKind::Commits.envelope_key(), "commits");
        assert_eq!(ResourceKind::Contributors.envelope_key(), "contributors");
        assert_eq!(ResourceKind::Contents.envelope_key(), "contents");
        assert_eq!(ResourceKind::Repositories.envelope_key(), "repositories");
    }

    #[test]
    fn test_resource_kind_from_str() {
        assert_eq!(
            "Contributors".parse::<ResourceKind>().unwrap(),
            ResourceKind::Contributors
        );
        assert_eq!(
            "repos".parse::<ResourceKind>().unwrap(),
            ResourceKind::Repositories
        );
        assert!("issues".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_envelope_preserves_order() {
        let items: Vec<Record> = (1..=3)
            .map(|i| json!({ "id": i }).as_object().cloned().unwrap())
            .collect();

        let wrapped = envelope(ResourceKind::Commits, items);
        assert_eq!(wrapped, json!({ "commits": [{"id": 1}, {"id": 2}, {"id": 3}] }));
    }

    #[test]
    fn test_contributors_request_anonymous() {
        assert_eq!(ResourceKind::Contributors.extra_query(), &[("anon", "1")]);
        assert!(ResourceKind::Commits.extra_query().is_empty());
    }
}
