//! Repository identifiers
//!
//! Accepts the forms users paste: `owner/repo`, `https://github.com/owner/repo`,
//! `https://github.com/owner/repo.git`, `git@github.com:owner/repo.git`, and
//! browser URLs with trailing segments such as `/tree/main`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

static NAME_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"));

/// Owner and name of a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// User or organisation login
    pub owner: String,
    /// Repository name without `.git`
    pub name: String,
}

impl RepoId {
    /// Create from already-split parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        let input = format!("{owner}/{name}");
        validate_segment(&input, &owner, "owner")?;
        validate_segment(&input, &name, "repository name")?;
        Ok(Self { owner, name })
    }

    /// Parse any supported repository identifier
    pub fn parse(input: &str) -> Result<Self> {
        let segments = path_segments(input)?;
        match segments.as_slice() {
            [owner, name, ..] => {
                let name = name.strip_suffix(".git").unwrap_or(name);
                if name.is_empty() {
                    return Err(Error::invalid_repo(input, "repository name is empty"));
                }
                validate_segment(input, owner, "owner")?;
                validate_segment(input, name, "repository name")?;
                Ok(Self {
                    owner: owner.clone(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::invalid_repo(input, "expected owner/repository")),
        }
    }

    /// `/repos/{owner}/{name}`
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

/// Extract only the owner (user or organisation) from an identifier.
///
/// Works for bare logins, profile URLs and repository URLs alike.
pub fn parse_owner(input: &str) -> Result<String> {
    let segments = path_segments(input)?;
    let owner = segments
        .first()
        .ok_or_else(|| Error::invalid_repo(input, "no owner found"))?;
    validate_segment(input, owner, "owner")?;
    Ok(owner.clone())
}

fn path_segments(input: &str) -> Result<Vec<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_repo(input, "identifier is empty"));
    }

    let path = if let Some(rest) = trimmed.strip_prefix("git@") {
        rest.split_once(':')
            .map(|(_, path)| path.to_string())
            .ok_or_else(|| Error::invalid_repo(input, "SSH remote has no path"))?
    } else if trimmed.contains("://") {
        let url = Url::parse(trimmed).map_err(|e| Error::invalid_repo(input, e.to_string()))?;
        url.path().to_string()
    } else {
        trimmed.to_string()
    };

    Ok(path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

fn validate_segment(input: &str, segment: &str, what: &str) -> Result<()> {
    if segment == "." || segment == ".." || !NAME_SEGMENT.is_match(segment) {
        return Err(Error::invalid_repo(
            input,
            format!("invalid {what} '{segment}'"),
        ));
    }
    Ok(())
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
