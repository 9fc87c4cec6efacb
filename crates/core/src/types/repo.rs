use std::fmt;

use crate::error::CoreError;

const GITHUB_HOST: &str = "github.com";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<&str> for RepoId {
    type Error = CoreError;

    /// Accepts `owner/repo` or a GitHub URL, ignoring any `.git` suffix and trailing path.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let invalid = || CoreError::InvalidRepository(trimmed.to_string());
        let (path, short_form) = match strip_host(trimmed) {
            Some(path) => (path, false),
            None if trimmed.contains("://") => return Err(invalid()),
            None => (trimmed, true),
        };
        let mut segments = path.trim_start_matches('/').split('/');
        let owner = segments.next().unwrap_or_default();
        let name = segments.next().unwrap_or_default();
        if short_form && segments.next().is_some() {
            return Err(invalid());
        }
        let name = name.strip_suffix(".git").unwrap_or(name);
        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(invalid());
        }
        Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn strip_host(value: &str) -> Option<&str> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.strip_prefix(GITHUB_HOST)
        .filter(|path| path.is_empty() || path.starts_with('/'))
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
}
