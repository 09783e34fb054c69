use crate::error::{ContextError, Result};
use std::fmt;

pub const ROOT_KEY: &str = ".";

/// Relative directory path addressing one context document.
///
/// Either `.` (the project root) or a `/`-separated relative path with no
/// leading/trailing slash and no `.`/`..`/empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectoryKey(String);

impl DirectoryKey {
    pub fn root() -> Self {
        Self(ROOT_KEY.to_string())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut value = raw.trim().replace('\\', "/");
        if value.starts_with('/') {
            return Err(invalid(raw, "must be relative to the project root"));
        }
        while let Some(rest) = value.strip_prefix("./") {
            value = rest.to_string();
        }
        let value = value.trim_end_matches('/');
        if value.is_empty() || value == ROOT_KEY {
            return Ok(Self::root());
        }

        for segment in value.split('/') {
            match segment {
                "" => return Err(invalid(raw, "contains an empty path segment")),
                "." | ".." => return Err(invalid(raw, "must not contain '.' or '..' segments")),
                _ => {}
            }
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_KEY
    }

    pub fn first_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or(ROOT_KEY)
    }

    /// Dot-directories (by first segment). The root key never counts as hidden.
    pub fn is_hidden(&self) -> bool {
        !self.is_root() && self.first_segment().starts_with('.')
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|_| !self.is_root())
    }

    /// Every directory key a tracked file path implies, excluding the root.
    ///
    /// `a/b/c.txt` yields `a` and `a/b`.
    pub fn ancestors_of_file(path: &str) -> Vec<DirectoryKey> {
        let normalized = path.replace('\\', "/");
        let parts: Vec<&str> = normalized.split('/').collect();
        let mut out = Vec::new();
        for end in 1..parts.len() {
            let prefix = parts[..end].join("/");
            match Self::parse(&prefix) {
                Ok(key) if !key.is_root() => out.push(key),
                Ok(_) => {}
                Err(err) => log::debug!("skipping ancestor of tracked path {path}: {err}"),
            }
        }
        out
    }
}

impl fmt::Display for DirectoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DirectoryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn invalid(raw: &str, reason: &'static str) -> ContextError {
    ContextError::InvalidDirectory {
        key: raw.to_string(),
        reason,
    }
}
