//! Path normalization
//!
//! Paths are absolute and `/`-separated. A single trailing slash is dropped;
//! relative paths, empty segments and `.`/`..` segments are rejected.

use super::types::FsError;

/// A normalized absolute path split into segments. The root has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsPath {
    segments: Vec<String>,
}

impl FsPath {
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Normalize `path`, failing with `NotFound` for malformed input.
    pub fn parse(path: &str, operation: &str) -> Result<Self, FsError> {
        let malformed = || FsError::NotFound {
            path: path.to_string(),
            operation: operation.to_string(),
        };
        if path == "/" {
            return Ok(Self::root());
        }
        let body = path.strip_prefix('/').ok_or_else(malformed)?;
        let body = body.strip_suffix('/').unwrap_or(body);
        let mut segments = Vec::new();
        for segment in body.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(malformed());
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent directory; the root is its own parent.
    pub fn parent(&self) -> FsPath {
        let mut segments = self.segments.clone();
        segments.pop();
        FsPath { segments }
    }

    pub fn join(&self, name: &str) -> FsPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        FsPath { segments }
    }

    /// True when `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &FsPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    pub fn as_string(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }
}

impl std::fmt::Display for FsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}
