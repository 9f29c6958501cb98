//! Path patterns
//!
//! Patterns bind permissions to parts of the tree:
//! - `/a/b` matches exactly `/a/b` (score 100)
//! - `/a/*` matches direct children of `/a` (score 10)
//! - `/a/**` matches every strict descendant of `/a`, but not `/a` (score 1)
//!
//! Only the final segment can be a wildcard; a `*` anywhere else is a literal
//! character of the path. A last segment that merely ends in `*` (`/docs*`)
//! is none of the forms above and never matches.

pub const EXACT_SCORE: u32 = 100;
pub const CHILDREN_SCORE: u32 = 10;
pub const DESCENDANTS_SCORE: u32 = 1;

/// A parsed permission pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// `base/*`
    Children(String),
    /// `base/**`
    Descendants(String),
    /// Trailing `*` glued to a name, as in `/docs*`; never matches.
    Invalid(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(base) = pattern.strip_suffix("/**") {
            PathPattern::Descendants(base.to_string())
        } else if let Some(base) = pattern.strip_suffix("/*") {
            PathPattern::Children(base.to_string())
        } else if pattern.ends_with('*') {
            PathPattern::Invalid(pattern.to_string())
        } else {
            PathPattern::Exact(pattern.to_string())
        }
    }

    /// Check whether a normalized absolute path falls under this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => p == path,
            PathPattern::Children(base) => path
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| !rest.is_empty() && !rest.contains('/'))
                .unwrap_or(false),
            PathPattern::Descendants(base) => {
                path != base
                    && path
                        .strip_prefix(base.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
            PathPattern::Invalid(_) => false,
        }
    }

    /// Specificity used to pick between overlapping matches.
    pub fn score(&self) -> u32 {
        match self {
            PathPattern::Exact(_) => EXACT_SCORE,
            PathPattern::Children(_) => CHILDREN_SCORE,
            PathPattern::Descendants(_) => DESCENDANTS_SCORE,
            PathPattern::Invalid(_) => 0,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, PathPattern::Descendants(base) if base.is_empty())
    }
}
