//! Per-user permission table
//!
//! Entries are kept in registration order. Lookups score every matching
//! pattern and keep the first entry with the strictly highest score, so
//! equal-score ties always resolve to the earliest registration.

use super::pattern::PathPattern;
use super::permission::{Capability, Permission};

pub const GLOBAL_PATTERN: &str = "/**";

#[derive(Debug, Clone)]
struct PatternEntry {
    key: String,
    pattern: PathPattern,
    permission: Permission,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    entries: Vec<PatternEntry>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permission for a pattern, overwriting an identical key in place.
    pub fn add_pattern(&mut self, pattern: &str, permission: Permission) {
        self.upsert(pattern, PathPattern::parse(pattern), permission);
    }

    /// Register a permission for one concrete path. Wildcard characters in
    /// `path` are taken literally, so a file named `*` never widens the grant.
    pub fn add_exact(&mut self, path: &str, permission: Permission) {
        self.upsert(path, PathPattern::Exact(path.to_string()), permission);
    }

    fn upsert(&mut self, key: &str, pattern: PathPattern, permission: Permission) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key && e.pattern == pattern) {
            entry.permission = permission;
            return;
        }
        self.entries.push(PatternEntry {
            key: key.to_string(),
            pattern,
            permission,
        });
    }

    /// Permission bound to exactly this pattern key, if any.
    pub fn get(&self, pattern: &str) -> Option<Permission> {
        let parsed = PathPattern::parse(pattern);
        self.entries
            .iter()
            .find(|e| e.key == pattern && e.pattern == parsed)
            .map(|e| e.permission)
    }

    /// Resolve the permission for a concrete, normalized path.
    pub fn effective_permission(&self, path: &str) -> Permission {
        let mut best: Option<(u32, Permission)> = None;
        for entry in &self.entries {
            if !entry.pattern.matches(path) {
                continue;
            }
            let score = entry.pattern.score();
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry.permission));
            }
        }
        match best {
            Some((_, permission)) => permission,
            None => self.get(GLOBAL_PATTERN).unwrap_or(Permission::NONE),
        }
    }

    fn global_allows(&self, capability: Capability) -> bool {
        self.get(GLOBAL_PATTERN).map_or(false, |p| p.allows(capability))
    }

    /// Coarse probe on the `/**` entry only.
    pub fn can_read(&self) -> bool {
        self.global_allows(Capability::Read)
    }

    /// Coarse probe on the `/**` entry only.
    pub fn can_write(&self) -> bool {
        self.global_allows(Capability::Write)
    }

    /// Coarse probe on the `/**` entry only.
    pub fn can_execute(&self) -> bool {
        self.global_allows(Capability::Execute)
    }

    /// Registered `(pattern, permission)` pairs in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, Permission)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.permission))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
