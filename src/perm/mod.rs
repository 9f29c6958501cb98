//! Permission Module
//!
//! Pattern-based, per-user access control:
//! - Permission: parsed `rwx` strings and capabilities
//! - PathPattern: exact, `/*` and `/**` patterns with specificity scores
//! - PermissionTable: per-user ordered pattern table
//! - gate: the check every operation runs before touching the tree

pub mod gate;
pub mod pattern;
pub mod permission;
pub mod table;

pub use gate::authorize;
pub use pattern::PathPattern;
pub use permission::{Capability, Permission, PermissionParseError};
pub use table::{PermissionTable, GLOBAL_PATTERN};
