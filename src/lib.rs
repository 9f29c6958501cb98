//! permfs - an in-memory file system with per-user, per-path access control
//!
//! Directories, files and byte content live entirely in memory. Every
//! operation names the acting user and is checked against that user's
//! pattern-based permission table before it reads or mutates the tree.

pub mod config;
pub mod fs;
pub mod perm;
pub mod script;
pub mod users;

pub use config::{FsConfig, FsOptions, MutationScope};
pub use fs::{FileSystem, FsError, InMemoryFs};
pub use perm::{Capability, Permission, PermissionTable};
pub use users::{User, UserRegistry};
