//! File System Module
//!
//! Permission-checked, in-memory file system:
//! - FsPath: path normalization
//! - FsNode: the owned directory/file tree
//! - InMemoryFs: the operation surface, consulting each user's permission table

pub mod in_memory_fs;
pub mod node;
pub mod path;
pub mod types;

pub use in_memory_fs::InMemoryFs;
pub use node::FsNode;
pub use path::FsPath;
pub use types::*;
