//! File System Types
//!
//! Core types and the operation trait for the permission-checked file system.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::perm::Capability;

/// File system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("ENOTEMPTY: directory not empty, {operation} '{path}'")]
    NotEmpty { path: String, operation: String },

    #[error("EINVAL: invalid argument, {operation} '{path}': {reason}")]
    InvalidArgument {
        path: String,
        operation: String,
        reason: String,
    },

    #[error("EACCES: permission denied, {operation} '{path}' ({user} lacks {capability})")]
    PermissionDenied {
        path: String,
        operation: String,
        user: String,
        capability: Capability,
    },

    #[error("unknown user '{user}', {operation}")]
    UnknownUser { user: String, operation: String },
}

/// Coarse classification of [`FsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathNotFound,
    PathAlreadyExists,
    PermissionDenied,
    IsDirectory,
    NotEmpty,
    InvalidArgument,
    UnknownUser,
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound { .. } => ErrorKind::PathNotFound,
            FsError::AlreadyExists { .. } => ErrorKind::PathAlreadyExists,
            FsError::IsDirectory { .. } => ErrorKind::IsDirectory,
            FsError::NotEmpty { .. } => ErrorKind::NotEmpty,
            FsError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            FsError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            FsError::UnknownUser { .. } => ErrorKind::UnknownUser,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>, operation: &str) -> Self {
        FsError::NotFound {
            path: path.into(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn already_exists(path: impl Into<String>, operation: &str) -> Self {
        FsError::AlreadyExists {
            path: path.into(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn is_directory(path: impl Into<String>, operation: &str) -> Self {
        FsError::IsDirectory {
            path: path.into(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn invalid(path: impl Into<String>, operation: &str, reason: impl Into<String>) -> Self {
        FsError::InvalidArgument {
            path: path.into(),
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirentEntry {
    /// Absolute path of the entry
    pub path: String,
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    /// Bytes for files, child count for directories
    pub size: usize,
}

/// Options for rm operation
#[derive(Debug, Clone, Default)]
pub struct RmOptions {
    pub recursive: bool,
}

/// Options for cp operation
#[derive(Debug, Clone, Default)]
pub struct CpOptions {
    pub recursive: bool,
}

/// Options for ls operation
#[derive(Debug, Clone, Default)]
pub struct LsOptions {
    pub recursive: bool,
}

/// Read cursor. Each read advances it by the number of bytes copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset(usize);

impl Offset {
    pub fn new(value: usize) -> Self {
        Offset(value)
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn set(&mut self, value: usize) {
        self.0 = value;
    }

    pub fn advance(&mut self, by: usize) {
        self.0 += by;
    }
}

/// Permission-checked file system operations.
///
/// Every call names the acting user; the call fails without touching the
/// tree when that user lacks the capability the operation needs.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Create an empty directory
    async fn mkdir(&self, path: &str, user: &str) -> Result<(), FsError>;

    /// Create an empty file
    async fn touch(&self, path: &str, user: &str) -> Result<(), FsError>;

    /// Remove a file or directory
    async fn rm(&self, path: &str, user: &str, options: &RmOptions) -> Result<(), FsError>;

    /// Replace (or with `append`, extend) a file's content
    async fn write(&self, path: &str, user: &str, append: bool, buffer: &[u8]) -> Result<(), FsError>;

    /// Copy file content from `offset` into `buffer`, returning the byte count
    async fn read(
        &self,
        path: &str,
        user: &str,
        buffer: &mut [u8],
        offset: &mut Offset,
    ) -> Result<usize, FsError>;

    /// Move/rename a file or directory
    async fn mv(&self, old_path: &str, new_path: &str, user: &str) -> Result<(), FsError>;

    /// Copy a file or directory
    async fn cp(&self, src: &str, dest: &str, user: &str, options: &CpOptions) -> Result<(), FsError>;

    /// List a directory (or a single file)
    async fn ls(&self, path: &str, user: &str, options: &LsOptions) -> Result<Vec<DirentEntry>, FsError>;

    /// Grant `target_user` the permission `permission` at exactly `path`
    async fn chmod(&self, path: &str, user: &str, target_user: &str, permission: &str) -> Result<(), FsError>;
}
