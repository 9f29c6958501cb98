//! In-Memory File System Implementation
//!
//! A pure in-memory tree guarded by per-user permission tables. The tree and
//! the user registry share one lock; every operation holds it for its whole
//! duration, so an operation either applies completely or not at all.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{FsOptions, MutationScope};
use crate::perm::{authorize, Capability, Permission};
use crate::users::{User, UserRegistry};

use super::node::FsNode;
use super::path::FsPath;
use super::types::*;

/// In-memory, permission-checked file system.
pub struct InMemoryFs {
    state: RwLock<FsState>,
    options: FsOptions,
}

struct FsState {
    root: FsNode,
    users: UserRegistry,
}

impl InMemoryFs {
    /// Create an empty file system for the given users.
    pub fn new(users: UserRegistry) -> Self {
        Self::with_options(users, FsOptions::default())
    }

    pub fn with_options(users: UserRegistry, options: FsOptions) -> Self {
        Self {
            state: RwLock::new(FsState {
                root: FsNode::root(),
                users,
            }),
            options,
        }
    }

    pub fn options(&self) -> &FsOptions {
        &self.options
    }

    /// Effective permission of `user` at `path`.
    pub async fn permission_of(&self, user: &str, path: &str) -> Result<Permission, FsError> {
        let state = self.state.read().await;
        let target = FsPath::parse(path, "stat")?;
        let user = lookup_user(&state.users, user, "stat")?;
        Ok(user.permission_for(&target.as_string()))
    }

    pub async fn exists(&self, path: &str) -> bool {
        let state = self.state.read().await;
        match FsPath::parse(path, "access") {
            Ok(target) => state.root.lookup(target.segments()).is_some(),
            Err(_) => false,
        }
    }

    /// Path checked for a create, remove or move of `target`.
    fn mutation_target(&self, target: &FsPath) -> String {
        match self.options.mutation_scope {
            MutationScope::Entry => target.as_string(),
            MutationScope::Parent => target.parent().as_string(),
        }
    }

    async fn create(&self, path: &str, user: &str, node: FsNode, operation: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, operation)?;
        let target = FsPath::parse(path, operation)?;
        if state.root.lookup(target.segments()).is_some() {
            return Err(FsError::already_exists(path, operation));
        }
        let name = target.name().ok_or_else(|| FsError::already_exists(path, operation))?;
        require_directory(&state.root, &target.parent(), path, operation)?;
        authorize(actor, &self.mutation_target(&target), Capability::Write, operation)?;

        let parent = state
            .root
            .lookup_mut(target.parent().segments())
            .ok_or_else(|| FsError::not_found(path, operation))?;
        parent
            .attach(name, node)
            .map_err(|_| FsError::already_exists(path, operation))?;
        debug!(user, path = %target, operation, "created");
        Ok(())
    }
}

fn lookup_user<'a>(users: &'a UserRegistry, name: &str, operation: &str) -> Result<&'a User, FsError> {
    users.get(name).ok_or_else(|| FsError::UnknownUser {
        user: name.to_string(),
        operation: operation.to_string(),
    })
}

/// `dir` must exist and be a directory, else `NotFound` for `path`.
fn require_directory(root: &FsNode, dir: &FsPath, path: &str, operation: &str) -> Result<(), FsError> {
    match root.lookup(dir.segments()) {
        Some(node) if node.is_directory() => Ok(()),
        _ => Err(FsError::not_found(path, operation)),
    }
}

fn dirent(path: &FsPath, node: &FsNode) -> DirentEntry {
    DirentEntry {
        path: path.as_string(),
        name: node.name().to_string(),
        is_file: node.is_file(),
        is_directory: node.is_directory(),
        size: node.size(),
    }
}

// ============================================================================
// FileSystem trait implementation
// ============================================================================

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn mkdir(&self, path: &str, user: &str) -> Result<(), FsError> {
        self.create(path, user, FsNode::directory(""), "mkdir").await
    }

    async fn touch(&self, path: &str, user: &str) -> Result<(), FsError> {
        self.create(path, user, FsNode::file(""), "touch").await
    }

    async fn rm(&self, path: &str, user: &str, options: &RmOptions) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, "rm")?;
        let target = FsPath::parse(path, "rm")?;
        let name = target
            .name()
            .ok_or_else(|| FsError::invalid(path, "rm", "cannot remove the root directory"))?;
        let node = state
            .root
            .lookup(target.segments())
            .ok_or_else(|| FsError::not_found(path, "rm"))?;

        authorize(actor, &self.mutation_target(&target), Capability::Write, "rm")?;
        if node.children().map_or(false, |c| !c.is_empty()) {
            if !options.recursive {
                return Err(FsError::NotEmpty {
                    path: path.to_string(),
                    operation: "rm".to_string(),
                });
            }
            if self.options.strict_recursive {
                for (descendant, _) in node.descendants(&target) {
                    authorize(actor, &self.mutation_target(&descendant), Capability::Write, "rm")?;
                }
            }
        }

        let parent = state
            .root
            .lookup_mut(target.parent().segments())
            .ok_or_else(|| FsError::not_found(path, "rm"))?;
        parent.detach(name);
        debug!(user, path = %target, recursive = options.recursive, "removed");
        Ok(())
    }

    async fn write(&self, path: &str, user: &str, append: bool, buffer: &[u8]) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, "write")?;
        let target = FsPath::parse(path, "write")?;
        match state.root.lookup(target.segments()) {
            None => return Err(FsError::not_found(path, "write")),
            Some(node) if node.is_directory() => return Err(FsError::is_directory(path, "write")),
            Some(_) => {}
        }
        authorize(actor, &target.as_string(), Capability::Write, "write")?;

        if let Some(FsNode::File { content, .. }) = state.root.lookup_mut(target.segments()) {
            if !append {
                content.clear();
            }
            content.extend_from_slice(buffer);
            debug!(user, path = %target, append, bytes = buffer.len(), "wrote");
        }
        Ok(())
    }

    async fn read(
        &self,
        path: &str,
        user: &str,
        buffer: &mut [u8],
        offset: &mut Offset,
    ) -> Result<usize, FsError> {
        let state = self.state.read().await;
        let actor = lookup_user(&state.users, user, "read")?;
        let target = FsPath::parse(path, "read")?;
        let content = match state.root.lookup(target.segments()) {
            None => return Err(FsError::not_found(path, "read")),
            Some(FsNode::Directory { .. }) => return Err(FsError::is_directory(path, "read")),
            Some(FsNode::File { content, .. }) => content,
        };
        authorize(actor, &target.as_string(), Capability::Read, "read")?;

        let start = offset.get().min(content.len());
        let count = buffer.len().min(content.len() - start);
        buffer[..count].copy_from_slice(&content[start..start + count]);
        offset.advance(count);
        debug!(user, path = %target, bytes = count, "read");
        Ok(count)
    }

    async fn mv(&self, old_path: &str, new_path: &str, user: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, "mv")?;
        let src = FsPath::parse(old_path, "mv")?;
        let dest = FsPath::parse(new_path, "mv")?;
        let src_name = src
            .name()
            .ok_or_else(|| FsError::invalid(old_path, "mv", "cannot move the root directory"))?;
        if state.root.lookup(src.segments()).is_none() {
            return Err(FsError::not_found(old_path, "mv"));
        }
        require_directory(&state.root, &dest.parent(), new_path, "mv")?;
        if state.root.lookup(dest.segments()).is_some() {
            return Err(FsError::already_exists(new_path, "mv"));
        }
        // dest is not the root here: the root always exists
        let dest_name = dest.name().ok_or_else(|| FsError::already_exists(new_path, "mv"))?;
        if dest.starts_with(&src) {
            return Err(FsError::invalid(new_path, "mv", "cannot move a directory into itself"));
        }
        authorize(actor, &self.mutation_target(&src), Capability::Write, "mv")?;
        authorize(actor, &self.mutation_target(&dest), Capability::Write, "mv")?;

        let node = state
            .root
            .lookup_mut(src.parent().segments())
            .and_then(|parent| parent.detach(src_name))
            .ok_or_else(|| FsError::not_found(old_path, "mv"))?;
        let attached = match state.root.lookup_mut(dest.parent().segments()) {
            Some(parent) => parent.attach(dest_name, node),
            None => Err(node),
        };
        if let Err(node) = attached {
            // put the node back where it came from
            if let Some(parent) = state.root.lookup_mut(src.parent().segments()) {
                let _ = parent.attach(src_name, node);
            }
            return Err(FsError::not_found(new_path, "mv"));
        }
        debug!(user, from = %src, to = %dest, "moved");
        Ok(())
    }

    async fn cp(&self, src: &str, dest: &str, user: &str, options: &CpOptions) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, "cp")?;
        let src_path = FsPath::parse(src, "cp")?;
        let dest_path = FsPath::parse(dest, "cp")?;
        let node = state
            .root
            .lookup(src_path.segments())
            .ok_or_else(|| FsError::not_found(src, "cp"))?;
        require_directory(&state.root, &dest_path.parent(), dest, "cp")?;
        if state.root.lookup(dest_path.segments()).is_some() {
            return Err(FsError::already_exists(dest, "cp"));
        }
        let dest_name = dest_path.name().ok_or_else(|| FsError::already_exists(dest, "cp"))?;
        if node.is_directory() && !options.recursive {
            return Err(FsError::is_directory(src, "cp"));
        }

        authorize(actor, &src_path.as_string(), Capability::Read, "cp")?;
        authorize(actor, &self.mutation_target(&dest_path), Capability::Write, "cp")?;
        if self.options.strict_recursive {
            for (descendant, _) in node.descendants(&src_path) {
                authorize(actor, &descendant.as_string(), Capability::Read, "cp")?;
            }
        }

        let copy = node.clone();
        let parent = state
            .root
            .lookup_mut(dest_path.parent().segments())
            .ok_or_else(|| FsError::not_found(dest, "cp"))?;
        parent
            .attach(dest_name, copy)
            .map_err(|_| FsError::already_exists(dest, "cp"))?;
        debug!(user, from = %src_path, to = %dest_path, recursive = options.recursive, "copied");
        Ok(())
    }

    async fn ls(&self, path: &str, user: &str, options: &LsOptions) -> Result<Vec<DirentEntry>, FsError> {
        let state = self.state.read().await;
        let actor = lookup_user(&state.users, user, "ls")?;
        let target = FsPath::parse(path, "ls")?;
        let node = state
            .root
            .lookup(target.segments())
            .ok_or_else(|| FsError::not_found(path, "ls"))?;
        authorize(actor, &target.as_string(), Capability::Read, "ls")?;

        let entries = match node.children() {
            None => vec![dirent(&target, node)],
            Some(_) if options.recursive => node
                .descendants(&target)
                .into_iter()
                .map(|(p, n)| dirent(&p, n))
                .collect(),
            Some(children) => children
                .iter()
                .map(|(name, child)| dirent(&target.join(name), child))
                .collect(),
        };
        Ok(entries)
    }

    async fn chmod(&self, path: &str, user: &str, target_user: &str, permission: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        let actor = lookup_user(&state.users, user, "chmod")?;
        lookup_user(&state.users, target_user, "chmod")?;
        let target = FsPath::parse(path, "chmod")?;
        if state.root.lookup(target.segments()).is_none() {
            return Err(FsError::not_found(path, "chmod"));
        }
        let parsed: Permission = permission
            .parse()
            .map_err(|e: crate::perm::PermissionParseError| FsError::invalid(path, "chmod", e.to_string()))?;
        authorize(actor, &target.as_string(), Capability::Write, "chmod")?;

        if let Some(grantee) = state.users.get_mut(target_user) {
            grantee.add_exact_permission(&target.as_string(), parsed);
        }
        debug!(user, target_user, path = %target, permission = %parsed, "granted");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
