//! File system tree
//!
//! Each directory owns its children outright, so every node is reachable
//! from exactly one parent and the tree cannot contain cycles.

use indexmap::IndexMap;

use super::path::FsPath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsNode {
    Directory {
        name: String,
        children: IndexMap<String, FsNode>,
    },
    File {
        name: String,
        content: Vec<u8>,
    },
}

impl FsNode {
    pub fn root() -> Self {
        Self::directory("")
    }

    pub fn directory(name: impl Into<String>) -> Self {
        FsNode::Directory {
            name: name.into(),
            children: IndexMap::new(),
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        FsNode::File {
            name: name.into(),
            content: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FsNode::Directory { name, .. } | FsNode::File { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: &str) {
        match self {
            FsNode::Directory { name, .. } | FsNode::File { name, .. } => {
                *name = new_name.to_string();
            }
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FsNode::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FsNode::Directory { .. })
    }

    pub fn children(&self) -> Option<&IndexMap<String, FsNode>> {
        match self {
            FsNode::Directory { children, .. } => Some(children),
            FsNode::File { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut IndexMap<String, FsNode>> {
        match self {
            FsNode::Directory { children, .. } => Some(children),
            FsNode::File { .. } => None,
        }
    }

    /// Size in bytes for files, child count for directories.
    pub fn size(&self) -> usize {
        match self {
            FsNode::Directory { children, .. } => children.len(),
            FsNode::File { content, .. } => content.len(),
        }
    }

    /// Walk `segments` down from this node. Files stop the walk.
    pub fn lookup(&self, segments: &[String]) -> Option<&FsNode> {
        let mut node = self;
        for segment in segments {
            node = node.children()?.get(segment)?;
        }
        Some(node)
    }

    pub fn lookup_mut(&mut self, segments: &[String]) -> Option<&mut FsNode> {
        let mut node = self;
        for segment in segments {
            node = node.children_mut()?.get_mut(segment)?;
        }
        Some(node)
    }

    /// Remove and return the child called `name`, keeping sibling order.
    pub fn detach(&mut self, name: &str) -> Option<FsNode> {
        self.children_mut()?.shift_remove(name)
    }

    /// Insert `node` as a child under `name`. Returns the node back if this
    /// is not a directory or the name is taken.
    pub fn attach(&mut self, name: &str, mut node: FsNode) -> Result<(), FsNode> {
        let Some(children) = self.children_mut() else {
            return Err(node);
        };
        if children.contains_key(name) {
            return Err(node);
        }
        node.set_name(name);
        children.insert(name.to_string(), node);
        Ok(())
    }

    /// Pre-order walk of every descendant (not `self`), children in
    /// insertion order. `base` is the path of `self`.
    pub fn descendants<'a>(&'a self, base: &FsPath) -> Vec<(FsPath, &'a FsNode)> {
        let mut out = Vec::new();
        self.collect_descendants(base, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, base: &FsPath, out: &mut Vec<(FsPath, &'a FsNode)>) {
        if let Some(children) = self.children() {
            for (name, child) in children {
                let path = base.join(name);
                out.push((path.clone(), child));
                child.collect_descendants(&path, out);
            }
        }
    }
}
