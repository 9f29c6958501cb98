//! Users Module
//!
//! Users are named holders of a permission table. The registry is built at
//! load time and consulted by every file system operation.

pub mod loader;

use indexmap::IndexMap;

use crate::perm::{Capability, Permission, PermissionTable, GLOBAL_PATTERN};

pub use loader::{load_into, load_users, parse_users, UsersError};

#[derive(Debug, Clone)]
pub struct User {
    name: String,
    permissions: PermissionTable,
}

impl User {
    /// A user with no patterns; every path resolves to `---`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: PermissionTable::new(),
        }
    }

    /// A user whose whole tree is covered by a single `/**` permission.
    pub fn with_global(name: impl Into<String>, permission: Permission) -> Self {
        let mut user = Self::new(name);
        user.add_permission(GLOBAL_PATTERN, permission);
        user
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    pub fn add_permission(&mut self, pattern: &str, permission: Permission) {
        self.permissions.add_pattern(pattern, permission);
    }

    /// Grant `permission` on one concrete path only.
    pub fn add_exact_permission(&mut self, path: &str, permission: Permission) {
        self.permissions.add_exact(path, permission);
    }

    pub fn permission_for(&self, path: &str) -> Permission {
        self.permissions.effective_permission(path)
    }

    pub fn can(&self, path: &str, capability: Capability) -> bool {
        self.permission_for(path).allows(capability)
    }
}

/// Users keyed by name, in load order.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: IndexMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user, replacing any previous user with the same name.
    pub fn insert(&mut self, user: User) {
        self.users.insert(user.name().to_string(), user);
    }

    /// Fetch a user, creating an empty one on first use.
    pub fn entry(&mut self, name: &str) -> &mut User {
        self.users
            .entry(name.to_string())
            .or_insert_with(|| User::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut User> {
        self.users.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for UserRegistry {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        let mut registry = UserRegistry::new();
        for user in iter {
            registry.insert(user);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_global() {
        let root = User::with_global("root", Permission::ALL);
        assert!(root.permissions().can_write());
        assert!(root.can("/", Capability::Write));
        assert!(root.can("/a/b/c", Capability::Execute));
    }

    #[test]
    fn test_registry_entry_accumulates() {
        let mut registry = UserRegistry::new();
        registry.entry("bob").add_permission("/a/**", "r--".parse().unwrap());
        registry.entry("bob").add_permission("/b/**", "rw-".parse().unwrap());
        assert_eq!(registry.len(), 1);
        let bob = registry.get("bob").unwrap();
        assert_eq!(bob.permissions().len(), 2);
        assert_eq!(bob.permission_for("/b/x").to_string(), "rw-");
    }

    #[test]
    fn test_registry_keeps_load_order() {
        let registry: UserRegistry = ["carol", "alice", "bob"].into_iter().map(User::new).collect();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["carol", "alice", "bob"]);
        assert!(registry.contains("alice"));
        assert!(registry.get("dave").is_none());
    }
}
