//! Configuration
//!
//! `FsOptions` tunes how the engine authorizes operations. `FsConfig` is the
//! on-disk TOML form, which can also carry users inline or point at a users
//! file.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::perm::Permission;
use crate::users::{self, UserRegistry, UsersError};

/// Which path a create/remove/move is authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationScope {
    /// The entry being created, removed or moved. `/docs/**` then allows
    /// work inside `/docs` without allowing `/docs` itself.
    #[default]
    Entry,
    /// The directory holding the entry (Unix semantics).
    Parent,
}

/// Options for creating an InMemoryFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsOptions {
    /// Check every descendant on recursive rm/cp, not only the top entry
    pub strict_recursive: bool,
    pub mutation_scope: MutationScope,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            strict_recursive: true,
            mutation_scope: MutationScope::Entry,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("user '{user}': invalid permission '{permission}' for pattern '{pattern}'")]
    Permission {
        user: String,
        pattern: String,
        permission: String,
    },

    #[error(transparent)]
    Users(#[from] UsersError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserConfig {
    pub name: String,
    /// Patterns in file order, which decides equal-score ties.
    #[serde(default)]
    pub permissions: IndexMap<String, String>,
}

/// TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub users_file: Option<PathBuf>,
    pub strict_recursive: Option<bool>,
    pub mutation_scope: Option<MutationScope>,
    #[serde(rename = "user")]
    pub users: Vec<UserConfig>,
}

impl FsConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn options(&self) -> FsOptions {
        let defaults = FsOptions::default();
        FsOptions {
            strict_recursive: self.strict_recursive.unwrap_or(defaults.strict_recursive),
            mutation_scope: self.mutation_scope.unwrap_or(defaults.mutation_scope),
        }
    }

    /// Users from `users_file` (if set) followed by the inline `[[user]]` tables.
    pub fn registry(&self) -> Result<UserRegistry, ConfigError> {
        let mut registry = match &self.users_file {
            Some(path) => users::load_users(path)?,
            None => UserRegistry::new(),
        };
        for user in &self.users {
            let entry = registry.entry(&user.name);
            for (pattern, permission) in &user.permissions {
                let parsed: Permission = permission.parse().map_err(|_| ConfigError::Permission {
                    user: user.name.clone(),
                    pattern: pattern.clone(),
                    permission: permission.clone(),
                })?;
                entry.add_permission(pattern, parsed);
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FsConfig::from_toml("").unwrap();
        assert_eq!(config.options(), FsOptions::default());
        assert!(config.registry().unwrap().is_empty());
    }

    #[test]
    fn test_inline_users_and_options() {
        let config = FsConfig::from_toml(
            r#"
strict_recursive = false
mutation_scope = "parent"

[[user]]
name = "alice"
[user.permissions]
"/docs/**" = "rwx"
"/docs/plan" = "r--"

[[user]]
name = "root"
permissions = { "/**" = "rwx" }
"#,
        )
        .unwrap();
        let options = config.options();
        assert!(!options.strict_recursive);
        assert_eq!(options.mutation_scope, MutationScope::Parent);

        let registry = config.registry().unwrap();
        let alice = registry.get("alice").unwrap();
        assert_eq!(alice.permission_for("/docs/plan").to_string(), "r--");
        assert_eq!(alice.permission_for("/docs/x").to_string(), "rwx");
        assert!(registry.get("root").unwrap().permissions().can_write());
    }

    #[test]
    fn test_patterns_keep_file_order() {
        let config = FsConfig::from_toml(
            r#"
[[user]]
name = "carol"
[user.permissions]
"/a/**" = "rwx"
"/**" = "r--"
"#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        let carol = registry.get("carol").unwrap();
        let keys: Vec<&str> = carol.permissions().patterns().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["/a/**", "/**"]);
        // both match with the same score; the first listed wins
        assert_eq!(carol.permission_for("/a/b").to_string(), "rwx");
        assert_eq!(carol.permission_for("/b").to_string(), "r--");
    }

    #[test]
    fn test_bad_permission_is_reported() {
        let config = FsConfig::from_toml(
            r#"
[[user]]
name = "bob"
permissions = { "/a" = "all" }
"#,
        )
        .unwrap();
        let err = config.registry().unwrap_err();
        assert!(matches!(err, ConfigError::Permission { ref user, .. } if user == "bob"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            FsConfig::from_toml("strict_recursive = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
