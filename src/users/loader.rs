//! User provisioning
//!
//! Parses the line-oriented users format:
//!
//! ```text
//! # name   pattern      permission
//! alice    /docs/**     rwx
//! alice    /docs/plan   r--
//! root     rwx
//! ```
//!
//! A two-field line binds the permission to `/**`. Blank lines and lines
//! starting with `#` are ignored. Repeated names accumulate patterns.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::perm::{Permission, GLOBAL_PATTERN};

use super::UserRegistry;

#[derive(Error, Debug)]
pub enum UsersError {
    #[error("cannot read users file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected 'name pattern permission' or 'name permission', got {fields} fields")]
    FieldCount { line: usize, fields: usize },

    #[error("line {line}: {message}")]
    InvalidPermission { line: usize, message: String },
}

/// Parse users from text.
pub fn parse_users(source: &str) -> Result<UserRegistry, UsersError> {
    let mut registry = UserRegistry::new();
    parse_into(&mut registry, source)?;
    Ok(registry)
}

/// Parse users from text, merging into an existing registry.
pub fn parse_into(registry: &mut UserRegistry, source: &str) -> Result<(), UsersError> {
    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (name, pattern, permission) = match fields.as_slice() {
            [name, pattern, permission] => (*name, *pattern, *permission),
            [name, permission] => (*name, GLOBAL_PATTERN, *permission),
            _ => {
                return Err(UsersError::FieldCount {
                    line: idx + 1,
                    fields: fields.len(),
                })
            }
        };
        let permission: Permission =
            permission.parse().map_err(|e: crate::perm::PermissionParseError| {
                UsersError::InvalidPermission {
                    line: idx + 1,
                    message: e.to_string(),
                }
            })?;
        registry.entry(name).add_permission(pattern, permission);
    }
    Ok(())
}

/// Read and parse a users file.
pub fn load_users(path: impl AsRef<Path>) -> Result<UserRegistry, UsersError> {
    let mut registry = UserRegistry::new();
    load_into(&mut registry, path)?;
    Ok(registry)
}

/// Read a users file, merging its users into an existing registry.
pub fn load_into(registry: &mut UserRegistry, path: impl AsRef<Path>) -> Result<(), UsersError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| UsersError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_into(registry, &source)?;
    info!(path = %path.display(), users = registry.len(), "loaded users");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_and_two_field_lines() {
        let registry = parse_users(
            "# users\n\
             alice /docs/** rwx\n\
             \n\
             alice /docs/plan r--\n\
             root  rwx\n",
        )
        .unwrap();
        assert_eq!(registry.len(), 2);

        let alice = registry.get("alice").unwrap();
        assert_eq!(alice.permission_for("/docs/plan").to_string(), "r--");
        assert_eq!(alice.permission_for("/docs/other").to_string(), "rwx");
        assert!(!alice.permissions().can_read());

        let root = registry.get("root").unwrap();
        assert!(root.permissions().can_write());
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse_users("alice /a rwx\nbob\n").unwrap_err();
        assert!(matches!(err, UsersError::FieldCount { line: 2, fields: 1 }));

        let err = parse_users("alice /a rwq\n").unwrap_err();
        match err {
            UsersError::InvalidPermission { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("rwq"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_users("/definitely/not/here/users.txt").unwrap_err();
        assert!(matches!(err, UsersError::Io { .. }));
    }

    #[test]
    fn test_load_into_merges_with_existing_users() {
        let path = std::env::temp_dir().join(format!("permfs-users-{}.txt", std::process::id()));
        std::fs::write(&path, "alice /docs/plan r--
bob rw-
").unwrap();

        let mut registry = parse_users("alice /docs/** rwx
").unwrap();
        let result = load_into(&mut registry, &path);
        std::fs::remove_file(&path).unwrap();
        result.unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["alice", "bob"]);
        let alice = registry.get("alice").unwrap();
        assert_eq!(alice.permissions().len(), 2);
        assert_eq!(alice.permission_for("/docs/plan").to_string(), "r--");
        assert_eq!(alice.permission_for("/docs/x").to_string(), "rwx");
        assert!(registry.get("bob").unwrap().permissions().can_write());
    }
}
