//! Permission gate
//!
//! Every file system operation passes its target through here before it
//! touches the tree.

use tracing::warn;

use crate::fs::FsError;
use crate::users::User;

use super::permission::Capability;

/// Fail with `PermissionDenied` unless `user` holds `capability` on `path`.
pub fn authorize(
    user: &User,
    path: &str,
    capability: Capability,
    operation: &str,
) -> Result<(), FsError> {
    let effective = user.permissions().effective_permission(path);
    if effective.allows(capability) {
        return Ok(());
    }
    warn!(
        user = user.name(),
        path,
        %capability,
        permission = %effective,
        operation,
        "permission denied"
    );
    Err(FsError::PermissionDenied {
        path: path.to_string(),
        operation: operation.to_string(),
        user: user.name().to_string(),
        capability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_uses_effective_permission() {
        let mut user = User::new("alice");
        user.add_permission("/docs/**", "rw-".parse().unwrap());
        assert!(authorize(&user, "/docs/a", Capability::Write, "touch").is_ok());
        assert!(authorize(&user, "/docs/a", Capability::Execute, "touch").is_err());

        let err = authorize(&user, "/docs", Capability::Write, "mkdir").unwrap_err();
        match err {
            FsError::PermissionDenied { path, user, capability, .. } => {
                assert_eq!(path, "/docs");
                assert_eq!(user, "alice");
                assert_eq!(capability, Capability::Write);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
