//! Security utilities for rdbc-core.
//!
//! Provides:
//! - Permission checks gating privileged driver-manager operations
//! - String literal escaping for SQL string contexts

use std::collections::HashSet;

use crate::error::Error;

/// Privileged driver-manager operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlPermission {
    /// Remove a driver from the registry
    DeregisterDriver,
    /// Replace the driver-manager log sink
    SetLog,
}

impl SqlPermission {
    /// Permission name as used in policies and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeregisterDriver => "deregisterDriver",
            Self::SetLog => "setLog",
        }
    }
}

impl std::fmt::Display for SqlPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decides whether a caller holds a permission.
pub trait SecurityPolicy: Send + Sync {
    /// Return `Err(Error::AccessDenied)` if the permission is not granted
    fn check_permission(&self, permission: SqlPermission) -> crate::Result<()>;
}

/// Grants every permission
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SecurityPolicy for AllowAll {
    fn check_permission(&self, _permission: SqlPermission) -> crate::Result<()> {
        Ok(())
    }
}

/// Denies a fixed set of permissions and grants the rest
#[derive(Debug, Clone, Default)]
pub struct DenyPermissions {
    denied: HashSet<SqlPermission>,
}

impl DenyPermissions {
    /// Create a policy denying the given permissions
    pub fn new(denied: impl IntoIterator<Item = SqlPermission>) -> Self {
        Self {
            denied: denied.into_iter().collect(),
        }
    }
}

impl SecurityPolicy for DenyPermissions {
    fn check_permission(&self, permission: SqlPermission) -> crate::Result<()> {
        if self.denied.contains(&permission) {
            return Err(Error::access_denied(format!(
                "permission '{permission}' denied"
            )));
        }
        Ok(())
    }
}

/// Escape a string value for safe interpolation into a SQL string literal context.
///
/// Replaces `'` with `''` (standard SQL escaping for single-quoted string literals).
///
/// # Examples
///
/// ```
/// use rdbc_core::security::escape_string_literal;
///
/// assert_eq!(escape_string_literal("users"), "users");
/// assert_eq!(escape_string_literal("don't"), "don''t");
/// ```
pub fn escape_string_literal(value: &str) -> String {
    // Fast path: no escaping needed (common case)
    if !value.contains('\'') {
        return value.to_string();
    }
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.check_permission(SqlPermission::DeregisterDriver).is_ok());
        assert!(AllowAll.check_permission(SqlPermission::SetLog).is_ok());
    }

    #[test]
    fn test_deny_permissions() {
        let policy = DenyPermissions::new([SqlPermission::DeregisterDriver]);

        let err = policy
            .check_permission(SqlPermission::DeregisterDriver)
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied { .. }));
        assert!(err.to_string().contains("deregisterDriver"));

        assert!(policy.check_permission(SqlPermission::SetLog).is_ok());
    }

    #[test]
    fn test_escape_single_quotes() {
        assert_eq!(escape_string_literal("don't"), "don''t");
        assert_eq!(escape_string_literal("'hello'"), "''hello''");
    }

    #[test]
    fn test_escape_injection_attempt() {
        assert_eq!(
            escape_string_literal("x'; DROP TABLE users--"),
            "x''; DROP TABLE users--"
        );
    }

    #[test]
    fn test_escape_empty_string() {
        assert_eq!(escape_string_literal(""), "");
    }
}
