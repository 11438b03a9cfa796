//! Admin roles and permission checks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission granting every capability
pub const PERMISSION_ALL: &str = "all";

/// Permission required to zero the budget counters
pub const PERMISSION_BUDGET: &str = "budget";

/// Roles accepted on admin panel routes
///
/// `admin` is what the login route issues; the other two are kept so tokens
/// minted for the multi-editor setup keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access, bypasses permission lists
    SuperAdmin,
    /// Content editing
    ContentEditor,
    /// Single-admin account issued by the login route
    Admin,
}

impl AdminRole {
    /// Parse a role claim; unknown roles yield None
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "super_admin" => Some(Self::SuperAdmin),
            "content_editor" => Some(Self::ContentEditor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::ContentEditor => "content_editor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a permission against a role and its permission list.
///
/// Super admins and holders of `all` pass every check.
pub fn has_permission(role: AdminRole, permissions: Option<&[String]>, permission: &str) -> bool {
    if role == AdminRole::SuperAdmin {
        return true;
    }

    permissions
        .map(|list| list.iter().any(|p| p == PERMISSION_ALL || p == permission))
        .unwrap_or(false)
}
