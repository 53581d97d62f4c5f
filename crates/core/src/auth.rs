use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult};

/// Permission value that grants every permission check.
pub const WILDCARD_PERMISSION: &str = "*";

/// Authenticated console operator, passed explicitly to every use-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSession {
    user_id: Uuid,
    username: String,
    display_name: String,
    email: Option<String>,
    hierarchy_level: u16,
    is_superuser: bool,
    permissions: BTreeSet<String>,
}

impl OperatorSession {
    /// Creates an operator session from authentication data.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        hierarchy_level: u16,
        is_superuser: bool,
        permissions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            display_name: display_name.into(),
            email,
            hierarchy_level,
            is_superuser,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the backend user identifier.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the display name for the current operator.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the backend returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the highest role hierarchy level held by the operator.
    #[must_use]
    pub fn hierarchy_level(&self) -> u16 {
        self.hierarchy_level
    }

    /// Returns whether the operator bypasses permission checks.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.is_superuser || self.permissions.contains(WILDCARD_PERMISSION)
    }

    /// Returns the effective permission names granted to the operator.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Returns whether the operator holds a permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_superuser() || self.permissions.contains(permission)
    }

    /// Ensures the operator holds a permission.
    pub fn require_permission(&self, permission: &str) -> AppResult<()> {
        if self.has_permission(permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "operator '{}' is missing permission '{permission}'",
            self.username
        )))
    }

    /// Returns whether the operator may assign a role at the given hierarchy level.
    #[must_use]
    pub fn can_assign_hierarchy_level(&self, level: u16) -> bool {
        self.is_superuser() || level <= self.hierarchy_level
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::OperatorSession;
    use crate::AppError;

    fn operator(level: u16, permissions: &[&str]) -> OperatorSession {
        OperatorSession::new(
            Uuid::new_v4(),
            "rakoto",
            "Rakoto Jean",
            None,
            level,
            false,
            permissions.iter().map(|value| (*value).to_owned()),
        )
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let session = operator(2, &["users.read"]);

        assert!(session.require_permission("users.read").is_ok());
        assert!(matches!(
            session.require_permission("users.update"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn wildcard_permission_acts_as_superuser() {
        let session = operator(1, &["*"]);

        assert!(session.has_permission("fees.update"));
        assert!(session.can_assign_hierarchy_level(9));
    }

    #[test]
    fn hierarchy_level_caps_assignable_roles() {
        let session = operator(2, &["users.update"]);

        assert!(session.can_assign_hierarchy_level(2));
        assert!(session.can_assign_hierarchy_level(1));
        assert!(!session.can_assign_hierarchy_level(3));
    }
}
