/// Console permissions checked before user-management use-cases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsolePermission {
    /// Allows reading users and their permissions.
    UsersRead,
    /// Allows creating users.
    UsersCreate,
    /// Allows changing a user's role and permission overrides.
    UsersUpdate,
    /// Allows reading the role catalog.
    RolesRead,
}

impl ConsolePermission {
    /// Returns the backend permission name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsersRead => "users.read",
            Self::UsersCreate => "users.create",
            Self::UsersUpdate => "users.update",
            Self::RolesRead => "roles.read",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConsolePermission;
    use crate::permission::PermissionName;

    #[test]
    fn backend_names_are_valid_permission_names() {
        for permission in [
            ConsolePermission::UsersRead,
            ConsolePermission::UsersCreate,
            ConsolePermission::UsersUpdate,
            ConsolePermission::RolesRead,
        ] {
            let name = PermissionName::new(permission.as_str());
            assert_eq!(
                name.as_ref().map(PermissionName::as_str).ok(),
                Some(permission.as_str())
            );
        }
    }
}
