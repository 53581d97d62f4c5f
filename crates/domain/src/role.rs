use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use linc_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{PermissionDefinition, PermissionName};

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role with the permissions it grants by default.
///
/// Only constructible through [`RoleDefinition::new`], which keeps the
/// permission list and the default grant set in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    role_id: RoleId,
    display_name: NonEmptyString,
    hierarchy_level: u16,
    permissions: Vec<PermissionDefinition>,
    default_permissions: BTreeSet<PermissionName>,
}

impl RoleDefinition {
    /// Creates a validated role definition.
    ///
    /// Repeated permission names collapse into one grant.
    pub fn new(
        role_id: RoleId,
        display_name: impl Into<String>,
        hierarchy_level: u16,
        permissions: Vec<PermissionDefinition>,
    ) -> AppResult<Self> {
        let mut default_permissions = BTreeSet::new();
        let mut unique_permissions = Vec::with_capacity(permissions.len());
        for permission in permissions {
            if default_permissions.insert(permission.name().clone()) {
                unique_permissions.push(permission);
            }
        }
        unique_permissions.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(Self {
            role_id,
            display_name: NonEmptyString::new(display_name)?,
            hierarchy_level,
            permissions: unique_permissions,
            default_permissions,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the role display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the role hierarchy level.
    #[must_use]
    pub fn hierarchy_level(&self) -> u16 {
        self.hierarchy_level
    }

    /// Returns the granted permission definitions ordered by name.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionDefinition] {
        &self.permissions
    }

    /// Returns the names granted by default to holders of this role.
    #[must_use]
    pub fn default_permissions(&self) -> &BTreeSet<PermissionName> {
        &self.default_permissions
    }

    /// Returns whether the role grants a permission by default.
    #[must_use]
    pub fn grants_by_default(&self, name: &str) -> bool {
        self.default_permissions.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use uuid::Uuid;

    use super::{RoleDefinition, RoleId};
    use crate::permission::PermissionDefinition;

    fn role(display_name: &str, names: &[&str]) -> RoleDefinition {
        let permissions = names
            .iter()
            .filter_map(|name| PermissionDefinition::new(*name, "", "", None).ok())
            .collect();
        match RoleDefinition::new(RoleId::from_uuid(Uuid::new_v4()), display_name, 1, permissions)
        {
            Ok(role) => role,
            Err(error) => panic!("invalid test role '{display_name}': {error}"),
        }
    }

    #[test]
    fn duplicate_grants_collapse() {
        let clerk = role("Clerk", &["users.read", "users.read", "fees.read"]);

        assert_eq!(clerk.permissions().len(), 2);
        assert_eq!(clerk.default_permissions().len(), 2);
        assert!(clerk.grants_by_default("users.read"));
        assert!(!clerk.grants_by_default("users.delete"));
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let result = RoleDefinition::new(RoleId::from_uuid(Uuid::new_v4()), " ", 1, Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn role_id_parses_uuid_text() {
        let uuid = Uuid::new_v4();
        let parsed = RoleId::from_str(uuid.to_string().as_str());

        assert_eq!(parsed.ok().map(|role_id| role_id.as_uuid()), Some(uuid));
        assert!(RoleId::from_str("clerk").is_err());
    }
}
