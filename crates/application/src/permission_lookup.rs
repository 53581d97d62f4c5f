use linc_core::OperatorSession;
use linc_domain::{PermissionCatalog, PermissionDefinition, PermissionName, RoleDefinition, RoleId};

/// Lookup data handed to the user form instead of ambient shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionLookup {
    roles: Vec<RoleDefinition>,
    catalog: PermissionCatalog,
}

impl PermissionLookup {
    /// Builds lookup data from a role catalog.
    ///
    /// Roles are ordered by hierarchy level, then display name. The
    /// permission catalog is the union of every role's embedded permissions.
    #[must_use]
    pub fn from_roles(mut roles: Vec<RoleDefinition>) -> Self {
        roles.sort_by(|left, right| {
            left.hierarchy_level()
                .cmp(&right.hierarchy_level())
                .then_with(|| left.display_name().cmp(right.display_name()))
        });
        let catalog = PermissionCatalog::from_definitions(
            roles
                .iter()
                .flat_map(|role| role.permissions().iter().cloned()),
        );

        Self { roles, catalog }
    }

    /// Adds catalog entries for names no role grants, e.g. user-level grants.
    #[must_use]
    pub fn including<'a>(self, names: impl IntoIterator<Item = &'a PermissionName>) -> Self {
        let extra: Vec<PermissionDefinition> = names
            .into_iter()
            .filter(|name| !self.catalog.contains(name.as_str()))
            .filter_map(|name| PermissionDefinition::new(name.as_str(), "", "", None).ok())
            .collect();
        if extra.is_empty() {
            return self;
        }

        let catalog = PermissionCatalog::from_definitions(self.catalog.iter().cloned().chain(extra));
        Self {
            roles: self.roles,
            catalog,
        }
    }

    /// Returns all roles in display order.
    #[must_use]
    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    /// Finds a role by identifier.
    #[must_use]
    pub fn role(&self, role_id: RoleId) -> Option<&RoleDefinition> {
        self.roles.iter().find(|role| role.role_id() == role_id)
    }

    /// Returns the permission catalog.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Returns roles the operator is allowed to assign.
    #[must_use]
    pub fn assignable_roles(&self, actor: &OperatorSession) -> Vec<&RoleDefinition> {
        self.roles
            .iter()
            .filter(|role| actor.can_assign_hierarchy_level(role.hierarchy_level()))
            .collect()
    }
}
