use std::collections::{BTreeMap, BTreeSet};

use linc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::permission::PermissionName;
use crate::permission_overrides::{
    PermissionOverrides, compute_overrides_from_actual, effective_permissions,
    reset_for_role_change, toggle,
};
use crate::role::{RoleDefinition, RoleId};
use crate::user::UserId;

/// Whether the form creates a user or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFormMode {
    /// Creating a new user.
    Create,
    /// Editing an existing user.
    Edit(UserId),
}

/// Permission checkboxes for one selected role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionEditor {
    role: RoleDefinition,
    overrides: PermissionOverrides,
}

impl RolePermissionEditor {
    /// Starts editing a role with no overrides.
    #[must_use]
    pub fn new(role: RoleDefinition) -> Self {
        Self {
            role,
            overrides: reset_for_role_change(),
        }
    }

    /// Starts editing a role from the permissions a user actually holds.
    #[must_use]
    pub fn from_actual(role: RoleDefinition, actual_granted: &BTreeSet<PermissionName>) -> Self {
        let overrides = compute_overrides_from_actual(role.default_permissions(), actual_granted);
        Self { role, overrides }
    }

    /// Returns the selected role.
    #[must_use]
    pub fn role(&self) -> &RoleDefinition {
        &self.role
    }

    /// Returns the current override map.
    #[must_use]
    pub fn overrides(&self) -> &PermissionOverrides {
        &self.overrides
    }

    /// Applies one checkbox change.
    pub fn toggle(&mut self, permission_name: &PermissionName, desired_value: bool) {
        self.overrides = toggle(
            &self.overrides,
            permission_name,
            desired_value,
            self.role.default_permissions(),
        );
    }

    /// Returns the checkbox state for a permission.
    #[must_use]
    pub fn is_granted(&self, permission_name: &str) -> bool {
        self.overrides
            .get(permission_name)
            .unwrap_or_else(|| self.role.grants_by_default(permission_name))
    }

    /// Returns whether the checkbox state differs from the role default.
    #[must_use]
    pub fn is_overridden(&self, permission_name: &str) -> bool {
        self.overrides.get(permission_name).is_some()
    }

    /// Returns role defaults with overrides applied.
    #[must_use]
    pub fn effective_permissions(&self) -> BTreeSet<PermissionName> {
        effective_permissions(self.role.default_permissions(), &self.overrides)
    }
}

/// Role selection state of the user form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSelection {
    /// No role chosen yet; permission editing is disabled.
    NoRole,
    /// A role is chosen and its permissions can be edited.
    Selected(RolePermissionEditor),
}

/// In-memory state of the user-management form's permission section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissionForm {
    mode: UserFormMode,
    selection: RoleSelection,
}

impl UserPermissionForm {
    /// Creates an empty form for a new user.
    #[must_use]
    pub fn for_create() -> Self {
        Self {
            mode: UserFormMode::Create,
            selection: RoleSelection::NoRole,
        }
    }

    /// Creates an edit form that has not loaded any role yet.
    #[must_use]
    pub fn for_edit(user_id: UserId) -> Self {
        Self {
            mode: UserFormMode::Edit(user_id),
            selection: RoleSelection::NoRole,
        }
    }

    /// Creates an edit form reconciled against the user's actual permissions.
    #[must_use]
    pub fn reconciled(
        user_id: UserId,
        role: RoleDefinition,
        actual_granted: &BTreeSet<PermissionName>,
    ) -> Self {
        Self {
            mode: UserFormMode::Edit(user_id),
            selection: RoleSelection::Selected(RolePermissionEditor::from_actual(
                role,
                actual_granted,
            )),
        }
    }

    /// Returns the form mode.
    #[must_use]
    pub fn mode(&self) -> UserFormMode {
        self.mode
    }

    /// Returns the role selection state.
    #[must_use]
    pub fn selection(&self) -> &RoleSelection {
        &self.selection
    }

    /// Returns the selected role, if any.
    #[must_use]
    pub fn selected_role(&self) -> Option<&RoleDefinition> {
        self.role_editor().map(RolePermissionEditor::role)
    }

    /// Returns the selected-role editor, if a role is chosen.
    #[must_use]
    pub fn role_editor(&self) -> Option<&RolePermissionEditor> {
        match &self.selection {
            RoleSelection::NoRole => None,
            RoleSelection::Selected(editor) => Some(editor),
        }
    }

    /// Returns the mutable selected-role editor, if a role is chosen.
    pub fn role_editor_mut(&mut self) -> Option<&mut RolePermissionEditor> {
        match &mut self.selection {
            RoleSelection::NoRole => None,
            RoleSelection::Selected(editor) => Some(editor),
        }
    }

    /// Selects a role and returns whether existing overrides were discarded.
    ///
    /// Choosing the role that is already selected keeps its overrides.
    pub fn select_role(&mut self, role: RoleDefinition) -> bool {
        if let RoleSelection::Selected(editor) = &self.selection
            && editor.role().role_id() == role.role_id()
        {
            return false;
        }

        let discarded = self
            .role_editor()
            .is_some_and(|editor| !editor.overrides().is_empty());
        self.selection = RoleSelection::Selected(RolePermissionEditor::new(role));
        discarded
    }

    /// Clears the role and returns whether existing overrides were discarded.
    pub fn clear_role(&mut self) -> bool {
        let discarded = self
            .role_editor()
            .is_some_and(|editor| !editor.overrides().is_empty());
        self.selection = RoleSelection::NoRole;
        discarded
    }

    /// Returns the effective permissions, empty when no role is selected.
    #[must_use]
    pub fn effective_permissions(&self) -> BTreeSet<PermissionName> {
        self.role_editor()
            .map(RolePermissionEditor::effective_permissions)
            .unwrap_or_default()
    }

    /// Builds the payload submitted to the backend.
    pub fn submission(&self) -> AppResult<UserPermissionSubmission> {
        let editor = self.role_editor().ok_or_else(|| {
            AppError::Validation("a role must be selected before saving permissions".to_owned())
        })?;

        Ok(UserPermissionSubmission {
            role_id: editor.role().role_id(),
            permission_names: editor
                .effective_permissions()
                .into_iter()
                .map(String::from)
                .collect(),
            permission_overrides: editor.overrides().to_wire(),
        })
    }
}

/// Permission fields sent when saving a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionSubmission {
    /// Selected role.
    pub role_id: RoleId,
    /// Effective permission names, sorted.
    pub permission_names: Vec<String>,
    /// Raw override map kept for the audit trail.
    pub permission_overrides: BTreeMap<String, bool>,
}
