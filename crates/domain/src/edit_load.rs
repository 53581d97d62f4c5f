//! Tracks the two independent fetches that feed an edit form.
//!
//! The role catalog and the user's actual permissions arrive in any order.
//! Reconciliation only happens once both slots are filled, and never after
//! the load is abandoned. The assigned role comes from the user record the
//! caller already holds, not from either fetch.

use std::collections::BTreeSet;

use crate::permission::PermissionName;
use crate::role::{RoleDefinition, RoleId};
use crate::user::{UserId, UserSummary};
use crate::user_permission_form::UserPermissionForm;

/// Progress of an edit-form load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditLoadProgress {
    /// At least one fetch has not landed yet.
    Pending,
    /// The form was closed; late results must not be applied.
    Abandoned,
    /// Both fetches landed and the form is reconciled.
    Ready(ReconciledEditForm),
}

/// Edit form built once both fetches completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEditForm {
    /// Reconciled form state.
    pub form: UserPermissionForm,
    /// Role catalog received during the load.
    pub roles: Vec<RoleDefinition>,
    /// Non-fatal problems found while reconciling.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActualPermissions {
    Known(BTreeSet<PermissionName>),
    Unavailable,
}

/// Edit-form load with one slot per independent fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditLoadState {
    user_id: UserId,
    assigned_role: Option<RoleId>,
    role_catalog: Option<Vec<RoleDefinition>>,
    actual_permissions: Option<ActualPermissions>,
    abandoned: bool,
}

impl EditLoadState {
    /// Starts tracking a load for one existing user.
    #[must_use]
    pub fn new(user: &UserSummary) -> Self {
        Self {
            user_id: user.user_id(),
            assigned_role: user.role_id(),
            role_catalog: None,
            actual_permissions: None,
            abandoned: false,
        }
    }

    /// Returns the user being loaded.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Stores the role catalog, replacing any earlier value.
    pub fn receive_role_catalog(&mut self, roles: Vec<RoleDefinition>) -> EditLoadProgress {
        if !self.abandoned {
            self.role_catalog = Some(roles);
        }
        self.progress()
    }

    /// Stores the permissions the user actually holds.
    pub fn receive_user_permissions(
        &mut self,
        permissions: BTreeSet<PermissionName>,
    ) -> EditLoadProgress {
        self.fill_permissions(ActualPermissions::Known(permissions))
    }

    /// Records that the user's permissions could not be fetched.
    ///
    /// The assigned role then opens at its defaults with no overrides.
    pub fn user_permissions_unavailable(&mut self) -> EditLoadProgress {
        self.fill_permissions(ActualPermissions::Unavailable)
    }

    /// Marks the load abandoned and drops anything received so far.
    pub fn abandon(&mut self) {
        self.abandoned = true;
        self.role_catalog = None;
        self.actual_permissions = None;
    }

    /// Returns whether both fetches have landed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.role_catalog.is_some() && self.actual_permissions.is_some()
    }

    /// Computes the current progress without consuming received data.
    #[must_use]
    pub fn progress(&self) -> EditLoadProgress {
        if self.abandoned {
            return EditLoadProgress::Abandoned;
        }

        let (Some(roles), Some(actual)) = (&self.role_catalog, &self.actual_permissions) else {
            return EditLoadProgress::Pending;
        };

        EditLoadProgress::Ready(reconcile(self.user_id, self.assigned_role, roles, actual))
    }

    fn fill_permissions(&mut self, actual: ActualPermissions) -> EditLoadProgress {
        if !self.abandoned {
            self.actual_permissions = Some(actual);
        }
        self.progress()
    }
}

fn reconcile(
    user_id: UserId,
    assigned_role: Option<RoleId>,
    roles: &[RoleDefinition],
    actual: &ActualPermissions,
) -> ReconciledEditForm {
    let mut warnings = Vec::new();

    let role = match assigned_role {
        Some(role_id) => {
            let role = roles.iter().find(|role| role.role_id() == role_id);
            if role.is_none() {
                warnings.push(format!("assigned role '{role_id}' is not in the role catalog"));
            }
            role
        }
        None => {
            if let ActualPermissions::Known(permissions) = actual
                && !permissions.is_empty()
            {
                warnings.push(format!(
                    "user holds {} permissions but has no role assigned",
                    permissions.len()
                ));
            }
            None
        }
    };

    let form = match (role, actual) {
        (Some(role), ActualPermissions::Known(permissions)) => {
            UserPermissionForm::reconciled(user_id, role.clone(), permissions)
        }
        (Some(role), ActualPermissions::Unavailable) => {
            let mut form = UserPermissionForm::for_edit(user_id);
            form.select_role(role.clone());
            form
        }
        (None, _) => UserPermissionForm::for_edit(user_id),
    };

    ReconciledEditForm {
        form,
        roles: roles.to_vec(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use uuid::Uuid;

    use super::{EditLoadProgress, EditLoadState};
    use crate::permission::{PermissionDefinition, PermissionName};
    use crate::role::{RoleDefinition, RoleId};
    use crate::user::{UserId, UserSummary};

    fn names(values: &[&str]) -> BTreeSet<PermissionName> {
        values
            .iter()
            .filter_map(|value| PermissionName::new(*value).ok())
            .collect()
    }

    fn clerk() -> RoleDefinition {
        let permissions = ["users.read", "users.update"]
            .iter()
            .filter_map(|name| PermissionDefinition::new(*name, "", "Users", None).ok())
            .collect();
        match RoleDefinition::new(RoleId::from_uuid(Uuid::new_v4()), "Clerk", 1, permissions) {
            Ok(role) => role,
            Err(error) => panic!("invalid test role: {error}"),
        }
    }

    fn user_with(role_id: Option<RoleId>) -> UserSummary {
        UserSummary::new(UserId::from_uuid(Uuid::new_v4()), "rabe", role_id)
    }

    fn ready_overrides(progress: EditLoadProgress) -> Vec<(String, bool)> {
        let EditLoadProgress::Ready(reconciled) = progress else {
            panic!("load should be ready");
        };
        reconciled
            .form
            .role_editor()
            .map(|editor| {
                editor
                    .overrides()
                    .iter()
                    .map(|(name, value)| (name.as_str().to_owned(), value))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn catalog_first_then_permissions_reconciles() {
        let role = clerk();
        let mut state = EditLoadState::new(&user_with(Some(role.role_id())));

        let progress = state.receive_role_catalog(vec![role.clone()]);
        assert_eq!(progress, EditLoadProgress::Pending);

        let progress = state.receive_user_permissions(names(&["users.read", "users.delete"]));

        assert_eq!(
            ready_overrides(progress),
            vec![
                ("users.delete".to_owned(), true),
                ("users.update".to_owned(), false)
            ]
        );
    }

    #[test]
    fn assigned_role_comes_from_user_record() {
        let role = clerk();
        let mut state = EditLoadState::new(&user_with(Some(role.role_id())));
        state.receive_user_permissions(names(&["users.read", "users.update", "users.delete"]));

        let EditLoadProgress::Ready(reconciled) = state.receive_role_catalog(vec![role.clone()])
        else {
            panic!("load should be ready");
        };

        assert_eq!(
            reconciled.form.selected_role().map(RoleDefinition::role_id),
            Some(role.role_id())
        );
        assert_eq!(
            reconciled
                .form
                .role_editor()
                .map(|editor| editor.overrides().to_wire()),
            Some(BTreeMap::from([("users.delete".to_owned(), true)]))
        );
        assert!(reconciled.warnings.is_empty());
    }

    #[test]
    fn arrival_order_does_not_change_result() {
        let role = clerk();
        let user = user_with(Some(role.role_id()));

        let mut catalog_first = EditLoadState::new(&user);
        catalog_first.receive_role_catalog(vec![role.clone()]);
        let first = catalog_first.receive_user_permissions(names(&["users.read"]));

        let mut permissions_first = EditLoadState::new(&user);
        let pending = permissions_first.receive_user_permissions(names(&["users.read"]));
        assert_eq!(pending, EditLoadProgress::Pending);
        let second = permissions_first.receive_role_catalog(vec![role]);

        assert_eq!(first, second);
    }

    #[test]
    fn unavailable_permissions_open_role_at_defaults() {
        let role = clerk();
        let mut state = EditLoadState::new(&user_with(Some(role.role_id())));
        state.receive_role_catalog(vec![role.clone()]);

        let EditLoadProgress::Ready(reconciled) = state.user_permissions_unavailable() else {
            panic!("load should be ready");
        };

        assert!(reconciled.form.selected_role().is_some());
        assert_eq!(
            reconciled.form.effective_permissions(),
            role.default_permissions().clone()
        );
        assert!(
            reconciled
                .form
                .role_editor()
                .is_some_and(|editor| editor.overrides().is_empty())
        );
    }

    #[test]
    fn abandoned_load_ignores_late_results() {
        let role = clerk();
        let mut state = EditLoadState::new(&user_with(Some(role.role_id())));
        state.receive_role_catalog(vec![role]);

        state.abandon();
        let progress = state.receive_user_permissions(names(&["users.read"]));

        assert_eq!(progress, EditLoadProgress::Abandoned);
        assert!(!state.is_complete());
    }

    #[test]
    fn unknown_role_opens_without_role_and_warns() {
        let mut state = EditLoadState::new(&user_with(Some(RoleId::from_uuid(Uuid::new_v4()))));
        state.receive_user_permissions(names(&["users.read"]));

        let EditLoadProgress::Ready(reconciled) = state.receive_role_catalog(vec![clerk()]) else {
            panic!("load should be ready");
        };

        assert!(reconciled.form.selected_role().is_none());
        assert_eq!(reconciled.warnings.len(), 1);
    }

    #[test]
    fn user_without_role_opens_empty_form() {
        let mut state = EditLoadState::new(&user_with(None));
        state.receive_role_catalog(vec![clerk()]);

        let EditLoadProgress::Ready(reconciled) = state.receive_user_permissions(BTreeSet::new())
        else {
            panic!("load should be ready");
        };

        assert!(reconciled.form.effective_permissions().is_empty());
        assert!(reconciled.warnings.is_empty());
    }
}
