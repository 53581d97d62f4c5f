use std::collections::BTreeMap;

use linc_application::OpenedUserForm;
use linc_core::OperatorSession;
use linc_domain::RoleDefinition;
use serde::Serialize;

/// Printable summary of one user's role and permission state.
#[derive(Debug, Serialize)]
pub struct PermissionReview {
    pub user_id: Option<String>,
    pub role: Option<RoleSummary>,
    pub assignable_roles: Vec<RoleSummary>,
    pub permission_overrides: BTreeMap<String, bool>,
    pub effective_permissions: Vec<String>,
    pub categories: BTreeMap<String, Vec<PermissionRow>>,
    pub banner: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub id: String,
    pub display_name: String,
    pub hierarchy_level: u16,
}

#[derive(Debug, Serialize)]
pub struct PermissionRow {
    pub name: String,
    pub display_name: String,
    pub role_default: bool,
    pub granted: bool,
    pub overridden: bool,
}

impl From<&RoleDefinition> for RoleSummary {
    fn from(role: &RoleDefinition) -> Self {
        Self {
            id: role.role_id().to_string(),
            display_name: role.display_name().as_str().to_owned(),
            hierarchy_level: role.hierarchy_level(),
        }
    }
}

impl PermissionReview {
    pub fn new(actor: &OperatorSession, opened: &OpenedUserForm) -> Self {
        let editor = opened.form.role_editor();
        let user_id = match opened.form.mode() {
            linc_domain::UserFormMode::Edit(user_id) => Some(user_id.to_string()),
            linc_domain::UserFormMode::Create => None,
        };

        let categories = opened
            .lookup
            .catalog()
            .by_category()
            .into_iter()
            .map(|(category, definitions)| {
                let rows = definitions
                    .into_iter()
                    .map(|definition| {
                        let name = definition.name().as_str();
                        PermissionRow {
                            name: name.to_owned(),
                            display_name: definition.display_name().to_owned(),
                            role_default: editor
                                .is_some_and(|editor| editor.role().grants_by_default(name)),
                            granted: editor.is_some_and(|editor| editor.is_granted(name)),
                            overridden: editor.is_some_and(|editor| editor.is_overridden(name)),
                        }
                    })
                    .collect();
                (category.to_owned(), rows)
            })
            .collect();

        Self {
            user_id,
            role: opened.form.selected_role().map(RoleSummary::from),
            assignable_roles: opened
                .lookup
                .assignable_roles(actor)
                .into_iter()
                .map(RoleSummary::from)
                .collect(),
            permission_overrides: editor
                .map(|editor| editor.overrides().to_wire())
                .unwrap_or_default(),
            effective_permissions: opened
                .form
                .effective_permissions()
                .into_iter()
                .map(String::from)
                .collect(),
            categories,
            banner: opened.banner.clone(),
            warnings: opened.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use linc_application::{OpenedUserForm, PermissionLookup};
    use linc_core::{AppResult, OperatorSession};
    use linc_domain::{
        PermissionDefinition, PermissionName, RoleDefinition, RoleId, UserId, UserPermissionForm,
    };
    use uuid::Uuid;

    use super::PermissionReview;

    #[test]
    fn review_reports_overrides_and_effective_permissions() -> AppResult<()> {
        let clerk = RoleDefinition::new(
            RoleId::from_uuid(Uuid::new_v4()),
            "Clerk",
            1,
            vec![
                PermissionDefinition::new("users.read", "View users", "Users", None)?,
                PermissionDefinition::new("users.update", "Edit users", "Users", None)?,
            ],
        )?;
        let actual: BTreeSet<PermissionName> = [
            PermissionName::new("users.read")?,
            PermissionName::new("orders.delete")?,
        ]
        .into_iter()
        .collect();
        let form = UserPermissionForm::reconciled(
            UserId::from_uuid(Uuid::new_v4()),
            clerk.clone(),
            &actual,
        );
        let lookup = PermissionLookup::from_roles(vec![clerk]).including(&actual);
        let opened = OpenedUserForm {
            form,
            lookup,
            banner: None,
            warnings: Vec::new(),
        };
        let actor = OperatorSession::new(
            Uuid::new_v4(),
            "supervisor",
            "Supervisor",
            None,
            3,
            false,
            ["users.update".to_owned()],
        );

        let review = PermissionReview::new(&actor, &opened);

        assert_eq!(
            review.effective_permissions,
            vec!["orders.delete", "users.read"]
        );
        assert_eq!(review.permission_overrides.get("orders.delete"), Some(&true));
        assert_eq!(review.permission_overrides.get("users.update"), Some(&false));
        assert_eq!(review.assignable_roles.len(), 1);
        let Some(users) = review.categories.get("Users") else {
            panic!("Users category should be listed");
        };
        assert!(users.iter().any(|row| row.name == "users.update"
            && row.role_default
            && !row.granted
            && row.overridden));
        Ok(())
    }
}
