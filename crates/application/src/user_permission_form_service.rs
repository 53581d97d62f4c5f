//! User-management form use-cases.
//!
//! Opening an edit form issues the role-catalog and user-permission fetches
//! concurrently and reconciles overrides against the user's assigned role
//! once both have landed, whichever arrives first. Closing the form before
//! that abandons the load.

use std::future::Future;
use std::sync::Arc;

use linc_core::{AppError, AppResult, OperatorSession};
use linc_domain::{
    ConsolePermission, EditLoadProgress, EditLoadState, NewUserProfile, RoleDefinition,
    UserFormMode, UserId, UserPermissionForm, UserPermissionSubmission, UserSummary,
};

use crate::permission_lookup::PermissionLookup;
use crate::user_admin_ports::{RoleCatalogRepository, UserPermissionRepository};

/// Banner shown when lookup data could not be loaded.
pub const LOAD_FAILURE_BANNER: &str =
    "Some user data could not be loaded. Permissions shown may be incomplete.";

/// User form opened for editing or creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedUserForm {
    /// Form state ready for operator edits.
    pub form: UserPermissionForm,
    /// Roles and permission catalog to render.
    pub lookup: PermissionLookup,
    /// Generic error banner, set only when a fetch failed.
    pub banner: Option<String>,
    /// Detailed load problems for logging.
    pub warnings: Vec<String>,
}

/// Application service for the user form's role and permission section.
#[derive(Clone)]
pub struct UserPermissionFormService {
    role_catalog: Arc<dyn RoleCatalogRepository>,
    user_permissions: Arc<dyn UserPermissionRepository>,
}

impl UserPermissionFormService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        role_catalog: Arc<dyn RoleCatalogRepository>,
        user_permissions: Arc<dyn UserPermissionRepository>,
    ) -> Self {
        Self {
            role_catalog,
            user_permissions,
        }
    }

    /// Loads lookup data for the form.
    pub async fn load_lookup(&self, actor: &OperatorSession) -> AppResult<PermissionLookup> {
        actor.require_permission(ConsolePermission::RolesRead.as_str())?;

        let roles = self.role_catalog.list_roles().await?;
        Ok(PermissionLookup::from_roles(roles))
    }

    /// Loads an existing user with the assigned role.
    pub async fn load_user(
        &self,
        actor: &OperatorSession,
        user_id: UserId,
    ) -> AppResult<UserSummary> {
        actor.require_permission(ConsolePermission::UsersRead.as_str())?;

        self.user_permissions.fetch_user(user_id).await
    }

    /// Opens an empty form for a new user.
    ///
    /// A failed role-catalog fetch opens the form with no roles and a banner.
    pub async fn open_create_form(&self, actor: &OperatorSession) -> AppResult<OpenedUserForm> {
        actor.require_permission(ConsolePermission::UsersCreate.as_str())?;
        actor.require_permission(ConsolePermission::RolesRead.as_str())?;

        let (roles, warnings) = match self.role_catalog.list_roles().await {
            Ok(roles) => (roles, Vec::new()),
            Err(error) => (Vec::new(), vec![format!("role catalog fetch failed: {error}")]),
        };

        Ok(OpenedUserForm {
            form: UserPermissionForm::for_create(),
            lookup: PermissionLookup::from_roles(roles),
            banner: banner_for(warnings.len()),
            warnings,
        })
    }

    /// Opens an existing user for editing.
    ///
    /// Returns `Ok(None)` when `closed` resolves before both fetches land.
    /// A failed catalog fetch opens with no roles; a failed permissions fetch
    /// opens the assigned role at its defaults. Either sets a banner.
    pub async fn open_edit_form<C>(
        &self,
        actor: &OperatorSession,
        user: &UserSummary,
        closed: C,
    ) -> AppResult<Option<OpenedUserForm>>
    where
        C: Future,
    {
        actor.require_permission(ConsolePermission::UsersRead.as_str())?;
        actor.require_permission(ConsolePermission::UsersUpdate.as_str())?;
        actor.require_permission(ConsolePermission::RolesRead.as_str())?;

        let roles_fetch = self.role_catalog.list_roles();
        let permissions_fetch = self.user_permissions.fetch_user_permissions(user.user_id());
        tokio::pin!(roles_fetch, permissions_fetch, closed);

        let mut state = EditLoadState::new(user);
        let mut roles_received = false;
        let mut permissions_received = false;
        let mut fetch_warnings = Vec::new();

        loop {
            let progress = tokio::select! {
                _ = &mut closed => {
                    state.abandon();
                    state.progress()
                }
                roles = &mut roles_fetch, if !roles_received => {
                    roles_received = true;
                    let roles = roles.unwrap_or_else(|error| {
                        fetch_warnings.push(format!("role catalog fetch failed: {error}"));
                        Vec::<RoleDefinition>::new()
                    });
                    state.receive_role_catalog(roles)
                }
                permissions = &mut permissions_fetch, if !permissions_received => {
                    permissions_received = true;
                    match permissions {
                        Ok(permissions) => state.receive_user_permissions(permissions),
                        Err(error) => {
                            fetch_warnings.push(format!("user permissions fetch failed: {error}"));
                            state.user_permissions_unavailable()
                        }
                    }
                }
            };

            match progress {
                EditLoadProgress::Pending => continue,
                EditLoadProgress::Abandoned => return Ok(None),
                EditLoadProgress::Ready(reconciled) => {
                    let fetch_failures = fetch_warnings.len();
                    let mut warnings = fetch_warnings;
                    warnings.extend(reconciled.warnings);

                    let lookup = PermissionLookup::from_roles(reconciled.roles)
                        .including(&reconciled.form.effective_permissions());

                    return Ok(Some(OpenedUserForm {
                        form: reconciled.form,
                        lookup,
                        banner: banner_for(fetch_failures),
                        warnings,
                    }));
                }
            }
        }
    }

    /// Saves the role and permissions of an existing user.
    pub async fn save_user_permissions(
        &self,
        actor: &OperatorSession,
        form: &UserPermissionForm,
    ) -> AppResult<UserPermissionSubmission> {
        actor.require_permission(ConsolePermission::UsersUpdate.as_str())?;

        let UserFormMode::Edit(user_id) = form.mode() else {
            return Err(AppError::Validation(
                "only edit forms can update an existing user".to_owned(),
            ));
        };

        let submission = checked_submission(actor, form)?;
        self.user_permissions
            .update_user_permissions(user_id, &submission)
            .await?;

        Ok(submission)
    }

    /// Creates a user from a create form.
    pub async fn create_user(
        &self,
        actor: &OperatorSession,
        profile: &NewUserProfile,
        form: &UserPermissionForm,
    ) -> AppResult<UserId> {
        actor.require_permission(ConsolePermission::UsersCreate.as_str())?;

        if form.mode() != UserFormMode::Create {
            return Err(AppError::Validation(
                "only create forms can create a user".to_owned(),
            ));
        }

        let submission = checked_submission(actor, form)?;
        self.user_permissions
            .create_user(profile, &submission)
            .await
    }
}

fn checked_submission(
    actor: &OperatorSession,
    form: &UserPermissionForm,
) -> AppResult<UserPermissionSubmission> {
    let submission = form.submission()?;

    if let Some(role) = form.selected_role()
        && !actor.can_assign_hierarchy_level(role.hierarchy_level())
    {
        return Err(AppError::Forbidden(format!(
            "operator '{}' cannot assign role '{}' at hierarchy level {}",
            actor.username(),
            role.display_name(),
            role.hierarchy_level()
        )));
    }

    Ok(submission)
}

fn banner_for(fetch_failures: usize) -> Option<String> {
    (fetch_failures > 0).then(|| LOAD_FAILURE_BANNER.to_owned())
}
