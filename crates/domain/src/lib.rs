//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod edit_load;
mod permission;
mod permission_overrides;
mod role;
mod security;
mod user;
mod user_permission_form;

pub use edit_load::{EditLoadProgress, EditLoadState, ReconciledEditForm};
pub use permission::{PermissionCatalog, PermissionDefinition, PermissionName};
pub use permission_overrides::{
    PermissionOverrides, compute_overrides_from_actual, effective_permissions,
    reset_for_role_change, toggle,
};
pub use role::{RoleDefinition, RoleId};
pub use security::ConsolePermission;
pub use user::{EmailAddress, NewUserProfile, USERNAME_MAX_LENGTH, UserId, UserSummary};
pub use user_permission_form::{
    RolePermissionEditor, RoleSelection, UserFormMode, UserPermissionForm,
    UserPermissionSubmission,
};
