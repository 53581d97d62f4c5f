//! Application services and ports.

#![forbid(unsafe_code)]

mod permission_lookup;
mod user_admin_ports;
mod user_permission_form_service;

pub use permission_lookup::PermissionLookup;
pub use user_admin_ports::{
    OperatorSessionProvider, RoleCatalogRepository, UserPermissionRepository,
};
pub use user_permission_form_service::{
    LOAD_FAILURE_BANNER, OpenedUserForm, UserPermissionFormService,
};
