use std::collections::BTreeSet;

use async_trait::async_trait;

use linc_core::{AppResult, OperatorSession};
use linc_domain::{
    NewUserProfile, PermissionName, RoleDefinition, UserId, UserPermissionSubmission, UserSummary,
};

/// Repository port for the read-only role catalog.
#[async_trait]
pub trait RoleCatalogRepository: Send + Sync {
    /// Lists every role with its default permissions.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;
}

/// Repository port for per-user permission state.
#[async_trait]
pub trait UserPermissionRepository: Send + Sync {
    /// Returns an existing user with the assigned role.
    async fn fetch_user(&self, user_id: UserId) -> AppResult<UserSummary>;

    /// Returns the permissions a user currently holds.
    async fn fetch_user_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeSet<PermissionName>>;

    /// Replaces a user's role and permissions.
    async fn update_user_permissions(
        &self,
        user_id: UserId,
        submission: &UserPermissionSubmission,
    ) -> AppResult<()>;

    /// Creates a user with a role and permissions. Returns the assigned user ID.
    async fn create_user(
        &self,
        profile: &NewUserProfile,
        submission: &UserPermissionSubmission,
    ) -> AppResult<UserId>;
}

/// Port resolving the operator behind the current credentials.
#[async_trait]
pub trait OperatorSessionProvider: Send + Sync {
    /// Returns the authenticated operator.
    async fn current_operator(&self) -> AppResult<OperatorSession>;
}
