use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use linc_core::{AppError, AppResult, OperatorSession};
use linc_domain::{
    NewUserProfile, PermissionDefinition, PermissionName, RoleDefinition, RoleId, UserId,
    UserPermissionSubmission, UserSummary,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Permission entry embedded in role and user payloads.
#[derive(Debug, Deserialize)]
pub(crate) struct PermissionResponse {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

/// Role catalog entry.
#[derive(Debug, Deserialize)]
pub(crate) struct RoleResponse {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) hierarchy_level: u16,
    #[serde(default)]
    pub(crate) permissions: Vec<PermissionResponse>,
}

/// Permissions a user currently holds.
#[derive(Debug, Deserialize)]
pub(crate) struct UserPermissionsResponse {
    #[serde(default)]
    pub(crate) permissions: Vec<PermissionResponse>,
}

/// Existing user record with the assigned role.
#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) role_id: Option<String>,
}

/// Operator behind the bearer token.
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentOperatorResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) hierarchy_level: u16,
    #[serde(default)]
    pub(crate) is_superuser: bool,
    #[serde(default)]
    pub(crate) permissions: Vec<String>,
}

/// Identifier returned after creating a user.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedUserResponse {
    pub(crate) id: String,
}

/// Backend error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetailResponse {
    pub(crate) detail: serde_json::Value,
}

/// Outgoing payload replacing a user's role and permissions.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-user-permissions-request.ts"
)]
pub struct UpdateUserPermissionsRequest {
    pub role_id: String,
    pub permission_names: Vec<String>,
    pub permission_overrides: BTreeMap<String, bool>,
}

/// Outgoing payload creating a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role_id: String,
    pub permission_names: Vec<String>,
    pub permission_overrides: BTreeMap<String, bool>,
}

impl PermissionResponse {
    pub(crate) fn try_into_definition(self) -> AppResult<PermissionDefinition> {
        PermissionDefinition::new(
            self.name,
            self.display_name.unwrap_or_default(),
            self.category.unwrap_or_default(),
            self.description,
        )
    }
}

impl RoleResponse {
    pub(crate) fn try_into_role(self) -> AppResult<RoleDefinition> {
        let role_id = RoleId::from_str(self.id.as_str())?;
        let permissions = self
            .permissions
            .into_iter()
            .map(PermissionResponse::try_into_definition)
            .collect::<AppResult<Vec<_>>>()
            .map_err(|error| {
                AppError::Validation(format!(
                    "role '{}' has an invalid permission: {error}",
                    self.display_name
                ))
            })?;

        RoleDefinition::new(role_id, self.display_name, self.hierarchy_level, permissions)
    }
}

impl UserPermissionsResponse {
    pub(crate) fn try_into_permissions(self) -> AppResult<BTreeSet<PermissionName>> {
        self.permissions
            .into_iter()
            .map(|permission| PermissionName::new(permission.name))
            .collect()
    }
}

impl UserResponse {
    pub(crate) fn try_into_summary(self) -> AppResult<UserSummary> {
        let user_id = UserId::from_str(self.id.as_str())?;
        let role_id = self
            .role_id
            .filter(|value| !value.trim().is_empty())
            .map(|value| RoleId::from_str(value.as_str()))
            .transpose()?;

        Ok(UserSummary::new(user_id, self.username, role_id))
    }
}

impl CurrentOperatorResponse {
    pub(crate) fn try_into_session(self) -> AppResult<OperatorSession> {
        let user_id = Uuid::parse_str(self.id.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid operator id '{}': {error}", self.id))
        })?;
        let display_name = self
            .full_name
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.username.clone());

        Ok(OperatorSession::new(
            user_id,
            self.username,
            display_name,
            self.email,
            self.hierarchy_level,
            self.is_superuser,
            self.permissions,
        ))
    }
}

impl CreatedUserResponse {
    pub(crate) fn try_into_user_id(self) -> AppResult<UserId> {
        UserId::from_str(self.id.as_str())
    }
}

impl ErrorDetailResponse {
    pub(crate) fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&UserPermissionSubmission> for UpdateUserPermissionsRequest {
    fn from(submission: &UserPermissionSubmission) -> Self {
        Self {
            role_id: submission.role_id.to_string(),
            permission_names: submission.permission_names.clone(),
            permission_overrides: submission.permission_overrides.clone(),
        }
    }
}

impl CreateUserRequest {
    pub(crate) fn new(profile: &NewUserProfile, submission: &UserPermissionSubmission) -> Self {
        Self {
            username: profile.username().to_owned(),
            email: profile.email().as_str().to_owned(),
            full_name: profile.full_name().as_str().to_owned(),
            role_id: submission.role_id.to_string(),
            permission_names: submission.permission_names.clone(),
            permission_overrides: submission.permission_overrides.clone(),
        }
    }
}
