//! User identity types used by the user-management form.

use std::str::FromStr;

use linc_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::RoleId;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a user identifier from an existing UUID value.
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

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Existing user as listed by the backend, including the assigned role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    user_id: UserId,
    username: String,
    role_id: Option<RoleId>,
}

impl UserSummary {
    /// Creates a summary for an existing user.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, role_id: Option<RoleId>) -> Self {
        Self {
            user_id,
            username: username.into(),
            role_id,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the assigned role, if the user has one.
    #[must_use]
    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lowercased email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@' and a local part".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Maximum username length accepted by the backend.
pub const USERNAME_MAX_LENGTH: usize = 50;

/// Profile fields captured when creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserProfile {
    username: String,
    email: EmailAddress,
    full_name: NonEmptyString,
}

impl NewUserProfile {
    /// Creates a validated new-user profile.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
    ) -> AppResult<Self> {
        let username: String = username.into();
        let username = username.trim().to_lowercase();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "username must be non-empty and must not contain whitespace".to_owned(),
            ));
        }

        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "username must not exceed {USERNAME_MAX_LENGTH} characters"
            )));
        }

        let full_name: String = full_name.into();

        Ok(Self {
            username,
            email: EmailAddress::new(email)?,
            full_name: NonEmptyString::new(full_name.trim())?,
        })
    }

    /// Returns the normalized username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the full name.
    #[must_use]
    pub fn full_name(&self) -> &NonEmptyString {
        &self.full_name
    }
}
