use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use linc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Globally unique permission identifier such as `users.update`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    ///
    /// Surrounding whitespace is trimmed. The remaining value must be
    /// non-empty and must not contain whitespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "permission name must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "permission name '{trimmed}' must not contain whitespace"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the permission name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the resource prefix, e.g. `users` for `users.update`.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.0
            .split_once('.')
            .map_or(self.0.as_str(), |(resource, _)| resource)
    }
}

impl Borrow<str> for PermissionName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Permission reference data shown next to each checkbox in the user form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    name: PermissionName,
    display_name: String,
    category: String,
    description: Option<String>,
}

impl PermissionDefinition {
    /// Creates a validated permission definition.
    ///
    /// A blank display name falls back to the permission name and a blank
    /// category falls back to the resource prefix of the name.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        let name = PermissionName::new(name)?;
        let display_name = non_blank_or(display_name.into(), name.as_str());
        let category = non_blank_or(category.into(), name.resource());
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            name,
            display_name,
            category,
            description,
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn name(&self) -> &PermissionName {
        &self.name
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the grouping category.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

fn non_blank_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Read-only catalog of every permission known to the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    permissions: BTreeMap<PermissionName, PermissionDefinition>,
}

impl PermissionCatalog {
    /// Builds a catalog, keeping the first definition seen for each name.
    #[must_use]
    pub fn from_definitions(definitions: impl IntoIterator<Item = PermissionDefinition>) -> Self {
        let mut permissions = BTreeMap::new();
        for definition in definitions {
            permissions
                .entry(definition.name().clone())
                .or_insert(definition);
        }

        Self { permissions }
    }

    /// Returns a definition by permission name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PermissionDefinition> {
        self.permissions.get(name)
    }

    /// Returns whether the catalog knows a permission.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.permissions.contains_key(name)
    }

    /// Returns the number of distinct permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Iterates definitions ordered by permission name.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionDefinition> {
        self.permissions.values()
    }

    /// Groups definitions by category, both levels ordered by name.
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&PermissionDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&PermissionDefinition>> = BTreeMap::new();
        for definition in self.permissions.values() {
            groups
                .entry(definition.category())
                .or_default()
                .push(definition);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::{PermissionCatalog, PermissionDefinition, PermissionName};

    fn definition(name: &str, category: &str) -> PermissionDefinition {
        match PermissionDefinition::new(name, "", category, None) {
            Ok(definition) => definition,
            Err(error) => panic!("invalid test permission '{name}': {error}"),
        }
    }

    #[test]
    fn permission_name_is_trimmed() {
        let name = PermissionName::new("  users.read ");
        assert_eq!(
            name.as_ref().map(PermissionName::as_str).ok(),
            Some("users.read")
        );
    }

    #[test]
    fn permission_name_rejects_blank_and_inner_whitespace() {
        assert!(PermissionName::new("   ").is_err());
        assert!(PermissionName::new("users read").is_err());
    }

    #[test]
    fn definition_falls_back_to_name_and_resource() {
        let definition = definition("licenses.print", " ");

        assert_eq!(definition.display_name(), "licenses.print");
        assert_eq!(definition.category(), "licenses");
        assert_eq!(definition.description(), None);
    }

    #[test]
    fn catalog_keeps_first_definition_and_groups_by_category() {
        let catalog = PermissionCatalog::from_definitions([
            definition("users.read", "Users"),
            definition("fees.read", "Fees"),
            definition("users.update", "Users"),
            definition("users.read", "Duplicates"),
        ]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.get("users.read").map(PermissionDefinition::category),
            Some("Users")
        );

        let groups = catalog.by_category();
        let categories: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(categories, vec!["Fees", "Users"]);
        assert_eq!(groups.get("Users").map(Vec::len), Some(2));
    }
}
