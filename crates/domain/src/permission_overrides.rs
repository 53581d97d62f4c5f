//! Minimal per-user permission overrides relative to role defaults.
//!
//! An override map only ever holds entries that change the outcome: `true`
//! for a permission the role does not grant, `false` for one it does. Every
//! function in this module preserves that shape.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::permission::PermissionName;

/// Canonical override map keyed by permission name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionOverrides(BTreeMap<PermissionName, bool>);

impl PermissionOverrides {
    /// Returns the override for a permission, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    /// Returns the number of overridden permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no permission is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates every override ordered by permission name.
    pub fn iter(&self) -> impl Iterator<Item = (&PermissionName, bool)> {
        self.0.iter().map(|(name, value)| (name, *value))
    }

    /// Iterates permissions granted despite not being role defaults.
    pub fn granted(&self) -> impl Iterator<Item = &PermissionName> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.then_some(name))
    }

    /// Iterates permissions revoked despite being role defaults.
    pub fn revoked(&self) -> impl Iterator<Item = &PermissionName> {
        self.0
            .iter()
            .filter_map(|(name, value)| (!value).then_some(name))
    }

    /// Returns whether every entry differs from the role defaults.
    #[must_use]
    pub fn is_canonical_for(&self, role_defaults: &BTreeSet<PermissionName>) -> bool {
        self.0
            .iter()
            .all(|(name, value)| *value != role_defaults.contains(name))
    }

    /// Returns the `permission_overrides` submission shape.
    #[must_use]
    pub fn to_wire(&self) -> BTreeMap<String, bool> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), *value))
            .collect()
    }

    fn set(
        &mut self,
        name: &PermissionName,
        desired: bool,
        role_defaults: &BTreeSet<PermissionName>,
    ) {
        if desired == role_defaults.contains(name) {
            self.0.remove(name);
        } else {
            self.0.insert(name.clone(), desired);
        }
    }
}

/// Derives the minimal override map that turns role defaults into the
/// permissions a user actually holds.
#[must_use]
pub fn compute_overrides_from_actual(
    role_defaults: &BTreeSet<PermissionName>,
    actual_granted: &BTreeSet<PermissionName>,
) -> PermissionOverrides {
    let granted = actual_granted
        .difference(role_defaults)
        .map(|name| (name.clone(), true));
    let revoked = role_defaults
        .difference(actual_granted)
        .map(|name| (name.clone(), false));

    PermissionOverrides(granted.chain(revoked).collect())
}

/// Returns the override map after one checkbox change.
///
/// Toggling back to the role default removes the entry.
#[must_use]
pub fn toggle(
    overrides: &PermissionOverrides,
    permission_name: &PermissionName,
    desired_value: bool,
    role_defaults: &BTreeSet<PermissionName>,
) -> PermissionOverrides {
    let mut next = overrides.clone();
    next.set(permission_name, desired_value, role_defaults);
    next
}

/// Override map to use after the selected role changes.
#[must_use]
pub fn reset_for_role_change() -> PermissionOverrides {
    PermissionOverrides::default()
}

/// Role defaults minus revoked overrides plus granted overrides.
#[must_use]
pub fn effective_permissions(
    role_defaults: &BTreeSet<PermissionName>,
    overrides: &PermissionOverrides,
) -> BTreeSet<PermissionName> {
    role_defaults
        .iter()
        .filter(|name| overrides.get(name.as_str()) != Some(false))
        .chain(overrides.granted())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use proptest::collection::{btree_set, vec};
    use proptest::prelude::*;

    use super::{
        PermissionOverrides, compute_overrides_from_actual, effective_permissions,
        reset_for_role_change, toggle,
    };
    use crate::permission::PermissionName;

    fn name(value: &str) -> PermissionName {
        match PermissionName::new(value) {
            Ok(name) => name,
            Err(error) => panic!("invalid test permission '{value}': {error}"),
        }
    }

    fn names(values: &[&str]) -> BTreeSet<PermissionName> {
        values.iter().map(|value| name(value)).collect()
    }

    fn wire(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_owned(), *value))
            .collect()
    }

    fn permission_name() -> impl Strategy<Value = PermissionName> {
        "(users|roles|fees|licenses)\\.(read|create|update|delete)"
            .prop_filter_map("valid permission name", |value| {
                PermissionName::new(value).ok()
            })
    }

    fn permission_set() -> impl Strategy<Value = BTreeSet<PermissionName>> {
        btree_set(permission_name(), 0..10)
    }

    #[test]
    fn extra_actual_permission_becomes_grant_override() {
        let overrides = compute_overrides_from_actual(
            &names(&["users.read", "users.update"]),
            &names(&["users.read", "users.update", "users.delete"]),
        );

        assert_eq!(overrides.to_wire(), wire(&[("users.delete", true)]));
    }

    #[test]
    fn missing_default_becomes_revoke_override() {
        let overrides = compute_overrides_from_actual(
            &names(&["users.read", "users.update"]),
            &names(&["users.read"]),
        );

        assert_eq!(overrides.to_wire(), wire(&[("users.update", false)]));
    }

    #[test]
    fn toggling_non_default_off_leaves_map_unchanged() {
        let defaults = names(&["users.read", "users.update"]);
        let overrides = PermissionOverrides::default();

        let next = toggle(&overrides, &name("users.delete"), false, &defaults);

        assert!(next.is_empty());
    }

    #[test]
    fn role_change_discards_explicit_grants() {
        let defaults = names(&["users.read"]);
        let overrides = toggle(
            &PermissionOverrides::default(),
            &name("users.delete"),
            true,
            &defaults,
        );
        assert_eq!(overrides.to_wire(), wire(&[("users.delete", true)]));

        let reset = reset_for_role_change();
        let new_defaults = names(&["fees.read"]);

        assert!(reset.is_empty());
        assert_eq!(effective_permissions(&new_defaults, &reset), new_defaults);
    }

    #[test]
    fn effective_permissions_apply_both_directions() {
        let defaults = names(&["users.read", "users.update"]);
        let overrides = toggle(
            &toggle(
                &PermissionOverrides::default(),
                &name("users.update"),
                false,
                &defaults,
            ),
            &name("fees.read"),
            true,
            &defaults,
        );

        let effective = effective_permissions(&defaults, &overrides);

        assert_eq!(effective, names(&["fees.read", "users.read"]));
        assert_eq!(overrides.granted().count(), 1);
        assert_eq!(overrides.revoked().count(), 1);
    }

    #[test]
    fn empty_inputs_produce_empty_results() {
        let overrides = compute_overrides_from_actual(&BTreeSet::new(), &BTreeSet::new());

        assert!(overrides.is_empty());
        assert!(effective_permissions(&BTreeSet::new(), &overrides).is_empty());
    }

    proptest! {
        #[test]
        fn computed_overrides_are_minimal(
            defaults in permission_set(),
            actual in permission_set(),
        ) {
            let overrides = compute_overrides_from_actual(&defaults, &actual);
            prop_assert!(overrides.is_canonical_for(&defaults));
        }

        #[test]
        fn computed_overrides_round_trip_to_actual(
            defaults in permission_set(),
            actual in permission_set(),
        ) {
            let overrides = compute_overrides_from_actual(&defaults, &actual);
            prop_assert_eq!(effective_permissions(&defaults, &overrides), actual);
        }

        #[test]
        fn toggle_sequences_stay_minimal(
            defaults in permission_set(),
            toggles in vec((permission_name(), any::<bool>()), 0..24),
        ) {
            let mut overrides = PermissionOverrides::default();
            for (name, desired) in &toggles {
                overrides = toggle(&overrides, name, *desired, &defaults);
                prop_assert!(overrides.is_canonical_for(&defaults));
                prop_assert_eq!(
                    effective_permissions(&defaults, &overrides).contains(name),
                    *desired
                );
            }
        }

        #[test]
        fn toggling_back_to_default_clears_override(
            defaults in permission_set(),
            name in permission_name(),
            desired in any::<bool>(),
        ) {
            let overrides = toggle(&PermissionOverrides::default(), &name, desired, &defaults);
            let restored = toggle(&overrides, &name, defaults.contains(&name), &defaults);
            prop_assert_eq!(restored.get(name.as_str()), None);
        }

        #[test]
        fn reset_yields_new_role_defaults(new_defaults in permission_set()) {
            let reset = reset_for_role_change();
            prop_assert_eq!(effective_permissions(&new_defaults, &reset), new_defaults);
        }
    }
}
