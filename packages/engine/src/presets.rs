//! Compile-time registry of targeting preference presets.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Presets are the named demographic profiles the host application offers
//! instead of free-form range entry. Adding a profile means creating a
//! TOML file in `presets/` and adding a corresponding entry here.

use turf_scout_neighborhood_models::TargetPreferences;

/// Number of registered presets. Updated when new presets are added.
/// Enforced by a test.
#[cfg(test)]
const EXPECTED_PRESET_COUNT: usize = 4;

/// Embedded TOML preset definitions.
const PRESET_TOMLS: &[(&str, &str)] = &[
    ("balanced", include_str!("../presets/balanced.toml")),
    (
        "affluent_homeowners",
        include_str!("../presets/affluent_homeowners.toml"),
    ),
    (
        "young_families",
        include_str!("../presets/young_families.toml"),
    ),
    (
        "urban_renters",
        include_str!("../presets/urban_renters.toml"),
    ),
];

/// Returns all registered presets.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught during CI.
#[must_use]
pub fn all_presets() -> Vec<TargetPreferences> {
    PRESET_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse preset '{name}': {e}"))
        })
        .collect()
}

/// Looks up a preset by its registered name.
#[must_use]
pub fn preset_by_name(name: &str) -> Option<TargetPreferences> {
    all_presets()
        .into_iter()
        .find(|preset| preset.preset.as_deref() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_presets() {
        let presets = all_presets();
        assert_eq!(
            presets.len(),
            EXPECTED_PRESET_COUNT,
            "Expected {EXPECTED_PRESET_COUNT} presets, found {}. \
             Update EXPECTED_PRESET_COUNT after adding/removing presets.",
            presets.len()
        );
    }

    #[test]
    fn preset_names_are_unique_and_match_registry_keys() {
        let mut seen = BTreeSet::new();
        for preset in all_presets() {
            let name = preset.preset.clone().expect("preset file must be named");
            assert!(seen.insert(name.clone()), "Duplicate preset name: {name}");
            assert!(
                PRESET_TOMLS.iter().any(|(key, _)| *key == name),
                "Preset name {name} does not match its registry key"
            );
        }
    }

    #[test]
    fn preset_ranges_are_ordered() {
        for preset in all_presets() {
            let name = preset.preset.clone().unwrap_or_default();
            assert!(
                preset.income_min < preset.income_max,
                "Preset {name} has inverted income range"
            );
            assert!(
                preset.home_value_min < preset.home_value_max,
                "Preset {name} has inverted home-value range"
            );
        }
    }

    #[test]
    fn lookup_by_name() {
        assert!(preset_by_name("balanced").is_some());
        assert!(preset_by_name("no_such_preset").is_none());
    }
}
