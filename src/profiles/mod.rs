// Profiles Module
// Preset tables and the (method, preset) resolver

pub mod types;
mod basic;
mod piano;

use serde::{Deserialize, Serialize};

/// Preset summary for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetSummary {
    pub name: String,
    pub description: String,
}

/// Method summary with its presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: Method,
    pub title: String,
    pub description: String,
    pub presets: Vec<PresetSummary>,
}

/// Preset names recognized for a method
pub fn preset_names(method: Method) -> &'static [&'static str] {
    match method {
        Method::Basic => &basic::PRESETS,
        Method::PianoPerformance => &piano::PRESETS,
    }
}

/// Resolve a (method, preset) pair into a profile
///
/// Fails with `ProfileError::NotFound` listing the valid keys when either
/// the method or the preset is unknown.
pub fn resolve(method: &str, preset: &str) -> ProfileResult<HumanizeProfile> {
    let method = Method::parse(method)?;
    resolve_method(method, preset)
}

/// Resolve a preset of an already-parsed method
pub fn resolve_method(method: Method, preset: &str) -> ProfileResult<HumanizeProfile> {
    let profile = match method {
        Method::Basic => basic::preset(preset),
        Method::PianoPerformance => piano::preset(preset),
    };

    let profile = profile.ok_or_else(|| ProfileError::NotFound {
        kind: "preset",
        name: preset.to_string(),
        available: preset_names(method).iter().map(|s| s.to_string()).collect(),
    })?;

    profile.validate()?;
    Ok(profile)
}

/// List all methods with preset summaries
pub fn list_methods() -> Vec<MethodSummary> {
    Method::ALL
        .iter()
        .map(|&method| MethodSummary {
            method,
            title: method.title().to_string(),
            description: method.description().to_string(),
            presets: preset_names(method)
                .iter()
                .filter_map(|name| resolve_method(method, name).ok())
                .map(|profile| PresetSummary {
                    name: profile.preset,
                    description: profile.description,
                })
                .collect(),
        })
        .collect()
}

// Re-export main types
pub use types::{
    ChordRollSettings, HandSettings, HumanizeProfile, Method, PhraseSettings, ProfileError,
    ProfileOverrides, ProfileResult, RollInterval, TickRanges,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_every_preset() {
        for method in Method::ALL {
            for name in preset_names(method) {
                let profile = resolve(method.as_str(), name).unwrap();
                assert_eq!(profile.method, method);
                assert_eq!(profile.preset, *name);
            }
        }
    }

    #[test]
    fn test_unknown_preset_lists_available() {
        let err = resolve("basic", "ultra").unwrap_err();

        match &err {
            ProfileError::NotFound {
                kind,
                name,
                available,
            } => {
                assert_eq!(*kind, "preset");
                assert_eq!(name, "ultra");
                assert_eq!(available, &vec!["minimal", "medium", "aggressive"]);
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        assert!(err.to_string().contains("minimal, medium, aggressive"));
    }

    #[test]
    fn test_unknown_method() {
        let err = resolve("harpsichord", "classical").unwrap_err();
        assert!(matches!(err, ProfileError::NotFound { kind: "method", .. }));
    }

    #[test]
    fn test_presets_are_method_scoped() {
        assert!(resolve("basic", "jazz").is_err());
        assert!(resolve("piano_performance", "medium").is_err());
    }

    #[test]
    fn test_list_methods() {
        let methods = list_methods();
        assert_eq!(methods.len(), 2);
        assert!(methods.iter().all(|m| m.presets.len() == 3));
        assert_eq!(methods[1].presets[2].name, "jazz");
    }

    #[test]
    fn test_default_presets_resolve() {
        for method in Method::ALL {
            assert!(resolve_method(method, method.default_preset()).is_ok());
        }
    }
}
