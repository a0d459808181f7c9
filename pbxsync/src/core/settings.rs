//! Per-key build settings policies.
//!
//! Each recognized key carries exactly one policy, and the table is applied
//! uniformly to every build configuration of the target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pbx::{Dict, Value};

/// Placeholder that pulls in the value defined at an outer scope.
pub const INHERITED: &str = "$(inherited)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SettingPolicy {
    /// Overwrite with the canonical list.
    Replace { values: Vec<String> },
    /// Initialize only when the key is absent.
    DefaultIfAbsent { values: Vec<String> },
    /// Overwrite with a single literal.
    Scalar { value: String },
}

pub type SettingsTable = BTreeMap<String, SettingPolicy>;

/// Keys touched in one configuration, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsReport {
    /// Keys whose value differs from before.
    pub changed: Vec<String>,
    /// Default-if-absent keys left alone because they already had a value.
    pub preserved: Vec<String>,
}

/// Apply `table` to one configuration's `buildSettings`.
pub fn apply_settings(settings: &mut Dict, table: &SettingsTable) -> SettingsReport {
    let mut report = SettingsReport::default();
    for (key, policy) in table {
        let next = match policy {
            SettingPolicy::Replace { values } => Value::string_list(values),
            SettingPolicy::Scalar { value } => Value::from(value.as_str()),
            SettingPolicy::DefaultIfAbsent { values } => {
                if settings.contains_key(key) {
                    report.preserved.push(key.clone());
                    continue;
                }
                Value::string_list(values)
            }
        };
        if settings.get(key) != Some(&next) {
            report.changed.push(key.clone());
            settings.insert(key.clone(), next);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SettingsTable {
        SettingsTable::from([
            (
                "HEADER_SEARCH_PATHS".to_string(),
                SettingPolicy::Replace {
                    values: vec![
                        INHERITED.to_string(),
                        "\"$(SRCROOT)/Runner/PaddleOCR\"".to_string(),
                    ],
                },
            ),
            (
                "GCC_PREPROCESSOR_DEFINITIONS".to_string(),
                SettingPolicy::DefaultIfAbsent {
                    values: vec![INHERITED.to_string()],
                },
            ),
            (
                "CLANG_CXX_LANGUAGE_STANDARD".to_string(),
                SettingPolicy::Scalar {
                    value: "c++17".to_string(),
                },
            ),
        ])
    }

    #[test]
    fn replace_and_scalar_overwrite_existing_values() {
        let mut settings = Dict::from([
            (
                "HEADER_SEARCH_PATHS".to_string(),
                Value::string_list(["/old/include"]),
            ),
            (
                "CLANG_CXX_LANGUAGE_STANDARD".to_string(),
                Value::from("gnu++0x"),
            ),
        ]);
        apply_settings(&mut settings, &table());

        assert_eq!(
            settings["HEADER_SEARCH_PATHS"],
            Value::string_list([INHERITED, "\"$(SRCROOT)/Runner/PaddleOCR\""])
        );
        assert_eq!(settings["CLANG_CXX_LANGUAGE_STANDARD"], Value::from("c++17"));
    }

    #[test]
    fn default_if_absent_initializes_missing_key() {
        let mut settings = Dict::new();
        let report = apply_settings(&mut settings, &table());
        assert_eq!(
            settings["GCC_PREPROCESSOR_DEFINITIONS"],
            Value::string_list([INHERITED])
        );
        assert!(report.changed.contains(&"GCC_PREPROCESSOR_DEFINITIONS".to_string()));
    }

    #[test]
    fn default_if_absent_keeps_operator_values() {
        let existing = Value::string_list(["DEBUG=1", INHERITED, "COCOAPODS=1"]);
        let mut settings = Dict::from([(
            "GCC_PREPROCESSOR_DEFINITIONS".to_string(),
            existing.clone(),
        )]);
        let report = apply_settings(&mut settings, &table());
        assert_eq!(settings["GCC_PREPROCESSOR_DEFINITIONS"], existing);
        assert_eq!(report.preserved, vec!["GCC_PREPROCESSOR_DEFINITIONS".to_string()]);
    }

    #[test]
    fn second_application_changes_nothing() {
        let mut settings = Dict::from([("PRODUCT_NAME".to_string(), Value::from("Runner"))]);
        let first = apply_settings(&mut settings, &table());
        let snapshot = settings.clone();
        let second = apply_settings(&mut settings, &table());

        assert_eq!(first.changed.len(), 3);
        assert!(second.changed.is_empty());
        assert_eq!(settings, snapshot);
        assert_eq!(settings["PRODUCT_NAME"], Value::from("Runner"));
    }

    #[test]
    fn policies_deserialize_from_tagged_tables() {
        let parsed: SettingsTable = toml::from_str(
            r#"
[OTHER_LDFLAGS]
policy = "replace"
values = ["$(inherited)", "-lz"]

[GCC_PREPROCESSOR_DEFINITIONS]
policy = "default-if-absent"
values = ["$(inherited)"]

[ENABLE_BITCODE]
policy = "scalar"
value = "NO"
"#,
        )
        .expect("parse");
        assert_eq!(
            parsed["OTHER_LDFLAGS"],
            SettingPolicy::Replace {
                values: vec![INHERITED.to_string(), "-lz".to_string()]
            }
        );
        assert_eq!(
            parsed["ENABLE_BITCODE"],
            SettingPolicy::Scalar {
                value: "NO".to_string()
            }
        );
        assert!(matches!(
            parsed["GCC_PREPROCESSOR_DEFINITIONS"],
            SettingPolicy::DefaultIfAbsent { .. }
        ));
    }
}
