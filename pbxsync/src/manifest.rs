//! Integration manifest: which files go where, and which build settings to set.
//!
//! The shipped manifest is compiled into the binary from
//! `manifests/paddle_ocr.toml` and validated when loaded. It is not meant to
//! be swapped at invocation time; tests build their own with
//! [`Manifest::new`] or [`Manifest::from_toml_str`].

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::kind::FileKind;
use crate::core::settings::{INHERITED, SettingPolicy, SettingsTable};

const BUILTIN_MANIFEST: &str = include_str!("../manifests/paddle_ocr.toml");

/// One file to inject and the group (relative to the root group) it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub group: String,
    /// Overrides extension-based inference.
    pub kind: Option<FileKind>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            kind: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Name of the native target to modify.
    pub target: String,
    /// `/`-separated path of the root group under the main group.
    pub root_group: String,
    pub files: Vec<FileEntry>,
    pub settings: SettingsTable,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    target: String,
    root_group: String,
    #[serde(default)]
    groups: Vec<RawGroup>,
    #[serde(default)]
    settings: SettingsTable,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    path: String,
    files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFile {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        kind: Option<FileKind>,
    },
}

impl Manifest {
    pub fn new(target: impl Into<String>, root_group: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            root_group: root_group.into(),
            files: Vec::new(),
            settings: SettingsTable::new(),
        }
    }

    /// The manifest shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_MANIFEST).context("load built-in manifest")
    }

    /// TOML source of the shipped manifest.
    pub fn builtin_source() -> &'static str {
        BUILTIN_MANIFEST
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(contents).context("parse manifest toml")?;
        let mut manifest = Self::new(raw.target, raw.root_group);
        manifest.settings = raw.settings;
        for group in raw.groups {
            for file in group.files {
                let entry = match file {
                    RawFile::Name(name) => FileEntry::new(name, group.path.clone()),
                    RawFile::Detailed { name, kind } => FileEntry {
                        name,
                        group: group.path.clone(),
                        kind,
                    },
                };
                manifest.files.push(entry);
            }
        }
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(anyhow!("target must be non-empty"));
        }
        if self.root_group.trim().is_empty() {
            return Err(anyhow!("root_group must be non-empty"));
        }
        let mut seen = HashSet::new();
        for entry in &self.files {
            if entry.name.trim().is_empty() {
                return Err(anyhow!("file in group '{}' has an empty name", entry.group));
            }
            if entry.group.is_empty() || entry.group.split('/').any(str::is_empty) {
                return Err(anyhow!(
                    "file '{}' has invalid group path '{}'",
                    entry.name,
                    entry.group
                ));
            }
            FileKind::resolve(&entry.name, entry.kind)
                .with_context(|| format!("file '{}' in group '{}'", entry.name, entry.group))?;
            if !seen.insert((entry.group.as_str(), entry.name.as_str())) {
                return Err(anyhow!(
                    "file '{}' is listed twice in group '{}'",
                    entry.name,
                    entry.group
                ));
            }
        }
        for (key, policy) in &self.settings {
            if let SettingPolicy::Replace { values } = policy {
                if values.first().map(String::as_str) != Some(INHERITED) {
                    return Err(anyhow!(
                        "setting {key}: replace values must start with {INHERITED}"
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_manifest_loads_and_validates() {
        let manifest = Manifest::builtin().expect("builtin");
        assert_eq!(manifest.target, "Runner");
        assert_eq!(manifest.root_group, "Runner");
        assert_eq!(manifest.files.len(), 26);
        let mut groups: Vec<&str> = Vec::new();
        for entry in &manifest.files {
            if !groups.contains(&entry.group.as_str()) {
                groups.push(&entry.group);
            }
        }
        assert_eq!(
            groups,
            vec![
                "PaddleOCR",
                "third-party/PaddleLite/include",
                "third-party/PaddleLite/lib",
                "third-party"
            ]
        );
        assert_eq!(manifest.settings.len(), 8);
    }

    #[test]
    fn builtin_marks_opencv_as_framework() {
        let manifest = Manifest::builtin().expect("builtin");
        let opencv = manifest
            .files
            .iter()
            .find(|entry| entry.name == "opencv2.framework")
            .expect("opencv entry");
        assert_eq!(opencv.kind, Some(FileKind::Framework));
        assert_eq!(opencv.group, "third-party");
    }

    #[test]
    fn rejects_replace_without_inherited_sentinel() {
        let err = Manifest::from_toml_str(
            r#"
target = "Runner"
root_group = "Runner"

[settings.OTHER_LDFLAGS]
policy = "replace"
values = ["-lz"]
"#,
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("must start with $(inherited)"));
    }

    #[test]
    fn rejects_files_of_unknown_kind() {
        let err = Manifest::from_toml_str(
            r#"
target = "Runner"
root_group = "Runner"

[[groups]]
path = "Models"
files = ["det.nb"]
"#,
        )
        .expect_err("should fail");
        let chain = format!("{err:#}");
        assert!(chain.contains("file 'det.nb' in group 'Models'"), "{chain}");
        assert!(chain.contains("unrecognized extension"), "{chain}");
    }

    #[test]
    fn rejects_duplicate_file_entries() {
        let mut manifest = Manifest::new("Runner", "Runner");
        manifest.files.push(FileEntry::new("a.cc", "Group1"));
        manifest.files.push(FileEntry::new("a.h", "Group1"));
        manifest.files.push(FileEntry::new("a.cc", "Group2"));
        manifest.validate().expect("same name in another group is fine");

        manifest.files.push(FileEntry::new("a.cc", "Group1"));
        let err = manifest.validate().expect_err("should fail");
        assert_eq!(err.to_string(), "file 'a.cc' is listed twice in group 'Group1'");
    }

    #[test]
    fn rejects_empty_group_segments() {
        let mut manifest = Manifest::new("Runner", "Runner");
        manifest.files.push(FileEntry::new("a.cc", "third-party//lib"));
        assert!(manifest.validate().is_err());

        manifest.files[0].group = String::new();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let err = Manifest::from_toml_str("target = \"R\"\nroot_group = \"R\"\nextra = 1\n")
            .expect_err("should fail");
        assert!(format!("{err:#}").contains("extra"));
    }
}
