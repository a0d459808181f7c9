//! Project load/save: read the file once, write it once.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::pbx::{PbxProject, parse, to_pbxproj};

const PBXPROJ_FILE: &str = "project.pbxproj";
const BUNDLE_EXTENSION: &str = "xcodeproj";

/// Canonical paths for a project given either the `.xcodeproj` bundle or the
/// `project.pbxproj` inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub pbxproj_path: PathBuf,
    /// Bundle name without extension (`Runner` for `Runner.xcodeproj`).
    pub name: Option<String>,
}

impl ProjectPaths {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_bundle = path.extension() == Some(OsStr::new(BUNDLE_EXTENSION)) || path.is_dir();
        let (bundle, pbxproj_path) = if is_bundle {
            (Some(path.clone()), path.join(PBXPROJ_FILE))
        } else {
            let bundle = path
                .parent()
                .filter(|parent| parent.extension() == Some(OsStr::new(BUNDLE_EXTENSION)))
                .map(Path::to_path_buf);
            (bundle, path)
        };
        let name = bundle
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(OsStr::to_str)
            .map(str::to_string);
        Self { pbxproj_path, name }
    }
}

/// A parsed project together with the exact text it was read from.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub original: String,
    pub project: PbxProject,
}

/// Read and parse the project file.
pub fn load_project(paths: &ProjectPaths) -> Result<LoadedProject> {
    let path = &paths.pbxproj_path;
    debug!(path = %path.display(), "loading project");
    let original =
        fs::read_to_string(path).with_context(|| format!("read project {}", path.display()))?;
    let value = parse(&original).with_context(|| format!("parse project {}", path.display()))?;
    let mut project = PbxProject::from_value(value)
        .with_context(|| format!("load object graph from {}", path.display()))?;
    if let Some(name) = &paths.name {
        project = project.with_name(name.clone());
    }
    debug!(objects = project.objects().count(), "project loaded");
    Ok(LoadedProject { original, project })
}

/// Atomically write the project to disk (temp file + rename).
pub fn write_project(path: &Path, project: &PbxProject) -> Result<()> {
    debug!(path = %path.display(), "writing project");
    write_atomic(path, &to_pbxproj(project))
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_extension("pbxproj.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp project {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace project {}", path.display()))?;
    Ok(())
}
