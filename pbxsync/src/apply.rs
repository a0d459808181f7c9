//! Orchestration for `pbxsync apply` and `pbxsync check`.
//!
//! `Load → locate target/group → sync groups → inject files → merge settings
//! → persist`. Everything before persisting happens in memory, so any failure
//! leaves the file on disk untouched.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::MutationError;
use crate::core::group_sync::GroupResolver;
use crate::core::inject::{PhaseKind, inject_file};
use crate::core::kind::BuildRole;
use crate::core::settings::{SettingsReport, apply_settings};
use crate::io::project_store::{ProjectPaths, load_project, write_project};
use crate::manifest::Manifest;
use crate::pbx::{ObjectId, PbxProject, to_pbxproj};

/// Files added to one destination group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub path: String,
    pub files: usize,
}

/// A link-time artifact registered with the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedArtifact {
    pub name: String,
    pub kind: &'static str,
}

/// Settings changes on one build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationReport {
    pub name: String,
    #[serde(flatten)]
    pub settings: SettingsReport,
}

/// What one in-memory application of the manifest did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub target: String,
    pub files_added: usize,
    pub headers: usize,
    pub sources_registered: usize,
    pub groups_synced: usize,
    pub groups: Vec<GroupReport>,
    pub linked: Vec<LinkedArtifact>,
    pub configurations: Vec<ConfigurationReport>,
}

/// Apply `manifest` to `project` in memory.
///
/// Preconditions (target and root group exist) are checked before anything
/// is mutated.
#[instrument(skip_all, fields(target = %manifest.target))]
pub fn apply_manifest(
    project: &mut PbxProject,
    manifest: &Manifest,
) -> Result<ApplySummary, MutationError> {
    let target = locate_target(project, &manifest.target)?;
    let main_group = project.main_group()?;
    let root = project
        .find_group_path(&main_group, &manifest.root_group)?
        .ok_or_else(|| MutationError::GroupNotFound(manifest.root_group.clone()))?;

    let mut summary = ApplySummary {
        target: manifest.target.clone(),
        files_added: 0,
        headers: 0,
        sources_registered: 0,
        groups_synced: 0,
        groups: Vec::new(),
        linked: Vec::new(),
        configurations: Vec::new(),
    };

    let mut resolver = GroupResolver::new(root);
    for entry in &manifest.files {
        let group = resolver.resolve(project, &entry.group)?;
        let injected = inject_file(project, &target, &group, &entry.name, entry.kind)?;
        summary.files_added += 1;
        match injected.file.kind.role() {
            BuildRole::Header => summary.headers += 1,
            BuildRole::Source => {
                if injected.registered {
                    summary.sources_registered += 1;
                }
            }
            BuildRole::Link => {
                if injected.phase == Some(PhaseKind::Link) && injected.registered {
                    summary.linked.push(LinkedArtifact {
                        name: entry.name.clone(),
                        kind: injected.file.kind.label(),
                    });
                }
            }
        }
        match summary.groups.iter_mut().find(|g| g.path == entry.group) {
            Some(report) => report.files += 1,
            None => summary.groups.push(GroupReport {
                path: entry.group.clone(),
                files: 1,
            }),
        }
    }
    summary.groups_synced = resolver.synced().len();

    for config in project.build_configurations(&target)? {
        let name = project
            .object(&config)?
            .get_str("name")
            .unwrap_or_default()
            .to_string();
        let report = apply_settings(project.build_settings_mut(&config)?, &manifest.settings);
        debug!(
            configuration = %name,
            changed = ?report.changed,
            preserved = ?report.preserved,
            "build settings merged"
        );
        summary.configurations.push(ConfigurationReport {
            name,
            settings: report,
        });
    }

    info!(
        files = summary.files_added,
        groups = summary.groups_synced,
        configurations = summary.configurations.len(),
        "manifest applied"
    );
    Ok(summary)
}

fn locate_target(project: &PbxProject, name: &str) -> Result<ObjectId, MutationError> {
    let mut matches = project.targets_named(name)?;
    match matches.len() {
        0 => Err(MutationError::TargetNotFound(name.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(MutationError::AmbiguousTarget {
            name: name.to_string(),
            count,
        }),
    }
}

/// Options for [`run_apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Compute everything but leave the file alone.
    pub dry_run: bool,
}

/// Result of a full load/apply/persist pass.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub path: PathBuf,
    /// Whether the rewritten text differs from what was read.
    pub changed: bool,
    pub written: bool,
    pub summary: ApplySummary,
}

/// Load the project at `project_path`, apply `manifest`, and persist once.
///
/// The file is only rewritten when the result differs from what was read.
pub fn run_apply(
    project_path: &Path,
    manifest: &Manifest,
    options: &ApplyOptions,
) -> Result<ApplyOutcome> {
    manifest.validate().context("validate manifest")?;
    let paths = ProjectPaths::new(project_path);
    let mut loaded = load_project(&paths)?;
    let summary = apply_manifest(&mut loaded.project, manifest).with_context(|| {
        format!(
            "apply manifest for target '{}' to {}",
            manifest.target,
            paths.pbxproj_path.display()
        )
    })?;

    let changed = to_pbxproj(&loaded.project) != loaded.original;
    let written = changed && !options.dry_run;
    if written {
        write_project(&paths.pbxproj_path, &loaded.project)?;
        info!(path = %paths.pbxproj_path.display(), "project written");
    } else {
        debug!(changed, dry_run = options.dry_run, "project left untouched");
    }

    Ok(ApplyOutcome {
        path: paths.pbxproj_path,
        changed,
        written,
        summary,
    })
}

/// Human-readable report printed after `apply`.
pub fn render_summary(outcome: &ApplyOutcome) -> String {
    let summary = &outcome.summary;
    let mut out = String::new();
    let headline = match (outcome.written, outcome.changed) {
        (true, _) => "Xcode project updated",
        (false, true) => "Dry run, project not written",
        (false, false) => "Xcode project already up to date",
    };
    let _ = writeln!(out, "{headline}: {}", outcome.path.display());
    for group in &summary.groups {
        let noun = if group.files == 1 { "file" } else { "files" };
        let _ = writeln!(out, "   Added {} {noun} to {}", group.files, group.path);
    }
    for artifact in &summary.linked {
        let _ = writeln!(out, "   Linked {} ({})", artifact.name, artifact.kind);
    }
    let _ = writeln!(
        out,
        "   Updated search paths and build settings on {} configurations of target {}",
        summary.configurations.len(),
        summary.target
    );
    out
}
