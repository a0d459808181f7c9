//! File reference injection and build-phase registration.

use tracing::debug;

use super::error::MutationError;
use super::kind::{BuildRole, FileKind};
use crate::pbx::project::{ISA_FRAMEWORKS_PHASE, ISA_SOURCES_PHASE};
use crate::pbx::{ObjectId, PbxProject};

/// Build phase a reference can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Compile,
    Link,
}

impl PhaseKind {
    pub fn isa(self) -> &'static str {
        match self {
            PhaseKind::Compile => ISA_SOURCES_PHASE,
            PhaseKind::Link => ISA_FRAMEWORKS_PHASE,
        }
    }

    /// Phase for a build role; headers have none.
    pub fn for_role(role: BuildRole) -> Option<Self> {
        match role {
            BuildRole::Header => None,
            BuildRole::Source => Some(PhaseKind::Compile),
            BuildRole::Link => Some(PhaseKind::Link),
        }
    }
}

/// A file reference created by [`add_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFile {
    pub id: ObjectId,
    pub kind: FileKind,
}

/// Outcome of [`inject_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub file: AddedFile,
    /// Phase the reference belongs in, if any.
    pub phase: Option<PhaseKind>,
    /// False when the phase already held the reference.
    pub registered: bool,
}

/// Append a file reference named `relative_name` as the last child of `group`.
pub fn add_file(
    project: &mut PbxProject,
    group: &ObjectId,
    relative_name: &str,
    kind: Option<FileKind>,
) -> Result<AddedFile, MutationError> {
    let kind = FileKind::resolve(relative_name, kind)?;
    let id = project.add_file_reference(group, relative_name, kind.file_type())?;
    Ok(AddedFile { id, kind })
}

/// Register `file_ref` in the target's phase of the given kind, creating the
/// phase if the target has none.
///
/// Returns `false` without touching the phase when a build file in it
/// already points at `file_ref`.
pub fn register_in_phase(
    project: &mut PbxProject,
    target: &ObjectId,
    phase: PhaseKind,
    file_ref: &ObjectId,
) -> Result<bool, MutationError> {
    let phase_id = match project.find_build_phase(target, phase.isa())? {
        Some(existing) => existing,
        None => {
            let created = project.add_build_phase(target, phase.isa())?;
            debug!(target = %target, phase = %created, isa = phase.isa(), "build phase created");
            created
        }
    };
    if project.phase_file_refs(&phase_id)?.contains(file_ref) {
        debug!(phase = %phase_id, file_ref = %file_ref, "already registered");
        return Ok(false);
    }
    project.add_build_file(&phase_id, file_ref)?;
    Ok(true)
}

/// Add a file to `group` and route it to the phase its kind calls for.
pub fn inject_file(
    project: &mut PbxProject,
    target: &ObjectId,
    group: &ObjectId,
    relative_name: &str,
    kind: Option<FileKind>,
) -> Result<Injection, MutationError> {
    let file = add_file(project, group, relative_name, kind)?;
    let phase = PhaseKind::for_role(file.kind.role());
    let registered = match phase {
        Some(phase) => register_in_phase(project, target, phase, &file.id)?,
        None => false,
    };
    debug!(
        file = relative_name,
        kind = file.kind.label(),
        ?phase,
        registered,
        "file injected"
    );
    Ok(Injection {
        file,
        phase,
        registered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MINIMAL_ROOT_GROUP, MINIMAL_TARGET, minimal_project};

    struct Fixture {
        project: PbxProject,
        target: ObjectId,
        group: ObjectId,
    }

    fn fixture() -> Fixture {
        let project = minimal_project();
        let target = project.targets_named(MINIMAL_TARGET).expect("targets")[0].clone();
        let main = project.main_group().expect("main");
        let group = project
            .find_group_path(&main, MINIMAL_ROOT_GROUP)
            .expect("lookup")
            .expect("group");
        Fixture {
            project,
            target,
            group,
        }
    }

    fn phase_refs(project: &PbxProject, target: &ObjectId, phase: PhaseKind) -> Vec<ObjectId> {
        match project.find_build_phase(target, phase.isa()).expect("lookup") {
            Some(id) => project.phase_file_refs(&id).expect("refs"),
            None => Vec::new(),
        }
    }

    #[test]
    fn sources_go_to_compile_phase_only() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let injected =
            inject_file(&mut project, &target, &group, "pipeline.cc", None).expect("inject");

        assert_eq!(injected.phase, Some(PhaseKind::Compile));
        assert!(injected.registered);
        assert_eq!(
            phase_refs(&project, &target, PhaseKind::Compile),
            vec![injected.file.id.clone()]
        );
        assert!(phase_refs(&project, &target, PhaseKind::Link).is_empty());
    }

    #[test]
    fn headers_are_added_to_group_but_no_phase() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let injected =
            inject_file(&mut project, &target, &group, "pipeline.h", None).expect("inject");

        assert_eq!(injected.phase, None);
        assert!(!injected.registered);
        assert_eq!(project.children(&group).expect("children"), vec![injected.file.id]);
        assert!(phase_refs(&project, &target, PhaseKind::Compile).is_empty());
    }

    #[test]
    fn link_artifacts_go_to_link_phase_only() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let injected = inject_file(
            &mut project,
            &target,
            &group,
            "opencv2.framework",
            Some(FileKind::Framework),
        )
        .expect("inject");

        assert_eq!(injected.phase, Some(PhaseKind::Link));
        let file = project.object(&injected.file.id).expect("file");
        assert_eq!(file.get_str("lastKnownFileType"), Some("wrapper.framework"));
        assert_eq!(
            phase_refs(&project, &target, PhaseKind::Link),
            vec![injected.file.id.clone()]
        );
        assert!(phase_refs(&project, &target, PhaseKind::Compile).is_empty());
    }

    #[test]
    fn registering_twice_is_a_no_op() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let file = add_file(&mut project, &group, "a.cc", None).expect("add");

        let first = register_in_phase(&mut project, &target, PhaseKind::Compile, &file.id);
        let second = register_in_phase(&mut project, &target, PhaseKind::Compile, &file.id);
        assert!(first.expect("first"));
        assert!(!second.expect("second"));
        assert_eq!(phase_refs(&project, &target, PhaseKind::Compile).len(), 1);
    }

    #[test]
    fn missing_phase_is_created() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let frameworks = project
            .find_build_phase(&target, ISA_FRAMEWORKS_PHASE)
            .expect("lookup")
            .expect("phase");
        let phases: Vec<_> = project
            .build_phases(&target)
            .expect("phases")
            .into_iter()
            .filter(|id| id != &frameworks)
            .map(|id| crate::pbx::Value::from(id.as_str()))
            .collect();
        project
            .object_mut(&target)
            .expect("target")
            .set("buildPhases", phases);

        let lib = add_file(&mut project, &group, "libz.a", None).expect("add");
        let registered = register_in_phase(&mut project, &target, PhaseKind::Link, &lib.id);
        assert!(registered.expect("register"));
        assert_eq!(phase_refs(&project, &target, PhaseKind::Link), vec![lib.id]);
    }

    #[test]
    fn unknown_kind_is_rejected_before_touching_the_group() {
        let Fixture {
            mut project,
            target,
            group,
        } = fixture();
        let err = inject_file(&mut project, &target, &group, "weights.nb", None).expect_err("fail");
        assert_eq!(err, MutationError::UnknownFileKind("weights.nb".to_string()));
        assert!(project.children(&group).expect("children").is_empty());
    }
}
