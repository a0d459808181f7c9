//! Object-graph view of a parsed `project.pbxproj`.
//!
//! A project file is a flat table of objects keyed by id. Groups, targets and
//! build phases refer to each other by id. [`PbxProject`] owns that table and
//! exposes the traversal and mutation primitives the synchronizer is built
//! on. Policy (what to clear, what to register where) lives in `core`.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::debug;

use super::ids::{ObjectId, derive_id};
use super::value::{Dict, Value};

pub const ISA_PROJECT: &str = "PBXProject";
pub const ISA_GROUP: &str = "PBXGroup";
pub const ISA_VARIANT_GROUP: &str = "PBXVariantGroup";
pub const ISA_FILE_REFERENCE: &str = "PBXFileReference";
pub const ISA_BUILD_FILE: &str = "PBXBuildFile";
pub const ISA_NATIVE_TARGET: &str = "PBXNativeTarget";
pub const ISA_SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
pub const ISA_FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";
pub const ISA_CONFIGURATION_LIST: &str = "XCConfigurationList";
pub const ISA_BUILD_CONFIGURATION: &str = "XCBuildConfiguration";

const GROUP_ISAS: &[&str] = &[ISA_GROUP, ISA_VARIANT_GROUP];
const SOURCE_TREE_GROUP: &str = "<group>";
/// Xcode's "run for all build actions" mask.
const DEFAULT_ACTION_MASK: &str = "2147483647";

/// Structural problems in the object graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("not a project document: {0}")]
    NotAProject(&'static str),
    #[error("object {0} not found")]
    MissingObject(ObjectId),
    #[error("object {id} is a {found}, expected {expected}")]
    WrongIsa {
        id: ObjectId,
        expected: String,
        found: String,
    },
    #[error("object {id}: missing or invalid field '{field}'")]
    InvalidField { id: ObjectId, field: String },
}

/// A single entry of the `objects` table. `isa` is stored alongside the
/// other fields so writing stays a plain dictionary walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    fields: Dict,
}

impl Object {
    pub fn new(isa: &str) -> Self {
        let mut fields = Dict::new();
        fields.insert("isa".to_string(), Value::from(isa));
        Self { fields }
    }

    pub fn isa(&self) -> &str {
        self.get_str("isa").unwrap_or_default()
    }

    pub fn fields(&self) -> &Dict {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Dict {
        &mut self.fields
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// `name` if present, otherwise `path`. This is what the Xcode navigator
    /// shows and what group lookups match against.
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("name").or_else(|| self.get_str("path"))
    }

    pub fn is_group(&self) -> bool {
        GROUP_ISAS.contains(&self.isa())
    }

    pub fn is_build_phase(&self) -> bool {
        self.isa().ends_with("BuildPhase")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbxProject {
    /// Bundle name without `.xcodeproj`; only used for annotations.
    name: Option<String>,
    /// Top-level keys other than `objects` and `rootObject`.
    header: Dict,
    objects: BTreeMap<ObjectId, Object>,
    root_object: ObjectId,
}

impl PbxProject {
    /// Build the object graph from a parsed document.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let Value::Dict(mut header) = value else {
            return Err(ModelError::NotAProject("top level is not a dictionary"));
        };
        let Some(Value::Dict(raw_objects)) = header.remove("objects") else {
            return Err(ModelError::NotAProject("missing 'objects' dictionary"));
        };
        let Some(Value::String(root)) = header.remove("rootObject") else {
            return Err(ModelError::NotAProject("missing 'rootObject'"));
        };

        let mut objects = BTreeMap::new();
        for (raw_id, raw) in raw_objects {
            let id = ObjectId::new(raw_id);
            let Value::Dict(fields) = raw else {
                return Err(ModelError::InvalidField {
                    id,
                    field: "<object>".to_string(),
                });
            };
            if !matches!(fields.get("isa"), Some(Value::String(_))) {
                return Err(ModelError::InvalidField {
                    id,
                    field: "isa".to_string(),
                });
            }
            objects.insert(id, Object { fields });
        }

        let project = Self {
            name: None,
            header,
            objects,
            root_object: ObjectId::new(root),
        };
        project.object_of(&project.root_object, &[ISA_PROJECT])?;
        Ok(project)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn header(&self) -> &Dict {
        &self.header
    }

    pub fn root_object(&self) -> &ObjectId {
        &self.root_object
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn object(&self, id: &ObjectId) -> Result<&Object, ModelError> {
        self.objects
            .get(id)
            .ok_or_else(|| ModelError::MissingObject(id.clone()))
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Result<&mut Object, ModelError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| ModelError::MissingObject(id.clone()))
    }

    /// Fetch `id` and check that its `isa` is one of `expected`.
    fn object_of(&self, id: &ObjectId, expected: &[&str]) -> Result<&Object, ModelError> {
        let object = self.object(id)?;
        if !expected.contains(&object.isa()) {
            return Err(ModelError::WrongIsa {
                id: id.clone(),
                expected: expected.join(" or "),
                found: object.isa().to_string(),
            });
        }
        Ok(object)
    }

    /// Read `key` as a list of ids. A missing key reads as empty.
    pub fn id_list(&self, id: &ObjectId, key: &str) -> Result<Vec<ObjectId>, ModelError> {
        let object = self.object(id)?;
        let Some(value) = object.fields.get(key) else {
            return Ok(Vec::new());
        };
        let invalid = || ModelError::InvalidField {
            id: id.clone(),
            field: key.to_string(),
        };
        value
            .as_array()
            .ok_or_else(invalid)?
            .iter()
            .map(|item| item.as_str().map(ObjectId::new).ok_or_else(invalid))
            .collect()
    }

    fn id_field(&self, id: &ObjectId, key: &str) -> Result<ObjectId, ModelError> {
        self.object(id)?
            .get_str(key)
            .map(ObjectId::new)
            .ok_or_else(|| ModelError::InvalidField {
                id: id.clone(),
                field: key.to_string(),
            })
    }

    fn push_id(&mut self, owner: &ObjectId, key: &str, id: &ObjectId) -> Result<(), ModelError> {
        let object = self.object_mut(owner)?;
        let entry = object
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let list = entry.as_array_mut().ok_or_else(|| ModelError::InvalidField {
            id: owner.clone(),
            field: key.to_string(),
        })?;
        list.push(Value::from(id.as_str()));
        Ok(())
    }

    /// First free id derived from `seed`.
    fn allocate_id(&self, seed: &str) -> ObjectId {
        let mut attempt = 0;
        loop {
            let id = derive_id(seed, attempt);
            if !self.contains(&id) {
                return id;
            }
            attempt += 1;
        }
    }

    pub fn main_group(&self) -> Result<ObjectId, ModelError> {
        self.id_field(&self.root_object, "mainGroup")
    }

    pub fn targets(&self) -> Result<Vec<ObjectId>, ModelError> {
        self.id_list(&self.root_object, "targets")
    }

    /// All targets whose `name` equals `name`, in declaration order.
    pub fn targets_named(&self, name: &str) -> Result<Vec<ObjectId>, ModelError> {
        let mut matches = Vec::new();
        for id in self.targets()? {
            if self.object(&id)?.get_str("name") == Some(name) {
                matches.push(id);
            }
        }
        Ok(matches)
    }

    pub fn children(&self, group: &ObjectId) -> Result<Vec<ObjectId>, ModelError> {
        self.object_of(group, GROUP_ISAS)?;
        self.id_list(group, "children")
    }

    /// Direct child group of `parent` displayed as `name`.
    pub fn child_group(
        &self,
        parent: &ObjectId,
        name: &str,
    ) -> Result<Option<ObjectId>, ModelError> {
        for child in self.children(parent)? {
            let Some(object) = self.objects.get(&child) else {
                continue;
            };
            if object.is_group() && object.display_name() == Some(name) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Walk a `/`-separated group path from `start`. Never creates groups.
    pub fn find_group_path(
        &self,
        start: &ObjectId,
        path: &str,
    ) -> Result<Option<ObjectId>, ModelError> {
        let mut current = start.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match self.child_group(&current, segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Append a new group to `parent`. `name` is only written when it
    /// differs from `path`, matching what Xcode does.
    pub fn add_group(
        &mut self,
        parent: &ObjectId,
        name: &str,
        path: &str,
    ) -> Result<ObjectId, ModelError> {
        self.object_of(parent, GROUP_ISAS)?;
        let id = self.allocate_id(&format!("group:{parent}/{name}"));
        let mut group = Object::new(ISA_GROUP);
        group.set("children", Value::Array(Vec::new()));
        if name != path {
            group.set("name", name);
        }
        group.set("path", path);
        group.set("sourceTree", SOURCE_TREE_GROUP);
        self.objects.insert(id.clone(), group);
        self.push_id(parent, "children", &id)?;
        Ok(id)
    }

    /// Append a file reference to `group`, relative to the group's path.
    pub fn add_file_reference(
        &mut self,
        group: &ObjectId,
        path: &str,
        file_type: &str,
    ) -> Result<ObjectId, ModelError> {
        self.object_of(group, GROUP_ISAS)?;
        let id = self.allocate_id(&format!("file:{group}/{path}"));
        let mut file = Object::new(ISA_FILE_REFERENCE);
        file.set("lastKnownFileType", file_type);
        file.set("path", path);
        file.set("sourceTree", SOURCE_TREE_GROUP);
        self.objects.insert(id.clone(), file);
        self.push_id(group, "children", &id)?;
        Ok(id)
    }

    /// Empty `group`, deleting every descendant object.
    ///
    /// Build files that point at a deleted reference are deleted as well and
    /// dropped from every build phase. Returns the removed descendant ids.
    pub fn remove_children(&mut self, group: &ObjectId) -> Result<Vec<ObjectId>, ModelError> {
        let mut removed = Vec::new();
        let mut visited = HashSet::from([group.clone()]);
        for child in self.children(group)? {
            self.collect_subtree(&child, &mut visited, &mut removed)?;
        }
        self.object_mut(group)?
            .set("children", Value::Array(Vec::new()));
        for id in &removed {
            self.objects.remove(id);
        }
        let build_files = self.remove_build_files_for(&removed);
        debug!(
            group = %group,
            removed = removed.len(),
            build_files,
            "group emptied"
        );
        Ok(removed)
    }

    /// A child reached twice means the `children` lists form a cycle or share
    /// a node.
    fn collect_subtree(
        &self,
        id: &ObjectId,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<ObjectId>,
    ) -> Result<(), ModelError> {
        if !visited.insert(id.clone()) {
            return Err(ModelError::InvalidField {
                id: id.clone(),
                field: "children".to_string(),
            });
        }
        out.push(id.clone());
        let is_group = self.objects.get(id).is_some_and(Object::is_group);
        if is_group {
            for child in self.id_list(id, "children")? {
                self.collect_subtree(&child, visited, out)?;
            }
        }
        Ok(())
    }

    fn remove_build_files_for(&mut self, removed: &[ObjectId]) -> usize {
        let removed: HashSet<&str> = removed.iter().map(ObjectId::as_str).collect();
        let stale: HashSet<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| {
                object.isa() == ISA_BUILD_FILE
                    && object.get_str("fileRef").is_some_and(|r| removed.contains(r))
            })
            .map(|(id, _)| id.clone())
            .collect();
        if stale.is_empty() {
            return 0;
        }
        for id in &stale {
            self.objects.remove(id);
        }
        for object in self.objects.values_mut().filter(|o| o.is_build_phase()) {
            if let Some(files) = object.fields.get_mut("files").and_then(Value::as_array_mut) {
                files.retain(|entry| {
                    entry
                        .as_str()
                        .is_none_or(|id| !stale.contains(&ObjectId::new(id)))
                });
            }
        }
        stale.len()
    }

    pub fn build_phases(&self, target: &ObjectId) -> Result<Vec<ObjectId>, ModelError> {
        self.id_list(target, "buildPhases")
    }

    /// First phase of `target` with the given `isa`.
    pub fn find_build_phase(
        &self,
        target: &ObjectId,
        isa: &str,
    ) -> Result<Option<ObjectId>, ModelError> {
        for phase in self.build_phases(target)? {
            if self.object(&phase)?.isa() == isa {
                return Ok(Some(phase));
            }
        }
        Ok(None)
    }

    /// Append an empty phase of kind `isa` to `target`.
    pub fn add_build_phase(
        &mut self,
        target: &ObjectId,
        isa: &str,
    ) -> Result<ObjectId, ModelError> {
        self.object_of(target, &[ISA_NATIVE_TARGET])?;
        let id = self.allocate_id(&format!("phase:{target}/{isa}"));
        let mut phase = Object::new(isa);
        phase.set("buildActionMask", DEFAULT_ACTION_MASK);
        phase.set("files", Value::Array(Vec::new()));
        phase.set("runOnlyForDeploymentPostprocessing", "0");
        self.objects.insert(id.clone(), phase);
        self.push_id(target, "buildPhases", &id)?;
        Ok(id)
    }

    /// File references that the build files of `phase` point at.
    pub fn phase_file_refs(&self, phase: &ObjectId) -> Result<Vec<ObjectId>, ModelError> {
        let mut refs = Vec::new();
        for build_file in self.id_list(phase, "files")? {
            if let Some(file_ref) = self
                .objects
                .get(&build_file)
                .and_then(|object| object.get_str("fileRef"))
            {
                refs.push(ObjectId::new(file_ref));
            }
        }
        Ok(refs)
    }

    /// Append a build file for `file_ref` to `phase`. Does not check for an
    /// existing entry.
    pub fn add_build_file(
        &mut self,
        phase: &ObjectId,
        file_ref: &ObjectId,
    ) -> Result<ObjectId, ModelError> {
        if !self.object(phase)?.is_build_phase() {
            return Err(ModelError::WrongIsa {
                id: phase.clone(),
                expected: "a build phase".to_string(),
                found: self.object(phase)?.isa().to_string(),
            });
        }
        self.object(file_ref)?;
        let id = self.allocate_id(&format!("build:{phase}/{file_ref}"));
        let mut build_file = Object::new(ISA_BUILD_FILE);
        build_file.set("fileRef", file_ref.as_str());
        self.objects.insert(id.clone(), build_file);
        self.push_id(phase, "files", &id)?;
        Ok(id)
    }

    /// Configurations in the configuration list of `owner` (a target or the
    /// project object).
    pub fn build_configurations(&self, owner: &ObjectId) -> Result<Vec<ObjectId>, ModelError> {
        let list = self.id_field(owner, "buildConfigurationList")?;
        self.object_of(&list, &[ISA_CONFIGURATION_LIST])?;
        self.id_list(&list, "buildConfigurations")
    }

    /// `buildSettings` of a configuration, created empty if absent.
    pub fn build_settings_mut(&mut self, config: &ObjectId) -> Result<&mut Dict, ModelError> {
        self.object_of(config, &[ISA_BUILD_CONFIGURATION])?;
        let object = self.object_mut(config)?;
        object
            .fields
            .entry("buildSettings".to_string())
            .or_insert_with(|| Value::Dict(Dict::new()))
            .as_dict_mut()
            .ok_or_else(|| ModelError::InvalidField {
                id: config.clone(),
                field: "buildSettings".to_string(),
            })
    }
}
