//! Group synchronization: locate-or-create a group and reset it to empty.
//!
//! Groups are never patched child by child. A group touched by the manifest
//! is emptied once per run and then repopulated in manifest order, which is
//! what keeps repeated runs free of duplicates.

use std::collections::HashSet;

use tracing::debug;

use super::error::MutationError;
use crate::pbx::{ObjectId, PbxProject};

/// Ensure a group named `name` exists under `parent` and has no children.
///
/// An existing group keeps its id and attributes. A new group is appended as
/// the last child of `parent`.
pub fn sync_group(
    project: &mut PbxProject,
    parent: &ObjectId,
    name: &str,
    path: &str,
) -> Result<ObjectId, MutationError> {
    if let Some(existing) = project.child_group(parent, name)? {
        let removed = project.remove_children(&existing)?;
        debug!(group = %existing, name, removed = removed.len(), "group reset");
        return Ok(existing);
    }
    let created = project.add_group(parent, name, path)?;
    debug!(group = %created, name, "group created");
    Ok(created)
}

/// Resolves manifest group paths under a root group, synchronizing each
/// group the first time a run reaches it and only locating it afterwards.
#[derive(Debug)]
pub struct GroupResolver {
    root: ObjectId,
    synced: HashSet<ObjectId>,
    order: Vec<ObjectId>,
}

impl GroupResolver {
    pub fn new(root: ObjectId) -> Self {
        Self {
            root,
            synced: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// Resolve a `/`-separated path relative to the root group. The root
    /// group itself is never reset.
    pub fn resolve(
        &mut self,
        project: &mut PbxProject,
        path: &str,
    ) -> Result<ObjectId, MutationError> {
        let mut current = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match project.child_group(&current, segment)? {
                Some(existing) if self.synced.contains(&existing) => existing,
                _ => {
                    let id = sync_group(project, &current, segment, segment)?;
                    self.synced.insert(id.clone());
                    self.order.push(id.clone());
                    id
                }
            };
        }
        Ok(current)
    }

    /// Groups synchronized so far, in the order they were first reached.
    pub fn synced(&self) -> &[ObjectId] {
        &self.order
    }
}
