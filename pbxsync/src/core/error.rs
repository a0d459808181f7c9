//! Errors raised while mutating a project in memory.

use thiserror::Error;

use crate::pbx::ModelError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("target '{0}' not found")]
    TargetNotFound(String),
    #[error("target '{name}' is ambiguous: {count} targets share that name")]
    AmbiguousTarget { name: String, count: usize },
    #[error("group '{0}' not found under the main group")]
    GroupNotFound(String),
    #[error("cannot infer file kind for '{0}': unrecognized extension")]
    UnknownFileKind(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}
