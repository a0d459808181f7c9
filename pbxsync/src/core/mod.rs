//! Deterministic mutation logic for the project graph.
//!
//! Core modules must be free of I/O side effects. They operate on an in-memory
//! [`PbxProject`](crate::pbx::PbxProject) and return deterministic outputs
//! suitable for tests.

pub mod error;
pub mod group_sync;
pub mod inject;
pub mod kind;
pub mod settings;

pub use error::MutationError;
