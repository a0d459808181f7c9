//! I/O helpers for pbxsync commands.

pub mod project_store;
