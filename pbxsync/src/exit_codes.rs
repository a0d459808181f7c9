//! Stable exit codes for pbxsync commands.

/// Command succeeded; for `check`, the project is already up to date.
pub const OK: i32 = 0;
/// Command failed: unreadable project, missing target or group, bad manifest.
pub const FAILED: i32 = 1;
/// `pbxsync check` found that `apply` would change the project.
pub const DRIFT: i32 = 2;
