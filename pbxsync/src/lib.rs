//! Deterministic mutator for Xcode `project.pbxproj` files.
//!
//! Wires the PaddleOCR sources, the Paddle-Lite headers and library, and the
//! OpenCV framework into a Flutter iOS runner. The crate is split the same
//! way throughout:
//!
//! - **[`pbx`]**: The OpenStep plist codec and the object-graph model.
//! - **[`core`]**: Pure project mutations (group sync, file injection,
//!   settings merge). No I/O.
//! - **[`io`]**: Reading and atomically writing the project file.
//!
//! [`apply`] coordinates the three to implement the CLI commands, driven by
//! the [`manifest`].

pub mod apply;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod manifest;
pub mod pbx;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
