//! Xcode project model and its property-list codec.
//!
//! - [`parse`]: OpenStep ASCII plist text into a [`Value`] tree.
//! - [`project`]: the object graph built on top of that tree.
//! - [`write`]: the canonical Xcode layout back out.

pub mod ids;
pub mod parse;
pub mod project;
pub mod value;
pub mod write;

pub use ids::ObjectId;
pub use parse::{ParseError, parse};
pub use project::{ModelError, Object, PbxProject};
pub use value::{Dict, Value};
pub use write::to_pbxproj;
