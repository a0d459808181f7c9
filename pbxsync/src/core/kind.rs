//! File kind inference.
//!
//! The kind decides two things: the `lastKnownFileType` written on the file
//! reference, and which build phase (if any) the reference is registered in.
//! Guessing wrong is not harmless: a source classified as a header silently
//! drops out of the build, so unknown extensions are rejected.

use std::path::Path;

use serde::Deserialize;

use super::error::MutationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    CHeader,
    CppHeader,
    CSource,
    CppSource,
    ObjcSource,
    ObjcppSource,
    SwiftSource,
    StaticLibrary,
    DynamicLibrary,
    TextBasedDylib,
    Framework,
    #[serde(rename = "xcframework")]
    XcFramework,
}

/// Where a file reference goes besides its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRole {
    /// Visible in the navigator only.
    Header,
    /// Compiled: registered in the sources phase.
    Source,
    /// Linked: registered in the frameworks phase.
    Link,
}

impl FileKind {
    /// Infer the kind from the extension of `file_name`.
    pub fn infer(file_name: &str) -> Result<Self, MutationError> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| MutationError::UnknownFileKind(file_name.to_string()))
    }

    /// Resolve an explicit kind, falling back to inference.
    pub fn resolve(file_name: &str, explicit: Option<Self>) -> Result<Self, MutationError> {
        match explicit {
            Some(kind) => Ok(kind),
            None => Self::infer(file_name),
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let kind = match ext.to_ascii_lowercase().as_str() {
            "h" | "pch" => Self::CHeader,
            "hh" | "hpp" | "hxx" | "inl" => Self::CppHeader,
            "c" => Self::CSource,
            "cc" | "cpp" | "cxx" => Self::CppSource,
            "m" => Self::ObjcSource,
            "mm" => Self::ObjcppSource,
            "swift" => Self::SwiftSource,
            "a" => Self::StaticLibrary,
            "dylib" => Self::DynamicLibrary,
            "tbd" => Self::TextBasedDylib,
            "framework" => Self::Framework,
            "xcframework" => Self::XcFramework,
            _ => return None,
        };
        Some(kind)
    }

    /// Value for `lastKnownFileType`.
    pub fn file_type(self) -> &'static str {
        match self {
            Self::CHeader => "sourcecode.c.h",
            Self::CppHeader => "sourcecode.cpp.h",
            Self::CSource => "sourcecode.c.c",
            Self::CppSource => "sourcecode.cpp.cpp",
            Self::ObjcSource => "sourcecode.c.objc",
            Self::ObjcppSource => "sourcecode.cpp.objcpp",
            Self::SwiftSource => "sourcecode.swift",
            Self::StaticLibrary => "archive.ar",
            Self::DynamicLibrary => "compiled.mach-o.dylib",
            Self::TextBasedDylib => "sourcecode.text-based-dylib-definition",
            Self::Framework => "wrapper.framework",
            Self::XcFramework => "wrapper.xcframework",
        }
    }

    pub fn role(self) -> BuildRole {
        match self {
            Self::CHeader | Self::CppHeader => BuildRole::Header,
            Self::CSource
            | Self::CppSource
            | Self::ObjcSource
            | Self::ObjcppSource
            | Self::SwiftSource => BuildRole::Source,
            Self::StaticLibrary
            | Self::DynamicLibrary
            | Self::TextBasedDylib
            | Self::Framework
            | Self::XcFramework => BuildRole::Link,
        }
    }

    /// Short human label for summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::CHeader | Self::CppHeader => "header",
            Self::CSource
            | Self::CppSource
            | Self::ObjcSource
            | Self::ObjcppSource
            | Self::SwiftSource => "source",
            Self::StaticLibrary => "static library",
            Self::DynamicLibrary | Self::TextBasedDylib => "dynamic library",
            Self::Framework | Self::XcFramework => "framework",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilable_extensions_route_to_sources() {
        for name in ["pipeline.cc", "clipper.cpp", "PaddleOcrPlugin.mm", "shim.m", "x.c"] {
            let kind = FileKind::infer(name).expect(name);
            assert_eq!(kind.role(), BuildRole::Source, "{name}");
        }
    }

    #[test]
    fn headers_are_not_compiled() {
        for name in ["utils.h", "clipper.hpp", "timer.hh"] {
            assert_eq!(FileKind::infer(name).expect(name).role(), BuildRole::Header);
        }
    }

    #[test]
    fn archives_and_bundles_route_to_link_phase() {
        let lib = FileKind::infer("libpaddle_api_light_bundled.a").expect("lib");
        assert_eq!(lib, FileKind::StaticLibrary);
        assert_eq!(lib.file_type(), "archive.ar");
        assert_eq!(lib.role(), BuildRole::Link);

        let framework = FileKind::infer("opencv2.framework").expect("framework");
        assert_eq!(framework.file_type(), "wrapper.framework");
        assert_eq!(framework.role(), BuildRole::Link);
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(FileKind::infer("LEGACY.CPP"), Ok(FileKind::CppSource));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert_eq!(
            FileKind::infer("model.nb"),
            Err(MutationError::UnknownFileKind("model.nb".to_string()))
        );
        assert!(FileKind::infer("Makefile").is_err());
    }

    #[test]
    fn explicit_kind_wins_over_extension() {
        let kind = FileKind::resolve("vendor.bundle", Some(FileKind::Framework)).expect("kind");
        assert_eq!(kind, FileKind::Framework);
    }

    #[test]
    fn kinds_deserialize_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: FileKind,
        }
        let parsed: Wrapper = toml::from_str("kind = \"xcframework\"").expect("parse");
        assert_eq!(parsed.kind, FileKind::XcFramework);
        let parsed: Wrapper = toml::from_str("kind = \"static-library\"").expect("parse");
        assert_eq!(parsed.kind, FileKind::StaticLibrary);
    }
}
