//! Test-only fixtures: small Xcode projects and an on-disk project bundle.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::settings::SettingPolicy;
use crate::manifest::{FileEntry, Manifest};
use crate::pbx::{PbxProject, parse};

/// Name of the native target in [`MINIMAL_PBXPROJ`].
pub const MINIMAL_TARGET: &str = "Runner";
/// Path of the app group under the main group in [`MINIMAL_PBXPROJ`].
pub const MINIMAL_ROOT_GROUP: &str = "Runner";

/// Smallest project the mutator accepts: one app target with empty phases,
/// an empty `Runner` group, and Debug/Release configurations on both the
/// target and the project.
pub const MINIMAL_PBXPROJ: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 54;
	objects = {

/* Begin PBXFileReference section */
		97C146EE1CF9000F007C117D /* Runner.app */ = {isa = PBXFileReference; explicitFileType = wrapper.application; includeInIndex = 0; path = Runner.app; sourceTree = BUILT_PRODUCTS_DIR; };
/* End PBXFileReference section */

/* Begin PBXFrameworksBuildPhase section */
		97C146EB1CF9000F007C117D /* Frameworks */ = {
			isa = PBXFrameworksBuildPhase;
			buildActionMask = 2147483647;
			files = (
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXFrameworksBuildPhase section */

/* Begin PBXGroup section */
		97C146E51CF9000F007C117D = {
			isa = PBXGroup;
			children = (
				97C146F01CF9000F007C117D /* Runner */,
				97C146EF1CF9000F007C117D /* Products */,
			);
			sourceTree = "<group>";
		};
		97C146EF1CF9000F007C117D /* Products */ = {
			isa = PBXGroup;
			children = (
				97C146EE1CF9000F007C117D /* Runner.app */,
			);
			name = Products;
			sourceTree = "<group>";
		};
		97C146F01CF9000F007C117D /* Runner */ = {
			isa = PBXGroup;
			children = (
			);
			path = Runner;
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
		97C146ED1CF9000F007C117D /* Runner */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = 97C147051CF9000F007C117D /* Build configuration list for PBXNativeTarget "Runner" */;
			buildPhases = (
				97C146EA1CF9000F007C117D /* Sources */,
				97C146EB1CF9000F007C117D /* Frameworks */,
				97C146EC1CF9000F007C117D /* Resources */,
			);
			buildRules = (
			);
			dependencies = (
			);
			name = Runner;
			productName = Runner;
			productReference = 97C146EE1CF9000F007C117D /* Runner.app */;
			productType = "com.apple.product-type.application";
		};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		97C146E61CF9000F007C117D /* Project object */ = {
			isa = PBXProject;
			buildConfigurationList = 97C146E91CF9000F007C117D /* Build configuration list for PBXProject "Runner" */;
			compatibilityVersion = "Xcode 9.3";
			developmentRegion = en;
			hasScannedForEncodings = 0;
			knownRegions = (
				en,
				Base,
			);
			mainGroup = 97C146E51CF9000F007C117D;
			productRefGroup = 97C146EF1CF9000F007C117D /* Products */;
			projectDirPath = "";
			projectRoot = "";
			targets = (
				97C146ED1CF9000F007C117D /* Runner */,
			);
		};
/* End PBXProject section */

/* Begin PBXResourcesBuildPhase section */
		97C146EC1CF9000F007C117D /* Resources */ = {
			isa = PBXResourcesBuildPhase;
			buildActionMask = 2147483647;
			files = (
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXResourcesBuildPhase section */

/* Begin PBXSourcesBuildPhase section */
		97C146EA1CF9000F007C117D /* Sources */ = {
			isa = PBXSourcesBuildPhase;
			buildActionMask = 2147483647;
			files = (
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXSourcesBuildPhase section */

/* Begin XCBuildConfiguration section */
		97C147031CF9000F007C117D /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CLANG_CXX_LANGUAGE_STANDARD = "gnu++0x";
				SDKROOT = iphoneos;
			};
			name = Debug;
		};
		97C147041CF9000F007C117D /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CLANG_CXX_LANGUAGE_STANDARD = "gnu++0x";
				SDKROOT = iphoneos;
			};
			name = Release;
		};
		97C147061CF9000F007C117D /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				GCC_PREPROCESSOR_DEFINITIONS = (
					"DEBUG=1",
					"$(inherited)",
				);
				PRODUCT_NAME = "$(TARGET_NAME)";
			};
			name = Debug;
		};
		97C147071CF9000F007C117D /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				PRODUCT_NAME = "$(TARGET_NAME)";
			};
			name = Release;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		97C146E91CF9000F007C117D /* Build configuration list for PBXProject "Runner" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				97C147031CF9000F007C117D /* Debug */,
				97C147041CF9000F007C117D /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
		97C147051CF9000F007C117D /* Build configuration list for PBXNativeTarget "Runner" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				97C147061CF9000F007C117D /* Debug */,
				97C147071CF9000F007C117D /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
/* End XCConfigurationList section */
	};
	rootObject = 97C146E61CF9000F007C117D /* Project object */;
}
"#;

/// A stock Flutter iOS runner project, as `flutter create` leaves it.
pub const FLUTTER_RUNNER_PBXPROJ: &str =
    include_str!("../tests/fixtures/Runner.xcodeproj/project.pbxproj");

fn load(text: &str) -> PbxProject {
    let value = parse(text).expect("fixture parses");
    PbxProject::from_value(value).expect("fixture is a project")
}

pub fn minimal_project() -> PbxProject {
    load(MINIMAL_PBXPROJ)
}

pub fn flutter_runner_project() -> PbxProject {
    load(FLUTTER_RUNNER_PBXPROJ).with_name("Runner")
}

/// Two files in one group plus one scalar setting.
pub fn scenario_manifest() -> Manifest {
    let mut manifest = Manifest::new(MINIMAL_TARGET, MINIMAL_ROOT_GROUP);
    manifest.files.push(FileEntry::new("a.h", "Group1"));
    manifest.files.push(FileEntry::new("a.cc", "Group1"));
    manifest.settings.insert(
        "LANG_STD".to_string(),
        SettingPolicy::Scalar {
            value: "v1".to_string(),
        },
    );
    manifest
}

/// A temporary `Runner.xcodeproj` bundle holding a single `project.pbxproj`.
pub struct ProjectDir {
    _temp: TempDir,
    bundle: PathBuf,
}

impl ProjectDir {
    pub fn with_contents(contents: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let bundle = temp.path().join("Runner.xcodeproj");
        fs::create_dir_all(&bundle)
            .with_context(|| format!("create bundle {}", bundle.display()))?;
        fs::write(bundle.join("project.pbxproj"), contents).context("write fixture project")?;
        Ok(Self {
            _temp: temp,
            bundle,
        })
    }

    pub fn bundle(&self) -> &Path {
        &self.bundle
    }

    pub fn pbxproj_path(&self) -> PathBuf {
        self.bundle.join("project.pbxproj")
    }

    pub fn read(&self) -> Result<String> {
        let path = self.pbxproj_path();
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
