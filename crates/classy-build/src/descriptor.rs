//! The extension target and package metadata handed to a build step.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assemble::{AssembledFlags, assemble};
use crate::env::BuildEnv;
use crate::error::Result;
use crate::probe::{probe_mvec, resolve_numeric_include};
use crate::version::extract_version;

/// Importable module name of the binding.
pub const MODULE_NAME: &str = "classy";
pub const PACKAGE_DESCRIPTION: &str = "Python interface to the Cosmological Boltzmann code CLASS";
pub const PACKAGE_URL: &str = "http://www.class-code.net";

/// One native extension target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    pub extra_compile_args: Vec<String>,
    pub extra_link_args: Vec<String>,
}

impl ExtensionDescriptor {
    /// The `classy` extension: one source file, linked against the prebuilt
    /// CLASS library found under `env.class_root`.
    pub fn classy(flags: AssembledFlags, env: &BuildEnv, source: impl Into<PathBuf>) -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            sources: vec![source.into()],
            include_dirs: flags.include_dirs,
            libraries: flags.libraries,
            library_dirs: vec![env.class_library_dir().to_path_buf()],
            extra_compile_args: flags.compile_args,
            extra_link_args: flags.link_args,
        }
    }
}

/// Package-level metadata published alongside the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: String,
}

impl PackageMetadata {
    pub fn classy(version: impl Into<String>) -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            version: version.into(),
            description: PACKAGE_DESCRIPTION.to_string(),
            url: PACKAGE_URL.to_string(),
        }
    }
}

/// Everything a build step needs: metadata plus the extension targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub metadata: PackageMetadata,
    pub extensions: Vec<ExtensionDescriptor>,
    /// Non-fatal configuration warnings collected while resolving.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Setup {
    /// Run the whole configuration pipeline for the `classy` extension:
    /// extract the CLASS version, probe the compiler for `libmvec`, locate
    /// the numeric library headers and assemble the descriptor.
    ///
    /// `source` is the single C source compiled into the extension.
    ///
    /// # Errors
    ///
    /// Any stage failure is returned unchanged; nothing is defaulted.
    pub fn resolve(env: &BuildEnv, source: impl Into<PathBuf>) -> Result<Self> {
        let version = extract_version(&env.version_header())?;
        let mvec = probe_mvec(&env.compiler, env.mvec_probe)?;
        let numeric_include = resolve_numeric_include(env)?;

        let mut flags = assemble(env, numeric_include, mvec);
        let warnings = std::mem::take(&mut flags.warnings);

        tracing::info!(%version, mvec = mvec.available, "resolved classy build configuration");
        Ok(Self {
            metadata: PackageMetadata::classy(version),
            extensions: vec![ExtensionDescriptor::classy(flags, env, source)],
            warnings,
        })
    }

    /// Pretty JSON rendering used by the CLI report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::TargetOs;
    use crate::probe::MvecProbe;

    #[test]
    fn classy_descriptor_links_from_class_root() {
        let env = BuildEnv {
            class_root: PathBuf::from("/src/class"),
            os: TargetOs::Linux,
            ..BuildEnv::default()
        };
        let flags = assemble(&env, PathBuf::from("/np"), MvecProbe::assume(false));
        let ext = ExtensionDescriptor::classy(flags, &env, "csrc/classy_shim.c");

        assert_eq!(ext.name, "classy");
        assert_eq!(ext.sources, vec![PathBuf::from("csrc/classy_shim.c")]);
        assert_eq!(ext.library_dirs, vec![PathBuf::from("/src/class")]);
        assert_eq!(ext.include_dirs[1], PathBuf::from("/src/class/include"));
    }

    #[test]
    fn metadata_carries_project_identity() {
        let meta = PackageMetadata::classy("3.2.1");
        assert_eq!(meta.name, "classy");
        assert_eq!(meta.version, "3.2.1");
        assert_eq!(meta.url, "http://www.class-code.net");
    }

    #[test]
    fn json_report_omits_empty_warnings() {
        let setup = Setup {
            metadata: PackageMetadata::classy("3.2.1"),
            extensions: Vec::new(),
            warnings: Vec::new(),
        };
        let json = setup.to_json().unwrap();
        assert!(json.contains("\"version\": \"3.2.1\""));
        assert!(!json.contains("warnings"));
    }
}
