//! Build invocation: turning a [`Setup`] into compiled artifacts.
//!
//! A [`BuildStep`] receives each extension descriptor together with the
//! package metadata. [`CcBuildStep`] is the stock implementation; callers can
//! substitute their own through [`Setup::run_with`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::descriptor::{ExtensionDescriptor, PackageMetadata, Setup};
use crate::env::{BuildEnv, TargetOs, WATCHED_VARS};
use crate::error::{BuildConfigError, Result};

/// Compiles one extension.
pub trait BuildStep {
    /// Build `extension`, returning where its artifact ended up.
    fn build_extension(
        &mut self,
        metadata: &PackageMetadata,
        extension: &ExtensionDescriptor,
    ) -> Result<BuiltExtension>;
}

/// Result of a successful [`BuildStep::build_extension`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltExtension {
    pub name: String,
    pub artifact: PathBuf,
}

impl Setup {
    /// Hand every extension to `step`, in order, stopping at the first
    /// failure.
    pub fn run_with<S: BuildStep + ?Sized>(&self, step: &mut S) -> Result<Vec<BuiltExtension>> {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }

        let mut built = Vec::with_capacity(self.extensions.len());
        for extension in &self.extensions {
            tracing::info!(
                extension = %extension.name,
                version = %self.metadata.version,
                "building extension"
            );
            built.push(step.build_extension(&self.metadata, extension)?);
        }
        Ok(built)
    }
}

// ── CcBuildStep ─────────────────────────────────────────────────────

/// Where [`CcBuildStep`] puts its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Inside a Cargo build script: compile a static archive into `OUT_DIR`
    /// and print `cargo:` link directives.
    CargoStatic,
    /// Outside Cargo: compile objects into `out_dir` and link a loadable
    /// shared library there.
    SharedObject { out_dir: PathBuf, target: String, os: TargetOs },
}

/// [`BuildStep`] backed by the `cc` crate.
#[derive(Debug, Clone)]
pub struct CcBuildStep {
    compiler: String,
    mode: OutputMode,
}

impl CcBuildStep {
    /// Build step for use from `build.rs`.
    pub fn for_build_script(env: &BuildEnv) -> Self {
        Self { compiler: env.compiler.clone(), mode: OutputMode::CargoStatic }
    }

    /// Build step producing a shared library in `out_dir` for `target`.
    pub fn standalone(
        env: &BuildEnv,
        out_dir: impl Into<PathBuf>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            compiler: env.compiler.clone(),
            mode: OutputMode::SharedObject {
                out_dir: out_dir.into(),
                target: target.into(),
                os: env.os.clone(),
            },
        }
    }

    pub fn mode(&self) -> &OutputMode {
        &self.mode
    }

    fn cc_build(&self, extension: &ExtensionDescriptor) -> cc::Build {
        let mut build = cc::Build::new();
        build.compiler(&self.compiler);
        for source in &extension.sources {
            build.file(source);
        }
        for dir in &extension.include_dirs {
            build.include(dir);
        }
        for arg in &extension.extra_compile_args {
            build.flag(arg);
        }

        if let OutputMode::SharedObject { out_dir, target, .. } = &self.mode {
            build
                .cargo_metadata(false)
                .cargo_warnings(false)
                .out_dir(out_dir)
                .target(target)
                .host(target)
                .opt_level(2)
                .debug(false)
                .pic(true);
        }
        build
    }

    /// Linker invocation producing the shared library from `objects`.
    pub fn link_command(
        &self,
        extension: &ExtensionDescriptor,
        objects: &[PathBuf],
        output: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.compiler);
        cmd.arg("-shared");
        if let OutputMode::SharedObject { os: TargetOs::MacOs, .. } = &self.mode {
            // Python symbols resolve against the host interpreter at load time.
            cmd.args(["-undefined", "dynamic_lookup"]);
        }
        cmd.args(objects);
        for dir in &extension.library_dirs {
            cmd.arg(format!("-L{}", dir.display()));
        }
        for lib in &extension.libraries {
            cmd.arg(format!("-l{lib}"));
        }
        cmd.args(&extension.extra_link_args);
        cmd.arg("-o").arg(output);
        cmd
    }
}

impl BuildStep for CcBuildStep {
    fn build_extension(
        &mut self,
        metadata: &PackageMetadata,
        extension: &ExtensionDescriptor,
    ) -> Result<BuiltExtension> {
        let compile_error = |message: String| BuildConfigError::Compile {
            extension: extension.name.clone(),
            message,
        };
        let build = self.cc_build(extension);

        match &self.mode {
            OutputMode::CargoStatic => {
                build.try_compile(&extension.name).map_err(|e| compile_error(e.to_string()))?;
                for line in metadata_directives(metadata) {
                    println!("{line}");
                }
                for line in extension_directives(extension) {
                    println!("{line}");
                }
                let out_dir = std::env::var_os("OUT_DIR").map(PathBuf::from).unwrap_or_default();
                Ok(BuiltExtension {
                    name: extension.name.clone(),
                    artifact: out_dir.join(format!("lib{}.a", extension.name)),
                })
            }
            OutputMode::SharedObject { out_dir, os, .. } => {
                let objects = build
                    .try_compile_intermediates()
                    .map_err(|e| compile_error(e.to_string()))?;
                let artifact = out_dir.join(shared_library_name(&extension.name, os));

                let output =
                    self.link_command(extension, &objects, &artifact).output().map_err(|e| {
                        compile_error(format!("failed to launch {}: {e}", self.compiler))
                    })?;
                if !output.status.success() {
                    return Err(compile_error(String::from_utf8_lossy(&output.stderr).into_owned()));
                }

                tracing::info!(artifact = %artifact.display(), "linked extension");
                Ok(BuiltExtension { name: extension.name.clone(), artifact })
            }
        }
    }
}

/// File name of a loadable module for `os`.
pub fn shared_library_name(name: &str, os: &TargetOs) -> String {
    match os {
        TargetOs::Other(id) if id == "windows" => format!("{name}.pyd"),
        _ => format!("{name}.so"),
    }
}

// ── Cargo directives ────────────────────────────────────────────────

/// `cargo:rustc-env` lines exposing the package metadata to the crate.
pub fn metadata_directives(metadata: &PackageMetadata) -> Vec<String> {
    vec![
        format!("cargo:rustc-env=CLASSY_PACKAGE_NAME={}", metadata.name),
        format!("cargo:rustc-env=CLASSY_VERSION={}", metadata.version),
        format!("cargo:rustc-env=CLASSY_DESCRIPTION={}", metadata.description),
        format!("cargo:rustc-env=CLASSY_URL={}", metadata.url),
    ]
}

/// Link search paths, libraries and linker arguments for one extension.
pub fn extension_directives(extension: &ExtensionDescriptor) -> Vec<String> {
    let search = extension
        .library_dirs
        .iter()
        .map(|dir| format!("cargo:rustc-link-search=native={}", dir.display()));
    let libs = extension.libraries.iter().map(|lib| format!("cargo:rustc-link-lib={lib}"));
    let args = extension.extra_link_args.iter().map(|arg| format!("cargo:rustc-link-arg={arg}"));
    search.chain(libs).chain(args).collect()
}

/// `links` metadata key carrying the extension's linker arguments.
///
/// `cargo:rustc-link-arg` only reaches targets of the package whose build
/// script printed it, so a `-sys` crate hands the arguments to the final
/// cdylib through `DEP_<links>_OPENMP_LINK_ARGS` instead.
pub const LINK_ARGS_METADATA_KEY: &str = "openmp_link_args";

/// `cargo:openmp_link_args=...` line for `extension`. The value is empty when
/// no linker arguments are needed.
pub fn link_args_metadata(extension: &ExtensionDescriptor) -> String {
    format!("cargo:{LINK_ARGS_METADATA_KEY}={}", extension.extra_link_args.join(" "))
}

/// `cargo:rustc-link-arg-cdylib` lines for a value received through
/// [`link_args_metadata`].
pub fn cdylib_link_directives(link_args: &str) -> Vec<String> {
    link_args
        .split_whitespace()
        .map(|arg| format!("cargo:rustc-link-arg-cdylib={arg}"))
        .collect()
}

/// Every directive for `setup`, warnings first.
pub fn cargo_directives(setup: &Setup) -> Vec<String> {
    let mut lines: Vec<String> =
        setup.warnings.iter().map(|w| format!("cargo:warning=classy: {w}")).collect();
    lines.extend(metadata_directives(&setup.metadata));
    for extension in &setup.extensions {
        lines.extend(extension_directives(extension));
    }
    lines
}

/// `rerun-if-*` lines covering every input the pipeline reads.
pub fn rerun_directives(env: &BuildEnv) -> Vec<String> {
    let mut lines = vec![format!("cargo:rerun-if-changed={}", env.version_header().display())];
    lines.extend(WATCHED_VARS.iter().map(|var| format!("cargo:rerun-if-env-changed={var}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ExtensionDescriptor {
        ExtensionDescriptor {
            name: "classy".into(),
            sources: vec![PathBuf::from("csrc/classy_shim.c")],
            include_dirs: vec![PathBuf::from("/np"), PathBuf::from("../include")],
            libraries: vec!["class".into(), "openblas".into(), "m".into()],
            library_dirs: vec![PathBuf::from("..")],
            extra_compile_args: vec!["-fopenmp".into()],
            extra_link_args: vec!["-fopenmp".into()],
        }
    }

    #[test]
    fn extension_directives_preserve_library_order() {
        assert_eq!(
            extension_directives(&descriptor()),
            vec![
                "cargo:rustc-link-search=native=..",
                "cargo:rustc-link-lib=class",
                "cargo:rustc-link-lib=openblas",
                "cargo:rustc-link-lib=m",
                "cargo:rustc-link-arg=-fopenmp",
            ]
        );
    }

    #[test]
    fn link_args_relay_to_the_cdylib() {
        let mut ext = descriptor();
        ext.extra_link_args = vec!["-Xpreprocessor".into(), "-fopenmp".into()];

        let line = link_args_metadata(&ext);
        assert_eq!(line, "cargo:openmp_link_args=-Xpreprocessor -fopenmp");

        let relayed = line.strip_prefix("cargo:openmp_link_args=").unwrap();
        assert_eq!(
            cdylib_link_directives(relayed),
            [
                "cargo:rustc-link-arg-cdylib=-Xpreprocessor",
                "cargo:rustc-link-arg-cdylib=-fopenmp",
            ]
        );
    }

    #[test]
    fn empty_link_args_relay_nothing() {
        let mut ext = descriptor();
        ext.extra_link_args.clear();
        assert_eq!(link_args_metadata(&ext), "cargo:openmp_link_args=");
        assert!(cdylib_link_directives("").is_empty());
        assert!(cdylib_link_directives("  ").is_empty());
    }

    #[test]
    fn warnings_lead_the_directive_list() {
        let setup = Setup {
            metadata: PackageMetadata::classy("3.2.1"),
            extensions: vec![descriptor()],
            warnings: vec!["no OpenMP link flags".into()],
        };
        let lines = cargo_directives(&setup);
        assert_eq!(lines[0], "cargo:warning=classy: no OpenMP link flags");
        assert!(lines.contains(&"cargo:rustc-env=CLASSY_VERSION=3.2.1".to_string()));
    }

    #[test]
    fn rerun_directives_watch_header_and_env() {
        let env = BuildEnv::default();
        let lines = rerun_directives(&env);
        assert_eq!(lines[0], "cargo:rerun-if-changed=../include/common.h");
        assert!(lines.contains(&"cargo:rerun-if-env-changed=OMPFLAG".to_string()));
        assert!(lines.contains(&"cargo:rerun-if-env-changed=CC".to_string()));
    }

    #[test]
    fn link_command_orders_objects_libraries_and_flags() {
        let env = BuildEnv { compiler: "cc".into(), os: TargetOs::Linux, ..BuildEnv::default() };
        let step = CcBuildStep::standalone(&env, "/tmp/out", "x86_64-unknown-linux-gnu");
        let cmd = step.link_command(
            &descriptor(),
            &[PathBuf::from("/tmp/out/shim.o")],
            Path::new("/tmp/out/classy.so"),
        );
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-shared",
                "/tmp/out/shim.o",
                "-L..",
                "-lclass",
                "-lopenblas",
                "-lm",
                "-fopenmp",
                "-o",
                "/tmp/out/classy.so",
            ]
        );
    }

    #[test]
    fn macos_link_defers_interpreter_symbols() {
        let env = BuildEnv { os: TargetOs::MacOs, ..BuildEnv::default() };
        let step = CcBuildStep::standalone(&env, "/tmp/out", "aarch64-apple-darwin");
        let cmd = step.link_command(&descriptor(), &[], Path::new("/tmp/out/classy.so"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(&args[..3], ["-shared", "-undefined", "dynamic_lookup"]);
    }

    struct Recording(Vec<(String, String)>);

    impl BuildStep for Recording {
        fn build_extension(
            &mut self,
            metadata: &PackageMetadata,
            extension: &ExtensionDescriptor,
        ) -> Result<BuiltExtension> {
            self.0.push((metadata.version.clone(), extension.name.clone()));
            Ok(BuiltExtension { name: extension.name.clone(), artifact: PathBuf::from("x") })
        }
    }

    #[test]
    fn run_with_hands_metadata_to_custom_step() {
        let setup = Setup {
            metadata: PackageMetadata::classy("3.2.1"),
            extensions: vec![descriptor()],
            warnings: Vec::new(),
        };
        let mut step = Recording(Vec::new());
        let built = setup.run_with(&mut step).unwrap();
        assert_eq!(step.0, vec![("3.2.1".to_string(), "classy".to_string())]);
        assert_eq!(built.len(), 1);
    }
}
