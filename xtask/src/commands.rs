//! Task implementations. Each returns the text to print.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use classy_build::{BuildEnv, CcBuildStep, Setup, extract_version, probe_mvec};

use crate::cli::{Cli, Command, OutputFormat};

/// Root of this workspace.
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).parent().map(Path::to_path_buf).unwrap_or_default()
}

/// The shim compiled into the extension by `classy-sys`.
pub fn default_source() -> PathBuf {
    workspace_root().join("crates/classy-sys/csrc/classy_shim.c")
}

/// Read the environment, then apply `--class-dir`.
///
/// A relative `CLASS_DIR` (including the `..` default) is taken relative to
/// the workspace root, matching the `classy-sys` build script. `--class-dir`
/// is used as given.
pub fn load_env(class_dir: Option<&Path>) -> Result<BuildEnv> {
    let mut env = BuildEnv::from_env().context("invalid build environment")?;
    match class_dir {
        Some(dir) => env.class_root = dir.to_path_buf(),
        None if env.class_root.is_relative() => {
            env.class_root = workspace_root().join(&env.class_root);
        }
        None => {}
    }
    Ok(env)
}

pub fn version(env: &BuildEnv) -> Result<String> {
    let header = env.version_header();
    extract_version(&header)
        .with_context(|| format!("cannot determine CLASS version from {}", header.display()))
}

pub fn probe(env: &BuildEnv) -> Result<String> {
    let result = probe_mvec(&env.compiler, env.mvec_probe)
        .with_context(|| format!("mvec probe with `{}` failed", env.compiler))?;
    let verdict = if result.available { "available" } else { "unavailable" };
    Ok(format!("compiler: {}\nmvec: {verdict} (probe: {})", env.compiler, result.strategy))
}

pub fn config(env: &BuildEnv, source: &Path, format: OutputFormat) -> Result<String> {
    let setup = Setup::resolve(env, source).context("failed to resolve extension configuration")?;
    match format {
        OutputFormat::Json => Ok(setup.to_json()?),
        OutputFormat::Text => Ok(render_text(&setup)),
    }
}

/// Human-readable rendering of a resolved [`Setup`].
pub fn render_text(setup: &Setup) -> String {
    fn join<T: AsRef<Path>>(items: &[T]) -> String {
        if items.is_empty() {
            return "(none)".to_string();
        }
        items.iter().map(|i| i.as_ref().display().to_string()).collect::<Vec<_>>().join(" ")
    }

    let meta = &setup.metadata;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", meta.name, meta.version);
    let _ = writeln!(out, "  description:  {}", meta.description);
    let _ = writeln!(out, "  url:          {}", meta.url);
    for ext in &setup.extensions {
        let _ = writeln!(out, "extension {}", ext.name);
        let _ = writeln!(out, "  sources:      {}", join(&ext.sources));
        let _ = writeln!(out, "  include_dirs: {}", join(&ext.include_dirs));
        let _ = writeln!(out, "  libraries:    {}", join(&ext.libraries));
        let _ = writeln!(out, "  library_dirs: {}", join(&ext.library_dirs));
        let _ = writeln!(out, "  compile_args: {}", join(&ext.extra_compile_args));
        let _ = writeln!(out, "  link_args:    {}", join(&ext.extra_link_args));
    }
    for warning in &setup.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

pub fn build_ext(env: &BuildEnv, out_dir: &Path, source: &Path, target: &str) -> Result<String> {
    if !source.exists() {
        bail!("extension source not found: {}", source.display());
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create output directory {}", out_dir.display()))?;

    let setup = Setup::resolve(env, source).context("failed to resolve extension configuration")?;
    let mut step = CcBuildStep::standalone(env, out_dir, target);
    let built = setup.run_with(&mut step).context("extension build failed")?;

    let mut out = String::new();
    for ext in built {
        let _ = writeln!(out, "built {} -> {}", ext.name, ext.artifact.display());
    }
    Ok(out)
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<String> {
    let env = load_env(cli.class_dir.as_deref())?;
    tracing::debug!(class_root = %env.class_root.display(), "xtask environment");

    match cli.command {
        Command::Version => version(&env),
        Command::Probe => probe(&env),
        Command::Config { source, format } => {
            config(&env, &source.unwrap_or_else(default_source), format)
        }
        Command::BuildExt { out_dir, source, target } => {
            let target = target.unwrap_or_else(|| env!("VERGEN_CARGO_TARGET_TRIPLE").to_string());
            build_ext(&env, &out_dir, &source.unwrap_or_else(default_source), &target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classy_build::{ExtensionDescriptor, PackageMetadata};

    #[test]
    fn text_report_marks_empty_lists() {
        let setup = Setup {
            metadata: PackageMetadata::classy("3.2.1"),
            extensions: vec![ExtensionDescriptor {
                name: "classy".into(),
                sources: vec![PathBuf::from("classy_shim.c")],
                include_dirs: vec![PathBuf::from("/np"), PathBuf::from("../include")],
                libraries: vec!["class".into(), "openblas".into(), "m".into()],
                library_dirs: vec![PathBuf::from("..")],
                extra_compile_args: Vec::new(),
                extra_link_args: Vec::new(),
            }],
            warnings: vec!["no OpenMP link flags for haiku".into()],
        };
        let text = render_text(&setup);
        assert!(text.starts_with("classy 3.2.1\n"));
        assert!(text.contains("  libraries:    class openblas m\n"));
        assert!(text.contains("  compile_args: (none)\n"));
        assert!(text.ends_with("warning: no OpenMP link flags for haiku\n"));
    }

    #[test]
    fn default_source_points_at_sys_crate_shim() {
        assert!(default_source().ends_with("crates/classy-sys/csrc/classy_shim.c"));
    }
}
