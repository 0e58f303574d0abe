//! Build script for classy-sys crate
//!
//! With the `ffi` feature enabled this compiles `csrc/classy_shim.c`, links the
//! prebuilt CLASS library and generates bindings for its public C API. Without
//! the feature only stub bindings are written so the workspace stays buildable
//! on machines without a CLASS checkout.

use std::env;
use std::path::{Path, PathBuf};

use classy_build::{
    BuildEnv, CcBuildStep, LINK_ARGS_METADATA_KEY, Setup, link_args_metadata, rerun_directives,
};

const SHIM_SOURCE: &str = "csrc/classy_shim.c";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={SHIM_SOURCE}");

    let mut build_env = BuildEnv::from_env().unwrap_or_else(|e| panic!("classy-sys: {e}"));
    anchor_class_root(&mut build_env);

    for line in rerun_directives(&build_env) {
        println!("{line}");
    }

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    // If the crate is compiled without `--features classy-sys/ffi`,
    // skip all native build steps.
    if env::var("CARGO_FEATURE_FFI").is_err() {
        std::fs::write(
            out_path.join("bindings.rs"),
            "// Bindings disabled - ffi feature not enabled\n",
        )
        .expect("failed to write stub bindings");
        // Dependents always find the key, even with nothing to link.
        println!("cargo:{LINK_ARGS_METADATA_KEY}=");
        return;
    }

    eprintln!("classy-sys: Using CLASS from: {}", build_env.class_root.display());

    let setup = Setup::resolve(&build_env, SHIM_SOURCE).unwrap_or_else(|e| {
        panic!(
            "classy-sys: {e}\n\
             Set CLASS_DIR to a built CLASS checkout or disable the 'ffi' feature."
        )
    });
    for warning in &setup.warnings {
        println!("cargo:warning=classy-sys: {warning}");
    }

    let extension = &setup.extensions[0];
    println!(
        "cargo:rustc-env=CLASSY_LINKED_MVEC={}",
        extension.libraries.iter().any(|lib| lib == "mvec")
    );
    println!("cargo:rustc-env=CLASSY_OPENMP={}", build_env.openmp_requested());
    println!("cargo:rustc-env=CLASSY_OPENMP_LINK_ARGS={}", extension.extra_link_args.join(" "));
    // `rustc-link-arg` stays with this package; the cdylib re-emits these.
    println!("{}", link_args_metadata(extension));

    setup
        .run_with(&mut CcBuildStep::for_build_script(&build_env))
        .unwrap_or_else(|e| panic!("classy-sys: {e}"));

    generate_bindings(&build_env.class_include_dir(), &extension.include_dirs, &out_path)
        .expect("Failed to generate FFI bindings from CLASS headers");
}

/// A relative `CLASS_DIR` is resolved against the workspace root, which is
/// expected to sit inside the CLASS checkout like the Python sources do.
fn anchor_class_root(build_env: &mut BuildEnv) {
    if build_env.class_root.is_absolute() {
        return;
    }
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let workspace_root = manifest_dir.join("..").join("..");
    build_env.class_root = workspace_root.join(&build_env.class_root);
}

fn generate_bindings(
    class_include: &Path,
    include_dirs: &[PathBuf],
    out_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let class_h = class_include.join("class.h");
    if !class_h.exists() {
        return Err(format!("class.h not found at {}", class_h.display()).into());
    }

    eprintln!("classy-sys: Generating bindings from {}", class_h.display());

    let mut builder = bindgen::Builder::default().header(class_h.to_string_lossy());
    for dir in include_dirs {
        builder = builder.clang_arg(format!("-I{}", dir.display()));
    }

    let bindings = builder
        // Module entry points of the solver pipeline
        .allowlist_function(
            "(input|background|thermodynamics|perturbations?|primordial|fourier|nonlinear|\
             transfer|harmonic|spectra|lensing|distortions|output)_(init|free)",
        )
        .allowlist_function("input_read_from_file|parser_.*")
        .allowlist_type(
            "precision|background|thermodynamics|perturbations?|primordial|fourier|nonlinear|\
             transfer|harmonic|spectra|lensing|distortions|output|file_content|ErrorMsg",
        )
        .allowlist_var("_(SUCCESS|FAILURE|TRUE|FALSE)_")
        .derive_debug(true)
        .derive_default(true)
        .raw_line("// Auto-generated bindings - DO NOT EDIT")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .map_err(|e| format!("bindgen failed: {e}"))?;

    let bindings_path = out_path.join("bindings.rs");
    bindings.write_to_file(&bindings_path)?;

    // Rust 2024 requires `unsafe extern` blocks
    let content = std::fs::read_to_string(&bindings_path)?;
    std::fs::write(&bindings_path, content.replace("extern \"C\" {", "unsafe extern \"C\" {"))?;

    eprintln!("classy-sys: Generated CLASS bindings successfully");
    Ok(())
}
