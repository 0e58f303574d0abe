use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    // Build-time constants for `xtask --version` and the default
    // `build-ext` target.
    EmitBuilder::builder().build_timestamp().rustc_semver().cargo_target_triple().emit()?;

    Ok(())
}
