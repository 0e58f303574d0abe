use classy_build::cdylib_link_directives;
use pyo3_build_config::get;

fn main() {
    // On macOS the extension resolves CPython symbols from the host
    // interpreter at load time instead of linking libpython.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos")
        && std::env::var_os("CARGO_FEATURE_EXTENSION_MODULE").is_some()
    {
        println!("cargo:rustc-link-arg=-undefined");
        println!("cargo:rustc-link-arg=dynamic_lookup");
    }

    // OpenMP link arguments published by classy-sys (`links = "class"`).
    let link_args = std::env::var("DEP_CLASS_OPENMP_LINK_ARGS").unwrap_or_default();
    for line in cdylib_link_directives(&link_args) {
        println!("{line}");
    }
    println!("cargo:rustc-env=CLASSY_CDYLIB_LINK_ARGS={}", link_args.trim());

    // Unit tests embed the interpreter; help the linker find libpython.
    let config = get();
    if std::env::var_os("CARGO_FEATURE_EXTENSION_MODULE").is_none()
        && let Some(lib_dir) = &config.lib_dir
    {
        println!("cargo:rustc-link-search=native={}", lib_dir);
    }

    println!("cargo:rerun-if-changed=build.rs");
}
