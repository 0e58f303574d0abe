//! Unit tests for the always-available surface of `classy-sys`.

use classy_sys::{LinkedCapabilities, PACKAGE};
use proptest::prelude::*;

#[test]
fn summary_all_false_exact() {
    let caps = LinkedCapabilities { linked: false, mvec: false, openmp: false };
    assert_eq!(caps.summary(), "class=unlinked mvec=no openmp=no");
}

#[test]
fn summary_all_true_exact() {
    let caps = LinkedCapabilities { linked: true, mvec: true, openmp: true };
    assert_eq!(caps.summary(), "class=linked mvec=yes openmp=yes");
}

#[test]
fn compiled_linked_flag_matches_feature() {
    assert_eq!(LinkedCapabilities::compiled().linked, cfg!(feature = "ffi"));
}

#[test]
fn package_identity_is_stable() {
    assert_eq!(PACKAGE.name, "classy");
    assert_eq!(PACKAGE.url, "http://www.class-code.net");
    assert!(PACKAGE.description.contains("CLASS"));
}

#[cfg(feature = "ffi")]
#[test]
fn linked_build_knows_its_version() {
    let version = PACKAGE.version.expect("build script records CLASSY_VERSION");
    assert!(!version.is_empty());
    assert!(!version.starts_with('v'));
}

proptest! {
    #[test]
    fn summary_always_has_three_tokens(linked in any::<bool>(), mvec in any::<bool>(), openmp in any::<bool>()) {
        let summary = LinkedCapabilities { linked, mvec, openmp }.summary();
        let keys: Vec<&str> = summary.split(' ').filter_map(|kv| kv.split('=').next()).collect();
        prop_assert_eq!(keys, vec!["class", "mvec", "openmp"]);
    }
}
