//! Property tests for the pure stages of the pipeline.

use std::path::PathBuf;

use classy_build::env::parse_includes;
use classy_build::version::version_from_line;
use classy_build::{BuildEnv, MvecProbe, TargetOs, assemble, mvec_available_from_stderr};
use proptest::prelude::*;

fn path_segment() -> impl Strategy<Value = String> {
    "/[a-z][a-z0-9_]{0,8}(/[a-z0-9_]{1,8}){0,3}"
}

proptest! {
    #[test]
    fn includes_roundtrip_through_prefix_stripping(paths in prop::collection::vec(path_segment(), 0..6)) {
        let value = paths.iter().map(|p| format!("-I{p}")).collect::<Vec<_>>().join(" ");
        let parsed = parse_includes(&value);
        let expected: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn semantic_versions_are_extracted_verbatim(major in 0u32..100, minor in 0u32..100, patch in 0u32..100) {
        let line = format!("#define _VERSION_ \"v{major}.{minor}.{patch}\"");
        prop_assert_eq!(version_from_line(&line).unwrap(), format!("{major}.{minor}.{patch}"));
    }

    #[test]
    fn stderr_containing_mvec_is_always_unavailable(prefix in ".{0,40}", suffix in ".{0,40}") {
        let stderr = format!("{prefix}mvec{suffix}");
        prop_assert!(!mvec_available_from_stderr(stderr.as_bytes()));
    }

    #[test]
    fn solver_and_blas_always_lead_the_library_list(available in any::<bool>(), omp in any::<bool>()) {
        let env = BuildEnv {
            omp_flags: if omp { vec!["-fopenmp".into()] } else { Vec::new() },
            os: TargetOs::Linux,
            ..BuildEnv::default()
        };
        let flags = assemble(&env, PathBuf::from("/np"), MvecProbe::assume(available));
        prop_assert_eq!(&flags.libraries[..2], ["class", "openblas"]);
        prop_assert_eq!(flags.libraries.last().map(String::as_str), Some("m"));
        prop_assert_eq!(flags.libraries.iter().any(|l| l == "mvec"), available);
        prop_assert_eq!(flags.compile_args.is_empty(), !omp);
    }
}
