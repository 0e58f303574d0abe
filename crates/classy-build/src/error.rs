//! Error type shared by every stage of the build pipeline.

use std::path::PathBuf;

/// Errors produced while configuring or building the extension.
///
/// None of these are recovered from: build scripts abort with the rendered
/// message and the CLI wraps them with extra context.
#[derive(Debug, thiserror::Error)]
pub enum BuildConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no line containing `{marker}` found in {}", path.display())]
    VersionMarkerNotFound { path: PathBuf, marker: &'static str },

    #[error("malformed version line: {line:?}")]
    MalformedVersion { line: String },

    #[error("failed to launch compiler `{compiler}`: {source}")]
    ProbeLaunch {
        compiler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("numeric library include directory unavailable: {0}")]
    NumericInclude(String),

    #[error("invalid mvec probe strategy {0:?} (expected `stderr` or `link`)")]
    InvalidProbeStrategy(String),

    #[error("compilation of extension `{extension}` failed: {message}")]
    Compile { extension: String, message: String },
}

pub type Result<T> = std::result::Result<T, BuildConfigError>;
