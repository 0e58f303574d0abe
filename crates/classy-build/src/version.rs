//! Version extraction from the CLASS `common.h` header.
//!
//! The header carries a line such as
//!
//! ```c
//! #define _VERSION_ "v3.2.1"
//! ```
//!
//! and the package version is the quoted token with its `"v` prefix and
//! closing quote removed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{BuildConfigError, Result};

/// Substring identifying the version line.
pub const VERSION_MARKER: &str = "_VERSION_";

/// Characters dropped from the front of the version token (`"` and `v`).
const PREFIX_LEN: usize = 2;

/// Read `path` and return the version from the first line containing
/// [`VERSION_MARKER`].
///
/// # Errors
///
/// - [`BuildConfigError::Io`] if the header cannot be opened or read.
/// - [`BuildConfigError::VersionMarkerNotFound`] if no line matches.
/// - [`BuildConfigError::MalformedVersion`] if the matching line yields an
///   empty version.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use classy_build::version::extract_version;
///
/// let version = extract_version(Path::new("../include/common.h"))?;
/// println!("building classy {version}");
/// # Ok::<(), classy_build::BuildConfigError>(())
/// ```
pub fn extract_version(path: &Path) -> Result<String> {
    let io_err = |source| BuildConfigError::Io { path: path.to_path_buf(), source };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    for line in reader.lines() {
        let line = line.map_err(io_err)?;
        if line.contains(VERSION_MARKER) {
            let version = version_from_line(&line)?;
            tracing::debug!(header = %path.display(), %version, "extracted CLASS version");
            return Ok(version);
        }
    }

    Err(BuildConfigError::VersionMarkerNotFound {
        path: path.to_path_buf(),
        marker: VERSION_MARKER,
    })
}

/// Same as [`extract_version`] over in-memory header text.
///
/// Returns `None` when no line carries the marker.
pub fn extract_version_from_str(text: &str) -> Option<Result<String>> {
    text.lines().find(|line| line.contains(VERSION_MARKER)).map(version_from_line)
}

/// Strip the `"v` prefix and trailing quote from the last token of `line`.
pub fn version_from_line(line: &str) -> Result<String> {
    let malformed = || BuildConfigError::MalformedVersion { line: line.to_string() };

    let token = line.split_whitespace().next_back().ok_or_else(malformed)?;
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= PREFIX_LEN + 1 {
        return Err(malformed());
    }

    Ok(chars[PREFIX_LEN..chars.len() - 1].iter().collect())
}
