//! Locating the directory of the test source that runs an assertion.
//!
//! Reference fixtures live next to the test that uses them, so relative
//! reference paths are resolved against that test's directory rather than
//! the working directory of the test runner. The directory is computed at
//! the call site by [`caller_dir!`](crate::caller_dir) from `file!()` and
//! `CARGO_MANIFEST_DIR`.

use std::path::{Path, PathBuf};

/// Directory of the calling source file, as an absolute [`PathBuf`].
///
/// Expands to the directory containing the file in which the macro is
/// written, so it works from helpers, closures and nested modules alike.
///
/// ```rust
/// let dir = framematch::caller_dir!();
/// assert!(dir.is_absolute());
/// ```
#[macro_export]
macro_rules! caller_dir {
    () => {
        $crate::location::source_dir(env!("CARGO_MANIFEST_DIR"), file!())
    };
}

/// Resolves the directory of `source_file` as reported by `file!()`.
///
/// `file!()` is relative to whatever directory rustc was invoked from: the
/// package root for standalone crates, the workspace root for workspace
/// members. The first ancestor of `manifest_dir` under which the file
/// exists is taken as that base. Falls back to `manifest_dir` when the
/// source tree isn't available (e.g. a relocated test binary).
#[must_use]
pub fn source_dir(manifest_dir: impl AsRef<Path>, source_file: impl AsRef<Path>) -> PathBuf {
    let manifest_dir = manifest_dir.as_ref();
    let source_file = source_file.as_ref();
    let parent = source_file.parent().unwrap_or_else(|| Path::new(""));

    if source_file.is_absolute() {
        return parent.to_path_buf();
    }

    manifest_dir
        .ancestors()
        .find(|base| base.join(source_file).is_file())
        .unwrap_or(manifest_dir)
        .join(parent)
}
