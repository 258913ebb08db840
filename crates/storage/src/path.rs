//! Relative path checks.
//!
//! Every path handed to a backend goes through [`validate`] first, so that a
//! target path built from remote metadata can never escape the working
//! directory.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Resolves `path` to a normalized path relative to the backend root.
///
/// `.` segments, repeated separators and trailing separators are dropped and
/// `..` is folded into its parent. The path is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) when it climbs above
/// the root, resolves to nothing, carries a drive prefix or contains a null
/// byte. Leading `/` is treated as the root itself.
///
/// ```
/// use std::path::Path;
/// use treesync_storage::validate_path;
///
/// assert_eq!(validate_path("chassis/./frame.step").unwrap(), Path::new("chassis/frame.step"));
/// assert!(validate_path("chassis/../../etc/passwd").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    match normalize(path) {
        Some(normalized) => Ok(normalized),
        None => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}

fn normalize(path: &Path) -> Option<PathBuf> {
    let mut segments: Vec<&OsStr> = Vec::new();
    for component in path.components() {
        match component {
            // Null bytes survive `components()` on Unix but truncate in syscalls.
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => return None,
            Component::Normal(segment) => segments.push(segment),
            Component::ParentDir => {
                segments.pop()?;
            },
            Component::Prefix(_) => return None,
            Component::CurDir | Component::RootDir => {},
        }
    }
    (!segments.is_empty()).then(|| segments.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("chassis/bracket.step", "chassis/bracket.step")]
    #[case("README", "README")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("chassis///", "chassis")]
    #[case("drive/gear.step/", "drive/gear.step")]
    #[case("a/b/..", "a")]
    #[case("/chassis/frame.step", "chassis/frame.step")]
    #[case("old/../still-old/.././chassis//./frame.step/", "chassis/frame.step")]
    fn test_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case::parent("../etc/passwd")]
    #[case::escapes_after_descending("a/../../b")]
    #[case::only_parents("../..")]
    #[case::empty("")]
    #[case::only_current(".")]
    #[case::current_with_slashes("./.")]
    #[case::only_slashes("//")]
    #[case::null_byte("a\0b")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(path) if path == Path::new(input)));
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_separators() {
        assert_eq!(validate("a\\b/c\\d").unwrap(), Path::new("a/b/c/d"));
    }
}
