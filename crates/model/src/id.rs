use crate::error::{ErrorKind, Result};
use derive_more::{Display, From};
use regex::Regex;
use std::sync::LazyLock;

// Constant pattern, compiling it cannot fail.
static PROJECT_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"projects/([^/?#]+)").unwrap());

/// Stable remote identifier of a file, shared by every version of it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct FileId(pub u64);

/// Remote identifier of a folder.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct FolderId(pub u64);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct CommitId(pub u64);

/// Opaque project identifier as it appears in the project's web URL.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, From)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the project identifier from a project URL such as
    /// `https://example.com/projects/4f2a9c?#/`.
    ///
    /// Returns [`InvalidInput`](ErrorKind::InvalidInput) when the URL does not
    /// contain a `projects/<id>` segment.
    ///
    /// ```
    /// use treesync_model::ProjectId;
    /// let id = ProjectId::from_url("https://example.com/projects/4f2a9c?#/").unwrap();
    /// assert_eq!(id.as_str(), "4f2a9c");
    /// assert!(ProjectId::from_url("https://example.com/teams/4f2a9c").is_err());
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        match PROJECT_URL.captures(url).and_then(|c| c.get(1)) {
            Some(id) => Ok(Self(id.as_str().to_string())),
            None => exn::bail!(ErrorKind::InvalidInput(format!("not a project URL: {url}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/projects/abc123?#/", "abc123")]
    #[case("https://example.com/projects/abc123#/", "abc123")]
    #[case("https://example.com/projects/abc123/files", "abc123")]
    #[case("projects/a-b_c", "a-b_c")]
    fn test_project_id_from_url(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(ProjectId::from_url(url).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("https://example.com/")]
    #[case("https://example.com/projects/")]
    #[case("https://example.com/projects/?#/")]
    fn test_project_id_rejects_bad_urls(#[case] url: &str) {
        let err = ProjectId::from_url(url).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidInput(_)));
    }
}
