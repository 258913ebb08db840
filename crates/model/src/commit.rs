use crate::error::{Error, ErrorKind};
use crate::file::FileVersion;
use crate::id::CommitId;
use derive_more::Display;
use std::str::FromStr;
use time::UtcDateTime;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    #[display("added")]
    Added,
    #[display("updated")]
    Updated,
    #[display("deleted")]
    Deleted,
}

impl FromStr for ChangeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "added" => Ok(Self::Added),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => exn::bail!(ErrorKind::InvalidInput(format!("unknown change kind `{other}`"))),
        }
    }
}

/// A single file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub file: FileVersion,
    pub kind: ChangeKind,
}

impl Change {
    pub fn new(file: FileVersion, kind: ChangeKind) -> Self {
        Self { file, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

/// A remote snapshot. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: CommitId,
    pub name: String,
    pub message: String,
    pub author: Author,
    pub created_at: UtcDateTime,
    pub changes: Vec<Change>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("added", ChangeKind::Added)]
    #[case("UPDATED", ChangeKind::Updated)]
    #[case("Deleted", ChangeKind::Deleted)]
    fn test_change_kind_parse(#[case] input: &str, #[case] expected: ChangeKind) {
        assert_eq!(input.parse::<ChangeKind>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<ChangeKind>().unwrap(), expected);
    }

    #[test]
    fn test_change_kind_rejects_unknown() {
        assert!("renamed".parse::<ChangeKind>().is_err());
    }
}
