//! Fold a commit sequence into the latest state of every file it touches.

use std::collections::HashMap;
use treesync_model::{ChangeKind, CommitRecord, FileId, FileVersion};

/// Net effect of a sequence of commits, one entry per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Files whose latest change added or updated them.
    pub to_fetch: Vec<FileVersion>,
    /// Files whose latest change deleted them.
    pub to_delete: Vec<FileVersion>,
}

/// Keep, per file, the change with the highest version number and partition
/// the survivors by kind. Output follows the order in which each file was
/// first seen.
///
/// Only version numbers decide which change survives. A deletion whose
/// version is lower than that of an earlier add or update of the same file
/// loses to it, so the file ends up in `to_fetch` even though deletion is
/// terminal. Remote histories are not expected to produce that ordering.
pub fn aggregate(commits: &[CommitRecord]) -> Aggregate {
    let mut order: Vec<FileId> = Vec::new();
    let mut latest: HashMap<FileId, (&FileVersion, ChangeKind)> = HashMap::new();
    for change in commits.iter().flat_map(|commit| &commit.changes) {
        let id = change.file.id();
        match latest.get(&id) {
            Some((kept, _)) if change.file.version <= kept.version => continue,
            Some(_) => {},
            None => order.push(id),
        }
        latest.insert(id, (&change.file, change.kind));
    }

    let mut aggregate = Aggregate::default();
    for id in order {
        let Some((file, kind)) = latest.remove(&id) else { continue };
        match kind {
            ChangeKind::Deleted => aggregate.to_delete.push(file.clone()),
            ChangeKind::Added | ChangeKind::Updated => aggregate.to_fetch.push(file.clone()),
        }
    }
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;
    use treesync_model::{Author, Change, CommitId, FileIdentity};

    fn change(file: u64, version: u64, kind: ChangeKind) -> Change {
        let identity = FileIdentity::new(file, format!("f{file}.txt"), "Project/dir");
        Change::new(FileVersion::new(identity, version, UtcDateTime::UNIX_EPOCH), kind)
    }

    fn commit(id: u64, changes: Vec<Change>) -> CommitRecord {
        CommitRecord {
            id: CommitId(id),
            name: String::new(),
            message: String::new(),
            author: Author { id: 1, name: "Ada".to_string() },
            created_at: UtcDateTime::UNIX_EPOCH,
            changes,
        }
    }

    fn summary(files: &[FileVersion]) -> Vec<(u64, u64)> {
        files.iter().map(|f| (f.id().0, f.version)).collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(aggregate(&[]), Aggregate::default());
    }

    #[test]
    fn test_highest_version_wins() {
        let commits = [
            commit(1, vec![change(1, 1, ChangeKind::Added), change(2, 1, ChangeKind::Added)]),
            commit(2, vec![change(1, 2, ChangeKind::Updated), change(3, 1, ChangeKind::Added)]),
            commit(3, vec![change(2, 2, ChangeKind::Deleted)]),
        ];
        let result = aggregate(&commits);
        assert_eq!(summary(&result.to_fetch), vec![(1, 2), (3, 1)]);
        assert_eq!(summary(&result.to_delete), vec![(2, 2)]);
    }

    #[test]
    fn test_order_of_commits_does_not_matter_for_the_winner() {
        let commits = [
            commit(2, vec![change(1, 3, ChangeKind::Updated)]),
            commit(1, vec![change(1, 1, ChangeKind::Added)]),
        ];
        assert_eq!(summary(&aggregate(&commits).to_fetch), vec![(1, 3)]);
    }

    #[test]
    fn test_equal_version_keeps_first_seen() {
        let commits = [
            commit(1, vec![change(1, 2, ChangeKind::Updated)]),
            commit(2, vec![change(1, 2, ChangeKind::Deleted)]),
        ];
        let result = aggregate(&commits);
        assert_eq!(summary(&result.to_fetch), vec![(1, 2)]);
        assert!(result.to_delete.is_empty());
    }

    #[test]
    fn test_lower_versioned_delete_is_discarded() {
        // Deletion is logically terminal, but only version numbers are compared.
        let commits = [
            commit(1, vec![change(1, 5, ChangeKind::Updated)]),
            commit(2, vec![change(1, 4, ChangeKind::Deleted)]),
        ];
        let result = aggregate(&commits);
        assert_eq!(summary(&result.to_fetch), vec![(1, 5)]);
        assert!(result.to_delete.is_empty());
    }

    #[test]
    fn test_fetch_and_delete_are_disjoint() {
        let commits = [
            commit(1, vec![change(1, 1, ChangeKind::Added), change(2, 1, ChangeKind::Added)]),
            commit(2, vec![change(1, 2, ChangeKind::Deleted), change(2, 2, ChangeKind::Updated)]),
        ];
        let result = aggregate(&commits);
        let fetched: Vec<_> = result.to_fetch.iter().map(FileVersion::id).collect();
        assert!(result.to_delete.iter().all(|f| !fetched.contains(&f.id())));
        assert_eq!(result.to_fetch.len() + result.to_delete.len(), 2);
    }
}
