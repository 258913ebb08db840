//! Find working-directory files edited since the last pull.

use std::collections::{BTreeMap, HashSet};
use treesync_model::{Digest, LocalFileState};

/// Locally modified files, grouped by filename.
///
/// Several files may share a name in different directories, so every name
/// maps to all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocallyModified(BTreeMap<String, Vec<LocalFileState>>);

impl LocallyModified {
    pub fn get(&self, filename: &str) -> &[LocalFileState] {
        self.0.get(filename).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of modified files (not names).
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalFileState> {
        self.0.values().flatten()
    }

    fn insert(&mut self, state: LocalFileState) {
        self.0.entry(state.filename.clone()).or_default().push(state);
    }
}

/// A disk file is modified when its content digest is not among the digests
/// recorded for the baseline. Only content is compared, never names or paths.
pub fn locally_modified(disk: &[LocalFileState], baseline: &[LocalFileState]) -> LocallyModified {
    let known: HashSet<&Digest> = baseline.iter().map(|state| &state.digest).filter(|d| !d.is_empty()).collect();
    let mut modified = LocallyModified::default();
    for state in disk.iter().filter(|state| !known.contains(&state.digest)) {
        tracing::debug!(path = %state.path().display(), "Locally modified");
        modified.insert(state.clone());
    }
    modified
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn state(path: &str, content: &[u8]) -> LocalFileState {
        LocalFileState::from_path(Path::new(path), Digest::of(content), content.len() as u64)
    }

    #[test]
    fn test_unmodified_directory() {
        let disk = [state("a.txt", b"a"), state("parts/b.txt", b"b")];
        assert!(locally_modified(&disk, &disk).is_empty());
    }

    #[test]
    fn test_content_not_name_decides() {
        let baseline = [state("a.txt", b"a"), state("b.txt", b"b")];
        // Renamed but unchanged content is not a modification.
        let disk = [state("renamed.txt", b"a"), state("b.txt", b"edited")];
        let modified = locally_modified(&disk, &baseline);
        assert_eq!(modified.len(), 1);
        assert_eq!(modified.get("b.txt")[0].digest, Digest::of(b"edited"));
        assert!(modified.get("renamed.txt").is_empty());
    }

    #[test]
    fn test_same_name_in_two_directories() {
        let disk = [state("left/bolt.step", b"l"), state("right/bolt.step", b"r")];
        let modified = locally_modified(&disk, &[]);
        assert_eq!(modified.get("bolt.step").len(), 2);
        assert_eq!(modified.iter().count(), 2);
    }

    #[test]
    fn test_empty_baseline_digest_matches_nothing() {
        let baseline = [LocalFileState::from_path(Path::new("a.txt"), Digest::empty(), 0)];
        let disk = [state("a.txt", b"")];
        assert_eq!(locally_modified(&disk, &baseline).len(), 1);
    }
}
