use crate::divergence::LocallyModified;
use treesync_model::FileVersion;
use treesync_storage::validate_path;

/// Which remote files to download and which to hold back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub download: Vec<FileVersion>,
    /// Remote updates that would overwrite a local edit.
    pub held_back: Vec<FileVersion>,
}

/// Split the remote files into downloads and held-back conflicts.
///
/// A remote file conflicts with a local edit when both the filename and the
/// full target path match, comparing the target path the way the working
/// directory will resolve it on write. With `force` set, nothing is held back.
pub fn resolve(remote: Vec<FileVersion>, modified: &LocallyModified, force: bool) -> Resolution {
    if force {
        return Resolution { download: remote, held_back: Vec::new() };
    }
    let (held_back, download) = remote.into_iter().partition(|file| is_conflict(file, modified));
    Resolution { download, held_back }
}

fn is_conflict(file: &FileVersion, modified: &LocallyModified) -> bool {
    let raw = file.target_path();
    // A target that cannot be resolved is never written, so it clobbers nothing.
    let Ok(target) = validate_path(&raw) else {
        return false;
    };
    let conflict = modified.get(file.filename()).iter().any(|state| state.path() == target);
    if conflict {
        tracing::info!(path = %target.display(), "Holding back remote update over local edit");
    }
    conflict
}
