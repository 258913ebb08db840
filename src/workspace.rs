use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use treesync_config::{Config, LOCAL_FILES};
use treesync_engine::{ProgressPolicy, Synchronizer};
use treesync_ledger::{Database, StateStore};
use treesync_model::ProjectId;
use treesync_remote::{MirrorRemote, RemoteHandle};
use treesync_storage::BackendHandle;
use treesync_storage::backend::{LocalBackend, ReadOnlyBackend};

/// A working directory together with its configuration and state database.
pub struct Workspace {
    root: PathBuf,
    config: Config,
    mirror: Option<PathBuf>,
    db: Database,
}

impl Workspace {
    /// `mirror` overrides the configured `remote.mirror`.
    pub async fn open(dir: &Path, mirror: Option<PathBuf>) -> Result<Self> {
        let root = std::path::absolute(dir).or_raise(|| ErrorKind::WorkingDirectory)?;
        let config = Config::load(&root).or_raise(|| ErrorKind::Config)?;
        let db = Database::connect(root.join(&config.state_file)).await.or_raise(|| ErrorKind::State)?;
        let mirror = mirror.or_else(|| config.remote.mirror.clone()).map(|m| root.join(m));
        tracing::debug!(root = %root.display(), state_file = %config.state_file.display(), "opened workspace");
        Ok(Self { root, config, mirror, db })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn progress_policy(&self) -> ProgressPolicy {
        ProgressPolicy {
            expected_batch_size: self.config.progress.expected_batch_size,
            increment: self.config.progress.increment,
        }
    }

    /// With `dry_run` set, saving state is skipped.
    pub fn store(&self, dry_run: bool) -> StateStore {
        StateStore::new(self.db.pool().clone(), dry_run)
    }

    /// The working directory. Writes and removals are only logged when
    /// `dry_run` is set.
    pub fn local(&self, dry_run: bool) -> Result<BackendHandle> {
        let local: BackendHandle =
            Arc::new(LocalBackend::new("working directory", &self.root).or_raise(|| ErrorKind::WorkingDirectory)?);
        let handle: BackendHandle = if dry_run { Arc::new(ReadOnlyBackend::new(local)) } else { local };
        Ok(handle)
    }

    pub fn remote(&self, project: &ProjectId) -> Result<RemoteHandle> {
        let Some(mirror) = &self.mirror else {
            exn::bail!(ErrorKind::ConfigurationMissing("remote (set remote.mirror or pass --mirror)"));
        };
        let storage = LocalBackend::new("mirror", mirror).or_raise(|| ErrorKind::Remote { retryable: false })?;
        Ok(Arc::new(MirrorRemote::new(Arc::new(storage), project.clone())))
    }

    pub fn synchronizer(&self, project: &ProjectId, dry_run: bool) -> Result<Synchronizer> {
        Ok(Synchronizer::new(self.local(dry_run)?, self.remote(project)?).with_ignored(self.ignored()))
    }

    /// Our own files in the working directory, which never take part in a sync.
    fn ignored(&self) -> Vec<PathBuf> {
        let local = LOCAL_FILES.iter().map(PathBuf::from);
        std::iter::once(self.config.state_file.clone()).chain(local).collect()
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesync_ledger::SyncLedger;

    #[tokio::test]
    async fn test_own_files_are_not_local_changes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("treesync.toml"), "[transfer]\nbatch_size = 2\n").unwrap();
        std::fs::write(dir.path().join("treesync.json"), "{}").unwrap();
        std::fs::create_dir_all(dir.path().join("chassis")).unwrap();
        std::fs::write(dir.path().join("chassis/frame.step"), "frame").unwrap();

        let workspace = Workspace::open(dir.path(), Some(dir.path().join("mirror"))).await.unwrap();
        assert_eq!(workspace.config().transfer.batch_size, 2);
        let sync = workspace.synchronizer(&ProjectId::new("4f2a9c"), false).unwrap();
        // Nothing was ever pulled, so every remaining file counts as changed.
        let changed = sync.local_changes(&SyncLedger::new()).await.unwrap();
        let paths: Vec<_> = changed.iter().map(|state| state.path()).collect();
        assert_eq!(paths, vec![PathBuf::from("chassis/frame.step")]);
        workspace.close().await;
    }
}
