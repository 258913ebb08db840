//! Load and save the whole local state in one go.

use crate::error::{ErrorKind, Result};
use crate::models::{BindingRow, ChangeRow, CommitRow};
use crate::{Binding, Database, SyncLedger};
use exn::ResultExt;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::instrument;
use treesync_model::{Change, CommitRecord};

/// Everything a working directory remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub ledger: SyncLedger,
    pub binding: Binding,
}

/// Persists [`State`] in the state database.
///
/// Commits are immutable, so saving only ever inserts the ones the database
/// has not seen yet. The one exception is a change's sync digest, which is
/// filled in once a held-back file is finally written. The binding row is
/// replaced wholesale.
#[derive(Debug, Clone)]
pub struct StateStore {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for StateStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl StateStore {
    /// When `dry_run` is set, [`save`](Self::save) logs and returns without
    /// writing anything.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    // =========================================================================
    // Load
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<State> {
        let binding: Option<BindingRow> = sqlx::query_as(include_str!("../queries/get_binding.sql"))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let binding = binding.map(Binding::try_from).transpose()?.unwrap_or_default();

        let mut commits: Vec<CommitRow> = sqlx::query_as(include_str!("../queries/list_commits.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        commits.sort_by_key(|row| (row.seq, row.commit_id));
        let rows: Vec<ChangeRow> = sqlx::query_as(include_str!("../queries/list_changes.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;

        // Rows arrive ordered by (commit_id, position).
        let mut changes: HashMap<i64, Vec<Change>> = HashMap::new();
        for row in rows {
            let commit_id = row.commit_id;
            changes.entry(commit_id).or_default().push(Change::try_from(row)?);
        }
        let commits = commits
            .into_iter()
            .map(|row| {
                let own = changes.remove(&row.commit_id).unwrap_or_default();
                row.into_model(own)
            })
            .collect::<Result<Vec<CommitRecord>>>()?;
        tracing::debug!(commits = commits.len(), initialized = binding.is_initialized(), "Loaded state");
        Ok(State { ledger: SyncLedger::from(commits), binding })
    }

    // =========================================================================
    // Save
    // =========================================================================

    #[instrument(skip_all, fields(commits = state.ledger.len()))]
    pub async fn save(&self, state: &State) -> Result<()> {
        if self.dry_run {
            tracing::info!("Skipping state save during dry run");
            return Ok(());
        }
        let binding = BindingRow::try_from(&state.binding)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/upsert_binding.sql"))
            .bind(binding.project_id)
            .bind(binding.project_name)
            .bind(binding.project_description)
            .bind(binding.root_folder_id)
            .bind(binding.project_organisation_id)
            .bind(binding.project_organisation_name)
            .bind(binding.organisation_id)
            .bind(binding.organisation_name)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;

        for (seq, commit) in state.ledger.commits().iter().enumerate() {
            let row = CommitRow::try_from((seq, commit))?;
            sqlx::query(include_str!("../queries/insert_commit.sql"))
                .bind(row.commit_id)
                .bind(row.seq)
                .bind(row.name)
                .bind(row.message)
                .bind(row.author_id)
                .bind(row.author_name)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            for (position, change) in commit.changes.iter().enumerate() {
                let row = ChangeRow::try_from((commit.id, position, change))?;
                sqlx::query(include_str!("../queries/insert_change.sql"))
                    .bind(row.commit_id)
                    .bind(row.position)
                    .bind(row.file_id)
                    .bind(row.filename)
                    .bind(row.path)
                    .bind(row.version)
                    .bind(row.updated_at)
                    .bind(row.kind)
                    .bind(row.size)
                    .bind(row.locators)
                    .bind(row.synced_digest)
                    .execute(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, UtcDateTime};
    use treesync_model::{
        Author, ChangeKind, CommitId, Digest, FileId, FileIdentity, FileVersion, FolderId, Organisation, Project,
        ProjectId,
    };

    async fn store() -> (Database, StateStore) {
        let db = Database::connect_in_memory().await.unwrap();
        let store = StateStore::from(&db);
        (db, store)
    }

    fn commit(id: u64, minutes: i64, changes: Vec<Change>) -> CommitRecord {
        CommitRecord {
            id: CommitId(id),
            name: format!("snapshot {id}"),
            message: "msg".to_string(),
            author: Author { id: 3, name: "Grace".to_string() },
            // Sub-second precision must survive the round trip.
            created_at: UtcDateTime::UNIX_EPOCH + Duration::minutes(minutes) + Duration::nanoseconds(123_456_789),
            changes,
        }
    }

    fn change(file: u64, version: u64, kind: ChangeKind) -> Change {
        let identity = FileIdentity::new(file, format!("{file}.step"), "Rover/parts");
        let mut version_of = FileVersion::new(identity, version, UtcDateTime::UNIX_EPOCH).with_locator(version, "loc");
        if kind != ChangeKind::Deleted {
            version_of = version_of.with_synced_digest(Digest::of(format!("{file}@{version}").as_bytes()));
        }
        Change::new(version_of, kind)
    }

    fn project() -> Project {
        Project {
            id: ProjectId::new("4f2a9c"),
            name: "Rover".to_string(),
            description: "Six wheels".to_string(),
            root_folder_id: FolderId(1),
            organisation: Organisation { id: 9, name: "Acme".to_string() },
        }
    }

    #[tokio::test]
    async fn test_empty_state() {
        let (_db, store) = store().await;
        assert_eq!(store.load().await.unwrap(), State::default());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (_db, store) = store().await;
        let mut state = State { binding: Binding::bind(project()), ..Default::default() };
        state.ledger.append([
            commit(20, 2, vec![change(1, 2, ChangeKind::Updated), change(2, 1, ChangeKind::Deleted)]),
            commit(10, 1, vec![change(1, 1, ChangeKind::Added), change(2, 1, ChangeKind::Added)]),
        ]);
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_save_is_append_only() {
        let (_db, store) = store().await;
        let mut state = State::default();
        state.ledger.append([commit(1, 1, vec![change(1, 1, ChangeKind::Added)])]);
        store.save(&state).await.unwrap();
        state.ledger.append([commit(2, 2, Vec::new())]);
        state.binding = Binding::bind(project());
        store.save(&state).await.unwrap();
        // Saving again changes nothing.
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap();
        let ids: Vec<_> = loaded.ledger.commits().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(loaded.ledger.commits()[0].changes.len(), 1);
        assert_eq!(loaded.binding.active_project(None).unwrap().name, "Rover");
    }

    #[tokio::test]
    async fn test_late_sync_digest_is_saved() {
        let (_db, store) = store().await;
        let identity = FileIdentity::new(4, "frame.step", "Rover/chassis");
        let held_back = FileVersion::new(identity, 2, UtcDateTime::UNIX_EPOCH);
        let mut state = State::default();
        state.ledger.append([commit(1, 1, vec![Change::new(held_back, ChangeKind::Updated)])]);
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap().ledger.commits()[0].changes[0].file.synced_digest, None);

        state.ledger.mark_synced(FileId(4), &Digest::of(b"frame v2"));
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let (db, _store) = store().await;
        let store = StateStore::new(db.pool().clone(), true);
        let mut state = State::default();
        state.ledger.append([commit(1, 1, Vec::new())]);
        store.save(&state).await.unwrap();
        assert!(store.load().await.unwrap().ledger.is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".treesync.db");
        let mut state = State { binding: Binding::bind(project()), ..Default::default() };
        state.ledger.append([commit(1, 1, vec![change(7, 1, ChangeKind::Added)])]);
        {
            let db = Database::connect(&path).await.unwrap();
            StateStore::from(&db).save(&state).await.unwrap();
            db.close().await;
        }
        let db = Database::connect(&path).await.unwrap();
        assert_eq!(StateStore::from(&db).load().await.unwrap(), state);
        db.close().await;
    }
}
