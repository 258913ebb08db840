use crate::error::{Error, ErrorKind, Result};
use crate::models::{from_nanos, to_nanos};
use exn::ResultExt;
use std::collections::BTreeMap;
use treesync_model::{Author, Change, ChangeKind, CommitId, CommitRecord, Digest, FileIdentity, FileVersion};

fn to_i64(value: u64, what: &'static str) -> Result<i64> {
    i64::try_from(value).or_raise(|| ErrorKind::InvalidData(what))
}

fn to_u64(value: i64, what: &'static str) -> Result<u64> {
    u64::try_from(value).or_raise(|| ErrorKind::InvalidData(what))
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommitRow {
    pub(crate) commit_id: i64,
    pub(crate) seq: i64,
    pub(crate) name: String,
    pub(crate) message: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
    pub(crate) created_at: i64,
}
impl TryFrom<(usize, &CommitRecord)> for CommitRow {
    type Error = Error;
    fn try_from((seq, commit): (usize, &CommitRecord)) -> Result<Self> {
        Ok(Self {
            commit_id: to_i64(commit.id.0, "commit id")?,
            seq: i64::try_from(seq).or_raise(|| ErrorKind::InvalidData("ledger position"))?,
            name: commit.name.clone(),
            message: commit.message.clone(),
            author_id: to_i64(commit.author.id, "author id")?,
            author_name: commit.author.name.clone(),
            created_at: to_nanos(commit.created_at)?,
        })
    }
}
impl CommitRow {
    /// Reassemble the commit from its row and its (already ordered) changes.
    pub(crate) fn into_model(self, changes: Vec<Change>) -> Result<CommitRecord> {
        Ok(CommitRecord {
            id: CommitId(to_u64(self.commit_id, "commit id")?),
            name: self.name,
            message: self.message,
            author: Author { id: to_u64(self.author_id, "author id")?, name: self.author_name },
            created_at: from_nanos(self.created_at)?,
            changes,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ChangeRow {
    pub(crate) commit_id: i64,
    pub(crate) position: i64,
    pub(crate) file_id: i64,
    pub(crate) filename: String,
    pub(crate) path: String,
    pub(crate) version: i64,
    pub(crate) updated_at: i64,
    pub(crate) kind: String,
    #[sqlx(default)]
    pub(crate) size: Option<i64>,
    pub(crate) locators: String,
    #[sqlx(default)]
    pub(crate) synced_digest: Option<String>,
}
impl TryFrom<(CommitId, usize, &Change)> for ChangeRow {
    type Error = Error;
    fn try_from((commit, position, change): (CommitId, usize, &Change)) -> Result<Self> {
        let file = &change.file;
        Ok(Self {
            commit_id: to_i64(commit.0, "commit id")?,
            position: i64::try_from(position).or_raise(|| ErrorKind::InvalidData("change position"))?,
            file_id: to_i64(file.id().0, "file id")?,
            filename: file.identity.filename.clone(),
            path: file.identity.path.clone(),
            version: to_i64(file.version, "file version")?,
            updated_at: to_nanos(file.updated_at)?,
            kind: change.kind.to_string(),
            size: file.size.map(|s| to_i64(s, "file size")).transpose()?,
            locators: serde_json::to_string(&file.locators).or_raise(|| ErrorKind::InvalidData("locators"))?,
            synced_digest: file.synced_digest.as_ref().map(|d| d.as_str().to_string()),
        })
    }
}
impl TryFrom<ChangeRow> for Change {
    type Error = Error;
    fn try_from(row: ChangeRow) -> Result<Self> {
        let identity = FileIdentity::new(to_u64(row.file_id, "file id")?, row.filename, row.path);
        let mut file = FileVersion::new(identity, to_u64(row.version, "file version")?, from_nanos(row.updated_at)?);
        file.locators = serde_json::from_str::<BTreeMap<u64, String>>(&row.locators)
            .or_raise(|| ErrorKind::InvalidData("locators"))?;
        file.size = row.size.map(|s| to_u64(s, "file size")).transpose()?;
        file.synced_digest = row.synced_digest.map(Digest::from);
        let kind = row.kind.parse::<ChangeKind>().or_raise(|| ErrorKind::InvalidData("change kind"))?;
        Ok(Change::new(file, kind))
    }
}
