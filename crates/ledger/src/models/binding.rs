use crate::Binding;
use crate::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use treesync_model::{FolderId, Organisation, Project, ProjectId};

#[derive(sqlx::FromRow, Default)]
pub(crate) struct BindingRow {
    pub(crate) project_id: Option<String>,
    pub(crate) project_name: Option<String>,
    pub(crate) project_description: Option<String>,
    pub(crate) root_folder_id: Option<i64>,
    pub(crate) project_organisation_id: Option<i64>,
    pub(crate) project_organisation_name: Option<String>,
    pub(crate) organisation_id: Option<i64>,
    pub(crate) organisation_name: Option<String>,
}

fn organisation(id: Option<i64>, name: Option<String>) -> Result<Option<Organisation>> {
    match (id, name) {
        (Some(id), Some(name)) => {
            let id = u64::try_from(id).or_raise(|| ErrorKind::InvalidData("organisation id"))?;
            Ok(Some(Organisation { id, name }))
        },
        (None, None) => Ok(None),
        _ => exn::bail!(ErrorKind::InvalidData("organisation")),
    }
}

impl TryFrom<&Binding> for BindingRow {
    type Error = Error;
    fn try_from(binding: &Binding) -> Result<Self> {
        let mut row = Self::default();
        if let Some(project) = &binding.project {
            row.project_id = Some(project.id.as_str().to_string());
            row.project_name = Some(project.name.clone());
            row.project_description = Some(project.description.clone());
            row.root_folder_id =
                Some(i64::try_from(project.root_folder_id.0).or_raise(|| ErrorKind::InvalidData("root folder id"))?);
            row.project_organisation_id = Some(
                i64::try_from(project.organisation.id).or_raise(|| ErrorKind::InvalidData("organisation id"))?,
            );
            row.project_organisation_name = Some(project.organisation.name.clone());
        }
        if let Some(organisation) = &binding.organisation {
            row.organisation_id =
                Some(i64::try_from(organisation.id).or_raise(|| ErrorKind::InvalidData("organisation id"))?);
            row.organisation_name = Some(organisation.name.clone());
        }
        Ok(row)
    }
}

impl TryFrom<BindingRow> for Binding {
    type Error = Error;
    fn try_from(row: BindingRow) -> Result<Self> {
        let project = match row.project_id {
            None => None,
            Some(id) => {
                let root = row.root_folder_id.ok_or_raise(|| ErrorKind::InvalidData("root folder id"))?;
                let root = u64::try_from(root).or_raise(|| ErrorKind::InvalidData("root folder id"))?;
                Some(Project {
                    id: ProjectId::new(id),
                    name: row.project_name.unwrap_or_default(),
                    description: row.project_description.unwrap_or_default(),
                    root_folder_id: FolderId(root),
                    organisation: organisation(row.project_organisation_id, row.project_organisation_name)?
                        .ok_or_raise(|| ErrorKind::InvalidData("project organisation"))?,
                })
            },
        };
        Ok(Self { project, organisation: organisation(row.organisation_id, row.organisation_name)? })
    }
}
