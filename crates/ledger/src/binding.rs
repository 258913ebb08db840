use crate::error::{ErrorKind, Result};
use treesync_model::{Organisation, Project};

/// Which remote project and organisation a working directory belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    pub project: Option<Project>,
    pub organisation: Option<Organisation>,
}

impl Binding {
    /// Bind to a project and the organisation that owns it.
    pub fn bind(project: Project) -> Self {
        Self { organisation: Some(project.organisation.clone()), project: Some(project) }
    }

    pub fn is_initialized(&self) -> bool {
        self.project.is_some() && self.organisation.is_some()
    }

    /// Fails with [`UninitializedRepository`](ErrorKind::UninitializedRepository)
    /// when nothing at all has been bound yet.
    pub fn require_initialized(&self) -> Result<()> {
        match (&self.project, &self.organisation) {
            (None, None) => exn::bail!(ErrorKind::UninitializedRepository),
            _ => Ok(()),
        }
    }

    /// The explicitly requested project, otherwise the bound one.
    pub fn active_project<'a>(&'a self, explicit: Option<&'a Project>) -> Result<&'a Project> {
        match explicit.or(self.project.as_ref()) {
            Some(project) => Ok(project),
            None => exn::bail!(ErrorKind::ConfigurationMissing("project")),
        }
    }

    /// The explicitly requested organisation, otherwise the bound one.
    pub fn active_organisation<'a>(&'a self, explicit: Option<&'a Organisation>) -> Result<&'a Organisation> {
        match explicit.or(self.organisation.as_ref()) {
            Some(organisation) => Ok(organisation),
            None => exn::bail!(ErrorKind::ConfigurationMissing("organisation")),
        }
    }
}
