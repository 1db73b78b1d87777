use anyhow::{Result, bail};

use crate::runtime::CONFIG_FILENAME;

/// Single-project safety rail. Write targets must match the allowed
/// project; reads surface a mismatch as a warning instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectGuard {
    pub enabled: bool,
    pub allowed_project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMismatch {
    pub project_id: String,
    pub allowed_project_id: Option<String>,
}

impl ProjectGuard {
    /// Hard pre-flight check for create. Ids compare as decimal text.
    pub fn ensure_allowed(&self, project_id: u64) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let Some(allowed) = self.allowed_project_id.as_deref() else {
            bail!(
                "the project guard is enabled but no allowed project id is configured.\nSet allowed_project_id under [backlog] in {CONFIG_FILENAME} (or export BACKLOG_PROJECT_ID),\nor disable the guard with project_guard = false."
            );
        };
        if project_id.to_string() != allowed {
            bail!(
                "project {project_id} is not the allowed project (allowed: {allowed}).\nAborting so another project's wiki is not modified."
            );
        }
        Ok(())
    }

    /// Post-fetch check for reads. Never blocks; the caller renders the
    /// returned mismatch as a warning. An enabled guard without a
    /// configured id flags every page.
    pub fn mismatch(&self, project_id: u64) -> Option<ProjectMismatch> {
        if !self.enabled {
            return None;
        }
        match self.allowed_project_id.as_deref() {
            Some(allowed) if project_id.to_string() == allowed => None,
            other => Some(ProjectMismatch {
                project_id: project_id.to_string(),
                allowed_project_id: other.map(ToString::to_string),
            }),
        }
    }
}
