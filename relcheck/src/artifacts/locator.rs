//! Artifact lookup across completed workflow runs

use std::sync::Arc;

use ci_models::{RunStatus, WorkflowRun};
use tracing::{debug, info};
use url::Url;

use crate::errors::VerifyError;
use crate::http::ci_api::CiApi;
use crate::http::workflows::{RunQuery, MAX_PER_PAGE};

/// Finds the archive URL of a named artifact on the newest completed run of a branch
pub struct ArtifactLocator<C: CiApi + ?Sized> {
    ci: Arc<C>,
    per_page: u32,
}

impl<C: CiApi + ?Sized> ArtifactLocator<C> {
    pub fn new(ci: Arc<C>, per_page: u32) -> Self {
        Self {
            ci,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Walk completed runs of `workflow` on `branch` in the order the CI system
    /// returns them and return the first artifact named exactly `artifact_name`.
    ///
    /// Enumeration stops at the first match, so later runs and pages are never
    /// requested. API failures are returned immediately.
    pub async fn resolve_artifact_url(
        &self,
        repo: &str,
        workflow: &str,
        branch: &str,
        artifact_name: &str,
    ) -> Result<Url, VerifyError> {
        if branch.is_empty() || artifact_name.is_empty() {
            return Err(VerifyError::ConfigError(
                "branch and artifact name must not be empty".to_string(),
            ));
        }

        info!("Looking for artifact '{}' on {}@{} ({})", artifact_name, repo, branch, workflow);

        let query = RunQuery {
            repo: repo.to_string(),
            workflow: workflow.to_string(),
            branch: branch.to_string(),
            status: RunStatus::Completed,
            per_page: self.per_page,
        };

        let mut page = 1;
        let mut seen: u64 = 0;
        loop {
            let list = self.ci.list_runs(&query, page).await?;
            let received = list.workflow_runs.len();
            seen += received as u64;
            debug!("Runs page {}: {} of {} total", page, received, list.total_count);

            for run in list.workflow_runs.iter().filter(|run| is_eligible(run, branch)) {
                let artifacts = self.ci.list_artifacts(run).await?;
                if let Some(artifact) = artifacts.into_iter().find(|a| a.name == artifact_name) {
                    info!(
                        "Found artifact '{}' (id {}) on run {}",
                        artifact.name, artifact.id, run.id
                    );
                    return Ok(Url::parse(&artifact.archive_download_url)?);
                }
                debug!("Run {} has no artifact named '{}'", run.id, artifact_name);
            }

            if received == 0 || received < self.per_page as usize || seen >= list.total_count {
                break;
            }
            page += 1;
        }

        Err(VerifyError::NotFound(format!(
            "no archive url for {} - {}",
            branch, artifact_name
        )))
    }
}

/// Runs the API reports with a different status or branch are skipped
fn is_eligible(run: &WorkflowRun, branch: &str) -> bool {
    let completed = run
        .status
        .as_ref()
        .map_or(true, |status| *status == RunStatus::Completed);
    let on_branch = run
        .head_branch
        .as_deref()
        .map_or(true, |head| head == branch);
    if !(completed && on_branch) {
        debug!("Skipping run {} (status {:?}, branch {:?})", run.id, run.status, run.head_branch);
    }
    completed && on_branch
}
