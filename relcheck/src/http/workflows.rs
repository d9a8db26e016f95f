//! Workflow run and artifact endpoints

use ci_models::{Artifact, ArtifactList, RunStatus, WorkflowRun, WorkflowRunList};
use url::Url;

use crate::errors::VerifyError;
use crate::http::client::HttpClient;

/// Largest page size the Actions API accepts
pub const MAX_PER_PAGE: u32 = 100;

/// Filter for listing the runs of one workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunQuery {
    /// Repository as `owner/name`
    pub repo: String,
    /// Workflow file name or numeric id
    pub workflow: String,
    pub branch: String,
    pub status: RunStatus,
    pub per_page: u32,
}

impl HttpClient {
    /// List one page (1-based) of runs matching `query`
    pub async fn list_workflow_runs(
        &self,
        query: &RunQuery,
        page: u32,
    ) -> Result<WorkflowRunList, VerifyError> {
        let mut url = self.url(&format!(
            "repos/{}/actions/workflows/{}/runs",
            query.repo, query.workflow
        ))?;
        url.query_pairs_mut()
            .append_pair("branch", &query.branch)
            .append_pair("status", query.status.as_query())
            .append_pair("per_page", &query.per_page.min(MAX_PER_PAGE).to_string())
            .append_pair("page", &page.to_string());
        self.get(url).await
    }

    /// List every artifact attached to `run`
    pub async fn list_run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, VerifyError> {
        let mut artifacts = Vec::new();
        let mut page = 1;
        loop {
            let mut url = Url::parse(&run.artifacts_url)?;
            url.query_pairs_mut()
                .append_pair("per_page", &MAX_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let list: ArtifactList = self.get(url).await?;
            let received = list.artifacts.len();
            artifacts.extend(list.artifacts);

            if received == 0 || artifacts.len() as u64 >= list.total_count {
                return Ok(artifacts);
            }
            page += 1;
        }
    }
}
