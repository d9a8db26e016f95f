//! CI system interface used by the artifact locator and downloader

use async_trait::async_trait;
use ci_models::{Artifact, WorkflowRun, WorkflowRunList};

use crate::errors::VerifyError;
use crate::http::client::{HttpClient, RawResponse};
use crate::http::workflows::RunQuery;

/// Read-only CI operations, as a trait for testability
#[async_trait]
pub trait CiApi: Send + Sync {
    /// One page (1-based) of runs matching `query`, in the CI system's order
    async fn list_runs(&self, query: &RunQuery, page: u32) -> Result<WorkflowRunList, VerifyError>;

    /// Artifacts attached to `run`
    async fn list_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, VerifyError>;

    /// Authenticated GET that returns the response as-is, redirects included
    async fn raw_get(&self, url: &str) -> Result<RawResponse, VerifyError>;
}

#[async_trait]
impl CiApi for HttpClient {
    async fn list_runs(&self, query: &RunQuery, page: u32) -> Result<WorkflowRunList, VerifyError> {
        self.list_workflow_runs(query, page).await
    }

    async fn list_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, VerifyError> {
        self.list_run_artifacts(run).await
    }

    async fn raw_get(&self, url: &str) -> Result<RawResponse, VerifyError> {
        self.get_raw(url).await
    }
}
