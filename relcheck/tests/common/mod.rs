//! Shared fakes for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use ci_models::{Artifact, RunStatus, WorkflowRun, WorkflowRunList};
use tokio::net::TcpListener;

use relcheck::deploy::runner::ProcessRunner;
use relcheck::deploy::step::Step;
use relcheck::errors::VerifyError;
use relcheck::http::ci_api::CiApi;
use relcheck::http::client::RawResponse;
use relcheck::http::workflows::RunQuery;

pub fn run(id: u64, branch: &str) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some("ci".to_string()),
        head_branch: Some(branch.to_string()),
        head_sha: None,
        run_number: Some(id),
        status: Some(RunStatus::Completed),
        conclusion: Some("success".to_string()),
        artifacts_url: format!("https://api.github.com/repos/o/r/actions/runs/{}/artifacts", id),
        created_at: None,
    }
}

pub fn artifact(run_id: u64, name: &str) -> Artifact {
    Artifact {
        id: run_id * 100,
        name: name.to_string(),
        size_in_bytes: Some(1024),
        archive_download_url: format!("https://api.github.com/artifacts/{}/{}/zip", run_id, name),
        expired: false,
        created_at: None,
    }
}

/// In-memory CI system that records every call made to it
#[derive(Default)]
pub struct FakeCi {
    pages: Vec<Vec<WorkflowRun>>,
    total_count: u64,
    artifacts: HashMap<u64, Vec<Artifact>>,
    redirect: Option<RawResponse>,
    pub queries: Mutex<Vec<(RunQuery, u32)>>,
    pub artifact_requests: Mutex<Vec<u64>>,
    pub raw_requests: Mutex<Vec<String>>,
}

impl FakeCi {
    /// Runs served as pages, in order
    pub fn with_pages(pages: Vec<Vec<WorkflowRun>>) -> Self {
        let total_count = pages.iter().map(|page| page.len() as u64).sum();
        Self {
            pages,
            total_count,
            ..Default::default()
        }
    }

    pub fn with_artifacts(mut self, run_id: u64, names: &[&str]) -> Self {
        self.artifacts
            .insert(run_id, names.iter().map(|name| artifact(run_id, name)).collect());
        self
    }

    pub fn with_raw_response(mut self, response: RawResponse) -> Self {
        self.redirect = Some(response);
        self
    }

    pub fn artifact_requests(&self) -> Vec<u64> {
        self.artifact_requests.lock().unwrap().clone()
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.queries.lock().unwrap().iter().map(|(_, page)| *page).collect()
    }
}

#[async_trait]
impl CiApi for FakeCi {
    async fn list_runs(&self, query: &RunQuery, page: u32) -> Result<WorkflowRunList, VerifyError> {
        self.queries.lock().unwrap().push((query.clone(), page));
        let workflow_runs = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(WorkflowRunList {
            total_count: self.total_count,
            workflow_runs,
        })
    }

    async fn list_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, VerifyError> {
        self.artifact_requests.lock().unwrap().push(run.id);
        Ok(self.artifacts.get(&run.id).cloned().unwrap_or_default())
    }

    async fn raw_get(&self, url: &str) -> Result<RawResponse, VerifyError> {
        self.raw_requests.lock().unwrap().push(url.to_string());
        self.redirect
            .clone()
            .ok_or_else(|| VerifyError::ConfigError("no raw response scripted".to_string()))
    }
}

/// Records steps instead of running them. Selected invocations (0-based)
/// fail or never finish.
#[derive(Default)]
pub struct RecordingRunner {
    fail_at: Vec<usize>,
    hang_at: Option<usize>,
    pub steps: Mutex<Vec<Step>>,
}

impl RecordingRunner {
    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            fail_at: indices.to_vec(),
            ..Default::default()
        }
    }

    pub fn hanging_at(index: usize) -> Self {
        Self {
            hang_at: Some(index),
            ..Default::default()
        }
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.steps.lock().unwrap().iter().map(ToString::to_string).collect()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, step: &Step) -> Result<(), VerifyError> {
        let index = {
            let mut steps = self.steps.lock().unwrap();
            steps.push(step.clone());
            steps.len() - 1
        };
        if self.hang_at == Some(index) {
            std::future::pending::<()>().await;
        }
        if self.fail_at.contains(&index) {
            return Err(VerifyError::ProcessFailure {
                step: step.label.clone(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
