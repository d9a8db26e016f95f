//! Per-invocation options, built from settings and command line flags

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::instance::DeploymentInstance;
use crate::settings::{GithubSettings, ServiceSettings, Settings};
use crate::wait::WaitPolicy;

pub const DEFAULT_REGION: &str = "eastus2";

/// Where to look for the release artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    /// Repository as `owner/name`
    pub repo: String,
    pub workflow: String,
    pub branch: String,
    pub artifact_name: String,
}

impl ArtifactSource {
    pub fn new(github: &GithubSettings, branch: impl Into<String>) -> Self {
        Self {
            repo: github.repo.clone(),
            workflow: github.workflow.clone(),
            branch: branch.into(),
            artifact_name: github.artifact_name.clone(),
        }
    }
}

/// Options of a deploy, test and cleanup run
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub source: ArtifactSource,

    /// Target environment
    pub instance: DeploymentInstance,

    /// File name the bundle is saved under inside the working directory
    pub archive_name: String,

    /// Leave the environment in place for inspection
    pub skip_cleanup: bool,
}

impl DeployOptions {
    pub fn new(
        settings: &Settings,
        branch: &str,
        instance: &str,
        region: &str,
        skip_cleanup: bool,
    ) -> Self {
        Self {
            source: ArtifactSource::new(&settings.github, branch),
            instance: DeploymentInstance::new(region, instance),
            archive_name: settings.deploy.archive_name.clone(),
            skip_cleanup,
        }
    }
}

/// Options of a plain artifact download
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub source: ArtifactSource,
    pub destination: PathBuf,
}

/// Options of a version rollout wait
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub endpoint: String,
    pub component: String,
    pub policy: WaitPolicy,
}

impl WaitOptions {
    /// Command line values win over the settings file
    pub fn new(
        service: &ServiceSettings,
        endpoint: Option<String>,
        component: Option<String>,
        interval_secs: Option<u64>,
        timeout_secs: Option<u64>,
    ) -> Option<Self> {
        let endpoint = endpoint.or_else(|| service.endpoint.clone())?;
        let interval = Duration::from_secs(interval_secs.unwrap_or(service.poll_interval_secs));

        let mut policy = WaitPolicy::default().with_interval(interval);
        if let Some(timeout) = timeout_secs.or(service.poll_timeout_secs) {
            policy = policy.with_timeout(Duration::from_secs(timeout));
        }

        Some(Self {
            endpoint,
            component: component.unwrap_or_else(|| service.component.clone()),
            policy,
        })
    }
}
