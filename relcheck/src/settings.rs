//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::VerifyError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// relcheck settings, loaded from an optional JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// CI system configuration
    #[serde(default)]
    pub github: GithubSettings,

    /// Deployment and integration test configuration
    #[serde(default)]
    pub deploy: DeploySettings,

    /// Deployed service configuration
    #[serde(default)]
    pub service: ServiceSettings,
}

impl Settings {
    /// Load settings from `path`, or fall back to defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self, VerifyError> {
        match path {
            Some(path) => {
                let file = File::new(path);
                if !file.exists().await {
                    return Err(VerifyError::ConfigError(format!(
                        "Settings file not found: {}",
                        path.display()
                    )));
                }
                debug!("Loading settings from {}", path.display());
                file.read_json().await
            }
            None => Ok(Self::default()),
        }
    }
}

/// GitHub Actions settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    /// REST API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Repository as `owner/name`
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Workflow file name
    #[serde(default = "default_workflow")]
    pub workflow: String,

    /// Artifact holding the release bundle
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,

    /// Environment variable carrying the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Runs requested per page while searching
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_repo() -> String {
    "microsoft/onefuzz".to_string()
}

fn default_workflow() -> String {
    "ci.yml".to_string()
}

fn default_artifact_name() -> String {
    "release-artifacts".to_string()
}

fn default_token_env() -> String {
    "GITHUB_ISSUE_TOKEN".to_string()
}

fn default_per_page() -> u32 {
    30
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            repo: default_repo(),
            workflow: default_workflow(),
            artifact_name: default_artifact_name(),
            token_env: default_token_env(),
            per_page: default_per_page(),
        }
    }
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Interpreter used to create virtual environments
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_deploy_venv")]
    pub deploy_venv: String,

    #[serde(default = "default_test_venv")]
    pub test_venv: String,

    /// Name the downloaded release bundle is saved under
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// Host suffix of deployed instances
    #[serde(default = "default_host_suffix")]
    pub host_suffix: String,

    /// Integration test entrypoint. A leading `~/` expands to `$HOME`.
    #[serde(default = "default_integration_script")]
    pub integration_script: PathBuf,

    /// Directory of prebuilt samples handed to the integration test
    #[serde(default = "default_samples_dir")]
    pub samples_dir: PathBuf,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_deploy_venv() -> String {
    "deploy-venv".to_string()
}

fn default_test_venv() -> String {
    "test-venv".to_string()
}

fn default_archive_name() -> String {
    "onefuzz.zip".to_string()
}

fn default_host_suffix() -> String {
    "azurewebsites.net".to_string()
}

fn default_integration_script() -> PathBuf {
    PathBuf::from("~/projects/onefuzz/onefuzz/src/cli/examples/integration-test.py")
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from("~/projects/onefuzz/built-samples/")
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            python: default_python(),
            deploy_venv: default_deploy_venv(),
            test_venv: default_test_venv(),
            archive_name: default_archive_name(),
            host_suffix: default_host_suffix(),
            integration_script: default_integration_script(),
            samples_dir: default_samples_dir(),
        }
    }
}

/// Deployed service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL of the running service
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Component whose version is watched
    #[serde(default = "default_component")]
    pub component: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Unset means wait forever
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

fn default_component() -> String {
    "onefuzz".to_string()
}

fn default_poll_interval() -> u64 {
    1
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            component: default_component(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: None,
        }
    }
}
