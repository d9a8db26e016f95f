//! Integration test against a freshly deployed instance

use std::path::PathBuf;

use tracing::info;

use crate::deploy::instance::DeploymentInstance;
use crate::deploy::runner::{run_steps, ProcessRunner};
use crate::deploy::step::Step;
use crate::errors::VerifyError;
use crate::settings::DeploySettings;
use crate::utils::expand_home;

/// Client wheels shipped inside the release bundle
pub const SDK_WHEEL_PATTERN: &str = "sdk/*.whl";

/// Installs the released client and runs the integration test script
#[derive(Debug, Clone)]
pub struct IntegrationTestRunner {
    python: String,
    venv: String,
    script: PathBuf,
    samples_dir: PathBuf,
    host_suffix: String,
}

impl IntegrationTestRunner {
    pub fn new(settings: &DeploySettings) -> Self {
        Self {
            python: settings.python.clone(),
            venv: settings.test_venv.clone(),
            script: expand_home(&settings.integration_script),
            samples_dir: expand_home(&settings.samples_dir),
            host_suffix: settings.host_suffix.clone(),
        }
    }

    pub fn endpoint(&self, instance: &DeploymentInstance) -> String {
        instance.endpoint(&self.host_suffix)
    }

    pub fn steps(&self, instance: &DeploymentInstance) -> Vec<Step> {
        let pip = format!("{}/bin/pip", self.venv);
        let python = format!("{}/bin/python", self.venv);
        vec![
            Step::new("create test venv", &self.python).args(["-m", "venv", &self.venv]),
            Step::new("install build tooling", &pip).args(["install", "wheel"]),
            Step::new("install client sdk", &pip).arg("install").glob(SDK_WHEEL_PATTERN),
            Step::new("run integration test", &python).args([
                self.script.to_string_lossy().into_owned(),
                "test".to_string(),
                self.samples_dir.to_string_lossy().into_owned(),
                "--region".to_string(),
                instance.region.clone(),
                "--endpoint".to_string(),
                self.endpoint(instance),
            ]),
        ]
    }

    /// Pass or fail is whatever the test script's exit code says
    pub async fn run_tests<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        instance: &DeploymentInstance,
    ) -> Result<(), VerifyError> {
        info!("Testing {}", self.endpoint(instance));
        run_steps(runner, &self.steps(instance)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_receives_endpoint_and_region() {
        let settings = DeploySettings {
            integration_script: PathBuf::from("/opt/tests/integration-test.py"),
            samples_dir: PathBuf::from("/opt/samples"),
            ..Default::default()
        };
        let runner = IntegrationTestRunner::new(&settings);
        let steps = runner.steps(&DeploymentInstance::new("eastus2", "my-instance"));

        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[3].to_string(),
            "test-venv/bin/python /opt/tests/integration-test.py test /opt/samples \
             --region eastus2 --endpoint https://my-instance.azurewebsites.net"
        );
    }
}
