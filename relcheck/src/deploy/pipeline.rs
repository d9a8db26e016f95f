//! Release deployment steps

use tracing::info;

use crate::deploy::instance::DeploymentInstance;
use crate::deploy::runner::{run_steps, ProcessRunner};
use crate::deploy::step::Step;
use crate::errors::VerifyError;
use crate::settings::DeploySettings;

/// Nested archive carrying the deployment tooling
pub const DEPLOYMENT_ARCHIVE_PATTERN: &str = "onefuzz-deployment*.zip";

/// Marks deployments made by this tool
pub const DEPLOY_TAG: &str = "cicd";

/// Unpacks a release bundle and runs its deployment entrypoint
#[derive(Debug, Clone)]
pub struct DeploymentPipeline {
    python: String,
    venv: String,
}

impl DeploymentPipeline {
    pub fn new(settings: &DeploySettings) -> Self {
        Self {
            python: settings.python.clone(),
            venv: settings.deploy_venv.clone(),
        }
    }

    /// Steps deploying `archive` as `instance`, in execution order
    pub fn steps(&self, archive: &str, instance: &DeploymentInstance) -> Vec<Step> {
        let pip = format!("{}/bin/pip", self.venv);
        let python = format!("{}/bin/python", self.venv);
        vec![
            Step::new("unpack release bundle", "unzip").args(["-o", archive]),
            Step::new("unpack deployment archive", "unzip")
                .arg("-o")
                .glob(DEPLOYMENT_ARCHIVE_PATTERN),
            Step::new("create deployment venv", &self.python).args(["-m", "venv", &self.venv]),
            Step::new("install build tooling", &pip).args(["install", "wheel"]),
            Step::new("install deployment requirements", &pip)
                .args(["install", "-r", "requirements.txt"]),
            Step::new("run deployment", &python).args([
                "deploy.py",
                &instance.region,
                &instance.name,
                &instance.name,
                DEPLOY_TAG,
            ]),
        ]
    }

    /// Deploy `archive`. The first failing step aborts; nothing is rolled back.
    pub async fn deploy<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        archive: &str,
        instance: &DeploymentInstance,
    ) -> Result<(), VerifyError> {
        info!("Deploying {} to {}", archive, instance.name);
        run_steps(runner, &self.steps(archive, instance)).await
    }
}
