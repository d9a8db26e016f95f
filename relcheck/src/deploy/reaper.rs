//! Teardown of the deployed environment

use tracing::info;

use crate::deploy::instance::DeploymentInstance;
use crate::deploy::runner::ProcessRunner;
use crate::deploy::step::Step;
use crate::errors::VerifyError;

/// Deletes the resource group that backs a deployment
#[derive(Debug, Clone, Default)]
pub struct ResourceReaper;

impl ResourceReaper {
    pub fn step(&self, instance: &DeploymentInstance) -> Step {
        Step::new("delete resource group", "az").args([
            "group",
            "delete",
            "-n",
            &instance.name,
            "--yes",
        ])
    }

    /// Blocks until the cloud CLI returns. Not retried.
    pub async fn cleanup<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        instance: &DeploymentInstance,
    ) -> Result<(), VerifyError> {
        info!("Deleting resource group {}", instance.name);
        runner.run(&self.step(instance)).await?;
        info!("Resource group {} deleted", instance.name);
        Ok(())
    }
}
