//! Deployment target identity

use serde::{Deserialize, Serialize};

/// Region and name of the environment a release is deployed into.
///
/// The name doubles as the resource group and the service host name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInstance {
    pub region: String,
    pub name: String,
}

impl DeploymentInstance {
    pub fn new(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
        }
    }

    /// Public endpoint of the deployed service
    pub fn endpoint(&self, host_suffix: &str) -> String {
        format!("https://{}.{}", self.name, host_suffix.trim_start_matches('.'))
    }
}
