//! Client for the deployed service's info endpoint

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::VerifyError;
use crate::http::client::user_agent;

/// Build of one service component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVersion {
    pub git: String,
    pub build: String,
    pub version: String,
}

/// Service information reported by `GET /api/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub versions: BTreeMap<String, BuildVersion>,
}

impl ServiceInfo {
    pub fn version_of(&self, component: &str) -> Result<&BuildVersion, VerifyError> {
        self.versions.get(component).ok_or_else(|| {
            VerifyError::NotFound(format!("service reports no version for '{}'", component))
        })
    }
}

/// Reads service information, as a trait for testability
#[async_trait]
pub trait ServiceApi: Send + Sync {
    async fn info(&self) -> Result<ServiceInfo, VerifyError>;
}

/// HTTP client for a deployed instance
pub struct ServiceClient {
    client: Client,
    info_url: Url,
}

impl ServiceClient {
    pub fn new(endpoint: &str) -> Result<Self, VerifyError> {
        let client = Client::builder().user_agent(user_agent()).build()?;
        let info_url = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))?.join("api/info")?;
        Ok(Self { client, info_url })
    }

    pub fn info_url(&self) -> &Url {
        &self.info_url
    }
}

#[async_trait]
impl ServiceApi for ServiceClient {
    async fn info(&self) -> Result<ServiceInfo, VerifyError> {
        debug!("GET {}", self.info_url);
        let response = self
            .client
            .get(self.info_url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
