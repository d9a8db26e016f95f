//! HTTP client implementation

use reqwest::{header, redirect, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::errors::VerifyError;

/// User agent sent with every request
pub fn user_agent() -> String {
    format!("relcheck/{}", env!("CARGO_PKG_VERSION"))
}

/// Status, redirect target and body of a response, unprocessed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

/// Authenticated client for the GitHub REST API
pub struct HttpClient {
    client: Client,
    no_redirect_client: Client,
    base_url: Url,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// No request timeout is configured: artifact listings and redirects are
    /// waited on for as long as the server takes.
    pub fn new(base_url: &str, token: SecretString) -> Result<Self, VerifyError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(user_agent())
            .default_headers(default_headers.clone())
            .build()?;

        let no_redirect_client = Client::builder()
            .user_agent(user_agent())
            .default_headers(default_headers)
            .redirect(redirect::Policy::none())
            .build()?;

        // A trailing slash keeps `join` from dropping the last path segment
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;

        Ok(Self {
            client,
            no_redirect_client,
            base_url,
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path against the base URL
    pub fn url(&self, path: &str) -> Result<Url, VerifyError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// Make an authenticated GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, VerifyError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(VerifyError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Make an authenticated GET request without following redirects
    pub async fn get_raw(&self, url: &str) -> Result<RawResponse, VerifyError> {
        debug!("GET {} (raw)", url);

        let response = self
            .no_redirect_client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        Ok(RawResponse {
            status,
            location,
            body,
        })
    }
}
