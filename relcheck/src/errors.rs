//! Error types for relcheck

use std::time::Duration;

use thiserror::Error;

/// Main error type for relcheck
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The blob endpoint answered with something other than a redirect
    #[error("Unexpected response: {status} - {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Step '{step}' failed with {}", exit_description(.code))]
    ProcessFailure { step: String, code: Option<i32> },

    #[error("Failed to start step '{step}': {source}")]
    ProcessSpawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timed out after {attempts} attempts ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("Poll error: {0}")]
    PollError(String),

    #[error("Interrupted before completion")]
    Interrupted,
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failure_message() {
        let err = VerifyError::ProcessFailure {
            step: "unzip archive".to_string(),
            code: Some(9),
        };
        assert_eq!(err.to_string(), "Step 'unzip archive' failed with exit code 9");

        let err = VerifyError::ProcessFailure {
            step: "deploy".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_unexpected_response_carries_body() {
        let err = VerifyError::UnexpectedResponse {
            status: 404,
            body: "{\"message\":\"Not Found\"}".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not Found"));
    }
}
