//! CI credential lookup

use secrecy::SecretString;

use crate::errors::VerifyError;

/// Read the CI bearer token from `var`. Unset or blank is an error.
pub fn token_from_env(var: &str) -> Result<SecretString, VerifyError> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(SecretString::from(token.trim().to_string())),
        _ => Err(VerifyError::MissingCredential(var.to_string())),
    }
}
