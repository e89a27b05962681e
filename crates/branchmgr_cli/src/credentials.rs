//! GitHub token loading.
//!
//! The access token is read from the process environment only; it is never
//! written to the configuration file. `GHKEY` takes precedence over
//! `GITHUB_TOKEN`.

use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::errors::Error;

/// Environment variables searched for a token, in order of precedence.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GHKEY", "GITHUB_TOKEN"];

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;

/// Reads the GitHub token from the process environment.
///
/// # Errors
///
/// Returns `Error::Auth` if none of [`TOKEN_ENV_VARS`] holds a non-empty value.
#[instrument]
pub fn load_token() -> Result<SecretString, Error> {
    token_from(|name| std::env::var(name).ok())
}

/// Picks the first non-empty token returned by `lookup` for [`TOKEN_ENV_VARS`].
pub fn token_from(lookup: impl Fn(&str) -> Option<String>) -> Result<SecretString, Error> {
    for name in TOKEN_ENV_VARS {
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            debug!(variable = name, "Using GitHub token from environment");
            return Ok(SecretString::from(value.trim().to_string()));
        }
    }

    Err(Error::Auth(format!(
        "No GitHub token found. Set one of: {}",
        TOKEN_ENV_VARS.join(", ")
    )))
}
