//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when reading or writing
//! branch protection through the github_client crate. A branch without
//! protection is not an error; it is reported as
//! [`ProtectionStatus::NotProtected`](crate::ProtectionStatus::NotProtected).

use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.protect_branch("my-org", "my-repo", "main", &policy).await {
///     Ok(()) => println!("Branch protected"),
///     Err(Error::AuthError(msg)) => eprintln!("Authentication failed: {}", msg),
///     Err(Error::Timeout(after)) => eprintln!("Gave up after {:?}", after),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GitHub answered with a status code the operation does not accept.
    ///
    /// For reads this is any non-4xx failure; for writes it is anything
    /// outside the 2xx range.
    #[error("GitHub API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Authentication or GitHub client initialization failure.
    ///
    /// This error occurs when:
    /// - The token is missing, malformed or revoked (HTTP 401)
    /// - The underlying HTTP client cannot be built
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The GitHub API returned a response in an unexpected format.
    ///
    /// Raised when the protection payload is not a JSON object.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The request did not complete within the configured per-call timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The request never produced an HTTP response.
    ///
    /// Covers connection failures, TLS errors, invalid URIs and any other
    /// failure below the HTTP status layer.
    #[error("Transport failure: {0}")]
    Transport(String),
}
