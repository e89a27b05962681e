//! Crate for interacting with the GitHub branch protection REST API.
//!
//! This crate provides a client for reading and writing the protection settings of
//! repository branches, authenticating with a personal access token.
//!
//! The [`BranchProtectionClient`] trait is the seam used by callers; [`GitHubClient`]
//! is the octocrab-backed implementation. A single client instance is safe to share
//! between concurrent calls: it only holds the transport handle and the per-call
//! timeout, and no operation mutates it.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use http::{header::ACCEPT, StatusCode};
use octocrab::{service::middleware::retry::RetryConfig, Octocrab, Result as OctocrabResult};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

pub mod branch_protection;
pub use branch_protection::{BranchProtectionPolicy, ProtectionStatus, REQUIRED_REVIEWS_KEY};

pub mod errors;
pub use errors::Error;

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Base URI of the public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type sent in the `Accept` header of every request.
pub const DEFAULT_ACCEPT_HEADER: &str = "application/vnd.github+json";

/// Upper bound on a single API call unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations on the branch protection sub-resource of a repository branch.
///
/// Implementations must be safe to call concurrently from many in-flight futures.
#[async_trait]
pub trait BranchProtectionClient: Send + Sync {
    /// Reads the protection settings of a branch.
    ///
    /// # Arguments
    ///
    /// * `owner` - The owner of the repository (user or organization name).
    /// * `repo` - The name of the repository.
    /// * `branch` - The name of the branch.
    ///
    /// # Returns
    ///
    /// `ProtectionStatus::NotProtected` when GitHub has no protection data for the
    /// branch, otherwise the raw protection payload.
    ///
    /// # Errors
    ///
    /// - `Error::AuthError` if the token is rejected
    /// - `Error::ApiError` for server-side failures
    /// - `Error::Timeout` / `Error::Transport` if no response is received
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<ProtectionStatus, Error>;

    /// Returns whether merging into the branch requires pull request review.
    ///
    /// An unprotected branch never requires review.
    async fn branch_requires_review(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<bool, Error> {
        let status = self.get_branch_protection(owner, repo, branch).await?;
        Ok(status.requires_review())
    }

    /// Replaces the protection settings of a branch with `policy`.
    ///
    /// Returns only once GitHub has confirmed the write.
    ///
    /// # Errors
    ///
    /// Any non-2xx response, timeout or transport failure.
    async fn protect_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        policy: &BranchProtectionPolicy,
    ) -> Result<(), Error>;
}

/// Settings used to build the HTTP transport of a [`GitHubClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URI of the REST API. Override for GitHub Enterprise Server.
    pub api_url: String,

    /// Value of the `Accept` header sent with each request.
    pub accept: String,

    /// Maximum duration of a single API call.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            accept: DEFAULT_ACCEPT_HEADER.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A client for the GitHub branch protection API.
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
    request_timeout: Duration,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` from an already configured octocrab instance.
    ///
    /// Calls are bounded by [`DEFAULT_REQUEST_TIMEOUT`]; use
    /// [`with_request_timeout`](Self::with_request_timeout) to change it.
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the per-call timeout.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn within_timeout<T>(
        &self,
        call: impl Future<Output = OctocrabResult<T>>,
    ) -> Result<OctocrabResult<T>, Error> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| {
                error!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "GitHub API call did not complete in time"
                );
                Error::Timeout(self.request_timeout)
            })
    }
}

#[async_trait]
impl BranchProtectionClient for GitHubClient {
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<ProtectionStatus, Error> {
        let path = protection_path(owner, repo, branch)?;

        debug!("Making API call to: {}", path);
        // The status decides the outcome before the body is looked at, so 4xx
        // responses without a GitHub error document still mean "not protected".
        let exchange = async {
            let response = self.client._get(path.as_str()).await?;
            let status = response.status();
            let body = self.client.body_to_string(response).await?;
            Ok::<_, octocrab::Error>((status, body))
        };
        let (status, body) = self
            .within_timeout(exchange)
            .await?
            .map_err(|e| map_octocrab_error("Failed to read branch protection", e))?;

        // A rejected token is a 4xx too, but it says nothing about the branch.
        if status == StatusCode::UNAUTHORIZED {
            return Err(status_error("Failed to read branch protection", status, &body));
        }
        if status.is_client_error() {
            debug!(status = status.as_u16(), "No protection data for branch");
            return Ok(ProtectionStatus::NotProtected);
        }
        if !status.is_success() {
            return Err(status_error("Failed to read branch protection", status, &body));
        }

        match serde_json::from_str::<Value>(&body)? {
            Value::Object(payload) => {
                debug!(
                    sections = payload.len(),
                    "Branch protection payload received"
                );
                Ok(ProtectionStatus::Protected(payload))
            }
            other => {
                error!(
                    response = %other,
                    "Branch protection response was not a JSON object"
                );
                Err(Error::InvalidResponse)
            }
        }
    }

    #[instrument(skip(self, policy), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn protect_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        policy: &BranchProtectionPolicy,
    ) -> Result<(), Error> {
        let path = protection_path(owner, repo, branch)?;

        debug!(
            sections = policy.as_map().len(),
            "Making API call to: {}", path
        );
        let exchange = async {
            let response = self.client._put(path.as_str(), Some(policy)).await?;
            let status = response.status();
            let body = self.client.body_to_string(response).await?;
            Ok::<_, octocrab::Error>((status, body))
        };
        let (status, body) = self
            .within_timeout(exchange)
            .await?
            .map_err(|e| map_octocrab_error("Failed to apply branch protection", e))?;

        if !status.is_success() {
            return Err(status_error("Failed to apply branch protection", status, &body));
        }

        info!("Branch protection applied");
        Ok(())
    }
}

/// Creates a `GitHubClient` that authenticates with a personal access token.
///
/// Automatic retries are disabled: every call is attempted exactly once and
/// bounded by `settings.request_timeout`.
///
/// # Errors
///
/// Returns `Error::AuthError` if the token is empty or the HTTP client cannot be
/// built from `settings`.
///
/// # Example
///
/// ```rust,no_run
/// use github_client::{create_token_client, BranchProtectionClient, ClientSettings, Error};
/// use secrecy::SecretString;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let token = SecretString::from(std::env::var("GHKEY").unwrap_or_default());
///     let client = create_token_client(&token, &ClientSettings::default())?;
///
///     let protected = client.branch_requires_review("my-org", "my-repo", "main").await?;
///     println!("requires review: {}", protected);
///     Ok(())
/// }
/// ```
#[instrument(skip(token))]
pub fn create_token_client(
    token: &SecretString,
    settings: &ClientSettings,
) -> Result<GitHubClient, Error> {
    if token.expose_secret().trim().is_empty() {
        return Err(Error::AuthError("The access token is empty".to_string()));
    }

    let octocrab = Octocrab::builder()
        .base_uri(settings.api_url.as_str())
        .map_err(|e| {
            error!(
                api_url = %settings.api_url,
                error = %e,
                "Invalid GitHub API base URI"
            );
            Error::AuthError(format!("Invalid GitHub API URL '{}'", settings.api_url))
        })?
        .personal_token(token.expose_secret().to_string())
        .add_header(ACCEPT, settings.accept.clone())
        .add_retry_config(RetryConfig::None)
        .build()
        .map_err(|e| {
            error!(error = ?e, "Failed to build Octocrab client with access token");
            Error::AuthError("Failed to create a GitHub client for the access token.".to_string())
        })?;

    info!(api_url = %settings.api_url, "Created GitHub token client");

    Ok(GitHubClient::new(octocrab).with_request_timeout(settings.request_timeout))
}

/// Builds the protection sub-resource path, percent-encoding every segment.
///
/// Branch names may contain `/`, `#`, `%` and other characters that would
/// otherwise change which resource the request reaches.
fn protection_path(owner: &str, repo: &str, branch: &str) -> Result<String, Error> {
    let mut url = Url::parse(DEFAULT_API_URL).map_err(|e| Error::Transport(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::Transport("Cannot build a request path".to_string()))?
        .clear()
        .extend(["repos", owner, repo, "branches", branch, "protection"]);

    Ok(url.path().to_string())
}

/// Maps a non-2xx response to an error, preferring GitHub's own message.
fn status_error(message: &str, status: StatusCode, body: &str) -> Error {
    let detail = github_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    });

    error!(
        status = status.as_u16(),
        error_message = %detail,
        "{}. Received an error from GitHub",
        message
    );

    if status == StatusCode::UNAUTHORIZED {
        Error::AuthError(detail)
    } else {
        Error::ApiError {
            status: status.as_u16(),
            message: detail,
        }
    }
}

fn github_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Maps a failure that produced no usable HTTP response.
///
/// octocrab's error text carries a captured backtrace after the first line;
/// only the first line is kept in the returned error.
fn map_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    error!(error = %e, "{}. The request did not complete", message);
    Error::Transport(short_message(&e))
}

fn short_message(e: &octocrab::Error) -> String {
    e.to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
