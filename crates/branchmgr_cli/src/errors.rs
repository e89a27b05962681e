use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the branchmgr CLI application.
///
/// This enum represents all possible error conditions that can arise during
/// CLI operations, including missing credentials, configuration issues and
/// failures reported by the lower layers.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable GitHub credentials were found.
    ///
    /// This error is returned at startup when none of the supported
    /// environment variables holds a token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration error occurred while loading or validating configuration.
    ///
    /// This error is returned when there are issues with the configuration file,
    /// such as invalid values, bad syntax or file access problems.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    ///
    /// This error is returned when the user provides arguments that parse but
    /// cannot be used, such as a malformed repository reference.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A GitHub API call failed.
    #[error("GitHub error: {0}")]
    GitHub(#[from] github_client::Error),

    /// A branch management operation failed.
    #[error("{0}")]
    Core(#[from] branchmgr_core::Error),
}

impl Error {
    /// Process exit code reported for this error.
    ///
    /// A batch in which only some branches failed exits with 1; every other
    /// failure, including a token rejected during a batch, is fatal and exits
    /// with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Core(branchmgr_core::Error::BatchPartialFailure { .. }) => 1,
            _ => 2,
        }
    }
}
