//! Error types for branch management operations.

use std::fmt;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Result type used throughout branchmgr_core.
pub type BranchMgrResult<T> = Result<T, Error>;

/// Errors raised by the branch management domain layer.
#[derive(Error, Debug)]
pub enum Error {
    /// A repository reference could not be parsed or failed validation.
    #[error("Invalid repository reference '{input}': {reason}")]
    InvalidRepository { input: String, reason: String },

    /// A protection policy document could not be loaded.
    #[error("Invalid protection policy: {0}")]
    Policy(String),

    /// One or more branches of a batch were not protected.
    ///
    /// Branches that succeeded stay protected; nothing is rolled back.
    #[error(
        "{} of {} branches could not be protected: {}",
        .failures.len(),
        .total,
        summarize(.failures)
    )]
    BatchPartialFailure {
        total: usize,
        failures: Vec<BranchFailure>,
    },

    /// A GitHub failure that ends the whole operation, such as a rejected token.
    #[error("{0}")]
    GitHub(#[from] github_client::Error),
}

impl Error {
    pub(crate) fn invalid_repository(input: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRepository {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A branch that failed within a batch, with the reason reported for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchFailure {
    pub branch: String,
    pub reason: String,
}

impl fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.branch, self.reason)
    }
}

fn summarize(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
