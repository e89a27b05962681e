//! Batch application of one protection policy to many branches.
//!
//! This module provides the [`BatchProtector`] component, which issues one
//! protection write per branch concurrently and aggregates the outcome.

use futures::stream::{self, StreamExt};
use github_client::{BranchProtectionClient, BranchProtectionPolicy};
use tracing::{info, instrument, warn};

use crate::{
    errors::{BranchFailure, BranchMgrResult, Error},
    repository::RepositoryRef,
};

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

/// Number of protection writes allowed in flight at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Applies a protection policy to a list of branches of one repository.
///
/// Every branch gets its own `protect_branch` call on the shared client. A
/// failing branch never cancels the others: the batch always waits for every
/// call and then reports which branches failed. Branches that were protected
/// stay protected.
///
/// # Examples
///
/// ```rust,no_run
/// use branchmgr_core::{BatchProtector, RepositoryRef};
/// use github_client::{BranchProtectionPolicy, GitHubClient};
///
/// # async fn example(client: GitHubClient) -> Result<(), Box<dyn std::error::Error>> {
/// let repo = RepositoryRef::new("my-org", "my-repo")?;
/// let branches = vec!["main".to_string(), "release".to_string()];
///
/// let outcome = BatchProtector::new(&client)
///     .with_max_concurrency(4)
///     .protect(&repo, &branches, &BranchProtectionPolicy::default())
///     .await;
///
/// outcome.into_result()?;
/// # Ok(())
/// # }
/// ```
pub struct BatchProtector<'a> {
    client: &'a dyn BranchProtectionClient,
    max_concurrency: usize,
}

impl<'a> BatchProtector<'a> {
    /// Creates a protector that fans out at most [`DEFAULT_MAX_CONCURRENCY`] calls.
    pub fn new(client: &'a dyn BranchProtectionClient) -> Self {
        Self {
            client,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Limits the number of calls in flight. Values below 1 are treated as 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Protects every branch in `branches` with `policy`.
    ///
    /// Duplicate branch names each get their own call. An empty list returns a
    /// successful outcome without touching the network.
    ///
    /// The returned outcome lists the branches in input order, whatever order
    /// the calls completed in.
    #[instrument(skip(self, branches, policy), fields(repository = %repo, branch_count = branches.len()))]
    pub async fn protect(
        &self,
        repo: &RepositoryRef,
        branches: &[String],
        policy: &BranchProtectionPolicy,
    ) -> BatchOutcome {
        if branches.is_empty() {
            info!("No branches to protect");
            return BatchOutcome::default();
        }

        info!(
            max_concurrency = self.max_concurrency,
            "Protecting branches"
        );

        let client = self.client;
        let mut settled: Vec<(usize, Result<(), github_client::Error>)> =
            stream::iter(branches.iter().enumerate())
                .map(|(index, branch)| async move {
                    let result = client
                        .protect_branch(repo.organization(), repo.repository(), branch, policy)
                        .await;

                    match &result {
                        Ok(()) => info!(branch = %branch, "Branch protected"),
                        Err(e) => warn!(branch = %branch, error = %e, "Failed to protect branch"),
                    }

                    (index, result)
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        settled.sort_by_key(|(index, _)| *index);

        let outcome = BatchOutcome {
            outcomes: settled
                .into_iter()
                .map(|(index, result)| BranchOutcome {
                    branch: branches[index].clone(),
                    result,
                })
                .collect(),
        };

        info!(
            protected = outcome.succeeded().count(),
            failed = outcome.total() - outcome.succeeded().count(),
            "Batch protection complete"
        );

        outcome
    }
}

/// Protects `branches` with `policy`, keeping at most `max_concurrency` writes in flight.
///
/// Shorthand for building a [`BatchProtector`] and calling
/// [`protect`](BatchProtector::protect) on it.
pub async fn protect_branches(
    client: &dyn BranchProtectionClient,
    repo: &RepositoryRef,
    branches: &[String],
    policy: &BranchProtectionPolicy,
    max_concurrency: usize,
) -> BatchOutcome {
    BatchProtector::new(client)
        .with_max_concurrency(max_concurrency)
        .protect(repo, branches, policy)
        .await
}

/// Result of protecting a single branch within a batch.
#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: String,
    pub result: Result<(), github_client::Error>,
}

impl BranchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-branch results of a batch, in the order the branches were given.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    outcomes: Vec<BranchOutcome>,
}

impl BatchOutcome {
    pub fn outcomes(&self) -> &[BranchOutcome] {
        &self.outcomes
    }

    /// Number of calls issued, duplicates included.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if every branch was protected. An empty batch is a success.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(BranchOutcome::is_success)
    }

    /// Names of the branches that were protected.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.branch.as_str())
    }

    /// Branches that failed, with the reason reported for each.
    pub fn failures(&self) -> Vec<BranchFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(()) => None,
                Err(e) => Some(BranchFailure {
                    branch: o.branch.clone(),
                    reason: e.to_string(),
                }),
            })
            .collect()
    }

    /// Converts the outcome into the number of protected branches, or a
    /// `BatchPartialFailure` naming every branch that failed.
    ///
    /// A rejected token is not a per-branch problem: if any branch failed with
    /// `AuthError` the result is `Error::GitHub` carrying that error instead.
    pub fn into_result(self) -> BranchMgrResult<usize> {
        let rejected_token = self.outcomes.iter().find_map(|o| match &o.result {
            Err(github_client::Error::AuthError(message)) => Some(message.clone()),
            _ => None,
        });
        if let Some(message) = rejected_token {
            return Err(Error::GitHub(github_client::Error::AuthError(message)));
        }

        let failures = self.failures();
        if failures.is_empty() {
            Ok(self.total())
        } else {
            Err(Error::BatchPartialFailure {
                total: self.total(),
                failures,
            })
        }
    }
}
