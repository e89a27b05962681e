//! Branch protection query command.
//!
//! ```bash
//! branchmgr protection my-org my-repo main
//! branchmgr protection my-org/my-repo main
//! ```

use branchmgr_core::RepositoryRef;
use clap::Args;
use github_client::BranchProtectionClient;
use tracing::{debug, instrument};

use crate::errors::Error;

#[cfg(test)]
#[path = "protection_cmd_tests.rs"]
mod tests;

/// Arguments of the `protection` command.
#[derive(Args, Debug, Clone)]
pub struct ProtectionArgs {
    /// Organization owning the repository, or `org/repo`.
    pub org: String,

    /// Repository name. When ORG is given as `org/repo` this is the branch.
    pub repo: String,

    /// Branch to inspect.
    pub branch: Option<String>,
}

impl ProtectionArgs {
    /// Resolves the repository and branch named by the positional arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository reference is malformed.
    pub fn target(&self) -> Result<(RepositoryRef, String), Error> {
        match &self.branch {
            Some(branch) => Ok((RepositoryRef::new(&self.org, &self.repo)?, branch.clone())),
            None => Ok((self.org.parse::<RepositoryRef>()?, self.repo.clone())),
        }
    }
}

/// Queries whether the branch requires review and returns the line to print.
///
/// # Errors
///
/// Returns an error if the arguments are malformed or the GitHub call fails.
/// A branch without protection is not an error.
#[instrument(skip(client))]
pub async fn execute(
    args: &ProtectionArgs,
    client: &dyn BranchProtectionClient,
) -> Result<String, Error> {
    let (repo, branch) = args.target()?;

    debug!(
        message = "Querying branch protection",
        repository = %repo,
        branch = %branch
    );

    let requires_review = client
        .branch_requires_review(repo.organization(), repo.repository(), &branch)
        .await?;

    Ok(describe(&repo, &branch, requires_review))
}

/// Formats the human-readable review requirement of a branch.
pub fn describe(repo: &RepositoryRef, branch: &str, requires_review: bool) -> String {
    if requires_review {
        format!("{} requires review", repo.branch_display(branch))
    } else {
        format!("{} does not require review", repo.branch_display(branch))
    }
}
