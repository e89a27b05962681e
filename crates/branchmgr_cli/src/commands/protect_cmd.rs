//! Branch protection command.
//!
//! Applies one protection policy to every listed branch of a repository. The
//! policy comes from `--policy`, then from `policy.path` in the configuration
//! file, then from the built-in default.
//!
//! ```bash
//! branchmgr protect my-org my-repo main develop release/1.0
//! branchmgr protect my-org my-repo main --policy protection.toml --max-concurrency 4
//! ```

use std::path::PathBuf;

use branchmgr_core::{load_policy, BatchOutcome, BatchProtector, RepositoryRef};
use clap::Args;
use colored::Colorize;
use github_client::{BranchProtectionClient, BranchProtectionPolicy};
use tracing::{debug, info, instrument};

use crate::{config::AppConfig, errors::Error};

#[cfg(test)]
#[path = "protect_cmd_tests.rs"]
mod tests;

/// Arguments of the `protect` command.
#[derive(Args, Debug, Clone)]
pub struct ProtectArgs {
    /// Organization owning the repository.
    pub org: String,

    /// Repository name.
    pub repo: String,

    /// Branches to protect.
    #[arg(required = true, num_args = 1..)]
    pub branches: Vec<String>,

    /// Policy document (TOML or JSON) to apply instead of the configured one.
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub policy: Option<PathBuf>,

    /// Maximum number of branches protected at the same time.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,
}

/// Per-branch results of a `protect` run.
#[derive(Debug)]
pub struct ProtectReport {
    pub repository: RepositoryRef,
    pub outcome: BatchOutcome,
}

impl ProtectReport {
    /// One line per requested branch, in the order the branches were given.
    pub fn lines(&self) -> Vec<String> {
        self.outcome
            .outcomes()
            .iter()
            .map(|o| {
                let target = self.repository.branch_display(&o.branch);
                match &o.result {
                    Ok(()) => format!("{} {}", "protected".green(), target),
                    Err(e) => format!("{} {}: {}", "failed".red(), target, e),
                }
            })
            .collect()
    }

    /// Number of protected branches, or the aggregate failure.
    pub fn into_result(self) -> Result<usize, Error> {
        Ok(self.outcome.into_result()?)
    }
}

/// Picks the policy to apply.
///
/// # Errors
///
/// Returns an error if the selected policy document cannot be loaded.
pub fn resolve_policy(args: &ProtectArgs, config: &AppConfig) -> Result<BranchProtectionPolicy, Error> {
    match args.policy.as_ref().or(config.policy.path.as_ref()) {
        Some(path) => Ok(load_policy(path)?),
        None => {
            debug!("Using built-in protection policy");
            Ok(BranchProtectionPolicy::default())
        }
    }
}

/// Protects every branch in `args` and waits for all of them.
///
/// A branch failing does not stop the others. The returned report holds the
/// outcome of every branch; use [`ProtectReport::into_result`] to turn partial
/// failure into an error.
///
/// # Errors
///
/// Returns an error before any call is made if the repository reference,
/// policy or concurrency limit is invalid.
#[instrument(skip(config, client))]
pub async fn execute(
    args: &ProtectArgs,
    config: &AppConfig,
    client: &dyn BranchProtectionClient,
) -> Result<ProtectReport, Error> {
    let repository = RepositoryRef::new(&args.org, &args.repo)?;
    let policy = resolve_policy(args, config)?;

    let max_concurrency = args
        .max_concurrency
        .unwrap_or(config.batch.max_concurrency);
    if max_concurrency == 0 {
        return Err(Error::InvalidArguments(
            "--max-concurrency must be at least 1".to_string(),
        ));
    }

    info!(
        repository = %repository,
        branch_count = args.branches.len(),
        max_concurrency,
        "Protecting branches"
    );

    let outcome = BatchProtector::new(client)
        .with_max_concurrency(max_concurrency)
        .protect(&repository, &args.branches, &policy)
        .await;

    Ok(ProtectReport {
        repository,
        outcome,
    })
}
