//! Loading of branch protection policy documents.
//!
//! A policy document is the body sent to GitHub when protecting a branch. It can
//! be written as TOML or JSON; both are converted to the same JSON object and
//! passed through unchanged.
//!
//! ```toml
//! enforce_admins = false
//!
//! [required_pull_request_reviews]
//! required_approving_review_count = 1
//!
//! [required_status_checks]
//! strict = true
//! contexts = ["ci/build"]
//!
//! [restrictions]
//! users = []
//! teams = ["maintainers"]
//! ```

use std::{fs, path::Path};

use github_client::BranchProtectionPolicy;
use tracing::{debug, info};

use crate::errors::{BranchMgrResult, Error};

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// Serialization format of a policy document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyFormat {
    Json,
    Toml,
}

impl PolicyFormat {
    /// Picks the format from the file extension. Anything but `.json` is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => PolicyFormat::Json,
            _ => PolicyFormat::Toml,
        }
    }
}

/// Reads a policy document from disk.
///
/// # Errors
///
/// Returns `Error::Policy` if the file cannot be read, cannot be parsed, or
/// does not contain a non-empty table at the top level.
pub fn load_policy(path: &Path) -> BranchMgrResult<BranchProtectionPolicy> {
    debug!("Loading protection policy from {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| {
        Error::Policy(format!(
            "Failed to read policy file {}: {}",
            path.display(),
            e
        ))
    })?;

    let policy = parse_policy(&content, PolicyFormat::from_path(path))?;

    info!(
        path = %path.display(),
        sections = policy.as_map().len(),
        "Loaded protection policy"
    );

    Ok(policy)
}

/// Parses a policy document held in memory.
pub fn parse_policy(content: &str, format: PolicyFormat) -> BranchMgrResult<BranchProtectionPolicy> {
    let value = match format {
        PolicyFormat::Json => serde_json::from_str::<serde_json::Value>(content)
            .map_err(|e| Error::Policy(format!("Failed to parse JSON policy: {}", e)))?,
        PolicyFormat::Toml => {
            let table = toml::from_str::<toml::Table>(content)
                .map_err(|e| Error::Policy(format!("Failed to parse TOML policy: {}", e)))?;
            serde_json::to_value(table)
                .map_err(|e| Error::Policy(format!("Failed to convert TOML policy: {}", e)))?
        }
    };

    let policy = BranchProtectionPolicy::from_object(value)
        .ok_or_else(|| Error::Policy("The policy must be a table of sections".to_string()))?;

    if policy.is_empty() {
        return Err(Error::Policy(
            "The policy does not define any section".to_string(),
        ));
    }

    Ok(policy)
}
