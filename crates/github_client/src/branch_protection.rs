//! Branch protection domain types.
//!
//! This module contains the write payload sent to the branch protection
//! endpoint and the interpreted result of reading it back.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// Key whose presence in a protection payload means pull request review is required.
pub const REQUIRED_REVIEWS_KEY: &str = "required_pull_request_reviews";

/// Branch protection settings sent verbatim as the body of
/// `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// The policy is treated as an opaque JSON object: section names map to
/// whatever settings GitHub accepts for them. Nothing in this crate inspects
/// the settings, so new API fields can be used without code changes.
///
/// # Examples
///
/// ```rust
/// use github_client::BranchProtectionPolicy;
/// use serde_json::json;
///
/// let policy = BranchProtectionPolicy::from_object(json!({
///     "required_pull_request_reviews": { "required_approving_review_count": 2 },
///     "required_status_checks": null,
///     "enforce_admins": true,
///     "restrictions": null
/// }))
/// .unwrap();
///
/// assert!(policy.contains_section("enforce_admins"));
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BranchProtectionPolicy(Map<String, Value>);

impl BranchProtectionPolicy {
    /// Wraps a JSON value as a policy.
    ///
    /// Returns `None` unless the value is a JSON object.
    pub fn from_object(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the policy as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the top-level policy sections, in key order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Default for BranchProtectionPolicy {
    /// Review required, CI required and up to date, pushes limited to the
    /// `contributors` team.
    fn default() -> Self {
        let value = json!({
            "required_pull_request_reviews": {
                "include_admins": false
            },
            "required_status_checks": {
                "include_admins": false,
                "strict": true,
                "contexts": ["continuous-integration/travis-ci"]
            },
            "enforce_admins": false,
            "restrictions": {
                "users": [],
                "teams": ["contributors"]
            }
        });

        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }
}

/// Protection state of a branch as reported by the read endpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum ProtectionStatus {
    /// The branch has protection configured; holds the raw payload.
    Protected(Map<String, Value>),

    /// GitHub has no protection data for the branch.
    NotProtected,
}

impl ProtectionStatus {
    pub fn is_protected(&self) -> bool {
        matches!(self, ProtectionStatus::Protected(_))
    }

    /// Returns whether merging into the branch requires pull request review.
    pub fn requires_review(&self) -> bool {
        match self {
            ProtectionStatus::Protected(payload) => payload.contains_key(REQUIRED_REVIEWS_KEY),
            ProtectionStatus::NotProtected => false,
        }
    }
}
