//! Repository domain types
//!
//! Types identifying the repository whose branches are inspected or protected.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Owner and name of a GitHub repository.
///
/// Built once from command line input and never modified afterwards.
///
/// # Examples
///
/// ```rust
/// use branchmgr_core::RepositoryRef;
///
/// let from_parts = RepositoryRef::new("octo-org", "hello-world").unwrap();
/// let parsed: RepositoryRef = "octo-org/hello-world".parse().unwrap();
///
/// assert_eq!(from_parts, parsed);
/// assert_eq!(parsed.branch_display("main"), "octo-org/hello-world@main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    organization: String,
    repository: String,
}

impl RepositoryRef {
    /// Create a repository reference from its two parts
    ///
    /// # Validation Rules
    /// - Neither part may be empty
    /// - Neither part may contain `/` or whitespace
    ///
    /// # Errors
    /// Returns `Error::InvalidRepository` if validation fails
    pub fn new(
        organization: impl Into<String>,
        repository: impl Into<String>,
    ) -> Result<Self, Error> {
        let organization = organization.into();
        let repository = repository.into();
        let input = format!("{}/{}", organization, repository);

        validate_part(&input, "organization", &organization)?;
        validate_part(&input, "repository", &repository)?;

        Ok(Self {
            organization,
            repository,
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Human readable `owner/repository@branch` form used in command output.
    pub fn branch_display(&self, branch: &str) -> String {
        format!("{}@{}", self, branch)
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    /// Parses the `owner/repository` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (organization, repository) = s
            .split_once('/')
            .ok_or_else(|| Error::invalid_repository(s, "expected 'owner/repository'"))?;

        Self::new(organization, repository)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

fn validate_part(input: &str, field: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::invalid_repository(
            input,
            format!("{} must not be empty", field),
        ));
    }

    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(Error::invalid_repository(
            input,
            format!("{} must not contain '/' or whitespace", field),
        ));
    }

    Ok(())
}
