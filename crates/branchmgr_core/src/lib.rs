//! # branchmgr core
//!
//! Domain logic for managing GitHub branch protection across many branches.
//!
//! ## Overview
//!
//! - [`RepositoryRef`] identifies the repository being managed
//! - [`load_policy`] reads the protection policy to apply from a TOML or JSON document
//! - [`BatchProtector`] applies one policy to a list of branches concurrently and
//!   reports a [`BatchOutcome`]
//!
//! All GitHub access goes through the [`github_client::BranchProtectionClient`]
//! trait so the batch logic can be exercised against mock clients.

pub mod batch;
pub mod errors;
pub mod policy;
pub mod repository;

pub use batch::{
    protect_branches, BatchOutcome, BatchProtector, BranchOutcome, DEFAULT_MAX_CONCURRENCY,
};
pub use errors::{BranchFailure, BranchMgrResult, Error};
pub use policy::{load_policy, parse_policy, PolicyFormat};
pub use repository::RepositoryRef;
