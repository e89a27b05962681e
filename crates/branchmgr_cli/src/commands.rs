//! Command modules for the branchmgr CLI.
//!
//! - `protection_cmd`: report whether a branch requires pull request review
//! - `protect_cmd`: apply a protection policy to one or more branches

pub mod protect_cmd;
pub mod protection_cmd;
