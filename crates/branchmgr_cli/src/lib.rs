//! branchmgr CLI library.
//!
//! Command implementations, configuration and credential loading used by the
//! `branchmgr` binary.

pub mod commands;
pub mod config;
pub mod credentials;
pub mod errors;
