//! Core domain concepts shared across all subdomains.
//!
//! - [`error::OrchestratorError`] - the error taxonomy surfaced to clients
//! - [`token`] - coarse token estimation and budget arithmetic

pub mod error;
pub mod issue;
pub mod token;
