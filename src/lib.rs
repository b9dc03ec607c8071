// src/lib.rs

//! Incremental extraction of commit, patch and rewrite records from a git
//! repository's history.

pub mod analyzer;
pub mod commit;
pub mod config;
pub mod discover;
pub mod error;
pub mod execution;
pub mod filter;
pub mod language;
pub mod model;
pub mod patch;
pub mod rewrite;
pub mod sink;
pub mod state;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use analyzer::{analyze, ExtractionContext, RunReport};
pub use config::ExtractionConfig;
pub use error::{Error, Result};
pub use model::{CommitRecord, PatchRecord, Record, RepositoryState, RewriteRecord};
