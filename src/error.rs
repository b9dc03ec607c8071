// src/error.rs

/// Errors raised while extracting history from a repository.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ignore pattern error: {0}")]
    Ignore(#[from] ignore::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be set up.
    #[error("Worker setup failed: {0}")]
    WorkerSetup(String),

    /// One or more commits failed to extract under the `surface` policy.
    #[error("{failed} commit(s) failed to extract, first failure: {first}")]
    Incomplete { failed: usize, first: Box<Error> },
}

pub type Result<T> = std::result::Result<T, Error>;
