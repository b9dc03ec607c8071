// src/commit.rs

use git2::{Commit, Oid, Repository, Signature};

use crate::error::Result;
use crate::model::{normalize_time, CommitRecord, RepoId};

/// Name, email and normalized time of a signature. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
pub(crate) fn identity(sig: &Signature<'_>) -> (String, String, i64) {
    (
        String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        normalize_time(&sig.when()),
    )
}

pub fn extract(repo: &Repository, repo_id: RepoId, commit_id: Oid) -> Result<CommitRecord> {
    let commit = repo.find_commit(commit_id)?;
    Ok(record(repo_id, &commit))
}

pub fn record(repo_id: RepoId, commit: &Commit<'_>) -> CommitRecord {
    let (author_name, author_email, author_time) = identity(&commit.author());
    let (committer_name, committer_email, committer_time) = identity(&commit.committer());
    CommitRecord {
        repo_id,
        commit_id: commit.id().to_string(),
        author_name,
        author_email,
        author_time,
        committer_name,
        committer_email,
        committer_time,
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        parent_count: commit.parent_count(),
        tree_id: commit.tree_id().to_string(),
    }
}
