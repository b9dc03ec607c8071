// src/model.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies the repository the records belong to
pub type RepoId = u64;

/// Branch and tag tips of a repository at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub branches: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

impl RepositoryState {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.tags.is_empty()
    }

    /// Branch targets followed by tag targets. May contain duplicates.
    pub fn commit_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.branches
            .values()
            .chain(self.tags.values())
            .map(String::as_str)
    }
}

/// One extracted commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub repo_id: RepoId,
    pub commit_id: String,
    pub author_name: String,
    pub author_email: String,
    /// UTC seconds, see [`normalize_time`]
    pub author_time: i64,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_time: i64,
    pub message: String,
    pub parent_count: usize,
    pub tree_id: String,
}

/// One changed file of a commit, diffed against one parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub repo_id: RepoId,
    pub commit_id: String,
    /// `None` for the root commit, which is diffed against the empty tree
    pub parent_commit_id: Option<String>,
    pub status: char,
    pub old_path: String,
    pub new_path: String,
    pub old_size: u64,
    pub new_size: u64,
    pub is_binary: bool,
    pub language: String,
    pub language_category: String,
    pub loc_d: u64,
    pub loc_i: u64,
    pub comp_d: u64,
    pub comp_i: u64,
    pub loc_d_std: f64,
    pub loc_i_std: f64,
    pub comp_d_std: f64,
    pub comp_i_std: f64,
    pub nhunks: usize,
    /// Number of distinct commits whose lines this patch removed
    pub rewrite_count: usize,
    /// Total number of removed lines attributed to earlier commits
    pub rewrite_loc: u64,
}

/// Lines from an earlier commit that a patch removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRecord {
    pub repo_id: RepoId,
    pub commit_id: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: i64,
    pub new_path: String,
    pub rewritten_commit_id: String,
    pub rewritten_author_name: String,
    pub rewritten_author_email: String,
    pub rewritten_author_time: i64,
    pub loc_d: u64,
}

/// Kind-tagged record pushed to an output handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Commit(CommitRecord),
    Patch(PatchRecord),
    Rewrite(RewriteRecord),
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Commit(_) => "commit",
            Record::Patch(_) => "patch",
            Record::Rewrite(_) => "rewrite",
        }
    }

    pub fn commit_id(&self) -> &str {
        match self {
            Record::Commit(r) => &r.commit_id,
            Record::Patch(r) => &r.commit_id,
            Record::Rewrite(r) => &r.commit_id,
        }
    }
}

/// Absolute UTC seconds for a signature's local time and offset in minutes
pub fn normalize_time(time: &git2::Time) -> i64 {
    time.seconds() + i64::from(time.offset_minutes()) * 60
}
