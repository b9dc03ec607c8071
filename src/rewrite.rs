// src/rewrite.rs

use git2::{BlameOptions, Commit, Oid, Repository};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::commit::identity;
use crate::error::Result;
use crate::model::{RepoId, RewriteRecord};
use crate::patch::FilePatch;

/// Why a patch was not blamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MergeCommit,
    RootCommit,
    Addition,
    NoHunks,
    Binary,
    BlameFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// `origins` distinct earlier commits lost `lines` lines in total
    Detected { origins: usize, lines: u64 },
    Skipped(SkipReason),
}

impl RewriteOutcome {
    /// `(rewrite_count, rewrite_loc)` as stored on the patch record.
    pub fn summary(&self) -> (usize, u64) {
        match *self {
            RewriteOutcome::Detected { origins, lines } => (origins, lines),
            RewriteOutcome::Skipped(_) => (0, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewriteDetection {
    pub outcome: RewriteOutcome,
    /// One record per origin commit, ordered by origin id
    pub records: Vec<RewriteRecord>,
}

impl RewriteDetection {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            outcome: RewriteOutcome::Skipped(reason),
            records: Vec::new(),
        }
    }
}

pub fn skip_reason(commit: &Commit<'_>, parent: Option<Oid>, patch: &FilePatch) -> Option<SkipReason> {
    if commit.parent_count() > 1 {
        Some(SkipReason::MergeCommit)
    } else if parent.is_none() || commit.parent_count() == 0 {
        Some(SkipReason::RootCommit)
    } else if patch.is_addition() {
        Some(SkipReason::Addition)
    } else if patch.is_binary {
        Some(SkipReason::Binary)
    } else if patch.hunks.is_empty() {
        Some(SkipReason::NoHunks)
    } else {
        None
    }
}

/// Attributes the lines `patch` removes to the commits that last touched
/// them, by blaming the old file at `parent`.
pub fn detect(
    repo: &Repository,
    repo_id: RepoId,
    commit: &Commit<'_>,
    parent: Option<Oid>,
    patch: &FilePatch,
) -> Result<RewriteDetection> {
    if let Some(reason) = skip_reason(commit, parent, patch) {
        return Ok(RewriteDetection::skipped(reason));
    }
    let Some(parent) = parent else {
        return Ok(RewriteDetection::skipped(SkipReason::RootCommit));
    };

    let removed: Vec<u32> = patch.removed_lines().collect();
    let (Some(&first), Some(&last)) = (removed.iter().min(), removed.iter().max()) else {
        return Ok(RewriteDetection {
            outcome: RewriteOutcome::Detected { origins: 0, lines: 0 },
            records: Vec::new(),
        });
    };

    let blame = match blame_lines(repo, &patch.old_path, parent, first, last) {
        Ok(blame) => blame,
        Err(e) => {
            warn!(
                commit = %commit.id(),
                parent = %parent,
                path = %patch.old_path,
                error = %e,
                "Blame failed, no rewrites recorded"
            );
            return Ok(RewriteDetection::skipped(SkipReason::BlameFailed));
        }
    };

    let mut counts: HashMap<Oid, u64> = HashMap::new();
    for line in removed {
        if let Some(origin) = blame.get(&line) {
            *counts.entry(*origin).or_default() += 1;
        }
    }
    let mut counts: Vec<(Oid, u64)> = counts.into_iter().collect();
    counts.sort_unstable();

    let (author_name, author_email, author_time) = identity(&commit.author());
    let mut records = Vec::with_capacity(counts.len());
    for (origin, loc_d) in &counts {
        let origin_commit = repo.find_commit(*origin)?;
        let (rewritten_author_name, rewritten_author_email, rewritten_author_time) =
            identity(&origin_commit.author());
        records.push(RewriteRecord {
            repo_id,
            commit_id: commit.id().to_string(),
            author_name: author_name.clone(),
            author_email: author_email.clone(),
            author_time,
            new_path: patch.new_path.clone(),
            rewritten_commit_id: origin.to_string(),
            rewritten_author_name,
            rewritten_author_email,
            rewritten_author_time,
            loc_d: *loc_d,
        });
    }

    Ok(RewriteDetection {
        outcome: RewriteOutcome::Detected {
            origins: counts.len(),
            lines: counts.iter().map(|(_, n)| n).sum(),
        },
        records,
    })
}

/// Old line number to the commit that last changed it, for lines
/// `first..=last` of `path` as of `revision`.
fn blame_lines(
    repo: &Repository,
    path: &str,
    revision: Oid,
    first: u32,
    last: u32,
) -> std::result::Result<HashMap<u32, Oid>, git2::Error> {
    let mut opts = BlameOptions::new();
    opts.newest_commit(revision)
        .min_line(first as usize)
        .max_line(last as usize);
    let blame = repo.blame_file(Path::new(path), Some(&mut opts))?;

    let mut lines = HashMap::new();
    for hunk in blame.iter() {
        let start = hunk.final_start_line();
        for offset in 0..hunk.lines_in_hunk() {
            lines.insert((start + offset) as u32, hunk.final_commit_id());
        }
    }
    Ok(lines)
}
