// src/patch.rs

use git2::{
    Commit, Delta, Diff, DiffDelta, DiffFile, DiffFindOptions, DiffOptions, ErrorCode, FileMode, Odb, Oid,
    Patch, Repository,
};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::filter::IgnorePredicate;
use crate::language::LanguageClassifier;
use crate::model::{PatchRecord, Record, RepoId};
use crate::rewrite;
use crate::sink::OutputHandler;
use crate::stats::{indentation, DiffStats, HunkTally};

/// One line of a hunk, reduced to what statistics and blame lookups need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchLine {
    pub origin: char,
    pub old_lineno: Option<u32>,
    pub indent: u64,
}

/// Owned view of a single file's change between two trees
#[derive(Debug, Clone)]
pub struct FilePatch {
    pub status: char,
    pub old_path: String,
    pub new_path: String,
    pub old_size: u64,
    pub new_size: u64,
    pub is_binary: bool,
    pub hunks: Vec<Vec<PatchLine>>,
}

impl FilePatch {
    /// Loads the `idx`-th delta of `diff`, including its hunks.
    pub fn load(diff: &Diff<'_>, idx: usize, odb: &Odb<'_>) -> Result<Option<FilePatch>> {
        let Some(delta) = diff.get_delta(idx) else {
            return Ok(None);
        };
        let patch = Patch::from_diff(diff, idx)?;
        let (is_binary, hunks) = match &patch {
            Some(patch) => (is_binary(&patch.delta()), collect_hunks(patch)?),
            None => (is_binary(&delta), Vec::new()),
        };
        Ok(Some(FilePatch {
            status: status_char(delta.status()),
            old_path: delta_path(&delta, false),
            new_path: delta_path(&delta, true),
            old_size: blob_size(odb, &delta.old_file())?,
            new_size: blob_size(odb, &delta.new_file())?,
            is_binary,
            hunks,
        }))
    }

    pub fn is_addition(&self) -> bool {
        self.status == 'A'
    }

    pub fn tallies(&self) -> Vec<HunkTally> {
        self.hunks
            .iter()
            .map(|lines| {
                let mut tally = HunkTally::default();
                for line in lines {
                    tally.record(line.origin, line.indent);
                }
                tally
            })
            .collect()
    }

    /// Old-side line numbers of every removed line.
    pub fn removed_lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.hunks
            .iter()
            .flatten()
            .filter(|line| line.origin == '-')
            .filter_map(|line| line.old_lineno)
    }
}

fn collect_hunks(patch: &Patch<'_>) -> Result<Vec<Vec<PatchLine>>> {
    let mut hunks = Vec::with_capacity(patch.num_hunks());
    for h in 0..patch.num_hunks() {
        let count = patch.num_lines_in_hunk(h)?;
        let mut lines = Vec::with_capacity(count);
        for l in 0..count {
            let line = patch.line_in_hunk(h, l)?;
            lines.push(PatchLine {
                origin: line.origin(),
                old_lineno: line.old_lineno(),
                indent: indentation(line.content()),
            });
        }
        hunks.push(lines);
    }
    Ok(hunks)
}

fn is_binary(delta: &DiffDelta<'_>) -> bool {
    delta.flags().is_binary() || delta.old_file().is_binary() || delta.new_file().is_binary()
}

/// Path on one side of the delta, falling back to the other side.
fn delta_path(delta: &DiffDelta<'_>, new_side: bool) -> String {
    let (first, second) = if new_side {
        (delta.new_file(), delta.old_file())
    } else {
        (delta.old_file(), delta.new_file())
    };
    first
        .path()
        .or_else(|| second.path())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Zero for absent sides, and for submodule entries whose id names a commit
/// in another repository.
fn blob_size(odb: &Odb<'_>, file: &DiffFile<'_>) -> Result<u64> {
    let id = file.id();
    if id.is_zero() || matches!(file.mode(), FileMode::Commit) {
        return Ok(0);
    }
    match odb.read_header(id) {
        Ok((size, _)) => Ok(size as u64),
        Err(e) if e.code() == ErrorCode::NotFound => {
            debug!(object = %id, "Object missing from odb, size unknown");
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn status_char(status: Delta) -> char {
    match status {
        Delta::Added => 'A',
        Delta::Deleted => 'D',
        Delta::Modified => 'M',
        Delta::Renamed => 'R',
        Delta::Copied => 'C',
        Delta::Typechange => 'T',
        Delta::Ignored => 'I',
        Delta::Untracked => '?',
        Delta::Unmodified => ' ',
        Delta::Unreadable => 'X',
        Delta::Conflicted => 'U',
    }
}

/// Tree diff from `parent` (or the empty tree) to `commit`, with renames.
pub fn diff_against<'repo>(
    repo: &'repo Repository,
    commit: &Commit<'_>,
    parent: Option<&Commit<'_>>,
) -> Result<Diff<'repo>> {
    let tree = commit.tree()?;
    let parent_tree = parent.map(Commit::tree).transpose()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);
    diff_opts.ignore_filemode(true);

    let mut diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;
    Ok(diff)
}

/// Collaborators the patch extractor needs from the run
#[derive(Clone, Copy)]
pub struct PatchContext<'a> {
    pub repo_id: RepoId,
    pub ignore: &'a IgnorePredicate,
    pub classifier: &'a dyn LanguageClassifier,
    pub repo_location: &'a Path,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchSummary {
    pub patches: usize,
    pub rewrites: usize,
    pub ignored: usize,
}

/// Writes one patch record per changed file and parent, each followed by
/// its rewrite records. Root commits are diffed against the empty tree.
pub fn extract(
    repo: &Repository,
    ctx: PatchContext<'_>,
    commit_id: Oid,
    sink: &mut dyn OutputHandler,
) -> Result<PatchSummary> {
    let commit = repo.find_commit(commit_id)?;
    let odb = repo.odb()?;
    let parents: Vec<Commit<'_>> = commit.parents().collect();
    let mut summary = PatchSummary::default();

    let targets: Vec<Option<&Commit<'_>>> = if parents.is_empty() {
        vec![None]
    } else {
        parents.iter().map(Some).collect()
    };

    for parent in targets {
        let diff = diff_against(repo, &commit, parent)?;
        for idx in 0..diff.deltas().len() {
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            if ctx.ignore.should_ignore(&delta_path(&delta, true)) {
                summary.ignored += 1;
                continue;
            }
            let Some(file) = FilePatch::load(&diff, idx, &odb)? else {
                continue;
            };
            let parent_id = parent.map(Commit::id);
            summary.rewrites += emit(repo, ctx, &commit, parent_id, &file, sink)?;
            summary.patches += 1;
        }
    }

    debug!(
        commit = %commit_id,
        patches = summary.patches,
        rewrites = summary.rewrites,
        ignored = summary.ignored,
        "Extracted patches"
    );
    Ok(summary)
}

fn emit(
    repo: &Repository,
    ctx: PatchContext<'_>,
    commit: &Commit<'_>,
    parent: Option<Oid>,
    file: &FilePatch,
    sink: &mut dyn OutputHandler,
) -> Result<usize> {
    let commit_id = commit.id().to_string();
    let classification = ctx.classifier.classify(
        &file.new_path,
        file.new_size,
        file.is_binary,
        &commit_id,
        ctx.repo_location,
    );
    let stats = DiffStats::from_hunks(&file.tallies());
    let detection = rewrite::detect(repo, ctx.repo_id, commit, parent, file)?;
    let (rewrite_count, rewrite_loc) = detection.outcome.summary();

    sink.write(Record::Patch(PatchRecord {
        repo_id: ctx.repo_id,
        commit_id,
        parent_commit_id: parent.map(|p| p.to_string()),
        status: file.status,
        old_path: file.old_path.clone(),
        new_path: file.new_path.clone(),
        old_size: file.old_size,
        new_size: file.new_size,
        is_binary: file.is_binary,
        language: classification.language,
        language_category: classification.category,
        loc_d: stats.loc_d,
        loc_i: stats.loc_i,
        comp_d: stats.comp_d,
        comp_i: stats.comp_i,
        loc_d_std: stats.loc_d_std,
        loc_i_std: stats.loc_i_std,
        comp_d_std: stats.comp_d_std,
        comp_i_std: stats.comp_i_std,
        nhunks: file.hunks.len(),
        rewrite_count,
        rewrite_loc,
    }))?;

    let written = detection.records.len();
    for record in detection.records {
        sink.write(Record::Rewrite(record))?;
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) fn patch_for(
    repo: &Repository,
    commit: Oid,
    parent: Option<Oid>,
    path: &str,
) -> FilePatch {
    let commit = repo.find_commit(commit).unwrap();
    let parent = parent.map(|p| repo.find_commit(p).unwrap());
    let diff = diff_against(repo, &commit, parent.as_ref()).unwrap();
    let odb = repo.odb().unwrap();
    (0..diff.deltas().len())
        .filter_map(|idx| FilePatch::load(&diff, idx, &odb).unwrap())
        .find(|file| file.new_path == path)
        .unwrap()
}
