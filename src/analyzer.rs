// src/analyzer.rs

use git2::{Oid, Repository};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::commit;
use crate::config::{ErrorPolicy, ExtractionConfig};
use crate::discover::discover;
use crate::error::{Error, Result};
use crate::execution::ExecutionStrategy;
use crate::filter::IgnorePredicate;
use crate::language::{ExtensionClassifier, LanguageClassifier};
use crate::model::{Record, RepoId, RepositoryState};
use crate::patch::{self, PatchContext};
use crate::sink::{MemorySink, OutputHandler};
use crate::state;

/// Read-only values shared by every commit's extraction in a run
#[derive(Clone)]
pub struct ExtractionContext {
    pub repo_id: RepoId,
    pub ignore: IgnorePredicate,
    pub classifier: Arc<dyn LanguageClassifier>,
    /// Free-form label that shows up in the run's log lines
    pub description: String,
}

impl ExtractionContext {
    pub fn new(repo_id: RepoId) -> Self {
        Self {
            repo_id,
            ignore: IgnorePredicate::empty(),
            classifier: Arc::new(ExtensionClassifier),
            description: format!("repository {repo_id}"),
        }
    }

    pub fn with_ignore(mut self, ignore: IgnorePredicate) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Outcome of one incremental run
#[derive(Debug)]
pub struct RunReport {
    /// Tips captured at the start of the run; persist this and pass it back
    /// as `previous` next time
    pub state: RepositoryState,
    pub discovered: usize,
    pub extracted: usize,
    pub records: usize,
    /// Earliest and latest author time of the extracted commits
    pub time_span: Option<(i64, i64)>,
    /// Commits that failed under [`ErrorPolicy::Skip`]
    pub failed: Vec<(Oid, Error)>,
}

/// Commit record first, then each patch record followed by its rewrites.
pub fn extract_commit(
    repo: &Repository,
    ctx: &ExtractionContext,
    repo_location: &Path,
    commit_id: Oid,
    acc: &mut MemorySink,
) -> Result<()> {
    acc.write(Record::Commit(commit::extract(repo, ctx.repo_id, commit_id)?))?;
    let patch_ctx = PatchContext {
        repo_id: ctx.repo_id,
        ignore: &ctx.ignore,
        classifier: ctx.classifier.as_ref(),
        repo_location,
    };
    patch::extract(repo, patch_ctx, commit_id, acc)?;
    Ok(())
}

/// Extracts every commit that is new since `previous` and not in
/// `already_known`. Anything failing before dispatch aborts the run; after
/// that, failures are per commit and handled by `config.error_policy`.
pub fn analyze(
    repo_path: &Path,
    ctx: &ExtractionContext,
    previous: Option<&RepositoryState>,
    already_known: HashSet<Oid>,
    config: &ExtractionConfig,
    sink: &mut dyn OutputHandler,
    progress: &ProgressBar,
) -> Result<RunReport> {
    config.validate()?;
    let start_time = Instant::now();

    let repo = Repository::open(repo_path)?;
    info!(run = %ctx.description, path = %repo_path.display(), "Analyzing repository");

    let current = state::capture(&repo, config.branch_scope)?;
    let previous = previous.cloned().unwrap_or_default();
    info!(
        run = %ctx.description,
        branches = current.branches.len(),
        tags = current.tags.len(),
        known = already_known.len(),
        "Captured repository state"
    );

    let commits: Vec<Oid> =
        discover(&repo, &previous, &current, already_known)?.collect::<Result<_>>()?;
    drop(repo);
    info!(run = %ctx.description, count = commits.len(), "Discovered new commits");

    let strategy = ExecutionStrategy::from_config(config);
    let execution = strategy.run(
        repo_path,
        &commits,
        |repo, oid, acc| extract_commit(repo, ctx, repo_path, oid, acc),
        sink,
        progress,
    )?;
    progress.finish_and_clear();

    info!(
        run = %ctx.description,
        extracted = execution.completed,
        records = execution.records,
        failed = execution.failed.len(),
        elapsed = ?start_time.elapsed(),
        "Extraction complete"
    );

    let failed = match config.error_policy {
        ErrorPolicy::Skip => execution.failed,
        ErrorPolicy::Surface => {
            let count = execution.failed.len();
            if let Some((_, first)) = execution.failed.into_iter().next() {
                return Err(Error::Incomplete {
                    failed: count,
                    first: Box::new(first),
                });
            }
            Vec::new()
        }
    };

    Ok(RunReport {
        state: current,
        discovered: commits.len(),
        extracted: execution.completed,
        records: execution.records,
        time_span: execution.time_span,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BranchScope;
    use crate::testutil::{lines, TestRepo};

    fn local(strategy: ExtractionConfig) -> ExtractionConfig {
        ExtractionConfig {
            branch_scope: BranchScope::Local,
            ..strategy
        }
    }

    #[test]
    fn second_run_from_returned_state_finds_only_new_work() {
        let t = TestRepo::new();
        let v1 = lines(&["one"]);
        let v2 = lines(&["one", "two"]);
        let a = t.commit("Ann", 1000, &[], &[("f.txt", Some(v1.as_slice()))], "A");
        t.set_branch("main", a);

        let ctx = ExtractionContext::new(5).with_description("test run");
        let config = local(ExtractionConfig::sequential());
        let progress = ProgressBar::hidden();

        let mut sink = MemorySink::new();
        let first = analyze(t.path(), &ctx, None, HashSet::new(), &config, &mut sink, &progress).unwrap();
        assert_eq!(first.discovered, 1);
        assert_eq!(first.state.branches["main"], a.to_string());

        let b = t.commit("Bob", 2000, &[a], &[("f.txt", Some(v2.as_slice()))], "B");
        t.set_branch("main", b);

        let mut sink = MemorySink::new();
        let second =
            analyze(t.path(), &ctx, Some(&first.state), HashSet::new(), &config, &mut sink, &progress)
                .unwrap();
        assert_eq!(second.discovered, 1);
        assert_eq!(second.extracted, 1);
        assert_eq!(second.time_span, Some((2000 + 3600, 2000 + 3600)));
        assert!(sink.records().iter().all(|r| r.commit_id() == b.to_string()));

        let mut sink = MemorySink::new();
        let third =
            analyze(t.path(), &ctx, Some(&second.state), HashSet::new(), &config, &mut sink, &progress)
                .unwrap();
        assert_eq!(third.discovered, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn already_known_commits_are_not_extracted() {
        let t = TestRepo::new();
        let v1 = lines(&["one"]);
        let v2 = lines(&["two"]);
        let a = t.commit("Ann", 1000, &[], &[("f.txt", Some(v1.as_slice()))], "A");
        let b = t.commit("Ann", 2000, &[a], &[("f.txt", Some(v2.as_slice()))], "B");
        t.set_branch("main", b);

        let ctx = ExtractionContext::new(5);
        let config = local(ExtractionConfig::parallel(2));
        let mut sink = MemorySink::new();
        let known: HashSet<Oid> = [a].into_iter().collect();
        let report = analyze(t.path(), &ctx, None, known, &config, &mut sink, &ProgressBar::hidden())
            .unwrap();
        assert_eq!(report.discovered, 1);
        assert!(sink.records().iter().all(|r| r.commit_id() == b.to_string()));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let t = TestRepo::new();
        let ctx = ExtractionContext::new(1);
        let config = ExtractionConfig::parallel(0);
        let mut sink = MemorySink::new();
        let result = analyze(t.path(), &ctx, None, HashSet::new(), &config, &mut sink, &ProgressBar::hidden());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn corrupt_previous_state_is_fatal() {
        let t = TestRepo::new();
        let v1 = lines(&["one"]);
        let a = t.commit("Ann", 1000, &[], &[("f.txt", Some(v1.as_slice()))], "A");
        t.set_branch("main", a);

        let mut previous = RepositoryState::default();
        previous.branches.insert("main".into(), "not-a-commit-id".into());
        let ctx = ExtractionContext::new(1);
        let config = local(ExtractionConfig::sequential());
        let mut sink = MemorySink::new();
        let result = analyze(
            t.path(),
            &ctx,
            Some(&previous),
            HashSet::new(),
            &config,
            &mut sink,
            &ProgressBar::hidden(),
        );
        assert!(result.is_err());
        assert!(sink.is_empty());
    }
}
