// src/cli.rs

use clap::Parser;
use git_lineage::config::{BranchScope, ErrorPolicy, ExtractionConfig, StrategyKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to extract
    #[arg(short, long)]
    pub repo: PathBuf,

    /// Identifier stamped on every record
    #[arg(long, default_value_t = 0)]
    pub repo_id: u64,

    /// File to write JSON-lines records to (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Repository state saved by the previous run
    #[arg(long)]
    pub state_in: Option<PathBuf>,

    /// Where to save this run's repository state
    #[arg(long)]
    pub state_out: Option<PathBuf>,

    /// File listing already extracted commit ids, one per line
    #[arg(long)]
    pub known: Option<PathBuf>,

    /// Gitignore-style pattern for paths to skip (repeatable)
    #[arg(long = "ignore")]
    pub ignore_patterns: Vec<String>,

    /// Gitignore-formatted file with paths to skip
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Scheduling of per-commit extraction
    #[arg(long, value_enum, default_value_t = StrategyKind::Parallel)]
    pub strategy: StrategyKind,

    /// Worker pool size for the parallel strategy (defaults to CPU count)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Which branches make up the repository state
    #[arg(long, value_enum, default_value_t = BranchScope::Remote)]
    pub branches: BranchScope,

    /// Fail the run if any commit fails to extract
    #[arg(long)]
    pub fail_fast: bool,
}

impl Args {
    pub fn config(&self) -> ExtractionConfig {
        ExtractionConfig {
            strategy: self.strategy,
            workers: self.workers,
            branch_scope: self.branches,
            error_policy: if self.fail_fast {
                ErrorPolicy::Surface
            } else {
                ErrorPolicy::Skip
            },
        }
    }
}
