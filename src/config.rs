// src/config.rs

use serde::Deserialize;

use crate::error::{Error, Result};

/// How per-commit extraction is scheduled
#[derive(clap::ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One commit after another, in discovery order
    Sequential,
    /// Worker pool, results merged in completion order
    #[default]
    Parallel,
}

/// Which branch refs make up a repository state
#[derive(clap::ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchScope {
    /// Remote-tracking branches (`refs/remotes/*`)
    #[default]
    Remote,
    /// Local branches (`refs/heads/*`)
    Local,
    /// Both remote-tracking and local branches
    All,
}

/// What happens when a single commit fails to extract
#[derive(clap::ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and keep going
    #[default]
    Skip,
    /// Log the failure, finish the remaining work, then fail the run
    Surface,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: StrategyKind,
    /// Pool size for the parallel strategy; `None` uses one worker per CPU
    pub workers: Option<usize>,
    pub branch_scope: BranchScope,
    pub error_policy: ErrorPolicy,
}

impl ExtractionConfig {
    pub fn sequential() -> Self {
        Self {
            strategy: StrategyKind::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel(workers: usize) -> Self {
        Self {
            strategy: StrategyKind::Parallel,
            workers: Some(workers),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.strategy, StrategyKind::Parallel);
        assert_eq!(config.branch_scope, BranchScope::Remote);
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ExtractionConfig::parallel(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn deserializes_from_json() {
        let config: ExtractionConfig = serde_json::from_str(
            r#"{"strategy": "sequential", "branch_scope": "all", "error_policy": "surface"}"#,
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::Sequential);
        assert_eq!(config.branch_scope, BranchScope::All);
        assert_eq!(config.error_policy, ErrorPolicy::Surface);
        assert_eq!(config.workers, None);
    }
}
