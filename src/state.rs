// src/state.rs

use git2::{Reference, Repository};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::BranchScope;
use crate::error::Result;
use crate::model::RepositoryState;

/// Resolves branch and tag refs to commit ids. Refs that do not peel to a
/// commit are logged and left out.
pub fn capture(repo: &Repository, scope: BranchScope) -> Result<RepositoryState> {
    let mut branches = BTreeMap::new();
    if matches!(scope, BranchScope::Remote | BranchScope::All) {
        collect(repo, "refs/remotes/*", "refs/remotes/", &mut branches)?;
    }
    if matches!(scope, BranchScope::Local | BranchScope::All) {
        collect(repo, "refs/heads/*", "refs/heads/", &mut branches)?;
    }

    let mut tags = BTreeMap::new();
    collect(repo, "refs/tags/*", "refs/tags/", &mut tags)?;

    debug!(branches = branches.len(), tags = tags.len(), "Captured repository state");
    Ok(RepositoryState { branches, tags })
}

fn collect(
    repo: &Repository,
    glob: &str,
    prefix: &str,
    into: &mut BTreeMap<String, String>,
) -> Result<()> {
    for reference in repo.references_glob(glob)? {
        let reference = match reference {
            Ok(r) => r,
            Err(e) => {
                warn!(glob, error = %e, "Skipping unreadable ref");
                continue;
            }
        };
        let Some(full_name) = reference.name().map(str::to_string) else {
            warn!(glob, "Skipping ref with non-UTF-8 name");
            continue;
        };
        if is_head_pointer(&reference, &full_name) {
            continue;
        }
        match reference.peel_to_commit() {
            Ok(commit) => {
                let name = full_name.strip_prefix(prefix).unwrap_or(&full_name);
                into.insert(name.to_string(), commit.id().to_string());
            }
            Err(e) => warn!(reference = %full_name, error = %e, "Could not resolve ref to a commit"),
        }
    }
    Ok(())
}

fn is_head_pointer(reference: &Reference<'_>, name: &str) -> bool {
    reference.symbolic_target_bytes().is_some() || name.ends_with("/HEAD")
}
