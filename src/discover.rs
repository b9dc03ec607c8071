// src/discover.rs

use git2::{Oid, Repository, Revwalk, Sort};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::RepositoryState;

/// Lazily yields the commits reachable from `current` but not from
/// `previous`, skipping `already_known` commits and their ancestry.
/// Every such commit is yielded once, however many heads reach it.
pub fn discover<'repo>(
    repo: &'repo Repository,
    previous: &RepositoryState,
    current: &RepositoryState,
    already_known: HashSet<Oid>,
) -> Result<Discovery<'repo>> {
    let tails = parse_ids(previous, "tail")?;
    let heads = parse_ids(current, "head")?;
    Ok(Discovery {
        repo,
        heads: heads.into(),
        tails,
        known: already_known,
        pruned: HashSet::new(),
        walk: None,
        yielded: 0,
    })
}

fn parse_ids(state: &RepositoryState, role: &str) -> Result<Vec<Oid>> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for id in state.commit_ids() {
        let oid = Oid::from_str(id)?;
        if seen.insert(oid) {
            ids.push(oid);
        }
    }
    debug!(role, count = ids.len(), "Walk endpoints");
    Ok(ids)
}

/// One pass over the new commits; not restartable.
pub struct Discovery<'repo> {
    repo: &'repo Repository,
    heads: VecDeque<Oid>,
    tails: Vec<Oid>,
    known: HashSet<Oid>,
    /// Ancestors of known commits within the current head's walk
    pruned: HashSet<Oid>,
    walk: Option<Revwalk<'repo>>,
    yielded: usize,
}

impl<'repo> Discovery<'repo> {
    /// Commits yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn start_walk(&mut self, head: Oid) -> Result<Revwalk<'repo>> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL)?;
        walk.push(head)?;
        for tail in &self.tails {
            if let Err(e) = walk.hide(*tail) {
                warn!(tail = %tail, error = %e, "Previous tip no longer in repository, not hiding it");
            }
        }
        self.pruned.clear();
        Ok(walk)
    }

    /// Marks the parents of `oid` as reachable from a known commit.
    fn prune_parents(&mut self, oid: Oid) -> Result<()> {
        let commit = self.repo.find_commit(oid)?;
        self.pruned.extend(commit.parent_ids());
        Ok(())
    }
}

impl Iterator for Discovery<'_> {
    type Item = Result<Oid>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.walk.is_none() {
                let head = self.heads.pop_front()?;
                match self.start_walk(head) {
                    Ok(walk) => self.walk = Some(walk),
                    Err(e) => return Some(Err(e)),
                }
            }
            let step = self.walk.as_mut().and_then(|walk| walk.next());
            let oid = match step {
                None => {
                    self.walk = None;
                    continue;
                }
                Some(Err(e)) => return Some(Err(e.into())),
                Some(Ok(oid)) => oid,
            };

            // Topological order visits children first, so pruning propagates
            // down the ancestry before those ancestors come up.
            if self.known.contains(&oid) || self.pruned.contains(&oid) {
                if let Err(e) = self.prune_parents(oid) {
                    return Some(Err(e));
                }
                continue;
            }
            self.known.insert(oid);
            self.yielded += 1;
            return Some(Ok(oid));
        }
    }
}
