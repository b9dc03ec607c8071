// tests/common/mod.rs

#![allow(dead_code)]

use git2::{Index, IndexEntry, IndexTime, Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

/// Mirrors the crate's internal `TestRepo`: same signature emails, same
/// +60 minute offset, commits detached from refs until `set_branch`.
pub struct Fixture {
    pub dir: TempDir,
    pub repo: Repository,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commits text files on top of the first parent's tree; `None` deletes.
    pub fn commit(
        &self,
        author: &str,
        when: i64,
        parents: &[Oid],
        files: &[(&str, Option<&str>)],
        message: &str,
    ) -> Oid {
        let mut index = Index::new().unwrap();
        if let Some(first) = parents.first() {
            let tree = self.repo.find_commit(*first).unwrap().tree().unwrap();
            index.read_tree(&tree).unwrap();
        }
        for (path, content) in files {
            match content {
                Some(text) => {
                    let id = self.repo.blob(text.as_bytes()).unwrap();
                    index.add(&entry(path, id, 0o100644, text.len())).unwrap();
                }
                None => index.remove_path(Path::new(path)).unwrap(),
            }
        }
        let tree_id = index.write_tree_to(&self.repo).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(when, 60)).unwrap();
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|p| self.repo.find_commit(*p).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        self.repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    pub fn set_branch(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/heads/{name}"), target, true, "fixture")
            .unwrap();
    }
}

fn entry(path: &str, id: Oid, mode: u32, len: usize) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode,
        uid: 0,
        gid: 0,
        file_size: len as u32,
        id,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}
