// src/testutil.rs

use git2::{Index, IndexEntry, IndexTime, Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

/// Throwaway repository whose commits are built from in-memory indexes.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commits `files` on top of the first parent's tree. `None` deletes a
    /// path. The commit is not attached to any ref.
    pub fn commit(
        &self,
        author: &str,
        when: i64,
        parents: &[Oid],
        files: &[(&str, Option<&[u8]>)],
        message: &str,
    ) -> Oid {
        let mut index = self.index_from(parents);
        for (path, content) in files {
            match content {
                Some(bytes) => {
                    let id = self.repo.blob(bytes).unwrap();
                    index.add(&entry(path, id, 0o100644, bytes.len())).unwrap();
                }
                None => index.remove_path(Path::new(path)).unwrap(),
            }
        }
        self.write(index, author, when, parents, message)
    }

    /// Commits a gitlink at `path` pointing to `target`, a commit that only
    /// exists in the submodule's own repository.
    pub fn commit_submodule(&self, author: &str, when: i64, parents: &[Oid], path: &str, target: Oid) -> Oid {
        let mut index = self.index_from(parents);
        index.add(&entry(path, target, 0o160000, 0)).unwrap();
        self.write(index, author, when, parents, "bump submodule")
    }

    fn index_from(&self, parents: &[Oid]) -> Index {
        let mut index = Index::new().unwrap();
        if let Some(first) = parents.first() {
            let tree = self.repo.find_commit(*first).unwrap().tree().unwrap();
            index.read_tree(&tree).unwrap();
        }
        index
    }

    fn write(&self, mut index: Index, author: &str, when: i64, parents: &[Oid], message: &str) -> Oid {
        let tree_id = index.write_tree_to(&self.repo).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::new(
            author,
            &format!("{}@example.com", author.to_lowercase()),
            &Time::new(when, 60),
        )
        .unwrap();
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
            .reference(&format!("refs/heads/{name}"), target, true, "test")
            .unwrap();
    }

    pub fn set_remote_branch(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/remotes/{name}"), target, true, "test")
            .unwrap();
    }

    pub fn set_tag(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/tags/{name}"), target, true, "test")
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

/// Joins lines with a trailing newline each.
pub fn lines(lines: &[&str]) -> Vec<u8> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}
