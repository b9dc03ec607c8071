// src/filter.rs

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

use crate::error::Result;

/// Gitignore-style matcher for changed file paths, compiled once per run.
#[derive(Debug, Clone)]
pub struct IgnorePredicate {
    matcher: Gitignore,
}

impl IgnorePredicate {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder.add_line(None, pattern.as_ref())?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Patterns from an optional gitignore-formatted file, then `extra`.
    pub fn load<S: AsRef<str>>(file: Option<&Path>, extra: &[S]) -> Result<Self> {
        let contents = match file {
            Some(path) => std::fs::read_to_string(path)?,
            None => String::new(),
        };
        Self::new(contents.lines().chain(extra.iter().map(AsRef::as_ref)))
    }

    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// True if `path` (repository-relative) or any of its parent directories
    /// matches an ignore pattern.
    pub fn should_ignore(&self, path: &str) -> bool {
        if self.matcher.is_empty() {
            return false;
        }
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }
}

impl Default for IgnorePredicate {
    fn default() -> Self {
        Self::empty()
    }
}
