// src/language.rs

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub language: String,
    pub category: String,
}

impl Classification {
    pub fn new(language: &str, category: &str) -> Self {
        Self {
            language: language.to_string(),
            category: category.to_string(),
        }
    }
}

/// Maps a changed file to a language name and a coarse category.
pub trait LanguageClassifier: Send + Sync {
    fn classify(
        &self,
        path: &str,
        size: u64,
        is_binary: bool,
        commit_id: &str,
        repo_location: &Path,
    ) -> Classification;
}

/// Classifies by file name and extension only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

const PROGRAMMING: &str = "programming";
const MARKUP: &str = "markup";
const DATA: &str = "data";
const PROSE: &str = "prose";
const OTHER: &str = "other";

fn by_file_name(name: &str) -> Option<(&'static str, &'static str)> {
    let found = match name {
        "Makefile" | "GNUmakefile" => ("Makefile", PROGRAMMING),
        "Dockerfile" => ("Dockerfile", PROGRAMMING),
        "CMakeLists.txt" => ("CMake", PROGRAMMING),
        "Cargo.lock" | "Gemfile.lock" | "poetry.lock" => ("TOML", DATA),
        "LICENSE" | "COPYING" => ("Text", PROSE),
        _ => return None,
    };
    Some(found)
}

fn by_extension(ext: &str) -> Option<(&'static str, &'static str)> {
    let found = match ext {
        "rs" => ("Rust", PROGRAMMING),
        "py" | "pyi" => ("Python", PROGRAMMING),
        "go" => ("Go", PROGRAMMING),
        "js" | "mjs" | "cjs" | "jsx" => ("JavaScript", PROGRAMMING),
        "ts" | "tsx" => ("TypeScript", PROGRAMMING),
        "java" => ("Java", PROGRAMMING),
        "kt" | "kts" => ("Kotlin", PROGRAMMING),
        "c" | "h" => ("C", PROGRAMMING),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => ("C++", PROGRAMMING),
        "cs" => ("C#", PROGRAMMING),
        "rb" => ("Ruby", PROGRAMMING),
        "php" => ("PHP", PROGRAMMING),
        "swift" => ("Swift", PROGRAMMING),
        "scala" => ("Scala", PROGRAMMING),
        "sh" | "bash" | "zsh" => ("Shell", PROGRAMMING),
        "sql" => ("SQL", DATA),
        "html" | "htm" => ("HTML", MARKUP),
        "css" | "scss" | "sass" | "less" => ("CSS", MARKUP),
        "xml" | "svg" => ("XML", DATA),
        "json" => ("JSON", DATA),
        "yml" | "yaml" => ("YAML", DATA),
        "toml" => ("TOML", DATA),
        "ini" | "cfg" => ("INI", DATA),
        "csv" | "tsv" => ("CSV", DATA),
        "md" | "markdown" => ("Markdown", PROSE),
        "rst" => ("reStructuredText", PROSE),
        "txt" => ("Text", PROSE),
        _ => return None,
    };
    Some(found)
}

impl LanguageClassifier for ExtensionClassifier {
    fn classify(
        &self,
        path: &str,
        _size: u64,
        is_binary: bool,
        _commit_id: &str,
        _repo_location: &Path,
    ) -> Classification {
        if is_binary {
            return Classification::new("Binary", OTHER);
        }
        let path = Path::new(path);
        let file_name = path.file_name().and_then(|n| n.to_str());
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        file_name
            .and_then(by_file_name)
            .or_else(|| extension.as_deref().and_then(by_extension))
            .map_or_else(
                || Classification::new("Other", OTHER),
                |(language, category)| Classification::new(language, category),
            )
    }
}
