//! Directory listing with name filters

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// File name filter.
///
/// A name matches when it contains `pattern`, ends with `suffix`, and, when
/// `any_of` is non-empty, contains at least one of its tokens (typically
/// date tokens of a window).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    pub pattern: String,
    pub any_of: Vec<String>,
    pub suffix: String,
}

impl FileQuery {
    pub fn new(pattern: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            any_of: Vec::new(),
            suffix: suffix.into(),
        }
    }

    /// Restrict matches to names containing one of `tokens`
    pub fn with_any_of<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_of = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.contains(&self.pattern)
            && file_name.ends_with(&self.suffix)
            && (self.any_of.is_empty()
                || self.any_of.iter().any(|t| file_name.contains(t.as_str())))
    }
}

/// Sorted regular files of `directory` whose names match `query`
pub fn list_files(directory: &Path, query: &FileQuery) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| query.matches(n)) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
