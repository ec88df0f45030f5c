//! File and directory ignore pattern handling for owl templates.
//! This module processes `.owlignore` files to exclude specific paths
//! from the copy, similar to .gitignore functionality.
//!
//! Patterns are anchored to the directory holding the ignore file and
//! inherited by every descendant directory. The accumulated rules form a
//! flat union: an entry is excluded as soon as any rule matches it.

use crate::constants::IGNORE_FILE;
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use std::io;
use std::path::Path;

/// Separator used by ignore globs on the running OS.
pub const GLOB_SEPARATOR: char = if cfg!(windows) { '\\' } else { '/' };

/// Reads `<directory>/.owlignore` and returns its patterns joined with
/// `directory`.
///
/// # Notes
/// - A missing ignore file yields an empty list
/// - Blank lines and lines starting with `#` are skipped
/// - Remaining lines are trimmed before being joined
///
/// # Example
/// ```ignore
/// # Contents of .owlignore:
/// *.pyc
/// build
/// ```
pub fn load_patterns(fs: &dyn FileSystem, directory: &Path) -> Result<Vec<String>> {
    let ignore_path = directory.join(IGNORE_FILE);
    let contents = match fs.read_file(&ignore_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist", ignore_path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::IoError(e)),
    };
    let contents = String::from_utf8(contents).map_err(|e| {
        Error::IgnoreError(format!("{} is not valid UTF-8: {}", ignore_path.display(), e))
    })?;

    let patterns = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| join_pattern(directory, line))
        .collect();

    Ok(patterns)
}

/// Joins `pattern` to `directory` and cleans the result: `.` segments and
/// repeated or trailing separators are dropped, `..` removes the segment
/// before it. Glob metacharacters of `directory` are escaped.
fn join_pattern(directory: &Path, pattern: &str) -> String {
    let directory = normalize(&directory.to_string_lossy());
    let pattern = normalize(pattern);

    let mut segments: Vec<String> = Vec::new();
    let escaped = directory.split('/').map(globset::escape);
    for segment in escaped.chain(pattern.split('/').map(str::to_string)) {
        match segment.as_str() {
            "" | "." => {}
            ".." if segments.last().is_some_and(|last| last != "..") => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if directory.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// globset always matches against `/`-separated paths, so Windows paths are
/// converted before they reach it.
fn normalize(path: &str) -> String {
    if GLOB_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(GLOB_SEPARATOR, "/")
    }
}

/// The ignore rules in effect for one directory of a template.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self { patterns: Vec::new(), set: GlobSet::empty() }
    }
}

impl IgnoreRules {
    /// Compiles an ordered list of absolute glob patterns.
    ///
    /// `*` and `?` never cross a path separator; `**` does.
    pub fn new(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(&normalize(pattern))
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    Error::IgnoreError(format!("invalid pattern '{}': {}", pattern, e))
                })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| Error::IgnoreError(format!("ignore rules loading failed: {}", e)))?;

        Ok(Self { patterns, set })
    }

    /// Loads the ignore file of `directory` and appends its patterns to the
    /// rules inherited from the ancestors.
    pub fn merged_with_dir(&self, fs: &dyn FileSystem, directory: &Path) -> Result<Self> {
        let local = load_patterns(fs, directory)?;
        if local.is_empty() {
            return Ok(self.clone());
        }
        debug!("Loaded {} ignore patterns from {}", local.len(), directory.display());
        let mut patterns = self.patterns.clone();
        patterns.extend(local);
        Self::new(patterns)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `path` matches any rule.
    pub fn is_match<P: AsRef<Path>>(&self, path: P) -> bool {
        self.set.is_match(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pattern_escapes_directory() {
        assert_eq!(join_pattern(Path::new("/t/base"), "*.log"), "/t/base/*.log");
        assert_eq!(join_pattern(Path::new("/t/[x]"), "a"), "/t/[[]x[]]/a");
    }

    #[test]
    fn test_join_pattern_cleans_segments() {
        let dir = Path::new("/t/base");
        assert_eq!(join_pattern(dir, "build/"), "/t/base/build");
        assert_eq!(join_pattern(dir, "./dist"), "/t/base/dist");
        assert_eq!(join_pattern(dir, "/abs"), "/t/base/abs");
        assert_eq!(join_pattern(dir, "a//b/./c"), "/t/base/a/b/c");
        assert_eq!(join_pattern(dir, "sub/../tmp"), "/t/base/tmp");
        assert_eq!(join_pattern(Path::new("/t/base/"), "x"), "/t/base/x");
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let rules = IgnoreRules::new(vec!["/t/*.log".to_string()]).unwrap();
        assert!(rules.is_match("/t/a.log"));
        assert!(!rules.is_match("/t/sub/a.log"));

        let rules = IgnoreRules::new(vec!["/t/**/*.log".to_string()]).unwrap();
        assert!(rules.is_match("/t/sub/deep/a.log"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreRules::new(vec!["/t/[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::IgnoreError(_)));
    }
}
