//! File-path lookup policies for documents and includes.
//!
//! The policy decides how a document path (from the command line or an
//! `#include` directive) maps to a real file. Policies are selected by
//! a small integer code:
//!
//! - `0` — use paths as given.
//! - `1` — resolve every path through the search path.
//! - `2` — absolute paths are used verbatim, relative paths go through
//!   the search path.
//! - `3` — the first (top-level) document is used as given, included
//!   files go through the search path.
//!
//! The search path itself comes from an environment variable or a
//! literal `:`-separated directory list.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::error::ParseError;

/// A `:`-separated list of directories to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
    source: String,
}

impl SearchPath {
    /// Builds a search path from `spec`: the value of the named
    /// environment variable when one is set, otherwise `spec` itself as
    /// a literal directory list.
    pub fn from_env_or_literal(spec: &str) -> Self {
        let raw = std::env::var(spec).unwrap_or_else(|_| spec.to_string());
        Self::from_literal(&raw)
    }

    /// Builds a search path from a literal `:`-separated list.
    pub fn from_literal(list: &str) -> Self {
        let dirs = list
            .split(':')
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();
        Self {
            dirs,
            source: list.to_string(),
        }
    }

    fn find(&self, path: &str) -> Result<PathBuf, ParseError> {
        for dir in &self.dirs {
            let candidate = dir.join(path);
            if candidate.is_file() {
                debug!(path, resolved = %candidate.display(), "resolved through search path");
                return Ok(candidate);
            }
        }
        Err(ParseError::PathLookup {
            path: path.to_string(),
            search: self.source.clone(),
        })
    }
}

/// The policy codes accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown lookup policy code {0}; choose 0, 1, 2, or 3")]
pub struct UnknownPolicyCode(pub u8);

/// How document and include paths resolve to files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPolicy {
    /// Paths are used exactly as written.
    None,
    /// Every path, including the first document, resolves through the
    /// search path.
    Lookup(SearchPath),
    /// Absolute paths are used verbatim; relative paths resolve through
    /// the search path.
    LookupNonAbsolute(SearchPath),
    /// The first document is used as written; includes resolve through
    /// the search path.
    LookupAfterFirst(SearchPath),
}

impl PathPolicy {
    /// Short policy name for logs and dump headers.
    pub fn name(&self) -> &'static str {
        match self {
            PathPolicy::None => "as-given",
            PathPolicy::Lookup(_) => "lookup",
            PathPolicy::LookupNonAbsolute(_) => "lookup-non-absolute",
            PathPolicy::LookupAfterFirst(_) => "lookup-after-first",
        }
    }

    /// Builds the policy selected by `code`, with `spec` naming either
    /// an environment variable or a literal `:`-separated path list.
    pub fn from_code(code: u8, spec: &str) -> Result<Self, UnknownPolicyCode> {
        match code {
            0 => Ok(PathPolicy::None),
            1 => Ok(PathPolicy::Lookup(SearchPath::from_env_or_literal(spec))),
            2 => Ok(PathPolicy::LookupNonAbsolute(SearchPath::from_env_or_literal(
                spec,
            ))),
            3 => Ok(PathPolicy::LookupAfterFirst(SearchPath::from_env_or_literal(
                spec,
            ))),
            other => Err(UnknownPolicyCode(other)),
        }
    }

    /// Maps `path` to the file to read. `is_first` distinguishes the
    /// top-level document from included files.
    pub fn resolve(&self, path: &str, is_first: bool) -> Result<PathBuf, ParseError> {
        match self {
            PathPolicy::None => Ok(PathBuf::from(path)),
            PathPolicy::Lookup(search) => search.find(path),
            PathPolicy::LookupNonAbsolute(search) => {
                if Path::new(path).is_absolute() {
                    Ok(PathBuf::from(path))
                } else {
                    search.find(path)
                }
            }
            PathPolicy::LookupAfterFirst(search) => {
                if is_first {
                    Ok(PathBuf::from(path))
                } else {
                    search.find(path)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cs_parser_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn test_policy_codes() {
        assert!(matches!(
            PathPolicy::from_code(0, "unused"),
            Ok(PathPolicy::None)
        ));
        assert!(matches!(
            PathPolicy::from_code(2, "/a:/b"),
            Ok(PathPolicy::LookupNonAbsolute(_))
        ));
        assert_eq!(PathPolicy::from_code(7, ""), Err(UnknownPolicyCode(7)));
    }

    #[test]
    fn test_lookup_searches_directories_in_order() {
        let dir = temp_dir("lookup");
        std::fs::write(dir.join("job.cfg"), "n: 1\n").unwrap();

        let search = SearchPath::from_literal(&format!("/nonexistent:{}", dir.display()));
        let policy = PathPolicy::Lookup(search);
        let resolved = policy.resolve("job.cfg", true).unwrap();
        assert_eq!(resolved, dir.join("job.cfg"));

        assert!(matches!(
            policy.resolve("missing.cfg", true),
            Err(ParseError::PathLookup { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_non_absolute_policy_passes_absolute_paths_through() {
        let policy = PathPolicy::LookupNonAbsolute(SearchPath::from_literal("/nonexistent"));
        let resolved = policy.resolve("/etc/hosts", false).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_after_first_policy_only_searches_includes() {
        let dir = temp_dir("after_first");
        std::fs::write(dir.join("inc.cfg"), "m: 2\n").unwrap();

        let policy =
            PathPolicy::LookupAfterFirst(SearchPath::from_literal(&dir.display().to_string()));
        assert_eq!(
            policy.resolve("anywhere.cfg", true).unwrap(),
            PathBuf::from("anywhere.cfg")
        );
        assert_eq!(policy.resolve("inc.cfg", false).unwrap(), dir.join("inc.cfg"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
