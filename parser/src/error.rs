//! Parse-time error types.

use std::path::PathBuf;

use config_schema_core::SourceLocation;
use thiserror::Error;

/// A position in a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source file, when the document came from one.
    pub file: Option<String>,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Location {
    pub(crate) fn new(file: Option<&str>, line: usize, column: usize) -> Self {
        Self {
            file: file.map(str::to_string),
            line,
            column,
        }
    }

    /// The binding annotation recorded on parameter sets.
    pub(crate) fn annotation(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.clone(),
            line: self.line,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "<string>:{}:{}", self.line, self.column),
        }
    }
}

/// A document failed to parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed input at a specific location.
    #[error("{location}: {message}")]
    Syntax { location: Location, message: String },

    /// A `@local::`, `@table::`, or `@sequence::` reference names no
    /// known binding.
    #[error("{location}: undefined reference '@{kind}::{name}'")]
    UndefinedReference {
        location: Location,
        kind: &'static str,
        name: String,
    },

    /// A document or include file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Includes recursed into a file already being processed, or past
    /// the depth limit.
    #[error("{location}: include cycle or depth limit reached at '{path}'")]
    IncludeCycle { location: Location, path: String },

    /// The file-path lookup policy found no match.
    #[error("file '{path}' not found in search path '{search}'")]
    PathLookup { path: String, search: String },
}

impl ParseError {
    pub(crate) fn syntax(location: Location, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            location,
            message: message.into(),
        }
    }
}
