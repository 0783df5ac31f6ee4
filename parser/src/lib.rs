//! Parser for the hierarchical configuration language.
//!
//! A document is a sequence of `name: value` bindings, where values are
//! primitives, `[ ... ]` sequences, or `{ ... }` tables, and names may
//! be dotted to reach into nested tables. On top of that the language
//! offers:
//!
//! - `#` and `//` comments;
//! - `#include "path"` splicing, resolved through a [`PathPolicy`];
//! - `BEGIN_PROLOG` / `END_PROLOG` blocks whose bindings are
//!   referenceable but stay out of the result unless referenced;
//! - `@local::name`, `@table::name`, `@sequence::name` references;
//! - `@nil` markers and `key: @erase` removals;
//! - later bindings override earlier ones.
//!
//! Parsing produces a [`ParameterSet`](config_schema_core::ParameterSet)
//! with a `file:line` annotation on every binding, ready for schema
//! validation with `config-schema-core`.
//!
//! # Example
//!
//! ```
//! use config_schema_parser::parse_document;
//!
//! let pset = parse_document(
//!     "
//!     label: nightly
//!     output: { path: \"out.dat\" level: 3 }
//!     window: [ 640, 480 ]
//!     ",
//! )
//! .unwrap();
//!
//! assert_eq!(pset.get::<String>("label").unwrap(), "nightly");
//! assert_eq!(pset.get::<i32>("output.level").unwrap(), 3);
//! assert_eq!(pset.get_sequence::<u32>("window").unwrap(), vec![640, 480]);
//! ```

mod error;
mod include;
mod lexer;
mod parse;

use std::path::{Path, PathBuf};

use config_schema_core::ParameterSet;
use tracing::debug;

use crate::lexer::{Token, TokenKind};

pub use error::{Location, ParseError};
pub use include::{PathPolicy, SearchPath, UnknownPolicyCode};

/// Includes nested past this depth are assumed to be cyclic.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Parses a document from a string.
///
/// `#include` directives resolve relative to the working directory
/// (the [`PathPolicy::None`] behavior); parse a file through
/// [`parse_document_file`] to apply a lookup policy.
pub fn parse_document(text: &str) -> Result<ParameterSet, ParseError> {
    let mut active = Vec::new();
    let tokens = expand(text, None, &PathPolicy::None, &mut active, 0)?;
    parse::parse_tokens(tokens)
}

/// Parses the document at `path`, resolving it and any `#include`d
/// files through `policy`.
pub fn parse_document_file(
    path: impl AsRef<Path>,
    policy: &PathPolicy,
) -> Result<ParameterSet, ParseError> {
    let given = path.as_ref().display().to_string();
    let resolved = policy.resolve(&given, true)?;
    let text = read(&resolved)?;
    debug!(path = %resolved.display(), bytes = text.len(), "parsing document");

    let mut active = vec![canonical(&resolved)];
    let file_name = resolved.display().to_string();
    let tokens = expand(&text, Some(&file_name), policy, &mut active, 0)?;
    parse::parse_tokens(tokens)
}

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Tokenizes `text` and splices every `#include` in place, recursively,
/// guarding against cycles through the set of files currently open.
fn expand(
    text: &str,
    file: Option<&str>,
    policy: &PathPolicy,
    active: &mut Vec<PathBuf>,
    depth: usize,
) -> Result<Vec<Token>, ParseError> {
    let tokens = lexer::tokenize(text, file)?;
    let mut out = Vec::with_capacity(tokens.len());
    let mut stream = tokens.into_iter();
    while let Some(token) = stream.next() {
        if token.kind != TokenKind::Include {
            out.push(token);
            continue;
        }
        let path = match stream.next() {
            Some(Token {
                kind: TokenKind::Quoted(path),
                ..
            }) => path,
            _ => {
                return Err(ParseError::Syntax {
                    location: token.location,
                    message: "'#include' must be followed by a quoted path".to_string(),
                });
            }
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(ParseError::IncludeCycle {
                location: token.location,
                path,
            });
        }
        let resolved = policy.resolve(&path, false)?;
        let identity = canonical(&resolved);
        if active.contains(&identity) {
            return Err(ParseError::IncludeCycle {
                location: token.location,
                path,
            });
        }
        let included_text = read(&resolved)?;
        debug!(path = %resolved.display(), depth, "expanding include");

        active.push(identity);
        let file_name = resolved.display().to_string();
        let included = expand(&included_text, Some(&file_name), policy, active, depth + 1)?;
        active.pop();
        out.extend(included);
    }
    Ok(out)
}
