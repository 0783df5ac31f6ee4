//! Recursive-descent parser producing a [`ParameterSet`].
//!
//! Operates on the token stream after include expansion. Prolog blocks
//! are parsed into a side table of referenceable bindings that never
//! reach the output unless a reference pulls them in; `@local::`,
//! `@table::`, and `@sequence::` resolve against the document parsed so
//! far, falling back to the prolog; later bindings override earlier
//! ones; `key: @erase` removes a binding.

use std::sync::LazyLock;

use config_schema_core::{ParameterSet, Value};
use regex::Regex;
use tracing::debug;

use crate::error::{Location, ParseError};
use crate::lexer::{Token, TokenKind};

static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$").unwrap()
});
static BARE_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

pub(crate) fn parse_tokens(tokens: Vec<Token>) -> Result<ParameterSet, ParseError> {
    Parser {
        tokens,
        pos: 0,
        prolog: ParameterSet::new(),
        root: ParameterSet::new(),
    }
    .parse_document()
}

/// One parsed table-body statement, applied to whichever set is being
/// built.
enum Statement {
    Bind {
        path: Vec<String>,
        value: Value,
        location: Location,
    },
    Erase {
        path: Vec<String>,
    },
    /// `@table::name`: the resolved table's bindings flow into the
    /// current body.
    Splice {
        bindings: ParameterSet,
        location: Location,
    },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prolog: ParameterSet,
    root: ParameterSet,
}

impl Parser {
    fn parse_document(mut self) -> Result<ParameterSet, ParseError> {
        while matches!(self.peek_kind(), Some(TokenKind::BeginProlog)) {
            let begin = self.advance().expect("peeked");
            self.parse_prolog(begin.location)?;
        }
        debug!(prolog_bindings = self.prolog.len(), "prolog complete");

        while let Some(token) = self.peek() {
            if token.kind == TokenKind::BeginProlog {
                return Err(ParseError::syntax(
                    token.location.clone(),
                    "prolog blocks must precede the document body",
                ));
            }
            let statement = self.parse_statement()?;
            apply(&mut self.root, statement);
        }
        Ok(self.root)
    }

    fn parse_prolog(&mut self, begin: Location) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                None => {
                    return Err(ParseError::syntax(
                        begin,
                        "prolog is missing its END_PROLOG",
                    ));
                }
                Some(TokenKind::EndProlog) => {
                    self.advance();
                    return Ok(());
                }
                _ => {
                    let statement = self.parse_statement()?;
                    apply(&mut self.prolog, statement);
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let token = self
            .advance()
            .expect("parse_statement called at end of input");
        match token.kind {
            TokenKind::TableRef(name) => {
                let resolved = self.resolve(&name, "table", &token.location)?;
                let Value::Table(bindings) = resolved else {
                    return Err(ParseError::syntax(
                        token.location,
                        format!("'@table::{name}' does not name a table"),
                    ));
                };
                Ok(Statement::Splice {
                    bindings,
                    location: token.location,
                })
            }
            TokenKind::BareWord(key) => {
                if !KEY_RE.is_match(&key) {
                    return Err(ParseError::syntax(
                        token.location,
                        format!("malformed parameter name '{key}'"),
                    ));
                }
                self.expect_colon(&token.location, &key)?;
                let path: Vec<String> = key.split('.').map(str::to_string).collect();
                if matches!(self.peek_kind(), Some(TokenKind::Erase)) {
                    self.advance();
                    return Ok(Statement::Erase { path });
                }
                let value = self.parse_value()?;
                Ok(Statement::Bind {
                    path,
                    value,
                    location: token.location,
                })
            }
            other => Err(ParseError::syntax(
                token.location,
                format!("expected a binding, found {}", describe(&other)),
            )),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let token = match self.advance() {
            Some(token) => token,
            None => {
                return Err(ParseError::syntax(
                    self.end_location(),
                    "expected a value, found end of input",
                ));
            }
        };
        match token.kind {
            TokenKind::LBrace => {
                let table = self.parse_table_body(token.location)?;
                Ok(Value::Table(table))
            }
            TokenKind::LBracket => self.parse_sequence(token.location),
            TokenKind::Quoted(text) => Ok(Value::String(text)),
            TokenKind::BareWord(word) => classify_scalar(&word, &token.location),
            TokenKind::Nil => Ok(Value::Nil),
            TokenKind::LocalRef(name) => self.resolve(&name, "local", &token.location),
            TokenKind::SequenceRef(name) => {
                let resolved = self.resolve(&name, "sequence", &token.location)?;
                match resolved {
                    Value::Sequence(_) => Ok(resolved),
                    _ => Err(ParseError::syntax(
                        token.location,
                        format!("'@sequence::{name}' does not name a sequence"),
                    )),
                }
            }
            TokenKind::TableRef(name) => Err(ParseError::syntax(
                token.location,
                format!(
                    "'@table::{name}' splices into a table body; use '@local::{name}' to bind a table value"
                ),
            )),
            other => Err(ParseError::syntax(
                token.location,
                format!("expected a value, found {}", describe(&other)),
            )),
        }
    }

    fn parse_table_body(&mut self, open: Location) -> Result<ParameterSet, ParseError> {
        let mut pset = ParameterSet::new();
        loop {
            match self.peek_kind() {
                None => {
                    return Err(ParseError::syntax(open, "table is missing its closing '}'"));
                }
                Some(TokenKind::RBrace) => {
                    self.advance();
                    return Ok(pset);
                }
                _ => {
                    let statement = self.parse_statement()?;
                    apply(&mut pset, statement);
                }
            }
        }
    }

    fn parse_sequence(&mut self, open: Location) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                None => {
                    return Err(ParseError::syntax(
                        open,
                        "sequence is missing its closing ']'",
                    ));
                }
                Some(TokenKind::RBracket) => {
                    self.advance();
                    return Ok(Value::Sequence(items));
                }
                Some(TokenKind::SequenceRef(_)) => {
                    let token = self.advance().expect("peeked");
                    let TokenKind::SequenceRef(name) = token.kind else {
                        unreachable!("matched SequenceRef above");
                    };
                    let resolved = self.resolve(&name, "sequence", &token.location)?;
                    let Value::Sequence(elements) = resolved else {
                        return Err(ParseError::syntax(
                            token.location,
                            format!("'@sequence::{name}' does not name a sequence"),
                        ));
                    };
                    items.extend(elements);
                    self.skip_separator(&open)?;
                }
                _ => {
                    items.push(self.parse_value()?);
                    self.skip_separator(&open)?;
                }
            }
        }
    }

    fn skip_separator(&mut self, open: &Location) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Comma) => {
                self.advance();
                Ok(())
            }
            Some(TokenKind::RBracket) | None => Ok(()),
            Some(_) => {
                let token = self.advance().expect("peeked");
                Err(ParseError::syntax(
                    token.location,
                    format!(
                        "expected ',' or ']' in the sequence opened at {open}, found {}",
                        describe(&token.kind)
                    ),
                ))
            }
        }
    }

    /// Document bindings shadow the prolog; both are visible to
    /// references anywhere in the document.
    fn resolve(
        &self,
        name: &str,
        kind: &'static str,
        location: &Location,
    ) -> Result<Value, ParseError> {
        self.root
            .get_value(name)
            .or_else(|| self.prolog.get_value(name))
            .cloned()
            .ok_or_else(|| ParseError::UndefinedReference {
                location: location.clone(),
                kind,
                name: name.to_string(),
            })
    }

    fn expect_colon(&mut self, at: &Location, key: &str) -> Result<(), ParseError> {
        match self.advance() {
            Some(token) if token.kind == TokenKind::Colon => Ok(()),
            Some(token) => Err(ParseError::syntax(
                token.location,
                format!("expected ':' after '{key}'"),
            )),
            None => Err(ParseError::syntax(
                at.clone(),
                format!("expected ':' after '{key}', found end of input"),
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_location(&self) -> Location {
        self.tokens
            .last()
            .map(|token| token.location.clone())
            .unwrap_or_else(|| Location::new(None, 1, 1))
    }
}

fn apply(target: &mut ParameterSet, statement: Statement) {
    match statement {
        Statement::Bind {
            path,
            value,
            location,
        } => insert_at_path(target, &path, value, location),
        Statement::Erase { path } => erase_at_path(target, &path),
        Statement::Splice { bindings, location } => {
            for (name, value) in bindings.iter() {
                target.insert_annotated(name, value.clone(), Some(location.annotation()));
            }
        }
    }
}

fn insert_at_path(target: &mut ParameterSet, path: &[String], value: Value, location: Location) {
    let (first, rest) = path.split_first().expect("binding paths are non-empty");
    if rest.is_empty() {
        target.insert_annotated(first.clone(), value, Some(location.annotation()));
        return;
    }
    // A dotted key creates or extends nested tables; a non-table in the
    // way is overridden.
    if target.get_table_mut(first).is_none() {
        target.insert_annotated(
            first.clone(),
            ParameterSet::new(),
            Some(location.annotation()),
        );
    }
    let nested = target
        .get_table_mut(first)
        .expect("a table was just bound at this name");
    insert_at_path(nested, rest, value, location);
}

fn erase_at_path(target: &mut ParameterSet, path: &[String]) {
    let (first, rest) = path.split_first().expect("binding paths are non-empty");
    if rest.is_empty() {
        target.erase(first);
        return;
    }
    if let Some(nested) = target.get_table_mut(first) {
        erase_at_path(nested, rest);
    }
}

fn classify_scalar(word: &str, location: &Location) -> Result<Value, ParseError> {
    match word {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if INT_RE.is_match(word) {
        if let Ok(i) = word.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        if !word.starts_with('-') {
            if let Ok(u) = word.trim_start_matches('+').parse::<u64>() {
                return Ok(Value::Uint(u));
            }
        }
        return Err(ParseError::syntax(
            location.clone(),
            format!("integer literal '{word}' is out of range"),
        ));
    }
    if NUMBER_RE.is_match(word) {
        let parsed: f64 = word.parse().expect("the number pattern guarantees a parse");
        if !parsed.is_finite() {
            return Err(ParseError::syntax(
                location.clone(),
                format!("floating-point literal '{word}' is out of range"),
            ));
        }
        return Ok(Value::Float(parsed));
    }
    if BARE_STRING_RE.is_match(word) {
        return Ok(Value::String(word.to_string()));
    }
    Err(ParseError::syntax(
        location.clone(),
        format!("malformed value '{word}'"),
    ))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::BareWord(word) => format!("'{word}'"),
        TokenKind::Quoted(_) => "a string".to_string(),
        TokenKind::BeginProlog => "'BEGIN_PROLOG'".to_string(),
        TokenKind::EndProlog => "'END_PROLOG'".to_string(),
        TokenKind::Include => "'#include'".to_string(),
        TokenKind::LocalRef(name) => format!("'@local::{name}'"),
        TokenKind::TableRef(name) => format!("'@table::{name}'"),
        TokenKind::SequenceRef(name) => format!("'@sequence::{name}'"),
        TokenKind::Nil => "'@nil'".to_string(),
        TokenKind::Erase => "'@erase'".to_string(),
    }
}
