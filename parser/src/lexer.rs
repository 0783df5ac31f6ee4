//! Tokenizer for configuration documents.
//!
//! Produces a flat token stream with source locations. `#include`
//! directives survive tokenization (they are expanded by the include
//! preprocessor before parsing); every other `#`- or `//`-prefixed run
//! is a comment and is dropped here.

use crate::error::{Location, ParseError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    /// An unquoted run: a key, a number, a boolean, or a bare string.
    /// Classified by the parser.
    BareWord(String),
    /// A double-quoted string, unescaped.
    Quoted(String),
    BeginProlog,
    EndProlog,
    /// `#include`; the following token is the quoted path.
    Include,
    /// `@local::name`
    LocalRef(String),
    /// `@table::name`
    TableRef(String),
    /// `@sequence::name`
    SequenceRef(String),
    /// `@nil`
    Nil,
    /// `@erase`
    Erase,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) location: Location,
}

pub(crate) fn tokenize(text: &str, file: Option<&str>) -> Result<Vec<Token>, ParseError> {
    Lexer::new(text, file).run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    file: Option<&'a str>,
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

impl<'a> Lexer<'a> {
    fn new(text: &str, file: Option<&'a str>) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            file,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.file, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_to_end_of_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn starts_with(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, expected)| self.peek_at(i) == Some(expected))
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => {
                    if self.starts_with("#include")
                        && !self
                            .peek_at("#include".len())
                            .is_some_and(is_bare_char)
                    {
                        let location = self.location();
                        for _ in 0.."#include".len() {
                            self.advance();
                        }
                        tokens.push(Token {
                            kind: TokenKind::Include,
                            location,
                        });
                    } else {
                        self.skip_to_end_of_line();
                    }
                }
                '/' if self.peek_at(1) == Some('/') => self.skip_to_end_of_line(),
                '{' => tokens.push(self.single(TokenKind::LBrace)),
                '}' => tokens.push(self.single(TokenKind::RBrace)),
                '[' => tokens.push(self.single(TokenKind::LBracket)),
                ']' => tokens.push(self.single(TokenKind::RBracket)),
                ':' => tokens.push(self.single(TokenKind::Colon)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                '"' => tokens.push(self.quoted()?),
                '@' => tokens.push(self.directive()?),
                c if is_bare_char(c) => tokens.push(self.bare_word()),
                other => {
                    return Err(ParseError::syntax(
                        self.location(),
                        format!("unexpected character '{other}'"),
                    ));
                }
            }
        }
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let location = self.location();
        self.advance();
        Token { kind, location }
    }

    fn quoted(&mut self) -> Result<Token, ParseError> {
        let location = self.location();
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ParseError::syntax(location, "unterminated string literal"));
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(other) => {
                        return Err(ParseError::syntax(
                            self.location(),
                            format!("unknown escape '\\{other}'"),
                        ));
                    }
                    None => {
                        return Err(ParseError::syntax(location, "unterminated string literal"));
                    }
                },
                Some(other) => text.push(other),
            }
        }
        Ok(Token {
            kind: TokenKind::Quoted(text),
            location,
        })
    }

    fn directive(&mut self) -> Result<Token, ParseError> {
        let location = self.location();
        self.advance(); // '@'
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match word.as_str() {
            "nil" => TokenKind::Nil,
            "erase" => TokenKind::Erase,
            "local" => TokenKind::LocalRef(self.reference_name(&location, "local")?),
            "table" => TokenKind::TableRef(self.reference_name(&location, "table")?),
            "sequence" => TokenKind::SequenceRef(self.reference_name(&location, "sequence")?),
            other => {
                return Err(ParseError::syntax(
                    location,
                    format!("unknown directive '@{other}'"),
                ));
            }
        };
        Ok(Token { kind, location })
    }

    fn reference_name(
        &mut self,
        location: &Location,
        kind: &'static str,
    ) -> Result<String, ParseError> {
        if !(self.peek() == Some(':') && self.peek_at(1) == Some(':')) {
            return Err(ParseError::syntax(
                location.clone(),
                format!("'@{kind}' must be written '@{kind}::name'"),
            ));
        }
        self.advance();
        self.advance();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(ParseError::syntax(
                location.clone(),
                format!("'@{kind}::' is missing a binding name"),
            ));
        }
        Ok(name)
    }

    fn bare_word(&mut self) -> Token {
        let location = self.location();
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if is_bare_char(c) {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match word.as_str() {
            "BEGIN_PROLOG" => TokenKind::BeginProlog,
            "END_PROLOG" => TokenKind::EndProlog,
            _ => TokenKind::BareWord(word),
        };
        Token { kind, location }
    }
}
