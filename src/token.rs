//! Token definitions
//!
//! This module defines all the tokens that the lexer can produce. Whitespace
//! is significant to the reader (it separates atoms), so spaces and newlines
//! are real tokens rather than skipped trivia.

use crate::span::Position;
use logos::Logos;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal source text of the token
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// The single character of a sigil or bracket token.
    pub fn first_char(&self) -> char {
        self.text.chars().next().unwrap_or('\0')
    }
}

/// All token kinds of the source language
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `\n` or `\r\n`
    #[regex(r"\r?\n")]
    Newline,

    /// A run of spaces. Tabs are not whitespace, they are errors.
    #[regex(r" +")]
    Spaces,

    /// Line comment. The newline that ends it is lexed separately, so a
    /// comment line still yields exactly one `Newline`.
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    /// Backtick string, possibly spanning lines
    #[token("`", lex_string)]
    Str,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Word,

    #[regex(r#"[.,~!@#$%^&*+=/\\:;'"-]"#)]
    Sigil,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenSquare,
    #[token("]")]
    CloseSquare,
    #[token("{")]
    OpenCurly,
    #[token("}")]
    CloseCurly,
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,
}

/// Consumes the rest of a backtick string. The literal ends at the first
/// backtick not directly preceded by a backslash.
fn lex_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut prev = b'`';
    for (i, b) in rest.iter().enumerate() {
        if *b == b'`' && prev != b'\\' {
            lex.bump(i + 1);
            return true;
        }
        prev = *b;
    }
    false
}

/// The four bracket pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Paren,
    Square,
    Curly,
    Angle,
}

impl Bracket {
    pub fn open(self) -> char {
        match self {
            Bracket::Paren => '(',
            Bracket::Square => '[',
            Bracket::Curly => '{',
            Bracket::Angle => '<',
        }
    }

    pub fn close(self) -> char {
        match self {
            Bracket::Paren => ')',
            Bracket::Square => ']',
            Bracket::Curly => '}',
            Bracket::Angle => '>',
        }
    }
}

impl TokenKind {
    /// The bracket this token opens, if any
    pub fn opens(&self) -> Option<Bracket> {
        match self {
            TokenKind::OpenParen => Some(Bracket::Paren),
            TokenKind::OpenSquare => Some(Bracket::Square),
            TokenKind::OpenCurly => Some(Bracket::Curly),
            TokenKind::OpenAngle => Some(Bracket::Angle),
            _ => None,
        }
    }

    /// The bracket this token closes, if any
    pub fn closes(&self) -> Option<Bracket> {
        match self {
            TokenKind::CloseParen => Some(Bracket::Paren),
            TokenKind::CloseSquare => Some(Bracket::Square),
            TokenKind::CloseCurly => Some(Bracket::Curly),
            TokenKind::CloseAngle => Some(Bracket::Angle),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Spaces)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Newline => "newline",
            TokenKind::Spaces => "spaces",
            TokenKind::Comment => "comment",
            TokenKind::Str => "string",
            TokenKind::Number => "number",
            TokenKind::Word => "word",
            TokenKind::Sigil => "sigil",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::OpenSquare => "'['",
            TokenKind::CloseSquare => "']'",
            TokenKind::OpenCurly => "'{'",
            TokenKind::CloseCurly => "'}'",
            TokenKind::OpenAngle => "'<'",
            TokenKind::CloseAngle => "'>'",
        };
        f.write_str(name)
    }
}
