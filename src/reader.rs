//! Reader
//!
//! Groups the flat token stream into a tree of [`Atom`]s. Adjacent tokens
//! with no whitespace between them form an [`AtomKind::Chain`]
//! (`-priv`, `a.b`, `-1.5`, `A<I>`, `name/ns`); bracketed tokens form lists.

use crate::span::{Located, Position};
use crate::token::{Bracket, Token, TokenKind};
use std::fmt;
use thiserror::Error;

/// Reader errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("{pos}: unexpected {found:?}")]
    UnexpectedClose { found: char, pos: Position },

    #[error("{pos}: expected {expected:?} but found {found:?}")]
    MismatchedClose {
        expected: char,
        found: char,
        pos: Position,
    },

    #[error("{pos}: list opened here is never closed")]
    UnterminatedList { pos: Position },
}

impl ReadError {
    pub fn pos(&self) -> Position {
        match self {
            ReadError::UnexpectedClose { pos, .. }
            | ReadError::MismatchedClose { pos, .. }
            | ReadError::UnterminatedList { pos } => *pos,
        }
    }
}

/// A node of the S-expression tree
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomKind {
    Symbol(String),
    Sigil(char),
    Number(String),
    /// Raw string content between the backticks, still escaped
    Str(String),
    /// Two or more atoms with no whitespace between them
    Chain(Vec<Atom>),
    List(Bracket, Vec<Atom>),
}

impl Atom {
    pub fn new(kind: AtomKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            AtomKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.as_symbol() == Some(name)
    }

    pub fn is_sigil(&self, c: char) -> bool {
        matches!(self.kind, AtomKind::Sigil(s) if s == c)
    }

    /// Children of a list of the given bracket kind
    pub fn as_list(&self, bracket: Bracket) -> Option<&[Atom]> {
        match &self.kind {
            AtomKind::List(b, items) if *b == bracket => Some(items),
            _ => None,
        }
    }

    pub fn as_chain(&self) -> Option<&[Atom]> {
        match &self.kind {
            AtomKind::Chain(items) => Some(items),
            _ => None,
        }
    }

    /// Matches a flag written `-name`
    pub fn as_flag(&self) -> Option<&str> {
        match self.as_chain() {
            Some([dash, name]) if dash.is_sigil('-') => name.as_symbol(),
            _ => None,
        }
    }
}

impl Located for Atom {
    fn pos(&self) -> Position {
        self.pos
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AtomKind::Symbol(s) | AtomKind::Number(s) => f.write_str(s),
            AtomKind::Sigil(c) => write!(f, "{c}"),
            AtomKind::Str(s) => write!(f, "`{s}`"),
            AtomKind::Chain(items) => {
                for item in items {
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            AtomKind::List(bracket, items) => {
                write!(f, "{}", bracket.open())?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{}", bracket.close())
            }
        }
    }
}

/// Read a whole token stream into top-level atoms.
pub fn read(tokens: &[Token]) -> Result<Vec<Atom>, ReadError> {
    let mut reader = Reader { tokens, pos: 0 };
    let mut atoms = Vec::new();
    while reader.pos < tokens.len() {
        if let Some(atom) = reader.read_atom(None)? {
            atoms.push(atom);
        }
    }
    Ok(atoms)
}

struct Reader<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Reader<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    /// Reads one whitespace-delimited atom. Stops before `close` without
    /// consuming it.
    fn read_atom(&mut self, close: Option<Bracket>) -> Result<Option<Atom>, ReadError> {
        while self.peek().map_or(false, |t| t.kind.is_whitespace()) {
            self.pos += 1;
        }

        let mut elements = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind.is_whitespace() {
                self.pos += 1;
                break;
            }
            if let Some(closed) = token.kind.closes() {
                if Some(closed) == close {
                    break;
                }
                return Err(match close {
                    Some(expected) => ReadError::MismatchedClose {
                        expected: expected.close(),
                        found: closed.close(),
                        pos: token.pos,
                    },
                    None => ReadError::UnexpectedClose {
                        found: closed.close(),
                        pos: token.pos,
                    },
                });
            }

            self.pos += 1;
            let atom = match token.kind {
                TokenKind::Word => Atom::new(AtomKind::Symbol(token.text.clone()), token.pos),
                TokenKind::Number => Atom::new(AtomKind::Number(token.text.clone()), token.pos),
                TokenKind::Sigil => Atom::new(AtomKind::Sigil(token.first_char()), token.pos),
                TokenKind::Str => {
                    let inner = &token.text[1..token.text.len() - 1];
                    Atom::new(AtomKind::Str(inner.to_string()), token.pos)
                }
                _ => match token.kind.opens() {
                    Some(bracket) => self.read_list(bracket, token.pos)?,
                    None => continue,
                },
            };
            elements.push(atom);
        }

        Ok(match elements.len() {
            0 => None,
            1 => elements.pop(),
            _ => {
                let pos = elements[0].pos;
                Some(Atom::new(AtomKind::Chain(elements), pos))
            }
        })
    }

    /// Reads the contents of a list whose opening bracket was just consumed.
    fn read_list(&mut self, bracket: Bracket, open_pos: Position) -> Result<Atom, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ReadError::UnterminatedList { pos: open_pos }),
                Some(token) if token.kind.closes() == Some(bracket) => {
                    self.pos += 1;
                    return Ok(Atom::new(AtomKind::List(bracket, items), open_pos));
                }
                Some(_) => {
                    if let Some(atom) = self.read_atom(Some(bracket))? {
                        items.push(atom);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, unescape_str};

    fn read_str(source: &str) -> Vec<Atom> {
        read(&lex(source).unwrap()).unwrap()
    }

    #[test]
    fn test_whitespace_only_reads_nothing() {
        assert!(read_str("   \n\n    ").is_empty());
    }

    #[test]
    fn test_list_structure() {
        let atoms = read_str("(add x [y z])");
        assert_eq!(atoms.len(), 1);
        let items = atoms[0].as_list(Bracket::Paren).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_symbol("add"));
        assert_eq!(items[2].as_list(Bracket::Square).unwrap().len(), 2);
    }

    #[test]
    fn test_adjacent_atoms_chain() {
        let atoms = read_str("(f -priv A<I> a.b)");
        let items = atoms[0].as_list(Bracket::Paren).unwrap();
        assert_eq!(items[1].as_flag(), Some("priv"));
        let generic = items[2].as_chain().unwrap();
        assert!(generic[0].is_symbol("A"));
        assert_eq!(generic[1].as_list(Bracket::Angle).unwrap().len(), 1);
        assert_eq!(items[3].as_chain().unwrap().len(), 3);
    }

    #[test]
    fn test_single_element_collapses() {
        let atoms = read_str("x");
        assert_eq!(atoms, vec![Atom::new(AtomKind::Symbol("x".into()), Position::new(1, 1))]);
    }

    #[test]
    fn test_lists_span_lines() {
        let atoms = read_str("(class Foo\n    (f x I))\n(func g)");
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[1].pos, Position::new(3, 1));
    }

    #[test]
    fn test_display_round_trips_shape() {
        let atoms = read_str("(as [x me] (add 1 -2))");
        assert_eq!(atoms[0].to_string(), "(as [x me] (add 1 -2))");
    }

    #[test]
    fn test_mismatched_close() {
        let err = read(&lex("(a ]").unwrap()).unwrap_err();
        assert_eq!(
            err,
            ReadError::MismatchedClose {
                expected: ')',
                found: ']',
                pos: Position::new(1, 4)
            }
        );
    }

    #[test]
    fn test_unexpected_close_at_top_level() {
        let err = read(&lex("a)").unwrap()).unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedClose { found: ')', .. }));
    }

    #[test]
    fn test_unterminated_list() {
        let err = read(&lex("(a (b c)").unwrap()).unwrap_err();
        assert_eq!(err, ReadError::UnterminatedList { pos: Position::new(1, 1) });
    }

    #[test]
    fn test_string_round_trip() {
        let original = "first `quoted`\nsecond line";
        let escaped = original.replace('`', "\\`");
        let atoms = read_str(&format!("(x `{escaped}`)"));
        let items = atoms[0].as_list(Bracket::Paren).unwrap();
        match &items[1].kind {
            AtomKind::Str(raw) => assert_eq!(unescape_str(raw), original),
            other => panic!("expected string atom, got {other:?}"),
        }
    }
}
