//! Lexer
//!
//! The lexer converts source text into a flat stream of tokens. It uses
//! the `logos` crate for the token grammar and layers the
//! position-sensitive rules (indentation width, ASCII-only input, tabs)
//! on top.

use crate::span::{LineCursor, Position};
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Number of spaces in one indentation step
pub const INDENT_SPACES: usize = 4;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("{pos}: non-ASCII character")]
    NonAscii { pos: Position },

    #[error("{pos}: tab characters are not allowed")]
    Tab { pos: Position },

    #[error("{pos}: indentation must be a multiple of {INDENT_SPACES} spaces, found {width}")]
    Indentation { width: usize, pos: Position },

    #[error("{pos}: carriage return not followed by newline")]
    StrayCarriageReturn { pos: Position },

    #[error("{pos}: unterminated string literal")]
    UnterminatedString { pos: Position },

    #[error("{pos}: unexpected character {found:?}")]
    UnexpectedChar { found: char, pos: Position },
}

impl LexError {
    pub fn pos(&self) -> Position {
        match self {
            LexError::NonAscii { pos }
            | LexError::Tab { pos }
            | LexError::Indentation { pos, .. }
            | LexError::StrayCarriageReturn { pos }
            | LexError::UnterminatedString { pos }
            | LexError::UnexpectedChar { pos, .. } => *pos,
        }
    }
}

/// Tokenize one source unit. Lexing stops at the first error.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut text = String::with_capacity(source.len() + 1);
    text.push_str(source);
    text.push('\n');

    let mut cursor = LineCursor::new(&text);
    if let Some(offset) = text.bytes().position(|b| !b.is_ascii()) {
        return Err(LexError::NonAscii {
            pos: cursor.position(offset),
        });
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut inner = TokenKind::lexer(&text);
    while let Some(result) = inner.next() {
        let span = inner.span();
        let pos = cursor.position(span.start);
        let slice = inner.slice();
        let kind = match result {
            Ok(kind) => kind,
            Err(()) => return Err(classify_error(slice, pos)),
        };

        if kind == TokenKind::Spaces {
            let after_newline = tokens
                .last()
                .map_or(false, |t| t.kind == TokenKind::Newline);
            if after_newline && slice.len() % INDENT_SPACES != 0 {
                return Err(LexError::Indentation {
                    width: slice.len(),
                    pos,
                });
            }
        }
        tokens.push(Token::new(kind, slice, pos));
    }

    tracing::trace!(target: "lexer", tokens = tokens.len(), "lexed source unit");
    Ok(tokens)
}

fn classify_error(slice: &str, pos: Position) -> LexError {
    match slice.chars().next() {
        Some('\t') => LexError::Tab { pos },
        Some('\r') => LexError::StrayCarriageReturn { pos },
        Some('`') => LexError::UnterminatedString { pos },
        Some(found) => LexError::UnexpectedChar { found, pos },
        None => LexError::UnexpectedChar { found: '\0', pos },
    }
}

/// Undo the only escape a string literal knows: `` \` `` becomes `` ` ``.
pub fn unescape_str(raw: &str) -> String {
    raw.replace("\\`", "`")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(token_kinds(""), vec![TokenKind::Newline]);
    }

    #[test]
    fn test_list_tokens() {
        use TokenKind::*;
        assert_eq!(
            token_kinds("(add x 12)"),
            vec![OpenParen, Word, Spaces, Word, Spaces, Number, CloseParen, Newline]
        );
    }

    #[test]
    fn test_sigils_are_single_tokens() {
        let tokens = lex("-priv a.b").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["-", "priv", " ", "a", ".", "b", "\n"]);
        assert_eq!(tokens[0].kind, TokenKind::Sigil);
    }

    #[test]
    fn test_comment_becomes_newline() {
        use TokenKind::*;
        assert_eq!(token_kinds("x // note\ny"), vec![Word, Spaces, Newline, Word, Newline]);
    }

    #[test]
    fn test_comment_at_end_of_file() {
        assert_eq!(token_kinds("// only"), vec![TokenKind::Newline]);
    }

    #[test]
    fn test_positions() {
        let tokens = lex("(a\n    b)").unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.pos, Position::new(2, 5));
    }

    #[test]
    fn test_crlf_is_newline() {
        use TokenKind::*;
        assert_eq!(token_kinds("a\r\nb"), vec![Word, Newline, Word, Newline]);
    }

    #[test]
    fn test_stray_carriage_return() {
        assert!(matches!(lex("a\rb"), Err(LexError::StrayCarriageReturn { .. })));
    }

    #[test]
    fn test_bad_indentation() {
        let err = lex("(a\n   b)").unwrap_err();
        assert_eq!(
            err,
            LexError::Indentation {
                width: 3,
                pos: Position::new(2, 1)
            }
        );
    }

    #[test]
    fn test_inner_spaces_are_not_indentation() {
        assert!(lex("(a   b)").is_ok());
    }

    #[test]
    fn test_tab_rejected() {
        let err = lex("(a\tb)").unwrap_err();
        assert_eq!(err, LexError::Tab { pos: Position::new(1, 3) });
    }

    #[test]
    fn test_non_ascii_rejected() {
        let err = lex("(a\n é)").unwrap_err();
        assert_eq!(err, LexError::NonAscii { pos: Position::new(2, 2) });
    }

    #[test]
    fn test_unknown_character() {
        assert!(matches!(
            lex("a ? b"),
            Err(LexError::UnexpectedChar { found: '?', .. })
        ));
    }

    #[test]
    fn test_multiline_string_with_escape() {
        let tokens = lex("(x `one\\`\ntwo`)").unwrap();
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.text, "`one\\`\ntwo`");
        assert_eq!(unescape_str(&s.text[1..s.text.len() - 1]), "one`\ntwo");
        let close = tokens.iter().find(|t| t.kind == TokenKind::CloseParen).unwrap();
        assert_eq!(close.pos, Position::new(2, 5));
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex("(x `abc)").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { pos: Position::new(1, 4) });
    }
}
