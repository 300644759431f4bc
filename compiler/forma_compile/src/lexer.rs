//! Template lexer built on logos.
//!
//! Identifiers are interned as they are lexed; string literals are unescaped.

use forma_ir::{Name, Span};
use logos::Logos;

use crate::error::{CompileError, CompileErrorKind};

/// Raw token from logos (before interning and unescaping).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    // === Keywords ===
    #[token("fn")]
    Fn,
    #[token("gen")]
    Gen,
    #[token("return")]
    Return,
    #[token("yield")]
    Yield,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("is")]
    Is,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("None")]
    None,
    #[token("NotApplicable")]
    NotApplicable,

    // === Symbols ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semi,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=")]
    Eq,

    // === Literals ===
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
}

/// Cooked token kind.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Fn,
    Gen,
    Return,
    Yield,
    If,
    Else,
    Is,
    True,
    False,
    None,
    NotApplicable,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    EqEq,
    NotEq,
    Eq,
    Ident(Name),
    Int(i64),
    Str(String),
    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Fn => "`fn`".into(),
            TokenKind::Gen => "`gen`".into(),
            TokenKind::Return => "`return`".into(),
            TokenKind::Yield => "`yield`".into(),
            TokenKind::If => "`if`".into(),
            TokenKind::Else => "`else`".into(),
            TokenKind::Is => "`is`".into(),
            TokenKind::True => "`true`".into(),
            TokenKind::False => "`false`".into(),
            TokenKind::None => "`None`".into(),
            TokenKind::NotApplicable => "`NotApplicable`".into(),
            TokenKind::LParen => "`(`".into(),
            TokenKind::RParen => "`)`".into(),
            TokenKind::LBrace => "`{`".into(),
            TokenKind::RBrace => "`}`".into(),
            TokenKind::Comma => "`,`".into(),
            TokenKind::Dot => "`.`".into(),
            TokenKind::Semi => "`;`".into(),
            TokenKind::EqEq => "`==`".into(),
            TokenKind::NotEq => "`!=`".into(),
            TokenKind::Eq => "`=`".into(),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Int(n) => format!("integer `{n}`"),
            TokenKind::Str(_) => "string literal".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Lex `source` into tokens, terminated by a single `Eof` token.
pub(crate) fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(raw) = lexer.next() {
        let span = Span::from_range(lexer.span());
        let slice = lexer.slice();
        let Ok(raw) = raw else {
            return Err(CompileError::new(
                CompileErrorKind::UnexpectedChar(slice.to_owned()),
                span,
            ));
        };
        let kind = match raw {
            RawToken::Fn => TokenKind::Fn,
            RawToken::Gen => TokenKind::Gen,
            RawToken::Return => TokenKind::Return,
            RawToken::Yield => TokenKind::Yield,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::Is => TokenKind::Is,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::None => TokenKind::None,
            RawToken::NotApplicable => TokenKind::NotApplicable,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Semi => TokenKind::Semi,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Ident => TokenKind::Ident(Name::intern(slice)),
            RawToken::Int => match slice.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => {
                    return Err(CompileError::new(
                        CompileErrorKind::IntegerOverflow(slice.to_owned()),
                        span,
                    ))
                }
            },
            RawToken::Str => TokenKind::Str(unescape(&slice[1..slice.len() - 1], span)?),
        };
        tokens.push(Token { kind, span });
    }

    let end = Span::from_range(source.len()..source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: end,
    });
    Ok(tokens)
}

fn unescape(body: &str, span: Span) -> Result<String, CompileError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        // The lexer regex guarantees a character follows every backslash.
        let escaped = chars.next().unwrap_or('\\');
        out.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' | '"' | '\'' => escaped,
            other => {
                return Err(CompileError::new(
                    CompileErrorKind::InvalidEscape(other),
                    span,
                ))
            }
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        match lex(source) {
            Ok(tokens) => tokens.into_iter().map(|t| t.kind).collect(),
            Err(e) => panic!("lex failed: {e}"),
        }
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("fn gen is iff"),
            vec![
                TokenKind::Fn,
                TokenKind::Gen,
                TokenKind::Is,
                TokenKind::Ident(Name::intern("iff")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn placeholder_identifiers() {
        assert_eq!(
            kinds("self._0 = _0;"),
            vec![
                TokenKind::Ident(Name::intern("self")),
                TokenKind::Dot,
                TokenKind::Ident(Name::intern("_0")),
                TokenKind::Eq,
                TokenKind::Ident(Name::intern("_0")),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n" ", ""#),
            vec![
                TokenKind::Str("a\"b\n".into()),
                TokenKind::Str(", ".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_operators() {
        assert_eq!(
            kinds("a == b // trailing\n!= 12"),
            vec![
                TokenKind::Ident(Name::intern("a")),
                TokenKind::EqEq,
                TokenKind::Ident(Name::intern("b")),
                TokenKind::NotEq,
                TokenKind::Int(12),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unexpected_character_is_reported_with_span() {
        let err = lex("fn x() { @ }").err();
        assert_eq!(
            err,
            Some(CompileError::new(
                CompileErrorKind::UnexpectedChar("@".into()),
                Span::new(9, 10)
            ))
        );
    }

    #[test]
    fn integer_overflow() {
        let err = lex("99999999999999999999").err().map(|e| e.kind);
        assert_eq!(
            err,
            Some(CompileErrorKind::IntegerOverflow("99999999999999999999".into()))
        );
    }
}
