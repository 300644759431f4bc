//! Recursive-descent parser for template source.
//!
//! Grammar (one function per template):
//!
//! ```text
//! function := "gen"? "fn" IDENT "(" params? ")" block
//! block    := "{" stmt* "}"
//! stmt     := "return" expr? ";" | "yield" expr ";"
//!           | "if" expr block ("else" (block | if_stmt))?
//!           | expr ("=" expr)? ";"
//! expr     := postfix (("==" | "!=" | "is") postfix)*
//! postfix  := primary ("." IDENT)*
//! primary  := INT | STR | "true" | "false" | "None" | "NotApplicable"
//!           | IDENT ("(" args? ")")? | "(" tuple_or_group ")"
//! ```

use forma_ir::{Name, Span};

use crate::ast::{BinaryOp, Expr, ExprKind, FunctionDef, Param, Stmt, StmtKind};
use crate::error::{CompileError, CompileErrorKind};
use crate::lexer::{Token, TokenKind};

type ParseResult<T> = Result<T, CompileError>;

/// Parse a token stream holding exactly one function definition.
pub(crate) fn parse(tokens: &[Token]) -> ParseResult<FunctionDef> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut functions = Vec::with_capacity(1);
    while !parser.at(&TokenKind::Eof) {
        functions.push(parser.function()?);
    }
    if functions.len() != 1 {
        let span = functions
            .get(1)
            .map_or_else(|| parser.current().span, |f: &FunctionDef| f.span);
        return Err(CompileError::new(
            CompileErrorKind::FunctionCount(functions.len()),
            span,
        ));
    }
    Ok(functions.remove(0))
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        // The token stream always ends with `Eof`, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected<T>(&self, expected: &'static str) -> ParseResult<T> {
        let token = self.current();
        Err(CompileError::new(
            CompileErrorKind::UnexpectedToken {
                expected,
                found: token.kind.describe(),
            },
            token.span,
        ))
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> ParseResult<Span> {
        if self.at(kind) {
            Ok(self.advance().span)
        } else {
            self.unexpected(expected)
        }
    }

    fn ident(&mut self) -> ParseResult<(Name, Span)> {
        if let TokenKind::Ident(name) = self.current().kind {
            let span = self.advance().span;
            Ok((name, span))
        } else {
            self.unexpected("identifier")
        }
    }

    fn function(&mut self) -> ParseResult<FunctionDef> {
        let start = self.current().span;
        let is_generator = self.eat(&TokenKind::Gen);
        self.expect(&TokenKind::Fn, "`fn`")?;
        let (name, _) = self.ident()?;

        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let (name, span) = self.ident()?;
            params.push(Param { name, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)` or `,`")?;

        let (body, end) = self.block()?;
        Ok(FunctionDef {
            name,
            params,
            is_generator,
            body,
            span: start.merge(end),
        })
    }

    fn block(&mut self) -> ParseResult<(Vec<Stmt>, Span)> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return self.unexpected("`}`");
            }
            stmts.push(self.stmt()?);
        }
        let end = self.advance().span;
        Ok((stmts, end))
    }

    fn stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current().span;
        match self.current().kind {
            TokenKind::Return => {
                self.advance();
                let value = if self.at(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                let end = self.expect(&TokenKind::Semi, "`;`")?;
                Ok(Stmt {
                    kind: StmtKind::Return(value),
                    span: start.merge(end),
                })
            }
            TokenKind::Yield => {
                self.advance();
                let value = self.expr()?;
                let end = self.expect(&TokenKind::Semi, "`;`")?;
                Ok(Stmt {
                    kind: StmtKind::Yield(value),
                    span: start.merge(end),
                })
            }
            TokenKind::If => self.if_stmt(),
            _ => {
                let target = self.expr()?;
                if self.eat(&TokenKind::Eq) {
                    let ExprKind::Attr { object, attr } = target.kind else {
                        return Err(CompileError::new(
                            CompileErrorKind::InvalidAssignTarget,
                            target.span,
                        ));
                    };
                    let value = self.expr()?;
                    let end = self.expect(&TokenKind::Semi, "`;`")?;
                    return Ok(Stmt {
                        kind: StmtKind::AssignAttr {
                            object: *object,
                            attr,
                            value,
                        },
                        span: start.merge(end),
                    });
                }
                let end = self.expect(&TokenKind::Semi, "`;` or `=`")?;
                Ok(Stmt {
                    kind: StmtKind::Expr(target),
                    span: start.merge(end),
                })
            }
        }
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::If, "`if`")?;
        let cond = self.expr()?;
        let (then_body, mut end) = self.block()?;
        let else_body = if self.eat(&TokenKind::Else) {
            if self.at(&TokenKind::If) {
                let nested = self.if_stmt()?;
                end = nested.span;
                vec![nested]
            } else {
                let (body, block_end) = self.block()?;
                end = block_end;
                body
            }
        } else {
            Vec::new()
        };
        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_body,
                else_body,
            },
            span: start.merge(end),
        })
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.postfix()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Is => BinaryOp::Is,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.postfix()?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.eat(&TokenKind::Dot) {
            let (attr, end) = self.ident()?;
            let span = expr.span.merge(end);
            expr = Expr {
                kind: ExprKind::Attr {
                    object: Box::new(expr),
                    attr,
                },
                span,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::None => ExprKind::None,
            TokenKind::NotApplicable => ExprKind::NotApplicable,
            TokenKind::Ident(name) => {
                self.advance();
                if !self.eat(&TokenKind::LParen) {
                    return Ok(Expr {
                        kind: ExprKind::Ident(name),
                        span: token.span,
                    });
                }
                let (args, _, end) = self.comma_list()?;
                return Ok(Expr {
                    kind: ExprKind::Call {
                        callee: name,
                        callee_span: token.span,
                        args,
                    },
                    span: token.span.merge(end),
                });
            }
            TokenKind::LParen => {
                self.advance();
                let (mut items, trailing_comma, end) = self.comma_list()?;
                let span = token.span.merge(end);
                if items.len() == 1 && !trailing_comma {
                    let mut inner = items.remove(0);
                    inner.span = span;
                    return Ok(inner);
                }
                return Ok(Expr {
                    kind: ExprKind::Tuple(items),
                    span,
                });
            }
            _ => return self.unexpected("expression"),
        };
        self.advance();
        Ok(Expr {
            kind,
            span: token.span,
        })
    }

    /// Parse `expr, expr, ...)` after an opening paren. Returns the items,
    /// whether a trailing comma was present, and the closing paren span.
    fn comma_list(&mut self) -> ParseResult<(Vec<Expr>, bool, Span)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while !self.at(&TokenKind::RParen) {
            items.push(self.expr()?);
            trailing_comma = self.eat(&TokenKind::Comma);
            if !trailing_comma {
                break;
            }
        }
        let end = self.expect(&TokenKind::RParen, "`)` or `,`")?;
        Ok((items, trailing_comma, end))
    }
}
