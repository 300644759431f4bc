//! Template syntax tree.

use forma_ir::{Name, Span};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FunctionDef {
    pub name: Name,
    pub params: Vec<Param>,
    pub is_generator: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Param {
    pub name: Name,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StmtKind {
    /// `object.attr = value;`
    AssignAttr {
        object: Expr,
        attr: Name,
        value: Expr,
    },
    Return(Option<Expr>),
    Yield(Expr),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ExprKind {
    Int(i64),
    Str(String),
    Bool(bool),
    None,
    NotApplicable,
    /// Bare identifier; resolved against parameters during codegen.
    Ident(Name),
    Attr {
        object: Box<Expr>,
        attr: Name,
    },
    Call {
        callee: Name,
        callee_span: Span,
        args: Vec<Expr>,
    },
    Tuple(Vec<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    NotEq,
    Is,
}
