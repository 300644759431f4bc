//! Bytecode generation.
//!
//! Names enter the `names` table in first-use order while walking the body
//! top to bottom. Templates mention their fields in field order, so the
//! placeholders of a template always form one contiguous run in that table.

use std::sync::Arc;

use forma_ir::{Name, Span};
use rustc_hash::FxHashMap;

use crate::ast::{BinaryOp, Expr, ExprKind, FunctionDef, Stmt, StmtKind};
use crate::code::{Builtin, CodeFlags, CodeObject, CompareOp, Const, Op};
use crate::error::{CompileError, CompileErrorKind};

type GenResult<T = ()> = Result<T, CompileError>;

pub(crate) fn generate(function: &FunctionDef) -> GenResult<CodeObject> {
    let mut gen = CodeGen {
        is_generator: function.is_generator,
        locals: FxHashMap::default(),
        varnames: Vec::with_capacity(function.params.len()),
        names: Vec::new(),
        name_index: FxHashMap::default(),
        consts: Vec::new(),
        ops: Vec::new(),
    };

    for param in &function.params {
        if gen.locals.contains_key(&param.name) {
            return Err(CompileError::new(
                CompileErrorKind::DuplicateParam(param.name.as_str().to_owned()),
                param.span,
            ));
        }
        let slot = index_u16(gen.varnames.len(), "varnames", param.span)?;
        gen.locals.insert(param.name, slot);
        gen.varnames.push(param.name);
    }

    gen.block(&function.body)?;
    // Implicit `return None;`
    let none = gen.constant(Const::None, function.span)?;
    gen.ops.push(Op::LoadConst(none));
    gen.ops.push(Op::Return);

    let flags = if function.is_generator {
        CodeFlags::GENERATOR
    } else {
        CodeFlags::empty()
    };
    Ok(CodeObject {
        name: function.name,
        varnames: gen.varnames,
        names: gen.names,
        consts: gen.consts,
        ops: gen.ops,
        flags,
    })
}

fn index_u16(len: usize, table: &'static str, span: Span) -> GenResult<u16> {
    u16::try_from(len).map_err(|_| CompileError::new(CompileErrorKind::TableOverflow(table), span))
}

struct CodeGen {
    is_generator: bool,
    locals: FxHashMap<Name, u16>,
    varnames: Vec<Name>,
    names: Vec<Name>,
    name_index: FxHashMap<Name, u16>,
    consts: Vec<Const>,
    ops: Vec<Op>,
}

impl CodeGen {
    fn name(&mut self, name: Name, span: Span) -> GenResult<u16> {
        if let Some(&idx) = self.name_index.get(&name) {
            return Ok(idx);
        }
        let idx = index_u16(self.names.len(), "names", span)?;
        self.names.push(name);
        self.name_index.insert(name, idx);
        Ok(idx)
    }

    fn constant(&mut self, value: Const, span: Span) -> GenResult<u16> {
        if let Some(pos) = self.consts.iter().position(|c| *c == value) {
            return index_u16(pos, "consts", span);
        }
        let idx = index_u16(self.consts.len(), "consts", span)?;
        self.consts.push(value);
        Ok(idx)
    }

    fn here(&self, span: Span) -> GenResult<u32> {
        u32::try_from(self.ops.len())
            .map_err(|_| CompileError::new(CompileErrorKind::TableOverflow("ops"), span))
    }

    fn patch_jump(&mut self, at: usize, target: u32) {
        match &mut self.ops[at] {
            Op::Jump(t) | Op::PopJumpIfFalse(t) => *t = target,
            _ => {}
        }
    }

    fn block(&mut self, stmts: &[Stmt]) -> GenResult {
        stmts.iter().try_for_each(|stmt| self.stmt(stmt))
    }

    fn stmt(&mut self, stmt: &Stmt) -> GenResult {
        match &stmt.kind {
            StmtKind::AssignAttr {
                object,
                attr,
                value,
            } => {
                self.expr(value)?;
                self.expr(object)?;
                let idx = self.name(*attr, stmt.span)?;
                self.ops.push(Op::StoreAttr(idx));
            }
            StmtKind::Return(value) => {
                match value {
                    Some(expr) => self.expr(expr)?,
                    None => {
                        let none = self.constant(Const::None, stmt.span)?;
                        self.ops.push(Op::LoadConst(none));
                    }
                }
                self.ops.push(Op::Return);
            }
            StmtKind::Yield(value) => {
                if !self.is_generator {
                    return Err(CompileError::new(
                        CompileErrorKind::YieldOutsideGenerator,
                        stmt.span,
                    ));
                }
                self.expr(value)?;
                self.ops.push(Op::Yield);
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.expr(cond)?;
                let jump_to_else = self.ops.len();
                self.ops.push(Op::PopJumpIfFalse(0));
                self.block(then_body)?;
                if else_body.is_empty() {
                    let end = self.here(stmt.span)?;
                    self.patch_jump(jump_to_else, end);
                } else {
                    let jump_to_end = self.ops.len();
                    self.ops.push(Op::Jump(0));
                    let else_start = self.here(stmt.span)?;
                    self.patch_jump(jump_to_else, else_start);
                    self.block(else_body)?;
                    let end = self.here(stmt.span)?;
                    self.patch_jump(jump_to_end, end);
                }
            }
            StmtKind::Expr(expr) => {
                self.expr(expr)?;
                self.ops.push(Op::Pop);
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> GenResult {
        match &expr.kind {
            ExprKind::Int(n) => self.load_const(Const::Int(*n), expr.span)?,
            ExprKind::Str(s) => self.load_const(Const::Str(Arc::from(s.as_str())), expr.span)?,
            ExprKind::Bool(b) => self.load_const(Const::Bool(*b), expr.span)?,
            ExprKind::None => self.load_const(Const::None, expr.span)?,
            ExprKind::NotApplicable => self.load_const(Const::NotApplicable, expr.span)?,
            ExprKind::Ident(name) => {
                let Some(&slot) = self.locals.get(name) else {
                    return Err(CompileError::new(
                        CompileErrorKind::UnboundName(name.as_str().to_owned()),
                        expr.span,
                    ));
                };
                self.ops.push(Op::LoadFast(slot));
            }
            ExprKind::Attr { object, attr } => {
                self.expr(object)?;
                let idx = self.name(*attr, expr.span)?;
                self.ops.push(Op::LoadAttr(idx));
            }
            ExprKind::Call {
                callee,
                callee_span,
                args,
            } => self.call(*callee, *callee_span, args, expr.span)?,
            ExprKind::Tuple(items) => {
                for item in items {
                    self.expr(item)?;
                }
                let n = index_u16(items.len(), "tuple", expr.span)?;
                self.ops.push(Op::BuildTuple(n));
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left)?;
                self.expr(right)?;
                self.ops.push(Op::Compare(match op {
                    BinaryOp::Eq => CompareOp::Eq,
                    BinaryOp::NotEq => CompareOp::NotEq,
                    BinaryOp::Is => CompareOp::Is,
                }));
            }
        }
        Ok(())
    }

    fn load_const(&mut self, value: Const, span: Span) -> GenResult {
        let idx = self.constant(value, span)?;
        self.ops.push(Op::LoadConst(idx));
        Ok(())
    }

    fn call(&mut self, callee: Name, callee_span: Span, args: &[Expr], span: Span) -> GenResult {
        match callee.as_str() {
            "nameof" => {
                let [Expr {
                    kind: ExprKind::Ident(target),
                    ..
                }] = args
                else {
                    return Err(CompileError::new(CompileErrorKind::NameofTarget, span));
                };
                let idx = self.name(*target, span)?;
                self.ops.push(Op::LoadNameStr(idx));
            }
            "concat" => {
                for arg in args {
                    self.expr(arg)?;
                }
                let n = index_u16(args.len(), "concat", span)?;
                self.ops.push(Op::BuildString(n));
            }
            other => {
                let Some(builtin) = Builtin::from_name(other) else {
                    return Err(CompileError::new(
                        CompileErrorKind::UnknownBuiltin(other.to_owned()),
                        callee_span,
                    ));
                };
                if args.len() != 1 {
                    return Err(CompileError::new(
                        CompileErrorKind::BuiltinArity {
                            name: builtin.name(),
                            expected: 1,
                            found: args.len(),
                        },
                        span,
                    ));
                }
                self.expr(&args[0])?;
                self.ops.push(Op::CallBuiltin(builtin));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
