//! Bytecode interpreter.
//!
//! One `Frame` per call: parameter slots, an operand stack, and (for
//! generators) the collected output. Value semantics such as equality and
//! display live in [`crate::protocol`]; the interpreter only sequences them.

use forma_compile::{Builtin, CodeObject, CompareOp, Op};
use smallvec::SmallVec;

use crate::stack::ensure_sufficient_stack;
use crate::{protocol, EvalError, EvalResult, Value};

/// Run `code` with `args` bound to its parameters.
pub(crate) fn run(code: &CodeObject, args: &[Value]) -> EvalResult<Value> {
    let expected = code.argcount();
    if args.len() != expected {
        let missing = code.varnames().get(args.len()..).unwrap_or_default().to_vec();
        return Err(EvalError::ArgumentCount {
            function: code.name(),
            expected,
            found: args.len(),
            missing,
        });
    }
    tracing::trace!(function = %code.name(), argc = args.len(), "call");
    ensure_sufficient_stack(|| Frame::new(code, args).execute())
}

struct Frame<'c> {
    code: &'c CodeObject,
    locals: SmallVec<[Value; 8]>,
    stack: SmallVec<[Value; 16]>,
    yielded: Vec<Value>,
}

impl<'c> Frame<'c> {
    fn new(code: &'c CodeObject, args: &[Value]) -> Self {
        Frame {
            code,
            locals: args.iter().cloned().collect(),
            stack: SmallVec::new(),
            yielded: Vec::new(),
        }
    }

    fn malformed(&self, detail: impl Into<String>) -> EvalError {
        EvalError::MalformedCode {
            function: self.code.name(),
            detail: detail.into(),
        }
    }

    fn pop(&mut self) -> EvalResult<Value> {
        match self.stack.pop() {
            Some(value) => Ok(value),
            None => Err(self.malformed("operand stack underflow")),
        }
    }

    fn pop_n(&mut self, n: usize) -> EvalResult<Vec<Value>> {
        let Some(start) = self.stack.len().checked_sub(n) else {
            return Err(self.malformed("operand stack underflow"));
        };
        Ok(self.stack.drain(start..).collect())
    }

    fn name(&self, index: u16) -> EvalResult<forma_ir::Name> {
        match self.code.names().get(usize::from(index)) {
            Some(name) => Ok(*name),
            None => Err(self.malformed(format!("name index {index} out of range"))),
        }
    }

    fn execute(mut self) -> EvalResult<Value> {
        let code = self.code;
        let ops = code.ops();
        let mut pc = 0usize;
        while let Some(&op) = ops.get(pc) {
            pc += 1;
            match op {
                Op::LoadConst(i) => {
                    let Some(c) = code.consts().get(usize::from(i)) else {
                        return Err(self.malformed(format!("const index {i} out of range")));
                    };
                    self.stack.push(Value::from(c));
                }
                Op::LoadFast(i) => {
                    let Some(value) = self.locals.get(usize::from(i)).cloned() else {
                        return Err(self.malformed(format!("slot {i} out of range")));
                    };
                    self.stack.push(value);
                }
                Op::LoadAttr(i) => {
                    let name = self.name(i)?;
                    let object = self.pop()?;
                    self.stack.push(protocol::get_attr(&object, name)?);
                }
                Op::StoreAttr(i) => {
                    let name = self.name(i)?;
                    let object = self.pop()?;
                    let value = self.pop()?;
                    protocol::set_attr(&object, name, value)?;
                }
                Op::LoadNameStr(i) => {
                    let name = self.name(i)?;
                    self.stack.push(Value::string(name.as_str()));
                }
                Op::BuildTuple(n) => {
                    let items = self.pop_n(usize::from(n))?;
                    self.stack.push(Value::tuple(items));
                }
                Op::BuildString(n) => {
                    let parts = self.pop_n(usize::from(n))?;
                    let mut out = String::new();
                    for part in &parts {
                        match part {
                            Value::Str(s) => out.push_str(s),
                            other => out.push_str(&protocol::repr(other)?),
                        }
                    }
                    self.stack.push(Value::string(out));
                }
                Op::CallBuiltin(builtin) => {
                    let arg = self.pop()?;
                    let result = match builtin {
                        Builtin::Type => Value::Type(arg.type_ref()),
                        Builtin::TypeName => Value::string(arg.type_name()),
                        Builtin::Repr => Value::string(protocol::repr(&arg)?),
                        Builtin::Hash => Value::Int(protocol::hash_to_int(protocol::hash(&arg)?)),
                    };
                    self.stack.push(result);
                }
                Op::Compare(cmp) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let result = match cmp {
                        CompareOp::Eq => protocol::equals(&left, &right)?,
                        CompareOp::NotEq => !protocol::equals(&left, &right)?,
                        CompareOp::Is => left.is_identical(&right),
                    };
                    self.stack.push(Value::Bool(result));
                }
                Op::PopJumpIfFalse(target) => {
                    if !self.pop()?.is_truthy() {
                        pc = target as usize;
                    }
                }
                Op::Jump(target) => pc = target as usize,
                Op::Pop => {
                    self.pop()?;
                }
                Op::Yield => {
                    let value = self.pop()?;
                    self.yielded.push(value);
                }
                Op::Return => {
                    let value = self.pop()?;
                    if code.is_generator() {
                        return Ok(Value::tuple(self.yielded));
                    }
                    return Ok(value);
                }
            }
        }
        Err(self.malformed("fell off the end of the code"))
    }
}
