//! Compiled template artifacts.
//!
//! A `CodeObject` is immutable once produced. Rebinding names goes through
//! [`CodeObject::replace_names`], which returns a fresh copy.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use forma_ir::Name;
use thiserror::Error;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CodeFlags: u8 {
        /// Calls collect every `yield`ed value into a tuple.
        const GENERATOR = 1 << 0;
    }
}

/// Constant pool entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Const {
    None,
    NotApplicable,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

/// One-argument builtin functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Runtime type of the argument.
    Type,
    /// Name of the argument's runtime type.
    TypeName,
    /// Display form of the argument.
    Repr,
    /// Hash of the argument.
    Hash,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "type" => Some(Builtin::Type),
            "typename" => Some(Builtin::TypeName),
            "repr" => Some(Builtin::Repr),
            "hash" => Some(Builtin::Hash),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Type => "type",
            Builtin::TypeName => "typename",
            Builtin::Repr => "repr",
            Builtin::Hash => "hash",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    /// Identity.
    Is,
}

/// Stack machine instruction.
///
/// Operands index into the owning code object's tables: `LoadConst` into
/// `consts`, `LoadFast` into the parameter slots, and `LoadAttr`/`StoreAttr`/
/// `LoadNameStr` into `names`. Jump targets are instruction indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    LoadConst(u16),
    LoadFast(u16),
    /// Pop object, push `object.names[i]`.
    LoadAttr(u16),
    /// Pop object, pop value, set `object.names[i] = value`.
    StoreAttr(u16),
    /// Push `names[i]` itself as a string.
    LoadNameStr(u16),
    BuildTuple(u16),
    /// Pop `n` values and push their concatenated string forms.
    BuildString(u16),
    CallBuiltin(Builtin),
    Compare(CompareOp),
    PopJumpIfFalse(u32),
    Jump(u32),
    Pop,
    /// Pop a value and append it to the generator output.
    Yield,
    Return,
}

/// Executable form of one template function.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeObject {
    pub(crate) name: Name,
    pub(crate) varnames: Vec<Name>,
    pub(crate) names: Vec<Name>,
    pub(crate) consts: Vec<Const>,
    pub(crate) ops: Vec<Op>,
    pub(crate) flags: CodeFlags,
}

/// Replacement table whose length differs from the table it replaces.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("replacement {table} table has {found} entries, expected {expected}")]
pub struct ReplaceNamesError {
    pub table: &'static str,
    pub expected: usize,
    pub found: usize,
}

impl CodeObject {
    /// Function name as written in the template.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Number of positional parameters, receiver included.
    pub fn argcount(&self) -> usize {
        self.varnames.len()
    }

    /// Parameter names, in slot order.
    pub fn varnames(&self) -> &[Name] {
        &self.varnames
    }

    /// Attribute and label names, in first-use order.
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn consts(&self) -> &[Const] {
        &self.consts
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn flags(&self) -> CodeFlags {
        self.flags
    }

    pub fn is_generator(&self) -> bool {
        self.flags.contains(CodeFlags::GENERATOR)
    }

    /// Copy of this code object with both name tables swapped out.
    ///
    /// Instructions, constants and flags are shared verbatim, so the copy
    /// behaves exactly like `self` except for which names it touches.
    pub fn replace_names(
        &self,
        names: Vec<Name>,
        varnames: Vec<Name>,
    ) -> Result<CodeObject, ReplaceNamesError> {
        if names.len() != self.names.len() {
            return Err(ReplaceNamesError {
                table: "names",
                expected: self.names.len(),
                found: names.len(),
            });
        }
        if varnames.len() != self.varnames.len() {
            return Err(ReplaceNamesError {
                table: "varnames",
                expected: self.varnames.len(),
                found: varnames.len(),
            });
        }
        Ok(CodeObject {
            name: self.name,
            varnames,
            names,
            consts: self.consts.clone(),
            ops: self.ops.clone(),
            flags: self.flags,
        })
    }
}

/// Disassembly listing.
impl fmt::Display for CodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.varnames.iter().map(|n| n.as_str()).collect();
        let prefix = if self.is_generator() { "gen fn" } else { "fn" };
        writeln!(f, "{prefix} {}({})", self.name, params.join(", "))?;
        for (i, op) in self.ops.iter().enumerate() {
            write!(f, "{i:>4}  ")?;
            match *op {
                Op::LoadConst(c) => write!(f, "LoadConst {c} ({:?})", self.consts[c as usize])?,
                Op::LoadFast(s) => write!(f, "LoadFast {s} ({})", self.varnames[s as usize])?,
                Op::LoadAttr(n) => write!(f, "LoadAttr {n} ({})", self.names[n as usize])?,
                Op::StoreAttr(n) => write!(f, "StoreAttr {n} ({})", self.names[n as usize])?,
                Op::LoadNameStr(n) => write!(f, "LoadNameStr {n} ({})", self.names[n as usize])?,
                other => write!(f, "{other:?}")?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
