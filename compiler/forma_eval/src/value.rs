//! Runtime values.
//!
//! Heap values (`Str`, `Tuple`, `Record`) are reference counted, so cloning a
//! `Value` is always cheap. Records are shared: two clones of a `Value::Record`
//! are the same instance.

use std::fmt;
use std::sync::Arc;

use forma_compile::Const;

use crate::record::{Instance, RecordType};

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    Record(Arc<Instance>),
    Type(TypeRef),
    /// "This comparison does not apply"; only ever produced by equality behaviors.
    NotApplicable,
}

/// Non-record runtime types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    None,
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    Type,
    NotApplicable,
}

impl BuiltinType {
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::None => "NoneType",
            BuiltinType::Bool => "bool",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Str => "str",
            BuiltinType::Tuple => "tuple",
            BuiltinType::Type => "type",
            BuiltinType::NotApplicable => "NotApplicableType",
        }
    }
}

/// Runtime type of a value, as produced by the `type` builtin.
#[derive(Clone)]
pub enum TypeRef {
    Builtin(BuiltinType),
    Record(Arc<RecordType>),
}

impl TypeRef {
    pub fn name(&self) -> &'static str {
        match self {
            TypeRef::Builtin(b) => b.name(),
            TypeRef::Record(ty) => ty.name().as_str(),
        }
    }

    /// Type identity: the same record type object, or the same builtin.
    pub fn is(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::Builtin(a), TypeRef::Builtin(b)) => a == b,
            (TypeRef::Record(a), TypeRef::Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<type '{}'>", self.name())
    }
}

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    #[inline]
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Arc::from(items))
    }

    /// Runtime type of this value.
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Value::None => TypeRef::Builtin(BuiltinType::None),
            Value::Bool(_) => TypeRef::Builtin(BuiltinType::Bool),
            Value::Int(_) => TypeRef::Builtin(BuiltinType::Int),
            Value::Float(_) => TypeRef::Builtin(BuiltinType::Float),
            Value::Str(_) => TypeRef::Builtin(BuiltinType::Str),
            Value::Tuple(_) => TypeRef::Builtin(BuiltinType::Tuple),
            Value::Record(inst) => TypeRef::Record(Arc::clone(inst.record_type())),
            Value::Type(_) => TypeRef::Builtin(BuiltinType::Type),
            Value::NotApplicable => TypeRef::Builtin(BuiltinType::NotApplicable),
        }
    }

    /// Name of the runtime type; subclasses report their own name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Record(inst) => inst.record_type().name().as_str(),
            other => other.type_ref().name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None | Value::NotApplicable => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Record(_) | Value::Type(_) => true,
        }
    }

    /// Identity (`is`). Scalars are identical when equal; heap values when
    /// they are the same allocation.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) | (Value::NotApplicable, Value::NotApplicable) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a.is(b),
            _ => false,
        }
    }

    /// Same heap allocation. Scalars never share one, so a NaN float is not
    /// taken as equal to itself through this check.
    pub fn shares_allocation(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<Instance>> {
        match self {
            Value::Record(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }
}

impl From<&Const> for Value {
    fn from(c: &Const) -> Self {
        match c {
            Const::None => Value::None,
            Const::NotApplicable => Value::NotApplicable,
            Const::Bool(b) => Value::Bool(*b),
            Const::Int(n) => Value::Int(*n),
            Const::Str(s) => Value::Str(Arc::clone(s)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Structural equality that never runs behaviors: records and types compare
/// by identity. Use [`crate::equals`] for full comparison semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                #[expect(clippy::cast_precision_loss, reason = "numeric comparison across int/float")]
                let a = *a as f64;
                a == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            _ => self.is_identical(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Tuple(items) => f.debug_tuple("Tuple").field(&&items[..]).finish(),
            Value::Record(inst) => write!(f, "Record({:?})", inst),
            Value::Type(t) => write!(f, "Type({t:?})"),
            Value::NotApplicable => write!(f, "NotApplicable"),
        }
    }
}
