//! Value protocols: construction, display, equality, hashing, iteration and
//! positional destructuring.
//!
//! Records delegate to the behaviors found along their ancestry; every other
//! value has a fixed builtin meaning.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use forma_ir::{BehaviorKind, Name};
use rustc_hash::FxHasher;

use crate::record::{Instance, RecordType};
use crate::{EvalError, EvalResult, Value};

/// Outcome of one equality behavior.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    /// The behavior does not handle this pairing; the caller falls back
    /// (reflected comparison, then identity).
    NotApplicable,
}

impl Comparison {
    pub fn is_equal(self) -> bool {
        self == Comparison::Equal
    }

    fn from_result(value: &Value) -> Self {
        match value {
            Value::NotApplicable => Comparison::NotApplicable,
            other => Comparison::from(other.is_truthy()),
        }
    }
}

impl From<bool> for Comparison {
    fn from(equal: bool) -> Self {
        if equal {
            Comparison::Equal
        } else {
            Comparison::NotEqual
        }
    }
}

/// Create an instance of `ty` and run the nearest Construct behavior on it.
///
/// A type with no Construct behavior anywhere in its ancestry accepts only an
/// empty argument list.
pub fn construct(ty: &Arc<RecordType>, args: &[Value]) -> EvalResult<Value> {
    let instance = Value::Record(Arc::new(Instance::new(Arc::clone(ty))));
    match ty.lookup(BehaviorKind::Construct) {
        Some(method) => {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(instance.clone());
            full.extend_from_slice(args);
            method.call(&full)?;
        }
        None if args.is_empty() => {}
        None => {
            return Err(EvalError::ArgumentCount {
                function: ty.name(),
                expected: 0,
                found: args.len(),
                missing: Vec::new(),
            })
        }
    }
    Ok(instance)
}

/// Display form of a value.
pub fn repr(value: &Value) -> EvalResult<String> {
    Ok(match value {
        Value::None => "None".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => float_repr(*x),
        Value::Str(s) => str_repr(s),
        Value::Tuple(items) => {
            let parts = items.iter().map(repr).collect::<EvalResult<Vec<_>>>()?;
            if parts.len() == 1 {
                format!("({},)", parts[0])
            } else {
                format!("({})", parts.join(", "))
            }
        }
        Value::Record(inst) => match inst.record_type().lookup(BehaviorKind::Display) {
            Some(method) => match method.call(std::slice::from_ref(value))? {
                Value::Str(s) => s.to_string(),
                other => {
                    return Err(bad_return("display", value, "str", &other));
                }
            },
            None => format!("<{} object>", value.type_name()),
        },
        Value::Type(t) => format!("<class '{}'>", t.name()),
        Value::NotApplicable => "NotApplicable".to_owned(),
    })
}

fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_owned();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return exponent_repr(x);
    }
    if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

/// Shortest round-trip digits with a signed, at least two-digit exponent
/// (`1e+16`, `2.5e-07`).
fn exponent_repr(x: f64) -> String {
    let shortest = format!("{x:e}");
    let Some((mantissa, exponent)) = shortest.split_once('e') else {
        return shortest;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn bad_return(behavior: &'static str, receiver: &Value, expected: &'static str, found: &Value) -> EvalError {
    EvalError::BadReturn {
        behavior,
        type_name: receiver.type_name().to_owned(),
        expected,
        found: found.type_name().to_owned(),
    }
}

/// Run `left`'s equality behavior against `right`, without reflection.
pub fn compare(left: &Value, right: &Value) -> EvalResult<Comparison> {
    match left {
        Value::Record(inst) => match inst.record_type().lookup(BehaviorKind::Equality) {
            Some(method) => {
                let result = method.call(&[left.clone(), right.clone()])?;
                Ok(Comparison::from_result(&result))
            }
            None if left.is_identical(right) => Ok(Comparison::Equal),
            None => Ok(Comparison::NotApplicable),
        },
        _ => builtin_compare(left, right),
    }
}

/// Full equality: `left`'s behavior, then `right`'s reflected, then identity.
pub fn equals(left: &Value, right: &Value) -> EvalResult<bool> {
    match compare(left, right)? {
        Comparison::Equal => Ok(true),
        Comparison::NotEqual => Ok(false),
        Comparison::NotApplicable => match compare(right, left)? {
            Comparison::Equal => Ok(true),
            Comparison::NotEqual => Ok(false),
            Comparison::NotApplicable => Ok(left.is_identical(right)),
        },
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(x) => Some(Number::Float(*x)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss, reason = "mixed int/float comparison")]
fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => a == b,
        (Number::Float(a), Number::Float(b)) => a == b,
        (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => *i as f64 == *f,
    }
}

fn builtin_compare(left: &Value, right: &Value) -> EvalResult<Comparison> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return Ok(Comparison::from(numbers_equal(&a, &b)));
    }
    let equal = match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Tuple(a), Value::Tuple(b)) => tuples_equal(a, b)?,
        (Value::None, Value::None) | (Value::NotApplicable, Value::NotApplicable) => true,
        (Value::Type(a), Value::Type(b)) => a.is(b),
        _ => return Ok(Comparison::NotApplicable),
    };
    Ok(Comparison::from(equal))
}

fn tuples_equal(a: &[Value], b: &[Value]) -> EvalResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !(x.shares_allocation(y) || equals(x, y)?) {
            return Ok(false);
        }
    }
    Ok(true)
}

const NONE_HASH: u64 = 0x6e6f_6e65;

/// Hash of a value. Records use their Hashing behavior, or identity without one.
pub fn hash(value: &Value) -> EvalResult<u64> {
    let mut hasher = FxHasher::default();
    match value {
        Value::None => return Ok(NONE_HASH),
        Value::NotApplicable => return Ok(!NONE_HASH),
        Value::Bool(b) => i64::from(*b).hash(&mut hasher),
        Value::Int(n) => n.hash(&mut hasher),
        Value::Float(x) => match integral(*x) {
            Some(n) => n.hash(&mut hasher),
            None => x.to_bits().hash(&mut hasher),
        },
        Value::Str(s) => s.hash(&mut hasher),
        Value::Tuple(items) => {
            items.len().hash(&mut hasher);
            for item in items.iter() {
                hasher.write_u64(hash(item)?);
            }
        }
        Value::Record(inst) => {
            if let Some(method) = inst.record_type().lookup(BehaviorKind::Hashing) {
                return match method.call(std::slice::from_ref(value))? {
                    Value::Int(n) => Ok(u64::from_ne_bytes(n.to_ne_bytes())),
                    other => Err(bad_return("hash", value, "int", &other)),
                };
            }
            std::ptr::hash(Arc::as_ptr(inst), &mut hasher);
        }
        Value::Type(t) => match t {
            crate::TypeRef::Record(ty) => std::ptr::hash(Arc::as_ptr(ty), &mut hasher),
            crate::TypeRef::Builtin(b) => b.hash(&mut hasher),
        },
    }
    Ok(hasher.finish())
}

/// The integer a float is equal to, when there is one.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "round-trip check guards the conversion"
)]
fn integral(x: f64) -> Option<i64> {
    if x.fract() != 0.0 || !x.is_finite() {
        return None;
    }
    let n = x as i64;
    (n as f64 == x).then_some(n)
}

/// Reinterpret a hash as the interpreter's integer type.
pub(crate) fn hash_to_int(hash: u64) -> i64 {
    i64::from_ne_bytes(hash.to_ne_bytes())
}

/// Values of a tuple, a string's characters, or what a record's Iteration
/// behavior yields.
pub fn iterate(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::Tuple(items) => Ok(items.to_vec()),
        Value::Str(s) => Ok(s
            .chars()
            .map(|c| Value::string(c.encode_utf8(&mut [0; 4])))
            .collect()),
        Value::Record(inst) => match inst.record_type().lookup(BehaviorKind::Iteration) {
            Some(method) => match method.call(std::slice::from_ref(value))? {
                Value::Tuple(items) => Ok(items.to_vec()),
                other => Err(bad_return("iter", value, "tuple", &other)),
            },
            None => Err(EvalError::NotIterable(value.type_name().to_owned())),
        },
        other => Err(EvalError::NotIterable(other.type_name().to_owned())),
    }
}

/// Positional destructuring against `ty`'s recorded field order.
///
/// `Ok(None)` when `value` is not an instance of `ty` (or a subtype);
/// otherwise the first `count` field values in field order.
pub fn match_positional(
    value: &Value,
    ty: &RecordType,
    count: usize,
) -> EvalResult<Option<Vec<Value>>> {
    let Value::Record(inst) = value else {
        return Ok(None);
    };
    if !inst.record_type().is_subtype_of(ty) {
        return Ok(None);
    }
    let fields = ty.match_args().unwrap_or_else(|| Arc::from(Vec::new()));
    if count > fields.len() {
        return Err(EvalError::TooManyPositional {
            type_name: ty.name().as_str().to_owned(),
            allowed: fields.len(),
            found: count,
        });
    }
    fields[..count]
        .iter()
        .map(|field| get_attr(value, field.name))
        .collect::<EvalResult<Vec<_>>>()
        .map(Some)
}

pub(crate) fn get_attr(object: &Value, name: Name) -> EvalResult<Value> {
    let found = match object {
        Value::Record(inst) => inst.get_attr(name),
        _ => None,
    };
    found.ok_or_else(|| EvalError::NoAttribute {
        type_name: object.type_name().to_owned(),
        attr: name,
    })
}

pub(crate) fn set_attr(object: &Value, name: Name, value: Value) -> EvalResult<()> {
    match object {
        Value::Record(inst) => {
            inst.set_attr(name, value);
            Ok(())
        }
        other => Err(EvalError::ReadOnlyAttribute {
            type_name: other.type_name().to_owned(),
            attr: name,
        }),
    }
}

#[cfg(test)]
mod tests;
