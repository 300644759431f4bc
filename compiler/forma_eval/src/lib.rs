//! Forma Eval - the record runtime.
//!
//! Record types, their instances, runtime values, and the interpreter that
//! executes compiled behaviors. The protocol functions (`construct`, `repr`,
//! `equals`, `hash`, `iterate`, `match_positional`) are the entry points used
//! by callers; each delegates to whatever behavior a record type carries.

mod errors;
mod interpreter;
mod method;
mod protocol;
mod record;
mod stack;
mod value;

pub use errors::{EvalError, EvalResult};
pub use method::{Function, Method, NativeFn};
pub use protocol::{compare, construct, equals, hash, iterate, match_positional, repr, Comparison};
pub use record::{Field, Instance, RecordType, RecordTypeBuilder};
pub use value::{BuiltinType, TypeRef, Value};
