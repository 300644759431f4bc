//! Callable behaviors.

use std::fmt;
use std::sync::Arc;

use forma_compile::CodeObject;

use crate::{interpreter, EvalResult, Value};

/// Native behavior body: receives the receiver followed by the arguments.
pub type NativeFn = dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync;

/// A behavior attached to a record type.
#[derive(Clone)]
pub enum Method {
    /// Bytecode produced by the synthesis engine.
    Compiled(Function),
    /// User-defined Rust closure.
    Native(Arc<NativeFn>),
}

impl Method {
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Method::Native(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        match self {
            Method::Compiled(function) => function.call(args),
            Method::Native(f) => f(args),
        }
    }

    /// The bytecode behind a compiled behavior.
    pub fn code(&self) -> Option<&CodeObject> {
        match self {
            Method::Compiled(function) => Some(function.code()),
            Method::Native(_) => None,
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Compiled(function) => write!(f, "Compiled({})", function.code().name()),
            Method::Native(_) => write!(f, "Native"),
        }
    }
}

/// An executable code object.
#[derive(Clone, Debug)]
pub struct Function {
    code: Arc<CodeObject>,
}

impl Function {
    pub fn new(code: CodeObject) -> Self {
        Function {
            code: Arc::new(code),
        }
    }

    pub fn code(&self) -> &CodeObject {
        &self.code
    }

    /// Run the code with `args` bound to its parameters, receiver first.
    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        interpreter::run(&self.code, args)
    }
}
