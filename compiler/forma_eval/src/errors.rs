//! Evaluation errors.

use forma_ir::Name;
use thiserror::Error;

/// Result alias used throughout the runtime.
pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Call with the wrong number of positional arguments. `missing` holds the
    /// parameter names that received no value.
    #[error("{}", argument_count_message(.function, .expected, .found, .missing))]
    ArgumentCount {
        function: Name,
        expected: usize,
        found: usize,
        missing: Vec<Name>,
    },

    #[error("'{type_name}' object has no attribute '{attr}'")]
    NoAttribute { type_name: String, attr: Name },

    #[error("cannot set attribute '{attr}' on '{type_name}' value")]
    ReadOnlyAttribute { type_name: String, attr: Name },

    #[error("'{0}' object is not iterable")]
    NotIterable(String),

    /// A behavior returned a value of the wrong shape.
    #[error("{behavior} of '{type_name}' returned {found}, expected {expected}")]
    BadReturn {
        behavior: &'static str,
        type_name: String,
        expected: &'static str,
        found: String,
    },

    #[error("{type_name}() accepts {allowed} positional sub-pattern(s) ({found} given)")]
    TooManyPositional {
        type_name: String,
        allowed: usize,
        found: usize,
    },

    /// Bytecode referenced a missing slot or ran off its end.
    #[error("malformed code in `{function}`: {detail}")]
    MalformedCode { function: Name, detail: String },

    /// Error raised by a user-defined native behavior.
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}

fn argument_count_message(
    function: &Name,
    expected: &usize,
    found: &usize,
    missing: &[Name],
) -> String {
    let (expected, found) = (*expected, *found);
    if missing.is_empty() {
        return format!(
            "{function}() takes {expected} positional argument{} but {found} {} given",
            plural(expected),
            if found == 1 { "was" } else { "were" }
        );
    }
    let quoted: Vec<String> = missing.iter().map(|n| format!("'{n}'")).collect();
    format!(
        "{function}() missing {} required positional argument{}: {}",
        missing.len(),
        plural(missing.len()),
        quoted.join(", ")
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn too_many_arguments_message() {
        let err = EvalError::ArgumentCount {
            function: Name::intern("construct"),
            expected: 3,
            found: 4,
            missing: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "construct() takes 3 positional arguments but 4 were given"
        );
    }

    #[test]
    fn missing_arguments_message() {
        let err = EvalError::ArgumentCount {
            function: Name::intern("construct"),
            expected: 3,
            found: 1,
            missing: vec![Name::intern("x"), Name::intern("y")],
        };
        assert_eq!(
            err.to_string(),
            "construct() missing 2 required positional arguments: 'x', 'y'"
        );
    }
}
