//! Stack growth for recursive evaluation.
//!
//! Comparing, displaying or hashing a record re-enters the interpreter for
//! every nested record, so a long chain of records nests Rust frames just as
//! deeply. Each interpreter entry goes through [`ensure_sufficient_stack`].

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    let _ = (RED_ZONE, STACK_PER_RECURSION);
    f()
}
