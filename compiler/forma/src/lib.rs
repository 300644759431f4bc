//! Forma - equips record types with synthesized behaviors.
//!
//! A record type is an ordered list of named fields. [`equip`] gives it
//! positional construction, a `TypeName(field=value, ...)` display form and
//! field-wise equality (plus iteration and hashing when enabled in
//! [`Options`]), without anyone writing those bodies by hand.
//!
//! # Pipeline
//!
//! 1. [`resolve_fields`] walks the ancestry, base first, into one field list.
//! 2. [`TemplateLibrary`] renders each behavior over placeholder names
//!    `_0 .. _{n-1}`; it depends on the field count only.
//! 3. [`ArityCache`] compiles each `(behavior, field count)` once per process.
//! 4. [`specialize`] rebinds a cached artifact's placeholder names to the
//!    type's field names. No source is parsed or compiled again.
//! 5. [`Equipper`] attaches the result to the type, skipping behaviors the
//!    type defines itself.
//!
//! # Tracing
//!
//! Call [`init_tracing`] and set `RUST_LOG`, e.g. `RUST_LOG=forma=debug` to
//! see every compilation and equipped type, `RUST_LOG=forma=trace` to also see
//! cache hits and skipped user definitions.

mod cache;
mod equip;
mod options;
mod resolve;
mod specialize;
mod template;

use std::sync::Once;

pub use cache::{ArityCache, TemplateError};
pub use equip::{equip, EquipError, Equipper};
pub use options::Options;
pub use resolve::resolve_fields;
pub use specialize::{arity, specialize, SpecializeError};
pub use template::{placeholder, render, StandardTemplates, TemplateLibrary, MAX_FIELDS};

pub use forma_eval::{
    compare, construct, equals, hash, iterate, match_positional, repr, Comparison, EvalError,
    EvalResult, Field, Instance, Method, RecordType, RecordTypeBuilder, Value,
};
pub use forma_ir::{BehaviorKind, Behaviors, Name};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}
