//! Forma IR - shared vocabulary for the record synthesis engine.
//!
//! This crate provides:
//! - `Name`: compact interned identifiers backed by a process-global interner
//! - `BehaviorKind` / `Behaviors`: the behaviors a record type can be equipped with
//! - `Span`: byte ranges into template source text
//!
//! Every other forma crate depends on this one; it depends on nothing forma-specific.

mod behavior;
mod interner;
mod name;
mod span;

pub use behavior::{BehaviorKind, Behaviors, ParseBehaviorError};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::Span;
