//! Behavior templates.
//!
//! A template is the source of one behavior written against placeholder field
//! names `_0 .. _{n-1}`. It depends on the arity alone, so one compiled
//! template serves every record type with that many fields.
//!
//! Compiled tables index with `u16`, which caps a record at [`MAX_FIELDS`].
//! Display groups its `concat` arguments so it reaches the same cap as the
//! other behaviors.

use forma_ir::BehaviorKind;

/// Most fields a synthesized behavior can bind: one parameter slot per field
/// after `self`, and one tuple element per field.
pub const MAX_FIELDS: usize = 65_535;

/// Fields per nested `concat` in Display; keeps each call's argument count
/// well under the `u16` limit.
const DISPLAY_GROUP: usize = 1024;

/// Source of behavior templates, keyed by kind and arity.
///
/// Implementations must be deterministic: the same `(kind, arity)` always
/// yields the same text, and only placeholder names may stand for fields.
pub trait TemplateLibrary: Send + Sync {
    fn source(&self, kind: BehaviorKind, arity: usize) -> String;
}

/// The built-in templates.
#[derive(Copy, Clone, Debug, Default)]
pub struct StandardTemplates;

impl TemplateLibrary for StandardTemplates {
    fn source(&self, kind: BehaviorKind, arity: usize) -> String {
        let names: Vec<String> = (0..arity).map(placeholder).collect();
        render(kind, &names)
    }
}

/// Placeholder name for field position `index`.
pub fn placeholder(index: usize) -> String {
    format!("_{index}")
}

/// Render `kind` against the given field names, in order.
///
/// [`StandardTemplates`] renders with placeholders; rendering with real names
/// gives the source a behavior would have if written out by hand.
pub fn render<S: AsRef<str>>(kind: BehaviorKind, fields: &[S]) -> String {
    let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
    match kind {
        BehaviorKind::Construct => construct(&fields),
        BehaviorKind::Display => display(&fields),
        BehaviorKind::Equality => equality(&fields),
        BehaviorKind::Iteration => iteration(&fields),
        BehaviorKind::Hashing => hashing(&fields),
    }
}

fn construct(fields: &[&str]) -> String {
    let params: String = fields.iter().map(|f| format!(", {f}")).collect();
    let body: String = fields.iter().map(|f| format!(" self.{f} = {f};")).collect();
    format!("fn construct(self{params}) {{{body} }}")
}

fn display(fields: &[&str]) -> String {
    const SEP: &str = ", \", \", ";
    let groups: Vec<String> = fields
        .chunks(DISPLAY_GROUP)
        .map(|group| {
            let items: Vec<String> = group
                .iter()
                .map(|f| format!("nameof({f}), \"=\", repr(self.{f})"))
                .collect();
            items.join(SEP)
        })
        .collect();
    let inner = match groups.as_slice() {
        [] => String::new(),
        [only] => format!("{only}, "),
        many => {
            let nested: Vec<String> = many.iter().map(|g| format!("concat({g})")).collect();
            format!("{}, ", nested.join(SEP))
        }
    };
    format!("fn display(self) {{ return concat(typename(self), \"(\", {inner}\")\"); }}")
}

fn equality(fields: &[&str]) -> String {
    let mine = attr_tuple("self", fields);
    let theirs = attr_tuple("other", fields);
    format!(
        "fn eq(self, other) {{ if type(self) is type(other) {{ return {mine} == {theirs}; }} return NotApplicable; }}"
    )
}

fn iteration(fields: &[&str]) -> String {
    let body: String = fields.iter().map(|f| format!(" yield self.{f};")).collect();
    format!("gen fn iter(self) {{{body} }}")
}

fn hashing(fields: &[&str]) -> String {
    format!("fn hash(self) {{ return hash({}); }}", attr_tuple("self", fields))
}

/// `(recv.a, recv.b,)`, or `()` for no fields.
fn attr_tuple(receiver: &str, fields: &[&str]) -> String {
    if fields.is_empty() {
        return "()".to_owned();
    }
    let items: String = fields.iter().map(|f| format!("{receiver}.{f}, ")).collect();
    format!("({})", items.trim_end_matches(' '))
}
