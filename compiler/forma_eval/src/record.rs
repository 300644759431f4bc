//! Record types and their instances.
//!
//! A `RecordType` is the runtime form of a record declaration: a name, an
//! optional parent, its own declared fields, and a table of behaviors defined
//! directly on it. Behaviors are looked up along the ancestry, but only the
//! type's own table counts when deciding whether a behavior is "already defined".
//! Entries installed by the synthesis engine are flagged so that equipping the
//! type again replaces them instead of mistaking them for user definitions.

use std::fmt;
use std::sync::Arc;

use forma_ir::{BehaviorKind, Behaviors, Name};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::method::Method;
use crate::{EvalResult, Value};

/// A declared field: identity is the name, the hint is documentation only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Name,
    pub hint: Name,
}

impl Field {
    pub fn new(name: &str, hint: &str) -> Self {
        Field {
            name: Name::intern(name),
            hint: Name::intern(hint),
        }
    }
}

pub struct RecordType {
    name: Name,
    parent: Option<Arc<RecordType>>,
    declared: RwLock<Vec<Field>>,
    methods: RwLock<FxHashMap<BehaviorKind, Method>>,
    synthesized: RwLock<Behaviors>,
    match_args: RwLock<Option<Arc<[Field]>>>,
}

/// Builder for record declarations.
pub struct RecordTypeBuilder {
    name: Name,
    parent: Option<Arc<RecordType>>,
    declared: Vec<Field>,
    methods: FxHashMap<BehaviorKind, Method>,
}

impl RecordTypeBuilder {
    #[must_use]
    pub fn parent(mut self, parent: &Arc<RecordType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Declare a field. Declaring the same name twice on one type keeps the
    /// first position and takes the later hint.
    #[must_use]
    pub fn field(mut self, name: &str, hint: &str) -> Self {
        upsert_field(&mut self.declared, Field::new(name, hint));
        self
    }

    /// Define a behavior directly on this type with a native closure.
    #[must_use]
    pub fn method<F>(mut self, kind: BehaviorKind, f: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.methods.insert(kind, Method::native(f));
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        Arc::new(RecordType {
            name: self.name,
            parent: self.parent,
            declared: RwLock::new(self.declared),
            methods: RwLock::new(self.methods),
            synthesized: RwLock::new(Behaviors::empty()),
            match_args: RwLock::new(None),
        })
    }
}

fn upsert_field(fields: &mut Vec<Field>, field: Field) {
    match fields.iter_mut().find(|f| f.name == field.name) {
        Some(existing) => existing.hint = field.hint,
        None => fields.push(field),
    }
}

impl RecordType {
    pub fn builder(name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: Name::intern(name),
            parent: None,
            declared: Vec::new(),
            methods: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn parent(&self) -> Option<&Arc<RecordType>> {
        self.parent.as_ref()
    }

    /// This type followed by its ancestors, most derived first.
    pub fn ancestry(&self) -> impl Iterator<Item = &RecordType> {
        std::iter::successors(Some(self), |ty| ty.parent.as_deref())
    }

    /// Whether `self` is `other` or descends from it.
    pub fn is_subtype_of(&self, other: &RecordType) -> bool {
        self.ancestry().any(|ty| std::ptr::eq(ty, other))
    }

    /// Fields declared directly on this type, in declaration order.
    pub fn declared_fields(&self) -> Vec<Field> {
        self.declared.read().clone()
    }

    /// Declare (or re-hint) a field after the type was built. Already
    /// synthesized behaviors are unaffected until the type is equipped again.
    pub fn annotate(&self, name: &str, hint: &str) {
        upsert_field(&mut self.declared.write(), Field::new(name, hint));
    }

    /// Whether `kind` is defined directly on this type (inherited ones don't count).
    pub fn defines(&self, kind: BehaviorKind) -> bool {
        self.methods.read().contains_key(&kind)
    }

    /// Whether the own definition of `kind` was installed by synthesis.
    pub fn is_synthesized(&self, kind: BehaviorKind) -> bool {
        self.synthesized.read().enables(kind)
    }

    /// Defined directly on this type by the user, not by synthesis.
    pub fn user_defines(&self, kind: BehaviorKind) -> bool {
        self.defines(kind) && !self.is_synthesized(kind)
    }

    /// The behavior defined directly on this type, if any.
    pub fn own_method(&self, kind: BehaviorKind) -> Option<Method> {
        self.methods.read().get(&kind).cloned()
    }

    /// The nearest definition of `kind` along the ancestry.
    pub fn lookup(&self, kind: BehaviorKind) -> Option<Method> {
        self.ancestry().find_map(|ty| ty.own_method(kind))
    }

    /// Attach a user behavior to this type, replacing any own definition.
    pub fn attach(&self, kind: BehaviorKind, method: Method) {
        let mut methods = self.methods.write();
        methods.insert(kind, method);
        self.synthesized.write().remove(kind.flag());
    }

    /// Install a batch of synthesized behaviors under one write lock.
    pub fn attach_synthesized(&self, behaviors: impl IntoIterator<Item = (BehaviorKind, Method)>) {
        let mut methods = self.methods.write();
        let mut synthesized = self.synthesized.write();
        for (kind, method) in behaviors {
            methods.insert(kind, method);
            synthesized.insert(kind.flag());
        }
    }

    /// Define a behavior with a native closure after the type was built.
    pub fn define<F>(&self, kind: BehaviorKind, f: F)
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.attach(kind, Method::native(f));
    }

    /// Resolved field order recorded when the type was equipped.
    pub fn match_args(&self) -> Option<Arc<[Field]>> {
        self.match_args.read().clone()
    }

    pub fn set_match_args(&self, fields: Arc<[Field]>) {
        *self.match_args.write() = Some(fields);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<BehaviorKind> = self.methods.read().keys().copied().collect();
        kinds.sort();
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .field("declared", &*self.declared.read())
            .field("behaviors", &kinds)
            .field("synthesized", &*self.synthesized.read())
            .finish()
    }
}

/// An instance of a record type. Attributes are set by the Construct behavior
/// (or directly) and looked up by name.
pub struct Instance {
    ty: Arc<RecordType>,
    attrs: RwLock<FxHashMap<Name, Value>>,
}

impl Instance {
    pub(crate) fn new(ty: Arc<RecordType>) -> Self {
        Instance {
            ty,
            attrs: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    pub fn get_attr(&self, name: Name) -> Option<Value> {
        self.attrs.read().get(&name).cloned()
    }

    /// Convenience lookup by string.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_attr(Name::intern(name))
    }

    pub fn set_attr(&self, name: Name, value: Value) {
        self.attrs.write().insert(name, value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance at {:p}", self.ty.name, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ancestry_runs_most_derived_first() {
        let a = RecordType::builder("A").build();
        let b = RecordType::builder("B").parent(&a).build();
        let c = RecordType::builder("C").parent(&b).build();
        let names: Vec<&str> = c.ancestry().map(|t| t.name().as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert!(c.is_subtype_of(&a));
        assert!(!a.is_subtype_of(&c));
    }

    #[test]
    fn redeclared_field_keeps_position() {
        let ty = RecordType::builder("P")
            .field("x", "int")
            .field("y", "int")
            .field("x", "float")
            .build();
        assert_eq!(
            ty.declared_fields(),
            vec![Field::new("x", "float"), Field::new("y", "int")]
        );
        ty.annotate("z", "str");
        assert_eq!(ty.declared_fields().len(), 3);
    }

    #[test]
    fn own_definitions_vs_inherited_lookup() {
        let base = RecordType::builder("Base")
            .method(BehaviorKind::Display, |_| Ok(Value::string("base")))
            .build();
        let derived = RecordType::builder("Derived").parent(&base).build();
        assert!(base.defines(BehaviorKind::Display));
        assert!(!derived.defines(BehaviorKind::Display));
        assert!(derived.lookup(BehaviorKind::Display).is_some());
        assert!(derived.lookup(BehaviorKind::Equality).is_none());
    }

    #[test]
    fn synthesized_entries_are_not_user_definitions() {
        let ty = RecordType::builder("T").build();
        ty.attach_synthesized([(
            BehaviorKind::Display,
            Method::native(|_| Ok(Value::string("t"))),
        )]);
        assert!(ty.defines(BehaviorKind::Display));
        assert!(ty.is_synthesized(BehaviorKind::Display));
        assert!(!ty.user_defines(BehaviorKind::Display));

        ty.define(BehaviorKind::Display, |_| Ok(Value::string("mine")));
        assert!(ty.user_defines(BehaviorKind::Display));
    }

    #[test]
    fn attributes_round_trip() {
        let ty = RecordType::builder("Cell").field("v", "int").build();
        let inst = Instance::new(ty);
        assert_eq!(inst.get("v"), None);
        inst.set_attr(Name::intern("v"), Value::int(9));
        assert_eq!(inst.get("v"), Some(Value::int(9)));
    }
}
