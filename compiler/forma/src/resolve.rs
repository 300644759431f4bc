//! Field resolution across a record type's ancestry.

use forma_eval::{Field, RecordType};
use forma_ir::Name;
use rustc_hash::FxHashMap;

/// Ordered, deduplicated field list of `ty`.
///
/// Ancestors are visited base first. A field keeps the position at which it
/// was first introduced; a redeclaration further down only replaces its hint.
pub fn resolve_fields(ty: &RecordType) -> Vec<Field> {
    let mut lineage: Vec<&RecordType> = ty.ancestry().collect();
    lineage.reverse();

    let mut fields: Vec<Field> = Vec::new();
    let mut position: FxHashMap<Name, usize> = FxHashMap::default();
    for ancestor in lineage {
        for field in ancestor.declared_fields() {
            match position.get(&field.name) {
                Some(&i) => fields[i].hint = field.hint,
                None => {
                    position.insert(field.name, fields.len());
                    fields.push(field);
                }
            }
        }
    }
    fields
}
