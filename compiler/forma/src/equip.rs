//! Equipping record types with synthesized behaviors.

use std::sync::Arc;

use forma_eval::{Function, Method, RecordType};
use forma_ir::{BehaviorKind, Name};
use rayon::prelude::*;
use thiserror::Error;

use crate::cache::{ArityCache, TemplateError};
use crate::resolve::resolve_fields;
use crate::specialize::{specialize, SpecializeError};
use crate::template::MAX_FIELDS;
use crate::Options;

/// Failure to equip one record type. Nothing is attached when this is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("'{type_name}' has {count} fields; synthesized behaviors bind at most {max}")]
    TooManyFields {
        type_name: Name,
        count: usize,
        max: usize,
    },

    #[error("cannot bind fields of '{type_name}': {source}")]
    Specialize {
        type_name: Name,
        #[source]
        source: SpecializeError,
    },
}

/// Applies [`Options`] to record types using an [`ArityCache`].
#[derive(Clone, Copy, Debug)]
pub struct Equipper<'c> {
    options: Options,
    cache: &'c ArityCache,
}

impl Equipper<'static> {
    /// Equipper over the process-wide cache.
    pub fn new(options: Options) -> Self {
        Equipper {
            options,
            cache: ArityCache::global(),
        }
    }
}

impl Default for Equipper<'static> {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl<'c> Equipper<'c> {
    pub fn with_cache(options: Options, cache: &'c ArityCache) -> Self {
        Equipper { options, cache }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn cache(&self) -> &'c ArityCache {
        self.cache
    }

    /// Synthesize every enabled behavior `ty` does not define itself, attach
    /// them, and record the resolved field order as its `match_args`.
    ///
    /// Inherited behaviors do not suppress synthesis. Behaviors synthesized by
    /// an earlier call are rebuilt against the current field list.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %ty.name()))]
    pub fn equip(&self, ty: &Arc<RecordType>) -> Result<Arc<RecordType>, EquipError> {
        let fields = resolve_fields(ty);
        let names: Vec<Name> = fields.iter().map(|f| f.name).collect();
        check_field_count(ty.name(), names.len())?;

        let mut built: Vec<(BehaviorKind, Method)> = Vec::new();
        for kind in self.options.behaviors.kinds() {
            if ty.user_defines(kind) {
                tracing::trace!(%kind, "user-defined, skipping");
                continue;
            }
            let artifact = self.cache.compile_or_get(kind, names.len())?;
            let code = specialize(&artifact, &names).map_err(|source| EquipError::Specialize {
                type_name: ty.name(),
                source,
            })?;
            built.push((kind, Method::Compiled(Function::new(code))));
        }

        let synthesized = built.len();
        ty.attach_synthesized(built);
        ty.set_match_args(Arc::from(fields));
        tracing::debug!(fields = names.len(), synthesized, "equipped");
        Ok(Arc::clone(ty))
    }

    /// Equip a batch of types in parallel. Stops at the first error; types
    /// equipped before it stay equipped.
    pub fn equip_all(&self, types: &[Arc<RecordType>]) -> Result<(), EquipError> {
        types.par_iter().try_for_each(|ty| self.equip(ty).map(drop))
    }
}

fn check_field_count(type_name: Name, count: usize) -> Result<(), EquipError> {
    if count > MAX_FIELDS {
        return Err(EquipError::TooManyFields {
            type_name,
            count,
            max: MAX_FIELDS,
        });
    }
    Ok(())
}

/// Equip `ty` with the default behaviors through the process-wide cache.
pub fn equip(ty: &Arc<RecordType>) -> Result<Arc<RecordType>, EquipError> {
    Equipper::default().equip(ty)
}
