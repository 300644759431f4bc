//! Process-wide cache of compiled templates, keyed by behavior and arity.
//!
//! Entries are published only after they compile and pass the placeholder
//! layout check. Compilation runs outside any map lock: two threads missing on
//! the same key both compile, and the later insert wins. Artifacts are
//! immutable and equivalent, so either outcome is fine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use forma_compile::{CodeObject, CompileError};
use forma_ir::BehaviorKind;
use thiserror::Error;

use crate::specialize::{self, SpecializeError};
use crate::template::{StandardTemplates, TemplateLibrary};

/// A template that could not be turned into a usable artifact. Indicates a
/// defect in the template library, never in the record type being equipped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("{kind} template for {arity} field(s) does not compile: {source}")]
    Compile {
        kind: BehaviorKind,
        arity: usize,
        #[source]
        source: CompileError,
    },

    #[error("{kind} template for {arity} field(s) binds {found} field(s)")]
    Arity {
        kind: BehaviorKind,
        arity: usize,
        found: usize,
    },

    #[error("{kind} template for {arity} field(s) is unusable: {source}")]
    Layout {
        kind: BehaviorKind,
        arity: usize,
        #[source]
        source: SpecializeError,
    },
}

static GLOBAL: LazyLock<ArityCache> = LazyLock::new(ArityCache::new);

pub struct ArityCache {
    library: Box<dyn TemplateLibrary>,
    artifacts: DashMap<(BehaviorKind, usize), Arc<CodeObject>>,
    compilations: AtomicUsize,
}

impl ArityCache {
    /// An empty cache over [`StandardTemplates`].
    pub fn new() -> Self {
        Self::with_library(StandardTemplates)
    }

    pub fn with_library(library: impl TemplateLibrary + 'static) -> Self {
        ArityCache {
            library: Box::new(library),
            artifacts: DashMap::new(),
            compilations: AtomicUsize::new(0),
        }
    }

    /// The cache shared by every record type in the process.
    pub fn global() -> &'static ArityCache {
        &GLOBAL
    }

    /// The artifact for `(kind, arity)`, compiling it on first request.
    pub fn compile_or_get(
        &self,
        kind: BehaviorKind,
        arity: usize,
    ) -> Result<Arc<CodeObject>, TemplateError> {
        if let Some(code) = self.artifacts.get(&(kind, arity)) {
            tracing::trace!(%kind, arity, "arity cache hit");
            return Ok(Arc::clone(&code));
        }
        let code = Arc::new(self.compile(kind, arity)?);
        self.artifacts.insert((kind, arity), Arc::clone(&code));
        Ok(code)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn compile(&self, kind: BehaviorKind, arity: usize) -> Result<CodeObject, TemplateError> {
        let source = self.library.source(kind, arity);
        let code = forma_compile::compile(&source)
            .map_err(|err| TemplateError::Compile {
                kind,
                arity,
                source: err,
            })?;
        match specialize::arity(&code) {
            Ok(found) if found == arity => {}
            Ok(found) => return Err(TemplateError::Arity { kind, arity, found }),
            Err(source) => return Err(TemplateError::Layout { kind, arity, source }),
        }
        let count = self.compilations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(ops = code.ops().len(), compilations = count, "compiled template");
        Ok(code)
    }

    /// The cached artifact, without compiling.
    pub fn get(&self, kind: BehaviorKind, arity: usize) -> Option<Arc<CodeObject>> {
        self.artifacts.get(&(kind, arity)).map(|code| Arc::clone(&code))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Successful template compilations so far. Exceeds `len()` only when
    /// threads raced on the same key.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

impl Default for ArityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArityCache")
            .field("entries", &self.len())
            .field("compilations", &self.compilations())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Broken;

    impl TemplateLibrary for Broken {
        fn source(&self, kind: BehaviorKind, arity: usize) -> String {
            match kind {
                BehaviorKind::Display => "fn display(self) { return concat(".to_owned(),
                _ => StandardTemplates.source(kind, arity),
            }
        }
    }

    /// Ignores the requested arity.
    struct Fixed;

    impl TemplateLibrary for Fixed {
        fn source(&self, kind: BehaviorKind, _arity: usize) -> String {
            StandardTemplates.source(kind, 1)
        }
    }

    #[test]
    fn compiles_once_per_key() {
        let cache = ArityCache::new();
        let first = cache.compile_or_get(BehaviorKind::Construct, 2);
        let second = cache.compile_or_get(BehaviorKind::Construct, 2);
        match (first, second) {
            (Ok(a), Ok(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(cache.compilations(), 1);
        assert_eq!(cache.len(), 1);

        assert!(cache.compile_or_get(BehaviorKind::Construct, 3).is_ok());
        assert!(cache.compile_or_get(BehaviorKind::Display, 2).is_ok());
        assert_eq!(cache.compilations(), 3);
        assert!(cache.get(BehaviorKind::Display, 2).is_some());
        assert!(cache.get(BehaviorKind::Equality, 2).is_none());
    }

    #[test]
    fn compile_failures_are_not_cached() {
        let cache = ArityCache::with_library(Broken);
        assert!(matches!(
            cache.compile_or_get(BehaviorKind::Display, 2),
            Err(TemplateError::Compile { arity: 2, .. })
        ));
        assert!(cache.is_empty());
        assert_eq!(cache.compilations(), 0);
        assert!(cache.compile_or_get(BehaviorKind::Construct, 2).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn wrong_arity_templates_are_rejected() {
        let cache = ArityCache::with_library(Fixed);
        assert!(cache.compile_or_get(BehaviorKind::Equality, 1).is_ok());
        assert!(matches!(
            cache.compile_or_get(BehaviorKind::Equality, 2),
            Err(TemplateError::Arity { arity: 2, found: 1, .. })
        ));
        assert_eq!(cache.len(), 1);
    }
}
