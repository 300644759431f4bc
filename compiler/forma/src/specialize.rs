//! Binding placeholder artifacts to concrete field names.
//!
//! Compiled templates refer to fields only through their `names` table (and,
//! for Construct, through parameter names in `varnames`). Every placeholder
//! `_0 .. _{n-1}` sits in one contiguous run of each table, in index order, so
//! specialization is a slice copy over a clone of those tables. Bytecode,
//! constants and flags are shared untouched.

use std::ops::Range;

use forma_compile::{CodeObject, ReplaceNamesError};
use forma_ir::Name;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpecializeError {
    #[error("artifact `{function}` binds {expected} field(s), got {found}")]
    ArityMismatch {
        function: Name,
        expected: usize,
        found: usize,
    },

    /// Placeholders out of order, interleaved with other names, or a
    /// `varnames` run that does not match the `names` run.
    #[error("artifact `{function}` has a malformed placeholder run in `{table}`")]
    Layout {
        function: Name,
        table: &'static str,
    },

    #[error(transparent)]
    Rewrite(#[from] ReplaceNamesError),
}

/// Copy of `artifact` with placeholder `_i` replaced by `fields[i]`.
pub fn specialize(artifact: &CodeObject, fields: &[Name]) -> Result<CodeObject, SpecializeError> {
    let names_run = placeholder_run(artifact, artifact.names(), "names")?;
    let arity = names_run.as_ref().map_or(0, |run| run.len());
    if fields.len() != arity {
        return Err(SpecializeError::ArityMismatch {
            function: artifact.name(),
            expected: arity,
            found: fields.len(),
        });
    }
    let vars_run = placeholder_run(artifact, artifact.varnames(), "varnames")?;
    if vars_run.as_ref().is_some_and(|run| run.len() != arity) {
        return Err(SpecializeError::Layout {
            function: artifact.name(),
            table: "varnames",
        });
    }

    let names = rebind(artifact.names(), names_run, fields);
    let varnames = rebind(artifact.varnames(), vars_run, fields);
    Ok(artifact.replace_names(names, varnames)?)
}

/// Number of fields a placeholder artifact binds.
pub fn arity(artifact: &CodeObject) -> Result<usize, SpecializeError> {
    Ok(placeholder_run(artifact, artifact.names(), "names")?.map_or(0, |run| run.len()))
}

fn rebind(table: &[Name], run: Option<Range<usize>>, fields: &[Name]) -> Vec<Name> {
    let mut out = table.to_vec();
    if let Some(run) = run {
        out[run].copy_from_slice(fields);
    }
    out
}

/// Position of `_0 .. _{n-1}` in `table`, `None` when it holds no placeholder.
fn placeholder_run(
    artifact: &CodeObject,
    table: &[Name],
    which: &'static str,
) -> Result<Option<Range<usize>>, SpecializeError> {
    let found: Vec<(usize, usize)> = table
        .iter()
        .enumerate()
        .filter_map(|(pos, name)| placeholder_index(name.as_str()).map(|index| (pos, index)))
        .collect();
    let Some(&(start, _)) = found.first() else {
        return Ok(None);
    };
    for (offset, &(pos, index)) in found.iter().enumerate() {
        if pos != start + offset || index != offset {
            return Err(SpecializeError::Layout {
                function: artifact.name(),
                table: which,
            });
        }
    }
    Ok(Some(start..start + found.len()))
}

/// `Some(i)` for the canonical spelling `_i`.
fn placeholder_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('_')?;
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if canonical {
        digits.parse().ok()
    } else {
        None
    }
}
