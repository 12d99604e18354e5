//! Argument resolution against direct values and the converter chain.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dynfunc::func::{DynFunc, DynValue, Param};

/// A declared input could not be satisfied from direct values or the chain.
///
/// This is a structural error: no satisfying assignment exists, regardless of
/// the values involved. It is never retried.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no value of type {type_name} is available for '{func}'")]
pub struct ResolutionError {
    pub func: String,
    pub type_name: &'static str,
}

/// Failure modes of [`resolve_args`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveFailure {
    /// No satisfying assignment exists.
    #[error(transparent)]
    Unresolvable(#[from] ResolutionError),
    /// A converter consulted during resolution failed at runtime.
    #[error(transparent)]
    Converter(anyhow::Error),
}

struct StoredValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// The pool of directly-available typed values for one resolution.
///
/// Values are keyed by their type; inserting a value of an already-present
/// type replaces it, which is how caller-supplied extras take precedence over
/// earlier entries.
#[derive(Default)]
pub struct ArgPool {
    values: HashMap<TypeId, StoredValue>,
}

impl ArgPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a typed value, replacing any existing value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(
            TypeId::of::<T>(),
            StoredValue {
                value: Arc::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    /// Insert an already-erased value produced by a converter.
    pub fn insert_dyn(&mut self, value: DynValue) {
        let (type_id, type_name, value) = value.into_erased();
        self.values.insert(type_id, StoredValue { value, type_name });
    }

    /// Move every value of `other` into `self`, replacing on collision.
    pub fn merge(&mut self, other: ArgPool) {
        self.values.extend(other.values);
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.values.contains_key(&type_id)
    }

    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|stored| stored.value.downcast_ref::<T>())
            .cloned()
    }

    /// Like [`ArgPool::get`], but an error when absent.
    pub fn expect<T: Clone + 'static>(&self) -> anyhow::Result<T> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!("missing resolved argument of type {}", type_name::<T>())
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolve every declared input of `func` into `pool`.
///
/// Inputs already present in the pool are used as-is. A missing input type is
/// derived by searching `chain` in registration order for a converter whose
/// output matches and whose own inputs are themselves satisfiable,
/// recursively. Derived values are memoized into the pool, each in-progress
/// type is tracked so cycles fail fast, and search depth is bounded by the
/// chain length, which guarantees termination.
pub fn resolve_args(
    func: &DynFunc,
    pool: &mut ArgPool,
    chain: &[DynFunc],
) -> Result<(), ResolveFailure> {
    for param in func.params() {
        resolve_param(*param, pool, chain, &mut Vec::new(), func.name(), 0)?;
    }
    Ok(())
}

fn resolve_param(
    param: Param,
    pool: &mut ArgPool,
    chain: &[DynFunc],
    in_progress: &mut Vec<TypeId>,
    root: &str,
    depth: usize,
) -> Result<(), ResolveFailure> {
    if pool.contains(param.type_id()) {
        return Ok(());
    }
    // Each derivation step consumes one converter, so any search deeper than
    // the chain itself cannot produce a new assignment.
    if depth >= chain.len() || in_progress.contains(&param.type_id()) {
        return Err(ResolutionError {
            func: root.to_string(),
            type_name: param.type_name(),
        }
        .into());
    }

    in_progress.push(param.type_id());
    let derived = derive(param, pool, chain, in_progress, root, depth);
    in_progress.pop();
    derived
}

fn derive(
    param: Param,
    pool: &mut ArgPool,
    chain: &[DynFunc],
    in_progress: &mut Vec<TypeId>,
    root: &str,
    depth: usize,
) -> Result<(), ResolveFailure> {
    // Earlier-registered converters take precedence: project-level entries
    // sit ahead of app-level ones, and the first satisfiable candidate wins.
    'candidates: for converter in chain {
        if converter.output().type_id() != param.type_id() {
            continue;
        }
        for input in converter.params() {
            match resolve_param(*input, pool, chain, in_progress, root, depth + 1) {
                Ok(()) => {}
                Err(ResolveFailure::Unresolvable(_)) => continue 'candidates,
                Err(err @ ResolveFailure::Converter(_)) => return Err(err),
            }
        }
        let value = converter
            .call_with(pool)
            .map_err(ResolveFailure::Converter)?;
        pool.insert_dyn(value);
        return Ok(());
    }

    Err(ResolutionError {
        func: root.to_string(),
        type_name: param.type_name(),
    }
    .into())
}
