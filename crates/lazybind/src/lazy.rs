//! Lazy, memoizing environment with cycle detection.
//!
//! [`LazyEnv`] lets a resolution pass ask for symbol values from the pass
//! itself, recursively, before any global dependency order is known. A
//! supertype hierarchy is the canonical case: it forms a directed acyclic
//! graph that must be processed in topological order, but the graph only
//! becomes known while resolving it. Instead of pre-sorting, each symbol is
//! paired with a deferred [`Completer`]; the first `get` runs the completer,
//! which may `get` other symbols and drive their completion bottom-up. The
//! result is cached, and a symbol whose completion requires its own value
//! is reported as a [`CycleError`].

use std::cell::RefCell;
use std::fmt;

use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

use crate::env::{Env, SymbolKey};
use crate::error::{CycleError, EnvError};

type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// A deferred value computation for one symbol, given access to the
/// environment it is being resolved in.
///
/// Completers may call [`Env::get`] on other symbols, which may trigger
/// further completions, nested arbitrarily deep. A completer's own failures
/// pass through `get` untouched; wrap them with [`EnvError::completer`].
pub trait Completer<S: SymbolKey, V> {
    /// Produce the value for `sym` in the given environment.
    fn complete(&self, env: &dyn Env<S, V>, sym: S) -> Result<V, EnvError<S>>;
}

impl<S, V, F> Completer<S, V> for F
where
    S: SymbolKey,
    F: Fn(&dyn Env<S, V>, S) -> Result<V, EnvError<S>>,
{
    fn complete(&self, env: &dyn Env<S, V>, sym: S) -> Result<V, EnvError<S>> {
        self(env, sym)
    }
}

/// An environment that computes each symbol's value on first demand.
///
/// Values are memoized: a completer runs at most once per environment
/// instance, no matter how many lookups (external or from other completers)
/// ask for its symbol. Resolution happens by plain call-stack recursion, so
/// recursion depth equals the longest dependency chain; unbounded chains
/// will exhaust the stack.
///
/// Single-threaded by construction. Cache and in-progress state live in
/// `RefCell`s owned by the environment, and completers only ever see the
/// bounded `&dyn Env` capability.
pub struct LazyEnv<S: SymbolKey, V> {
    /// Deferred value providers, fixed at construction.
    completers: FxHashMap<S, Box<dyn Completer<S, V>>>,
    /// Values that have already been computed. Append-only.
    cache: RefCell<FxHashMap<S, V>>,
    /// Symbols whose completion is on the active call chain, in discovery
    /// order, used to detect cycles and render them as a path.
    in_progress: RefCell<FxIndexSet<S>>,
}

impl<S: SymbolKey, V> LazyEnv<S, V> {
    /// Create an environment from a fixed completer table.
    pub fn new(completers: FxHashMap<S, Box<dyn Completer<S, V>>>) -> Self {
        Self {
            completers,
            cache: RefCell::new(FxHashMap::default()),
            in_progress: RefCell::new(FxIndexSet::default()),
        }
    }

    /// Start assembling a completer table entry by entry.
    pub fn builder() -> LazyEnvBuilder<S, V> {
        LazyEnvBuilder {
            completers: FxHashMap::default(),
        }
    }
}

impl<S: SymbolKey, V: Clone> Env<S, V> for LazyEnv<S, V> {
    fn get(&self, sym: S) -> Result<Option<V>, EnvError<S>> {
        if let Some(v) = self.cache.borrow().get(&sym) {
            return Ok(Some(v.clone()));
        }
        let Some(completer) = self.completers.get(&sym) else {
            // Not an error: this layer has no opinion on `sym`, the caller
            // may consult another environment.
            return Ok(None);
        };
        {
            let mut in_progress = self.in_progress.borrow_mut();
            if !in_progress.insert(sym) {
                let mut path: Vec<S> = in_progress.iter().copied().collect();
                path.push(sym);
                trace!(?sym, "completion cycle detected");
                return Err(CycleError::new(path).into());
            }
        }
        // Cleared on every exit path (drop guard), so a completer failure
        // leaves the environment usable for unrelated symbols. The failed
        // symbol stays uncached.
        let guard = InProgressGuard {
            in_progress: &self.in_progress,
            sym,
        };
        trace!(?sym, "completing");
        let value = completer.complete(self, sym)?;
        drop(guard);
        self.cache.borrow_mut().insert(sym, value.clone());
        Ok(Some(value))
    }
}

impl<S: SymbolKey, V> fmt::Debug for LazyEnv<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEnv")
            .field("completers", &self.completers.len())
            .field("cached", &self.cache.borrow().len())
            .field("in_progress", &*self.in_progress.borrow())
            .finish()
    }
}

/// Removes the in-progress marker for `sym` when dropped.
struct InProgressGuard<'a, S: SymbolKey> {
    in_progress: &'a RefCell<FxIndexSet<S>>,
    sym: S,
}

impl<S: SymbolKey> Drop for InProgressGuard<'_, S> {
    fn drop(&mut self) {
        // shift_remove keeps discovery order for any outer frames.
        self.in_progress.borrow_mut().shift_remove(&self.sym);
    }
}

/// Builder assembling the symbol-to-completer table for a [`LazyEnv`].
pub struct LazyEnvBuilder<S: SymbolKey, V> {
    completers: FxHashMap<S, Box<dyn Completer<S, V>>>,
}

impl<S: SymbolKey, V> LazyEnvBuilder<S, V> {
    /// Register the completer for `sym`, replacing any previous one.
    ///
    /// Takes the closure shape directly so call sites get full signature
    /// inference; a hand-written [`Completer`] type goes through
    /// [`LazyEnvBuilder::boxed`] or [`LazyEnv::new`] instead.
    pub fn completer<F>(mut self, sym: S, completer: F) -> Self
    where
        F: Fn(&dyn Env<S, V>, S) -> Result<V, EnvError<S>> + 'static,
    {
        self.completers.insert(sym, Box::new(completer));
        self
    }

    /// Register an already-boxed completer for `sym`.
    pub fn boxed(mut self, sym: S, completer: Box<dyn Completer<S, V>>) -> Self {
        self.completers.insert(sym, completer);
        self
    }

    pub fn build(self) -> LazyEnv<S, V> {
        LazyEnv::new(self.completers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct ClassId(u32);

    #[test]
    fn test_cache_and_in_progress_never_overlap() {
        // While A's completer runs, A is in progress and not cached; after
        // `get` returns, A is cached and no longer in progress.
        let env: LazyEnv<ClassId, u32> = LazyEnv::builder()
            .completer(ClassId(0), |env, _| {
                assert!(env.get(ClassId(0)).is_err());
                Ok(1)
            })
            .build();
        // The nested get above sees A in progress and errs, but the outer
        // call still completes normally.
        assert_eq!(env.get(ClassId(0)).unwrap(), Some(1));
        assert!(env.in_progress.borrow().is_empty());
        assert_eq!(env.cache.borrow().len(), 1);
    }

    #[test]
    fn test_in_progress_cleared_after_completer_error() {
        let env: LazyEnv<ClassId, u32> = LazyEnv::builder()
            .completer(ClassId(0), |_, _| Err(EnvError::completer("no declaration")))
            .build();
        assert!(env.get(ClassId(0)).is_err());
        assert!(env.in_progress.borrow().is_empty());
        assert!(env.cache.borrow().is_empty());
    }
}
