//! Eager map-backed environment.

use rustc_hash::FxHashMap;

use crate::env::{Env, SymbolKey};
use crate::error::EnvError;

/// An environment over values that have already been computed, typically
/// the output of a previous pass. Lookups never fail.
#[derive(Debug, Clone)]
pub struct SimpleEnv<S: SymbolKey, V> {
    values: FxHashMap<S, V>,
}

impl<S: SymbolKey, V> Default for SimpleEnv<S, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SymbolKey, V> SimpleEnv<S, V> {
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }

    /// Bind `sym` to `value`, returning the previous binding if any.
    pub fn insert(&mut self, sym: S, value: V) -> Option<V> {
        self.values.insert(sym, value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: SymbolKey, V> From<FxHashMap<S, V>> for SimpleEnv<S, V> {
    fn from(values: FxHashMap<S, V>) -> Self {
        Self { values }
    }
}

impl<S: SymbolKey, V: Clone> Env<S, V> for SimpleEnv<S, V> {
    fn get(&self, sym: S) -> Result<Option<V>, EnvError<S>> {
        Ok(self.values.get(&sym).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct ClassId(u32);

    #[test]
    fn test_simple_env_lookup() {
        let mut env = SimpleEnv::new();
        env.insert(ClassId(0), "object");
        assert_eq!(env.get(ClassId(0)).unwrap(), Some("object"));
        assert_eq!(env.get(ClassId(1)).unwrap(), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut env = SimpleEnv::new();
        assert_eq!(env.insert(ClassId(0), 1), None);
        assert_eq!(env.insert(ClassId(0), 2), Some(1));
        assert_eq!(env.len(), 1);
    }
}
