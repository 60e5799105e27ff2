//! Layered lookup composition.

use crate::env::{Env, SymbolKey};
use crate::error::EnvError;

/// A stack of environments consulted newest-first.
///
/// Lets a pass refine an earlier pass's bindings: start from a base layer
/// (say, a [`crate::SimpleEnv`] of already-resolved symbols), append the
/// current pass's [`crate::LazyEnv`], and look symbols up through the
/// stack. The first layer with an opinion wins; absence falls through;
/// errors short-circuit.
///
/// Layers are borrowed, not owned, so one environment can participate in
/// several compositions.
pub struct CompoundEnv<'e, S: SymbolKey, V> {
    layers: Vec<&'e dyn Env<S, V>>,
}

impl<'e, S: SymbolKey, V> CompoundEnv<'e, S, V> {
    /// Create a composition with `base` as its only layer.
    pub fn of(base: &'e dyn Env<S, V>) -> Self {
        Self { layers: vec![base] }
    }

    /// Add a layer that shadows everything added before it.
    pub fn append(mut self, layer: &'e dyn Env<S, V>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl<S: SymbolKey, V> Env<S, V> for CompoundEnv<'_, S, V> {
    fn get(&self, sym: S) -> Result<Option<V>, EnvError<S>> {
        for layer in self.layers.iter().rev() {
            if let Some(v) = layer.get(sym)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimpleEnv;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct ClassId(u32);

    #[test]
    fn test_later_layer_shadows_base() {
        let mut base = SimpleEnv::new();
        base.insert(ClassId(0), "base");
        base.insert(ClassId(1), "base only");
        let mut top = SimpleEnv::new();
        top.insert(ClassId(0), "top");

        let env = CompoundEnv::of(&base).append(&top);
        assert_eq!(env.get(ClassId(0)).unwrap(), Some("top"));
        assert_eq!(env.get(ClassId(1)).unwrap(), Some("base only"));
        assert_eq!(env.get(ClassId(2)).unwrap(), None);
    }
}
