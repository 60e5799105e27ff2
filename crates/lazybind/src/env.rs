//! The lookup interface shared by every environment implementation.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::EnvError;

/// Key identifying a bound entity (a class, a module, a type alias).
///
/// Environments treat keys as opaque identities: they are copied, compared,
/// and hashed, never constructed or inspected. `Debug` is required only so
/// a dependency cycle can be rendered as a readable path.
pub trait SymbolKey: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> SymbolKey for T {}

/// Read-only lookup over symbol-to-value bindings.
///
/// `Ok(None)` means this environment has no opinion on the symbol; callers
/// are free to consult another layer (see [`crate::CompoundEnv`]). Absence
/// is never an error. Errors are reserved for lookups that were understood
/// but failed, such as a dependency cycle discovered by [`crate::LazyEnv`].
pub trait Env<S: SymbolKey, V> {
    /// Look up the value bound to `sym`.
    fn get(&self, sym: S) -> Result<Option<V>, EnvError<S>>;
}
