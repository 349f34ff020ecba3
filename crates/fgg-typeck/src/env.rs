//! Typing contexts.
//!
//! `Delta` maps in-scope type parameters to their bounds and `Gamma` maps
//! variables to their types. Both are persistent: `bind` returns an extended
//! copy and never touches the receiver, so sibling derivations can't observe
//! each other's bindings.

use rustc_hash::FxHashMap;

use fgg_syntax::{Type, TypeFormal};

use crate::error::TypeError;

#[derive(Clone, Debug, Default)]
pub struct Env {
    bindings: FxHashMap<String, Type>,
}

/// Bounding context: type parameter -> upper bound.
pub type Delta = Env;

/// Value context: variable -> type.
pub type Gamma = Env;

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// A copy of this environment with `name` bound to `ty`. An existing
    /// binding of the same name is shadowed in the copy.
    pub fn bind(&self, name: impl Into<String>, ty: Type) -> Env {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.into(), ty);
        Env { bindings }
    }

    /// A copy of this environment extended with every pair of `pairs`.
    pub fn bind_all(&self, pairs: impl IntoIterator<Item = (String, Type)>) -> Env {
        let mut bindings = self.bindings.clone();
        bindings.extend(pairs);
        Env { bindings }
    }

    /// Extend a bounding context with type formals.
    pub fn bind_formals(&self, formals: &[TypeFormal]) -> Env {
        self.bind_all(formals.iter().map(|f| (f.name.clone(), f.bound.clone())))
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.bindings.get(name)
    }

    /// The bound of a type parameter; unbound parameters are a hard error.
    pub fn bound(&self, name: &str) -> Result<&Type, TypeError> {
        self.bindings
            .get(name)
            .ok_or_else(|| TypeError::UnboundTypeParam { name: name.to_string() })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_leaves_the_original_untouched() {
        let outer = Env::new().bind("x", Type::int32());
        let inner = outer.bind("y", Type::string());
        assert!(outer.lookup("y").is_none());
        assert_eq!(inner.lookup("x"), Some(&Type::int32()));
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn unbound_type_param_is_an_error() {
        let delta = Env::new();
        assert!(matches!(
            delta.bound("T"),
            Err(TypeError::UnboundTypeParam { name }) if name == "T"
        ));
    }
}
