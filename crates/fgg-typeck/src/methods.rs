//! Method-set resolution.

use std::collections::BTreeMap;

use fgg_syntax::{Eta, Spec, Sig, Type, TypeFormal};

use crate::env::Delta;
use crate::error::TypeError;
use crate::table::DeclTable;
use crate::types::formals_eta;

/// A method set: method name -> signature, ordered by name.
pub type MethodSet = BTreeMap<String, Sig>;

impl DeclTable {
    /// The methods available on `ty` under `delta`.
    ///
    /// Interfaces contribute their listed signatures plus those of embedded
    /// interfaces. Named non-interface types contribute every method declared
    /// on them whose receiver bounds are consistent with the actual type
    /// arguments; inconsistent ones are left out. Type parameters take the
    /// methods of their bound. Primitives and struct literals have none.
    pub fn methods(&self, ty: &Type, delta: &Delta) -> Result<MethodSet, TypeError> {
        match ty {
            Type::Interface(specs) => {
                let mut set = MethodSet::new();
                for spec in specs {
                    match spec {
                        Spec::Sig(sig) => {
                            set.entry(sig.meth.clone()).or_insert_with(|| sig.clone());
                        }
                        Spec::Embed(n) => {
                            for (name, sig) in self.methods(&Type::Named(n.clone()), delta)? {
                                set.entry(name).or_insert(sig);
                            }
                        }
                    }
                }
                Ok(set)
            }
            Type::Named(n) => {
                let resolved = self.resolve(ty)?;
                if let Type::Interface(_) = resolved {
                    return self.methods(&resolved, delta);
                }
                let mut set = MethodSet::new();
                for md in self.meths_of(&n.name) {
                    if let Some((eta, _)) = self.make_eta_delta(delta, &md.recv_formals, &n.args)? {
                        set.insert(md.name.clone(), md.sig().subst(&eta));
                    }
                }
                Ok(set)
            }
            Type::Param(p) => {
                let bound = delta.bound(p)?.clone();
                self.methods(&bound, delta)
            }
            Type::Prim(_) | Type::Struct(_) | Type::Var(_) => Ok(MethodSet::new()),
        }
    }

    /// Try to instantiate a method's receiver formals with `args`.
    ///
    /// Returns the substitution and the receiver formals' instantiated
    /// bounds, or `None` when some argument does not implement the
    /// (possibly stronger than declared) receiver bound.
    pub fn make_eta_delta(
        &self,
        delta: &Delta,
        formals: &[TypeFormal],
        args: &[Type],
    ) -> Result<Option<(Eta, Delta)>, TypeError> {
        if formals.len() != args.len() {
            return Ok(None);
        }
        let eta = formals_eta(formals, args);
        let mut bounds = Delta::new();
        for (formal, arg) in formals.iter().zip(args) {
            let bound = formal.bound.subst(&eta);
            if !self.implements(arg, &bound, delta)? {
                return Ok(None);
            }
            bounds = bounds.bind(formal.name.clone(), bound);
        }
        Ok(Some((eta, bounds)))
    }
}
