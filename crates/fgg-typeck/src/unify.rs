//! Constraint unifier.
//!
//! Constraints are solved one at a time: unify the first on its own, apply
//! the result to the rest, solve the rest, then compose. Composition applies
//! the later substitution into the earlier one; two different bindings for
//! the same variable survive only if one implements the other, in which case
//! the more general one is kept.

use std::fmt;

use rustc_hash::FxHashMap;

use fgg_syntax::{FieldDecl, Named, ParamDecl, Sig, Spec, TyVar, Type, TypeFormal};

use crate::env::Delta;
use crate::error::UnifyError;
use crate::table::DeclTable;

/// A substitution for inference variables.
pub type VarSubst = FxHashMap<TyVar, Type>;

#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// The left type must implement the right one.
    Subtype(Type, Type),
    Equality(Type, Type),
}

impl Constraint {
    fn apply(&self, s: &VarSubst) -> Constraint {
        match self {
            Constraint::Subtype(a, b) => Constraint::Subtype(apply(s, a), apply(s, b)),
            Constraint::Equality(a, b) => Constraint::Equality(apply(s, a), apply(s, b)),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Subtype(a, b) => write!(f, "{} <: {}", a, b),
            Constraint::Equality(a, b) => write!(f, "{} = {}", a, b),
        }
    }
}

/// Owns the fresh-variable counter and each variable's recorded bound for
/// one top-level inference run.
#[derive(Debug, Default)]
pub struct InferCtx {
    next: u32,
    bounds: FxHashMap<TyVar, Type>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx::default()
    }

    pub fn fresh_var(&mut self) -> TyVar {
        let var = TyVar(self.next);
        self.next += 1;
        var
    }

    pub fn set_bound(&mut self, var: TyVar, bound: Type) {
        self.bounds.insert(var, bound);
    }

    pub fn bound(&self, var: TyVar) -> Option<&Type> {
        self.bounds.get(&var)
    }
}

/// Replace inference variables throughout a type.
pub fn apply(s: &VarSubst, ty: &Type) -> Type {
    if s.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::Var(v) => s.get(v).cloned().unwrap_or_else(|| ty.clone()),
        Type::Param(_) | Type::Prim(_) => ty.clone(),
        Type::Named(n) => Type::Named(Named::new(n.name.clone(), n.args.iter().map(|a| apply(s, a)).collect())),
        Type::Struct(fields) => Type::Struct(
            fields
                .iter()
                .map(|f| FieldDecl { name: f.name.clone(), ty: apply(s, &f.ty) })
                .collect(),
        ),
        Type::Interface(specs) => Type::Interface(
            specs
                .iter()
                .map(|spec| match spec {
                    Spec::Sig(sig) => Spec::Sig(apply_sig(s, sig)),
                    Spec::Embed(n) => {
                        Spec::Embed(Named::new(n.name.clone(), n.args.iter().map(|a| apply(s, a)).collect()))
                    }
                })
                .collect(),
        ),
    }
}

fn apply_sig(s: &VarSubst, sig: &Sig) -> Sig {
    Sig {
        meth: sig.meth.clone(),
        formals: sig
            .formals
            .iter()
            .map(|f| TypeFormal { name: f.name.clone(), bound: apply(s, &f.bound) })
            .collect(),
        params: sig
            .params
            .iter()
            .map(|p| ParamDecl { name: p.name.clone(), ty: apply(s, &p.ty) })
            .collect(),
        ret: apply(s, &sig.ret),
    }
}

pub struct Unifier<'a> {
    decls: &'a DeclTable,
    delta: &'a Delta,
}

impl<'a> Unifier<'a> {
    pub fn new(decls: &'a DeclTable, delta: &'a Delta) -> Self {
        Unifier { decls, delta }
    }

    /// Solve an ordered constraint list.
    pub fn solve(&self, constraints: &[Constraint]) -> Result<VarSubst, UnifyError> {
        let Some((first, rest)) = constraints.split_first() else {
            return Ok(VarSubst::default());
        };
        let eta1 = self.unify_one(first)?;
        let rest: Vec<Constraint> = rest.iter().map(|c| c.apply(&eta1)).collect();
        let eta2 = self.solve(&rest)?;
        self.compose(&eta2, &eta1)
    }

    /// `outer` after `inner`.
    pub fn compose(&self, outer: &VarSubst, inner: &VarSubst) -> Result<VarSubst, UnifyError> {
        let mut out: VarSubst = inner.iter().map(|(k, v)| (*k, apply(outer, v))).collect();
        for (k, v) in outer {
            let Some(existing) = out.get(k) else {
                out.insert(*k, v.clone());
                continue;
            };
            if existing == v {
                continue;
            }
            if self.decls.implements(existing, v, self.delta)? {
                out.insert(*k, v.clone());
            } else if !self.decls.implements(v, existing, self.delta)? {
                return Err(UnifyError::IncompatibleMappings {
                    var: *k,
                    left: existing.clone(),
                    right: v.clone(),
                });
            }
        }
        Ok(out)
    }

    fn unify_one(&self, c: &Constraint) -> Result<VarSubst, UnifyError> {
        let (a, b, subtype) = match c {
            Constraint::Subtype(a, b) => (a, b, true),
            Constraint::Equality(a, b) => (a, b, false),
        };
        if a == b {
            return Ok(VarSubst::default());
        }
        let mismatch = || UnifyError::Mismatch { left: a.clone(), right: b.clone() };
        if !a.has_vars() && !b.has_vars() {
            return if subtype && self.decls.implements(a, b, self.delta)? {
                Ok(VarSubst::default())
            } else {
                Err(mismatch())
            };
        }
        match (a, b) {
            (Type::Var(v), other) | (other, Type::Var(v)) => bind(*v, other),
            (Type::Named(x), Type::Named(y)) if x.name == y.name => {
                if x.args.len() != y.args.len() {
                    return Err(mismatch());
                }
                let mut sub = Vec::new();
                for (l, r) in x.args.iter().zip(&y.args) {
                    if subtype && !l.has_vars() && !r.has_vars() {
                        if !self.decls.implements(l, r, self.delta)? {
                            return Err(mismatch());
                        }
                        continue;
                    }
                    sub.push(Constraint::Equality(l.clone(), r.clone()));
                }
                self.solve(&sub)
            }
            (Type::Struct(xs), Type::Struct(ys)) => {
                if xs.len() != ys.len() || xs.iter().zip(ys).any(|(x, y)| x.name != y.name) {
                    return Err(mismatch());
                }
                let sub: Vec<Constraint> =
                    xs.iter().zip(ys).map(|(x, y)| Constraint::Equality(x.ty.clone(), y.ty.clone())).collect();
                self.solve(&sub)
            }
            (sub_ty, sup_ty) if subtype && self.decls.is_interface(sup_ty)? => {
                let want = self.decls.methods(sup_ty, self.delta)?;
                let have = self.decls.methods(sub_ty, self.delta)?;
                let mut sub = Vec::new();
                for (name, sup_sig) in want {
                    let sub_sig = have
                        .get(&name)
                        .ok_or_else(|| UnifyError::MissingMethod { ty: sub_ty.clone(), meth: name.clone() })?;
                    sub.extend(sig_constraints(sub_sig, &sup_sig)?);
                }
                self.solve(&sub)
            }
            _ => Err(mismatch()),
        }
    }
}

fn bind(var: TyVar, ty: &Type) -> Result<VarSubst, UnifyError> {
    if ty.occurs(var) {
        return Err(UnifyError::Occurs { var, ty: ty.clone() });
    }
    let mut s = VarSubst::default();
    s.insert(var, ty.clone());
    Ok(s)
}

/// Equate the pieces of two signatures after canonical renaming of each
/// one's own formals.
fn sig_constraints(sub: &Sig, sup: &Sig) -> Result<Vec<Constraint>, UnifyError> {
    if sub.formals.len() != sup.formals.len() || sub.params.len() != sup.params.len() {
        return Err(UnifyError::SigShape { meth: sup.meth.clone() });
    }
    let (x, y) = (sub.canonical(), sup.canonical());
    let bounds = x.formals.iter().zip(&y.formals).map(|(l, r)| (l.bound.clone(), r.bound.clone()));
    let params = x.params.iter().zip(&y.params).map(|(l, r)| (l.ty.clone(), r.ty.clone()));
    Ok(bounds
        .chain(params)
        .chain(std::iter::once((x.ret, y.ret)))
        .map(|(l, r)| Constraint::Equality(l, r))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgg_syntax::build::*;

    fn table() -> DeclTable {
        DeclTable::new(&[
            type_decl("Any", vec![], iface(vec![])),
            type_decl("A", vec![], structure(vec![])),
            type_decl("B", vec![], structure(vec![])),
            type_decl("Box", vec![formal("a", named("Any", vec![]))], structure(vec![field("f", param("a"))])),
        ])
        .unwrap()
    }

    fn v(n: u32) -> Type {
        Type::Var(TyVar(n))
    }

    fn subst(pairs: &[(u32, Type)]) -> VarSubst {
        pairs.iter().map(|(k, t)| (TyVar(*k), t.clone())).collect()
    }

    #[test]
    fn var_binds_to_subtype() {
        let decls = table();
        let delta = Delta::new();
        let s = Unifier::new(&decls, &delta)
            .solve(&[Constraint::Subtype(named("A", vec![]), v(0))])
            .unwrap();
        assert_eq!(s.get(&TyVar(0)), Some(&named("A", vec![])));
    }

    #[test]
    fn same_named_types_unify_arguments() {
        let decls = table();
        let delta = Delta::new();
        let s = Unifier::new(&decls, &delta)
            .solve(&[Constraint::Subtype(
                named("Box", vec![named("A", vec![])]),
                named("Box", vec![v(0)]),
            )])
            .unwrap();
        assert_eq!(apply(&s, &v(0)), named("A", vec![]));
    }

    #[test]
    fn occurs_check_is_a_hard_failure() {
        let decls = table();
        let delta = Delta::new();
        let err = Unifier::new(&decls, &delta)
            .solve(&[Constraint::Equality(v(0), named("Box", vec![v(0)]))])
            .unwrap_err();
        assert!(matches!(err, UnifyError::Occurs { var: TyVar(0), .. }));
    }

    #[test]
    fn later_constraints_see_earlier_bindings() {
        let decls = table();
        let delta = Delta::new();
        let err = Unifier::new(&decls, &delta)
            .solve(&[
                Constraint::Equality(v(0), named("A", vec![])),
                Constraint::Equality(v(0), named("B", vec![])),
            ])
            .unwrap_err();
        assert!(matches!(err, UnifyError::Mismatch { .. }));
    }

    #[test]
    fn compose_keeps_the_more_general_binding() {
        let decls = table();
        let delta = Delta::new();
        let u = Unifier::new(&decls, &delta);
        let out = u
            .compose(&subst(&[(0, named("Any", vec![]))]), &subst(&[(0, named("A", vec![]))]))
            .unwrap();
        assert_eq!(out.get(&TyVar(0)), Some(&named("Any", vec![])));

        let err = u
            .compose(&subst(&[(0, named("A", vec![]))]), &subst(&[(0, named("B", vec![]))]))
            .unwrap_err();
        assert!(matches!(err, UnifyError::IncompatibleMappings { var: TyVar(0), .. }));
    }

    #[test]
    fn compose_is_associative_under_application() {
        let decls = table();
        let delta = Delta::new();
        let u = Unifier::new(&decls, &delta);
        let s1 = subst(&[(1, named("A", vec![]))]);
        let s2 = subst(&[(0, named("Box", vec![v(1)]))]);
        let s3 = subst(&[(2, v(0))]);

        let left = u.compose(&u.compose(&s1, &s2).unwrap(), &s3).unwrap();
        let right = u.compose(&s1, &u.compose(&s2, &s3).unwrap()).unwrap();
        for ty in [v(0), v(1), v(2), named("Box", vec![v(2)])] {
            assert_eq!(apply(&left, &ty), apply(&right, &ty), "differs on {}", ty);
        }
    }

    #[test]
    fn fresh_vars_are_numbered_per_context() {
        let mut a = InferCtx::new();
        let mut b = InferCtx::new();
        assert_eq!(a.fresh_var(), TyVar(0));
        assert_eq!(a.fresh_var(), TyVar(1));
        assert_eq!(b.fresh_var(), TyVar(0));
    }
}
