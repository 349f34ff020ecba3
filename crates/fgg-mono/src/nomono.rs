//! The nomono check: a sufficient condition for discovery to terminate.
//!
//! Every method body is closed over symbolically, with its own type
//! parameters left open. If that closure reaches the same method on the
//! same receiver declaration with the method's parameters nested inside
//! the receiver's or the method's type arguments, instantiation depth would
//! grow without bound. Generic struct declarations get the same treatment
//! for their fields. The check is a gate, not a decision procedure.

use rustc_hash::FxHashSet;

use fgg_syntax::{Expr, MethDecl, Type, TypeDecl, TypeFormal};
use fgg_typeck::{DeclTable, Delta, Gamma};

use crate::closure::Closure;
use crate::error::MonoError;
use crate::instances::MethInst;

/// Certify that discovery over `table` terminates, or explain why not.
pub fn check_nomono(table: &DeclTable) -> Result<(), MonoError> {
    let bound = depth_bound(table);
    for td in table.type_decls() {
        if !td.formals.is_empty() {
            check_type_decl(table, td, bound)?;
        }
    }
    for md in table.meth_decls() {
        check_method(table, md, bound)?;
    }
    Ok(())
}

fn check_type_decl(table: &DeclTable, td: &TypeDecl, bound: usize) -> Result<(), MonoError> {
    let self_ty = Type::Named(td.self_type());
    let mut closure = Closure::open(table, Delta::new().bind_formals(&td.formals), bound);
    closure.add_type(self_ty.clone())?;
    closure.run(None)?;
    for u in closure.types.iter() {
        if let Type::Named(n) = u {
            if n.name == td.name && nests(&n.args, &td.formals) {
                return Err(MonoError::NotMonomorphisable { witness: format!("{} contains {}", self_ty, u) });
            }
        }
    }
    Ok(())
}

fn check_method(table: &DeclTable, md: &MethDecl, bound: usize) -> Result<(), MonoError> {
    let delta = Delta::new().bind_formals(&md.recv_formals).bind_formals(&md.formals);
    let recv = Type::Named(md.recv_named());
    let gamma = Gamma::new()
        .bind(md.recv.clone(), recv.clone())
        .bind_all(md.params.iter().map(|p| (p.name.clone(), p.ty.clone())));
    let own = MethInst::new(
        recv.clone(),
        md.name.clone(),
        md.formals.iter().map(|f| Type::Param(f.name.clone())).collect(),
    );

    let mut closure = Closure::open(table, delta, bound);
    closure.add_type(recv)?;
    closure.add_meth(own.clone())?;
    closure.mark_visited(&md.recv_type, &md.name);
    closure.seed(&gamma, &md.body)?;
    closure.run(None)?;

    for inst in closure.meths.iter() {
        if inst.meth != md.name || inst.recv_decl() != Some(md.recv_type.as_str()) {
            continue;
        }
        let recv_args = inst.recv.as_named().map(|n| n.args.as_slice()).unwrap_or(&[]);
        if nests(recv_args, &md.recv_formals) || nests(&inst.targs, &md.formals) {
            tracing::debug!(method = %own, witness = %inst, "not monomorphisable");
            return Err(MonoError::NotMonomorphisable { witness: format!("{} reaches {}", own, inst) });
        }
    }
    tracing::debug!(method = %own, "monomorphisable");
    Ok(())
}

/// Whether some argument mentions one of `formals` below its top level.
fn nests(args: &[Type], formals: &[TypeFormal]) -> bool {
    let names: FxHashSet<&str> = formals.iter().map(|f| f.name.as_str()).collect();
    args.iter().any(|arg| match arg {
        Type::Param(_) => false,
        _ => arg.free_params().iter().any(|p| names.contains(p.as_str())),
    })
}

/// `(d + 1) * (n + 1)` for the deepest type `d` written anywhere in the
/// declarations and `n` type declarations.
fn depth_bound(table: &DeclTable) -> usize {
    let mut deepest = 1;
    let mut see = |ty: &Type| deepest = deepest.max(ty.depth());
    for td in table.type_decls() {
        see(&td.source);
        td.formals.iter().for_each(|f| see(&f.bound));
    }
    for md in table.meth_decls() {
        md.recv_formals.iter().chain(&md.formals).for_each(|f| see(&f.bound));
        md.params.iter().for_each(|p| see(&p.ty));
        see(&md.ret);
        expr_types(&md.body, &mut see);
    }
    (deepest + 1) * (table.num_types() + 1)
}

fn expr_types(e: &Expr, see: &mut impl FnMut(&Type)) {
    match e {
        Expr::StructLit { ty, elems } => {
            see(&Type::Named(ty.clone()));
            elems.iter().for_each(|x| expr_types(x, see));
        }
        Expr::Call { recv, targs, args, .. } => {
            expr_types(recv, see);
            targs.iter().for_each(|t| see(t));
            args.iter().for_each(|x| expr_types(x, see));
        }
        Expr::Assert { expr, ty } => {
            expr_types(expr, see);
            see(ty);
        }
        Expr::Select { expr, .. } | Expr::Convert { expr, .. } => expr_types(expr, see),
        Expr::Sprintf { args, .. } => args.iter().for_each(|x| expr_types(x, see)),
        Expr::Binary { lhs, rhs, .. } => {
            expr_types(lhs, see);
            expr_types(rhs, see);
        }
        Expr::Var(_) | Expr::Lit(_) => {}
    }
}
