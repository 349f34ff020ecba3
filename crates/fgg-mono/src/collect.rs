//! Instantiations syntactically reachable from one expression.

use fgg_syntax::{Expr, Type};
use fgg_typeck::{Checker, Delta, Gamma, TypeError};

use crate::instances::MethInst;

/// What one walk found, in discovery order.
#[derive(Debug, Default)]
pub struct Found {
    pub types: Vec<Type>,
    pub meths: Vec<MethInst>,
}

/// Record every struct literal's type, every call's receiver type and
/// method instantiation, and every assertion target in `e`, children first.
/// A receiver typed by a type parameter is recorded as the parameter's
/// bound.
pub fn collect(checker: &Checker<'_>, delta: &Delta, gamma: &Gamma, e: &Expr, found: &mut Found) -> Result<(), TypeError> {
    match e {
        Expr::Var(_) | Expr::Lit(_) => {}
        Expr::StructLit { ty, elems } => {
            for elem in elems {
                collect(checker, delta, gamma, elem, found)?;
            }
            found.types.push(Type::Named(ty.clone()));
        }
        Expr::Select { expr, .. } => collect(checker, delta, gamma, expr, found)?,
        Expr::Call { recv, meth, targs, args } => {
            collect(checker, delta, gamma, recv, found)?;
            for arg in args {
                collect(checker, delta, gamma, arg, found)?;
            }
            let recv_ty = match checker.type_of(delta, gamma, recv)? {
                Type::Param(p) => delta.bound(&p)?.clone(),
                other => other,
            };
            found.types.push(recv_ty.clone());
            found.meths.push(MethInst::new(recv_ty, meth.clone(), targs.clone()));
        }
        Expr::Assert { expr, ty } => {
            collect(checker, delta, gamma, expr, found)?;
            found.types.push(ty.clone());
        }
        Expr::Sprintf { args, .. } => {
            for arg in args {
                collect(checker, delta, gamma, arg, found)?;
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            collect(checker, delta, gamma, lhs, found)?;
            collect(checker, delta, gamma, rhs, found)?;
        }
        Expr::Convert { expr, .. } => collect(checker, delta, gamma, expr, found)?,
    }
    Ok(())
}
