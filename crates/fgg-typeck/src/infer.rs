//! Reconstruction of omitted type arguments.
//!
//! A call `e.m(args)` to a generic method, or a struct literal `T{...}` of a
//! generic type, may omit its type arguments. The elaborator instantiates
//! the missing formals with fresh variables (each recording its bound),
//! constrains every argument type to implement the corresponding parameter
//! type, solves, and writes the solution back into the tree. The elaborated
//! program then goes through the ordinary typing judgment.

use fgg_syntax::{Decl, Expr, Named, Program, Type, TypeFormal};

use crate::env::{Delta, Gamma};
use crate::error::{TypeError, UnifyError};
use crate::table::DeclTable;
use crate::typing::Checker;
use crate::types::formals_eta;
use crate::unify::{apply, Constraint, InferCtx, Unifier};

pub struct Inferrer<'a> {
    decls: &'a DeclTable,
    checker: Checker<'a>,
    ctx: InferCtx,
}

impl<'a> Inferrer<'a> {
    pub fn new(decls: &'a DeclTable) -> Self {
        Inferrer { decls, checker: Checker::new(decls, false), ctx: InferCtx::new() }
    }

    /// Elaborate `e`, returning its type and the tree with every omitted
    /// type argument filled in.
    pub fn infer(&mut self, delta: &Delta, gamma: &Gamma, e: &Expr) -> Result<(Type, Expr), TypeError> {
        match e {
            Expr::StructLit { ty, elems } => {
                let mut out = Vec::with_capacity(elems.len());
                let mut tys = Vec::with_capacity(elems.len());
                for elem in elems {
                    let (t, elem) = self.infer(delta, gamma, elem)?;
                    tys.push(t);
                    out.push(elem);
                }
                let decl = self.decls.type_decl(&ty.name)?;
                let ty = if ty.args.is_empty() && !decl.formals.is_empty() {
                    let formals = decl.formals.clone();
                    let struct_ty = Type::Named(decl.self_type());
                    let fields = self
                        .decls
                        .struct_fields(&struct_ty)?
                        .ok_or_else(|| TypeError::NotAStruct { ty: struct_ty.clone(), term: e.to_string() })?;
                    if fields.len() != tys.len() {
                        return Err(TypeError::FieldCount {
                            ty: struct_ty,
                            expected: fields.len(),
                            found: tys.len(),
                            term: e.to_string(),
                        });
                    }
                    let targets: Vec<Type> = fields.into_iter().map(|f| f.ty).collect();
                    let args = self.solve_formals(delta, &formals, &tys, &targets, e)?;
                    Named::new(ty.name.clone(), args)
                } else {
                    ty.clone()
                };
                let e = Expr::StructLit { ty, elems: out };
                self.checker.check(delta, gamma, &e)
            }

            Expr::Call { recv, meth, targs, args } => {
                let (recv_ty, recv) = self.infer(delta, gamma, recv)?;
                let mut out = Vec::with_capacity(args.len());
                let mut tys = Vec::with_capacity(args.len());
                for arg in args {
                    let (t, arg) = self.infer(delta, gamma, arg)?;
                    tys.push(t);
                    out.push(arg);
                }
                let sig = self
                    .decls
                    .methods(&recv_ty, delta)?
                    .remove(meth)
                    .ok_or_else(|| TypeError::UnknownMethod { ty: recv_ty.clone(), meth: meth.clone() })?;
                let targs = if targs.is_empty() && !sig.formals.is_empty() {
                    if sig.params.len() != tys.len() {
                        return Err(TypeError::ArgCount {
                            meth: meth.clone(),
                            expected: sig.params.len(),
                            found: tys.len(),
                            term: e.to_string(),
                        });
                    }
                    let targets: Vec<Type> = sig.params.iter().map(|p| p.ty.clone()).collect();
                    self.solve_formals(delta, &sig.formals, &tys, &targets, e)?
                } else {
                    targs.clone()
                };
                let e = Expr::Call { recv: Box::new(recv), meth: meth.clone(), targs, args: out };
                self.checker.check(delta, gamma, &e)
            }

            Expr::Select { expr, field } => {
                let (_, inner) = self.infer(delta, gamma, expr)?;
                self.checker.check(delta, gamma, &Expr::Select { expr: Box::new(inner), field: field.clone() })
            }
            Expr::Assert { expr, ty } => {
                let (_, inner) = self.infer(delta, gamma, expr)?;
                self.checker.check(delta, gamma, &Expr::Assert { expr: Box::new(inner), ty: ty.clone() })
            }
            Expr::Sprintf { format, args } => {
                let args = args
                    .iter()
                    .map(|a| self.infer(delta, gamma, a).map(|(_, a)| a))
                    .collect::<Result<Vec<_>, _>>()?;
                self.checker.check(delta, gamma, &Expr::Sprintf { format: format.clone(), args })
            }
            Expr::Binary { op, lhs, rhs } => {
                let (_, lhs) = self.infer(delta, gamma, lhs)?;
                let (_, rhs) = self.infer(delta, gamma, rhs)?;
                self.checker.check(delta, gamma, &Expr::Binary { op: *op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
            }
            Expr::Convert { prim, expr } => {
                let (_, inner) = self.infer(delta, gamma, expr)?;
                self.checker.check(delta, gamma, &Expr::Convert { prim: *prim, expr: Box::new(inner) })
            }
            Expr::Var(_) | Expr::Lit(_) => self.checker.check(delta, gamma, e),
        }
    }

    /// Instantiate `formals` with fresh variables, constrain each actual
    /// type to implement its (instantiated) target, and read the solution
    /// back.
    fn solve_formals(
        &mut self,
        delta: &Delta,
        formals: &[TypeFormal],
        actuals: &[Type],
        targets: &[Type],
        e: &Expr,
    ) -> Result<Vec<Type>, TypeError> {
        let cannot = |cause: UnifyError| TypeError::CannotInfer { term: e.to_string(), cause };
        let vars: Vec<Type> = formals.iter().map(|_| Type::Var(self.ctx.fresh_var())).collect();
        let eta = formals_eta(formals, &vars);
        for (formal, var) in formals.iter().zip(&vars) {
            if let Type::Var(v) = var {
                self.ctx.set_bound(*v, formal.bound.subst(&eta));
            }
        }
        let constraints: Vec<Constraint> = actuals
            .iter()
            .zip(targets)
            .map(|(actual, target)| {
                let actual = match actual {
                    Type::Prim(p) if p.untyped => Type::Prim(p.default_type()),
                    other => other.clone(),
                };
                Constraint::Subtype(actual, target.subst(&eta))
            })
            .collect();
        tracing::trace!(term = %e, constraints = constraints.len(), "solving for omitted type arguments");
        let solution = Unifier::new(self.decls, delta).solve(&constraints).map_err(cannot)?;

        let mut resolved = Vec::with_capacity(vars.len());
        for var in &vars {
            let ty = apply(&solution, var);
            if let Type::Var(v) = var {
                if ty.has_vars() {
                    return Err(cannot(UnifyError::Unresolved { var: *v }));
                }
                resolved.push((*v, ty));
            }
        }
        let solved: Vec<Type> = resolved.iter().map(|(_, t)| t.clone()).collect();
        let real = formals_eta(formals, &solved);
        for (v, ty) in &resolved {
            let Some(bound) = self.ctx.bound(*v) else { continue };
            let bound = apply(&solution, bound).subst(&real);
            if !self.decls.implements(ty, &bound, delta)? {
                return Err(cannot(UnifyError::Bound { var: *v, ty: ty.clone(), bound }));
            }
        }
        Ok(solved)
    }
}

/// Elaborate every method body and the main expression of `program`.
pub fn elaborate_program(table: &DeclTable, program: &Program) -> Result<Program, TypeError> {
    let mut inferrer = Inferrer::new(table);
    let mut decls = Vec::with_capacity(program.decls.len());
    for decl in &program.decls {
        let Decl::Meth(md) = decl else {
            decls.push(decl.clone());
            continue;
        };
        let delta = Delta::new().bind_formals(&md.recv_formals).bind_formals(&md.formals);
        let gamma = Gamma::new()
            .bind(md.recv.clone(), Type::Named(md.recv_named()))
            .bind_all(md.params.iter().map(|p| (p.name.clone(), p.ty.clone())));
        let (_, body) = inferrer.infer(&delta, &gamma, &md.body)?;
        let mut md = md.clone();
        md.body = body;
        decls.push(Decl::Meth(md));
    }
    let (_, main) = inferrer.infer(&Delta::new(), &Gamma::new(), &program.main)?;
    Ok(Program { decls, main, printf: program.printf })
}
