//! One-step reduction.
//!
//! Call-by-value, left to right: a node first reduces its leftmost
//! non-value child, and only fires its own rule once every child is a value.
//! Method calls dispatch on the receiver's runtime struct type.

use rustc_hash::FxHashMap;

use fgg_syntax::{BinOp, Expr, LitValue, Literal, Type};
use fgg_typeck::types::formals_eta;
use fgg_typeck::{DeclTable, Delta, TypeError};

use crate::error::{EvalError, Rule, StuckReason};
use crate::format::sprintf;
use crate::ops::{self, OpFailure};

/// The reduction machine for one program's declarations.
pub struct Machine {
    decls: DeclTable,
}

impl Machine {
    pub fn new(decls: DeclTable) -> Self {
        Machine { decls }
    }

    pub fn decls(&self) -> &DeclTable {
        &self.decls
    }

    /// Reduce `e` by one step, returning the new expression and the rule
    /// that fired. Congruence steps report the rule of the inner redex.
    pub fn step(&self, e: &Expr) -> Result<(Expr, Rule), EvalError> {
        match e {
            Expr::Var(name) => Err(EvalError::FreeVariable { name: name.clone() }),
            Expr::Lit(_) => Err(EvalError::NotReducible { term: e.to_string() }),

            Expr::StructLit { ty, elems } => {
                let (elems, rule) = self.step_first(elems, e)?;
                Ok((Expr::StructLit { ty: ty.clone(), elems }, rule))
            }

            Expr::Select { expr, field } => {
                if !expr.is_value() {
                    let (inner, rule) = self.step(expr)?;
                    return Ok((Expr::Select { expr: Box::new(inner), field: field.clone() }, rule));
                }
                let Expr::StructLit { ty, elems } = expr.as_ref() else {
                    return Err(TypeError::NotAStruct { ty: runtime_type(expr), term: e.to_string() }.into());
                };
                let struct_ty = Type::Named(ty.clone());
                let fields = self
                    .decls
                    .struct_fields(&struct_ty)?
                    .ok_or_else(|| TypeError::NotAStruct { ty: struct_ty.clone(), term: e.to_string() })?;
                let index = fields
                    .iter()
                    .position(|f| &f.name == field)
                    .ok_or_else(|| TypeError::UnknownField { ty: struct_ty.clone(), field: field.clone() })?;
                let value = elems
                    .get(index)
                    .cloned()
                    .ok_or_else(|| TypeError::UnknownField { ty: struct_ty, field: field.clone() })?;
                Ok((value, Rule::Select))
            }

            Expr::Call { recv, meth, targs, args } => {
                if !recv.is_value() {
                    let (inner, rule) = self.step(recv)?;
                    let call =
                        Expr::Call { recv: Box::new(inner), meth: meth.clone(), targs: targs.clone(), args: args.clone() };
                    return Ok((call, rule));
                }
                if !args.iter().all(Expr::is_value) {
                    let (args, rule) = self.step_first(args, e)?;
                    let call = Expr::Call { recv: recv.clone(), meth: meth.clone(), targs: targs.clone(), args };
                    return Ok((call, rule));
                }
                self.invoke(recv, meth, targs, args).map(|body| (body, Rule::Call))
            }

            Expr::Assert { expr, ty } => {
                if !expr.is_value() {
                    let (inner, rule) = self.step(expr)?;
                    return Ok((Expr::Assert { expr: Box::new(inner), ty: ty.clone() }, rule));
                }
                let value_ty = runtime_type(expr);
                if self.decls.implements(&value_ty, ty, &Delta::new())? {
                    Ok((expr.as_ref().clone(), Rule::Assert))
                } else {
                    Err(EvalError::Stuck(StuckReason::FailedAssertion {
                        value_ty,
                        target: ty.clone(),
                        term: e.to_string(),
                    }))
                }
            }

            Expr::Sprintf { format, args } => {
                if !args.iter().all(Expr::is_value) {
                    let (args, rule) = self.step_first(args, e)?;
                    return Ok((Expr::Sprintf { format: format.clone(), args }, rule));
                }
                Ok((Expr::Lit(Literal::string(sprintf(format, args))), Rule::Sprintf))
            }

            Expr::Binary { op, lhs, rhs } => {
                if !lhs.is_value() {
                    let (inner, rule) = self.step(lhs)?;
                    return Ok((Expr::Binary { op: *op, lhs: Box::new(inner), rhs: rhs.clone() }, rule));
                }
                if let Some(short) = short_circuit(*op, lhs) {
                    return Ok((Expr::Lit(Literal::bool(short)), Rule::BinaryOp));
                }
                if !rhs.is_value() {
                    let (inner, rule) = self.step(rhs)?;
                    return Ok((Expr::Binary { op: *op, lhs: lhs.clone(), rhs: Box::new(inner) }, rule));
                }
                let (Expr::Lit(l), Expr::Lit(r)) = (lhs.as_ref(), rhs.as_ref()) else {
                    return Err(TypeError::InvalidOperand { op: *op, ty: runtime_type(lhs), term: e.to_string() }.into());
                };
                match ops::binary(*op, l, r) {
                    Ok(lit) => Ok((Expr::Lit(lit), Rule::BinaryOp)),
                    Err(OpFailure::DivisionByZero) => {
                        Err(EvalError::Stuck(StuckReason::DivisionByZero { term: e.to_string() }))
                    }
                    Err(OpFailure::Unsupported(prim)) => {
                        Err(TypeError::InvalidOperand { op: *op, ty: Type::Prim(prim), term: e.to_string() }.into())
                    }
                }
            }

            Expr::Convert { prim, expr } => {
                if !expr.is_value() {
                    let (inner, rule) = self.step(expr)?;
                    return Ok((Expr::Convert { prim: *prim, expr: Box::new(inner) }, rule));
                }
                let converted = match expr.as_ref() {
                    Expr::Lit(lit) => lit.convert(*prim),
                    _ => None,
                };
                converted.map(|lit| (Expr::Lit(lit), Rule::Convert)).ok_or_else(|| {
                    TypeError::InvalidConversion { from: runtime_type(expr), to: *prim, term: e.to_string() }.into()
                })
            }
        }
    }

    /// Step the leftmost non-value in `exprs`.
    fn step_first(&self, exprs: &[Expr], whole: &Expr) -> Result<(Vec<Expr>, Rule), EvalError> {
        let Some(index) = exprs.iter().position(|x| !x.is_value()) else {
            return Err(EvalError::NotReducible { term: whole.to_string() });
        };
        let (inner, rule) = self.step(&exprs[index])?;
        let mut out = exprs.to_vec();
        out[index] = inner;
        Ok((out, rule))
    }

    /// The body of `meth` on the receiver's runtime type, with the receiver
    /// and parameters substituted in one pass and the receiver's and call's
    /// type arguments in another.
    fn invoke(&self, recv: &Expr, meth: &str, targs: &[Type], args: &[Expr]) -> Result<Expr, EvalError> {
        let Expr::StructLit { ty, .. } = recv else {
            return Err(TypeError::UnknownMethod { ty: runtime_type(recv), meth: meth.to_string() }.into());
        };
        let md = self
            .decls
            .meth_decl(&ty.name, meth)
            .ok_or_else(|| TypeError::UnknownMethod { ty: Type::Named(ty.clone()), meth: meth.to_string() })?;
        if md.params.len() != args.len() {
            return Err(TypeError::ArgCount {
                meth: meth.to_string(),
                expected: md.params.len(),
                found: args.len(),
                term: recv.to_string(),
            }
            .into());
        }
        let mut eta = formals_eta(&md.recv_formals, &ty.args);
        eta.extend(formals_eta(&md.formals, targs));

        let mut env: FxHashMap<String, Expr> = FxHashMap::default();
        env.insert(md.recv.clone(), recv.clone());
        for (p, a) in md.params.iter().zip(args) {
            env.insert(p.name.clone(), a.clone());
        }
        Ok(md.body.subst_types(&eta).subst_vars(&env))
    }
}

/// `false && _` and `true || _` decide without the right operand.
fn short_circuit(op: BinOp, lhs: &Expr) -> Option<bool> {
    match (op, lhs) {
        (BinOp::And, Expr::Lit(Literal { value: LitValue::Bool(false), .. })) => Some(false),
        (BinOp::Or, Expr::Lit(Literal { value: LitValue::Bool(true), .. })) => Some(true),
        _ => None,
    }
}

/// The exact type of a value.
pub fn runtime_type(value: &Expr) -> Type {
    match value {
        Expr::StructLit { ty, .. } => Type::Named(ty.clone()),
        Expr::Lit(lit) => Type::Prim(lit.prim.default_type()),
        _ => Type::empty_interface(),
    }
}
