//! The typing judgment for expressions.
//!
//! `Checker::check` returns the type of an expression together with a
//! rewritten expression: untyped constants that flow into typed positions
//! are retagged (literals) or wrapped in an explicit conversion (any other
//! untyped expression).

use fgg_syntax::{BinOp, Expr, Prim, PrimTag, Type};

use crate::env::{Delta, Gamma};
use crate::error::{AssignSite, TypeError};
use crate::table::DeclTable;
use crate::types::formals_eta;

pub struct Checker<'a> {
    decls: &'a DeclTable,
    allow_unsound_casts: bool,
}

impl<'a> Checker<'a> {
    pub fn new(decls: &'a DeclTable, allow_unsound_casts: bool) -> Self {
        Checker { decls, allow_unsound_casts }
    }

    pub fn decls(&self) -> &'a DeclTable {
        self.decls
    }

    /// The type of `e`, discarding the rewritten tree.
    pub fn type_of(&self, delta: &Delta, gamma: &Gamma, e: &Expr) -> Result<Type, TypeError> {
        self.check(delta, gamma, e).map(|(ty, _)| ty)
    }

    pub fn check(&self, delta: &Delta, gamma: &Gamma, e: &Expr) -> Result<(Type, Expr), TypeError> {
        match e {
            Expr::Var(x) => gamma
                .lookup(x)
                .map(|ty| (ty.clone(), e.clone()))
                .ok_or_else(|| TypeError::UnknownVariable { name: x.clone() }),

            Expr::StructLit { ty, elems } => {
                let struct_ty = Type::Named(ty.clone());
                self.decls.ok_type(&struct_ty, delta)?;
                let fields = self
                    .decls
                    .struct_fields(&struct_ty)?
                    .ok_or_else(|| TypeError::NotAStruct { ty: struct_ty.clone(), term: e.to_string() })?;
                if fields.len() != elems.len() {
                    return Err(TypeError::FieldCount {
                        ty: struct_ty,
                        expected: fields.len(),
                        found: elems.len(),
                        term: e.to_string(),
                    });
                }
                let mut out = Vec::with_capacity(elems.len());
                for (field, elem) in fields.iter().zip(elems) {
                    let (elem_ty, elem) = self.check(delta, gamma, elem)?;
                    out.push(self.coerce(delta, &elem_ty, elem, &field.ty, AssignSite::Field(field.name.clone()))?);
                }
                Ok((struct_ty, Expr::StructLit { ty: ty.clone(), elems: out }))
            }

            Expr::Select { expr, field } => {
                let (ty, inner) = self.check(delta, gamma, expr)?;
                let fields = self
                    .decls
                    .struct_fields(&ty)?
                    .ok_or_else(|| TypeError::NotAStruct { ty: ty.clone(), term: e.to_string() })?;
                let decl = fields
                    .into_iter()
                    .find(|f| &f.name == field)
                    .ok_or_else(|| TypeError::UnknownField { ty: ty.clone(), field: field.clone() })?;
                Ok((decl.ty, Expr::Select { expr: Box::new(inner), field: field.clone() }))
            }

            Expr::Call { recv, meth, targs, args } => {
                let (recv_ty, recv) = self.check(delta, gamma, recv)?;
                let sig = self
                    .decls
                    .methods(&recv_ty, delta)?
                    .remove(meth)
                    .ok_or_else(|| TypeError::UnknownMethod { ty: recv_ty.clone(), meth: meth.clone() })?;
                if sig.formals.len() != targs.len() {
                    return Err(TypeError::TypeArgCount {
                        meth: meth.clone(),
                        expected: sig.formals.len(),
                        found: targs.len(),
                        term: e.to_string(),
                    });
                }
                for targ in targs {
                    self.decls.ok_type(targ, delta)?;
                }
                let eta = formals_eta(&sig.formals, targs);
                for (formal, targ) in sig.formals.iter().zip(targs) {
                    let bound = formal.bound.subst(&eta);
                    if !self.decls.implements(targ, &bound, delta)? {
                        return Err(TypeError::BoundViolation {
                            arg: targ.clone(),
                            bound,
                            site: e.to_string(),
                        });
                    }
                }
                if sig.params.len() != args.len() {
                    return Err(TypeError::ArgCount {
                        meth: meth.clone(),
                        expected: sig.params.len(),
                        found: args.len(),
                        term: e.to_string(),
                    });
                }
                let mut out = Vec::with_capacity(args.len());
                for (index, (p, arg)) in sig.params.iter().zip(args).enumerate() {
                    let (arg_ty, arg) = self.check(delta, gamma, arg)?;
                    let site = AssignSite::Arg { meth: meth.clone(), index };
                    out.push(self.coerce(delta, &arg_ty, arg, &p.ty.subst(&eta), site)?);
                }
                let call = Expr::Call {
                    recv: Box::new(recv),
                    meth: meth.clone(),
                    targs: targs.clone(),
                    args: out,
                };
                Ok((sig.ret.subst(&eta), call))
            }

            Expr::Assert { expr, ty } => {
                self.decls.ok_type(ty, delta)?;
                let (expr_ty, inner) = self.check(delta, gamma, expr)?;
                let static_ty = match &expr_ty {
                    Type::Param(p) => delta.bound(p)?.clone(),
                    other => other.clone(),
                };
                if self.decls.is_interface(&static_ty)? {
                    if !self.decls.is_interface(ty)? && !matches!(ty, Type::Param(_)) {
                        if !self.decls.implements(ty, &static_ty, delta)? {
                            return Err(TypeError::ImpossibleAssertion {
                                ty: static_ty,
                                target: ty.clone(),
                                term: e.to_string(),
                            });
                        }
                    }
                } else if !self.allow_unsound_casts {
                    return Err(TypeError::AssertOnNonInterface { ty: expr_ty, term: e.to_string() });
                }
                Ok((ty.clone(), Expr::Assert { expr: Box::new(inner), ty: ty.clone() }))
            }

            Expr::Sprintf { format, args } => {
                let mut out = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    let (arg_ty, arg) = self.check(delta, gamma, arg)?;
                    let site = AssignSite::Arg { meth: "fmt.Sprintf".into(), index: index + 1 };
                    out.push(self.coerce(delta, &arg_ty, arg, &Type::empty_interface(), site)?);
                }
                Ok((Type::string(), Expr::Sprintf { format: format.clone(), args: out }))
            }

            Expr::Lit(lit) => {
                if !lit.prim.untyped && !lit.representable_as(lit.prim.tag) {
                    return Err(TypeError::NotRepresentable {
                        value: lit.value.to_string(),
                        ty: Type::Prim(lit.prim),
                    });
                }
                Ok((Type::Prim(lit.prim), e.clone()))
            }

            Expr::Binary { op, lhs, rhs } => {
                let (lhs_ty, lhs) = self.check(delta, gamma, lhs)?;
                let (rhs_ty, rhs) = self.check(delta, gamma, rhs)?;
                self.binary(delta, *op, (lhs_ty, lhs), (rhs_ty, rhs), e)
            }

            Expr::Convert { prim, expr } => {
                let (from, inner) = self.check(delta, gamma, expr)?;
                let from_prim = from.as_prim().ok_or_else(|| TypeError::InvalidConversion {
                    from: from.clone(),
                    to: *prim,
                    term: e.to_string(),
                })?;
                if !(from_prim.tag == *prim || (from_prim.tag.is_numeric() && prim.is_numeric())) {
                    return Err(TypeError::InvalidConversion { from, to: *prim, term: e.to_string() });
                }
                if let Expr::Lit(lit) = &inner {
                    if lit.prim.untyped && !lit.representable_as(*prim) {
                        return Err(TypeError::NotRepresentable {
                            value: lit.value.to_string(),
                            ty: Type::prim(*prim),
                        });
                    }
                }
                Ok((Type::prim(*prim), Expr::Convert { prim: *prim, expr: Box::new(inner) }))
            }
        }
    }

    /// Check that a value of type `ty` may flow into `target`, returning the
    /// (possibly rewritten) expression.
    pub fn coerce(
        &self,
        delta: &Delta,
        ty: &Type,
        e: Expr,
        target: &Type,
        site: AssignSite,
    ) -> Result<Expr, TypeError> {
        let not_assignable = |found: &Type, e: &Expr| TypeError::NotAssignable {
            found: found.clone(),
            expected: target.clone(),
            site: site.clone(),
            term: e.to_string(),
        };
        // Only the parameter itself flows into a type parameter.
        if let Type::Param(_) = target {
            if ty != target {
                return Err(not_assignable(ty, &e));
            }
        }
        let Some(prim) = ty.as_prim().filter(|p| p.untyped) else {
            return if self.decls.implements(ty, target, delta)? {
                Ok(e)
            } else {
                Err(not_assignable(ty, &e))
            };
        };
        let tag = match target {
            Type::Prim(want) if want.untyped => return Ok(e),
            Type::Prim(want) => {
                let compatible = prim.tag == want.tag
                    || (prim.tag.is_numeric()
                        && want.tag.is_numeric()
                        && (prim.tag.is_integral() || want.tag.is_float() || matches!(e, Expr::Lit(_))));
                if !compatible {
                    return Err(not_assignable(ty, &e));
                }
                want.tag
            }
            _ => prim.tag,
        };
        if let Expr::Lit(lit) = &e {
            if !lit.representable_as(tag) {
                return Err(TypeError::NotRepresentable {
                    value: lit.value.to_string(),
                    ty: Type::prim(tag),
                });
            }
        }
        let concrete = Type::prim(tag);
        if !matches!(target, Type::Prim(_)) && !self.decls.implements(&concrete, target, delta)? {
            return Err(not_assignable(&concrete, &e));
        }
        Ok(retag(e, tag))
    }

    fn binary(
        &self,
        delta: &Delta,
        op: BinOp,
        (lhs_ty, lhs): (Type, Expr),
        (rhs_ty, rhs): (Type, Expr),
        whole: &Expr,
    ) -> Result<(Type, Expr), TypeError> {
        let term = whole.to_string();
        let lp = lhs_ty
            .as_prim()
            .ok_or_else(|| TypeError::InvalidOperand { op, ty: lhs_ty.clone(), term: term.clone() })?;
        let rp = rhs_ty
            .as_prim()
            .ok_or_else(|| TypeError::InvalidOperand { op, ty: rhs_ty.clone(), term: term.clone() })?;
        let (operand, lhs, rhs) = match (lp.untyped, rp.untyped) {
            (true, true) => {
                let tag = if lp.tag.rank() >= rp.tag.rank() { lp.tag } else { rp.tag };
                (Prim::untyped(tag), lhs, rhs)
            }
            (false, true) => {
                let rhs = self.coerce(delta, &rhs_ty, rhs, &lhs_ty, AssignSite::Operand(op))?;
                (lp, lhs, rhs)
            }
            (true, false) => {
                let lhs = self.coerce(delta, &lhs_ty, lhs, &rhs_ty, AssignSite::Operand(op))?;
                (rp, lhs, rhs)
            }
            (false, false) => {
                if lp != rp {
                    return Err(TypeError::OperandMismatch { op, lhs: lhs_ty, rhs: rhs_ty, term });
                }
                (lp, lhs, rhs)
            }
        };
        let result = operator_result(op, operand)
            .ok_or_else(|| TypeError::InvalidOperand { op, ty: Type::Prim(operand), term })?;
        Ok((result, Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }))
    }
}

/// The result type of `op` applied to two operands of type `operand`, or
/// `None` if the operator is not defined on it.
pub fn operator_result(op: BinOp, operand: Prim) -> Option<Type> {
    let tag = operand.tag;
    let defined = if op.is_arithmetic() {
        tag.is_numeric() || (op == BinOp::Add && tag == PrimTag::String)
    } else if op.is_ordering() {
        tag.is_numeric() || tag == PrimTag::String
    } else if op.is_logical() {
        tag == PrimTag::Bool
    } else {
        true
    };
    if !defined {
        return None;
    }
    if op.is_arithmetic() {
        Some(Type::Prim(operand))
    } else {
        Some(Type::bool())
    }
}

/// Give an untyped expression the concrete representation `tag`.
fn retag(e: Expr, tag: PrimTag) -> Expr {
    match e {
        Expr::Lit(lit) => match lit.convert(tag) {
            Some(lit) => Expr::Lit(lit),
            None => Expr::Convert { prim: tag, expr: Box::new(Expr::Lit(lit)) },
        },
        other => Expr::Convert { prim: tag, expr: Box::new(other) },
    }
}
