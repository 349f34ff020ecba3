//! Type error types.
//!
//! Every error carries the rendered text of the offending sub-term (a type,
//! a declaration name or an expression), so messages and diagnostics can
//! point at it without source spans.

use std::fmt;

use fgg_syntax::{BinOp, Named, PrimTag, TyVar, Type};

/// Where a value flows when an assignability check fails.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignSite {
    /// A struct literal element flowing into a field.
    Field(String),
    /// A call argument flowing into a method parameter.
    Arg { meth: String, index: usize },
    /// A method body flowing into the declared return type.
    Return(String),
    /// An untyped constant meeting a typed operand.
    Operand(BinOp),
}

impl fmt::Display for AssignSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignSite::Field(name) => write!(f, "field `{}`", name),
            AssignSite::Arg { meth, index } => write!(f, "parameter {} of `{}`", index + 1, meth),
            AssignSite::Return(meth) => write!(f, "the result of `{}`", meth),
            AssignSite::Operand(op) => write!(f, "an operand of `{}`", op),
        }
    }
}

/// A failure of the unifier.
#[derive(Clone, Debug)]
pub enum UnifyError {
    /// A variable would be bound to a type containing itself.
    Occurs { var: TyVar, ty: Type },
    /// Composition met two unrelated bindings for the same variable.
    IncompatibleMappings { var: TyVar, left: Type, right: Type },
    /// Two types cannot be made to agree.
    Mismatch { left: Type, right: Type },
    /// The subtype lacks a method the supertype requires.
    MissingMethod { ty: Type, meth: String },
    /// Corresponding signatures differ in formal or parameter count.
    SigShape { meth: String },
    /// A variable was left unconstrained.
    Unresolved { var: TyVar },
    /// A solved variable does not satisfy its recorded bound.
    Bound { var: TyVar, ty: Type, bound: Type },
    /// A type-algebra query failed during unification.
    Type(Box<TypeError>),
}

impl From<TypeError> for UnifyError {
    fn from(e: TypeError) -> Self {
        UnifyError::Type(Box::new(e))
    }
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::Occurs { var, ty } => {
                write!(f, "infinite type: {} occurs in {}", var, ty)
            }
            UnifyError::IncompatibleMappings { var, left, right } => {
                write!(f, "incompatible mappings for {}: {} and {}", var, left, right)
            }
            UnifyError::Mismatch { left, right } => {
                write!(f, "cannot unify {} with {}", left, right)
            }
            UnifyError::MissingMethod { ty, meth } => {
                write!(f, "{} has no method `{}`", ty, meth)
            }
            UnifyError::SigShape { meth } => {
                write!(f, "signatures of `{}` differ in shape", meth)
            }
            UnifyError::Unresolved { var } => write!(f, "nothing constrains {}", var),
            UnifyError::Bound { var, ty, bound } => {
                write!(f, "{} solved to {}, which does not implement {}", var, ty, bound)
            }
            UnifyError::Type(e) => write!(f, "{}", e),
        }
    }
}

/// A type error encountered while checking declarations or expressions.
#[derive(Clone, Debug)]
pub enum TypeError {
    // ── Declarations ────────────────────────────────────────────────────
    DuplicateType { name: String },
    DuplicateMethod { recv_type: String, meth: String },
    DuplicateFormal { name: String, decl: String },
    DuplicateField { name: String, ty: String },
    DuplicateParam { name: String, meth: String },
    DuplicateMethodSpec { meth: String, iface: String },
    /// Unfolding a declaration reaches the declaration itself through
    /// renaming or interface embedding.
    CyclicDecl { name: String },
    BadTypeSource { name: String, source: Type },
    /// A type formal's bound is not an interface or primitive.
    BadBound { formal: String, bound: Type },
    EmbedNotInterface { embedded: Named, iface: String },
    InterfaceReceiver { recv_type: String, meth: String },
    ReceiverArity { recv_type: String, meth: String, expected: usize, found: usize },
    FieldMethodClash { recv_type: String, name: String },

    // ── Types ───────────────────────────────────────────────────────────
    DeclNotFound { name: String },
    UnboundTypeParam { name: String },
    /// A named type applied to the wrong number of type arguments.
    ArityMismatch { ty: Type, expected: usize, found: usize },
    /// A type argument does not implement its formal's bound.
    BoundViolation { arg: Type, bound: Type, site: String },
    /// A type parameter was used as the upper bound of a concrete type.
    ParamAsBound { param: String, sub: Type },

    // ── Expressions ─────────────────────────────────────────────────────
    UnknownVariable { name: String },
    UnknownField { ty: Type, field: String },
    UnknownMethod { ty: Type, meth: String },
    NotAStruct { ty: Type, term: String },
    FieldCount { ty: Type, expected: usize, found: usize, term: String },
    ArgCount { meth: String, expected: usize, found: usize, term: String },
    TypeArgCount { meth: String, expected: usize, found: usize, term: String },
    NotAssignable { found: Type, expected: Type, site: AssignSite, term: String },
    AssertOnNonInterface { ty: Type, term: String },
    ImpossibleAssertion { ty: Type, target: Type, term: String },
    OperandMismatch { op: BinOp, lhs: Type, rhs: Type, term: String },
    InvalidOperand { op: BinOp, ty: Type, term: String },
    InvalidConversion { from: Type, to: PrimTag, term: String },
    NotRepresentable { value: String, ty: Type },

    // ── Inference ───────────────────────────────────────────────────────
    /// Omitted type arguments could not be reconstructed.
    CannotInfer { term: String, cause: UnifyError },
}

impl TypeError {
    /// The rendered sub-term the error is about, if it names one.
    pub fn term(&self) -> Option<String> {
        match self {
            TypeError::NotAStruct { term, .. }
            | TypeError::FieldCount { term, .. }
            | TypeError::ArgCount { term, .. }
            | TypeError::TypeArgCount { term, .. }
            | TypeError::NotAssignable { term, .. }
            | TypeError::AssertOnNonInterface { term, .. }
            | TypeError::ImpossibleAssertion { term, .. }
            | TypeError::OperandMismatch { term, .. }
            | TypeError::InvalidOperand { term, .. }
            | TypeError::InvalidConversion { term, .. }
            | TypeError::CannotInfer { term, .. } => Some(term.clone()),
            TypeError::DuplicateType { name }
            | TypeError::CyclicDecl { name }
            | TypeError::BadTypeSource { name, .. }
            | TypeError::DeclNotFound { name }
            | TypeError::UnknownVariable { name } => Some(name.clone()),
            TypeError::DuplicateMethod { meth, .. }
            | TypeError::InterfaceReceiver { meth, .. }
            | TypeError::ReceiverArity { meth, .. } => Some(meth.clone()),
            TypeError::UnknownField { field, .. } => Some(field.clone()),
            TypeError::UnknownMethod { meth, .. } => Some(meth.clone()),
            TypeError::BoundViolation { site, .. } => Some(site.clone()),
            TypeError::ArityMismatch { ty, .. } => Some(ty.to_string()),
            TypeError::NotRepresentable { value, .. } => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::DuplicateType { name } => write!(f, "type `{}` declared more than once", name),
            TypeError::DuplicateMethod { recv_type, meth } => {
                write!(f, "method `{}` declared more than once for `{}`", meth, recv_type)
            }
            TypeError::DuplicateFormal { name, decl } => {
                write!(f, "type parameter `{}` declared more than once in `{}`", name, decl)
            }
            TypeError::DuplicateField { name, ty } => {
                write!(f, "field `{}` declared more than once in {}", name, ty)
            }
            TypeError::DuplicateParam { name, meth } => {
                write!(f, "parameter `{}` declared more than once in `{}`", name, meth)
            }
            TypeError::DuplicateMethodSpec { meth, iface } => {
                write!(f, "method `{}` specified more than once in {}", meth, iface)
            }
            TypeError::CyclicDecl { name } => write!(f, "invalid recursive type `{}`", name),
            TypeError::BadTypeSource { name, source } => {
                write!(f, "type `{}` cannot be declared as {}", name, source)
            }
            TypeError::BadBound { formal, bound } => write!(
                f,
                "bound {} of type parameter `{}` is not an interface or primitive",
                bound, formal
            ),
            TypeError::EmbedNotInterface { embedded, iface } => {
                write!(f, "{} embedded in {} is not an interface", embedded, iface)
            }
            TypeError::InterfaceReceiver { recv_type, meth } => write!(
                f,
                "method `{}` has interface receiver type `{}`",
                meth, recv_type
            ),
            TypeError::ReceiverArity { recv_type, meth, expected, found } => write!(
                f,
                "receiver of `{}` binds {} type parameter(s), but `{}` has {}",
                meth, found, recv_type, expected
            ),
            TypeError::FieldMethodClash { recv_type, name } => {
                write!(f, "`{}` has both a field and a method named `{}`", recv_type, name)
            }
            TypeError::DeclNotFound { name } => write!(f, "undefined type `{}`", name),
            TypeError::UnboundTypeParam { name } => {
                write!(f, "type parameter `{}` is not in scope", name)
            }
            TypeError::ArityMismatch { ty, expected, found } => write!(
                f,
                "{} applied to {} type argument(s), expected {}",
                ty, found, expected
            ),
            TypeError::BoundViolation { arg, bound, site } => {
                write!(f, "type argument {} does not implement {} in {}", arg, bound, site)
            }
            TypeError::ParamAsBound { param, sub } => write!(
                f,
                "type parameter `{}` used as an upper bound of {}",
                param, sub
            ),
            TypeError::UnknownVariable { name } => write!(f, "undefined variable `{}`", name),
            TypeError::UnknownField { ty, field } => write!(f, "{} has no field `{}`", ty, field),
            TypeError::UnknownMethod { ty, meth } => write!(f, "{} has no method `{}`", ty, meth),
            TypeError::NotAStruct { ty, term } => {
                write!(f, "{} is not a struct type in `{}`", ty, term)
            }
            TypeError::FieldCount { ty, expected, found, term } => write!(
                f,
                "{} has {} field(s), but `{}` supplies {}",
                ty, expected, term, found
            ),
            TypeError::ArgCount { meth, expected, found, term } => write!(
                f,
                "`{}` takes {} argument(s), but `{}` supplies {}",
                meth, expected, term, found
            ),
            TypeError::TypeArgCount { meth, expected, found, term } => write!(
                f,
                "`{}` takes {} type argument(s), but `{}` supplies {}",
                meth, expected, term, found
            ),
            TypeError::NotAssignable { found, expected, site, term } => write!(
                f,
                "arg `{}` of type {} not assignable to {} of type {}",
                term, found, site, expected
            ),
            TypeError::AssertOnNonInterface { ty, term } => write!(
                f,
                "cannot assert on `{}` of non-interface type {}",
                term, ty
            ),
            TypeError::ImpossibleAssertion { ty, target, term } => write!(
                f,
                "impossible assertion `{}`: {} does not implement {}",
                term, target, ty
            ),
            TypeError::OperandMismatch { op, lhs, rhs, term } => write!(
                f,
                "mismatched operand types {} and {} for `{}` in `{}`",
                lhs, rhs, op, term
            ),
            TypeError::InvalidOperand { op, ty, term } => {
                write!(f, "operator `{}` not defined on {} in `{}`", op, ty, term)
            }
            TypeError::InvalidConversion { from, to, term } => {
                write!(f, "cannot convert {} to {} in `{}`", from, to.name(), term)
            }
            TypeError::NotRepresentable { value, ty } => {
                write!(f, "constant {} overflows {}", value, ty)
            }
            TypeError::CannotInfer { term, cause } => {
                write!(f, "cannot infer type arguments for `{}`: {}", term, cause)
            }
        }
    }
}

impl std::error::Error for TypeError {}
impl std::error::Error for UnifyError {}
