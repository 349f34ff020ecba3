//! Expressions and literal values.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ty::{write_list, Eta, Named, Prim, PrimTag, Type};

/// The payload of a primitive literal. Both integer widths share `Int` and
/// both float widths share `Float`; the owning `Literal`'s tag says how the
/// value is represented.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LitValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A primitive constant together with its (possibly untyped) type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LitValue,
    pub prim: Prim,
}

impl Literal {
    /// An untyped integer constant.
    pub fn int(n: i64) -> Self {
        Literal { value: LitValue::Int(n), prim: Prim::untyped(PrimTag::Int64) }
    }

    /// An untyped floating-point constant.
    pub fn float(x: f64) -> Self {
        Literal { value: LitValue::Float(x), prim: Prim::untyped(PrimTag::Float64) }
    }

    pub fn bool(b: bool) -> Self {
        Literal { value: LitValue::Bool(b), prim: Prim::typed(PrimTag::Bool) }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Literal { value: LitValue::Str(s.into()), prim: Prim::typed(PrimTag::String) }
    }

    /// A typed numeric constant, normalized to the tag's representation.
    pub fn typed(tag: PrimTag, value: LitValue) -> Option<Self> {
        Literal { value, prim: Prim::untyped(tag) }.convert(tag)
    }

    /// Whether the constant's value fits `tag` without loss.
    pub fn representable_as(&self, tag: PrimTag) -> bool {
        match (&self.value, tag) {
            (LitValue::Bool(_), PrimTag::Bool) | (LitValue::Str(_), PrimTag::String) => true,
            (LitValue::Int(n), PrimTag::Int32) => i32::try_from(*n).is_ok(),
            (LitValue::Int(_), PrimTag::Int64 | PrimTag::Float32 | PrimTag::Float64) => true,
            (LitValue::Float(x), PrimTag::Float32) => !x.is_finite() || x.abs() <= f32::MAX as f64,
            (LitValue::Float(_), PrimTag::Float64) => true,
            (LitValue::Float(x), PrimTag::Int32) => {
                x.fract() == 0.0 && *x >= i32::MIN as f64 && *x <= i32::MAX as f64
            }
            (LitValue::Float(x), PrimTag::Int64) => {
                x.fract() == 0.0 && *x >= i64::MIN as f64 && *x <= i64::MAX as f64
            }
            _ => false,
        }
    }

    /// Conversion to the typed primitive `tag`. Integer narrowing wraps and
    /// float-to-integer conversion truncates toward zero. Returns `None` for
    /// conversions between unrelated kinds.
    pub fn convert(&self, tag: PrimTag) -> Option<Literal> {
        let value = match (&self.value, tag) {
            (LitValue::Bool(b), PrimTag::Bool) => LitValue::Bool(*b),
            (LitValue::Str(s), PrimTag::String) => LitValue::Str(s.clone()),
            (LitValue::Int(n), PrimTag::Int32) => LitValue::Int(*n as i32 as i64),
            (LitValue::Int(n), PrimTag::Int64) => LitValue::Int(*n),
            (LitValue::Int(n), PrimTag::Float32) => LitValue::Float(*n as f32 as f64),
            (LitValue::Int(n), PrimTag::Float64) => LitValue::Float(*n as f64),
            (LitValue::Float(x), PrimTag::Int32) => LitValue::Int(*x as i32 as i64),
            (LitValue::Float(x), PrimTag::Int64) => LitValue::Int(*x as i64),
            (LitValue::Float(x), PrimTag::Float32) => LitValue::Float(*x as f32 as f64),
            (LitValue::Float(x), PrimTag::Float64) => LitValue::Float(*x),
            _ => return None,
        };
        Some(Literal { value, prim: Prim::typed(tag) })
    }
}

impl fmt::Display for LitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LitValue::Bool(b) => write!(f, "{}", b),
            LitValue::Int(n) => write!(f, "{}", n),
            LitValue::Float(x) => write!(f, "{:?}", x),
            LitValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prim.untyped || matches!(self.prim.tag, PrimTag::Bool | PrimTag::String) {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}({})", self.prim.tag.name(), self.value)
        }
    }
}

/// Binary operators over primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An FGG expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A variable reference.
    Var(String),
    /// `T(args){e1, ..., en}`. Type arguments may be omitted when inference
    /// is used.
    StructLit { ty: Named, elems: Vec<Expr> },
    /// `e.f`
    Select { expr: Box<Expr>, field: String },
    /// `e.m(targs)(args)`
    Call { recv: Box<Expr>, meth: String, targs: Vec<Type>, args: Vec<Expr> },
    /// `e.(T)`
    Assert { expr: Box<Expr>, ty: Type },
    /// `fmt.Sprintf(format, args...)`
    Sprintf { format: String, args: Vec<Expr> },
    Lit(Literal),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `prim(e)`: an explicit or inserted primitive conversion.
    Convert { prim: PrimTag, expr: Box<Expr> },
}

impl Expr {
    /// Values are literals and struct literals whose elements are values.
    pub fn is_value(&self) -> bool {
        match self {
            Expr::Lit(_) => true,
            Expr::StructLit { elems, .. } => elems.iter().all(Expr::is_value),
            _ => false,
        }
    }

    /// Substitute type parameters in every type annotation of the tree.
    pub fn subst_types(&self, eta: &Eta) -> Expr {
        if eta.is_empty() {
            return self.clone();
        }
        match self {
            Expr::Var(_) | Expr::Lit(_) => self.clone(),
            Expr::StructLit { ty, elems } => Expr::StructLit {
                ty: ty.subst(eta),
                elems: elems.iter().map(|e| e.subst_types(eta)).collect(),
            },
            Expr::Select { expr, field } => {
                Expr::Select { expr: Box::new(expr.subst_types(eta)), field: field.clone() }
            }
            Expr::Call { recv, meth, targs, args } => Expr::Call {
                recv: Box::new(recv.subst_types(eta)),
                meth: meth.clone(),
                targs: targs.iter().map(|t| t.subst(eta)).collect(),
                args: args.iter().map(|a| a.subst_types(eta)).collect(),
            },
            Expr::Assert { expr, ty } => {
                Expr::Assert { expr: Box::new(expr.subst_types(eta)), ty: ty.subst(eta) }
            }
            Expr::Sprintf { format, args } => Expr::Sprintf {
                format: format.clone(),
                args: args.iter().map(|a| a.subst_types(eta)).collect(),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: *op,
                lhs: Box::new(lhs.subst_types(eta)),
                rhs: Box::new(rhs.subst_types(eta)),
            },
            Expr::Convert { prim, expr } => {
                Expr::Convert { prim: *prim, expr: Box::new(expr.subst_types(eta)) }
            }
        }
    }

    /// Substitute expressions for free variables, all at once.
    pub fn subst_vars(&self, env: &FxHashMap<String, Expr>) -> Expr {
        self.map_children(&|e| match e {
            Expr::Var(x) => Some(env.get(x).cloned().unwrap_or_else(|| e.clone())),
            _ => None,
        })
    }

    /// Bottom-up rewrite: `f` may replace a node outright; otherwise its
    /// children are rewritten and the node rebuilt.
    pub fn map_children(&self, f: &impl Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(e) = f(self) {
            return e;
        }
        match self {
            Expr::Var(_) | Expr::Lit(_) => self.clone(),
            Expr::StructLit { ty, elems } => Expr::StructLit {
                ty: ty.clone(),
                elems: elems.iter().map(|e| e.map_children(f)).collect(),
            },
            Expr::Select { expr, field } => {
                Expr::Select { expr: Box::new(expr.map_children(f)), field: field.clone() }
            }
            Expr::Call { recv, meth, targs, args } => Expr::Call {
                recv: Box::new(recv.map_children(f)),
                meth: meth.clone(),
                targs: targs.clone(),
                args: args.iter().map(|a| a.map_children(f)).collect(),
            },
            Expr::Assert { expr, ty } => {
                Expr::Assert { expr: Box::new(expr.map_children(f)), ty: ty.clone() }
            }
            Expr::Sprintf { format, args } => Expr::Sprintf {
                format: format.clone(),
                args: args.iter().map(|a| a.map_children(f)).collect(),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: *op,
                lhs: Box::new(lhs.map_children(f)),
                rhs: Box::new(rhs.map_children(f)),
            },
            Expr::Convert { prim, expr } => {
                Expr::Convert { prim: *prim, expr: Box::new(expr.map_children(f)) }
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    match e {
        Expr::Binary { .. } => write!(f, "({})", e),
        _ => write!(f, "{}", e),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(x) => f.write_str(x),
            Expr::StructLit { ty, elems } => {
                write!(f, "{}{{", ty)?;
                write_list(f, elems, ", ")?;
                write!(f, "}}")
            }
            Expr::Select { expr, field } => write!(f, "{}.{}", expr, field),
            Expr::Call { recv, meth, targs, args } => {
                write!(f, "{}.{}", recv, meth)?;
                if !targs.is_empty() {
                    write!(f, "(")?;
                    write_list(f, targs, ", ")?;
                    write!(f, ")")?;
                }
                write!(f, "(")?;
                write_list(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::Assert { expr, ty } => write!(f, "{}.({})", expr, ty),
            Expr::Sprintf { format, args } => {
                write!(f, "fmt.Sprintf({:?}", format)?;
                for a in args {
                    write!(f, ", {}", a)?;
                }
                write!(f, ")")
            }
            Expr::Lit(lit) => write!(f, "{}", lit),
            Expr::Binary { op, lhs, rhs } => {
                write_operand(f, lhs)?;
                write!(f, " {} ", op)?;
                write_operand(f, rhs)
            }
            Expr::Convert { prim, expr } => write!(f, "{}({})", prim.name(), expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    #[test]
    fn typed_numeric_literals_render_as_conversions() {
        assert_eq!(lit(Literal::int(5)).to_string(), "5");
        assert_eq!(int32(5).to_string(), "int32(5)");
        assert_eq!(lit(Literal::string("hi")).to_string(), "\"hi\"");
        assert_eq!(lit(Literal::float(1.5)).to_string(), "1.5");
    }

    #[test]
    fn int32_conversion_wraps() {
        let big = Literal::int(i32::MAX as i64 + 1);
        assert!(!big.representable_as(PrimTag::Int32));
        let wrapped = big.convert(PrimTag::Int32).unwrap();
        assert_eq!(wrapped.value, LitValue::Int(i32::MIN as i64));
    }

    #[test]
    fn nested_binary_operands_are_parenthesized() {
        let e = bin(BinOp::Mul, bin(BinOp::Add, int32(1), int32(2)), int32(3));
        assert_eq!(e.to_string(), "(int32(1) + int32(2)) * int32(3)");
    }

    #[test]
    fn calls_render_type_args_only_when_present() {
        let recv = struct_lit("S", vec![], vec![]);
        let plain = call(recv.clone(), "m", vec![], vec![var("y")]);
        assert_eq!(plain.to_string(), "S{}.m(y)");
        let generic = call(recv, "id", vec![named("S", vec![])], vec![struct_lit("S", vec![], vec![])]);
        assert_eq!(generic.to_string(), "S{}.id(S)(S{})");
    }

    #[test]
    fn subst_vars_replaces_all_occurrences_at_once() {
        let body = call(var("x"), "m", vec![], vec![var("y"), var("x")]);
        let env: FxHashMap<String, Expr> = [
            ("x".to_string(), var("y")),
            ("y".to_string(), struct_lit("A", vec![], vec![])),
        ]
        .into_iter()
        .collect();
        assert_eq!(body.subst_vars(&env).to_string(), "y.m(A{}, y)");
    }

    #[test]
    fn values_are_literals_and_complete_struct_literals() {
        assert!(struct_lit("B", vec![], vec![struct_lit("A", vec![], vec![])]).is_value());
        assert!(!struct_lit("B", vec![], vec![var("x")]).is_value());
        assert!(!select(struct_lit("A", vec![], vec![]), "f").is_value());
    }
}
