//! Terse constructors for assembling programs by hand, mostly in tests.

use crate::decl::{Decl, MethDecl, TypeDecl};
use crate::expr::{BinOp, Expr, Literal};
use crate::ty::{FieldDecl, Named, ParamDecl, PrimTag, Sig, Spec, Type, TypeFormal};

pub fn named(name: &str, args: Vec<Type>) -> Type {
    Type::named(name, args)
}

pub fn param(name: &str) -> Type {
    Type::param(name)
}

pub fn structure(fields: Vec<FieldDecl>) -> Type {
    Type::Struct(fields)
}

pub fn iface(specs: Vec<Spec>) -> Type {
    Type::Interface(specs)
}

pub fn field(name: &str, ty: Type) -> FieldDecl {
    FieldDecl { name: name.into(), ty }
}

pub fn formal(name: &str, bound: Type) -> TypeFormal {
    TypeFormal { name: name.into(), bound }
}

pub fn param_decl(name: &str, ty: Type) -> ParamDecl {
    ParamDecl { name: name.into(), ty }
}

pub fn sig(meth: &str, formals: Vec<TypeFormal>, params: Vec<ParamDecl>, ret: Type) -> Spec {
    Spec::Sig(Sig { meth: meth.into(), formals, params, ret })
}

pub fn embed(name: &str, args: Vec<Type>) -> Spec {
    Spec::Embed(Named::new(name, args))
}

pub fn type_decl(name: &str, formals: Vec<TypeFormal>, source: Type) -> Decl {
    Decl::Type(TypeDecl { name: name.into(), formals, source })
}

/// `func (recv RecvType(recv_formals)) name(formals)(params) ret { return body }`
pub fn method(
    (recv, recv_type, recv_formals): (&str, &str, Vec<TypeFormal>),
    name: &str,
    formals: Vec<TypeFormal>,
    params: Vec<ParamDecl>,
    ret: Type,
    body: Expr,
) -> Decl {
    Decl::Meth(MethDecl {
        recv: recv.into(),
        recv_type: recv_type.into(),
        recv_formals,
        name: name.into(),
        formals,
        params,
        ret,
        body,
    })
}

pub fn var(name: &str) -> Expr {
    Expr::Var(name.into())
}

pub fn struct_lit(name: &str, args: Vec<Type>, elems: Vec<Expr>) -> Expr {
    Expr::StructLit { ty: Named::new(name, args), elems }
}

pub fn select(expr: Expr, field: &str) -> Expr {
    Expr::Select { expr: Box::new(expr), field: field.into() }
}

pub fn call(recv: Expr, meth: &str, targs: Vec<Type>, args: Vec<Expr>) -> Expr {
    Expr::Call { recv: Box::new(recv), meth: meth.into(), targs, args }
}

pub fn assert_ty(expr: Expr, ty: Type) -> Expr {
    Expr::Assert { expr: Box::new(expr), ty }
}

pub fn sprintf(format: &str, args: Vec<Expr>) -> Expr {
    Expr::Sprintf { format: format.into(), args }
}

pub fn lit(l: Literal) -> Expr {
    Expr::Lit(l)
}

pub fn int(n: i64) -> Expr {
    Expr::Lit(Literal::int(n))
}

pub fn int32(n: i32) -> Expr {
    Expr::Lit(Literal {
        value: crate::expr::LitValue::Int(n as i64),
        prim: crate::ty::Prim::typed(PrimTag::Int32),
    })
}

pub fn string(s: &str) -> Expr {
    Expr::Lit(Literal::string(s))
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

pub fn convert(prim: PrimTag, expr: Expr) -> Expr {
    Expr::Convert { prim, expr: Box::new(expr) }
}
