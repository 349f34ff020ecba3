//! Abstract syntax for Featherweight Generic Go (FGG).
//!
//! One AST serves both the generic calculus and its ground, generics-free
//! image produced by monomorphization: a ground program is simply a program
//! whose declarations carry no type formals and whose named types carry no
//! type arguments.
//!
//! Every node renders back to concrete syntax through `Display`, and every
//! node is an immutable value: substitution and the other rewrites return new
//! trees.

pub mod build;
pub mod decl;
pub mod expr;
pub mod ty;

pub use decl::{Decl, MethDecl, Program, TypeDecl};
pub use expr::{BinOp, Expr, LitValue, Literal};
pub use ty::{
    Eta, FieldDecl, Named, ParamDecl, Prim, PrimTag, Sig, Spec, TyVar, Type, TypeFormal,
};
