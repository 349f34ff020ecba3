//! Top-level declarations and programs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::ty::{write_list, Named, ParamDecl, Sig, Type, TypeFormal};

/// `type Name(formals) source`
///
/// The source is a struct literal, an interface literal, or another named
/// type (a definition chain).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub formals: Vec<TypeFormal>,
    pub source: Type,
}

impl TypeDecl {
    /// The declared type applied to its own formals, e.g. `List(a)`.
    pub fn self_type(&self) -> Named {
        Named::new(
            self.name.clone(),
            self.formals.iter().map(|f| Type::Param(f.name.clone())).collect(),
        )
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)?;
        if !self.formals.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.formals, ", ")?;
            write!(f, ")")?;
        }
        write!(f, " {}", self.source)
    }
}

/// `func (recv RecvType(recv_formals)) name(formals)(params) ret { return body }`
///
/// The receiver formals re-bind the receiver type's parameters locally and
/// may carry bounds stronger than the type declaration's.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethDecl {
    pub recv: String,
    pub recv_type: String,
    pub recv_formals: Vec<TypeFormal>,
    pub name: String,
    pub formals: Vec<TypeFormal>,
    pub params: Vec<ParamDecl>,
    pub ret: Type,
    pub body: Expr,
}

impl MethDecl {
    /// The receiver type applied to the receiver formals.
    pub fn recv_named(&self) -> Named {
        Named::new(
            self.recv_type.clone(),
            self.recv_formals.iter().map(|f| Type::Param(f.name.clone())).collect(),
        )
    }

    pub fn sig(&self) -> Sig {
        Sig {
            meth: self.name.clone(),
            formals: self.formals.clone(),
            params: self.params.clone(),
            ret: self.ret.clone(),
        }
    }
}

impl fmt::Display for MethDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func ({} {}", self.recv, self.recv_type)?;
        if !self.recv_formals.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.recv_formals, ", ")?;
            write!(f, ")")?;
        }
        write!(f, ") {} {{ return {} }}", self.sig(), self.body)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Type(TypeDecl),
    Meth(MethDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Type(td) => &td.name,
            Decl::Meth(md) => &md.name,
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Type(td) => write!(f, "{}", td),
            Decl::Meth(md) => write!(f, "{}", md),
        }
    }
}

/// A whole program: declarations plus the main expression. With `printf`
/// set, main's value is printed with `fmt.Printf("%#v", ...)` instead of
/// being discarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub main: Expr,
    #[serde(default)]
    pub printf: bool,
}

impl Program {
    pub fn new(decls: Vec<Decl>, main: Expr) -> Self {
        Program { decls, main, printf: false }
    }

    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(td) => Some(td),
            Decl::Meth(_) => None,
        })
    }

    pub fn meth_decls(&self) -> impl Iterator<Item = &MethDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Meth(md) => Some(md),
            Decl::Type(_) => None,
        })
    }

    /// The same program with a different main expression.
    pub fn with_main(&self, main: Expr) -> Program {
        Program { decls: self.decls.clone(), main, printf: self.printf }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "package main;")?;
        if self.printf {
            writeln!(f, "import \"fmt\";")?;
        }
        for d in &self.decls {
            writeln!(f, "{};", d)?;
        }
        if self.printf {
            write!(f, "func main() {{ fmt.Printf(\"%#v\", {}) }}", self.main)
        } else {
            write!(f, "func main() {{ _ = {} }}", self.main)
        }
    }
}
