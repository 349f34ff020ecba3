//! Type representation for FGG.
//!
//! Defines the closed set of type variants (`Type`), method signatures
//! (`Sig`), interface specs, struct fields and type formals, together with
//! capture-avoiding type-parameter substitution.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// A substitution from type-parameter names to types ("eta").
pub type Eta = FxHashMap<String, Type>;

/// An inference variable, distinct from any declared type parameter.
///
/// Variables are only ever created by the inference engine; they never
/// appear in source programs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TyVar(pub u32);

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Primitive type tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimTag {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
}

impl PrimTag {
    pub fn name(self) -> &'static str {
        match self {
            PrimTag::Bool => "bool",
            PrimTag::Int32 => "int32",
            PrimTag::Int64 => "int64",
            PrimTag::Float32 => "float32",
            PrimTag::Float64 => "float64",
            PrimTag::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimTag> {
        Some(match name {
            "bool" => PrimTag::Bool,
            "int32" => PrimTag::Int32,
            "int64" => PrimTag::Int64,
            "float32" => PrimTag::Float32,
            "float64" => PrimTag::Float64,
            "string" => PrimTag::String,
            _ => return None,
        })
    }

    pub fn is_integral(self) -> bool {
        matches!(self, PrimTag::Int32 | PrimTag::Int64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimTag::Float32 | PrimTag::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_float()
    }

    /// Rank used when two untyped constants meet: floats dominate integers.
    pub fn rank(self) -> u8 {
        match self {
            PrimTag::Int32 => 1,
            PrimTag::Int64 => 2,
            PrimTag::Float32 => 3,
            PrimTag::Float64 => 4,
            PrimTag::Bool | PrimTag::String => 0,
        }
    }
}

/// A primitive type. `untyped` marks a numeric constant whose concrete
/// representation is still pending contextual resolution; its tag is then
/// the default the constant falls back to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prim {
    pub tag: PrimTag,
    pub untyped: bool,
}

impl Prim {
    pub fn typed(tag: PrimTag) -> Self {
        Prim { tag, untyped: false }
    }

    pub fn untyped(tag: PrimTag) -> Self {
        Prim { tag, untyped: true }
    }

    /// The concrete type an untyped constant takes when nothing else applies.
    pub fn default_type(self) -> Prim {
        Prim::typed(self.tag)
    }
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.untyped {
            return f.write_str(self.tag.name());
        }
        let kind = match self.tag {
            PrimTag::Int32 | PrimTag::Int64 => "int",
            PrimTag::Float32 | PrimTag::Float64 => "float",
            PrimTag::Bool => "bool",
            PrimTag::String => "string",
        };
        write!(f, "untyped {}", kind)
    }
}

/// A named type: a declared type name applied to type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
    pub args: Vec<Type>,
}

impl Named {
    pub fn new(name: impl Into<String>, args: Vec<Type>) -> Self {
        Named { name: name.into(), args }
    }

    pub fn subst(&self, eta: &Eta) -> Named {
        Named {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.subst(eta)).collect(),
        }
    }
}

impl fmt::Display for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.args, ", ")?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A labelled struct field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
}

impl fmt::Display for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

/// A type formal: a parameter name with its upper bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeFormal {
    pub name: String,
    pub bound: Type,
}

impl fmt::Display for TypeFormal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.bound)
    }
}

/// A value parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: Type,
}

impl fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

/// A method signature, binding its own type formals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sig {
    pub meth: String,
    pub formals: Vec<TypeFormal>,
    pub params: Vec<ParamDecl>,
    pub ret: Type,
}

impl Sig {
    fn binds(&self, name: &str) -> bool {
        self.formals.iter().any(|f| f.name == name)
    }

    /// Apply `eta` to bounds, parameter types and the return type without
    /// any shadowing logic. Callers guarantee no formal is captured.
    fn apply_inside(&self, eta: &Eta) -> Sig {
        Sig {
            meth: self.meth.clone(),
            formals: self
                .formals
                .iter()
                .map(|f| TypeFormal { name: f.name.clone(), bound: f.bound.subst(eta) })
                .collect(),
            params: self
                .params
                .iter()
                .map(|p| ParamDecl { name: p.name.clone(), ty: p.ty.subst(eta) })
                .collect(),
            ret: self.ret.subst(eta),
        }
    }

    /// Rename the signature's own formals positionally to `names`.
    pub fn rename_formals(&self, names: &[String]) -> Sig {
        let renaming: Eta = self
            .formals
            .iter()
            .zip(names)
            .map(|(f, n)| (f.name.clone(), Type::Param(n.clone())))
            .collect();
        let mut sig = self.apply_inside(&renaming);
        for (formal, name) in sig.formals.iter_mut().zip(names) {
            formal.name = name.clone();
        }
        sig
    }

    /// The signature with its formals renamed to `α1, α2, ...` by position.
    pub fn canonical(&self) -> Sig {
        let names: Vec<String> = (1..=self.formals.len()).map(|i| format!("α{}", i)).collect();
        self.rename_formals(&names)
    }

    /// Capture-avoiding substitution. The signature's own formals shadow
    /// entries of `eta`, and are renamed if a substituted type mentions them.
    pub fn subst(&self, eta: &Eta) -> Sig {
        let inner: Eta = eta
            .iter()
            .filter(|(k, _)| !self.binds(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if inner.is_empty() {
            return self.clone();
        }
        let mut free = FxHashSet::default();
        for ty in inner.values() {
            ty.collect_free_params(&mut free);
        }
        if !self.formals.iter().any(|f| free.contains(&f.name)) {
            return self.apply_inside(&inner);
        }
        let mut taken = free;
        taken.extend(self.formals.iter().map(|f| f.name.clone()));
        let names: Vec<String> = self
            .formals
            .iter()
            .map(|f| {
                if !taken.contains(&f.name) || !inner.values().any(|t| t.mentions(&f.name)) {
                    return f.name.clone();
                }
                let mut fresh = format!("{}'", f.name);
                while taken.contains(&fresh) {
                    fresh.push('\'');
                }
                taken.insert(fresh.clone());
                fresh
            })
            .collect();
        self.rename_formals(&names).apply_inside(&inner)
    }

    /// Alpha-equivalence: equal after canonical renaming of each side's own
    /// formals, ignoring value-parameter names.
    pub fn alpha_equals(&self, other: &Sig) -> bool {
        if self.meth != other.meth
            || self.formals.len() != other.formals.len()
            || self.params.len() != other.params.len()
        {
            return false;
        }
        let (a, b) = (self.canonical(), other.canonical());
        a.formals.iter().zip(&b.formals).all(|(x, y)| x.bound == y.bound)
            && a.params.iter().zip(&b.params).all(|(x, y)| x.ty == y.ty)
            && a.ret == b.ret
    }

    fn collect_free_params(&self, out: &mut FxHashSet<String>) {
        let mut inner = FxHashSet::default();
        for f in &self.formals {
            f.bound.collect_free_params(&mut inner);
        }
        for p in &self.params {
            p.ty.collect_free_params(&mut inner);
        }
        self.ret.collect_free_params(&mut inner);
        out.extend(inner.into_iter().filter(|n| !self.binds(n)));
    }
}

impl fmt::Display for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.meth)?;
        if !self.formals.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.formals, ", ")?;
            write!(f, ")")?;
        }
        write!(f, "(")?;
        write_list(f, &self.params, ", ")?;
        write!(f, ") {}", self.ret)
    }
}

/// An interface member: a method signature or an embedded interface.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spec {
    Sig(Sig),
    Embed(Named),
}

impl Spec {
    pub fn subst(&self, eta: &Eta) -> Spec {
        match self {
            Spec::Sig(s) => Spec::Sig(s.subst(eta)),
            Spec::Embed(n) => Spec::Embed(n.subst(eta)),
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spec::Sig(s) => write!(f, "{}", s),
            Spec::Embed(n) => write!(f, "{}", n),
        }
    }
}

/// An FGG type.
///
/// - `Param`: a type-parameter reference, meaningful relative to a bounding
///   context
/// - `Named`: a declared type applied to type arguments
/// - `Prim`: a primitive, possibly an untyped constant
/// - `Struct` / `Interface`: anonymous literal types, always fully expanded
/// - `Var`: an inference variable
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Param(String),
    Named(Named),
    Prim(Prim),
    Struct(Vec<FieldDecl>),
    Interface(Vec<Spec>),
    Var(TyVar),
}

impl Type {
    // ── Constructors ────────────────────────────────────────────────────

    pub fn param(name: impl Into<String>) -> Type {
        Type::Param(name.into())
    }

    pub fn named(name: impl Into<String>, args: Vec<Type>) -> Type {
        Type::Named(Named::new(name, args))
    }

    pub fn prim(tag: PrimTag) -> Type {
        Type::Prim(Prim::typed(tag))
    }

    pub fn bool() -> Type {
        Type::prim(PrimTag::Bool)
    }

    pub fn int32() -> Type {
        Type::prim(PrimTag::Int32)
    }

    pub fn int64() -> Type {
        Type::prim(PrimTag::Int64)
    }

    pub fn float32() -> Type {
        Type::prim(PrimTag::Float32)
    }

    pub fn float64() -> Type {
        Type::prim(PrimTag::Float64)
    }

    pub fn string() -> Type {
        Type::prim(PrimTag::String)
    }

    /// The empty interface literal, implemented by every type.
    pub fn empty_interface() -> Type {
        Type::Interface(Vec::new())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn as_named(&self) -> Option<&Named> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_prim(&self) -> Option<Prim> {
        match self {
            Type::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Prim(p) if p.untyped)
    }

    /// Structural substitution of type parameters. Parameters absent from
    /// `eta` are left unchanged.
    pub fn subst(&self, eta: &Eta) -> Type {
        if eta.is_empty() {
            return self.clone();
        }
        match self {
            Type::Param(p) => eta.get(p).cloned().unwrap_or_else(|| self.clone()),
            Type::Named(n) => Type::Named(n.subst(eta)),
            Type::Prim(_) | Type::Var(_) => self.clone(),
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| FieldDecl { name: f.name.clone(), ty: f.ty.subst(eta) })
                    .collect(),
            ),
            Type::Interface(specs) => Type::Interface(specs.iter().map(|s| s.subst(eta)).collect()),
        }
    }

    fn collect_free_params(&self, out: &mut FxHashSet<String>) {
        match self {
            Type::Param(p) => {
                out.insert(p.clone());
            }
            Type::Named(n) => n.args.iter().for_each(|a| a.collect_free_params(out)),
            Type::Prim(_) | Type::Var(_) => {}
            Type::Struct(fields) => fields.iter().for_each(|f| f.ty.collect_free_params(out)),
            Type::Interface(specs) => {
                for spec in specs {
                    match spec {
                        Spec::Sig(s) => s.collect_free_params(out),
                        Spec::Embed(n) => n.args.iter().for_each(|a| a.collect_free_params(out)),
                    }
                }
            }
        }
    }

    /// Type parameters occurring free in this type.
    pub fn free_params(&self) -> FxHashSet<String> {
        let mut out = FxHashSet::default();
        self.collect_free_params(&mut out);
        out
    }

    /// Whether the type parameter `name` occurs free in this type.
    pub fn mentions(&self, name: &str) -> bool {
        self.free_params().contains(name)
    }

    /// Whether any inference variable occurs in this type.
    pub fn has_vars(&self) -> bool {
        let mut found = false;
        self.visit(&mut |t| found |= matches!(t, Type::Var(_)));
        found
    }

    /// Whether `var` occurs anywhere in this type.
    pub fn occurs(&self, var: TyVar) -> bool {
        let mut found = false;
        self.visit(&mut |t| found |= *t == Type::Var(var));
        found
    }

    /// A type with no free type parameters and no inference variables.
    pub fn is_ground(&self) -> bool {
        self.free_params().is_empty() && !self.has_vars()
    }

    /// Nesting depth: leaves count 1, each constructor layer adds 1.
    pub fn depth(&self) -> usize {
        match self {
            Type::Param(_) | Type::Prim(_) | Type::Var(_) => 1,
            Type::Named(n) => 1 + n.args.iter().map(Type::depth).max().unwrap_or(0),
            Type::Struct(fields) => 1 + fields.iter().map(|f| f.ty.depth()).max().unwrap_or(0),
            Type::Interface(specs) => {
                1 + specs
                    .iter()
                    .map(|s| match s {
                        Spec::Sig(sig) => sig
                            .params
                            .iter()
                            .map(|p| p.ty.depth())
                            .chain(sig.formals.iter().map(|f| f.bound.depth()))
                            .chain(std::iter::once(sig.ret.depth()))
                            .max()
                            .unwrap_or(0),
                        Spec::Embed(n) => n.args.iter().map(Type::depth).max().unwrap_or(0),
                    })
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Pre-order walk over this type and every nested type.
    pub fn visit(&self, f: &mut impl FnMut(&Type)) {
        f(self);
        match self {
            Type::Param(_) | Type::Prim(_) | Type::Var(_) => {}
            Type::Named(n) => n.args.iter().for_each(|a| a.visit(f)),
            Type::Struct(fields) => fields.iter().for_each(|fd| fd.ty.visit(f)),
            Type::Interface(specs) => {
                for spec in specs {
                    match spec {
                        Spec::Sig(s) => {
                            s.formals.iter().for_each(|tf| tf.bound.visit(f));
                            s.params.iter().for_each(|p| p.ty.visit(f));
                            s.ret.visit(f);
                        }
                        Spec::Embed(n) => n.args.iter().for_each(|a| a.visit(f)),
                    }
                }
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Param(p) => f.write_str(p),
            Type::Named(n) => write!(f, "{}", n),
            Type::Prim(p) => write!(f, "{}", p),
            Type::Var(v) => write!(f, "{}", v),
            Type::Struct(fields) if fields.is_empty() => f.write_str("struct {}"),
            Type::Struct(fields) => {
                write!(f, "struct {{ ")?;
                write_list(f, fields, "; ")?;
                write!(f, " }}")
            }
            Type::Interface(specs) if specs.is_empty() => f.write_str("interface {}"),
            Type::Interface(specs) => {
                write!(f, "interface {{ ")?;
                write_list(f, specs, "; ")?;
                write!(f, " }}")
            }
        }
    }
}

pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
