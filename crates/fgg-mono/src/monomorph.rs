//! Translation of a generic program into a ground one over a discovered
//! instantiation set.

use rustc_hash::FxHashSet;

use fgg_syntax::{
    Decl, Expr, FieldDecl, MethDecl, Named, ParamDecl, Program, Sig, Spec, Type, TypeDecl,
};
use fgg_typeck::types::formals_eta;
use fgg_typeck::{DeclTable, Delta};

use crate::error::MonoError;
use crate::instances::MethInst;
use crate::mangle::{fresh_name, hash_name, mangle_meth, mangle_named};
use crate::omega::Omega;

/// Base name of the synthetic empty interface the placeholders return.
pub const TOP: &str = "Top";

/// The synthetic interface's name for a program: [`TOP`], suffixed if a
/// declaration already uses it.
pub fn top_name(table: &DeclTable) -> String {
    let taken: FxHashSet<String> = table.type_decls().map(|td| td.name.clone()).collect();
    fresh_name(TOP, &taken)
}

/// The ground image of types and expressions, for one choice of the
/// synthetic interface's name.
#[derive(Clone, Debug)]
pub struct Mono {
    top: String,
}

impl Mono {
    pub fn new(top: impl Into<String>) -> Self {
        Mono { top: top.into() }
    }

    pub fn for_table(table: &DeclTable) -> Self {
        Mono::new(top_name(table))
    }

    pub fn top(&self) -> &str {
        &self.top
    }

    pub fn ty(&self, ty: &Type) -> Result<Type, MonoError> {
        match ty {
            Type::Named(n) => {
                if !ty.is_ground() {
                    return Err(MonoError::NotGround { ty: ty.clone() });
                }
                Ok(Type::Named(Named::new(mangle_named(n), vec![])))
            }
            Type::Prim(_) => Ok(ty.clone()),
            Type::Param(_) | Type::Var(_) => Err(MonoError::NotGround { ty: ty.clone() }),
            Type::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| Ok(FieldDecl { name: f.name.clone(), ty: self.ty(&f.ty)? }))
                    .collect::<Result<Vec<_>, MonoError>>()?;
                Ok(Type::Struct(fields))
            }
            Type::Interface(specs) => {
                let mut out = Vec::with_capacity(specs.len());
                for spec in specs {
                    out.push(match spec {
                        Spec::Sig(sig) if sig.formals.is_empty() => Spec::Sig(self.sig(sig, sig.meth.clone())?),
                        Spec::Sig(sig) => Spec::Sig(self.placeholder(sig)),
                        Spec::Embed(n) => Spec::Embed(Named::new(mangle_named(n), vec![])),
                    });
                }
                Ok(Type::Interface(out))
            }
        }
    }

    /// A formal-free signature renamed to `name`.
    fn sig(&self, sig: &Sig, name: String) -> Result<Sig, MonoError> {
        let params = sig
            .params
            .iter()
            .map(|p| Ok(ParamDecl { name: p.name.clone(), ty: self.ty(&p.ty)? }))
            .collect::<Result<Vec<_>, MonoError>>()?;
        Ok(Sig { meth: name, formals: vec![], params, ret: self.ty(&sig.ret)? })
    }

    /// `mǂ<hash>() Top`
    fn placeholder(&self, sig: &Sig) -> Sig {
        Sig { meth: hash_name(sig), formals: vec![], params: vec![], ret: Type::named(&self.top, vec![]) }
    }

    /// Struct literal types and assertion targets are mangled, and calls
    /// name the instantiated method.
    pub fn expr(&self, e: &Expr) -> Result<Expr, MonoError> {
        let all = |es: &[Expr]| es.iter().map(|x| self.expr(x)).collect::<Result<Vec<_>, MonoError>>();
        Ok(match e {
            Expr::StructLit { ty, elems } => {
                if !ty.args.iter().all(Type::is_ground) {
                    return Err(MonoError::NotGround { ty: Type::Named(ty.clone()) });
                }
                Expr::StructLit { ty: Named::new(mangle_named(ty), vec![]), elems: all(elems)? }
            }
            Expr::Call { recv, meth, targs, args } => {
                if let Some(bad) = targs.iter().find(|t| !t.is_ground()) {
                    return Err(MonoError::NotGround { ty: bad.clone() });
                }
                Expr::Call {
                    recv: Box::new(self.expr(recv)?),
                    meth: mangle_meth(meth, targs),
                    targs: vec![],
                    args: all(args)?,
                }
            }
            Expr::Assert { expr, ty } => Expr::Assert { expr: Box::new(self.expr(expr)?), ty: self.ty(ty)? },
            Expr::Select { expr, field } => Expr::Select { expr: Box::new(self.expr(expr)?), field: field.clone() },
            Expr::Sprintf { format, args } => Expr::Sprintf { format: format.clone(), args: all(args)? },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: *op,
                lhs: Box::new(self.expr(lhs)?),
                rhs: Box::new(self.expr(rhs)?),
            },
            Expr::Convert { prim, expr } => Expr::Convert { prim: *prim, expr: Box::new(self.expr(expr)?) },
            Expr::Var(_) | Expr::Lit(_) => e.clone(),
        })
    }
}

/// The ground image of a type, with placeholders returning [`TOP`].
pub fn mono_type(ty: &Type) -> Result<Type, MonoError> {
    Mono::new(TOP).ty(ty)
}

/// The ground image of an expression, with placeholders returning [`TOP`].
pub fn monomorph_expr(e: &Expr) -> Result<Expr, MonoError> {
    Mono::new(TOP).expr(e)
}

struct Translator<'a> {
    table: &'a DeclTable,
    omega: &'a Omega,
    mono: Mono,
}

impl Translator<'_> {
    fn live<'b>(&'b self, recv: &'b Type, meth: &'b str) -> impl Iterator<Item = &'b MethInst> + 'b {
        self.omega.meths.iter().filter(move |m| &m.recv == recv && m.meth == meth)
    }

    fn type_decl(&self, u: &Type, n: &Named) -> Result<Decl, MonoError> {
        let name = mangle_named(n);
        let source = if self.table.is_interface(u)? {
            self.interface_source(u)?
        } else {
            self.mono.ty(&self.table.underlying(u)?)?
        };
        Ok(Decl::Type(TypeDecl { name, formals: vec![], source }))
    }

    /// Every method of the interface instance, flattened: one spec per live
    /// instantiation plus the placeholder.
    fn interface_source(&self, u: &Type) -> Result<Type, MonoError> {
        let mut specs = Vec::new();
        for (name, sig) in self.table.methods(u, &Delta::new())? {
            for inst in self.live(u, &name) {
                if inst.targs.len() != sig.formals.len() {
                    continue;
                }
                let eta = formals_eta(&sig.formals, &inst.targs);
                let ground = Sig {
                    meth: sig.meth.clone(),
                    formals: vec![],
                    params: sig
                        .params
                        .iter()
                        .map(|p| ParamDecl { name: p.name.clone(), ty: p.ty.subst(&eta) })
                        .collect(),
                    ret: sig.ret.subst(&eta),
                };
                specs.push(Spec::Sig(self.mono.sig(&ground, mangle_meth(&name, &inst.targs))?));
            }
            specs.push(Spec::Sig(self.mono.placeholder(&sig)));
        }
        Ok(Type::Interface(specs))
    }

    /// The placeholder and the live instances of every method applicable
    /// to the struct instance `u`.
    fn method_decls(&self, u: &Type, n: &Named, out: &mut Vec<Decl>) -> Result<(), MonoError> {
        let recv_type = mangle_named(n);
        for md in self.table.meths_of(&n.name) {
            let Some((recv_eta, _)) = self.table.make_eta_delta(&Delta::new(), &md.recv_formals, &n.args)? else {
                continue;
            };
            out.push(Decl::Meth(MethDecl {
                recv: md.recv.clone(),
                recv_type: recv_type.clone(),
                recv_formals: vec![],
                name: hash_name(&md.sig().subst(&recv_eta)),
                formals: vec![],
                params: vec![],
                ret: Type::named(self.mono.top(), vec![]),
                body: Expr::Var(md.recv.clone()),
            }));

            for inst in self.live(u, &md.name) {
                if inst.targs.len() != md.formals.len() {
                    continue;
                }
                let mut eta = recv_eta.clone();
                eta.extend(formals_eta(&md.formals, &inst.targs));
                let params = md
                    .params
                    .iter()
                    .map(|p| Ok(ParamDecl { name: p.name.clone(), ty: self.mono.ty(&p.ty.subst(&eta))? }))
                    .collect::<Result<Vec<_>, MonoError>>()?;
                out.push(Decl::Meth(MethDecl {
                    recv: md.recv.clone(),
                    recv_type: recv_type.clone(),
                    recv_formals: vec![],
                    name: mangle_meth(&md.name, &inst.targs),
                    formals: vec![],
                    params,
                    ret: self.mono.ty(&md.ret.subst(&eta))?,
                    body: self.mono.expr(&md.body.subst_types(&eta))?,
                }));
            }
        }
        Ok(())
    }
}

/// Build the ground program for `main` from the instantiations in `omega`.
///
/// Output order: one type declaration per named type instance in discovery
/// order, then the methods of each non-interface instance in declaration
/// order, then the synthetic empty interface the placeholders return.
pub fn translate(table: &DeclTable, omega: &Omega, main: &Expr, printf: bool) -> Result<Program, MonoError> {
    let translator = Translator { table, omega, mono: Mono::for_table(table) };

    let named: Vec<(&Type, &Named)> = omega
        .types
        .iter()
        .filter_map(|u| match u {
            Type::Named(n) => Some((u, n)),
            _ => None,
        })
        .collect();

    let mut decls = Vec::new();
    for (u, n) in &named {
        decls.push(translator.type_decl(u, n)?);
    }
    for (u, n) in &named {
        if !table.is_interface(u)? {
            translator.method_decls(u, n, &mut decls)?;
        }
    }
    decls.push(Decl::Type(TypeDecl {
        name: translator.mono.top().to_string(),
        formals: vec![],
        source: Type::Interface(vec![]),
    }));
    tracing::debug!(decls = decls.len(), top = translator.mono.top(), "translated program");

    Ok(Program { decls, main: translator.mono.expr(main)?, printf })
}
