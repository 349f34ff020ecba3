//! Type algebra: underlying types, the implements relation and type
//! well-formedness.

use rustc_hash::FxHashSet;

use fgg_syntax::{Eta, FieldDecl, Named, Sig, Spec, Type, TypeFormal};

use crate::env::Delta;
use crate::error::TypeError;
use crate::table::DeclTable;

/// Substitution from a declaration's formals to actual arguments.
pub fn formals_eta(formals: &[TypeFormal], args: &[Type]) -> Eta {
    formals
        .iter()
        .zip(args)
        .map(|(f, a)| (f.name.clone(), a.clone()))
        .collect()
}

impl DeclTable {
    /// One level of unfolding: a named type becomes its declaration's source
    /// with the formals replaced by the actual arguments. Other types are
    /// returned as they are.
    pub fn underlying(&self, ty: &Type) -> Result<Type, TypeError> {
        let Type::Named(n) = ty else {
            return Ok(ty.clone());
        };
        let decl = self.type_decl(&n.name)?;
        if decl.formals.len() != n.args.len() {
            return Err(TypeError::ArityMismatch {
                ty: ty.clone(),
                expected: decl.formals.len(),
                found: n.args.len(),
            });
        }
        Ok(decl.source.subst(&formals_eta(&decl.formals, &n.args)))
    }

    /// Unfold through definition chains until a non-named type is reached.
    pub fn resolve(&self, ty: &Type) -> Result<Type, TypeError> {
        let mut current = ty.clone();
        let mut steps = 0;
        while let Type::Named(n) = &current {
            if steps > self.num_types() {
                return Err(TypeError::CyclicDecl { name: n.name.clone() });
            }
            current = self.underlying(&current)?;
            steps += 1;
        }
        Ok(current)
    }

    pub fn is_interface(&self, ty: &Type) -> Result<bool, TypeError> {
        match ty {
            Type::Interface(_) => Ok(true),
            Type::Named(_) => Ok(matches!(self.resolve(ty)?, Type::Interface(_))),
            _ => Ok(false),
        }
    }

    /// The fields of a struct type, or `None` for any other type.
    pub fn struct_fields(&self, ty: &Type) -> Result<Option<Vec<FieldDecl>>, TypeError> {
        match ty {
            Type::Struct(fields) => Ok(Some(fields.clone())),
            Type::Named(_) => match self.resolve(ty)? {
                Type::Struct(fields) => Ok(Some(fields)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// `sub` implements `sup` under `delta`.
    ///
    /// Struct and primitive supertypes demand identity. Interface supertypes
    /// demand method-set containment up to signature alpha-equivalence. A type
    /// parameter only implements itself; a type parameter standing as the
    /// supertype of anything else is a precondition violation.
    pub fn implements(&self, sub: &Type, sup: &Type, delta: &Delta) -> Result<bool, TypeError> {
        match (sub, sup) {
            (Type::Param(a), Type::Param(b)) => return Ok(a == b),
            (_, Type::Param(p)) => {
                return Err(TypeError::ParamAsBound { param: p.clone(), sub: sub.clone() })
            }
            (Type::Var(_), _) | (_, Type::Var(_)) | (_, Type::Prim(_)) => return Ok(sub == sup),
            _ => {}
        }
        if !self.is_interface(sup)? {
            return Ok(sub == sup);
        }
        let want = self.methods(sup, delta)?;
        if want.is_empty() {
            return Ok(true);
        }
        let have = self.methods(sub, delta)?;
        Ok(want
            .iter()
            .all(|(name, s)| have.get(name).is_some_and(|h| h.alpha_equals(s))))
    }

    /// A type usable as a type formal's upper bound.
    pub fn is_bound_type(&self, ty: &Type) -> Result<bool, TypeError> {
        match ty {
            Type::Prim(p) => Ok(!p.untyped),
            Type::Interface(_) => Ok(true),
            Type::Named(_) => self.is_interface(ty),
            _ => Ok(false),
        }
    }

    /// Well-formedness of a type under `delta`: declared names, matching
    /// arities, type arguments within their bounds, distinct field and
    /// method names in literal types.
    pub fn ok_type(&self, ty: &Type, delta: &Delta) -> Result<(), TypeError> {
        match ty {
            Type::Param(p) => delta.bound(p).map(|_| ()),
            Type::Prim(_) | Type::Var(_) => Ok(()),
            Type::Named(n) => self.ok_named(n, delta),
            Type::Struct(fields) => {
                let mut seen = FxHashSet::default();
                for f in fields {
                    if !seen.insert(f.name.as_str()) {
                        return Err(TypeError::DuplicateField {
                            name: f.name.clone(),
                            ty: ty.to_string(),
                        });
                    }
                    self.ok_type(&f.ty, delta)?;
                }
                Ok(())
            }
            Type::Interface(specs) => {
                let mut seen = FxHashSet::default();
                for spec in specs {
                    let names: Vec<String> = match spec {
                        Spec::Sig(sig) => {
                            self.ok_sig(sig, delta)?;
                            vec![sig.meth.clone()]
                        }
                        Spec::Embed(n) => {
                            let embedded = Type::Named(n.clone());
                            self.ok_named(n, delta)?;
                            if !self.is_interface(&embedded)? {
                                return Err(TypeError::EmbedNotInterface {
                                    embedded: n.clone(),
                                    iface: ty.to_string(),
                                });
                            }
                            self.methods(&embedded, delta)?.into_keys().collect()
                        }
                    };
                    for name in names {
                        if !seen.insert(name.clone()) {
                            return Err(TypeError::DuplicateMethodSpec {
                                meth: name,
                                iface: ty.to_string(),
                            });
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn ok_named(&self, n: &Named, delta: &Delta) -> Result<(), TypeError> {
        let decl = self.type_decl(&n.name)?;
        if decl.formals.len() != n.args.len() {
            return Err(TypeError::ArityMismatch {
                ty: Type::Named(n.clone()),
                expected: decl.formals.len(),
                found: n.args.len(),
            });
        }
        for arg in &n.args {
            self.ok_type(arg, delta)?;
        }
        let eta = formals_eta(&decl.formals, &n.args);
        for (formal, arg) in decl.formals.iter().zip(&n.args) {
            let bound = formal.bound.subst(&eta);
            if !self.implements(arg, &bound, delta)? {
                return Err(TypeError::BoundViolation {
                    arg: arg.clone(),
                    bound,
                    site: n.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check a list of type formals, returning the extended context.
    pub fn ok_formals(&self, formals: &[TypeFormal], delta: &Delta, decl: &str) -> Result<Delta, TypeError> {
        let mut seen = FxHashSet::default();
        for f in formals {
            if !seen.insert(f.name.as_str()) || delta.lookup(&f.name).is_some() {
                return Err(TypeError::DuplicateFormal { name: f.name.clone(), decl: decl.to_string() });
            }
        }
        let inner = delta.bind_formals(formals);
        for f in formals {
            self.ok_type(&f.bound, &inner)?;
            if !self.is_bound_type(&f.bound)? {
                return Err(TypeError::BadBound { formal: f.name.clone(), bound: f.bound.clone() });
            }
        }
        Ok(inner)
    }

    /// Well-formedness of a method signature: its formals, distinct
    /// parameter names, and well-formed parameter and result types.
    pub fn ok_sig(&self, sig: &Sig, delta: &Delta) -> Result<(), TypeError> {
        let inner = self.ok_formals(&sig.formals, delta, &sig.meth)?;
        let mut seen = FxHashSet::default();
        for p in &sig.params {
            if !seen.insert(p.name.as_str()) {
                return Err(TypeError::DuplicateParam { name: p.name.clone(), meth: sig.meth.clone() });
            }
            self.ok_type(&p.ty, &inner)?;
        }
        self.ok_type(&sig.ret, &inner)
    }
}
