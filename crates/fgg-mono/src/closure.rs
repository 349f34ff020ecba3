//! The closure rules, shared by ground discovery and the open (parametric)
//! closure of the nomono check.
//!
//! Each pass applies every rule to a snapshot of the current sets and adds
//! what it finds to the live sets; the fixpoint is the first pass that adds
//! nothing. In ground mode every instantiation must be ground and each
//! method instance's body is visited once. In open mode types may mention
//! the enclosing method's type parameters, each (receiver type, method)
//! body is visited once, and a depth bound on added types turns unbounded
//! growth into a non-monomorphisable verdict.

use rustc_hash::FxHashSet;

use fgg_syntax::{Expr, Spec, Type};
use fgg_typeck::types::formals_eta;
use fgg_typeck::{Checker, DeclTable, Delta, Gamma};

use crate::collect::{collect, Found};
use crate::error::MonoError;
use crate::instances::{InstanceSet, MethInst};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Ground,
    Open { depth_bound: usize },
}

pub struct Closure<'a> {
    table: &'a DeclTable,
    checker: Checker<'a>,
    delta: Delta,
    mode: Mode,
    pub types: InstanceSet<Type>,
    pub meths: InstanceSet<MethInst>,
    visited: FxHashSet<MethInst>,
    visited_decls: FxHashSet<(String, String)>,
}

impl<'a> Closure<'a> {
    pub fn ground(table: &'a DeclTable) -> Self {
        Closure::new(table, Delta::new(), Mode::Ground)
    }

    pub fn open(table: &'a DeclTable, delta: Delta, depth_bound: usize) -> Self {
        Closure::new(table, delta, Mode::Open { depth_bound })
    }

    fn new(table: &'a DeclTable, delta: Delta, mode: Mode) -> Self {
        Closure {
            table,
            checker: Checker::new(table, true),
            delta,
            mode,
            types: InstanceSet::new(),
            meths: InstanceSet::new(),
            visited: FxHashSet::default(),
            visited_decls: FxHashSet::default(),
        }
    }

    fn admit(&self, ty: &Type) -> Result<(), MonoError> {
        match self.mode {
            Mode::Ground if !ty.is_ground() => Err(MonoError::NotGround { ty: ty.clone() }),
            Mode::Open { depth_bound } if ty.depth() > depth_bound => Err(MonoError::NotMonomorphisable {
                witness: format!("instantiation {} exceeds nesting depth {}", ty, depth_bound),
            }),
            _ => Ok(()),
        }
    }

    pub fn add_type(&mut self, ty: Type) -> Result<bool, MonoError> {
        self.admit(&ty)?;
        Ok(self.types.insert(ty))
    }

    pub fn add_meth(&mut self, inst: MethInst) -> Result<bool, MonoError> {
        self.admit(&inst.recv)?;
        for targ in &inst.targs {
            self.admit(targ)?;
        }
        Ok(self.meths.insert(inst))
    }

    fn absorb(&mut self, found: Found) -> Result<bool, MonoError> {
        let mut changed = false;
        for ty in found.types {
            changed |= self.add_type(ty)?;
        }
        for inst in found.meths {
            changed |= self.add_meth(inst)?;
        }
        Ok(changed)
    }

    /// Add everything `e` reaches directly under `gamma`.
    pub fn seed(&mut self, gamma: &Gamma, e: &Expr) -> Result<(), MonoError> {
        let mut found = Found::default();
        collect(&self.checker, &self.delta, gamma, e, &mut found)?;
        self.absorb(found)?;
        Ok(())
    }

    /// Treat the body of `meth` on `recv_type` as already visited.
    pub fn mark_visited(&mut self, recv_type: &str, meth: &str) {
        self.visited_decls.insert((recv_type.to_string(), meth.to_string()));
    }

    /// Apply the rules until a pass adds nothing, returning the number of
    /// passes taken.
    pub fn run(&mut self, max_passes: Option<usize>) -> Result<usize, MonoError> {
        let mut passes = 0;
        loop {
            passes += 1;
            let changed = self.pass()?;
            tracing::debug!(
                pass = passes,
                types = self.types.len(),
                meths = self.meths.len(),
                mode = ?self.mode,
                "closure pass"
            );
            if !changed {
                return Ok(passes);
            }
            if max_passes.is_some_and(|max| passes >= max) {
                return Err(MonoError::PassLimit { passes });
            }
        }
    }

    fn pass(&mut self) -> Result<bool, MonoError> {
        let types = self.types.snapshot();
        let meths = self.meths.snapshot();
        let mut changed = false;

        for u in &types {
            // Fields of struct instances.
            if let Some(fields) = self.table.struct_fields(u)? {
                for field in fields {
                    changed |= self.add_type(field.ty)?;
                }
            }
            if let Type::Named(_) = u {
                // Definition chains.
                let source = self.table.underlying(u)?;
                if let Type::Named(_) = source {
                    changed |= self.add_type(source)?;
                }
                // Embedded interfaces.
                if let Type::Interface(specs) = self.table.resolve(u)? {
                    for spec in specs {
                        if let Spec::Embed(n) = spec {
                            changed |= self.add_type(Type::Named(n))?;
                        }
                    }
                }
            }
        }

        for m in &meths {
            if self.table.is_interface(&m.recv)? {
                changed |= self.implementers(m, &types)?;
                changed |= self.embedded(m)?;
            }
            changed |= self.signature_types(m)?;
            changed |= self.body(m)?;
        }
        Ok(changed)
    }

    /// A call through an interface reaches every known named type that
    /// implements it.
    fn implementers(&mut self, m: &MethInst, types: &[Type]) -> Result<bool, MonoError> {
        let mut changed = false;
        for u in types {
            if u == &m.recv || !matches!(u, Type::Named(_)) {
                continue;
            }
            if self.table.implements(u, &m.recv, &self.delta)? {
                changed |= self.add_meth(MethInst::new(u.clone(), m.meth.clone(), m.targs.clone()))?;
            }
        }
        Ok(changed)
    }

    /// A call on an interface is also a call on each embedded interface
    /// that declares the method.
    fn embedded(&mut self, m: &MethInst) -> Result<bool, MonoError> {
        let Type::Interface(specs) = self.table.resolve(&m.recv)? else {
            return Ok(false);
        };
        let mut changed = false;
        for spec in specs {
            let Spec::Embed(n) = spec else { continue };
            let embedded = Type::Named(n);
            if self.table.methods(&embedded, &self.delta)?.contains_key(&m.meth) {
                changed |= self.add_meth(MethInst::new(embedded, m.meth.clone(), m.targs.clone()))?;
            }
        }
        Ok(changed)
    }

    /// Parameter and result types of an instantiated signature.
    fn signature_types(&mut self, m: &MethInst) -> Result<bool, MonoError> {
        let Some(sig) = self.table.methods(&m.recv, &self.delta)?.remove(&m.meth) else {
            return Ok(false);
        };
        if sig.formals.len() != m.targs.len() {
            return Ok(false);
        }
        let eta = formals_eta(&sig.formals, &m.targs);
        let mut changed = false;
        for param in &sig.params {
            changed |= self.add_type(param.ty.subst(&eta))?;
        }
        changed |= self.add_type(sig.ret.subst(&eta))?;
        Ok(changed)
    }

    /// Everything reachable from the instantiated body of a method on a
    /// named non-interface receiver. A body is only visited once its
    /// receiver instance is live.
    fn body(&mut self, m: &MethInst) -> Result<bool, MonoError> {
        let Type::Named(recv) = &m.recv else {
            return Ok(false);
        };
        if self.table.is_interface(&m.recv)? || !self.types.contains(&m.recv) {
            return Ok(false);
        }
        let Some(md) = self.table.meth_decl(&recv.name, &m.meth) else {
            return Ok(false);
        };
        let first_visit = match self.mode {
            Mode::Ground => self.visited.insert(m.clone()),
            Mode::Open { .. } => self.visited_decls.insert((recv.name.clone(), m.meth.clone())),
        };
        if !first_visit || md.recv_formals.len() != recv.args.len() || md.formals.len() != m.targs.len() {
            return Ok(false);
        }
        let mut eta = formals_eta(&md.recv_formals, &recv.args);
        eta.extend(formals_eta(&md.formals, &m.targs));
        let body = md.body.subst_types(&eta);
        let gamma = Gamma::new()
            .bind(md.recv.clone(), m.recv.clone())
            .bind_all(md.params.iter().map(|p| (p.name.clone(), p.ty.subst(&eta))));

        let mut found = Found::default();
        collect(&self.checker, &self.delta, &gamma, &body, &mut found)?;
        self.absorb(found)
    }
}
