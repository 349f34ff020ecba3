//! Declaration well-formedness.

use rustc_hash::FxHashSet;

use fgg_syntax::{Decl, MethDecl, Spec, Type, TypeDecl};

use crate::env::{Delta, Gamma};
use crate::error::{AssignSite, TypeError};
use crate::table::DeclTable;
use crate::typing::Checker;

/// Reject declarations whose unfolding reaches themselves through renaming
/// (`type A B; type B A`) or interface embedding. Nesting under a struct
/// field or a method signature is fine.
pub fn check_acyclic(table: &DeclTable) -> Result<(), TypeError> {
    fn edges(td: &TypeDecl) -> Vec<&str> {
        match &td.source {
            Type::Named(n) => vec![n.name.as_str()],
            Type::Interface(specs) => specs
                .iter()
                .filter_map(|s| match s {
                    Spec::Embed(n) => Some(n.name.as_str()),
                    Spec::Sig(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn visit<'a>(
        table: &'a DeclTable,
        name: &'a str,
        stack: &mut Vec<&'a str>,
        done: &mut FxHashSet<&'a str>,
    ) -> Result<(), TypeError> {
        if done.contains(name) {
            return Ok(());
        }
        if stack.contains(&name) {
            return Err(TypeError::CyclicDecl { name: name.to_string() });
        }
        let Ok(td) = table.type_decl(name) else {
            // Undefined names are reported by the well-formedness pass.
            return Ok(());
        };
        stack.push(name);
        for next in edges(td) {
            visit(table, next, stack, done)?;
        }
        stack.pop();
        done.insert(name);
        Ok(())
    }

    let mut done = FxHashSet::default();
    for td in table.type_decls() {
        visit(table, &td.name, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

pub fn check_type_decl(table: &DeclTable, td: &TypeDecl) -> Result<(), TypeError> {
    let delta = table.ok_formals(&td.formals, &Delta::new(), &td.name)?;
    if !matches!(td.source, Type::Struct(_) | Type::Interface(_) | Type::Named(_)) {
        return Err(TypeError::BadTypeSource { name: td.name.clone(), source: td.source.clone() });
    }
    table.ok_type(&td.source, &delta)
}

/// Check a method declaration and return it with its body rewritten by the
/// typing judgment.
pub fn check_meth_decl(
    table: &DeclTable,
    md: &MethDecl,
    allow_unsound_casts: bool,
) -> Result<MethDecl, TypeError> {
    let td = table.type_decl(&md.recv_type)?;
    if td.formals.len() != md.recv_formals.len() {
        return Err(TypeError::ReceiverArity {
            recv_type: md.recv_type.clone(),
            meth: md.name.clone(),
            expected: td.formals.len(),
            found: md.recv_formals.len(),
        });
    }
    let recv_ty = Type::Named(md.recv_named());
    if table.is_interface(&recv_ty)? {
        return Err(TypeError::InterfaceReceiver { recv_type: md.recv_type.clone(), meth: md.name.clone() });
    }
    let recv_delta = table.ok_formals(&md.recv_formals, &Delta::new(), &md.name)?;
    // The receiver bounds must be at least as strong as the declaration's.
    table.ok_type(&recv_ty, &recv_delta)?;
    if let Some(fields) = table.struct_fields(&recv_ty)? {
        if fields.iter().any(|f| f.name == md.name) {
            return Err(TypeError::FieldMethodClash { recv_type: md.recv_type.clone(), name: md.name.clone() });
        }
    }
    let sig = md.sig();
    table.ok_sig(&sig, &recv_delta)?;
    if md.params.iter().any(|p| p.name == md.recv) {
        return Err(TypeError::DuplicateParam { name: md.recv.clone(), meth: md.name.clone() });
    }

    let delta = recv_delta.bind_formals(&md.formals);
    let gamma = Gamma::new()
        .bind(md.recv.clone(), recv_ty)
        .bind_all(md.params.iter().map(|p| (p.name.clone(), p.ty.clone())));
    let checker = Checker::new(table, allow_unsound_casts);
    let (body_ty, body) = checker.check(&delta, &gamma, &md.body)?;
    let body = checker.coerce(&delta, &body_ty, body, &md.ret, AssignSite::Return(md.name.clone()))?;
    Ok(MethDecl { body, ..md.clone() })
}

/// Check every declaration, returning them in order with method bodies
/// rewritten.
pub fn check_decls(
    table: &DeclTable,
    decls: &[Decl],
    allow_unsound_casts: bool,
) -> Result<Vec<Decl>, TypeError> {
    check_acyclic(table)?;
    decls
        .iter()
        .map(|d| match d {
            Decl::Type(td) => check_type_decl(table, td).map(|()| d.clone()),
            Decl::Meth(md) => check_meth_decl(table, md, allow_unsound_casts).map(Decl::Meth),
        })
        .collect()
}
