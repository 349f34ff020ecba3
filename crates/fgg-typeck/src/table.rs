//! Declaration table.
//!
//! Indexes a program's type and method declarations by name. Every judgment
//! of the type algebra, the typing rules, the interpreter and the
//! monomorphizer queries declarations through this table.

use rustc_hash::FxHashMap;

use fgg_syntax::{Decl, MethDecl, TypeDecl};

use crate::error::TypeError;

#[derive(Clone, Debug, Default)]
pub struct DeclTable {
    types: Vec<TypeDecl>,
    type_index: FxHashMap<String, usize>,
    meths: Vec<MethDecl>,
    meth_index: FxHashMap<(String, String), usize>,
}

impl DeclTable {
    /// Build the table, rejecting duplicate type names and duplicate
    /// (receiver type, method name) pairs.
    pub fn new(decls: &[Decl]) -> Result<Self, TypeError> {
        let mut table = DeclTable::default();
        for decl in decls {
            match decl {
                Decl::Type(td) => {
                    if table.type_index.contains_key(&td.name) {
                        return Err(TypeError::DuplicateType { name: td.name.clone() });
                    }
                    table.type_index.insert(td.name.clone(), table.types.len());
                    table.types.push(td.clone());
                }
                Decl::Meth(md) => {
                    let key = (md.recv_type.clone(), md.name.clone());
                    if table.meth_index.contains_key(&key) {
                        return Err(TypeError::DuplicateMethod {
                            recv_type: md.recv_type.clone(),
                            meth: md.name.clone(),
                        });
                    }
                    table.meth_index.insert(key, table.meths.len());
                    table.meths.push(md.clone());
                }
            }
        }
        Ok(table)
    }

    pub fn type_decl(&self, name: &str) -> Result<&TypeDecl, TypeError> {
        self.type_index
            .get(name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| TypeError::DeclNotFound { name: name.to_string() })
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_index.contains_key(name)
    }

    /// Type declarations in declaration order.
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.iter()
    }

    /// Method declarations in declaration order.
    pub fn meth_decls(&self) -> impl Iterator<Item = &MethDecl> {
        self.meths.iter()
    }

    pub fn meth_decl(&self, recv_type: &str, meth: &str) -> Option<&MethDecl> {
        self.meth_index
            .get(&(recv_type.to_string(), meth.to_string()))
            .map(|&i| &self.meths[i])
    }

    /// Methods declared with `recv_type` as receiver, in declaration order.
    pub fn meths_of<'a>(&'a self, recv_type: &'a str) -> impl Iterator<Item = &'a MethDecl> + 'a {
        self.meths.iter().filter(move |md| md.recv_type == recv_type)
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }
}
