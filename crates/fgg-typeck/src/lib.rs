//! Type checking for Featherweight Generic Go.
//!
//! Provides the declaration table and type algebra (underlying types,
//! method sets, the implements relation, well-formedness), the typing
//! judgment for expressions, a constraint-based unifier for reconstructing
//! omitted type arguments, and ariadne-based diagnostic rendering.
//!
//! Entry points:
//! - [`check_program`]: whole-program well-formedness plus typing of main
//! - [`infer_program`]: the same after elaborating omitted type arguments

pub mod decls;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod infer;
pub mod methods;
pub mod table;
pub mod types;
pub mod typing;
pub mod unify;

use fgg_syntax::{Program, Type};

pub use env::{Delta, Gamma};
pub use error::{AssignSite, TypeError, UnifyError};
pub use methods::MethodSet;
pub use table::DeclTable;
pub use typing::Checker;

/// Check every declaration and type the main expression.
///
/// Returns main's type and the program with all bodies rewritten by the
/// typing judgment. With `allow_unsound_casts`, assertions on expressions of
/// non-interface type are accepted; this is only meant for re-typing
/// intermediate states of an evaluation.
pub fn check_program(program: &Program, allow_unsound_casts: bool) -> Result<(Type, Program), TypeError> {
    let table = DeclTable::new(&program.decls)?;
    let decls = decls::check_decls(&table, &program.decls, allow_unsound_casts)?;
    let checker = Checker::new(&table, allow_unsound_casts);
    let (ty, main) = checker.check(&Delta::new(), &Gamma::new(), &program.main)?;
    tracing::debug!(decls = decls.len(), main_type = %ty, "program checked");
    Ok((ty, Program { decls, main, printf: program.printf }))
}

/// Reconstruct omitted type arguments, then check the elaborated program.
pub fn infer_program(program: &Program) -> Result<(Type, Program), TypeError> {
    let table = DeclTable::new(&program.decls)?;
    decls::check_acyclic(&table)?;
    let elaborated = infer::elaborate_program(&table, program)?;
    check_program(&elaborated, false)
}
