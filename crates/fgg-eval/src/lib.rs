//! Small-step interpreter for Featherweight Generic Go.
//!
//! The same machine runs generic programs and their monomorphized images.
//! A program is type-checked first; the checked program (with untyped
//! constants resolved) is what gets reduced.

pub mod error;
pub mod eval;
pub mod format;
pub mod ops;

use serde::Deserialize;

use fgg_syntax::{Expr, Program, Type};
use fgg_typeck::{check_program, Checker, DeclTable, Delta, Gamma};

pub use error::{EvalError, Rule, StuckReason};
pub use eval::{runtime_type, Machine};

/// Evaluation limits and tracing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Stop after this many steps. `None` runs to a value or a stuck state.
    pub max_steps: Option<usize>,
    /// Record every intermediate expression.
    pub trace: bool,
    /// Re-type each intermediate expression and require its type to
    /// implement main's original type.
    pub check_preservation: bool,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value(Expr),
    Stuck { at: Expr, reason: StuckReason },
    StepLimit(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceStep {
    pub rule: Rule,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub outcome: Outcome,
    pub steps: usize,
    pub trace: Vec<TraceStep>,
}

/// Type-check `program` and reduce its main expression.
///
/// Stuck states are ordinary outcomes; only structural failures are errors.
pub fn run(program: &Program, config: &EvalConfig) -> Result<Run, EvalError> {
    let (main_ty, checked) = check_program(program, false)?;
    let machine = Machine::new(DeclTable::new(&checked.decls)?);

    let mut expr = checked.main.clone();
    let mut steps = 0;
    let mut trace = Vec::new();
    let outcome = loop {
        if expr.is_value() {
            break Outcome::Value(expr);
        }
        if config.max_steps.is_some_and(|max| steps >= max) {
            break Outcome::StepLimit(expr);
        }
        let (next, rule) = match machine.step(&expr) {
            Ok(step) => step,
            Err(EvalError::Stuck(reason)) => {
                tracing::debug!(steps, %reason, "evaluation stuck");
                break Outcome::Stuck { at: expr, reason };
            }
            Err(e) => return Err(e),
        };
        steps += 1;
        tracing::trace!(step = steps, rule = %rule, expr = %next, "reduced");
        if config.check_preservation {
            check_preserved(machine.decls(), &main_ty, &next)?;
        }
        if config.trace {
            trace.push(TraceStep { rule, expr: next.clone() });
        }
        expr = next;
    };
    tracing::debug!(steps, "evaluation finished");
    Ok(Run { outcome, steps, trace })
}

/// Re-type an intermediate expression with unsound casts allowed.
fn check_preserved(table: &DeclTable, before: &Type, e: &Expr) -> Result<(), EvalError> {
    let checker = Checker::new(table, true);
    let after = checker.type_of(&Delta::new(), &Gamma::new(), e)?;
    if after == *before || table.implements(&after, before, &Delta::new())? {
        Ok(())
    } else {
        Err(EvalError::Preservation { before: before.clone(), after, term: e.to_string() })
    }
}
