//! Monomorphization of Featherweight Generic Go.
//!
//! A generic program is checked, certified by the nomono check, closed
//! into its ground instantiation set ([`omega::Omega`]) and translated into
//! a ground program with one declaration per live instantiation.
//!
//! Entry points:
//! - [`monomorph_program`]: the whole pipeline
//! - [`nomono_program`]: the termination check on its own
//! - [`bisimulate`]: lock-step comparison of a program and its translation

pub mod closure;
pub mod collect;
pub mod error;
pub mod instances;
pub mod mangle;
pub mod monomorph;
pub mod nomono;
pub mod omega;

use serde::Deserialize;

use fgg_eval::Machine;
use fgg_syntax::Program;
use fgg_typeck::{check_program, DeclTable};

pub use error::MonoError;
pub use instances::{InstanceSet, MethInst};
pub use monomorph::{mono_type, monomorph_expr, Mono};
pub use nomono::check_nomono;
pub use omega::{discover, Omega};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MonoConfig {
    /// Run the nomono check before discovery.
    pub check_nomono: bool,
    /// Give up on discovery after this many passes.
    pub max_passes: Option<usize>,
}

impl Default for MonoConfig {
    fn default() -> Self {
        MonoConfig { check_nomono: true, max_passes: None }
    }
}

/// Translate a generic program into an equivalent ground one.
pub fn monomorph_program(program: &Program, config: &MonoConfig) -> Result<Program, MonoError> {
    let (_, checked) = check_program(program, false)?;
    let table = DeclTable::new(&checked.decls)?;
    if config.check_nomono {
        check_nomono(&table)?;
    } else {
        tracing::warn!("skipping nomono check");
    }
    let omega = discover(&table, &checked.main, config.max_passes)?;
    monomorph::translate(&table, &omega, &checked.main, checked.printf)
}

/// Check `program` and run the nomono check over its declarations.
pub fn nomono_program(program: &Program) -> Result<(), MonoError> {
    let (_, checked) = check_program(program, false)?;
    check_nomono(&DeclTable::new(&checked.decls)?)
}

/// Run `generic` and `ground` side by side for at most `steps` steps.
///
/// At every step the monomorphized image of the generic expression must
/// equal the ground expression; the programs must become values together
/// and get stuck together. Returns the number of steps taken.
pub fn bisimulate(generic: &Program, ground: &Program, steps: usize) -> Result<usize, MonoError> {
    let (_, generic) = check_program(generic, false)?;
    let (_, ground) = check_program(ground, false)?;
    let generic_table = DeclTable::new(&generic.decls)?;
    let mono = Mono::for_table(&generic_table);
    let generic_machine = Machine::new(generic_table);
    let ground_machine = Machine::new(DeclTable::new(&ground.decls)?);

    let mut g = generic.main;
    let mut m = ground.main;
    for step in 0..=steps {
        let image = mono.expr(&g)?;
        if image != m {
            return Err(MonoError::Bisimulation { step, generic: image.to_string(), ground: m.to_string() });
        }
        if g.is_value() || step == steps {
            return Ok(step);
        }
        match (generic_machine.step(&g), ground_machine.step(&m)) {
            (Ok((g_next, g_rule)), Ok((m_next, m_rule))) => {
                tracing::trace!(step, generic = %g_rule, ground = %m_rule, "lock-step");
                g = g_next;
                m = m_next;
            }
            (Err(e1), Err(e2)) if e1.is_stuck() && e2.is_stuck() => return Ok(step),
            (Err(e), _) if !e.is_stuck() => return Err(e.into()),
            (_, Err(e)) if !e.is_stuck() => return Err(e.into()),
            _ => {
                return Err(MonoError::Bisimulation {
                    step: step + 1,
                    generic: g.to_string(),
                    ground: m.to_string(),
                })
            }
        }
    }
    Ok(steps)
}
