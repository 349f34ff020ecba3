//! Monomorphization errors.

use std::fmt;

use fgg_eval::EvalError;
use fgg_syntax::Type;
use fgg_typeck::TypeError;

#[derive(Clone, Debug)]
pub enum MonoError {
    /// Discovery could grow without bound. An expected negative result of
    /// the nomono check; `witness` says which instantiation gave it away.
    NotMonomorphisable { witness: String },
    /// A type that must be ground still mentions a type parameter or an
    /// inference variable.
    NotGround { ty: Type },
    /// Discovery did not reach a fixpoint within the configured passes.
    PassLimit { passes: usize },
    /// The generic and monomorphized programs fell out of lock-step.
    Bisimulation { step: usize, generic: String, ground: String },
    Type(TypeError),
    Eval(EvalError),
}

impl From<TypeError> for MonoError {
    fn from(e: TypeError) -> Self {
        MonoError::Type(e)
    }
}

impl From<EvalError> for MonoError {
    fn from(e: EvalError) -> Self {
        MonoError::Eval(e)
    }
}

impl fmt::Display for MonoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonoError::NotMonomorphisable { witness } => write!(f, "program is not monomorphisable: {}", witness),
            MonoError::NotGround { ty } => write!(f, "expected a ground type, found {}", ty),
            MonoError::PassLimit { passes } => {
                write!(f, "instantiation discovery did not converge within {} passes", passes)
            }
            MonoError::Bisimulation { step, generic, ground } => write!(
                f,
                "programs diverge at step {}:\n  generic: {}\n  ground:  {}",
                step, generic, ground
            ),
            MonoError::Type(e) => write!(f, "{}", e),
            MonoError::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MonoError {}
