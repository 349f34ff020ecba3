//! Evaluation errors and reduction rule names.

use std::fmt;

use fgg_syntax::Type;
use fgg_typeck::TypeError;

/// The structural rule applied by one reduction step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    Select,
    Call,
    Assert,
    Sprintf,
    BinaryOp,
    Convert,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Select => "Select",
            Rule::Call => "Call",
            Rule::Assert => "Assert",
            Rule::Sprintf => "Sprintf",
            Rule::BinaryOp => "BinaryOp",
            Rule::Convert => "Convert",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a well-formed expression cannot step.
#[derive(Clone, Debug, PartialEq)]
pub enum StuckReason {
    /// The asserted value's runtime type does not implement the target.
    FailedAssertion { value_ty: Type, target: Type, term: String },
    /// Integer division with a zero divisor.
    DivisionByZero { term: String },
}

impl fmt::Display for StuckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StuckReason::FailedAssertion { value_ty, target, term } => {
                write!(f, "assertion `{}` failed: {} does not implement {}", term, value_ty, target)
            }
            StuckReason::DivisionByZero { term } => write!(f, "integer division by zero in `{}`", term),
        }
    }
}

#[derive(Clone, Debug)]
pub enum EvalError {
    /// The expression is stuck. An expected terminal state, not a fault.
    Stuck(StuckReason),
    /// The expression is already a value.
    NotReducible { term: String },
    /// A variable escaped substitution.
    FreeVariable { name: String },
    /// A declaration lookup failed while stepping.
    Type(TypeError),
    /// Re-typing after a step produced a type that does not implement the
    /// type before the step.
    Preservation { before: Type, after: Type, term: String },
}

impl EvalError {
    pub fn is_stuck(&self) -> bool {
        matches!(self, EvalError::Stuck(_))
    }
}

impl From<TypeError> for EvalError {
    fn from(e: TypeError) -> Self {
        EvalError::Type(e)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Stuck(reason) => write!(f, "stuck: {}", reason),
            EvalError::NotReducible { term } => write!(f, "`{}` is a value and cannot step", term),
            EvalError::FreeVariable { name } => write!(f, "free variable `{}` during evaluation", name),
            EvalError::Type(e) => write!(f, "{}", e),
            EvalError::Preservation { before, after, term } => write!(
                f,
                "type preservation violated: `{}` has type {}, which does not implement {}",
                term, after, before
            ),
        }
    }
}

impl std::error::Error for EvalError {}
