//! Ariadne-based diagnostic rendering for type errors.
//!
//! Errors carry the rendered text of the offending term rather than a span;
//! the renderer locates that text in the rendered program and labels it.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Deserialize;

use crate::error::TypeError;

/// How diagnostics are printed.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct DiagnosticOptions {
    pub color: bool,
    pub json: bool,
}

impl DiagnosticOptions {
    /// Colorless human-readable output.
    pub fn plain() -> Self {
        DiagnosticOptions { color: false, json: false }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::DuplicateType { .. }
        | TypeError::DuplicateMethod { .. }
        | TypeError::DuplicateFormal { .. }
        | TypeError::DuplicateField { .. }
        | TypeError::DuplicateParam { .. }
        | TypeError::DuplicateMethodSpec { .. } => "E0001",
        TypeError::CyclicDecl { .. } => "E0002",
        TypeError::BadTypeSource { .. } | TypeError::BadBound { .. } | TypeError::EmbedNotInterface { .. } => "E0003",
        TypeError::InterfaceReceiver { .. }
        | TypeError::ReceiverArity { .. }
        | TypeError::FieldMethodClash { .. } => "E0004",
        TypeError::DeclNotFound { .. } | TypeError::UnboundTypeParam { .. } => "E0005",
        TypeError::ArityMismatch { .. } => "E0006",
        TypeError::BoundViolation { .. } => "E0007",
        TypeError::ParamAsBound { .. } => "E0008",
        TypeError::UnknownVariable { .. } => "E0009",
        TypeError::UnknownField { .. } | TypeError::NotAStruct { .. } | TypeError::FieldCount { .. } => "E0010",
        TypeError::UnknownMethod { .. } | TypeError::ArgCount { .. } | TypeError::TypeArgCount { .. } => "E0011",
        TypeError::NotAssignable { .. } => "E0012",
        TypeError::AssertOnNonInterface { .. } | TypeError::ImpossibleAssertion { .. } => "E0013",
        TypeError::OperandMismatch { .. }
        | TypeError::InvalidOperand { .. }
        | TypeError::InvalidConversion { .. }
        | TypeError::NotRepresentable { .. } => "E0014",
        TypeError::CannotInfer { .. } => "E0015",
    }
}

fn help(err: &TypeError) -> Option<&'static str> {
    match err {
        TypeError::CyclicDecl { .. } => Some("break the cycle with a struct field or a method signature"),
        TypeError::BadBound { .. } => Some("type parameter bounds must be interfaces or primitives"),
        TypeError::AssertOnNonInterface { .. } => Some("only values of interface type can be asserted"),
        TypeError::CannotInfer { .. } => Some("supply the type arguments explicitly"),
        TypeError::ParamAsBound { .. } => Some("type parameters cannot act as upper bounds"),
        _ => None,
    }
}

/// The byte range of the error's term in `source`, if it occurs there.
fn term_span(err: &TypeError, source: &str) -> Option<Range<usize>> {
    let term = err.term()?;
    if term.is_empty() {
        return None;
    }
    source.find(&term).map(|start| start..start + term.len())
}

/// Render a type error against the rendered program text.
pub fn render_diagnostic(error: &TypeError, source: &str, filename: &str, opts: &DiagnosticOptions) -> String {
    if opts.json {
        return render_json(error, filename).to_string();
    }
    let config = Config::default().with_color(opts.color);
    let span = term_span(error, source).unwrap_or(0..source.len().min(1));
    let msg = error.to_string();

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(error_code(error))
        .with_message(&msg)
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(format!("in {}", filename))
                .with_color(Color::Red),
        );
    if let Some(help) = help(error) {
        builder = builder.with_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return msg;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// One JSON object per error.
pub fn render_json(error: &TypeError, filename: &str) -> serde_json::Value {
    serde_json::json!({
        "code": error_code(error),
        "severity": "error",
        "message": error.to_string(),
        "file": filename,
        "term": error.term(),
    })
}
