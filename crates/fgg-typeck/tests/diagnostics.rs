//! Rendering of type errors through ariadne and as JSON.

use fgg_syntax::build::*;
use fgg_syntax::Program;
use fgg_typeck::check_program;
use fgg_typeck::diagnostics::{error_code, render_diagnostic, render_json, DiagnosticOptions};

// ── Helpers ────────────────────────────────────────────────────────────

/// `type A struct {}; type W struct { f A }; type B struct {}` with main `W{B{}}`.
fn bad_field_program() -> Program {
    Program::new(
        vec![
            type_decl("A", vec![], structure(vec![])),
            type_decl("B", vec![], structure(vec![])),
            type_decl("W", vec![], structure(vec![field("f", named("A", vec![]))])),
        ],
        struct_lit("W", vec![], vec![struct_lit("B", vec![], vec![])]),
    )
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_rendered_report_names_code_and_message() {
    let program = bad_field_program();
    let err = check_program(&program, false).unwrap_err();
    assert_eq!(error_code(&err), "E0012");

    let source = program.to_string();
    let out = render_diagnostic(&err, &source, "main.json", &DiagnosticOptions::plain());
    assert!(out.contains("E0012"), "missing code in:\n{}", out);
    assert!(out.contains("not assignable"), "missing message in:\n{}", out);
}

#[test]
fn test_json_diagnostic() {
    let program = bad_field_program();
    let err = check_program(&program, false).unwrap_err();
    let value = render_json(&err, "main.json");
    assert_eq!(value["code"], "E0012");
    assert_eq!(value["severity"], "error");
    assert_eq!(value["file"], "main.json");
    assert_eq!(value["term"], "B{}");

    let opts = DiagnosticOptions { color: false, json: true };
    let text = render_diagnostic(&err, &program.to_string(), "main.json", &opts);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, value);
}

#[test]
fn test_render_declaration_error() {
    let program = Program::new(
        vec![
            type_decl("A", vec![], structure(vec![])),
            type_decl("A", vec![], structure(vec![])),
        ],
        int(1),
    );
    let err = check_program(&program, false).unwrap_err();
    let out = render_diagnostic(&err, &program.to_string(), "dup.json", &DiagnosticOptions::plain());
    assert!(out.contains("A"), "unexpected output:\n{}", out);
}
