//! End-to-end tests for the `fggc` binary.
//!
//! Each test writes a program as JSON into a temp directory, invokes one
//! subcommand, and asserts on the exit status and output.

use std::path::Path;
use std::process::{Command, Output};

use fgg_syntax::build::*;
use fgg_syntax::{Decl, Expr, Program, Type};

// ── Helpers ────────────────────────────────────────────────────────────

fn any() -> Type {
    named("Any", vec![])
}

fn decls() -> Vec<Decl> {
    vec![
        type_decl("Any", vec![], iface(vec![])),
        type_decl("A", vec![], structure(vec![])),
        type_decl("Box", vec![formal("a", any())], structure(vec![field("f", param("a"))])),
        method(("b", "Box", vec![formal("a", any())]), "get", vec![], vec![], param("a"), select(var("b"), "f")),
        method(
            ("x", "Box", vec![formal("a", any())]),
            "Nest",
            vec![],
            vec![],
            any(),
            call(struct_lit("Box", vec![named("Box", vec![param("a")])], vec![var("x")]), "Nest", vec![], vec![]),
        ),
    ]
}

fn box_a() -> Expr {
    struct_lit("Box", vec![named("A", vec![])], vec![struct_lit("A", vec![], vec![])])
}

fn write_program(dir: &Path, program: &Program) -> String {
    let path = dir.join("main.json");
    std::fs::write(&path, serde_json::to_string(program).expect("failed to serialize program"))
        .expect("failed to write main.json");
    path.to_str().expect("non-UTF-8 temp path").to_string()
}

/// Run `fggc <args...> <file>` on `program`.
fn fggc(args: &[&str], program: &Program) -> Output {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_program(temp_dir.path(), program);
    Command::new(env!("CARGO_BIN_EXE_fggc"))
        .args(args)
        .arg(&file)
        .arg("--no-color")
        .output()
        .expect("failed to invoke fggc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn check_prints_main_type() {
    let out = fggc(&["check"], &Program::new(decls(), call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "A");
}

#[test]
fn check_reports_type_errors() {
    let bad = select(box_a(), "missing");
    let out = fggc(&["check"], &Program::new(decls(), bad));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("missing"), "stderr: {}", stderr(&out));
}

#[test]
fn json_diagnostics_are_one_object_per_line() {
    let bad = select(box_a(), "missing");
    let out = fggc(&["check", "--json-diagnostics"], &Program::new(decls(), bad));
    assert!(!out.status.success());
    let text = stderr(&out);
    let first = text.lines().next().expect("no diagnostics");
    let value: serde_json::Value = serde_json::from_str(first).expect("diagnostic is not JSON");
    assert_eq!(value["severity"], "error");
}

#[test]
fn nomono_reports_witness() {
    let out = fggc(&["nomono"], &Program::new(decls(), box_a()));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Box(a).Nest() reaches Box(Box(a)).Nest()"), "stderr: {}", stderr(&out));
}

#[test]
fn monom_prints_ground_program() {
    let mut ds = decls();
    ds.pop();
    let out = fggc(&["monom"], &Program::new(ds, call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("type BoxᐸAᐳ struct { f A };"), "stdout: {}", text);
    assert!(text.contains("func (b BoxᐸAᐳ) get() A { return b.f };"), "stdout: {}", text);
    assert!(text.contains("type Top interface {};"), "stdout: {}", text);
}

#[test]
fn monom_json_round_trips_as_program() {
    let mut ds = decls();
    ds.pop();
    let out = fggc(&["monom", "--json"], &Program::new(ds, call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let ground: Program = serde_json::from_str(&stdout(&out)).expect("ground program is not JSON");
    assert!(ground.decls.iter().any(|d| d.name() == "BoxᐸAᐳ"));
}

#[test]
fn eval_prints_value_and_trace() {
    let out = fggc(&["eval", "--trace"], &Program::new(decls(), call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "stdout: {}", text);
    assert!(lines[0].contains("Call"));
    assert!(lines[1].contains("Select"));
    assert_eq!(lines[2], "A{}");
}

#[test]
fn eval_monomorphized_program() {
    let mut ds = decls();
    ds.pop();
    let out = fggc(&["eval", "--monom"], &Program::new(ds, call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "A{}");
}

#[test]
fn eval_step_limit_stops_early() {
    let out = fggc(&["eval", "--steps", "1"], &Program::new(decls(), call(box_a(), "get", vec![], vec![])));
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "Box(A){A{}}.f");
}

#[test]
fn eval_stuck_assertion_fails() {
    let boxed_any = struct_lit("Box", vec![any()], vec![struct_lit("A", vec![], vec![])]);
    let stuck = assert_ty(select(boxed_any, "f"), named("Box", vec![named("A", vec![])]));
    let out = fggc(&["eval"], &Program::new(decls(), stuck));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("evaluation stuck"), "stderr: {}", stderr(&out));
}

#[test]
fn missing_file_is_reported() {
    let out = Command::new(env!("CARGO_BIN_EXE_fggc"))
        .args(["check", "/nonexistent/main.json"])
        .output()
        .expect("failed to invoke fggc");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Failed to read"));
}
