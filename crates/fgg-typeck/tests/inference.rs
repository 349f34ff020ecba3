//! Integration tests for reconstruction of omitted type arguments.

use fgg_syntax::build::*;
use fgg_syntax::{Decl, Expr, Program, Type};
use fgg_typeck::{infer_program, TypeError, UnifyError};

// ── Helpers ────────────────────────────────────────────────────────────

fn any() -> Type {
    named("Any", vec![])
}

fn decls() -> Vec<Decl> {
    vec![
        type_decl("Any", vec![], iface(vec![])),
        type_decl("A", vec![], structure(vec![])),
        type_decl("B", vec![formal("a", any())], structure(vec![field("f", param("a"))])),
        type_decl("Stringer", vec![], iface(vec![sig("String", vec![], vec![], Type::string())])),
        type_decl("Unwrapper", vec![formal("a", any())], iface(vec![sig("unwrap", vec![], vec![], param("a"))])),
        type_decl("G", vec![], structure(vec![])),
        method(("g", "G", vec![]), "unwrap", vec![], vec![], named("A", vec![]), struct_lit("A", vec![], vec![])),
        type_decl("S", vec![], structure(vec![])),
        method(
            ("s", "S", vec![]),
            "id",
            vec![formal("T", any())],
            vec![param_decl("x", param("T"))],
            param("T"),
            var("x"),
        ),
        method(
            ("s", "S", vec![]),
            "take",
            vec![formal("T", any())],
            vec![param_decl("u", named("Unwrapper", vec![param("T")]))],
            param("T"),
            call(var("u"), "unwrap", vec![], vec![]),
        ),
        method(
            ("s", "S", vec![]),
            "show",
            vec![formal("T", named("Stringer", vec![]))],
            vec![param_decl("x", param("T"))],
            Type::string(),
            call(var("x"), "String", vec![], vec![]),
        ),
        method(("s", "S", vec![]), "mk", vec![formal("T", any())], vec![], named("A", vec![]), struct_lit("A", vec![], vec![])),
    ]
}

fn s() -> Expr {
    struct_lit("S", vec![], vec![])
}

fn infer(main: Expr) -> Result<(Type, Program), TypeError> {
    infer_program(&Program::new(decls(), main))
}

fn assert_cause<F: Fn(&UnifyError) -> bool>(main: Expr, pred: F, desc: &str) {
    match infer(main) {
        Err(TypeError::CannotInfer { cause, .. }) if pred(&cause) => {}
        Err(e) => panic!("expected {}, got: {}", desc, e),
        Ok((ty, _)) => panic!("expected {}, but inferred {}", desc, ty),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

/// `S{}.id(S{})` elaborates to `S{}.id(S)(S{})`.
#[test]
fn test_infer_method_type_argument() {
    let (ty, program) = infer(call(s(), "id", vec![], vec![s()])).unwrap();
    assert_eq!(ty.to_string(), "S");
    assert_eq!(program.main.to_string(), "S{}.id(S)(S{})");
}

/// A generic struct literal takes its arguments from the field values.
#[test]
fn test_infer_struct_literal_arguments() {
    let main = struct_lit("B", vec![], vec![struct_lit("A", vec![], vec![])]);
    let (ty, program) = infer(main).unwrap();
    assert_eq!(ty.to_string(), "B(A)");
    assert_eq!(program.main.to_string(), "B(A){A{}}");
}

/// Nested omissions are solved inside out.
#[test]
fn test_infer_nested() {
    let inner = struct_lit("B", vec![], vec![struct_lit("A", vec![], vec![])]);
    let (ty, _) = infer(call(s(), "id", vec![], vec![inner])).unwrap();
    assert_eq!(ty.to_string(), "B(A)");
}

/// Arguments are matched against interface parameters through method sets.
#[test]
fn test_infer_through_interface_method_set() {
    let main = call(s(), "take", vec![], vec![struct_lit("G", vec![], vec![])]);
    let (ty, program) = infer(main).unwrap();
    assert_eq!(ty.to_string(), "A");
    assert_eq!(program.main.to_string(), "S{}.take(A)(G{})");
}

/// A formal that no argument mentions cannot be inferred.
#[test]
fn test_unconstrained_formal_is_unresolved() {
    assert_cause(
        call(s(), "mk", vec![], vec![]),
        |c| matches!(c, UnifyError::Unresolved { .. }),
        "Unresolved",
    );
}

/// The solution must still satisfy the formal's bound.
#[test]
fn test_solution_must_satisfy_bound() {
    assert_cause(
        call(s(), "show", vec![], vec![struct_lit("A", vec![], vec![])]),
        |c| matches!(c, UnifyError::Bound { ty, .. } if ty.to_string() == "A"),
        "Bound",
    );
}

/// Missing interface methods surface as a unification failure.
#[test]
fn test_missing_method_in_interface_argument() {
    assert_cause(
        call(s(), "take", vec![], vec![struct_lit("A", vec![], vec![])]),
        |c| matches!(c, UnifyError::MissingMethod { meth, .. } if meth == "unwrap"),
        "MissingMethod",
    );
}

/// Explicit type arguments pass through untouched.
#[test]
fn test_explicit_arguments_are_kept() {
    let (ty, program) = infer(call(s(), "id", vec![any()], vec![s()])).unwrap();
    assert_eq!(ty.to_string(), "Any");
    assert_eq!(program.main.to_string(), "S{}.id(Any)(S{})");
}
