//! Integration tests for declaration well-formedness and the typing judgment.
//!
//! These tests exercise:
//! - Generic struct literals and field assignability
//! - Untyped constants flowing into typed positions
//! - The operator rules and conversions
//! - Type assertions, sound and unsound
//! - Structural declaration errors

use fgg_syntax::build::*;
use fgg_syntax::{BinOp, Decl, Expr, LitValue, Literal, PrimTag, Program, Type};
use fgg_typeck::{check_program, AssignSite, TypeError};

// ── Helpers ────────────────────────────────────────────────────────────

fn any() -> Type {
    named("Any", vec![])
}

fn a() -> Type {
    named("A", vec![])
}

/// `type Any interface {}; type A struct {}; type B(a Any) struct { f a }`
fn base_decls() -> Vec<Decl> {
    vec![
        type_decl("Any", vec![], iface(vec![])),
        type_decl("A", vec![], structure(vec![])),
        type_decl("B", vec![formal("a", any())], structure(vec![field("f", param("a"))])),
    ]
}

/// Adds `Stringer`, a struct `T` implementing it and a struct `Box` holding one.
fn stringer_decls() -> Vec<Decl> {
    let mut decls = base_decls();
    decls.extend([
        type_decl("Stringer", vec![], iface(vec![sig("String", vec![], vec![], Type::string())])),
        type_decl("T", vec![], structure(vec![])),
        method(("t", "T", vec![]), "String", vec![], vec![], Type::string(), string("t")),
        type_decl("Box", vec![], structure(vec![field("s", named("Stringer", vec![]))])),
    ]);
    decls
}

fn check(decls: Vec<Decl>, main: Expr) -> Result<(Type, Program), TypeError> {
    check_program(&Program::new(decls, main), false)
}

fn assert_type(decls: Vec<Decl>, main: Expr, expected: &str) -> Program {
    match check(decls, main) {
        Ok((ty, program)) => {
            assert_eq!(ty.to_string(), expected, "unexpected main type");
            program
        }
        Err(e) => panic!("expected `{}`, got error: {}", expected, e),
    }
}

fn assert_has_error<F: Fn(&TypeError) -> bool>(decls: Vec<Decl>, main: Expr, pred: F, desc: &str) {
    match check(decls, main) {
        Ok((ty, _)) => panic!("expected error matching `{}`, but main typed as {}", desc, ty),
        Err(e) => assert!(pred(&e), "expected error matching `{}`, got: {:?}", desc, e),
    }
}

fn int64(n: i64) -> Expr {
    lit(Literal::typed(PrimTag::Int64, LitValue::Int(n)).unwrap())
}

// ── Struct Literals ────────────────────────────────────────────────────

/// Test 1: `B(A){A{}}` has type `B(A)`.
#[test]
fn test_generic_struct_literal() {
    let main = struct_lit("B", vec![a()], vec![struct_lit("A", vec![], vec![])]);
    assert_type(base_decls(), main, "B(A)");
}

/// Test 2: `B(A){A1{}}` is rejected: the argument is not assignable to the field.
#[test]
fn test_arg_not_assignable_to_field() {
    let mut decls = base_decls();
    decls.push(type_decl("A1", vec![], structure(vec![])));
    let main = struct_lit("B", vec![a()], vec![struct_lit("A1", vec![], vec![])]);
    assert_has_error(
        decls,
        main,
        |e| matches!(e, TypeError::NotAssignable { site: AssignSite::Field(f), .. } if f == "f"),
        "NotAssignable into field f",
    );
}

/// Test 3: wrong number of type arguments and bound violations are distinct.
#[test]
fn test_arity_and_bound_errors_are_distinct() {
    let main = struct_lit("B", vec![a(), a()], vec![struct_lit("A", vec![], vec![])]);
    assert_has_error(
        base_decls(),
        main,
        |e| matches!(e, TypeError::ArityMismatch { expected: 1, found: 2, .. }),
        "ArityMismatch",
    );

    let mut decls = stringer_decls();
    decls.push(type_decl("C", vec![formal("a", named("Stringer", vec![]))], structure(vec![])));
    assert_has_error(
        decls,
        struct_lit("C", vec![a()], vec![]),
        |e| matches!(e, TypeError::BoundViolation { arg, .. } if *arg == a()),
        "BoundViolation",
    );
}

/// Test 4: selecting a field yields the substituted field type.
#[test]
fn test_select_substitutes_field_type() {
    let main = select(struct_lit("B", vec![a()], vec![struct_lit("A", vec![], vec![])]), "f");
    assert_type(base_decls(), main, "A");
}

// ── Untyped Constants and Operators ────────────────────────────────────

/// Test 5: an untyped constant in an int32 field is retagged.
#[test]
fn test_untyped_constant_retagged_in_field() {
    let decls = vec![type_decl("S", vec![], structure(vec![field("x", Type::int32())]))];
    let program = assert_type(decls, struct_lit("S", vec![], vec![int(5)]), "S");
    assert_eq!(program.main.to_string(), "S{int32(5)}");
}

/// Test 6: an untyped constant that does not fit is rejected.
#[test]
fn test_untyped_constant_overflow() {
    let decls = vec![type_decl("S", vec![], structure(vec![field("x", Type::int32())]))];
    assert_has_error(
        decls,
        struct_lit("S", vec![], vec![int(3_000_000_000)]),
        |e| matches!(e, TypeError::NotRepresentable { .. }),
        "NotRepresentable",
    );
}

/// Test 7: typed op untyped coerces the untyped side.
#[test]
fn test_mixed_operands_take_the_typed_side() {
    let program = assert_type(vec![], bin(BinOp::Add, int32(1), int(2)), "int32");
    assert_eq!(program.main.to_string(), "int32(1) + int32(2)");
}

/// Test 8: two untyped constants stay untyped, floats dominating.
#[test]
fn test_untyped_operands_widen() {
    let main = bin(BinOp::Mul, int(2), lit(Literal::float(1.5)));
    assert_type(vec![], main, "untyped float");
}

/// Test 9: mismatched typed operands.
#[test]
fn test_operand_mismatch() {
    assert_has_error(
        vec![],
        bin(BinOp::Add, int32(1), int64(2)),
        |e| matches!(e, TypeError::OperandMismatch { op: BinOp::Add, .. }),
        "OperandMismatch",
    );
}

/// Test 10: comparisons produce bool, strings concatenate, bools don't add.
#[test]
fn test_operator_result_types() {
    assert_type(vec![], bin(BinOp::Lt, int32(1), int32(2)), "bool");
    assert_type(vec![], bin(BinOp::Add, string("a"), string("b")), "string");
    assert_has_error(
        vec![],
        bin(BinOp::Add, lit(Literal::bool(true)), lit(Literal::bool(false))),
        |e| matches!(e, TypeError::InvalidOperand { .. }),
        "InvalidOperand",
    );
}

/// Test 11: numeric conversions are allowed, string to number is not.
#[test]
fn test_conversions() {
    assert_type(vec![], convert(PrimTag::Float64, int32(3)), "float64");
    assert_has_error(
        vec![],
        convert(PrimTag::Int32, string("3")),
        |e| matches!(e, TypeError::InvalidConversion { .. }),
        "InvalidConversion",
    );
}

// ── Methods ────────────────────────────────────────────────────────────

/// Test 12: explicit type arguments to a generic method.
#[test]
fn test_generic_method_call() {
    let mut decls = base_decls();
    decls.extend([
        type_decl("S", vec![], structure(vec![])),
        method(
            ("x", "S", vec![]),
            "id",
            vec![formal("T", any())],
            vec![param_decl("y", param("T"))],
            param("T"),
            var("y"),
        ),
    ]);
    let s = || struct_lit("S", vec![], vec![]);
    assert_type(decls, call(s(), "id", vec![named("S", vec![])], vec![s()]), "S");
}

/// Test 13: a method whose receiver bound is stronger than the type's only
/// exists for instantiations meeting it.
#[test]
fn test_covariant_receiver_bound() {
    let mut decls = stringer_decls();
    decls.extend([
        type_decl("Holder", vec![formal("a", any())], structure(vec![field("f", param("a"))])),
        method(
            ("x", "Holder", vec![formal("a", named("Stringer", vec![]))]),
            "str",
            vec![],
            vec![],
            Type::string(),
            call(select(var("x"), "f"), "String", vec![], vec![]),
        ),
    ]);
    let t = named("T", vec![]);
    let ok = call(struct_lit("Holder", vec![t], vec![struct_lit("T", vec![], vec![])]), "str", vec![], vec![]);
    assert_type(decls.clone(), ok, "string");

    let bad = call(struct_lit("Holder", vec![a()], vec![struct_lit("A", vec![], vec![])]), "str", vec![], vec![]);
    assert_has_error(
        decls,
        bad,
        |e| matches!(e, TypeError::UnknownMethod { meth, .. } if meth == "str"),
        "UnknownMethod str",
    );
}

/// Test 14: a method type argument outside its bound.
#[test]
fn test_method_type_arg_bound_violation() {
    let mut decls = stringer_decls();
    decls.extend([
        type_decl("S", vec![], structure(vec![])),
        method(
            ("x", "S", vec![]),
            "show",
            vec![formal("U", named("Stringer", vec![]))],
            vec![param_decl("y", param("U"))],
            Type::string(),
            call(var("y"), "String", vec![], vec![]),
        ),
    ]);
    let main = call(struct_lit("S", vec![], vec![]), "show", vec![a()], vec![struct_lit("A", vec![], vec![])]);
    assert_has_error(decls, main, |e| matches!(e, TypeError::BoundViolation { .. }), "BoundViolation");
}

// ── Assertions ─────────────────────────────────────────────────────────

/// Test 15: asserting an interface value to an implementing struct.
#[test]
fn test_assertion_from_interface() {
    let main = assert_ty(
        select(struct_lit("Box", vec![], vec![struct_lit("T", vec![], vec![])]), "s"),
        named("T", vec![]),
    );
    assert_type(stringer_decls(), main, "T");
}

/// Test 16: asserting to a struct that cannot implement the interface.
#[test]
fn test_impossible_assertion() {
    let main = assert_ty(select(struct_lit("Box", vec![], vec![struct_lit("T", vec![], vec![])]), "s"), a());
    assert_has_error(
        stringer_decls(),
        main,
        |e| matches!(e, TypeError::ImpossibleAssertion { .. }),
        "ImpossibleAssertion",
    );
}

/// Test 17: assertions on non-interface values need unsound casts.
#[test]
fn test_assertion_on_struct_needs_unsound_casts() {
    let main = assert_ty(struct_lit("A", vec![], vec![]), a());
    assert_has_error(
        base_decls(),
        main.clone(),
        |e| matches!(e, TypeError::AssertOnNonInterface { .. }),
        "AssertOnNonInterface",
    );
    let (ty, _) = check_program(&Program::new(base_decls(), main), true).unwrap();
    assert_eq!(ty, a());
}

// ── Declarations ───────────────────────────────────────────────────────

/// Test 18: duplicate type names.
#[test]
fn test_duplicate_type() {
    let mut decls = base_decls();
    decls.push(type_decl("A", vec![], structure(vec![])));
    assert_has_error(
        decls,
        struct_lit("A", vec![], vec![]),
        |e| matches!(e, TypeError::DuplicateType { name } if name == "A"),
        "DuplicateType A",
    );
}

/// Test 19: renaming and embedding cycles are rejected; struct nesting is not.
#[test]
fn test_cyclic_declarations() {
    let renaming = vec![
        type_decl("X", vec![], named("Y", vec![])),
        type_decl("Y", vec![], named("X", vec![])),
    ];
    assert_has_error(renaming, int(1), |e| matches!(e, TypeError::CyclicDecl { .. }), "CyclicDecl");

    let embedding = vec![
        type_decl("I", vec![], iface(vec![embed("J", vec![])])),
        type_decl("J", vec![], iface(vec![embed("I", vec![])])),
    ];
    assert_has_error(embedding, int(1), |e| matches!(e, TypeError::CyclicDecl { .. }), "CyclicDecl");

    let nested = vec![
        type_decl("Any", vec![], iface(vec![])),
        type_decl("Node", vec![], structure(vec![field("next", any())])),
        type_decl("List", vec![], iface(vec![sig("next", vec![], vec![], named("List", vec![]))])),
    ];
    assert!(check(nested, int(1)).is_ok());
}

/// Test 20: methods may not be declared on interfaces.
#[test]
fn test_interface_receiver() {
    let mut decls = base_decls();
    decls.push(method(("x", "Any", vec![]), "m", vec![], vec![], any(), var("x")));
    assert_has_error(
        decls,
        int(1),
        |e| matches!(e, TypeError::InterfaceReceiver { .. }),
        "InterfaceReceiver",
    );
}

/// Test 21: a method body must match the declared result.
#[test]
fn test_return_not_assignable() {
    let mut decls = base_decls();
    decls.push(method(("x", "A", vec![]), "m", vec![], vec![], Type::int32(), string("no")));
    assert_has_error(
        decls,
        int(1),
        |e| matches!(e, TypeError::NotAssignable { site: AssignSite::Return(m), .. } if m == "m"),
        "NotAssignable into result",
    );
}

/// Test 22: bounds must be interfaces or primitives.
#[test]
fn test_bad_bound() {
    let decls = vec![
        type_decl("A", vec![], structure(vec![])),
        type_decl("P", vec![formal("a", named("A", vec![]))], structure(vec![])),
    ];
    assert_has_error(decls, int(1), |e| matches!(e, TypeError::BadBound { .. }), "BadBound");
}

/// Test 23: a concrete value cannot flow into a type parameter; this is an
/// assignability error, not a misuse of the parameter as a bound.
#[test]
fn test_concrete_value_into_type_parameter() {
    let mut decls = base_decls();
    decls.push(method(
        ("b", "B", vec![formal("t", any())]),
        "get",
        vec![],
        vec![],
        param("t"),
        struct_lit("A", vec![], vec![]),
    ));
    assert_has_error(
        decls,
        int(1),
        |e| matches!(e, TypeError::NotAssignable { found, expected: Type::Param(p), .. } if p == "t" && *found == a()),
        "NotAssignable into type parameter",
    );
}

/// Test 24: untyped constants do not flow into a type parameter either.
#[test]
fn test_untyped_constant_into_type_parameter() {
    let mut decls = base_decls();
    decls.push(method(("b", "B", vec![formal("t", any())]), "get", vec![], vec![], param("t"), int(1)));
    assert_has_error(
        decls,
        int(1),
        |e| matches!(e, TypeError::NotAssignable { expected: Type::Param(p), .. } if p == "t"),
        "NotAssignable into type parameter",
    );
}
