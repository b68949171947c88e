#[path = "../common.rs"]
mod common;
use common::*;

/// `interface Fn { int apply(int x) }`
fn fn_interface() -> kestrel::ast::TopLevel {
    interface("Fn", &[], vec![sig("apply", vec![param("x", "int")], Some("int"))])
}

fn closure_parts(value: &ir::Expr) -> (ClassId, kestrel::symbols::MethodId, &ir::Body) {
    let ir::ExprKind::NewClosure { interface, method, body } = &value.kind else {
        panic!("expected closure, got {value:?}")
    };
    (*interface, *method, body)
}

#[test]
fn runnable_closure() {
    let a = analyze_ok(&program(vec![function(
        "task",
        vec![],
        Some("Runnable"),
        vec![ret(Some(closure("Runnable", "run", vec![], None, vec![])))],
    )]));
    let outer = body_of(&a, TOP, "task");
    let value = returned(outer);
    let (interface, method, body) = closure_parts(value);
    assert_eq!(a.table.class(interface).name, "java.lang.Runnable");
    assert_eq!(a.table.method(method).name, "run");
    assert_eq!(type_name(&a, value.ty), "java.lang.Runnable");
    assert_eq!(body.last(), Some(&ir::Stmt::Return(None)));
    assert!(outer.frame.closed);
    assert!(!body.frame.closed);
}

#[test]
fn bodies_without_closures_stay_open() {
    let a = analyze_ok(&program(vec![function("f", vec![param("n", "int")], None, vec![])]));
    assert!(!body_of(&a, TOP, "f").frame.closed);
}

#[test]
fn captured_local_addressed_through_outer_frame() {
    let a = analyze_ok(&program(vec![function(
        "task",
        vec![param("n", "int")],
        Some("Runnable"),
        vec![ret(Some(closure("Runnable", "run", vec![], None, vec![var("m", "int", Some(ident("n")))])))],
    )]));
    let (_, _, body) = closure_parts(returned(body_of(&a, TOP, "task")));
    let ir::Stmt::Expr(store) = &body.statements()[0] else { panic!("expected store") };
    let ir::ExprKind::SetLocal { slot, value } = &store.kind else { panic!("expected store") };
    assert_eq!((slot.depth, slot.index), (0, 0));
    let ir::ExprKind::RefLocal(captured) = value.kind else { panic!("expected captured local") };
    assert_eq!((captured.depth, captured.index), (1, 0));
    assert_eq!(body.frame.slots, vec![Type::INT]);
}

#[test]
fn source_interface_closure() {
    let a = analyze_ok(&program(vec![
        fn_interface(),
        function(
            "doubler",
            vec![],
            Some("Fn"),
            vec![ret(Some(closure(
                "Fn",
                "apply",
                vec![param("x", "int")],
                Some("int"),
                vec![ret(Some(bin(BinOp::Mul, ident("x"), int(2))))],
            )))],
        ),
    ]));
    let (interface, _, body) = closure_parts(returned(body_of(&a, TOP, "doubler")));
    assert_eq!(interface, class_id(&a, "Fn"));
    assert_eq!(body.frame.slots, vec![Type::INT]);
    let Some(ir::Stmt::Return(Some(zero))) = body.last() else { panic!("expected default return") };
    assert_eq!(zero.kind, ir::ExprKind::Int(0));
}

#[test]
fn closure_return_checked_against_interface_method() {
    let units = program(vec![
        fn_interface(),
        stmt(var(
            "f",
            "Fn",
            Some(closure("Fn", "apply", vec![param("x", "int")], None, vec![ret(Some(string("no")))])),
        )),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::IncompatibleType);
    assert_eq!(errs[0].args, vec!["int".to_string(), "java.lang.String".to_string()]);
}

#[test]
fn declared_return_type_must_match() {
    let units = program(vec![
        fn_interface(),
        stmt(var(
            "f",
            "Fn",
            Some(closure("Fn", "apply", vec![param("x", "int")], Some("long"), vec![ret(Some(ident("x")))])),
        )),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].args, vec!["int".to_string(), "long".to_string()]);
}

#[test]
fn value_returned_from_void_closure() {
    let units = script(vec![var("r", "Runnable", Some(closure("Runnable", "run", vec![], None, vec![ret(Some(int(1)))])))]);
    assert_eq!(codes(&units), vec![ErrorCode::CannotReturnValue]);
}

#[test]
fn closure_of_a_class() {
    let errs = errors(&script(vec![expr(closure("String", "length", vec![], None, vec![]))]));
    assert_eq!(errs[0].code, ErrorCode::InterfaceRequired);
    assert_eq!(errs[0].args, vec!["java.lang.String".to_string()]);
}

#[test]
fn closure_of_unknown_interface() {
    let errs = errors(&script(vec![expr(closure("Callback", "call", vec![], None, vec![]))]));
    assert_eq!(errs[0].code, ErrorCode::ClassNotFound);
    assert_eq!(errs[0].args, vec!["Callback".to_string()]);
}

#[test]
fn closure_of_missing_method() {
    let errs = errors(&script(vec![expr(closure("Runnable", "go", vec![], None, vec![]))]));
    assert_eq!(errs[0].code, ErrorCode::MethodNotFound);
    assert_eq!(errs[0].args, vec!["java.lang.Runnable".to_string(), "go".to_string(), String::new()]);
}

#[test]
fn closure_parameters_must_match_exactly() {
    let units = program(vec![
        fn_interface(),
        stmt(expr(closure("Fn", "apply", vec![param("x", "String")], None, vec![]))),
    ]);
    let errs = errors(&units);
    assert_eq!(errs[0].code, ErrorCode::MethodNotFound);
    assert_eq!(errs[0].args, vec!["Fn".to_string(), "apply".to_string(), "java.lang.String".to_string()]);
}

#[test]
fn closure_parameters_do_not_leak() {
    let units = program(vec![
        fn_interface(),
        stmt(var(
            "f",
            "Fn",
            Some(closure("Fn", "apply", vec![param("x", "int")], None, vec![ret(Some(ident("x")))])),
        )),
        stmt(expr(ident("x"))),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::VariableNotFound);
}

#[test]
fn closure_locals_do_not_clash_with_outer_names() {
    analyze_ok(&program(vec![
        fn_interface(),
        stmt(var("x", "int", Some(int(1)))),
        stmt(var(
            "f",
            "Fn",
            Some(closure("Fn", "apply", vec![param("x", "int")], None, vec![ret(Some(ident("x")))])),
        )),
    ]));
}
