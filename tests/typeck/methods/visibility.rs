#[path = "../common.rs"]
mod common;
use common::*;

/// `class Vault` with a private `secret` field and whatever public members are given.
fn vault(public: Vec<kestrel::ast::Member>) -> kestrel::ast::TopLevel {
    class_decl(
        Modifiers::PUBLIC,
        "Vault",
        None,
        &[],
        vec![(Modifiers::PRIVATE, vec![field("secret", "int")]), (Modifiers::PUBLIC, public)],
    )
}

#[test]
fn private_field_from_outside() {
    let units = program(vec![vault(vec![]), stmt(expr(get(new_obj("Vault", vec![]), "secret")))]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::FieldNotAccessible);
    assert_eq!(errs[0].args, vec!["Vault".to_string(), "secret".to_string()]);
}

#[test]
fn private_field_from_inside() {
    analyze_ok(&program(vec![vault(vec![method(
        "peek",
        vec![],
        Some("int"),
        vec![ret(Some(self_field("secret")))],
    )])]));
}

#[test]
fn getter_stands_in_for_hidden_field() {
    let a = analyze_ok(&program(vec![
        vault(vec![method("getSecret", vec![], Some("int"), vec![ret(Some(self_field("secret")))])]),
        function("f", vec![param("v", "Vault")], Some("int"), vec![ret(Some(get(ident("v"), "secret")))]),
    ]));
    let value = returned(body_of(&a, TOP, "f"));
    let ir::ExprKind::Call { method, args, .. } = &value.kind else { panic!("expected getter call, got {value:?}") };
    assert_eq!(a.table.method(*method).name, "getSecret");
    assert!(args.is_empty());
}

#[test]
fn boolean_getter() {
    let a = analyze_ok(&program(vec![
        class("Door", vec![method("isOpen", vec![], Some("boolean"), vec![ret(Some(boolean(true)))])]),
        function("f", vec![param("d", "Door")], Some("boolean"), vec![ret(Some(get(ident("d"), "open")))]),
    ]));
    assert_eq!(returned(body_of(&a, TOP, "f")).ty, Type::BOOLEAN);
}

#[test]
fn private_method_from_outside() {
    let units = program(vec![
        class_decl(
            Modifiers::PUBLIC,
            "Vault",
            None,
            &[],
            vec![(Modifiers::PRIVATE, vec![method("open", vec![], None, vec![])])],
        ),
        stmt(expr(call(new_obj("Vault", vec![]), "open", vec![]))),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::MethodNotAccessible);
    assert_eq!(errs[0].args, vec!["Vault".to_string(), "open".to_string()]);
}

fn base_with_protected() -> kestrel::ast::TopLevel {
    class_decl(
        Modifiers::PUBLIC,
        "Base",
        None,
        &[],
        vec![(Modifiers::PROTECTED, vec![method("hook", vec![], None, vec![])])],
    )
}

#[test]
fn protected_method_from_subclass() {
    analyze_ok(&program(vec![
        base_with_protected(),
        subclass("Derived", "Base", vec![method("run", vec![], None, vec![expr(self_call("hook", vec![]))])]),
    ]));
}

#[test]
fn protected_method_from_unrelated_class() {
    let units = program(vec![
        base_with_protected(),
        class("Other", vec![method("run", vec![param("b", "Base")], None, vec![expr(call(ident("b"), "hook", vec![]))])]),
    ]);
    assert_eq!(codes(&units), vec![ErrorCode::MethodNotAccessible]);
}

fn internal_class_unit() -> kestrel::ast::CompilationUnit {
    module_unit(
        "lib",
        "secret.kt",
        &[],
        vec![class_decl(Modifiers::INTERNAL, "Secret", None, &[], vec![(Modifiers::PUBLIC, vec![])])],
    )
}

#[test]
fn internal_class_from_another_module() {
    let units = vec![
        internal_class_unit(),
        module_unit("app", "main.kt", &[("*", "lib.*")], vec![stmt(expr(new_obj("Secret", vec![])))]),
    ];
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::ClassNotAccessible);
    assert_eq!(errs[0].args, vec!["lib.Secret".to_string()]);
    assert_eq!(errs[0].source_file, "main.kt");
}

#[test]
fn internal_class_within_its_module() {
    let units = vec![
        internal_class_unit(),
        module_unit("lib", "use.kt", &[], vec![stmt(expr(new_obj("Secret", vec![])))]),
    ];
    analyze_ok(&units);
}

#[test]
fn public_class_from_another_module() {
    let units = vec![
        module_unit("lib", "point.kt", &[], vec![class("Point", vec![])]),
        module_unit("app", "main.kt", &[("P", "lib.Point")], vec![stmt(expr(new_obj("P", vec![])))]),
    ];
    analyze_ok(&units);
}

#[test]
fn self_field_in_static_method() {
    let units = program(vec![class(
        "A",
        vec![field("x", "int"), static_method("s", vec![], Some("int"), vec![ret(Some(self_field("x")))])],
    )]);
    assert_eq!(codes(&units), vec![ErrorCode::IllegalSelfReference]);
}

#[test]
fn this_in_static_method() {
    let units = program(vec![class("A", vec![static_method("s", vec![], None, vec![expr(this())])])]);
    assert_eq!(codes(&units), vec![ErrorCode::IllegalSelfReference]);
}

#[test]
fn static_library_field() {
    let (a, value) = checked_return("java.io.PrintStream", static_field("System", "out"));
    assert!(matches!(value.kind, ir::ExprKind::RefStaticField(_)));
    assert_eq!(type_name(&a, value.ty), "java.io.PrintStream");
}
