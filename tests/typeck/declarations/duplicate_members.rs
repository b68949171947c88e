#[path = "../common.rs"]
mod common;
use common::*;

#[test]
fn duplicate_field() {
    let errs = errors(&program(vec![class("A", vec![field("x", "int"), field("x", "String")])]));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateField);
    assert_eq!(errs[0].args, vec!["A".to_string(), "x".to_string()]);
}

#[test]
fn each_repeat_reported() {
    let units = program(vec![class("A", vec![field("x", "int"), field("x", "int"), field("x", "int")])]);
    assert_eq!(codes(&units), vec![ErrorCode::DuplicateField; 2]);
}

#[test]
fn duplicate_method() {
    let units = program(vec![class(
        "A",
        vec![
            method("m", vec![param("a", "int")], None, vec![]),
            method("m", vec![param("b", "int")], Some("int"), vec![]),
        ],
    )]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateMethod);
    assert_eq!(errs[0].args, vec!["A".to_string(), "m".to_string(), "int".to_string()]);
}

#[test]
fn overloads_are_distinct() {
    let a = analyze_ok(&program(vec![class(
        "A",
        vec![
            method("m", vec![param("a", "int")], None, vec![]),
            method("m", vec![param("a", "String")], None, vec![]),
            method("m", vec![], None, vec![]),
        ],
    )]));
    assert_eq!(methods_named(&a, "A", "m").len(), 3);
}

#[test]
fn field_and_method_may_share_a_name() {
    let a = analyze_ok(&program(vec![class(
        "A",
        vec![field("size", "int"), method("size", vec![], Some("int"), vec![ret(Some(self_field("size")))])],
    )]));
    assert_eq!(methods_named(&a, "A", "size").len(), 1);
}

#[test]
fn duplicate_constructor() {
    let units = program(vec![class("A", vec![ctor(vec![], vec![]), ctor(vec![], vec![])])]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateConstructor);
    assert_eq!(errs[0].args, vec!["A".to_string(), String::new()]);
}

#[test]
fn duplicate_function() {
    let units = program(vec![
        function("f", vec![param("x", "int")], None, vec![]),
        function("f", vec![param("y", "int")], None, vec![]),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateFunction);
    assert_eq!(errs[0].args, vec!["f".to_string(), "int".to_string()]);
}

#[test]
fn duplicate_global() {
    let units = program(vec![global("g", "int"), global("g", "long")]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateGlobalVariable);
    assert_eq!(errs[0].args, vec!["g".to_string()]);
}

#[test]
fn function_named_like_an_entry_point() {
    for name in ["start", "main"] {
        let units = program(vec![function(name, vec![param("args", "String[]")], None, vec![])]);
        let errs = errors(&units);
        assert_eq!(errs.len(), 1, "{name}");
        assert_eq!(errs[0].code, ErrorCode::DuplicateFunction);
        assert_eq!(errs[0].args, vec![name.to_string(), "java.lang.String[]".to_string()]);
    }
}

#[test]
fn entry_point_names_with_other_parameters_are_overloads() {
    analyze_ok(&program(vec![
        function("start", vec![], None, vec![]),
        function("main", vec![param("code", "int")], None, vec![]),
    ]));
}

#[test]
fn duplicate_parameter() {
    let units = program(vec![function("f", vec![param("x", "int"), param("x", "int")], None, vec![])]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::DuplicateLocalVariable);
    assert_eq!(errs[0].args, vec!["x".to_string()]);
}

#[test]
fn same_member_names_in_different_classes() {
    analyze_ok(&program(vec![
        class("A", vec![field("x", "int"), method("m", vec![], None, vec![])]),
        class("B", vec![field("x", "int"), method("m", vec![], None, vec![])]),
    ]));
}
