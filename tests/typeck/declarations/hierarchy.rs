#[path = "../common.rs"]
mod common;
use common::*;

fn superclass_name(a: &Analyzed, class: &str) -> Option<String> {
    let id = class_id(a, class);
    a.table.class(id).superclass().map(|s| a.table.class(s).name.clone())
}

#[test]
fn superclass_defaults_to_root() {
    let a = analyze_ok(&program(vec![class("A", vec![])]));
    assert_eq!(superclass_name(&a, "A").as_deref(), Some("java.lang.Object"));
}

#[test]
fn explicit_superclass() {
    let a = analyze_ok(&program(vec![class("Animal", vec![]), subclass("Dog", "Animal", vec![])]));
    assert_eq!(superclass_name(&a, "Dog").as_deref(), Some("Animal"));
}

#[test]
fn library_superclass() {
    let a = analyze_ok(&program(vec![subclass("AppError", "RuntimeException", vec![])]));
    assert_eq!(superclass_name(&a, "AppError").as_deref(), Some("java.lang.RuntimeException"));
}

#[test]
fn superclass_declared_later() {
    let a = analyze_ok(&program(vec![subclass("B", "A", vec![]), class("A", vec![])]));
    assert_eq!(superclass_name(&a, "B").as_deref(), Some("A"));
}

#[test]
fn superclass_in_another_unit() {
    let units = vec![unit("b.kt", vec![subclass("B", "A", vec![])]), unit("a.kt", vec![class("A", vec![])])];
    let a = analyze_ok(&units);
    assert_eq!(superclass_name(&a, "B").as_deref(), Some("A"));
}

#[test]
fn two_class_cycle() {
    let units = program(vec![subclass("A", "B", vec![]), subclass("B", "A", vec![])]);
    let errs = errors(&units);
    assert_eq!(errs.iter().map(|d| d.code).collect::<Vec<_>>(), vec![ErrorCode::CyclicInheritance; 2]);
    let mut names: Vec<&str> = errs.iter().map(|d| d.args[0].as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn class_extending_itself() {
    assert_eq!(codes(&program(vec![subclass("A", "A", vec![])])), vec![ErrorCode::CyclicInheritance]);
}

#[test]
fn three_class_cycle() {
    let units = program(vec![subclass("A", "B", vec![]), subclass("B", "C", vec![]), subclass("C", "A", vec![])]);
    assert_eq!(codes(&units), vec![ErrorCode::CyclicInheritance; 3]);
}

#[test]
fn cycle_does_not_flag_descendants() {
    let units = program(vec![
        subclass("A", "B", vec![]),
        subclass("B", "A", vec![]),
        subclass("Leaf", "A", vec![]),
    ]);
    let errs = errors(&units);
    assert_eq!(errs.len(), 2);
    assert!(errs.iter().all(|d| d.args[0] != "Leaf"));
}

#[test]
fn interface_cycle() {
    let units = program(vec![interface("I", &["J"], vec![]), interface("J", &["I"], vec![])]);
    assert_eq!(codes(&units), vec![ErrorCode::CyclicInheritance; 2]);
}

#[test]
fn extending_an_interface() {
    let errs = errors(&program(vec![subclass("Task", "Runnable", vec![])]));
    assert_eq!(errs[0].code, ErrorCode::IllegalInheritance);
    assert_eq!(errs[0].args, vec!["java.lang.Runnable".to_string()]);
}

#[test]
fn implementing_a_class() {
    let units = program(vec![implementing("Text", &["String"], vec![])]);
    assert_eq!(codes(&units), vec![ErrorCode::IllegalInheritance]);
}

#[test]
fn interface_extending_a_class() {
    let units = program(vec![class("Base", vec![]), interface("Shape", &["Base"], vec![])]);
    assert_eq!(codes(&units), vec![ErrorCode::IllegalInheritance]);
}

#[test]
fn unknown_superclass() {
    let errs = errors(&program(vec![subclass("A", "Nowhere", vec![])]));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::ClassNotFound);
    assert_eq!(errs[0].args, vec!["Nowhere".to_string()]);
}

#[test]
fn implemented_interfaces_recorded() {
    let a = analyze_ok(&program(vec![implementing(
        "Job",
        &["Runnable"],
        vec![method("run", vec![], None, vec![])],
    )]));
    let id = class_id(&a, "Job");
    let interfaces: Vec<&str> = a.table.class(id).interfaces().iter().map(|&i| a.table.class(i).name.as_str()).collect();
    assert_eq!(interfaces, vec!["java.lang.Runnable"]);
}

#[test]
fn interface_extends_interface() {
    let a = analyze_ok(&program(vec![
        interface("Shape", &[], vec![sig("area", vec![], Some("double"))]),
        interface("Solid", &["Shape"], vec![sig("volume", vec![], Some("double"))]),
    ]));
    let solid = class_id(&a, "Solid");
    let class = a.table.class(solid);
    assert!(class.resolution_complete());
    assert_eq!(class.superclass(), None);
    assert_eq!(class.interfaces(), &[class_id(&a, "Shape")]);
}

#[test]
fn every_source_class_resolved() {
    let a = analyze_ok(&program(vec![
        class("A", vec![]),
        subclass("B", "A", vec![]),
        interface("I", &[], vec![]),
        stmt(expr(int(1))),
    ]));
    for &id in &a.classes {
        assert!(a.table.class(id).resolution_complete(), "{} unresolved", a.table.class(id).name);
    }
}
