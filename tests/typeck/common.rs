//! AST builders and analysis helpers shared by the checker tests.
#![allow(dead_code)]

pub use kestrel::ast::{BinOp, UnaryOp};
use kestrel::ast::{
    AccessSection, Block, CatchClause, ClassDecl, CompilationUnit, ConstructorDecl, Expr, FieldDecl, FunctionDecl,
    GlobalVarDecl, ImportDecl, InterfaceDecl, InterfaceMethodDecl, Member, MethodDecl, Param, SelectCase, Stmt,
    TopLevel, TypeName, TypeSpec,
};
pub use kestrel::ir;
pub use kestrel::span::{Span, Spanned};
pub use kestrel::symbols::{ClassId, InMemoryProvider, MethodSymbol, Modifiers, Primitive, Type};
pub use kestrel::{AnalysisConfig, Analyzed, CompileError, Diagnostic, ErrorCode};

/// File every single-unit program lives in; its top-level class is `appMain`.
pub const FILE: &str = "app.kt";
pub const TOP: &str = "appMain";

pub fn sp<T>(node: T) -> Spanned<T> {
    Spanned::dummy(node)
}

/// Give a node a one-byte span at `start`, for location assertions.
pub fn at<T>(start: usize, mut node: Spanned<T>) -> Spanned<T> {
    node.span = Span::new(start, start + 1);
    node
}

fn name(s: &str) -> Spanned<String> {
    sp(s.to_string())
}

/// `"int"`, `"String"`, `"java.util.List"`, `"int[][]"`.
pub fn ty(spec: &str) -> Spanned<TypeSpec> {
    let mut base = spec;
    let mut dimension = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dimension += 1;
    }
    let name = match Primitive::from_name(base) {
        Some(p) => TypeName::Primitive(p),
        None if base.contains('.') => TypeName::Qualified(base.to_string()),
        None => TypeName::Simple(base.to_string()),
    };
    sp(TypeSpec { name, dimension })
}

pub fn param(n: &str, t: &str) -> Param {
    Param { name: name(n), ty: ty(t) }
}

// ---- expressions ----

pub fn int(v: i32) -> Spanned<Expr> {
    sp(Expr::IntLit(v))
}

pub fn long(v: i64) -> Spanned<Expr> {
    sp(Expr::LongLit(v))
}

pub fn double(v: f64) -> Spanned<Expr> {
    sp(Expr::DoubleLit(v))
}

pub fn float(v: f32) -> Spanned<Expr> {
    sp(Expr::FloatLit(v))
}

pub fn byte(v: i8) -> Spanned<Expr> {
    sp(Expr::ByteLit(v))
}

pub fn chr(v: char) -> Spanned<Expr> {
    sp(Expr::CharLit(v))
}

pub fn boolean(v: bool) -> Spanned<Expr> {
    sp(Expr::BoolLit(v))
}

pub fn string(s: &str) -> Spanned<Expr> {
    sp(Expr::StringLit(s.to_string()))
}

pub fn null() -> Spanned<Expr> {
    sp(Expr::NullLit)
}

pub fn list(items: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::ListLit(items))
}

pub fn ident(n: &str) -> Spanned<Expr> {
    sp(Expr::Ident(n.to_string()))
}

pub fn this() -> Spanned<Expr> {
    sp(Expr::SelfRef)
}

pub fn self_field(n: &str) -> Spanned<Expr> {
    sp(Expr::SelfField(n.to_string()))
}

pub fn bin(op: BinOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
}

pub fn unary(op: UnaryOp, operand: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::UnaryOp { op, operand: Box::new(operand) })
}

pub fn assign(target: Spanned<Expr>, value: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::Assign { target: Box::new(target), value: Box::new(value) })
}

pub fn compound(op: BinOp, target: Spanned<Expr>, value: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::CompoundAssign { op, target: Box::new(target), value: Box::new(value) })
}

pub fn post_inc(target: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::PostIncrement(Box::new(target)))
}

pub fn post_dec(target: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::PostDecrement(Box::new(target)))
}

pub fn index(object: Spanned<Expr>, i: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::Index { object: Box::new(object), index: Box::new(i) })
}

/// `object.name`
pub fn get(object: Spanned<Expr>, field: &str) -> Spanned<Expr> {
    sp(Expr::FieldAccess { object: Box::new(object), field: name(field) })
}

pub fn call(object: Spanned<Expr>, method: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::MethodCall { object: Box::new(object), method: name(method), args })
}

pub fn self_call(method: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::SelfCall { method: name(method), args })
}

pub fn super_call(method: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::SuperCall { method: name(method), args })
}

pub fn static_call(class: &str, method: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::StaticCall { class: ty(class), method: name(method), args })
}

pub fn static_field(class: &str, field: &str) -> Spanned<Expr> {
    sp(Expr::StaticField { class: ty(class), field: name(field) })
}

pub fn new_obj(class: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::NewObject { class: ty(class), args })
}

pub fn new_array(elem: &str, dims: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::NewArray { elem: ty(elem), dims })
}

pub fn cast(expr: Spanned<Expr>, target: &str) -> Spanned<Expr> {
    sp(Expr::Cast { expr: Box::new(expr), target_type: ty(target) })
}

pub fn instance_of(expr: Spanned<Expr>, target: &str) -> Spanned<Expr> {
    sp(Expr::InstanceOf { expr: Box::new(expr), target_type: ty(target) })
}

pub fn closure(
    interface: &str,
    method: &str,
    params: Vec<Param>,
    ret: Option<&str>,
    body: Vec<Spanned<Stmt>>,
) -> Spanned<Expr> {
    sp(Expr::Closure {
        interface: ty(interface),
        method: name(method),
        params,
        return_type: ret.map(ty),
        body: block(body),
    })
}

/// `System.out.println(value)`
pub fn println(value: Spanned<Expr>) -> Spanned<Expr> {
    call(static_field("System", "out"), "println", vec![value])
}

// ---- statements ----

pub fn block(stmts: Vec<Spanned<Stmt>>) -> Spanned<Block> {
    sp(Block { stmts })
}

pub fn expr(e: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Expr(e))
}

pub fn var(n: &str, t: &str, init: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    sp(Stmt::LocalVar { name: name(n), ty: ty(t), init })
}

pub fn ret(value: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    sp(Stmt::Return(value))
}

pub fn if_(cond: Spanned<Expr>, then: Vec<Spanned<Stmt>>, otherwise: Option<Vec<Spanned<Stmt>>>) -> Spanned<Stmt> {
    sp(Stmt::If { condition: cond, then_block: block(then), else_block: otherwise.map(block) })
}

pub fn while_(cond: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::While { condition: cond, body: block(body) })
}

pub fn for_(
    init: Option<Spanned<Stmt>>,
    cond: Option<Spanned<Expr>>,
    update: Option<Spanned<Expr>>,
    body: Vec<Spanned<Stmt>>,
) -> Spanned<Stmt> {
    sp(Stmt::For { init: init.map(Box::new), condition: cond, update, body: block(body) })
}

pub fn foreach(n: &str, t: &str, iterable: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::Foreach { var: param(n, t), iterable, body: block(body) })
}

pub fn cond(branches: Vec<(Spanned<Expr>, Vec<Spanned<Stmt>>)>, otherwise: Option<Vec<Spanned<Stmt>>>) -> Spanned<Stmt> {
    sp(Stmt::Cond {
        branches: branches.into_iter().map(|(c, b)| (c, block(b))).collect(),
        else_block: otherwise.map(block),
    })
}

pub fn select(
    scrutinee: Spanned<Expr>,
    cases: Vec<(Vec<Spanned<Expr>>, Vec<Spanned<Stmt>>)>,
    otherwise: Option<Vec<Spanned<Stmt>>>,
) -> Spanned<Stmt> {
    sp(Stmt::Select {
        scrutinee,
        cases: cases.into_iter().map(|(values, body)| SelectCase { values, body: block(body) }).collect(),
        else_block: otherwise.map(block),
    })
}

pub fn throw(value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Throw(value))
}

pub fn try_(body: Vec<Spanned<Stmt>>, catches: Vec<(Param, Vec<Spanned<Stmt>>)>) -> Spanned<Stmt> {
    sp(Stmt::Try {
        body: block(body),
        catches: catches.into_iter().map(|(param, body)| CatchClause { param, body: block(body) }).collect(),
    })
}

pub fn nested(stmts: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::Block(Block { stmts }))
}

pub fn synchronized(lock: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::Synchronized { lock, body: block(body) })
}

pub fn brk() -> Spanned<Stmt> {
    sp(Stmt::Break)
}

// ---- members ----

fn method_decl(
    modifiers: Modifiers,
    n: &str,
    params: Vec<Param>,
    ret: Option<&str>,
    body: Option<Vec<Spanned<Stmt>>>,
) -> Member {
    Member::Method(sp(MethodDecl { modifiers, name: name(n), params, return_type: ret.map(ty), body: body.map(block) }))
}

pub fn method(n: &str, params: Vec<Param>, ret: Option<&str>, body: Vec<Spanned<Stmt>>) -> Member {
    method_decl(Modifiers::NONE, n, params, ret, Some(body))
}

pub fn static_method(n: &str, params: Vec<Param>, ret: Option<&str>, body: Vec<Spanned<Stmt>>) -> Member {
    method_decl(Modifiers::STATIC, n, params, ret, Some(body))
}

pub fn abstract_method(n: &str, params: Vec<Param>, ret: Option<&str>) -> Member {
    method_decl(Modifiers::NONE, n, params, ret, None)
}

pub fn field(n: &str, t: &str) -> Member {
    Member::Field(sp(FieldDecl { modifiers: Modifiers::NONE, name: name(n), ty: ty(t) }))
}

pub fn static_field_decl(n: &str, t: &str) -> Member {
    Member::Field(sp(FieldDecl { modifiers: Modifiers::STATIC, name: name(n), ty: ty(t) }))
}

pub fn delegate(n: &str, t: &str) -> Member {
    Member::Delegation(sp(FieldDecl { modifiers: Modifiers::NONE, name: name(n), ty: ty(t) }))
}

pub fn ctor(params: Vec<Param>, body: Vec<Spanned<Stmt>>) -> Member {
    Member::Constructor(sp(ConstructorDecl { modifiers: Modifiers::NONE, params, super_args: None, body: block(body) }))
}

pub fn ctor_super(params: Vec<Param>, super_args: Vec<Spanned<Expr>>, body: Vec<Spanned<Stmt>>) -> Member {
    Member::Constructor(sp(ConstructorDecl {
        modifiers: Modifiers::NONE,
        params,
        super_args: Some(sp(super_args)),
        body: block(body),
    }))
}

// ---- declarations ----

/// A class whose members all sit in sections with the given access.
pub fn class_decl(
    modifiers: Modifiers,
    n: &str,
    superclass: Option<&str>,
    interfaces: &[&str],
    sections: Vec<(Modifiers, Vec<Member>)>,
) -> TopLevel {
    TopLevel::Class(sp(ClassDecl {
        modifiers,
        name: name(n),
        superclass: superclass.map(ty),
        interfaces: interfaces.iter().map(|i| ty(i)).collect(),
        default_section: None,
        sections: sections.into_iter().map(|(access, members)| AccessSection { access, members }).collect(),
    }))
}

/// A public class with public members.
pub fn class(n: &str, members: Vec<Member>) -> TopLevel {
    class_decl(Modifiers::PUBLIC, n, None, &[], vec![(Modifiers::PUBLIC, members)])
}

pub fn subclass(n: &str, superclass: &str, members: Vec<Member>) -> TopLevel {
    class_decl(Modifiers::PUBLIC, n, Some(superclass), &[], vec![(Modifiers::PUBLIC, members)])
}

pub fn implementing(n: &str, interfaces: &[&str], members: Vec<Member>) -> TopLevel {
    class_decl(Modifiers::PUBLIC, n, None, interfaces, vec![(Modifiers::PUBLIC, members)])
}

pub fn sig(n: &str, params: Vec<Param>, ret: Option<&str>) -> Spanned<InterfaceMethodDecl> {
    sp(InterfaceMethodDecl { name: name(n), params, return_type: ret.map(ty) })
}

pub fn interface(n: &str, supers: &[&str], methods: Vec<Spanned<InterfaceMethodDecl>>) -> TopLevel {
    TopLevel::Interface(sp(InterfaceDecl {
        modifiers: Modifiers::PUBLIC,
        name: name(n),
        interfaces: supers.iter().map(|s| ty(s)).collect(),
        methods,
    }))
}

pub fn function(n: &str, params: Vec<Param>, ret: Option<&str>, body: Vec<Spanned<Stmt>>) -> TopLevel {
    TopLevel::Function(sp(FunctionDecl {
        modifiers: Modifiers::NONE,
        name: name(n),
        params,
        return_type: ret.map(ty),
        body: block(body),
    }))
}

pub fn global(n: &str, t: &str) -> TopLevel {
    TopLevel::GlobalVar(sp(GlobalVarDecl { modifiers: Modifiers::NONE, name: name(n), ty: ty(t) }))
}

pub fn stmt(s: Spanned<Stmt>) -> TopLevel {
    TopLevel::Stmt(s)
}

pub fn unit(file: &str, top_levels: Vec<TopLevel>) -> CompilationUnit {
    CompilationUnit { source_file: file.to_string(), module: None, imports: Vec::new(), top_levels }
}

pub fn module_unit(module: &str, file: &str, imports: &[(&str, &str)], top_levels: Vec<TopLevel>) -> CompilationUnit {
    CompilationUnit {
        source_file: file.to_string(),
        module: Some(sp(module.to_string())),
        imports: imports
            .iter()
            .map(|(alias, fqcn)| sp(ImportDecl { alias: alias.to_string(), fqcn: fqcn.to_string() }))
            .collect(),
        top_levels,
    }
}

/// One unit in [`FILE`].
pub fn program(top_levels: Vec<TopLevel>) -> Vec<CompilationUnit> {
    vec![unit(FILE, top_levels)]
}

/// One unit of free statements.
pub fn script(stmts: Vec<Spanned<Stmt>>) -> Vec<CompilationUnit> {
    program(stmts.into_iter().map(stmt).collect())
}

// ---- running ----

pub fn analyze_with(units: &[CompilationUnit], config: &AnalysisConfig) -> Result<Analyzed, CompileError> {
    kestrel::analyze_with_provider(units, config, Box::new(InMemoryProvider::core()))
}

pub fn analyze(units: &[CompilationUnit]) -> Result<Analyzed, CompileError> {
    analyze_with(units, &AnalysisConfig::default())
}

pub fn analyze_ok(units: &[CompilationUnit]) -> Analyzed {
    match analyze(units) {
        Ok(analyzed) => analyzed,
        Err(e) => {
            let messages: Vec<String> = e.diagnostics().iter().map(|d| d.to_string()).collect();
            panic!("expected analysis to succeed, got {messages:#?}");
        }
    }
}

pub fn errors(units: &[CompilationUnit]) -> Vec<Diagnostic> {
    match analyze(units) {
        Ok(_) => panic!("expected analysis to fail"),
        Err(e) => e.diagnostics().to_vec(),
    }
}

pub fn codes(units: &[CompilationUnit]) -> Vec<ErrorCode> {
    errors(units).iter().map(|d| d.code).collect()
}

pub fn assert_fails_with(units: &[CompilationUnit], code: ErrorCode) {
    let codes = codes(units);
    assert!(codes.contains(&code), "expected {code:?}, got {codes:?}");
}

// ---- inspecting results ----

pub fn class_id(analyzed: &Analyzed, name: &str) -> ClassId {
    analyzed.table.lookup(name).unwrap_or_else(|| panic!("class {name} not in table"))
}

pub fn methods_named<'a>(analyzed: &'a Analyzed, class: &str, name: &str) -> Vec<&'a MethodSymbol> {
    let id = class_id(analyzed, class);
    analyzed
        .table
        .class(id)
        .methods
        .iter()
        .map(|&m| analyzed.table.method(m))
        .filter(|m| m.name == name)
        .collect()
}

/// Checked body of the first method `name` of `class`.
pub fn body_of<'a>(analyzed: &'a Analyzed, class: &str, name: &str) -> &'a ir::Body {
    methods_named(analyzed, class, name)
        .into_iter()
        .find_map(|m| m.body.as_ref())
        .unwrap_or_else(|| panic!("{class}.{name} has no body"))
}

/// Value of the first top-level `return` of a body.
pub fn returned(body: &ir::Body) -> &ir::Expr {
    body.statements()
        .iter()
        .find_map(|s| match s {
            ir::Stmt::Return(Some(e)) => Some(e),
            _ => None,
        })
        .expect("body returns a value")
}

/// Type of `value` when returned from a function declared to return `ret`.
pub fn checked_return(ret: &str, value: Spanned<Expr>) -> (Analyzed, ir::Expr) {
    let analyzed = analyze_ok(&program(vec![function("f", vec![], Some(ret), vec![self::ret(Some(value))])]));
    let expr = returned(body_of(&analyzed, TOP, "f")).clone();
    (analyzed, expr)
}

pub fn type_name(analyzed: &Analyzed, ty: Type) -> String {
    analyzed.table.type_name(ty)
}
