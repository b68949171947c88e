use crate::ast::{self, Block, ClassDecl, ConstructorDecl, Member, Param, SelectCase, TopLevel};
use crate::diagnostics::ErrorCode;
use crate::frame::{FrameStack, LocalSlot};
use crate::ir::{BinaryOp, Body, Expr, ExprKind, Stmt};
use crate::span::{Span, Spanned};
use crate::symbols::{ClassId, ConstructorId, MethodId, SuperCall, Type};

use super::env::{AnalysisEnv, DeclPath, Entity};
use super::resolve::superclass_of;
use super::rules;

const THROWABLE: &str = "java.lang.Throwable";

/// Checks one executable body, threading its frame stack.
pub(crate) struct BodyChecker<'e, 'a> {
    pub(super) env: &'e mut AnalysisEnv<'a>,
    pub(super) class: ClassId,
    pub(super) unit: usize,
    pub(super) is_static: bool,
    pub(super) return_type: Type,
    pub(super) frames: FrameStack,
}

/// Pass 3: check every body of every source class.
pub(crate) fn check_bodies(env: &mut AnalysisEnv<'_>) {
    let units = env.units;
    for id in env.table.all_source_classes().to_vec() {
        let Some((unit, decl)) = env.origin(id) else { continue };
        match decl.map(|d| (d, &units[unit].top_levels[d])) {
            Some((d, TopLevel::Class(class))) => check_class(env, id, unit, d, &class.node),
            // Interface methods have no bodies.
            Some(_) => {}
            None => check_top_level(env, id, unit),
        }
    }
}

fn check_class(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize, decl: usize, class: &ClassDecl) {
    for (section, s) in class.all_sections().enumerate() {
        for (index, member) in s.members.iter().enumerate() {
            let path = DeclPath::Member { unit, decl, section, index };
            match member {
                Member::Method(method) => {
                    let (Some(body), Some(m)) = (&method.node.body, env.nodes.method(path)) else { continue };
                    check_method(env, id, unit, m, &method.node.params, body);
                }
                Member::Constructor(ctor) => {
                    let Some(c) = env.nodes.constructor(path) else { continue };
                    check_constructor(env, id, unit, c, ctor);
                }
                Member::Field(_) | Member::Delegation(_) => {}
            }
        }
    }
    check_default_constructors(env, id, unit);
}

/// Constructors with no declaration behind them chain to the superclass's
/// no-argument constructor.
fn check_default_constructors(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize) {
    let synthesized: Vec<ConstructorId> = env
        .table
        .class(id)
        .constructors
        .iter()
        .copied()
        .filter(|&c| env.nodes.decl(Entity::Constructor(c)).is_none())
        .collect();
    let span = env.entity_span(Entity::Class(id));
    for ctor in synthesized {
        let mut checker = BodyChecker::new(env, id, unit, false, Type::VOID);
        let super_call = checker.resolve_super_constructor(Vec::new(), span);
        let body = checker.check_body(&[]);
        let c = env.table.constructor_mut(ctor);
        c.super_call = super_call;
        c.body = Some(body);
    }
}

fn check_method(
    env: &mut AnalysisEnv<'_>,
    class: ClassId,
    unit: usize,
    method: MethodId,
    params: &[Param],
    body: &Spanned<Block>,
) {
    let (ret, is_static, types) = {
        let m = env.table.method(method);
        (m.ret, m.modifiers.is_static(), m.params.clone())
    };
    tracing::trace!(method = %env.table.method(method).name, "checking body");
    let mut checker = BodyChecker::new(env, class, unit, is_static, ret);
    for (param, ty) in params.iter().zip(types) {
        checker.declare(&param.name, ty);
    }
    let body = checker.check_body(&body.node.stmts);
    env.table.method_mut(method).body = Some(body);
}

fn check_constructor(
    env: &mut AnalysisEnv<'_>,
    class: ClassId,
    unit: usize,
    ctor: ConstructorId,
    decl: &Spanned<ConstructorDecl>,
) {
    let types = env.table.constructor(ctor).params.clone();
    let mut checker = BodyChecker::new(env, class, unit, false, Type::VOID);
    for (param, ty) in decl.node.params.iter().zip(types) {
        checker.declare(&param.name, ty);
    }
    let (args, span): (Vec<Expr>, Span) = match &decl.node.super_args {
        Some(args) => (args.node.iter().map(|a| checker.check_expr(a)).collect(), args.span),
        None => (Vec::new(), decl.span),
    };
    let super_call = checker.resolve_super_constructor(args, span);
    let body = checker.check_body(&decl.node.body.node.stmts);
    let c = env.table.constructor_mut(ctor);
    c.super_call = super_call;
    c.body = Some(body);
}

/// Functions, then the `start`/`main` entry points, of a unit's top-level class.
fn check_top_level(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize) {
    let units = env.units;
    let top_levels = &units[unit].top_levels;
    for (index, top) in top_levels.iter().enumerate() {
        if let TopLevel::Function(function) = top {
            let Some(m) = env.nodes.method(DeclPath::TopLevel { unit, index }) else { continue };
            check_method(env, id, unit, m, &function.node.params, &function.node.body);
        }
    }

    let Some(entry) = env.unit_info.get(unit).and_then(|info| info.entry) else { return };
    let args_ty = env.table.method(entry.start).params.first().copied().unwrap_or(Type::Null);

    // All free statements share one context, with `args` in scope.
    let statements: Vec<&Spanned<ast::Stmt>> = top_levels
        .iter()
        .filter_map(|top| match top {
            TopLevel::Stmt(stmt) => Some(stmt),
            _ => None,
        })
        .collect();
    let mut checker = BodyChecker::new(env, id, unit, false, Type::VOID);
    checker.frames.define("args", args_ty);
    let mut stmts: Vec<Stmt> = statements.into_iter().map(|s| checker.check_stmt(s)).collect();
    stmts.push(Stmt::Return(None));
    let start = Body { block: Stmt::Block(stmts), frame: checker.frames.finish() };
    env.table.method_mut(entry.start).body = Some(start);

    // main(args) = new <Top>().start(args)
    let mut frames = FrameStack::new();
    let args = frames.define_hidden(args_ty);
    let instance = Expr::new(ExprKind::NewObject { constructor: entry.constructor, args: Vec::new() }, Type::Class(id));
    let call = Expr::new(
        ExprKind::Call { target: Box::new(instance), method: entry.start, args: vec![Expr::local(args)] },
        Type::VOID,
    );
    let main = Body { block: Stmt::Block(vec![Stmt::Expr(call), Stmt::Return(None)]), frame: frames.finish() };
    env.table.method_mut(entry.main).body = Some(main);

    check_default_constructors(env, id, unit);
}

impl<'e, 'a> BodyChecker<'e, 'a> {
    pub(crate) fn new(env: &'e mut AnalysisEnv<'a>, class: ClassId, unit: usize, is_static: bool, return_type: Type) -> Self {
        Self { env, class, unit, is_static, return_type, frames: FrameStack::new() }
    }

    pub(super) fn report(&mut self, code: ErrorCode, span: Span, args: Vec<String>) {
        self.env.report(code, span, self.unit, args);
    }

    /// Report and stand in a placeholder for the failed expression.
    pub(super) fn error(&mut self, code: ErrorCode, span: Span, args: Vec<String>) -> Expr {
        self.report(code, span, args);
        Expr::placeholder(Type::Null)
    }

    pub(super) fn type_name(&self, ty: Type) -> String {
        self.env.table.type_name(ty)
    }

    pub(super) fn type_list(&self, exprs: &[Expr]) -> String {
        let types: Vec<Type> = exprs.iter().map(|e| e.ty).collect();
        self.env.table.type_list(&types)
    }

    pub(super) fn root(&self) -> Type {
        Type::Class(self.env.table.root_class())
    }

    /// A well-known library class, or the root class if the provider lacks it.
    pub(super) fn known_class(&mut self, name: &str) -> Type {
        match self.env.table.load(name) {
            Some(id) => Type::Class(id),
            None => self.root(),
        }
    }

    pub(super) fn resolve(&mut self, spec: &Spanned<ast::TypeSpec>) -> Option<Type> {
        self.env.resolve_type(self.class, self.unit, spec)
    }

    /// Bind a local in the innermost scope, reporting a clash.
    pub(super) fn declare(&mut self, name: &Spanned<String>, ty: Type) -> Option<LocalSlot> {
        let slot = self.frames.define(&name.node, ty);
        if slot.is_none() {
            self.report(ErrorCode::DuplicateLocalVariable, name.span, vec![name.node.clone()]);
        }
        slot
    }

    /// Coerce `value` to `expected`, reporting IncompatibleType if it does not fit.
    pub(super) fn assign_to(&mut self, value: Expr, expected: Type, span: Span) -> Expr {
        if value.is_placeholder() {
            return Expr::placeholder(expected);
        }
        if value.ty == expected {
            return value;
        }
        if !rules::is_assignable(&self.env.table, value.ty, expected) {
            let args = vec![self.type_name(expected), self.type_name(value.ty)];
            self.report(ErrorCode::IncompatibleType, span, args);
            return Expr::placeholder(expected);
        }
        value.cast(expected)
    }

    pub(super) fn require_boolean(&mut self, value: Expr, span: Span) -> Expr {
        if value.is_placeholder() || value.ty == Type::BOOLEAN {
            return value;
        }
        let args = vec![self.type_name(Type::BOOLEAN), self.type_name(value.ty)];
        self.report(ErrorCode::IncompatibleType, span, args);
        Expr::placeholder(Type::BOOLEAN)
    }

    fn require_throwable(&mut self, ty: Type, span: Span) {
        let throwable = self.known_class(THROWABLE);
        if !rules::is_assignable(&self.env.table, ty, throwable) {
            let args = vec![THROWABLE.to_string(), self.type_name(ty)];
            self.report(ErrorCode::IncompatibleType, span, args);
        }
    }

    pub(super) fn resolve_super_constructor(&mut self, args: Vec<Expr>, span: Span) -> Option<SuperCall> {
        if args.iter().any(Expr::is_placeholder) {
            return None;
        }
        let sup = superclass_of(self.env, self.class);
        let types: Vec<Type> = args.iter().map(|a| a.ty).collect();
        let found = rules::applicable_constructors(&self.env.table, sup, &types);
        match found.as_slice() {
            [ctor] => {
                let params = self.env.table.constructor(*ctor).params.clone();
                Some(SuperCall { constructor: *ctor, args: convert_args(args, &params) })
            }
            [] => {
                let sup_name = self.env.table.class(sup).name.clone();
                self.report(ErrorCode::ConstructorNotFound, span, vec![sup_name, self.type_list(&args)]);
                None
            }
            _ => {
                let sup_name = self.env.table.class(sup).name.clone();
                self.report(ErrorCode::AmbiguousConstructor, span, vec![sup_name, self.type_list(&args)]);
                None
            }
        }
    }

    /// Statements of a body in the body's outermost scope, closed by a
    /// default-value return.
    pub(crate) fn check_body(mut self, stmts: &[Spanned<ast::Stmt>]) -> Body {
        let mut out: Vec<Stmt> = stmts.iter().map(|s| self.check_stmt(s)).collect();
        out.push(Stmt::default_return(self.return_type));
        Body { block: Stmt::Block(out), frame: self.frames.finish() }
    }

    pub(super) fn check_block(&mut self, block: &Block) -> Stmt {
        self.frames.push_scope();
        let stmts = block.stmts.iter().map(|s| self.check_stmt(s)).collect();
        self.frames.pop_scope();
        Stmt::Block(stmts)
    }

    /// Run `f` inside a fresh scope.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.frames.push_scope();
        let result = f(self);
        self.frames.pop_scope();
        result
    }

    pub(super) fn check_stmt(&mut self, stmt: &Spanned<ast::Stmt>) -> Stmt {
        use ast::Stmt as S;
        match &stmt.node {
            S::Block(block) => self.check_block(block),
            S::LocalVar { name, ty, init } => self.check_local_var(name, ty, init.as_ref()),
            S::Expr(expr) => Stmt::Expr(self.check_expr(expr)),
            S::If { condition, then_block, else_block } => self.scoped(|c| {
                let cond = c.check_expr(condition);
                let cond = c.require_boolean(cond, condition.span);
                let then = c.check_block(&then_block.node);
                let otherwise = else_block.as_ref().map(|b| Box::new(c.check_block(&b.node)));
                Stmt::If { cond, then: Box::new(then), otherwise }
            }),
            S::While { condition, body } => self.scoped(|c| {
                let cond = c.check_expr(condition);
                let cond = c.require_boolean(cond, condition.span);
                let body = c.check_block(&body.node);
                Stmt::Loop { cond, body: Box::new(body) }
            }),
            S::For { init, condition, update, body } => {
                self.scoped(|c| c.check_for(init.as_deref(), condition.as_ref(), update.as_ref(), body))
            }
            S::Foreach { var, iterable, body } => self.scoped(|c| c.check_foreach(var, iterable, body)),
            S::Cond { branches, else_block } => self.scoped(|c| {
                let mut lowered = Vec::with_capacity(branches.len());
                for (condition, block) in branches {
                    let cond = c.check_expr(condition);
                    let cond = c.require_boolean(cond, condition.span);
                    lowered.push((cond, c.check_block(&block.node)));
                }
                let otherwise = else_block.as_ref().map(|b| c.check_block(&b.node));
                nest_ifs(lowered, otherwise)
            }),
            S::Select { scrutinee, cases, else_block } => {
                self.scoped(|c| c.check_select(scrutinee, cases, else_block.as_ref()))
            }
            S::Return(value) => self.check_return(value.as_ref(), stmt.span),
            S::Throw(value) => {
                let value = self.check_expr(value);
                if !value.is_placeholder() {
                    self.require_throwable(value.ty, stmt.span);
                }
                Stmt::Throw(value)
            }
            S::Try { body, catches } => {
                let body = self.check_block(&body.node);
                let catches = catches.iter().filter_map(|clause| self.scoped(|c| c.check_catch(clause))).collect();
                Stmt::Try { body: Box::new(body), catches }
            }
            S::Synchronized { .. } => self.unimplemented("synchronized", stmt.span),
            S::Break => self.unimplemented("break", stmt.span),
            S::Continue => self.unimplemented("continue", stmt.span),
            S::Empty => Stmt::Nop,
        }
    }

    fn unimplemented(&mut self, feature: &str, span: Span) -> Stmt {
        self.report(ErrorCode::UnimplementedFeature, span, vec![feature.to_string()]);
        Stmt::Nop
    }

    fn check_local_var(
        &mut self,
        name: &Spanned<String>,
        ty: &Spanned<ast::TypeSpec>,
        init: Option<&Spanned<ast::Expr>>,
    ) -> Stmt {
        if self.frames.defined_in_scope(&name.node) {
            self.report(ErrorCode::DuplicateLocalVariable, name.span, vec![name.node.clone()]);
            return Stmt::Nop;
        }
        let Some(ty) = self.resolve(ty) else { return Stmt::Nop };
        let value = match init {
            Some(init) => {
                let value = self.check_expr(init);
                self.assign_to(value, ty, init.span)
            }
            None => Expr::default_value(ty),
        };
        match self.declare(name, ty) {
            Some(slot) => Stmt::Expr(Expr::set_local(slot, value)),
            None => Stmt::Nop,
        }
    }

    fn check_return(&mut self, value: Option<&Spanned<ast::Expr>>, span: Span) -> Stmt {
        let expected = self.return_type;
        match value {
            None if expected.is_void() => Stmt::Return(None),
            None => {
                self.report(ErrorCode::CannotReturnValue, span, Vec::new());
                Stmt::default_return(expected)
            }
            Some(value) => {
                let checked = self.check_expr(value);
                if expected.is_void() || (checked.ty.is_void() && !checked.is_placeholder()) {
                    self.report(ErrorCode::CannotReturnValue, value.span, Vec::new());
                    return Stmt::default_return(expected);
                }
                Stmt::Return(Some(self.assign_to(checked, expected, value.span)))
            }
        }
    }

    fn check_for(
        &mut self,
        init: Option<&Spanned<ast::Stmt>>,
        condition: Option<&Spanned<ast::Expr>>,
        update: Option<&Spanned<ast::Expr>>,
        body: &Spanned<Block>,
    ) -> Stmt {
        let init = init.map(|s| self.check_stmt(s)).unwrap_or(Stmt::Nop);
        let cond = match condition {
            Some(condition) => {
                let cond = self.check_expr(condition);
                self.require_boolean(cond, condition.span)
            }
            None => Expr::new(ExprKind::Bool(true), Type::BOOLEAN),
        };
        let mut looped = vec![self.check_block(&body.node)];
        if let Some(update) = update {
            looped.push(Stmt::Expr(self.check_expr(update)));
        }
        Stmt::Block(vec![init, Stmt::Loop { cond, body: Box::new(Stmt::Block(looped)) }])
    }

    fn check_foreach(&mut self, var: &Param, iterable: &Spanned<ast::Expr>, body: &Spanned<Block>) -> Stmt {
        let collection = self.check_expr(iterable);
        let Some(var_ty) = self.resolve(&var.ty) else { return Stmt::Nop };
        let Some(var_slot) = self.declare(&var.name, var_ty) else { return Stmt::Nop };
        if collection.is_placeholder() {
            return Stmt::Nop;
        }
        match collection.ty {
            Type::Array(array) => {
                let element_ty = self.env.table.element_type(array);
                let coll = self.frames.define_hidden(collection.ty);
                let index = self.frames.define_hidden(Type::INT);
                let element = Expr::new(
                    ExprKind::ArrayRef { target: Box::new(Expr::local(coll)), index: Box::new(Expr::local(index)) },
                    element_ty,
                );
                let element = self.assign_to(element, var_ty, var.ty.span);
                let length = Expr::new(ExprKind::ArrayLength(Box::new(Expr::local(coll))), Type::INT);
                let cond = Expr::binary(BinaryOp::Lt, Expr::local(index), length, Type::BOOLEAN);
                let one = Expr::new(ExprKind::Int(1), Type::INT);
                let step = Expr::set_local(index, Expr::binary(BinaryOp::Add, Expr::local(index), one, Type::INT));
                let body = self.check_block(&body.node);
                Stmt::Block(vec![
                    Stmt::Expr(Expr::set_local(coll, collection)),
                    Stmt::Expr(Expr::set_local(index, Expr::new(ExprKind::Int(0), Type::INT))),
                    Stmt::Loop {
                        cond,
                        body: Box::new(Stmt::Block(vec![
                            Stmt::Expr(Expr::set_local(var_slot, element)),
                            body,
                            Stmt::Expr(step),
                        ])),
                    },
                ])
            }
            Type::Class(_) => self.iterator_loop(collection, var_slot, iterable.span, var.ty.span, body),
            Type::Primitive(_) | Type::Null => {
                let args = vec!["java.util.Collection".to_string(), self.type_name(collection.ty)];
                self.report(ErrorCode::IncompatibleType, iterable.span, args);
                Stmt::Nop
            }
        }
    }

    /// `it = c.iterator(); while (it.hasNext()) { var = (T) it.next(); body }`
    fn iterator_loop(
        &mut self,
        collection: Expr,
        var: LocalSlot,
        span: Span,
        var_span: Span,
        body: &Spanned<Block>,
    ) -> Stmt {
        let Some(iterator) = self.call_method(collection, "iterator", Vec::new(), span) else {
            return Stmt::Nop;
        };
        let it = self.frames.define_hidden(iterator.ty);
        let Some(has_next) = self.call_method(Expr::local(it), "hasNext", Vec::new(), span) else {
            return Stmt::Nop;
        };
        let cond = self.require_boolean(has_next, span);
        let Some(next) = self.call_method(Expr::local(it), "next", Vec::new(), span) else {
            return Stmt::Nop;
        };
        let element = if var.ty == self.root() || next.ty == var.ty {
            next
        } else if var.ty.is_primitive() {
            let args = vec![self.type_name(var.ty), self.type_name(next.ty)];
            self.report(ErrorCode::IncompatibleType, var_span, args);
            Expr::placeholder(var.ty)
        } else {
            next.cast(var.ty)
        };
        let body = self.check_block(&body.node);
        Stmt::Block(vec![
            Stmt::Expr(Expr::set_local(it, iterator)),
            Stmt::Loop {
                cond,
                body: Box::new(Stmt::Block(vec![Stmt::Expr(Expr::set_local(var, element)), body])),
            },
        ])
    }

    fn check_select(
        &mut self,
        scrutinee: &Spanned<ast::Expr>,
        cases: &[SelectCase],
        else_block: Option<&Spanned<Block>>,
    ) -> Stmt {
        let value = self.check_expr(scrutinee);
        let slot_ty = if value.ty == Type::Null { self.root() } else { value.ty };
        let tmp = self.frames.define_hidden(slot_ty);
        let skip_tests = value.is_placeholder();
        let init = Stmt::Expr(Expr::set_local(tmp, value));

        let mut branches = Vec::with_capacity(cases.len());
        for case in cases {
            let mut cond: Option<Expr> = None;
            for candidate in &case.values {
                let checked = self.check_expr(candidate);
                if skip_tests {
                    continue;
                }
                let Some(test) = self.case_test(tmp, checked, candidate.span) else { continue };
                cond = Some(match cond {
                    None => test,
                    Some(prev) => Expr::binary(BinaryOp::LogicalOr, prev, test, Type::BOOLEAN),
                });
            }
            let body = self.check_block(&case.body.node);
            if let Some(cond) = cond {
                branches.push((cond, body));
            }
        }
        let otherwise = else_block.map(|b| self.check_block(&b.node));
        Stmt::Block(vec![init, nest_ifs(branches, otherwise)])
    }

    fn case_test(&mut self, scrutinee: LocalSlot, candidate: Expr, span: Span) -> Option<Expr> {
        if candidate.is_placeholder() {
            return None;
        }
        if !rules::is_assignable(&self.env.table, candidate.ty, scrutinee.ty) {
            let args = vec![self.type_name(scrutinee.ty), self.type_name(candidate.ty)];
            self.report(ErrorCode::IncompatibleType, span, args);
            return None;
        }
        if scrutinee.ty.is_primitive() {
            let candidate = candidate.cast(scrutinee.ty);
            return Some(Expr::binary(BinaryOp::Eq, Expr::local(scrutinee), candidate, Type::BOOLEAN));
        }
        let root = self.root();
        self.call_method(Expr::local(scrutinee), "equals", vec![candidate.cast(root)], span)
    }

    fn check_catch(&mut self, clause: &ast::CatchClause) -> Option<(LocalSlot, Stmt)> {
        let ty = self.resolve(&clause.param.ty)?;
        self.require_throwable(ty, clause.param.ty.span);
        let slot = self.declare(&clause.param.name, ty)?;
        Some((slot, self.check_block(&clause.body.node)))
    }
}

/// Cast each argument to its parameter type where they differ.
pub(super) fn convert_args(args: Vec<Expr>, params: &[Type]) -> Vec<Expr> {
    args.into_iter().zip(params).map(|(arg, &param)| arg.cast(param)).collect()
}

/// Right fold of condition/block pairs into nested ifs.
fn nest_ifs(branches: Vec<(Expr, Stmt)>, otherwise: Option<Stmt>) -> Stmt {
    branches
        .into_iter()
        .rev()
        .fold(otherwise, |acc, (cond, then)| {
            Some(Stmt::If { cond, then: Box::new(then), otherwise: acc.map(Box::new) })
        })
        .unwrap_or(Stmt::Nop)
}
