use std::collections::HashSet;

use crate::diagnostics::ErrorCode;
use crate::frame::FrameStack;
use crate::ir::{Body, Expr, ExprKind, Stmt};
use crate::symbols::{ClassId, FieldId, MethodId, MethodSymbol, Modifiers, Type};

use super::env::{AnalysisEnv, Entity};
use super::rules;

/// Pass 4: drop repeated members (the first declaration wins), then
/// synthesize the forwarding methods of delegation fields.
pub(crate) fn check_duplicates(env: &mut AnalysisEnv<'_>) {
    for id in env.table.all_source_classes().to_vec() {
        let Some((unit, _)) = env.origin(id) else { continue };
        let is_top = env.unit_info.get(unit).and_then(|info| info.top_class) == Some(id);
        duplicate_constructors(env, id, unit);
        duplicate_fields(env, id, unit, is_top);
        duplicate_methods(env, id, unit, is_top);
        synthesize_forwarders(env, id, unit);
    }
}

fn duplicate_constructors(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize) {
    let class_name = env.table.class(id).name.clone();
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for ctor in env.table.class(id).constructors.clone() {
        let params = env.table.constructor(ctor).params.clone();
        if seen.insert(params.clone()) {
            kept.push(ctor);
            continue;
        }
        let span = env.entity_span(Entity::Constructor(ctor));
        let args = vec![class_name.clone(), env.table.type_list(&params)];
        env.report(ErrorCode::DuplicateConstructor, span, unit, args);
    }
    env.table.class_mut(id).constructors = kept;
}

fn duplicate_fields(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize, is_top: bool) {
    let class_name = env.table.class(id).name.clone();
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for field in env.table.class(id).fields.clone() {
        let name = env.table.field(field).name.clone();
        if seen.insert(name.clone()) {
            kept.push(field);
            continue;
        }
        let span = env.entity_span(Entity::Field(field));
        if is_top {
            env.report(ErrorCode::DuplicateGlobalVariable, span, unit, vec![name]);
        } else {
            env.report(ErrorCode::DuplicateField, span, unit, vec![class_name.clone(), name]);
        }
    }
    env.table.class_mut(id).fields = kept;
}

fn duplicate_methods(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize, is_top: bool) {
    let class_name = env.table.class(id).name.clone();
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for method in env.table.class(id).methods.clone() {
        let (name, params) = {
            let m = env.table.method(method);
            (m.name.clone(), m.params.clone())
        };
        if seen.insert((name.clone(), params.clone())) {
            kept.push(method);
            continue;
        }
        let span = env.entity_span(Entity::Method(method));
        let params = env.table.type_list(&params);
        if is_top {
            env.report(ErrorCode::DuplicateFunction, span, unit, vec![name, params]);
        } else {
            env.report(ErrorCode::DuplicateMethod, span, unit, vec![class_name.clone(), name, params]);
        }
    }
    env.table.class_mut(id).methods = kept;
}

/// One public method per interface method of each forwarded field, unless
/// the class declares that signature itself.
fn synthesize_forwarders(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize) {
    let forwarded: Vec<FieldId> = env
        .table
        .class(id)
        .fields
        .iter()
        .copied()
        .filter(|&f| env.table.field(f).modifiers.is_forwarded())
        .collect();
    if forwarded.is_empty() {
        return;
    }
    let class_name = env.table.class(id).name.clone();
    let declared: HashSet<(String, Vec<Type>)> = env
        .table
        .class(id)
        .methods
        .iter()
        .map(|&m| {
            let m = env.table.method(m);
            (m.name.clone(), m.params.clone())
        })
        .collect();
    let mut generated = HashSet::new();

    for field in forwarded {
        let field_ty = env.table.field(field).ty;
        let Type::Class(iface) = field_ty else { continue };
        for target in rules::interface_methods(&env.table, iface) {
            let (name, params, ret) = {
                let m = env.table.method(target);
                (m.name.clone(), m.params.clone(), m.ret)
            };
            let key = (name.clone(), params.clone());
            if declared.contains(&key) {
                continue;
            }
            if !generated.insert(key) {
                let span = env.entity_span(Entity::Field(field));
                let args = vec![class_name.clone(), name, env.table.type_list(&params)];
                env.report(ErrorCode::DuplicateGeneratedMethod, span, unit, args);
                continue;
            }
            tracing::trace!(class = %class_name, method = %name, "synthesizing forwarder");
            let body = forwarding_body(id, field, field_ty, target, &params, ret);
            env.table.add_method(MethodSymbol {
                name,
                params,
                ret,
                modifiers: Modifiers::PUBLIC,
                owner: id,
                body: Some(body),
            });
        }
    }
}

/// `return this.<field>.<method>(args...)`, or the call then `return` for void.
fn forwarding_body(class: ClassId, field: FieldId, field_ty: Type, method: MethodId, params: &[Type], ret: Type) -> Body {
    let mut frames = FrameStack::new();
    let args: Vec<Expr> = params.iter().map(|&ty| Expr::local(frames.define_hidden(ty))).collect();
    let this = Expr::new(ExprKind::This, Type::Class(class));
    let delegate = Expr::new(ExprKind::RefField { target: Box::new(this), field }, field_ty);
    let call = Expr::new(ExprKind::Call { target: Box::new(delegate), method, args }, ret);
    let stmts = if ret.is_void() {
        vec![Stmt::Expr(call), Stmt::Return(None)]
    } else {
        vec![Stmt::Return(Some(call))]
    };
    Body { block: Stmt::Block(stmts), frame: frames.finish() }
}
