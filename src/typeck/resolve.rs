use std::collections::HashSet;

use crate::ast::{ClassDecl, FieldDecl, InterfaceDecl, Member, Param, TopLevel, TypeName, TypeSpec};
use crate::diagnostics::ErrorCode;
use crate::span::Spanned;
use crate::symbols::{ClassId, ConstructorSymbol, FieldSymbol, MethodSymbol, Modifiers, Type};

use super::env::{AnalysisEnv, DeclPath, Entity, EntryPoints};

/// Pass 2a: resolve the supertypes of every source class, then look for cycles.
pub(crate) fn resolve_hierarchies(env: &mut AnalysisEnv<'_>) {
    let classes = env.table.all_source_classes().to_vec();
    for &id in &classes {
        resolve_hierarchy(env, id, &HashSet::new());
    }
    for &id in &classes {
        if reaches_itself(env, id) {
            let span = env.entity_span(Entity::Class(id));
            let name = env.table.class(id).name.clone();
            if let Some((unit, _)) = env.origin(id) {
                env.report(ErrorCode::CyclicInheritance, span, unit, vec![name]);
            }
        }
    }
}

/// Depth-first: supertypes are resolved before the class itself. `path`
/// holds the classes on the current branch and is cloned per branch, so a
/// cycle stops the walk without marking siblings as visited.
fn resolve_hierarchy(env: &mut AnalysisEnv<'_>, id: ClassId, path: &HashSet<ClassId>) {
    if env.table.class(id).resolution_complete() || path.contains(&id) {
        return;
    }
    let Some((unit, Some(decl))) = env.origin(id) else { return };
    let mut path = path.clone();
    path.insert(id);
    tracing::trace!(class = %env.table.class(id).name, depth = path.len(), "resolving hierarchy");

    let units = env.units;
    let (superclass, interfaces) = match &units[unit].top_levels[decl] {
        TopLevel::Class(class) => class_supertypes(env, id, unit, &class.node, &path),
        TopLevel::Interface(iface) => (None, interface_supertypes(env, id, unit, &iface.node.interfaces, &path)),
        _ => (Some(env.table.root_class()), Vec::new()),
    };
    env.table.class_mut(id).complete_hierarchy(superclass, interfaces);
}

fn class_supertypes(
    env: &mut AnalysisEnv<'_>,
    id: ClassId,
    unit: usize,
    decl: &ClassDecl,
    path: &HashSet<ClassId>,
) -> (Option<ClassId>, Vec<ClassId>) {
    let root = env.table.root_class();
    let superclass = match &decl.superclass {
        None => root,
        Some(spec) => match env.resolve_type(id, unit, spec) {
            None => root,
            Some(Type::Class(sup)) if !env.table.class(sup).is_interface() => {
                resolve_hierarchy(env, sup, path);
                sup
            }
            Some(ty) => {
                let name = env.table.type_name(ty);
                env.report(ErrorCode::IllegalInheritance, spec.span, unit, vec![name]);
                root
            }
        },
    };
    let interfaces = interface_supertypes(env, id, unit, &decl.interfaces, path);
    (Some(superclass), interfaces)
}

fn interface_supertypes(
    env: &mut AnalysisEnv<'_>,
    id: ClassId,
    unit: usize,
    specs: &[Spanned<TypeSpec>],
    path: &HashSet<ClassId>,
) -> Vec<ClassId> {
    let mut interfaces = Vec::new();
    for spec in specs {
        match env.resolve_type(id, unit, spec) {
            None => {}
            Some(Type::Class(iface)) if env.table.class(iface).is_interface() => {
                resolve_hierarchy(env, iface, path);
                interfaces.push(iface);
            }
            Some(ty) => {
                let name = env.table.type_name(ty);
                env.report(ErrorCode::IllegalInheritance, spec.span, unit, vec![name]);
            }
        }
    }
    interfaces
}

/// Whether walking supertypes from `id` comes back to `id`. Fresh visited
/// set per call.
fn reaches_itself(env: &AnalysisEnv<'_>, id: ClassId) -> bool {
    let mut visited = HashSet::new();
    let mut stack = direct_supertypes(env, id);
    while let Some(next) = stack.pop() {
        if next == id {
            return true;
        }
        if visited.insert(next) {
            stack.extend(direct_supertypes(env, next));
        }
    }
    false
}

fn direct_supertypes(env: &AnalysisEnv<'_>, id: ClassId) -> Vec<ClassId> {
    let class = env.table.class(id);
    class.superclass().into_iter().chain(class.interfaces().iter().copied()).collect()
}

/// Pass 2b: resolve member signatures. A member whose types do not resolve
/// is reported and skipped.
pub(crate) fn resolve_members(env: &mut AnalysisEnv<'_>) {
    let classes = env.table.all_source_classes().to_vec();
    let units = env.units;
    for id in classes {
        let Some((unit, decl)) = env.origin(id) else { continue };
        match decl.map(|d| (d, &units[unit].top_levels[d])) {
            Some((d, TopLevel::Class(class))) => class_members(env, id, unit, d, &class.node),
            Some((d, TopLevel::Interface(iface))) => interface_members(env, id, unit, d, &iface.node),
            Some(_) => {}
            None => top_level_members(env, id, unit),
        }
    }
}

fn resolve_params(env: &mut AnalysisEnv<'_>, class: ClassId, unit: usize, params: &[Param]) -> Option<Vec<Type>> {
    let mut types = Vec::with_capacity(params.len());
    let mut ok = true;
    for p in params {
        // Keep going so every unresolvable parameter is reported.
        match env.resolve_type(class, unit, &p.ty) {
            Some(ty) => types.push(ty),
            None => ok = false,
        }
    }
    ok.then_some(types)
}

fn resolve_return(
    env: &mut AnalysisEnv<'_>,
    class: ClassId,
    unit: usize,
    spec: Option<&Spanned<TypeSpec>>,
) -> Option<Type> {
    match spec {
        Some(spec) => env.resolve_type(class, unit, spec),
        None => Some(Type::VOID),
    }
}

fn class_members(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize, decl: usize, class: &ClassDecl) {
    let mut declared_constructors = 0;
    for (s, section) in class.all_sections().enumerate() {
        for (m, member) in section.members.iter().enumerate() {
            let path = DeclPath::Member { unit, decl, section: s, index: m };
            let entity = match member {
                Member::Field(field) => env.resolve_type(id, unit, &field.node.ty).map(|ty| {
                    Entity::Field(env.table.add_field(FieldSymbol {
                        name: field.node.name.node.clone(),
                        ty,
                        modifiers: field.node.modifiers | section.access,
                        owner: id,
                    }))
                }),
                Member::Delegation(field) => delegation(env, id, unit, &field.node, section.access),
                Member::Method(method) => {
                    let params = resolve_params(env, id, unit, &method.node.params);
                    let ret = resolve_return(env, id, unit, method.node.return_type.as_ref());
                    params.zip(ret).map(|(params, ret)| {
                        let mut modifiers = method.node.modifiers | section.access;
                        if method.node.body.is_none() {
                            modifiers = modifiers | Modifiers::ABSTRACT;
                        }
                        Entity::Method(env.table.add_method(MethodSymbol {
                            name: method.node.name.node.clone(),
                            params,
                            ret,
                            modifiers,
                            owner: id,
                            body: None,
                        }))
                    })
                }
                Member::Constructor(ctor) => {
                    declared_constructors += 1;
                    resolve_params(env, id, unit, &ctor.node.params).map(|params| {
                        Entity::Constructor(env.table.add_constructor(ConstructorSymbol {
                            params,
                            modifiers: ctor.node.modifiers | section.access,
                            owner: id,
                            body: None,
                            super_call: None,
                        }))
                    })
                }
            };
            if let Some(entity) = entity {
                env.nodes.link(path, entity);
            }
        }
    }
    if declared_constructors == 0 {
        tracing::trace!(class = %class.name.node, "adding default constructor");
        env.table.add_constructor(ConstructorSymbol {
            params: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            owner: id,
            body: None,
            super_call: None,
        });
    }
}

fn delegation(
    env: &mut AnalysisEnv<'_>,
    id: ClassId,
    unit: usize,
    field: &FieldDecl,
    access: Modifiers,
) -> Option<Entity> {
    let ty = env.resolve_type(id, unit, &field.ty)?;
    if !env.table.is_interface(ty) {
        let name = env.table.type_name(ty);
        env.report(ErrorCode::InterfaceRequired, field.ty.span, unit, vec![name]);
        return None;
    }
    Some(Entity::Field(env.table.add_field(FieldSymbol {
        name: field.name.node.clone(),
        ty,
        modifiers: field.modifiers | access | Modifiers::FORWARDED,
        owner: id,
    })))
}

fn interface_members(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize, decl: usize, iface: &InterfaceDecl) {
    for (index, method) in iface.methods.iter().enumerate() {
        let params = resolve_params(env, id, unit, &method.node.params);
        let ret = resolve_return(env, id, unit, method.node.return_type.as_ref());
        let Some((params, ret)) = params.zip(ret) else { continue };
        let m = env.table.add_method(MethodSymbol {
            name: method.node.name.node.clone(),
            params,
            ret,
            modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
            owner: id,
            body: None,
        });
        env.nodes.link(DeclPath::InterfaceMethod { unit, decl, index }, Entity::Method(m));
    }
}

/// Functions and globals of a unit become members of its top-level class,
/// after the synthesized `start`/`main` entry points.
fn top_level_members(env: &mut AnalysisEnv<'_>, id: ClassId, unit: usize) {
    let string_args = string_array(env, id);
    let start = env.table.add_method(MethodSymbol {
        name: "start".to_string(),
        params: vec![string_args],
        ret: Type::VOID,
        modifiers: Modifiers::PUBLIC,
        owner: id,
        body: None,
    });
    let main = env.table.add_method(MethodSymbol {
        name: "main".to_string(),
        params: vec![string_args],
        ret: Type::VOID,
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
        owner: id,
        body: None,
    });
    let constructor = env.table.class(id).constructors.first().copied();
    if let (Some(constructor), Some(info)) = (constructor, env.unit_info.get_mut(unit)) {
        info.entry = Some(EntryPoints { start, main, constructor });
    }

    let units = env.units;
    for (index, top) in units[unit].top_levels.iter().enumerate() {
        let path = DeclPath::TopLevel { unit, index };
        match top {
            TopLevel::Function(function) => {
                let f = &function.node;
                let params = resolve_params(env, id, unit, &f.params);
                let ret = resolve_return(env, id, unit, f.return_type.as_ref());
                let Some((params, ret)) = params.zip(ret) else { continue };
                let m = env.table.add_method(MethodSymbol {
                    name: f.name.node.clone(),
                    params,
                    ret,
                    modifiers: f.modifiers | Modifiers::PUBLIC,
                    owner: id,
                    body: None,
                });
                env.nodes.link(path, Entity::Method(m));
            }
            TopLevel::GlobalVar(global) => {
                let g = &global.node;
                let Some(ty) = env.resolve_type(id, unit, &g.ty) else { continue };
                let field = env.table.add_field(FieldSymbol {
                    name: g.name.node.clone(),
                    ty,
                    modifiers: g.modifiers | Modifiers::PUBLIC,
                    owner: id,
                });
                env.nodes.link(path, Entity::Field(field));
            }
            _ => {}
        }
    }
}

/// `String[]`, the parameter type of the entry points.
pub(crate) fn string_array(env: &mut AnalysisEnv<'_>, context: ClassId) -> Type {
    let spec = TypeSpec { name: TypeName::Qualified("java.lang.String".to_string()), dimension: 1 };
    let resolved = env
        .resolvers
        .get(&context)
        .cloned()
        .and_then(|r| r.resolve(&mut env.table, &spec).ok());
    resolved.unwrap_or_else(|| {
        let root = Type::Class(env.table.root_class());
        Type::Array(env.table.load_array(root, 1))
    })
}

/// Superclass used for constructor chaining and `super` calls.
pub(crate) fn superclass_of(env: &AnalysisEnv<'_>, id: ClassId) -> ClassId {
    env.table.class(id).superclass().unwrap_or_else(|| env.table.root_class())
}
