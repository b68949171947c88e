//! Type relations and member lookup shared by the checking passes.

use std::collections::HashSet;

use crate::symbols::{ClassId, ClassTable, ConstructorId, FieldId, MethodId, Modifiers, Primitive, Type};

/// Binary numeric promotion. `None` unless both operands are numeric.
pub fn promote(a: Primitive, b: Primitive) -> Option<Primitive> {
    let rank = a.promotion_rank()?.max(b.promotion_rank()?);
    Some(match rank {
        0 => Primitive::Int,
        1 => Primitive::Long,
        2 => Primitive::Float,
        _ => Primitive::Double,
    })
}

/// Widening primitive conversion, identity included.
pub fn widens_to(from: Primitive, to: Primitive) -> bool {
    use Primitive::*;
    if from == to {
        return true;
    }
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short | Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => to == Double,
        Double | Boolean | Void => false,
    }
}

/// Every class reachable through superclass and interface edges, `start`
/// first. Terminates on cyclic hierarchies.
pub fn supertypes(table: &ClassTable, start: ClassId) -> Vec<ClassId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        let class = table.class(id);
        // Interfaces pushed first so the superclass chain is walked before them.
        for &iface in class.interfaces().iter().rev() {
            stack.push(iface);
        }
        if let Some(sup) = class.superclass() {
            stack.push(sup);
        }
    }
    order
}

pub fn is_subclass(table: &ClassTable, sub: ClassId, sup: ClassId) -> bool {
    sub == sup || sup == table.root_class() || supertypes(table, sub).contains(&sup)
}

pub fn is_assignable(table: &ClassTable, from: Type, to: Type) -> bool {
    if from == to {
        return true;
    }
    let root = table.root_class();
    match (from, to) {
        (Type::Primitive(a), Type::Primitive(b)) => widens_to(a, b),
        (Type::Null, Type::Class(_) | Type::Array(_)) => true,
        (Type::Class(a), Type::Class(b)) => is_subclass(table, a, b),
        (Type::Array(_), Type::Class(b)) => b == root,
        (Type::Array(a), Type::Array(b)) => {
            let (a, b) = (table.array(a), table.array(b));
            if a.dimension == b.dimension {
                match (a.component, b.component) {
                    (Type::Class(x), Type::Class(y)) => is_subclass(table, x, y),
                    _ => false,
                }
            } else {
                // T[][] is an Object[] when the extra dimensions fit in Object.
                a.dimension > b.dimension && b.component == Type::Class(root)
            }
        }
        _ => false,
    }
}

/// Whether a member declared in `owner` with `modifiers` can be used from
/// code in `context`.
pub fn member_accessible(table: &ClassTable, owner: ClassId, modifiers: Modifiers, context: ClassId) -> bool {
    if owner == context || modifiers.is_public() {
        return true;
    }
    modifiers.is_protected() && is_subclass(table, context, owner)
}

pub fn class_accessible(table: &ClassTable, target: ClassId, context: ClassId) -> bool {
    let target = table.class(target);
    !target.modifiers.is_internal() || target.package() == table.class(context).package()
}

/// Class whose members a value of type `ty` exposes. Interfaces, arrays and
/// `null` fall back to the root class for what they do not declare.
fn lookup_classes(table: &ClassTable, ty: Type) -> Vec<ClassId> {
    let root = table.root_class();
    let mut classes = match ty {
        Type::Class(id) => supertypes(table, id),
        _ => Vec::new(),
    };
    if !classes.contains(&root) {
        classes.push(root);
    }
    classes
}

pub fn find_field(table: &ClassTable, class: ClassId, name: &str) -> Option<FieldId> {
    supertypes(table, class)
        .into_iter()
        .flat_map(|id| table.class(id).fields.iter().copied())
        .find(|&f| table.field(f).name == name)
}

fn arguments_fit(table: &ClassTable, params: &[Type], args: &[Type]) -> bool {
    params.len() == args.len() && args.iter().zip(params).all(|(&a, &p)| is_assignable(table, a, p))
}

/// Methods named `name` that accept `args`, most-derived first. Overridden
/// signatures are reported once.
pub fn applicable_methods(table: &ClassTable, receiver: Type, name: &str, args: &[Type]) -> Vec<MethodId> {
    let mut seen: HashSet<Vec<Type>> = HashSet::new();
    let mut found = Vec::new();
    for class in lookup_classes(table, receiver) {
        for &m in &table.class(class).methods {
            let method = table.method(m);
            if method.name == name && arguments_fit(table, &method.params, args) && seen.insert(method.params.clone()) {
                found.push(m);
            }
        }
    }
    found
}

/// The method of `class` (or an interface it extends) with exactly this signature.
pub fn find_exact_method(table: &ClassTable, class: ClassId, name: &str, params: &[Type]) -> Option<MethodId> {
    supertypes(table, class)
        .into_iter()
        .flat_map(|id| table.class(id).methods.iter().copied())
        .find(|&m| {
            let method = table.method(m);
            method.name == name && method.params == params
        })
}

pub fn applicable_constructors(table: &ClassTable, class: ClassId, args: &[Type]) -> Vec<ConstructorId> {
    table
        .class(class)
        .constructors
        .iter()
        .copied()
        .filter(|&c| arguments_fit(table, &table.constructor(c).params, args))
        .collect()
}

/// Abstract methods of an interface and everything it extends, one per signature.
pub fn interface_methods(table: &ClassTable, iface: ClassId) -> Vec<MethodId> {
    let mut seen: HashSet<(String, Vec<Type>)> = HashSet::new();
    let mut methods = Vec::new();
    for id in supertypes(table, iface) {
        if !table.class(id).is_interface() {
            continue;
        }
        for &m in &table.class(id).methods {
            let method = table.method(m);
            if !method.modifiers.is_static() && seen.insert((method.name.clone(), method.params.clone())) {
                methods.push(m);
            }
        }
    }
    methods
}
