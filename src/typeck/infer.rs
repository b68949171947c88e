use crate::ast;
use crate::diagnostics::ErrorCode;
use crate::ir::{Expr, ExprKind};
use crate::span::{Span, Spanned};
use crate::symbols::{ClassId, FieldId, MethodId, Primitive, Type};

use super::check::{convert_args, BodyChecker};
use super::resolve::superclass_of;
use super::rules;

const STRING: &str = "java.lang.String";
const LIST: &str = "java.util.List";

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl BodyChecker<'_, '_> {
    pub(super) fn check_expr(&mut self, expr: &Spanned<ast::Expr>) -> Expr {
        use ast::Expr as E;
        let span = expr.span;
        match &expr.node {
            E::IntLit(v) => Expr::new(ExprKind::Int(*v), Type::INT),
            E::LongLit(v) => Expr::new(ExprKind::Long(*v), Type::Primitive(Primitive::Long)),
            E::FloatLit(v) => Expr::new(ExprKind::Float(*v), Type::Primitive(Primitive::Float)),
            E::DoubleLit(v) => Expr::new(ExprKind::Double(*v), Type::Primitive(Primitive::Double)),
            E::CharLit(v) => Expr::new(ExprKind::Char(*v), Type::Primitive(Primitive::Char)),
            E::ByteLit(v) => Expr::new(ExprKind::Byte(*v), Type::Primitive(Primitive::Byte)),
            E::ShortLit(v) => Expr::new(ExprKind::Short(*v), Type::Primitive(Primitive::Short)),
            E::BoolLit(v) => Expr::new(ExprKind::Bool(*v), Type::BOOLEAN),
            E::StringLit(s) => {
                let ty = self.known_class(STRING);
                Expr::new(ExprKind::String(s.clone()), ty)
            }
            E::NullLit => Expr::new(ExprKind::Null, Type::Null),
            E::ListLit(items) => {
                let items = self.check_args(items);
                let ty = self.known_class(LIST);
                Expr::new(ExprKind::ListLiteral(items), ty)
            }
            E::Ident(name) => match self.frames.lookup(name) {
                Some(slot) => Expr::local(slot),
                None => self.error(ErrorCode::VariableNotFound, span, vec![name.clone()]),
            },
            E::SelfRef => self.this(span).unwrap_or_else(|| Expr::placeholder(Type::Null)),
            E::SelfField(name) => match self.self_field(name, span) {
                Some(field) => {
                    let ty = self.env.table.field(field).ty;
                    let this = Expr::new(ExprKind::This, Type::Class(self.class));
                    Expr::new(ExprKind::RefField { target: Box::new(this), field }, ty)
                }
                None => Expr::placeholder(Type::Null),
            },
            E::BinOp { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, span),
            E::UnaryOp { op, operand } => self.check_unary(*op, operand, span),
            E::Assign { target, value } => self.check_assign(target, value, span),
            E::CompoundAssign { value, .. } => {
                let value = self.check_expr(value);
                self.report(ErrorCode::UnimplementedFeature, span, vec!["compound assignment".to_string()]);
                Expr::placeholder(value.ty)
            }
            E::PostIncrement(target) => self.check_post_step(target, crate::ir::BinaryOp::Add, span),
            E::PostDecrement(target) => self.check_post_step(target, crate::ir::BinaryOp::Sub, span),
            E::Index { object, index } => self.check_index(object, index, span),
            E::FieldAccess { object, field } => self.check_field_access(object, field),
            E::MethodCall { object, method, args } => {
                let target = self.check_expr(object);
                let args = self.check_args(args);
                self.call_method(target, &method.node, args, method.span)
                    .unwrap_or_else(|| Expr::placeholder(Type::Null))
            }
            E::SelfCall { method, args } => self.self_call(method, args),
            E::SuperCall { method, args } => self.super_call(method, args, span),
            E::StaticCall { class, method, args } => self.static_call(class, method, args),
            E::StaticField { class, field } => self.static_field(class, field),
            E::NewObject { class, args } => self.new_object(class, args, span),
            E::NewArray { elem, dims } => self.new_array(elem, dims),
            E::Cast { expr, target_type } => self.check_cast(expr, target_type),
            E::InstanceOf { expr, target_type } => self.check_instance_of(expr, target_type),
            E::Closure { interface, method, params, return_type, body } => {
                self.check_closure(interface, method, params, return_type.as_ref(), body)
            }
        }
    }

    pub(super) fn check_args(&mut self, args: &[Spanned<ast::Expr>]) -> Vec<Expr> {
        args.iter().map(|a| self.check_expr(a)).collect()
    }

    fn this(&mut self, span: Span) -> Option<Expr> {
        if self.is_static {
            self.report(ErrorCode::IllegalSelfReference, span, Vec::new());
            return None;
        }
        Some(Expr::new(ExprKind::This, Type::Class(self.class)))
    }

    /// Field of the current instance, visible from the current class.
    fn self_field(&mut self, name: &str, span: Span) -> Option<FieldId> {
        self.this(span)?;
        let class_name = self.env.table.class(self.class).name.clone();
        let Some(field) = rules::find_field(&self.env.table, self.class, name) else {
            self.report(ErrorCode::FieldNotFound, span, vec![class_name, name.to_string()]);
            return None;
        };
        let f = self.env.table.field(field);
        if !rules::member_accessible(&self.env.table, f.owner, f.modifiers, self.class) {
            self.report(ErrorCode::FieldNotAccessible, span, vec![class_name, name.to_string()]);
            return None;
        }
        Some(field)
    }

    /// Pick the single applicable, accessible method of `receiver`.
    pub(super) fn select_method(&mut self, receiver: Type, name: &str, args: &[Expr], span: Span) -> Option<MethodId> {
        let types: Vec<Type> = args.iter().map(|a| a.ty).collect();
        let found = rules::applicable_methods(&self.env.table, receiver, name, &types);
        match found.as_slice() {
            [m] => {
                let method = self.env.table.method(*m);
                if !rules::member_accessible(&self.env.table, method.owner, method.modifiers, self.class) {
                    let args = vec![self.type_name(receiver), name.to_string()];
                    self.report(ErrorCode::MethodNotAccessible, span, args);
                    return None;
                }
                Some(*m)
            }
            [] => {
                let args = vec![self.type_name(receiver), name.to_string(), self.type_list(args)];
                self.report(ErrorCode::MethodNotFound, span, args);
                None
            }
            _ => {
                let args = vec![self.type_name(receiver), name.to_string(), self.type_list(args)];
                self.report(ErrorCode::AmbiguousMethod, span, args);
                None
            }
        }
    }

    /// Instance call `target.name(args)`. `None` once a problem is reported,
    /// or when an operand already failed.
    pub(super) fn call_method(&mut self, target: Expr, name: &str, args: Vec<Expr>, span: Span) -> Option<Expr> {
        if target.is_placeholder() || args.iter().any(Expr::is_placeholder) {
            return None;
        }
        if !target.ty.is_object() {
            let args = vec![self.type_name(self.root()), self.type_name(target.ty)];
            self.report(ErrorCode::IncompatibleType, span, args);
            return None;
        }
        let m = self.select_method(target.ty, name, &args, span)?;
        let method = self.env.table.method(m);
        if method.modifiers.is_static() {
            let args = vec![self.type_name(target.ty), name.to_string()];
            self.report(ErrorCode::IllegalMethodCall, span, args);
            return None;
        }
        let (ret, params) = (method.ret, method.params.clone());
        let args = convert_args(args, &params);
        Some(Expr::new(ExprKind::Call { target: Box::new(target), method: m, args }, ret))
    }

    fn call_static(&mut self, receiver: Type, method: &Spanned<String>, args: Vec<Expr>) -> Expr {
        let Some(m) = self.select_method(receiver, &method.node, &args, method.span) else {
            return Expr::placeholder(Type::Null);
        };
        let symbol = self.env.table.method(m);
        if !symbol.modifiers.is_static() {
            let args = vec![self.type_name(receiver), method.node.clone()];
            return self.error(ErrorCode::IllegalMethodCall, method.span, args);
        }
        let (ret, params) = (symbol.ret, symbol.params.clone());
        let args = convert_args(args, &params);
        Expr::new(ExprKind::CallStatic { method: m, args }, ret)
    }

    /// Static-import class declaring a static method that accepts `args`.
    fn static_import_for(&self, name: &str, args: &[Expr]) -> Option<ClassId> {
        let types: Vec<Type> = args.iter().map(|a| a.ty).collect();
        let table = &self.env.table;
        self.env.unit_info.get(self.unit)?.static_imports.iter().copied().find(|&class| {
            rules::applicable_methods(table, Type::Class(class), name, &types)
                .iter()
                .any(|&m| table.method(m).modifiers.is_static())
        })
    }

    /// Unqualified call: the current class first, then the static imports.
    fn self_call(&mut self, method: &Spanned<String>, args: &[Spanned<ast::Expr>]) -> Expr {
        let args = self.check_args(args);
        if args.iter().any(Expr::is_placeholder) {
            return Expr::placeholder(Type::Null);
        }
        let own = Type::Class(self.class);
        let types: Vec<Type> = args.iter().map(|a| a.ty).collect();
        if rules::applicable_methods(&self.env.table, own, &method.node, &types).is_empty() {
            if let Some(class) = self.static_import_for(&method.node, &args) {
                return self.call_static(Type::Class(class), method, args);
            }
        }
        let Some(m) = self.select_method(own, &method.node, &args, method.span) else {
            return Expr::placeholder(Type::Null);
        };
        let symbol = self.env.table.method(m);
        let (ret, params, is_static) = (symbol.ret, symbol.params.clone(), symbol.modifiers.is_static());
        let args = convert_args(args, &params);
        if is_static {
            return Expr::new(ExprKind::CallStatic { method: m, args }, ret);
        }
        if self.is_static {
            let class_name = self.env.table.class(self.class).name.clone();
            return self.error(ErrorCode::IllegalMethodCall, method.span, vec![class_name, method.node.clone()]);
        }
        let this = Expr::new(ExprKind::This, own);
        Expr::new(ExprKind::Call { target: Box::new(this), method: m, args }, ret)
    }

    fn super_call(&mut self, method: &Spanned<String>, args: &[Spanned<ast::Expr>], span: Span) -> Expr {
        let args = self.check_args(args);
        let Some(this) = self.this(span) else { return Expr::placeholder(Type::Null) };
        if args.iter().any(Expr::is_placeholder) {
            return Expr::placeholder(Type::Null);
        }
        let sup = Type::Class(superclass_of(self.env, self.class));
        let Some(m) = self.select_method(sup, &method.node, &args, method.span) else {
            return Expr::placeholder(Type::Null);
        };
        let symbol = self.env.table.method(m);
        let (ret, params) = (symbol.ret, symbol.params.clone());
        let args = convert_args(args, &params);
        Expr::new(ExprKind::CallSuper { target: Box::new(this), method: m, args }, ret)
    }

    /// Resolve a class named in expression position, checking it is a class
    /// visible from here.
    fn class_operand(&mut self, spec: &Spanned<ast::TypeSpec>) -> Option<ClassId> {
        let ty = self.resolve(spec)?;
        let Type::Class(class) = ty else {
            let args = vec![self.type_name(self.root()), self.type_name(ty)];
            self.report(ErrorCode::IncompatibleType, spec.span, args);
            return None;
        };
        if !rules::class_accessible(&self.env.table, class, self.class) {
            self.report(ErrorCode::ClassNotAccessible, spec.span, vec![self.type_name(ty)]);
            return None;
        }
        Some(class)
    }

    fn static_call(
        &mut self,
        class: &Spanned<ast::TypeSpec>,
        method: &Spanned<String>,
        args: &[Spanned<ast::Expr>],
    ) -> Expr {
        let class = self.class_operand(class);
        let args = self.check_args(args);
        match class {
            Some(class) if !args.iter().any(Expr::is_placeholder) => self.call_static(Type::Class(class), method, args),
            _ => Expr::placeholder(Type::Null),
        }
    }

    fn static_field(&mut self, class: &Spanned<ast::TypeSpec>, field: &Spanned<String>) -> Expr {
        let Some(class) = self.class_operand(class) else { return Expr::placeholder(Type::Null) };
        let class_name = self.env.table.class(class).name.clone();
        let found = rules::find_field(&self.env.table, class, &field.node)
            .filter(|&f| self.env.table.field(f).modifiers.is_static());
        let Some(f) = found else {
            return self.error(ErrorCode::FieldNotFound, field.span, vec![class_name, field.node.clone()]);
        };
        let symbol = self.env.table.field(f);
        if !rules::member_accessible(&self.env.table, symbol.owner, symbol.modifiers, self.class) {
            return self.error(ErrorCode::FieldNotAccessible, field.span, vec![class_name, field.node.clone()]);
        }
        Expr::new(ExprKind::RefStaticField(f), symbol.ty)
    }

    fn new_object(&mut self, class: &Spanned<ast::TypeSpec>, args: &[Spanned<ast::Expr>], span: Span) -> Expr {
        let class = self.class_operand(class);
        let args = self.check_args(args);
        let Some(class) = class else { return Expr::placeholder(Type::Null) };
        if args.iter().any(Expr::is_placeholder) {
            return Expr::placeholder(Type::Class(class));
        }
        let types: Vec<Type> = args.iter().map(|a| a.ty).collect();
        let found = rules::applicable_constructors(&self.env.table, class, &types);
        let class_name = self.env.table.class(class).name.clone();
        match found.as_slice() {
            [ctor] => {
                let params = self.env.table.constructor(*ctor).params.clone();
                let args = convert_args(args, &params);
                Expr::new(ExprKind::NewObject { constructor: *ctor, args }, Type::Class(class))
            }
            [] => self.error(ErrorCode::ConstructorNotFound, span, vec![class_name, self.type_list(&args)]),
            _ => self.error(ErrorCode::AmbiguousConstructor, span, vec![class_name, self.type_list(&args)]),
        }
    }

    fn new_array(&mut self, elem: &Spanned<ast::TypeSpec>, dims: &[Spanned<ast::Expr>]) -> Expr {
        let component = self.resolve(elem);
        let mut sizes = Vec::with_capacity(dims.len());
        for dim in dims {
            let size = self.check_expr(dim);
            if let Some(size) = self.integer_index(size, dim.span) {
                sizes.push(size);
            }
        }
        let Some(component) = component else { return Expr::placeholder(Type::Null) };
        let array = self.env.table.load_array(component, dims.len().max(1) as u32);
        if sizes.len() != dims.len() {
            return Expr::placeholder(Type::Array(array));
        }
        Expr::new(ExprKind::NewArray { array, dims: sizes }, Type::Array(array))
    }

    /// Index or dimension operand: any integer type, converted to int.
    pub(super) fn integer_index(&mut self, index: Expr, span: Span) -> Option<Expr> {
        if index.is_placeholder() {
            return None;
        }
        if !index.ty.is_integer() {
            let args = vec![self.type_name(Type::INT), self.type_name(index.ty)];
            self.report(ErrorCode::IncompatibleType, span, args);
            return None;
        }
        Some(index.cast(Type::INT))
    }

    fn check_cast(&mut self, expr: &Spanned<ast::Expr>, target: &Spanned<ast::TypeSpec>) -> Expr {
        let value = self.check_expr(expr);
        let Some(ty) = self.resolve(target) else { return Expr::placeholder(Type::Null) };
        if value.is_placeholder() {
            return Expr::placeholder(ty);
        }
        let convertible = match (value.ty, ty) {
            (Type::Primitive(a), Type::Primitive(b)) => a == b || (a.is_numeric() && b.is_numeric()),
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            _ => true,
        };
        if !convertible {
            let args = vec![self.type_name(ty), self.type_name(value.ty)];
            return self.error(ErrorCode::IncompatibleType, expr.span, args);
        }
        Expr::new(ExprKind::Cast(Box::new(value)), ty)
    }

    fn check_instance_of(&mut self, expr: &Spanned<ast::Expr>, target: &Spanned<ast::TypeSpec>) -> Expr {
        let value = self.check_expr(expr);
        let Some(ty) = self.resolve(target) else { return Expr::placeholder(Type::BOOLEAN) };
        if value.is_placeholder() {
            return Expr::placeholder(Type::BOOLEAN);
        }
        for (operand, span) in [(value.ty, expr.span), (ty, target.span)] {
            if operand.is_primitive() {
                let args = vec![self.type_name(self.root()), self.type_name(operand)];
                self.report(ErrorCode::IncompatibleType, span, args);
                return Expr::placeholder(Type::BOOLEAN);
            }
        }
        Expr::new(ExprKind::InstanceOf { expr: Box::new(value), target: ty }, Type::BOOLEAN)
    }

    fn check_index(&mut self, object: &Spanned<ast::Expr>, index: &Spanned<ast::Expr>, span: Span) -> Expr {
        let target = self.check_expr(object);
        let idx = self.check_expr(index);
        if target.is_placeholder() || idx.is_placeholder() {
            return Expr::placeholder(Type::Null);
        }
        match target.ty {
            Type::Array(array) => {
                let element = self.env.table.element_type(array);
                let Some(idx) = self.integer_index(idx, index.span) else { return Expr::placeholder(element) };
                Expr::new(ExprKind::ArrayRef { target: Box::new(target), index: Box::new(idx) }, element)
            }
            Type::Class(_) => {
                self.call_method(target, "get", vec![idx], span).unwrap_or_else(|| Expr::placeholder(Type::Null))
            }
            Type::Primitive(_) | Type::Null => {
                let args = vec![self.type_name(self.root()), self.type_name(target.ty)];
                self.error(ErrorCode::IncompatibleType, object.span, args)
            }
        }
    }

    /// `target.name`: a visible field, else `name()`, `getName()` or `isName()`.
    fn check_field_access(&mut self, object: &Spanned<ast::Expr>, field: &Spanned<String>) -> Expr {
        let target = self.check_expr(object);
        if target.is_placeholder() {
            return target;
        }
        let (name, span) = (&field.node, field.span);
        let class = match target.ty {
            Type::Class(class) => class,
            Type::Array(_) if name == "length" || name == "size" => {
                return Expr::new(ExprKind::ArrayLength(Box::new(target)), Type::INT);
            }
            Type::Array(_) => {
                let args = vec![self.type_name(target.ty), name.clone()];
                return self.error(ErrorCode::FieldNotFound, span, args);
            }
            Type::Primitive(_) | Type::Null => {
                let args = vec![self.type_name(self.root()), self.type_name(target.ty)];
                return self.error(ErrorCode::IncompatibleType, object.span, args);
            }
        };
        if !rules::class_accessible(&self.env.table, class, self.class) {
            return self.error(ErrorCode::ClassNotAccessible, object.span, vec![self.type_name(target.ty)]);
        }

        let found = rules::find_field(&self.env.table, class, name);
        if let Some(f) = found {
            let symbol = self.env.table.field(f);
            if rules::member_accessible(&self.env.table, symbol.owner, symbol.modifiers, self.class) {
                let kind = if symbol.modifiers.is_static() {
                    ExprKind::RefStaticField(f)
                } else {
                    ExprKind::RefField { target: Box::new(target), field: f }
                };
                return Expr::new(kind, symbol.ty);
            }
        }

        let capitalized = capitalize(name);
        for candidate in [name.clone(), format!("get{capitalized}"), format!("is{capitalized}")] {
            let getters: Vec<MethodId> = rules::applicable_methods(&self.env.table, target.ty, &candidate, &[])
                .into_iter()
                .filter(|&m| !self.env.table.method(m).modifiers.is_static())
                .collect();
            let [m] = getters.as_slice() else { continue };
            let method = self.env.table.method(*m);
            if !rules::member_accessible(&self.env.table, method.owner, method.modifiers, self.class) {
                return self.error(ErrorCode::MethodNotAccessible, span, vec![self.type_name(target.ty), candidate]);
            }
            let ret = method.ret;
            return Expr::new(ExprKind::Call { target: Box::new(target), method: *m, args: Vec::new() }, ret);
        }

        let code = if found.is_some() { ErrorCode::FieldNotAccessible } else { ErrorCode::FieldNotFound };
        self.error(code, span, vec![self.type_name(target.ty), name.clone()])
    }

    fn check_assign(&mut self, target: &Spanned<ast::Expr>, value: &Spanned<ast::Expr>, span: Span) -> Expr {
        use ast::Expr as E;
        match &target.node {
            E::Ident(name) => {
                let checked = self.check_expr(value);
                let slot = match self.frames.lookup(name) {
                    Some(slot) => slot,
                    None => {
                        // First assignment declares the local.
                        let ty = if checked.ty == Type::Null { self.root() } else { checked.ty };
                        match self.frames.define(name, ty) {
                            Some(slot) => slot,
                            None => return Expr::placeholder(ty),
                        }
                    }
                };
                let checked = self.assign_to(checked, slot.ty, value.span);
                Expr::set_local(slot, checked)
            }
            E::SelfField(name) => {
                let checked = self.check_expr(value);
                let Some(field) = self.self_field(name, target.span) else { return Expr::placeholder(checked.ty) };
                let ty = self.env.table.field(field).ty;
                let checked = self.assign_to(checked, ty, value.span);
                let this = Expr::new(ExprKind::This, Type::Class(self.class));
                Expr::new(ExprKind::SetField { target: Box::new(this), field, value: Box::new(checked) }, ty)
            }
            E::Index { object, index } => self.assign_index(object, index, value, span),
            _ => {
                let checked = self.check_expr(value);
                let feature = match &target.node {
                    E::FieldAccess { .. } => "assignment to a field of another object",
                    _ => "assignment to this target",
                };
                self.report(ErrorCode::UnimplementedFeature, target.span, vec![feature.to_string()]);
                Expr::placeholder(checked.ty)
            }
        }
    }

    fn assign_index(
        &mut self,
        object: &Spanned<ast::Expr>,
        index: &Spanned<ast::Expr>,
        value: &Spanned<ast::Expr>,
        span: Span,
    ) -> Expr {
        let target = self.check_expr(object);
        let idx = self.check_expr(index);
        let checked = self.check_expr(value);
        if target.is_placeholder() || idx.is_placeholder() || checked.is_placeholder() {
            return Expr::placeholder(checked.ty);
        }
        match target.ty {
            Type::Array(array) => {
                let element = self.env.table.element_type(array);
                let Some(idx) = self.integer_index(idx, index.span) else { return Expr::placeholder(element) };
                let checked = self.assign_to(checked, element, value.span);
                Expr::new(
                    ExprKind::ArraySet { target: Box::new(target), index: Box::new(idx), value: Box::new(checked) },
                    element,
                )
            }
            Type::Class(_) => self
                .call_method(target, "set", vec![idx, checked], span)
                .unwrap_or_else(|| Expr::placeholder(Type::Null)),
            Type::Primitive(_) | Type::Null => {
                let args = vec![self.type_name(self.root()), self.type_name(target.ty)];
                self.error(ErrorCode::IncompatibleType, object.span, args)
            }
        }
    }
}
