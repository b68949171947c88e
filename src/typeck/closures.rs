use crate::ast::{Block, Param, TypeSpec};
use crate::diagnostics::ErrorCode;
use crate::ir::{Body, Expr, ExprKind, Stmt};
use crate::span::Spanned;
use crate::symbols::Type;

use super::check::BodyChecker;
use super::rules;

impl BodyChecker<'_, '_> {
    /// `#Interface.method(params) { body }`: an anonymous implementation of
    /// one abstract method, checked in a frame of its own.
    pub(super) fn check_closure(
        &mut self,
        interface: &Spanned<TypeSpec>,
        method: &Spanned<String>,
        params: &[Param],
        return_type: Option<&Spanned<TypeSpec>>,
        body: &Spanned<Block>,
    ) -> Expr {
        let Some(iface_ty) = self.resolve(interface) else { return Expr::placeholder(Type::Null) };
        let iface = match iface_ty {
            Type::Class(id) if self.env.table.class(id).is_interface() => id,
            _ => return self.error(ErrorCode::InterfaceRequired, interface.span, vec![self.type_name(iface_ty)]),
        };

        let mut types = Vec::with_capacity(params.len());
        for param in params {
            match self.resolve(&param.ty) {
                Some(ty) => types.push(ty),
                None => return Expr::placeholder(iface_ty),
            }
        }
        let found = rules::find_exact_method(&self.env.table, iface, &method.node, &types)
            .filter(|&m| !self.env.table.method(m).modifiers.is_static());
        let Some(target) = found else {
            let args = vec![self.type_name(iface_ty), method.node.clone(), self.env.table.type_list(&types)];
            self.report(ErrorCode::MethodNotFound, method.span, args);
            return Expr::placeholder(iface_ty);
        };
        let ret = self.env.table.method(target).ret;
        if let Some(declared) = return_type.and_then(|spec| self.resolve(spec).map(|ty| (ty, spec.span))) {
            if declared.0 != ret {
                let args = vec![self.type_name(ret), self.type_name(declared.0)];
                self.report(ErrorCode::IncompatibleType, declared.1, args);
            }
        }

        tracing::trace!(interface = %self.type_name(iface_ty), method = %method.node, "checking closure");
        self.frames.push_frame();
        for (param, ty) in params.iter().zip(types) {
            self.declare(&param.name, ty);
        }
        let outer_return = std::mem::replace(&mut self.return_type, ret);
        let mut stmts: Vec<Stmt> = body.node.stmts.iter().map(|s| self.check_stmt(s)).collect();
        stmts.push(Stmt::default_return(ret));
        self.return_type = outer_return;
        let frame = self.frames.pop_frame();

        let body = Body { block: Stmt::Block(stmts), frame };
        Expr::new(ExprKind::NewClosure { interface: iface, method: target, body: Box::new(body) }, iface_ty)
    }
}
