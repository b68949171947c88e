//! Operator typing and lowering.

use crate::ast::{self, BinOp};
use crate::diagnostics::ErrorCode;
use crate::ir::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::span::{Span, Spanned};
use crate::symbols::{Primitive, Type};

use super::check::BodyChecker;
use super::rules;

fn lower(op: BinOp) -> BinaryOp {
    match op {
        BinOp::Add => BinaryOp::Add,
        BinOp::Sub => BinaryOp::Sub,
        BinOp::Mul => BinaryOp::Mul,
        BinOp::Div => BinaryOp::Div,
        BinOp::Mod => BinaryOp::Mod,
        BinOp::BitAnd => BinaryOp::BitAnd,
        BinOp::BitOr => BinaryOp::BitOr,
        BinOp::BitXor => BinaryOp::BitXor,
        BinOp::Shl => BinaryOp::Shl,
        BinOp::Shr => BinaryOp::Shr,
        BinOp::UShr => BinaryOp::UShr,
        BinOp::And => BinaryOp::LogicalAnd,
        BinOp::Or => BinaryOp::LogicalOr,
        BinOp::Eq => BinaryOp::Eq,
        BinOp::Neq => BinaryOp::Ne,
        BinOp::RefEq => BinaryOp::RefEq,
        BinOp::RefNeq => BinaryOp::RefNe,
        BinOp::Lt => BinaryOp::Lt,
        BinOp::LtEq => BinaryOp::Le,
        BinOp::Gt => BinaryOp::Gt,
        BinOp::GtEq => BinaryOp::Ge,
        BinOp::Elvis => BinaryOp::Elvis,
    }
}

/// Type a failed operation of `op` stands in with.
fn fallback_type(op: BinOp) -> Type {
    match op {
        BinOp::And
        | BinOp::Or
        | BinOp::Eq
        | BinOp::Neq
        | BinOp::RefEq
        | BinOp::RefNeq
        | BinOp::Lt
        | BinOp::LtEq
        | BinOp::Gt
        | BinOp::GtEq => Type::BOOLEAN,
        _ => Type::Null,
    }
}

impl BodyChecker<'_, '_> {
    pub(super) fn check_binary(
        &mut self,
        op: BinOp,
        lhs: &Spanned<ast::Expr>,
        rhs: &Spanned<ast::Expr>,
        span: Span,
    ) -> Expr {
        let l = self.check_expr(lhs);
        let r = self.check_expr(rhs);
        if l.is_placeholder() || r.is_placeholder() {
            return Expr::placeholder(fallback_type(op));
        }
        match op {
            BinOp::Add => self.check_add(l, r, span),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => self.arithmetic(op, l, r, span),
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => self.bitwise(op, l, r, span),
            BinOp::Shl | BinOp::Shr | BinOp::UShr => self.shift(op, l, r, span),
            BinOp::And | BinOp::Or => {
                if l.ty != Type::BOOLEAN || r.ty != Type::BOOLEAN {
                    return self.operand_error(op, &l, &r, span);
                }
                Expr::binary(lower(op), l, r, Type::BOOLEAN)
            }
            BinOp::Eq | BinOp::Neq => self.equality(op, l, r, span),
            BinOp::RefEq | BinOp::RefNeq => {
                if l.ty.is_primitive() || r.ty.is_primitive() {
                    return self.operand_error(op, &l, &r, span);
                }
                Expr::binary(lower(op), l, r, Type::BOOLEAN)
            }
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => match promoted(&l, &r) {
                Some(ty) => Expr::binary(lower(op), l.cast(ty), r.cast(ty), Type::BOOLEAN),
                None => self.operand_error(op, &l, &r, span),
            },
            BinOp::Elvis => {
                let fits = l.ty.is_reference()
                    && r.ty.is_reference()
                    && rules::is_assignable(&self.env.table, r.ty, l.ty);
                if !fits {
                    return self.operand_error(op, &l, &r, span);
                }
                let ty = l.ty;
                Expr::binary(BinaryOp::Elvis, l, r.cast(ty), ty)
            }
        }
    }

    fn operand_error(&mut self, op: BinOp, l: &Expr, r: &Expr, span: Span) -> Expr {
        let args = vec![op.symbol().to_string(), self.type_name(l.ty), self.type_name(r.ty)];
        self.report(ErrorCode::IncompatibleOperandType, span, args);
        Expr::placeholder(fallback_type(op))
    }

    fn arithmetic(&mut self, op: BinOp, l: Expr, r: Expr, span: Span) -> Expr {
        match promoted(&l, &r) {
            Some(ty) => Expr::binary(lower(op), l.cast(ty), r.cast(ty), ty),
            None => self.operand_error(op, &l, &r, span),
        }
    }

    /// Numeric addition, or string concatenation once either side is a reference.
    fn check_add(&mut self, l: Expr, r: Expr, span: Span) -> Expr {
        if let Some(void) = [l.ty, r.ty].into_iter().find(|t| t.is_void()) {
            return self.error(ErrorCode::IsNotBoxableType, span, vec![self.type_name(void)]);
        }
        if l.ty.is_primitive() && r.ty.is_primitive() {
            return self.arithmetic(BinOp::Add, l, r, span);
        }
        let (Some(l), Some(r)) = (self.stringify(l, span), self.stringify(r, span)) else {
            return Expr::placeholder(Type::Null);
        };
        self.call_method(l, "concat", vec![r], span).unwrap_or_else(|| Expr::placeholder(Type::Null))
    }

    fn stringify(&mut self, value: Expr, span: Span) -> Option<Expr> {
        let value = match value.ty {
            Type::Primitive(p) => self.box_primitive(value, p, span)?,
            Type::Null => value.cast(self.root()),
            Type::Class(_) | Type::Array(_) => value,
        };
        self.call_method(value, "toString", Vec::new(), span)
    }

    /// `new <Wrapper>(value)` through the wrapper's single-primitive constructor.
    fn box_primitive(&mut self, value: Expr, p: Primitive, span: Span) -> Option<Expr> {
        let boxed = p.boxed_class().and_then(|name| self.env.table.load(name));
        let table = &self.env.table;
        let ctor = boxed.and_then(|class| {
            table.class(class).constructors.iter().copied().find(|&c| table.constructor(c).params == [Type::Primitive(p)])
        });
        match (boxed, ctor) {
            (Some(class), Some(constructor)) => {
                Some(Expr::new(ExprKind::NewObject { constructor, args: vec![value] }, Type::Class(class)))
            }
            _ => {
                self.report(ErrorCode::IsNotBoxableType, span, vec![p.name().to_string()]);
                None
            }
        }
    }

    fn bitwise(&mut self, op: BinOp, l: Expr, r: Expr, span: Span) -> Expr {
        match (l.ty.as_primitive(), r.ty.as_primitive()) {
            (Some(Primitive::Boolean), Some(Primitive::Boolean)) => Expr::binary(lower(op), l, r, Type::BOOLEAN),
            (Some(a), Some(b)) if a.is_integer() && b.is_integer() => self.arithmetic(op, l, r, span),
            _ => self.operand_error(op, &l, &r, span),
        }
    }

    fn shift(&mut self, op: BinOp, l: Expr, r: Expr, span: Span) -> Expr {
        if op == BinOp::Shl && l.ty.is_object() {
            // `list << x` appends.
            return self.call_method(l, "add", vec![r], span).unwrap_or_else(|| Expr::placeholder(Type::Null));
        }
        match (l.ty.as_primitive(), r.ty.as_primitive()) {
            (Some(a), Some(b)) if a.is_integer() && b.is_integer() => {
                let ty = if a == Primitive::Long { Type::Primitive(Primitive::Long) } else { Type::INT };
                Expr::binary(lower(op), l.cast(ty), r.cast(Type::INT), ty)
            }
            _ => self.operand_error(op, &l, &r, span),
        }
    }

    fn equality(&mut self, op: BinOp, l: Expr, r: Expr, span: Span) -> Expr {
        if l.ty.is_primitive() != r.ty.is_primitive() {
            return self.operand_error(op, &l, &r, span);
        }
        if l.ty.is_primitive() {
            if l.ty == Type::BOOLEAN && r.ty == Type::BOOLEAN {
                return Expr::binary(lower(op), l, r, Type::BOOLEAN);
            }
            return match promoted(&l, &r) {
                Some(ty) => Expr::binary(lower(op), l.cast(ty), r.cast(ty), Type::BOOLEAN),
                None => self.operand_error(op, &l, &r, span),
            };
        }
        if l.ty == Type::Null || r.ty == Type::Null {
            let identity = if op == BinOp::Eq { BinaryOp::RefEq } else { BinaryOp::RefNe };
            return Expr::binary(identity, l, r, Type::BOOLEAN);
        }
        let root = self.root();
        let Some(equals) = self.call_method(l, "equals", vec![r.cast(root)], span) else {
            return Expr::placeholder(Type::BOOLEAN);
        };
        if op == BinOp::Neq {
            return Expr::unary(UnaryOp::Not, equals, Type::BOOLEAN);
        }
        equals
    }

    pub(super) fn check_unary(&mut self, op: ast::UnaryOp, operand: &Spanned<ast::Expr>, span: Span) -> Expr {
        let value = self.check_expr(operand);
        if value.is_placeholder() {
            return value;
        }
        let (lowered, fits) = match op {
            ast::UnaryOp::Plus => (UnaryOp::Plus, value.ty.is_numeric()),
            ast::UnaryOp::Neg => (UnaryOp::Minus, value.ty.is_numeric()),
            ast::UnaryOp::Not => (UnaryOp::Not, value.ty == Type::BOOLEAN),
        };
        if !fits {
            let args = vec![op.symbol().to_string(), self.type_name(value.ty)];
            return self.error(ErrorCode::IncompatibleOperandType, span, args);
        }
        let ty = value.ty;
        Expr::unary(lowered, value, ty)
    }

    /// `x++` / `x--` on a local: yields the old value.
    pub(super) fn check_post_step(&mut self, target: &Spanned<ast::Expr>, op: BinaryOp, span: Span) -> Expr {
        let symbol = if op == BinaryOp::Add { "++" } else { "--" };
        let ast::Expr::Ident(name) = &target.node else {
            let feature = format!("{symbol} on this target");
            return self.error(ErrorCode::UnimplementedFeature, target.span, vec![feature]);
        };
        let Some(slot) = self.frames.lookup(name) else {
            return self.error(ErrorCode::VariableNotFound, target.span, vec![name.clone()]);
        };
        let Some(p) = slot.ty.as_primitive().filter(|p| p.is_numeric()) else {
            let args = vec![symbol.to_string(), self.type_name(slot.ty)];
            return self.error(ErrorCode::IncompatibleOperandType, span, args);
        };
        let ty = rules::promote(p, Primitive::Int).map_or(slot.ty, Type::Primitive);
        let tmp = self.frames.define_hidden(slot.ty);
        let one = Expr::new(ExprKind::Int(1), Type::INT).cast(ty);
        let step = Expr::binary(op, Expr::local(slot).cast(ty), one, ty).cast(slot.ty);
        Expr::new(
            ExprKind::Begin(vec![
                Expr::set_local(tmp, Expr::local(slot)),
                Expr::set_local(slot, step),
                Expr::local(tmp),
            ]),
            slot.ty,
        )
    }
}

/// Common numeric type of two operands, if both are numeric.
fn promoted(l: &Expr, r: &Expr) -> Option<Type> {
    let (a, b) = (l.ty.as_primitive()?, r.ty.as_primitive()?);
    rules::promote(a, b).map(Type::Primitive)
}
