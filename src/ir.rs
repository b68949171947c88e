//! Typed intermediate representation produced by the checker.
//!
//! Every expression carries its resolved type. Bodies pair a statement tree
//! with the layout of the frame their locals live in.

use crate::frame::{FrameLayout, LocalSlot};
use crate::symbols::{ArrayId, ClassId, ConstructorId, FieldId, MethodId, Primitive, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    /// Reference identity; never dispatches to `equals`.
    RefEq,
    RefNe,
    Lt,
    Le,
    Gt,
    Ge,
    Elvis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Byte(i8),
    Short(i16),
    Bool(bool),
    String(String),
    Null,
    ListLiteral(Vec<Expr>),
    This,
    RefLocal(LocalSlot),
    SetLocal {
        slot: LocalSlot,
        value: Box<Expr>,
    },
    RefField {
        target: Box<Expr>,
        field: FieldId,
    },
    SetField {
        target: Box<Expr>,
        field: FieldId,
        value: Box<Expr>,
    },
    RefStaticField(FieldId),
    Call {
        target: Box<Expr>,
        method: MethodId,
        args: Vec<Expr>,
    },
    CallStatic {
        method: MethodId,
        args: Vec<Expr>,
    },
    /// Non-virtual call of a superclass method on `this`.
    CallSuper {
        target: Box<Expr>,
        method: MethodId,
        args: Vec<Expr>,
    },
    NewObject {
        constructor: ConstructorId,
        args: Vec<Expr>,
    },
    NewArray {
        array: ArrayId,
        dims: Vec<Expr>,
    },
    NewClosure {
        interface: ClassId,
        method: MethodId,
        body: Box<Body>,
    },
    ArrayRef {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    ArraySet {
        target: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    ArrayLength(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Conversion to `Expr::ty`: numeric widening/narrowing or a checked
    /// reference cast.
    Cast(Box<Expr>),
    InstanceOf {
        expr: Box<Expr>,
        target: Type,
    },
    /// Evaluate in order; the value is the last expression's.
    Begin(Vec<Expr>),
    /// Stands in for an expression that failed to check.
    Placeholder,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn placeholder(ty: Type) -> Self {
        Self::new(ExprKind::Placeholder, ty)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ExprKind::Placeholder)
    }

    pub fn local(slot: LocalSlot) -> Self {
        Self::new(ExprKind::RefLocal(slot), slot.ty)
    }

    pub fn set_local(slot: LocalSlot, value: Expr) -> Self {
        Self::new(ExprKind::SetLocal { slot, value: Box::new(value) }, slot.ty)
    }

    pub fn cast(self, ty: Type) -> Self {
        if self.ty == ty {
            return self;
        }
        Self::new(ExprKind::Cast(Box::new(self)), ty)
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: Type) -> Self {
        Self::new(ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, ty)
    }

    pub fn unary(op: UnaryOp, operand: Expr, ty: Type) -> Self {
        Self::new(ExprKind::Unary { op, operand: Box::new(operand) }, ty)
    }

    /// The zero value a variable of type `ty` starts with.
    pub fn default_value(ty: Type) -> Self {
        let kind = match ty {
            Type::Primitive(p) => match p {
                Primitive::Byte => ExprKind::Byte(0),
                Primitive::Short => ExprKind::Short(0),
                Primitive::Char => ExprKind::Char('\0'),
                Primitive::Int => ExprKind::Int(0),
                Primitive::Long => ExprKind::Long(0),
                Primitive::Float => ExprKind::Float(0.0),
                Primitive::Double => ExprKind::Double(0.0),
                Primitive::Boolean => ExprKind::Bool(false),
                Primitive::Void => return Self::placeholder(Type::VOID),
            },
            Type::Class(_) | Type::Array(_) | Type::Null => ExprKind::Null,
        };
        Self::new(kind, ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Expr(Expr),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Loop {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        body: Box<Stmt>,
        catches: Vec<(LocalSlot, Stmt)>,
    },
    Nop,
}

impl Stmt {
    /// `return <default of ty>`, or a bare return for void.
    pub fn default_return(ty: Type) -> Self {
        if ty.is_void() {
            Stmt::Return(None)
        } else {
            Stmt::Return(Some(Expr::default_value(ty)))
        }
    }
}

/// A checked executable body.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub block: Stmt,
    pub frame: FrameLayout,
}

impl Body {
    pub fn statements(&self) -> &[Stmt] {
        match &self.block {
            Stmt::Block(stmts) => stmts,
            other => std::slice::from_ref(other),
        }
    }

    /// The trailing statement, always a return once the checker is done.
    pub fn last(&self) -> Option<&Stmt> {
        self.statements().last()
    }
}
