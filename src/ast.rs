//! Input syntax tree, as produced by the front end for each compilation unit.

use serde::{Deserialize, Serialize};

use crate::span::Spanned;
use crate::symbols::{Modifiers, Primitive};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Used for diagnostics and to name the unit's top-level class.
    pub source_file: String,
    pub module: Option<Spanned<String>>,
    #[serde(default)]
    pub imports: Vec<Spanned<ImportDecl>>,
    pub top_levels: Vec<TopLevel>,
}

impl CompilationUnit {
    /// Whether the unit holds anything besides type declarations.
    pub fn has_free_code(&self) -> bool {
        self.top_levels
            .iter()
            .any(|t| !matches!(t, TopLevel::Class(_) | TopLevel::Interface(_)))
    }
}

/// `import { alias = fqcn }`. A `*` alias with a `pkg.*` pattern imports a
/// whole package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub alias: String,
    pub fqcn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevel {
    Class(Spanned<ClassDecl>),
    Interface(Spanned<InterfaceDecl>),
    Function(Spanned<FunctionDecl>),
    GlobalVar(Spanned<GlobalVarDecl>),
    Stmt(Spanned<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    pub superclass: Option<Spanned<TypeSpec>>,
    #[serde(default)]
    pub interfaces: Vec<Spanned<TypeSpec>>,
    pub default_section: Option<AccessSection>,
    #[serde(default)]
    pub sections: Vec<AccessSection>,
}

impl ClassDecl {
    /// Default section first, then the explicit sections in order.
    pub fn all_sections(&self) -> impl Iterator<Item = &AccessSection> {
        self.default_section.iter().chain(self.sections.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessSection {
    /// Access bits applied to every member of the section.
    pub access: Modifiers,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Member {
    Field(Spanned<FieldDecl>),
    Method(Spanned<MethodDecl>),
    Constructor(Spanned<ConstructorDecl>),
    /// `forward name: Interface`; the field's interface methods are forwarded to it.
    Delegation(Spanned<FieldDecl>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    pub ty: Spanned<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeSpec>>,
    /// `None` declares an abstract method.
    pub body: Option<Spanned<Block>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub params: Vec<Param>,
    /// Arguments of an explicit `super(...)` initializer.
    pub super_args: Option<Spanned<Vec<Spanned<Expr>>>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    #[serde(default)]
    pub interfaces: Vec<Spanned<TypeSpec>>,
    pub methods: Vec<Spanned<InterfaceMethodDecl>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMethodDecl {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeSpec>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVarDecl {
    pub modifiers: Modifiers,
    pub name: Spanned<String>,
    pub ty: Spanned<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: TypeName,
    #[serde(default)]
    pub dimension: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeName {
    Primitive(Primitive),
    /// Unqualified; resolved through the import list.
    Simple(String),
    Qualified(String),
}

impl TypeName {
    pub fn display(&self) -> &str {
        match self {
            TypeName::Primitive(p) => p.name(),
            TypeName::Simple(name) | TypeName::Qualified(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Param,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectCase {
    pub values: Vec<Spanned<Expr>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Block),
    LocalVar {
        name: Spanned<String>,
        ty: Spanned<TypeSpec>,
        init: Option<Spanned<Expr>>,
    },
    Expr(Spanned<Expr>),
    If {
        condition: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Option<Spanned<Block>>,
    },
    While {
        condition: Spanned<Expr>,
        body: Spanned<Block>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        condition: Option<Spanned<Expr>>,
        update: Option<Spanned<Expr>>,
        body: Spanned<Block>,
    },
    Foreach {
        var: Param,
        iterable: Spanned<Expr>,
        body: Spanned<Block>,
    },
    /// `cond { c1 -> b1; c2 -> b2; else -> b }`
    Cond {
        branches: Vec<(Spanned<Expr>, Spanned<Block>)>,
        else_block: Option<Spanned<Block>>,
    },
    Select {
        scrutinee: Spanned<Expr>,
        cases: Vec<SelectCase>,
        else_block: Option<Spanned<Block>>,
    },
    Return(Option<Spanned<Expr>>),
    Throw(Spanned<Expr>),
    Try {
        body: Spanned<Block>,
        catches: Vec<CatchClause>,
    },
    Synchronized {
        lock: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Break,
    Continue,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
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
    And,
    Or,
    Eq,
    Neq,
    /// Reference identity (`===`).
    RefEq,
    RefNeq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `a ?: b`
    Elvis,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::UShr => ">>>",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::RefEq => "===",
            BinOp::RefNeq => "!==",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Elvis => "?:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    IntLit(i32),
    LongLit(i64),
    FloatLit(f32),
    DoubleLit(f64),
    CharLit(char),
    ByteLit(i8),
    ShortLit(i16),
    BoolLit(bool),
    StringLit(String),
    NullLit,
    ListLit(Vec<Spanned<Expr>>),
    Ident(String),
    /// The current instance (`self`).
    SelfRef,
    /// `@name`: a field of the current instance.
    SelfField(String),
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Assign {
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    CompoundAssign {
        op: BinOp,
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    PostIncrement(Box<Spanned<Expr>>),
    PostDecrement(Box<Spanned<Expr>>),
    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    /// `object.name`: field, or zero-argument `name`/`getName`/`isName`.
    FieldAccess {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
    MethodCall {
        object: Box<Spanned<Expr>>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    /// Unqualified call: a method of the current class or a static import.
    SelfCall {
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    SuperCall {
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    StaticCall {
        class: Spanned<TypeSpec>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    StaticField {
        class: Spanned<TypeSpec>,
        field: Spanned<String>,
    },
    NewObject {
        class: Spanned<TypeSpec>,
        args: Vec<Spanned<Expr>>,
    },
    /// `new T[d0][d1]...`; `elem` has dimension 0.
    NewArray {
        elem: Spanned<TypeSpec>,
        dims: Vec<Spanned<Expr>>,
    },
    Cast {
        expr: Box<Spanned<Expr>>,
        target_type: Spanned<TypeSpec>,
    },
    InstanceOf {
        expr: Box<Spanned<Expr>>,
        target_type: Spanned<TypeSpec>,
    },
    /// `#Interface.method(params) { body }`
    Closure {
        interface: Spanned<TypeSpec>,
        method: Spanned<String>,
        params: Vec<Param>,
        return_type: Option<Spanned<TypeSpec>>,
        body: Spanned<Block>,
    },
}
