use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use super::ids::{ClassId, ConstructorId, FieldId, MethodId};
use super::types::Type;
use crate::ir::{Body, Expr};

/// Modifier bit set shared by declarations and symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 1);
    pub const PRIVATE: Modifiers = Modifiers(1 << 2);
    pub const INTERNAL: Modifiers = Modifiers(1 << 3);
    pub const STATIC: Modifiers = Modifiers(1 << 4);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 5);
    pub const FINAL: Modifiers = Modifiers(1 << 6);
    /// Field whose interface methods get forwarding methods synthesized.
    pub const FORWARDED: Modifiers = Modifiers(1 << 7);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_internal(self) -> bool {
        self.contains(Self::INTERNAL)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_forwarded(self) -> bool {
        self.contains(Self::FORWARDED)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared in compilation unit `unit`. `decl` is the index of the
    /// declaring top-level item, `None` for the unit's synthetic top class.
    Source { unit: usize, decl: Option<usize>, source_file: String },
    External,
}

/// Phase tag for a class's supertypes. Moves from `Pending` to `Resolved`
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hierarchy {
    Pending,
    Resolved { superclass: Option<ClassId>, interfaces: Vec<ClassId> },
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: String,
    pub modifiers: Modifiers,
    pub kind: ClassKind,
    pub origin: Origin,
    hierarchy: Hierarchy,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    pub constructors: Vec<ConstructorId>,
}

impl ClassSymbol {
    pub fn new(name: impl Into<String>, modifiers: Modifiers, kind: ClassKind, origin: Origin) -> Self {
        Self {
            name: name.into(),
            modifiers,
            kind,
            origin,
            hierarchy: Hierarchy::Pending,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_source(&self) -> bool {
        matches!(self.origin, Origin::Source { .. })
    }

    pub fn source_file(&self) -> Option<&str> {
        match &self.origin {
            Origin::Source { source_file, .. } => Some(source_file),
            Origin::External => None,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn resolution_complete(&self) -> bool {
        matches!(self.hierarchy, Hierarchy::Resolved { .. })
    }

    /// Record the resolved supertypes. A second call is ignored and returns false.
    pub fn complete_hierarchy(&mut self, superclass: Option<ClassId>, interfaces: Vec<ClassId>) -> bool {
        if self.resolution_complete() {
            return false;
        }
        self.hierarchy = Hierarchy::Resolved { superclass, interfaces };
        true
    }

    pub fn superclass(&self) -> Option<ClassId> {
        match &self.hierarchy {
            Hierarchy::Resolved { superclass, .. } => *superclass,
            Hierarchy::Pending => None,
        }
    }

    pub fn interfaces(&self) -> &[ClassId] {
        match &self.hierarchy {
            Hierarchy::Resolved { interfaces, .. } => interfaces,
            Hierarchy::Pending => &[],
        }
    }

    /// Package prefix of the fully-qualified name; empty for the default package.
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub name: String,
    pub ty: Type,
    pub modifiers: Modifiers,
    pub owner: ClassId,
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
    pub modifiers: Modifiers,
    pub owner: ClassId,
    pub body: Option<Body>,
}

/// Resolved `super(...)` initializer of a constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperCall {
    pub constructor: ConstructorId,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct ConstructorSymbol {
    pub params: Vec<Type>,
    pub modifiers: Modifiers,
    pub owner: ClassId,
    pub body: Option<Body>,
    pub super_call: Option<SuperCall>,
}
