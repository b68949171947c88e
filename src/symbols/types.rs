use serde::{Deserialize, Serialize};

use super::ids::{ArrayId, ClassId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Void,
}

impl Primitive {
    pub const ALL: [Primitive; 9] = [
        Primitive::Byte,
        Primitive::Short,
        Primitive::Char,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Boolean,
        Primitive::Void,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Boolean => "boolean",
            Primitive::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Void)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Char | Primitive::Int | Primitive::Long
        )
    }

    /// Position in the promotion order int < long < float < double.
    /// Sub-int types share int's rank. `None` for non-numeric types.
    pub fn promotion_rank(self) -> Option<u8> {
        match self {
            Primitive::Byte | Primitive::Short | Primitive::Char | Primitive::Int => Some(0),
            Primitive::Long => Some(1),
            Primitive::Float => Some(2),
            Primitive::Double => Some(3),
            Primitive::Boolean | Primitive::Void => None,
        }
    }

    /// Fully-qualified name of the wrapper class used when boxing.
    pub fn boxed_class(self) -> Option<&'static str> {
        match self {
            Primitive::Byte => Some("java.lang.Byte"),
            Primitive::Short => Some("java.lang.Short"),
            Primitive::Char => Some("java.lang.Character"),
            Primitive::Int => Some("java.lang.Integer"),
            Primitive::Long => Some("java.lang.Long"),
            Primitive::Float => Some("java.lang.Float"),
            Primitive::Double => Some("java.lang.Double"),
            Primitive::Boolean => Some("java.lang.Boolean"),
            Primitive::Void => None,
        }
    }
}

/// A resolved type. Arrays are interned in the class table, so `==` on
/// `Type` is identity equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Class(ClassId),
    Array(ArrayId),
    /// Type of the `null` literal; assignable to every reference type.
    Null,
}

impl Type {
    pub const VOID: Type = Type::Primitive(Primitive::Void);
    pub const BOOLEAN: Type = Type::Primitive(Primitive::Boolean);
    pub const INT: Type = Type::Primitive(Primitive::Int);

    pub fn as_primitive(self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_class(self) -> Option<ClassId> {
        match self {
            Type::Class(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_primitive(self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(self) -> bool {
        !self.is_primitive()
    }

    /// Class or array: something with members.
    pub fn is_object(self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_))
    }

    pub fn is_void(self) -> bool {
        self == Type::VOID
    }

    pub fn is_numeric(self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_numeric)
    }

    pub fn is_integer(self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_integer)
    }
}

/// An interned array type. The component is never itself an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub component: Type,
    pub dimension: u32,
}
