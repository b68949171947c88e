//! Resolved entities: the class table and everything it owns.

pub mod class;
pub mod ids;
pub mod provider;
pub mod table;
pub mod types;

pub use class::{
    ClassKind, ClassSymbol, ConstructorSymbol, FieldSymbol, Hierarchy, MethodSymbol, Modifiers, Origin, SuperCall,
};
pub use ids::{ArrayId, ClassId, ConstructorId, FieldId, MethodId};
pub use provider::{
    ClassPathProvider, ClassProvider, ExternalClass, ExternalConstructor, ExternalField, ExternalMethod,
    InMemoryProvider, TypeDescriptor,
};
pub use table::{ClassTable, ROOT_CLASS};
pub use types::{ArrayType, Primitive, Type};
