//! Index handles into the symbol table's arenas.

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }

            pub(crate) fn slot(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_entity_id! {
    /// A class or interface, source-defined or external
    pub struct ClassId;
}

define_entity_id! {
    /// An interned (component, dimension) array type
    pub struct ArrayId;
}

define_entity_id! {
    /// A field, owned by exactly one class
    pub struct FieldId;
}

define_entity_id! {
    /// A method, owned by exactly one class
    pub struct MethodId;
}

define_entity_id! {
    /// A constructor, owned by exactly one class
    pub struct ConstructorId;
}
