use std::collections::{HashMap, HashSet};

use super::class::{ClassKind, ClassSymbol, ConstructorSymbol, FieldSymbol, MethodSymbol, Modifiers, Origin};
use super::ids::{ArrayId, ClassId, ConstructorId, FieldId, MethodId};
use super::provider::{ClassProvider, ExternalClass, TypeDescriptor};
use super::types::{ArrayType, Type};

pub const ROOT_CLASS: &str = "java.lang.Object";

/// Global registry of classes, members and interned array types.
pub struct ClassTable {
    classes: Vec<ClassSymbol>,
    by_name: HashMap<String, ClassId>,
    misses: HashSet<String>,
    fields: Vec<FieldSymbol>,
    methods: Vec<MethodSymbol>,
    constructors: Vec<ConstructorSymbol>,
    arrays: Vec<ArrayType>,
    array_index: HashMap<ArrayType, ArrayId>,
    source_classes: Vec<ClassId>,
    provider: Box<dyn ClassProvider>,
    root: ClassId,
}

impl ClassTable {
    pub fn new(provider: Box<dyn ClassProvider>) -> Self {
        let mut table = Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            misses: HashSet::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            arrays: Vec::new(),
            array_index: HashMap::new(),
            source_classes: Vec::new(),
            provider,
            root: ClassId::new(0),
        };
        table.root = match table.load(ROOT_CLASS) {
            Some(root) => root,
            None => {
                tracing::warn!("class provider has no {ROOT_CLASS}; using an empty root class");
                let mut root = ClassSymbol::new(ROOT_CLASS, Modifiers::PUBLIC, ClassKind::Class, Origin::External);
                root.complete_hierarchy(None, Vec::new());
                let id = table.push_class(root);
                table.misses.remove(ROOT_CLASS);
                table.add_constructor(ConstructorSymbol {
                    params: Vec::new(),
                    modifiers: Modifiers::PUBLIC,
                    owner: id,
                    body: None,
                    super_call: None,
                });
                id
            }
        };
        table
    }

    pub fn root_class(&self) -> ClassId {
        self.root
    }

    /// Find a class by fully-qualified name, asking the provider on the first
    /// miss. Both hits and misses are cached.
    pub fn load(&mut self, name: &str) -> Option<ClassId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        if self.misses.contains(name) {
            return None;
        }
        match self.provider.find(name) {
            Some(external) => Some(self.materialize(external)),
            None => {
                tracing::trace!(name, "class not found");
                self.misses.insert(name.to_string());
                None
            }
        }
    }

    /// Name lookup that never consults the provider.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn materialize(&mut self, external: ExternalClass) -> ClassId {
        tracing::trace!(name = %external.name, "loading external class");
        let symbol = ClassSymbol::new(external.name.clone(), external.modifiers, external.kind, Origin::External);
        // Registered before its supertypes load, so mutually referencing
        // metadata terminates.
        let id = self.push_class(symbol);

        let superclass = external.superclass.as_deref().and_then(|name| self.load(name));
        let interfaces = external.interfaces.iter().filter_map(|name| self.load(name)).collect();
        self.classes[id.slot()].complete_hierarchy(superclass, interfaces);

        for field in external.fields {
            let Some(ty) = self.descriptor_type(&field.ty) else {
                tracing::trace!(class = %external.name, field = %field.name, "dropping field with unknown type");
                continue;
            };
            self.add_field(FieldSymbol { name: field.name, ty, modifiers: field.modifiers, owner: id });
        }
        for method in external.methods {
            let params: Option<Vec<Type>> = method.params.iter().map(|d| self.descriptor_type(d)).collect();
            let (Some(params), Some(ret)) = (params, self.descriptor_type(&method.ret)) else {
                tracing::trace!(class = %external.name, method = %method.name, "dropping method with unknown type");
                continue;
            };
            self.add_method(MethodSymbol {
                name: method.name,
                params,
                ret,
                modifiers: method.modifiers,
                owner: id,
                body: None,
            });
        }
        for ctor in external.constructors {
            let params: Option<Vec<Type>> = ctor.params.iter().map(|d| self.descriptor_type(d)).collect();
            let Some(params) = params else { continue };
            self.add_constructor(ConstructorSymbol {
                params,
                modifiers: ctor.modifiers,
                owner: id,
                body: None,
                super_call: None,
            });
        }
        id
    }

    fn descriptor_type(&mut self, descriptor: &TypeDescriptor) -> Option<Type> {
        match descriptor {
            TypeDescriptor::Primitive(p) => Some(Type::Primitive(*p)),
            TypeDescriptor::Class(name) => self.load(name).map(Type::Class),
            TypeDescriptor::Array(component) => {
                let component = self.descriptor_type(component)?;
                Some(Type::Array(self.load_array(component, 1)))
            }
        }
    }

    fn push_class(&mut self, symbol: ClassSymbol) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.by_name.insert(symbol.name.clone(), id);
        self.classes.push(symbol);
        id
    }

    /// Register a source-defined class. Returns `None` if the name is taken.
    pub fn add_source_class(&mut self, symbol: ClassSymbol) -> Option<ClassId> {
        if self.load(&symbol.name).is_some() {
            return None;
        }
        self.misses.remove(&symbol.name);
        let id = self.push_class(symbol);
        self.source_classes.push(id);
        Some(id)
    }

    pub fn all_source_classes(&self) -> &[ClassId] {
        &self.source_classes
    }

    /// Intern `component[]...[]`. Array components are flattened, so
    /// `load_array(int[], 1)` is `int[][]`.
    pub fn load_array(&mut self, component: Type, dimension: u32) -> ArrayId {
        let key = match component {
            Type::Array(inner) => {
                let inner = self.arrays[inner.slot()];
                ArrayType { component: inner.component, dimension: inner.dimension + dimension }
            }
            _ => ArrayType { component, dimension },
        };
        if let Some(&id) = self.array_index.get(&key) {
            return id;
        }
        let id = ArrayId::new(self.arrays.len() as u32);
        self.arrays.push(key);
        self.array_index.insert(key, id);
        id
    }

    pub fn array(&self, id: ArrayId) -> ArrayType {
        self.arrays[id.slot()]
    }

    /// Type of one element of the array: the component, or one dimension less.
    pub fn element_type(&mut self, id: ArrayId) -> Type {
        let array = self.array(id);
        if array.dimension <= 1 {
            array.component
        } else {
            Type::Array(self.load_array(array.component, array.dimension - 1))
        }
    }

    pub fn class(&self, id: ClassId) -> &ClassSymbol {
        &self.classes[id.slot()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassSymbol {
        &mut self.classes[id.slot()]
    }

    pub fn field(&self, id: FieldId) -> &FieldSymbol {
        &self.fields[id.slot()]
    }

    pub fn method(&self, id: MethodId) -> &MethodSymbol {
        &self.methods[id.slot()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodSymbol {
        &mut self.methods[id.slot()]
    }

    pub fn constructor(&self, id: ConstructorId) -> &ConstructorSymbol {
        &self.constructors[id.slot()]
    }

    pub fn constructor_mut(&mut self, id: ConstructorId) -> &mut ConstructorSymbol {
        &mut self.constructors[id.slot()]
    }

    pub fn add_field(&mut self, field: FieldSymbol) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        self.classes[field.owner.slot()].fields.push(id);
        self.fields.push(field);
        id
    }

    pub fn add_method(&mut self, method: MethodSymbol) -> MethodId {
        let id = MethodId::new(self.methods.len() as u32);
        self.classes[method.owner.slot()].methods.push(id);
        self.methods.push(method);
        id
    }

    pub fn add_constructor(&mut self, ctor: ConstructorSymbol) -> ConstructorId {
        let id = ConstructorId::new(self.constructors.len() as u32);
        self.classes[ctor.owner.slot()].constructors.push(id);
        self.constructors.push(ctor);
        id
    }

    pub fn is_interface(&self, ty: Type) -> bool {
        ty.as_class().is_some_and(|id| self.class(id).is_interface())
    }

    pub fn type_name(&self, ty: Type) -> String {
        match ty {
            Type::Primitive(p) => p.name().to_string(),
            Type::Class(id) => self.class(id).name.clone(),
            Type::Array(id) => {
                let array = self.array(id);
                let mut name = self.type_name(array.component);
                for _ in 0..array.dimension {
                    name.push_str("[]");
                }
                name
            }
            Type::Null => "null".to_string(),
        }
    }

    /// Comma-separated type list, as used in signature diagnostics.
    pub fn type_list(&self, types: &[Type]) -> String {
        types.iter().map(|&t| self.type_name(t)).collect::<Vec<_>>().join(", ")
    }
}
