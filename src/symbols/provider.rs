use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::class::{ClassKind, Modifiers};
use super::types::Primitive;

/// Member type as written in external metadata; resolved by name on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Class(String),
    Array(Box<TypeDescriptor>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalField {
    pub name: String,
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMethod {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeDescriptor>,
    pub ret: TypeDescriptor,
    #[serde(default)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConstructor {
    #[serde(default)]
    pub params: Vec<TypeDescriptor>,
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// Metadata of a precompiled class, as handed over by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalClass {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<ExternalField>,
    #[serde(default)]
    pub methods: Vec<ExternalMethod>,
    #[serde(default)]
    pub constructors: Vec<ExternalConstructor>,
}

/// Source of classes not defined in the analyzed units.
pub trait ClassProvider {
    fn find(&self, name: &str) -> Option<ExternalClass>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    classes: HashMap<String, ExternalClass>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: ExternalClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn with(mut self, class: ExternalClass) -> Self {
        self.insert(class);
        self
    }

    /// The runtime library the checker itself depends on: the root class,
    /// strings, boxing wrappers, throwables and the collection protocol.
    pub fn core() -> Self {
        let mut provider = Self::new();
        for class in core_library() {
            provider.insert(class);
        }
        provider
    }
}

impl ClassProvider for InMemoryProvider {
    fn find(&self, name: &str) -> Option<ExternalClass> {
        self.classes.get(name).cloned()
    }
}

/// Reads `<dir>/<package path>/<Simple>.json` from each class path entry in
/// order, falling back to the core library.
#[derive(Debug, Clone)]
pub struct ClassPathProvider {
    dirs: Vec<PathBuf>,
    fallback: InMemoryProvider,
}

impl ClassPathProvider {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs, fallback: InMemoryProvider::core() }
    }

    fn relative_path(name: &str) -> PathBuf {
        let mut path: PathBuf = name.split('.').collect();
        path.set_extension("json");
        path
    }
}

impl ClassProvider for ClassPathProvider {
    fn find(&self, name: &str) -> Option<ExternalClass> {
        let relative = Self::relative_path(name);
        for dir in &self.dirs {
            let candidate = dir.join(&relative);
            if !candidate.is_file() {
                continue;
            }
            let content = match std::fs::read_to_string(&candidate) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "could not read class metadata");
                    continue;
                }
            };
            match serde_json::from_str::<ExternalClass>(&content) {
                Ok(class) if class.name == name => {
                    tracing::trace!(name, path = %candidate.display(), "class metadata found");
                    return Some(class);
                }
                Ok(class) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        expected = name,
                        found = %class.name,
                        "class metadata names a different class"
                    );
                }
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "malformed class metadata");
                }
            }
        }
        self.fallback.find(name)
    }
}

// ---- core library ----

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";

fn prim(p: Primitive) -> TypeDescriptor {
    TypeDescriptor::Primitive(p)
}

fn class(name: &str) -> TypeDescriptor {
    TypeDescriptor::Class(name.to_string())
}

fn method(name: &str, params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> ExternalMethod {
    ExternalMethod { name: name.to_string(), params, ret, modifiers: Modifiers::PUBLIC }
}

fn static_method(name: &str, params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> ExternalMethod {
    ExternalMethod { modifiers: Modifiers::PUBLIC | Modifiers::STATIC, ..method(name, params, ret) }
}

fn abstract_method(name: &str, params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> ExternalMethod {
    ExternalMethod { modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT, ..method(name, params, ret) }
}

fn ctor(params: Vec<TypeDescriptor>) -> ExternalConstructor {
    ExternalConstructor { params, modifiers: Modifiers::PUBLIC }
}

fn external(name: &str, superclass: Option<&str>) -> ExternalClass {
    ExternalClass {
        name: name.to_string(),
        kind: ClassKind::Class,
        modifiers: Modifiers::PUBLIC,
        superclass: superclass.map(str::to_string),
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        constructors: vec![ctor(vec![])],
    }
}

fn interface(name: &str, supers: &[&str], methods: Vec<ExternalMethod>) -> ExternalClass {
    ExternalClass {
        kind: ClassKind::Interface,
        modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
        interfaces: supers.iter().map(|s| s.to_string()).collect(),
        methods,
        constructors: Vec::new(),
        ..external(name, None)
    }
}

fn core_library() -> Vec<ExternalClass> {
    let mut classes = Vec::new();

    let mut object = external(OBJECT, None);
    object.methods = vec![
        method("equals", vec![class(OBJECT)], prim(Primitive::Boolean)),
        method("toString", vec![], class(STRING)),
        method("hashCode", vec![], prim(Primitive::Int)),
    ];
    classes.push(object);

    let mut string = external(STRING, Some(OBJECT));
    string.modifiers = Modifiers::PUBLIC | Modifiers::FINAL;
    string.constructors.push(ctor(vec![class(STRING)]));
    string.methods = vec![
        method("concat", vec![class(STRING)], class(STRING)),
        method("length", vec![], prim(Primitive::Int)),
        method("charAt", vec![prim(Primitive::Int)], prim(Primitive::Char)),
        method("substring", vec![prim(Primitive::Int), prim(Primitive::Int)], class(STRING)),
        method("isEmpty", vec![], prim(Primitive::Boolean)),
        method("equals", vec![class(OBJECT)], prim(Primitive::Boolean)),
        method("toString", vec![], class(STRING)),
    ];
    classes.push(string);

    for p in Primitive::ALL {
        let Some(name) = p.boxed_class() else { continue };
        let mut boxed = external(name, Some(OBJECT));
        boxed.modifiers = Modifiers::PUBLIC | Modifiers::FINAL;
        boxed.constructors = vec![ctor(vec![prim(p)])];
        boxed.methods = vec![
            method("toString", vec![], class(STRING)),
            method(&format!("{}Value", p.name()), vec![], prim(p)),
        ];
        classes.push(boxed);
    }

    let mut throwable = external("java.lang.Throwable", Some(OBJECT));
    throwable.constructors.push(ctor(vec![class(STRING)]));
    throwable.methods = vec![method("getMessage", vec![], class(STRING))];
    classes.push(throwable);
    for (name, parent) in [
        ("java.lang.Exception", "java.lang.Throwable"),
        ("java.lang.RuntimeException", "java.lang.Exception"),
    ] {
        let mut exception = external(name, Some(parent));
        exception.constructors.push(ctor(vec![class(STRING)]));
        classes.push(exception);
    }

    let mut print_stream = external("java.io.PrintStream", Some(OBJECT));
    print_stream.constructors.clear();
    print_stream.methods = vec![
        method("println", vec![class(OBJECT)], prim(Primitive::Void)),
        method("print", vec![class(OBJECT)], prim(Primitive::Void)),
    ];
    classes.push(print_stream);

    let mut system = external("java.lang.System", Some(OBJECT));
    system.constructors.clear();
    system.fields = vec![ExternalField {
        name: "out".to_string(),
        ty: class("java.io.PrintStream"),
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
    }];
    system.methods = vec![
        static_method("currentTimeMillis", vec![], prim(Primitive::Long)),
        static_method("exit", vec![prim(Primitive::Int)], prim(Primitive::Void)),
    ];
    classes.push(system);

    let mut runtime = external("java.lang.Runtime", Some(OBJECT));
    runtime.constructors.clear();
    runtime.methods = vec![
        static_method("getRuntime", vec![], class("java.lang.Runtime")),
        method("availableProcessors", vec![], prim(Primitive::Int)),
    ];
    classes.push(runtime);

    let mut math = external("java.lang.Math", Some(OBJECT));
    math.constructors.clear();
    math.methods = vec![
        static_method("abs", vec![prim(Primitive::Int)], prim(Primitive::Int)),
        static_method("max", vec![prim(Primitive::Int), prim(Primitive::Int)], prim(Primitive::Int)),
        static_method("sqrt", vec![prim(Primitive::Double)], prim(Primitive::Double)),
    ];
    classes.push(math);

    classes.push(interface(
        "java.lang.Runnable",
        &[],
        vec![abstract_method("run", vec![], prim(Primitive::Void))],
    ));
    classes.push(interface(
        "java.util.Iterator",
        &[],
        vec![
            abstract_method("hasNext", vec![], prim(Primitive::Boolean)),
            abstract_method("next", vec![], class(OBJECT)),
        ],
    ));
    let collection_methods = || {
        vec![
            abstract_method("iterator", vec![], class("java.util.Iterator")),
            abstract_method("size", vec![], prim(Primitive::Int)),
            abstract_method("isEmpty", vec![], prim(Primitive::Boolean)),
            abstract_method("add", vec![class(OBJECT)], prim(Primitive::Boolean)),
        ]
    };
    classes.push(interface("java.util.Collection", &[], collection_methods()));
    let list_methods = || {
        vec![
            abstract_method("get", vec![prim(Primitive::Int)], class(OBJECT)),
            abstract_method("set", vec![prim(Primitive::Int), class(OBJECT)], class(OBJECT)),
        ]
    };
    classes.push(interface("java.util.List", &["java.util.Collection"], list_methods()));

    let mut array_list = external("java.util.ArrayList", Some(OBJECT));
    array_list.interfaces = vec!["java.util.List".to_string()];
    array_list.methods = collection_methods()
        .into_iter()
        .chain(list_methods())
        .map(|m| ExternalMethod { modifiers: Modifiers::PUBLIC, ..m })
        .collect();
    classes.push(array_list);

    classes
}
