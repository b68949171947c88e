//! Resolution of syntactic type references against a unit's imports.

use std::rc::Rc;

use thiserror::Error;

use crate::ast::{TypeName, TypeSpec};
use crate::symbols::{ClassTable, Type};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("class {0} is not found")]
    ClassNotFound(String),
}

/// One `alias = pattern` import entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportEntry {
    alias: String,
    pattern: String,
}

impl ImportEntry {
    /// The fully-qualified name this entry binds `name` to, if it applies.
    fn bind(&self, name: &str) -> Option<String> {
        if self.alias == "*" {
            if self.pattern == "*" {
                return Some(name.to_string());
            }
            return self.pattern.strip_suffix('*').map(|prefix| format!("{prefix}{name}"));
        }
        (self.alias == name).then(|| self.pattern.clone())
    }
}

/// Ordered import list of one compilation unit. The first entry that binds
/// a name to a loadable class wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alias: impl Into<String>, pattern: impl Into<String>) {
        self.entries.push(ImportEntry { alias: alias.into(), pattern: pattern.into() });
    }

    /// `pkg.*` as a wildcard entry.
    pub fn push_wildcard(&mut self, pattern: impl Into<String>) {
        self.push("*", pattern);
    }

    /// Candidate fully-qualified names for `name`, in trial order.
    pub fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        self.entries.iter().filter_map(move |entry| entry.bind(name))
    }
}

/// Type resolver of one declaring class. Classes from the same unit share
/// the unit's import table.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    imports: Rc<ImportTable>,
}

impl ScopeResolver {
    pub fn new(imports: Rc<ImportTable>) -> Self {
        Self { imports }
    }

    /// Resolve a bare class name (no dimension) through the imports.
    pub fn resolve_class_name(&self, table: &mut ClassTable, name: &str) -> Option<Type> {
        for candidate in self.imports.candidates(name) {
            if let Some(id) = table.load(&candidate) {
                tracing::trace!(name, resolved = %candidate, "resolved through import");
                return Some(Type::Class(id));
            }
        }
        None
    }

    pub fn resolve(&self, table: &mut ClassTable, spec: &TypeSpec) -> Result<Type, ResolveError> {
        let component = match &spec.name {
            TypeName::Primitive(p) => Type::Primitive(*p),
            TypeName::Qualified(name) => table
                .load(name)
                .map(Type::Class)
                .ok_or_else(|| ResolveError::ClassNotFound(name.clone()))?,
            TypeName::Simple(name) => self
                .resolve_class_name(table, name)
                .ok_or_else(|| ResolveError::ClassNotFound(name.clone()))?,
        };
        if spec.dimension == 0 {
            return Ok(component);
        }
        Ok(Type::Array(table.load_array(component, spec.dimension)))
    }
}
