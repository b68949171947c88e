use std::collections::HashMap;

use crate::ast::{ClassDecl, CompilationUnit, Member, TopLevel, TypeSpec};
use crate::config::AnalysisConfig;
use crate::diagnostics::{CompileError, Diagnostic, ErrorCode, Reporter};
use crate::resolver::{ResolveError, ScopeResolver};
use crate::span::{Span, Spanned};
use crate::symbols::{ClassId, ClassTable, ConstructorId, FieldId, MethodId, Origin, Type};

/// Where a declaration lives in the input: the stable address of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclPath {
    TopLevel { unit: usize, index: usize },
    /// `section` counts the default section first, as `ClassDecl::all_sections` does.
    Member { unit: usize, decl: usize, section: usize, index: usize },
    InterfaceMethod { unit: usize, decl: usize, index: usize },
}

/// A symbol created from a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Class(ClassId),
    Field(FieldId),
    Method(MethodId),
    Constructor(ConstructorId),
}

/// Two-way correspondence between declarations and the symbols built from
/// them, used to find bodies to check and locations to report at.
#[derive(Debug, Default)]
pub struct NodeMap {
    to_entity: HashMap<DeclPath, Entity>,
    to_decl: HashMap<Entity, DeclPath>,
}

impl NodeMap {
    pub fn link(&mut self, path: DeclPath, entity: Entity) {
        self.to_entity.insert(path, entity);
        self.to_decl.insert(entity, path);
    }

    pub fn entity(&self, path: DeclPath) -> Option<Entity> {
        self.to_entity.get(&path).copied()
    }

    pub fn decl(&self, entity: Entity) -> Option<DeclPath> {
        self.to_decl.get(&entity).copied()
    }

    pub fn method(&self, path: DeclPath) -> Option<MethodId> {
        match self.entity(path)? {
            Entity::Method(id) => Some(id),
            _ => None,
        }
    }

    pub fn constructor(&self, path: DeclPath) -> Option<ConstructorId> {
        match self.entity(path)? {
            Entity::Constructor(id) => Some(id),
            _ => None,
        }
    }
}

/// Synthesized entry points of a unit's top-level class.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    pub start: MethodId,
    pub main: MethodId,
    pub constructor: ConstructorId,
}

#[derive(Debug)]
pub struct UnitInfo {
    pub static_imports: Vec<ClassId>,
    pub top_class: Option<ClassId>,
    pub entry: Option<EntryPoints>,
}

/// State shared by every pass of one analysis run.
pub struct AnalysisEnv<'a> {
    pub units: &'a [CompilationUnit],
    pub config: &'a AnalysisConfig,
    pub table: ClassTable,
    pub reporter: Reporter,
    pub unit_info: Vec<UnitInfo>,
    pub resolvers: HashMap<ClassId, ScopeResolver>,
    pub nodes: NodeMap,
}

impl<'a> AnalysisEnv<'a> {
    pub fn new(units: &'a [CompilationUnit], config: &'a AnalysisConfig, table: ClassTable) -> Self {
        Self {
            units,
            config,
            table,
            reporter: Reporter::new(config.max_errors),
            unit_info: Vec::with_capacity(units.len()),
            resolvers: HashMap::new(),
            nodes: NodeMap::default(),
        }
    }

    pub fn report(&mut self, code: ErrorCode, span: Span, unit: usize, args: Vec<String>) {
        let source_file = self.units.get(unit).map(|u| u.source_file.as_str()).unwrap_or("<unknown>");
        self.reporter.report(Diagnostic::new(code, span, source_file, args));
    }

    /// Unit and declaring top-level index of a source class.
    pub fn origin(&self, class: ClassId) -> Option<(usize, Option<usize>)> {
        match &self.table.class(class).origin {
            Origin::Source { unit, decl, .. } => Some((*unit, *decl)),
            Origin::External => None,
        }
    }

    pub fn class_decl(&self, unit: usize, decl: usize) -> Option<&'a Spanned<ClassDecl>> {
        match self.units.get(unit)?.top_levels.get(decl)? {
            TopLevel::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Resolve a type specifier in the scope of `class`, reporting
    /// ClassNotFound at the specifier on failure.
    pub fn resolve_type(&mut self, class: ClassId, unit: usize, spec: &Spanned<TypeSpec>) -> Option<Type> {
        let resolver = self.resolvers.get(&class)?.clone();
        match resolver.resolve(&mut self.table, &spec.node) {
            Ok(ty) => Some(ty),
            Err(ResolveError::ClassNotFound(name)) => {
                self.report(ErrorCode::ClassNotFound, spec.span, unit, vec![name]);
                None
            }
        }
    }

    /// Source location of the declaration an entity was built from.
    pub fn entity_span(&self, entity: Entity) -> Span {
        self.nodes.decl(entity).and_then(|path| self.decl_span(path)).unwrap_or_else(Span::dummy)
    }

    fn decl_span(&self, path: DeclPath) -> Option<Span> {
        match path {
            DeclPath::TopLevel { unit, index } => Some(match self.units.get(unit)?.top_levels.get(index)? {
                TopLevel::Class(c) => c.node.name.span,
                TopLevel::Interface(i) => i.node.name.span,
                TopLevel::Function(f) => f.node.name.span,
                TopLevel::GlobalVar(g) => g.node.name.span,
                TopLevel::Stmt(s) => s.span,
            }),
            DeclPath::Member { unit, decl, section, index } => {
                let class = self.class_decl(unit, decl)?;
                let member = class.node.all_sections().nth(section)?.members.get(index)?;
                Some(match member {
                    Member::Field(f) | Member::Delegation(f) => f.node.name.span,
                    Member::Method(m) => m.node.name.span,
                    Member::Constructor(c) => c.span,
                })
            }
            DeclPath::InterfaceMethod { unit, decl, index } => match self.units.get(unit)?.top_levels.get(decl)? {
                TopLevel::Interface(i) => i.node.methods.get(index).map(|m| m.node.name.span),
                _ => None,
            },
        }
    }

    /// End-of-pass check: any diagnostic stops the analysis before the next pass.
    pub fn checkpoint(&self, pass: &str) -> Result<(), CompileError> {
        let count = self.reporter.diagnostics().len();
        tracing::debug!(pass, diagnostics = count, capped = self.reporter.is_capped(), "pass finished");
        if self.reporter.has_errors() {
            return Err(CompileError::Semantic(self.reporter.diagnostics().to_vec()));
        }
        Ok(())
    }
}
