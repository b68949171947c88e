use std::path::Path;
use std::rc::Rc;

use crate::ast::{CompilationUnit, TopLevel};
use crate::diagnostics::ErrorCode;
use crate::resolver::{ImportTable, ScopeResolver};
use crate::span::Span;
use crate::symbols::{ClassId, ClassKind, ClassSymbol, ConstructorSymbol, Modifiers, Origin};

use super::env::{AnalysisEnv, DeclPath, Entity, UnitInfo};

/// Suffix of the synthetic class hosting a unit's free code.
const TOP_CLASS_SUFFIX: &str = "Main";

fn qualify(module: Option<&str>, name: &str) -> String {
    match module {
        Some(module) if !module.is_empty() => format!("{module}.{name}"),
        _ => name.to_string(),
    }
}

/// `<module>.<FileStem>Main` for the unit's top-level class.
pub(crate) fn top_class_name(unit: &CompilationUnit) -> String {
    let stem = Path::new(&unit.source_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unit");
    qualify(unit.module.as_ref().map(|m| m.node.as_str()), &format!("{stem}{TOP_CLASS_SUFFIX}"))
}

fn build_imports(env: &AnalysisEnv<'_>, unit: &CompilationUnit) -> ImportTable {
    let mut imports = ImportTable::new();
    for pattern in &env.config.default_imports {
        imports.push_wildcard(pattern.clone());
    }
    match &unit.module {
        Some(module) => imports.push_wildcard(format!("{}.*", module.node)),
        None => imports.push_wildcard("*"),
    }
    for import in &unit.imports {
        imports.push(import.node.alias.clone(), import.node.fqcn.clone());
    }
    imports
}

/// Pass 1: register every class and interface of every unit, plus one
/// synthetic top-level class per unit that has free code.
pub(crate) fn collect_declarations(env: &mut AnalysisEnv<'_>) {
    let units = env.units;
    let config = env.config;
    for (u, unit) in units.iter().enumerate() {
        let imports = Rc::new(build_imports(env, unit));
        let mut static_imports = Vec::new();
        for name in &config.static_imports {
            match env.table.load(name) {
                Some(id) => static_imports.push(id),
                None => tracing::warn!(class = %name, "static import class not found"),
            }
        }
        let module = unit.module.as_ref().map(|m| m.node.as_str());

        for (i, top) in unit.top_levels.iter().enumerate() {
            let (name, modifiers, kind) = match top {
                TopLevel::Class(c) => (&c.node.name, c.node.modifiers, ClassKind::Class),
                TopLevel::Interface(iface) => (&iface.node.name, iface.node.modifiers, ClassKind::Interface),
                _ => continue,
            };
            let fqcn = qualify(module, &name.node);
            let origin = Origin::Source { unit: u, decl: Some(i), source_file: unit.source_file.clone() };
            let symbol = ClassSymbol::new(fqcn.clone(), modifiers, kind, origin);
            match env.table.add_source_class(symbol) {
                Some(id) => {
                    tracing::trace!(class = %fqcn, "registered");
                    env.resolvers.insert(id, ScopeResolver::new(Rc::clone(&imports)));
                    env.nodes.link(DeclPath::TopLevel { unit: u, index: i }, Entity::Class(id));
                }
                None => env.report(ErrorCode::DuplicateClass, name.span, u, vec![fqcn]),
            }
        }

        let top_class = if unit.has_free_code() { register_top_class(env, u, unit, &imports) } else { None };

        env.unit_info.push(UnitInfo {
            static_imports,
            top_class,
            entry: None,
        });
    }
}

fn register_top_class(
    env: &mut AnalysisEnv<'_>,
    u: usize,
    unit: &CompilationUnit,
    imports: &Rc<ImportTable>,
) -> Option<ClassId> {
    let name = top_class_name(unit);
    let origin = Origin::Source { unit: u, decl: None, source_file: unit.source_file.clone() };
    let mut symbol = ClassSymbol::new(name.clone(), Modifiers::NONE, ClassKind::Class, origin);
    symbol.complete_hierarchy(Some(env.table.root_class()), Vec::new());
    let Some(id) = env.table.add_source_class(symbol) else {
        let span = unit.top_levels.first().map(top_level_span).unwrap_or_else(Span::dummy);
        env.report(ErrorCode::DuplicateClass, span, u, vec![name]);
        return None;
    };
    env.resolvers.insert(id, ScopeResolver::new(Rc::clone(imports)));
    env.table.add_constructor(ConstructorSymbol {
        params: Vec::new(),
        modifiers: Modifiers::PUBLIC,
        owner: id,
        body: None,
        super_call: None,
    });
    tracing::trace!(class = %name, "registered top-level class");
    Some(id)
}

fn top_level_span(top: &TopLevel) -> Span {
    match top {
        TopLevel::Class(c) => c.span,
        TopLevel::Interface(i) => i.span,
        TopLevel::Function(f) => f.span,
        TopLevel::GlobalVar(g) => g.span,
        TopLevel::Stmt(s) => s.span,
    }
}
