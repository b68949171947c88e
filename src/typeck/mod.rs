mod check;
mod closures;
mod duplicates;
mod env;
mod infer;
mod ops;
mod register;
mod resolve;
pub mod rules;

use crate::ast::CompilationUnit;
use crate::config::AnalysisConfig;
use crate::diagnostics::CompileError;
use crate::symbols::{ClassId, ClassPathProvider, ClassProvider, ClassTable};
use env::AnalysisEnv;

/// Result of a successful analysis: every source class with its hierarchy,
/// members and checked bodies.
pub struct Analyzed {
    pub table: ClassTable,
    pub classes: Vec<ClassId>,
}

/// Analyze `units` against the class path named in `config`.
pub fn analyze(units: &[CompilationUnit], config: &AnalysisConfig) -> Result<Analyzed, CompileError> {
    analyze_with_provider(units, config, Box::new(ClassPathProvider::new(config.class_path.clone())))
}

#[tracing::instrument(skip_all, fields(units = units.len()))]
pub fn analyze_with_provider(
    units: &[CompilationUnit],
    config: &AnalysisConfig,
    provider: Box<dyn ClassProvider>,
) -> Result<Analyzed, CompileError> {
    let mut env = AnalysisEnv::new(units, config, ClassTable::new(provider));

    // Pass 1: register declarations
    register::collect_declarations(&mut env);
    env.checkpoint("collect")?;

    // Pass 2: hierarchy and member signatures
    resolve::resolve_hierarchies(&mut env);
    resolve::resolve_members(&mut env);
    env.checkpoint("members")?;

    // Pass 3: bodies
    check::check_bodies(&mut env);
    env.checkpoint("check")?;

    // Pass 4: duplicates and forwarders
    duplicates::check_duplicates(&mut env);
    env.checkpoint("duplicates")?;

    let classes = env.table.all_source_classes().to_vec();
    tracing::debug!(classes = classes.len(), "analysis complete");
    Ok(Analyzed { table: env.table, classes })
}
