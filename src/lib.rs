//! Semantic analysis for a class-based language compiled to JVM-style
//! bytecode: declaration collection, hierarchy and member resolution, body
//! type checking and delegation synthesis over parsed compilation units.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod frame;
pub mod ir;
pub mod resolver;
pub mod span;
pub mod symbols;
pub mod typeck;

pub use config::AnalysisConfig;
pub use diagnostics::{CompileError, Diagnostic, ErrorCode};
pub use typeck::{analyze, analyze_with_provider, Analyzed};
