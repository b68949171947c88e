use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

/// Classification of every diagnostic the analysis passes can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    ClassNotFound,
    DuplicateClass,
    DuplicateField,
    DuplicateMethod,
    DuplicateConstructor,
    DuplicateFunction,
    DuplicateGlobalVariable,
    DuplicateLocalVariable,
    CyclicInheritance,
    IllegalInheritance,
    IncompatibleOperandType,
    IncompatibleType,
    IsNotBoxableType,
    FieldNotFound,
    FieldNotAccessible,
    MethodNotFound,
    MethodNotAccessible,
    AmbiguousMethod,
    AmbiguousConstructor,
    ConstructorNotFound,
    ClassNotAccessible,
    IllegalMethodCall,
    CannotReturnValue,
    VariableNotFound,
    DuplicateGeneratedMethod,
    UnimplementedFeature,
    InterfaceRequired,
    IllegalSelfReference,
}

/// A single classified problem. `args` are already rendered (type names,
/// member names, argument lists) so a diagnostic outlives the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub span: Span,
    pub source_file: String,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, span: Span, source_file: impl Into<String>, args: Vec<String>) -> Self {
        Self { code, span, source_file: source_file.into(), args }
    }

    fn arg(&self, i: usize) -> &str {
        self.args.get(i).map(String::as_str).unwrap_or("?")
    }

    pub fn message(&self) -> String {
        use ErrorCode::*;
        match self.code {
            ClassNotFound => format!("class {} is not found", self.arg(0)),
            DuplicateClass => format!("duplicate class {}", self.arg(0)),
            DuplicateField => format!("duplicate field {} in {}", self.arg(1), self.arg(0)),
            DuplicateMethod => format!("duplicate method {}({}) in {}", self.arg(1), self.arg(2), self.arg(0)),
            DuplicateConstructor => format!("duplicate constructor {}({})", self.arg(0), self.arg(1)),
            DuplicateFunction => format!("duplicate function {}({})", self.arg(0), self.arg(1)),
            DuplicateGlobalVariable => format!("duplicate global variable {}", self.arg(0)),
            DuplicateLocalVariable => format!("duplicate local variable {}", self.arg(0)),
            CyclicInheritance => format!("cyclic inheritance involving {}", self.arg(0)),
            IllegalInheritance => format!("illegal inheritance from {}", self.arg(0)),
            IncompatibleOperandType => {
                format!("operator {} cannot be applied to {}", self.arg(0), self.args.get(1..).unwrap_or_default().join(", "))
            }
            IncompatibleType => format!("incompatible type: expected {}, found {}", self.arg(0), self.arg(1)),
            IsNotBoxableType => format!("{} is not a boxable type", self.arg(0)),
            FieldNotFound => format!("field {} is not found in {}", self.arg(1), self.arg(0)),
            FieldNotAccessible => format!("field {} of {} is not accessible", self.arg(1), self.arg(0)),
            MethodNotFound => format!("method {}({}) is not found in {}", self.arg(1), self.arg(2), self.arg(0)),
            MethodNotAccessible => format!("method {} of {} is not accessible", self.arg(1), self.arg(0)),
            AmbiguousMethod => format!("call to {}({}) on {} is ambiguous", self.arg(1), self.arg(2), self.arg(0)),
            AmbiguousConstructor => format!("constructor call {}({}) is ambiguous", self.arg(0), self.arg(1)),
            ConstructorNotFound => format!("constructor {}({}) is not found", self.arg(0), self.arg(1)),
            ClassNotAccessible => format!("class {} is not accessible", self.arg(0)),
            IllegalMethodCall => {
                format!("method {} of {} cannot be called from this context", self.arg(1), self.arg(0))
            }
            CannotReturnValue => "cannot return a value from a void method".to_string(),
            VariableNotFound => format!("variable {} is not found", self.arg(0)),
            DuplicateGeneratedMethod => {
                format!("generated method {}({}) conflicts in {}", self.arg(1), self.arg(2), self.arg(0))
            }
            UnimplementedFeature => format!("{} is not supported yet", self.arg(0)),
            InterfaceRequired => format!("{} is not an interface", self.arg(0)),
            IllegalSelfReference => "self cannot be used in a static context".to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source_file, self.span.start, self.message())
    }
}

/// Append-only diagnostic sink shared by every pass. Reports past `max`
/// are dropped; the passes keep running regardless.
#[derive(Debug)]
pub struct Reporter {
    max: usize,
    diagnostics: Vec<Diagnostic>,
    capped: bool,
}

impl Reporter {
    /// A cap of zero would hide every error, so the sink keeps at least one.
    pub fn new(max: usize) -> Self {
        Self { max: max.max(1), diagnostics: Vec::new(), capped: false }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() >= self.max {
            if !self.capped {
                tracing::warn!(max = self.max, "diagnostic cap reached, dropping further reports");
                self.capped = true;
            }
            return;
        }
        tracing::debug!(code = ?diagnostic.code, file = %diagnostic.source_file, "{}", diagnostic.message());
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    Semantic(Vec<Diagnostic>),

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },
}

impl CompileError {
    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    /// The aggregated diagnostics of a failed analysis; empty for config errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Semantic(diagnostics) => diagnostics,
            CompileError::Config { .. } => &[],
        }
    }
}
