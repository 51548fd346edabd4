//! # TINY semantic analyzer
//!
//! Semantic analysis for the TINY teaching language:
//! - Scoped symbol table with storage layout for globals, locals and parameters
//! - Registry of named function and struct types
//! - Two-pass checking: declarations first, then expression typing
//!
//! ## Architecture
//!
//! The analyzer is organized into several modules:
//! - `ast`: Syntax tree handed over by the parser, decorated in place
//! - `types`: Type representation, type registry and the checking pass
//! - `semantic`: Symbol table, analysis context and the pass driver
//! - `error`: Error handling and diagnostics
//!
//! Scanning, parsing and code generation live outside this crate.

pub mod error;
pub mod ast;
pub mod types;
pub mod semantic;

// Re-export commonly used types
pub use error::{Diagnostic, Diagnostics, SemaError, SemaResult, SourceLocation};
pub use ast::Program;
pub use types::{TypeInfo, TypeRegistry};
pub use semantic::{Analysis, AnalyzerOptions, SemanticAnalyzer, SymbolTable};

/// Version of the analyzer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a parsed program with default options
///
/// Returns the decorated tree along with every define and type error found.
/// Fails only when the tree breaks an invariant the parser guarantees.
///
/// # Arguments
///
/// * `program` - The syntax tree produced by the parser
pub fn analyze(program: Program) -> SemaResult<Analysis> {
    SemanticAnalyzer::new().analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_analyze_entry_point() {
        let analysis = analyze(program(vec![
            declare("x", TypeInfo::Integer, 1),
            write(id("x", 2), 2),
        ]))
        .unwrap();
        let (tree, success) = analysis.into_parts();
        assert!(success);
        assert_eq!(tree.expressions()[0].ty, TypeInfo::Integer);
    }
}
