//! Semantic analysis module
//!
//! This module handles scoping, storage layout and the driver that runs
//! both analysis passes over the AST.

pub mod symtab;
pub mod context;
pub mod collector;
pub mod analyzer;

pub use analyzer::{Analysis, SemanticAnalyzer};
pub use context::{AnalysisContext, AnalyzerOptions};
pub use symtab::{SymbolEntry, SymbolTable};
