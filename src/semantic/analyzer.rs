//! Semantic analyzer
//!
//! Drives the two passes over a parsed program: declaration collection,
//! then type checking. The result carries the decorated tree together with
//! every recoverable error found, in the order it was found.

use log::{debug, info};

use crate::ast::Program;
use crate::error::{Diagnostics, SemaResult};
use crate::semantic::collector::DeclarationCollector;
use crate::semantic::context::{AnalysisContext, AnalyzerOptions};
use crate::types::TypeChecker;

/// Outcome of analyzing one program
#[derive(Debug)]
pub struct Analysis {
    /// The tree with types and storage filled in
    pub program: Program,
    pub diagnostics: Diagnostics,
    /// Global scope listing, captured when `trace_analyze` is set
    pub symbol_listing: Option<String>,
    color: bool,
}

impl Analysis {
    /// True when no define or type error was reported
    pub fn success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_parts(self) -> (Program, bool) {
        let success = self.success();
        (self.program, success)
    }

    /// Whether every expression received a type and a converted type
    pub fn is_fully_typed(&self) -> bool {
        self.program
            .expressions()
            .iter()
            .all(|expr| !expr.ty.is_error() && !expr.converted_type.is_error())
    }

    /// Human-readable report of all diagnostics
    pub fn render(&self, source: Option<&str>) -> String {
        if self.color {
            return self.diagnostics.render(source);
        }
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.diagnostics.write_listing(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn write_listing<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.diagnostics.write_listing(out)?;
        if let Some(listing) = &self.symbol_listing {
            writeln!(out, "\nSymbol table:\n")?;
            write!(out, "{}", listing)?;
        }
        Ok(())
    }
}

/// Semantic analyzer
pub struct SemanticAnalyzer {
    ctx: AnalysisContext,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::with_options(AnalyzerOptions::default())
    }

    pub fn with_options(options: AnalyzerOptions) -> Self {
        Self {
            ctx: AnalysisContext::new(options),
        }
    }

    /// State left behind by the last run
    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    /// Analyze a program
    ///
    /// Recoverable errors end up in the returned [`Analysis`]; an `Err`
    /// means the tree broke an invariant a correct parser guarantees.
    pub fn analyze(&mut self, mut program: Program) -> SemaResult<Analysis> {
        self.ctx.reset();
        info!(
            "analyzing program with {} top-level statements",
            program.statements.len()
        );

        DeclarationCollector::new(&mut self.ctx).collect(&mut program)?;
        debug!(
            "declarations collected, {} errors so far",
            self.ctx.diagnostics.len()
        );
        self.ctx.diagnostics.begin_recheck();
        TypeChecker::new(&mut self.ctx).check(&mut program)?;

        let symbol_listing = self
            .ctx
            .options
            .trace_analyze
            .then(|| self.ctx.symbols.render());
        let diagnostics = std::mem::take(&mut self.ctx.diagnostics);
        info!("analysis finished with {} errors", diagnostics.len());

        Ok(Analysis {
            program,
            diagnostics,
            symbol_listing,
            color: self.ctx.options.color,
        })
    }
}
