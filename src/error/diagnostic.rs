//! Diagnostic formatting for better error messages
//!
//! This module provides utilities for formatting error messages with
//! source code context, and the ordered sink both analysis passes report to.

use std::collections::HashMap;
use std::io;

use super::{SemaError, SourceLocation};
use colored::Colorize;
use log::debug;

/// Diagnostic information for displaying errors with context
pub struct Diagnostic<'a> {
    error: &'a SemaError,
    source: Option<&'a str>,
}

impl<'a> Diagnostic<'a> {
    /// Create a new diagnostic from an error
    pub fn new(error: &'a SemaError) -> Self {
        Self {
            error,
            source: None,
        }
    }

    /// Create a diagnostic with source code context
    pub fn with_source(error: &'a SemaError, source: &'a str) -> Self {
        Self {
            error,
            source: Some(source),
        }
    }

    /// Format the diagnostic with color and context
    pub fn format(&self) -> String {
        let mut output = String::new();

        // Error header
        let kind = self.error.kind().red().bold();
        output.push_str(&format!("{}: ", kind));
        output.push_str(self.error.message());
        output.push('\n');

        // Location and source context
        if let Some(location) = self.error.location() {
            output.push_str(&format!("  {} {}\n", "-->".blue().bold(), location));

            if let Some(source) = self.source {
                output.push_str(&self.format_source_context(source, location));
            }
        }

        output
    }

    /// Format source code context around the error line
    fn format_source_context(&self, source: &str, location: &SourceLocation) -> String {
        let mut output = String::new();
        let lines: Vec<&str> = source.lines().collect();

        if location.line == 0 || location.line > lines.len() {
            return output;
        }

        let line_idx = location.line - 1;
        let line_num_width = (location.line + 1).to_string().len();

        if line_idx > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                format!("{:width$}", line_idx, width = line_num_width).blue(),
                lines[line_idx - 1]
            ));
        }

        let line = lines[line_idx];
        output.push_str(&format!(
            "  {} {}\n",
            format!("{:width$}", location.line, width = line_num_width)
                .blue()
                .bold(),
            line
        ));

        // Underline the statement, skipping indentation
        let indent = line.len() - line.trim_start().len();
        let marker_len = line.trim().len().max(1);
        let indicator_padding = " ".repeat(line_num_width + 3 + indent);
        output.push_str(&format!(
            "{}{}\n",
            indicator_padding,
            "^".repeat(marker_len).red().bold()
        ));

        if line_idx + 1 < lines.len() {
            output.push_str(&format!(
                "  {} {}\n",
                format!("{:width$}", line_idx + 2, width = line_num_width).blue(),
                lines[line_idx + 1]
            ));
        }

        output
    }
}

impl std::fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Ordered collection of recoverable errors reported during analysis
///
/// Once anything is reported the collection counts as failed, which is what
/// keeps a half-checked tree away from code generation. The checking pass
/// rediscovers faults the declaration pass already reported; after
/// [`Diagnostics::begin_recheck`] each earlier report absorbs one identical
/// repeat.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<SemaError>,
    /// Earlier reports not yet matched by a repeat
    pending: HashMap<SemaError, usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless it repeats an earlier pass's report
    pub fn report(&mut self, error: SemaError) {
        if let Some(count) = self.pending.get_mut(&error) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&error);
            }
            debug!("already reported: {}", error);
            return;
        }
        debug!("reported {}", error);
        self.errors.push(error);
    }

    /// Start a pass that revisits what the previous passes reported on
    pub fn begin_recheck(&mut self) {
        self.pending.clear();
        for error in &self.errors {
            *self.pending.entry(error.clone()).or_insert(0) += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SemaError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SemaError> {
        self.errors
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.pending.clear();
    }

    /// Write the plain listing, one `<Kind> at line N: message` per error
    pub fn write_listing<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for error in &self.errors {
            match error.location() {
                Some(location) => writeln!(
                    out,
                    "{} at line {}: {}",
                    error.kind(),
                    location.line,
                    error.message()
                )?,
                None => writeln!(out, "{}: {}", error.kind(), error.message())?,
            }
        }
        Ok(())
    }

    /// Render every error in color, with source context when available
    pub fn render(&self, source: Option<&str>) -> String {
        self.errors
            .iter()
            .map(|error| match source {
                Some(source) => Diagnostic::with_source(error, source).format(),
                None => Diagnostic::new(error).format(),
            })
            .collect()
    }
}
