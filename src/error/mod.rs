//! Error handling and diagnostics for the analyzer
//!
//! This module provides the error type shared by both analysis passes and
//! the diagnostic sink that collects recoverable errors.

use std::fmt;

pub mod diagnostic;

pub use diagnostic::{Diagnostic, Diagnostics};

/// Result type alias for analyzer operations
pub type SemaResult<T> = Result<T, SemaError>;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: usize,
    /// Optional filename
    pub filename: Option<String>,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, filename: Option<String>) -> Self {
        Self { line, filename }
    }

    /// Create a source location without a filename
    pub fn at(line: usize) -> Self {
        Self::new(line, None)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref filename) = self.filename {
            write!(f, "{}:{}", filename, self.line)
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

/// Main error type for semantic analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemaError {
    /// Duplicate or missing definition
    DefineError {
        message: String,
        location: SourceLocation,
    },
    /// Ill-typed expression or statement
    TypeError {
        message: String,
        location: SourceLocation,
    },
    /// Broken tree invariant (should not happen with a correct parser)
    InternalError {
        message: String,
    },
}

impl SemaError {
    /// Create a new definition error
    pub fn define_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::DefineError {
            message: message.into(),
            location,
        }
    }

    /// Create a new type error
    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::TypeError {
            message: message.into(),
            location,
        }
    }

    /// Create a new internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Get the error kind as a string
    pub fn kind(&self) -> &str {
        match self {
            Self::DefineError { .. } => "Define error",
            Self::TypeError { .. } => "Type error",
            Self::InternalError { .. } => "Internal error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            Self::DefineError { message, .. }
            | Self::TypeError { message, .. }
            | Self::InternalError { message } => message,
        }
    }

    /// Get the source location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::DefineError { location, .. } | Self::TypeError { location, .. } => {
                Some(location)
            }
            Self::InternalError { .. } => None,
        }
    }

    /// Whether analysis may continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalError { .. })
    }
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location() {
            write!(f, "{} at {}: {}", self.kind(), location, self.message())
        } else {
            write!(f, "{}: {}", self.kind(), self.message())
        }
    }
}

impl std::error::Error for SemaError {}
