//! Syntax tree module
//!
//! Node definitions shared with the parser, plus construction helpers.

pub mod nodes;
pub mod build;

pub use nodes::*;
