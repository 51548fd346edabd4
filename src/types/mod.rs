//! Type system module
//!
//! This module holds the type representation, the registry of named
//! function/struct types, and the checking pass.

pub mod type_def;
pub mod registry;
pub mod checker;

pub use type_def::{can_convert, TypeInfo};
pub use registry::{FuncType, Member, RegistryError, StructType, TypeDef, TypeRegistry};
pub use checker::TypeChecker;
