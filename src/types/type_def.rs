//! Type definitions
//!
//! This module defines the static types of the language and the implicit
//! conversion relation between them.

use std::fmt;

use super::registry::FuncType;
use crate::error::{SemaError, SemaResult};

/// Type information attached to declarations and expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    Integer,
    Float,
    Boolean,
    Void,
    /// `level` levels of indirection down to a non-pointer `base`
    Pointer { level: usize, base: Box<TypeInfo> },
    Array { element: Box<TypeInfo>, count: usize },
    /// Named struct, resolved through the type registry
    Struct(String),
    Func(Box<FuncType>),
    /// Unresolved or erroneous type; suppresses follow-up errors
    Error,
}

impl TypeInfo {
    /// Pointer to `target`, one level deeper than `target` if it is a pointer
    pub fn pointer_to(target: TypeInfo) -> Self {
        match target {
            TypeInfo::Pointer { level, base } => TypeInfo::Pointer {
                level: level + 1,
                base,
            },
            other => TypeInfo::Pointer {
                level: 1,
                base: Box::new(other),
            },
        }
    }

    pub fn array_of(element: TypeInfo, count: usize) -> Self {
        TypeInfo::Array {
            element: Box::new(element),
            count,
        }
    }

    /// The type reached by one dereference, if this is a pointer
    pub fn pointee(&self) -> Option<TypeInfo> {
        match self {
            TypeInfo::Pointer { level: 1, base } => Some((**base).clone()),
            TypeInfo::Pointer { level, base } => Some(TypeInfo::Pointer {
                level: level - 1,
                base: base.clone(),
            }),
            _ => None,
        }
    }

    /// Element type, if this is an array
    pub fn element(&self) -> Option<&TypeInfo> {
        match self {
            TypeInfo::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeInfo::Pointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeInfo::Array { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeInfo::Float)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeInfo::Error)
    }

    /// Values usable where an integer is expected (bool, int, float)
    pub fn is_integer_convertible(&self) -> bool {
        matches!(
            self,
            TypeInfo::Boolean | TypeInfo::Integer | TypeInfo::Float | TypeInfo::Error
        )
    }

    /// Operand classes accepted by arithmetic and relational operators
    pub fn is_arithmetic_or_pointer(&self) -> bool {
        self.is_integer_convertible() || self.is_pointer()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Integer => write!(f, "int"),
            TypeInfo::Float => write!(f, "float"),
            TypeInfo::Boolean => write!(f, "bool"),
            TypeInfo::Void => write!(f, "void"),
            TypeInfo::Pointer { level, base } => write!(f, "{}{}", base, "*".repeat(*level)),
            TypeInfo::Array { element, count } => write!(f, "{}[{}]", element, count),
            TypeInfo::Struct(name) => write!(f, "struct {}", name),
            TypeInfo::Func(func) => {
                let params: Vec<String> = func.params.iter().map(|p| p.to_string()).collect();
                write!(f, "fun({}) -> {}", params.join(", "), func.return_type)
            }
            TypeInfo::Error => write!(f, "<error>"),
        }
    }
}

/// Whether a value of type `source` may be used where `target` is expected
///
/// The relation is directional: `can_convert(&Integer, &Float)` and
/// `can_convert(&Float, &Integer)` both hold, but pointers only accept
/// pointers of the same level over the same base. An erroneous type on
/// either side is accepted so one fault is not reported twice. Struct
/// targets are not convertible at all and fail as an internal error.
pub fn can_convert(target: &TypeInfo, source: &TypeInfo) -> SemaResult<bool> {
    if target.is_error() || source.is_error() {
        return Ok(true);
    }

    let convertible = match target {
        TypeInfo::Boolean => matches!(source, TypeInfo::Boolean | TypeInfo::Integer),
        TypeInfo::Integer => matches!(
            source,
            TypeInfo::Boolean | TypeInfo::Integer | TypeInfo::Float
        ),
        TypeInfo::Float => matches!(source, TypeInfo::Float | TypeInfo::Integer),
        TypeInfo::Void => matches!(source, TypeInfo::Void),
        TypeInfo::Pointer { level, base } => match source {
            TypeInfo::Pointer {
                level: source_level,
                base: source_base,
            } => level == source_level && base == source_base,
            _ => false,
        },
        // Element types and counts are not compared
        TypeInfo::Array { .. } => source.is_array(),
        TypeInfo::Func(func) => matches!(source, TypeInfo::Func(other) if other == func),
        TypeInfo::Struct(name) => {
            return Err(SemaError::internal_error(format!(
                "conversion to struct {} is not supported",
                name
            )))
        }
        TypeInfo::Error => true,
    };

    Ok(convertible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int_ptr(level: usize) -> TypeInfo {
        TypeInfo::Pointer {
            level,
            base: Box::new(TypeInfo::Integer),
        }
    }

    #[test]
    fn test_scalar_conversions() {
        assert!(can_convert(&TypeInfo::Integer, &TypeInfo::Float).unwrap());
        assert!(can_convert(&TypeInfo::Float, &TypeInfo::Integer).unwrap());
        assert!(can_convert(&TypeInfo::Boolean, &TypeInfo::Integer).unwrap());
        assert!(can_convert(&TypeInfo::Integer, &TypeInfo::Boolean).unwrap());
        assert!(!can_convert(&TypeInfo::Boolean, &TypeInfo::Float).unwrap());
        assert!(!can_convert(&TypeInfo::Float, &TypeInfo::Boolean).unwrap());
        assert!(!can_convert(&TypeInfo::Integer, &int_ptr(1)).unwrap());
    }

    #[test]
    fn test_pointer_conversions() {
        let float_ptr = TypeInfo::Pointer {
            level: 1,
            base: Box::new(TypeInfo::Float),
        };

        assert!(can_convert(&int_ptr(1), &int_ptr(1)).unwrap());
        assert!(!can_convert(&int_ptr(1), &float_ptr).unwrap());
        assert!(!can_convert(&int_ptr(2), &int_ptr(1)).unwrap());
        assert!(!can_convert(&int_ptr(1), &TypeInfo::Integer).unwrap());
    }

    #[test]
    fn test_array_conversion_ignores_elements() {
        let ints = TypeInfo::array_of(TypeInfo::Integer, 3);
        let floats = TypeInfo::array_of(TypeInfo::Float, 8);

        assert!(can_convert(&ints, &floats).unwrap());
        assert!(!can_convert(&ints, &TypeInfo::Integer).unwrap());
    }

    #[test]
    fn test_struct_target_is_internal_error() {
        let result = can_convert(&TypeInfo::Struct("point".into()), &TypeInfo::Integer);
        assert!(matches!(result, Err(SemaError::InternalError { .. })));
    }

    #[test]
    fn test_error_type_is_accepted() {
        assert!(can_convert(&TypeInfo::Boolean, &TypeInfo::Error).unwrap());
        assert!(can_convert(&TypeInfo::Error, &TypeInfo::Struct("s".into())).unwrap());
    }

    #[test]
    fn test_pointer_construction_and_dereference() {
        let p = TypeInfo::pointer_to(TypeInfo::Integer);
        assert_eq!(p, int_ptr(1));

        let pp = TypeInfo::pointer_to(p.clone());
        assert_eq!(pp, int_ptr(2));
        assert_eq!(pp.pointee(), Some(p.clone()));
        assert_eq!(p.pointee(), Some(TypeInfo::Integer));
        assert_eq!(TypeInfo::Integer.pointee(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(int_ptr(2).to_string(), "int**");
        assert_eq!(TypeInfo::array_of(TypeInfo::Float, 3).to_string(), "float[3]");
        assert_eq!(TypeInfo::Struct("node".into()).to_string(), "struct node");
    }
}
