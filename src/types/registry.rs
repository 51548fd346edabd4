//! Type registry
//!
//! Named function and struct definitions, and the storage size of any type.
//! Functions and structs share one namespace.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use super::type_def::TypeInfo;

/// Signature of a declared function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub name: String,
    pub params: Vec<TypeInfo>,
    pub return_type: TypeInfo,
}

impl FuncType {
    pub fn new(name: impl Into<String>, params: Vec<TypeInfo>, return_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
        }
    }
}

/// One struct member with its offset in storage units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: TypeInfo,
    pub offset: usize,
}

/// Struct definition with laid-out members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub name: String,
    pub members: Vec<Member>,
}

impl StructType {
    /// Lay out `fields` in order; every struct-typed field must already be registered
    pub fn layout(
        name: impl Into<String>,
        fields: Vec<(String, TypeInfo)>,
        registry: &TypeRegistry,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let mut offset: usize = 0;
        let mut members = Vec::with_capacity(fields.len());

        for (member_name, ty) in fields {
            let size = registry.size_of(&ty)?;
            members.push(Member {
                name: member_name,
                ty,
                offset,
            });
            offset = offset
                .checked_add(size)
                .ok_or_else(|| RegistryError::SizeOverflow(format!("struct {}", name)))?;
        }

        Ok(Self {
            name,
            members,
        })
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A registered definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Function(FuncType),
    Struct(StructType),
}

/// Registry failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate definition of type '{0}'")]
    DuplicateType(String),
    #[error("type '{0}' is not defined")]
    UndefinedType(String),
    #[error("struct type '{0}' is not defined")]
    UnresolvedType(String),
    #[error("type {0} has no storage size")]
    UnsizedType(String),
    #[error("type {0} is too large to store")]
    SizeOverflow(String),
}

/// Named function and struct types visible to the analysis
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every definition
    pub fn clear(&mut self) {
        self.types.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn register_function(&mut self, ftype: FuncType) -> Result<(), RegistryError> {
        let name = ftype.name.clone();
        self.insert(name, TypeDef::Function(ftype))
    }

    pub fn register_struct(&mut self, stype: StructType) -> Result<(), RegistryError> {
        let name = stype.name.clone();
        self.insert(name, TypeDef::Struct(stype))
    }

    fn insert(&mut self, name: String, def: TypeDef) -> Result<(), RegistryError> {
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType(name));
        }
        debug!("registered type '{}'", name);
        self.types.insert(name, def);
        Ok(())
    }

    pub fn lookup_function(&self, name: &str) -> Result<&FuncType, RegistryError> {
        match self.types.get(name) {
            Some(TypeDef::Function(ftype)) => Ok(ftype),
            _ => Err(RegistryError::UndefinedType(name.to_string())),
        }
    }

    pub fn lookup_struct(&self, name: &str) -> Result<&StructType, RegistryError> {
        match self.types.get(name) {
            Some(TypeDef::Struct(stype)) => Ok(stype),
            _ => Err(RegistryError::UndefinedType(name.to_string())),
        }
    }

    /// Remove a definition when its defining scope closes
    pub fn unregister(&mut self, name: &str) -> Result<TypeDef, RegistryError> {
        let def = self
            .types
            .remove(name)
            .ok_or_else(|| RegistryError::UndefinedType(name.to_string()))?;
        debug!("unregistered type '{}'", name);
        Ok(def)
    }

    /// Storage units occupied by a value of `ty`
    pub fn size_of(&self, ty: &TypeInfo) -> Result<usize, RegistryError> {
        match ty {
            TypeInfo::Integer
            | TypeInfo::Float
            | TypeInfo::Boolean
            | TypeInfo::Pointer { .. }
            | TypeInfo::Func(_) => Ok(1),
            TypeInfo::Array { element, count } => count
                .checked_mul(self.size_of(element)?)
                .ok_or_else(|| RegistryError::SizeOverflow(ty.to_string())),
            TypeInfo::Struct(name) => {
                let stype = self
                    .lookup_struct(name)
                    .map_err(|_| RegistryError::UnresolvedType(name.clone()))?;
                stype.members.iter().try_fold(0usize, |total, member| {
                    total
                        .checked_add(self.size_of(&member.ty)?)
                        .ok_or_else(|| RegistryError::SizeOverflow(ty.to_string()))
                })
            }
            TypeInfo::Void | TypeInfo::Error => Err(RegistryError::UnsizedType(ty.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(list: &[(&str, TypeInfo)]) -> Vec<(String, TypeInfo)> {
        list.iter()
            .map(|(name, ty)| (name.to_string(), ty.clone()))
            .collect()
    }

    #[test]
    fn test_struct_with_array_member_size() {
        let mut registry = TypeRegistry::new();
        let stype = StructType::layout(
            "sample",
            fields(&[
                ("count", TypeInfo::Integer),
                ("values", TypeInfo::array_of(TypeInfo::Float, 3)),
            ]),
            &registry,
        )
        .unwrap();
        registry.register_struct(stype).unwrap();

        assert_eq!(registry.size_of(&TypeInfo::Struct("sample".into())), Ok(4));
        let values = registry.lookup_struct("sample").unwrap().member("values").unwrap();
        assert_eq!(values.offset, 1);
    }

    #[test]
    fn test_oversized_types_report_overflow() {
        let mut registry = TypeRegistry::new();
        let huge = TypeInfo::array_of(TypeInfo::array_of(TypeInfo::Integer, 1 << 40), 1 << 40);
        assert_eq!(
            registry.size_of(&huge),
            Err(RegistryError::SizeOverflow("int[1099511627776][1099511627776]".into()))
        );

        let wide = TypeInfo::array_of(TypeInfo::Integer, usize::MAX);
        let stype = StructType::layout(
            "wide",
            fields(&[("a", wide.clone())]),
            &registry,
        )
        .unwrap();
        registry.register_struct(stype).unwrap();
        assert_eq!(
            StructType::layout("wider", fields(&[("a", wide.clone()), ("b", wide)]), &registry),
            Err(RegistryError::SizeOverflow("struct wider".into()))
        );

        let pair_of_wide = TypeInfo::array_of(TypeInfo::Struct("wide".into()), 2);
        assert_eq!(
            registry.size_of(&pair_of_wide),
            Err(RegistryError::SizeOverflow("struct wide[2]".into()))
        );
    }

    #[test]
    fn test_nested_struct_size() {
        let mut registry = TypeRegistry::new();
        let inner = StructType::layout(
            "pair",
            fields(&[("a", TypeInfo::Integer), ("b", TypeInfo::Float)]),
            &registry,
        )
        .unwrap();
        registry.register_struct(inner).unwrap();

        let outer = StructType::layout(
            "line",
            fields(&[
                ("from", TypeInfo::Struct("pair".into())),
                ("to", TypeInfo::Struct("pair".into())),
                ("next", TypeInfo::pointer_to(TypeInfo::Struct("line".into()))),
            ]),
            &registry,
        )
        .unwrap();
        assert_eq!(outer.member("to").unwrap().offset, 2);
        registry.register_struct(outer).unwrap();

        let grid = TypeInfo::array_of(TypeInfo::Struct("line".into()), 2);
        assert_eq!(registry.size_of(&grid), Ok(10));
    }

    #[test]
    fn test_unregistered_struct_is_unresolved() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.size_of(&TypeInfo::Struct("ghost".into())),
            Err(RegistryError::UnresolvedType("ghost".into()))
        );
        assert_eq!(
            registry.size_of(&TypeInfo::Void),
            Err(RegistryError::UnsizedType("void".into()))
        );
    }

    #[test]
    fn test_functions_and_structs_share_names() {
        let mut registry = TypeRegistry::new();
        registry
            .register_struct(StructType::layout("shape", vec![], &registry).unwrap())
            .unwrap();

        let clash = FuncType::new("shape", vec![], TypeInfo::Void);
        assert_eq!(
            registry.register_function(clash),
            Err(RegistryError::DuplicateType("shape".into()))
        );
    }

    #[test]
    fn test_register_lookup_unregister() {
        let mut registry = TypeRegistry::new();
        let ftype = FuncType::new("gcd", vec![TypeInfo::Integer, TypeInfo::Integer], TypeInfo::Integer);
        registry.register_function(ftype.clone()).unwrap();

        assert_eq!(registry.lookup_function("gcd"), Ok(&ftype));
        assert!(registry.lookup_struct("gcd").is_err());

        assert_eq!(registry.unregister("gcd"), Ok(TypeDef::Function(ftype)));
        assert_eq!(
            registry.lookup_function("gcd"),
            Err(RegistryError::UndefinedType("gcd".into()))
        );
        assert!(registry.unregister("gcd").is_err());
    }
}
