//! Built-in scalar data types and constraint kinds.
//!
//! The [`TypeRegistry`] is built once by the entry point and shared by
//! reference with the validator, the loader and the exporter. Nothing
//! mutates it after construction.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataTypeId(usize);

impl DataTypeId {
    pub const INT: Self = Self(0);
    pub const STRING: Self = Self(1);
    pub const TIME: Self = Self(2);
    pub const DATE: Self = Self(3);
    pub const FLOAT: Self = Self(4);
    pub const DECIMAL: Self = Self(5);
    pub const BOOL: Self = Self(6);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintTypeId(usize);

impl ConstraintTypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub name: String,
}

/// A named constraint kind and where it may be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintType {
    pub name: String,
    pub parameter_types: Vec<DataTypeId>,
    pub applies_to_attribute: bool,
    pub applies_to_entity: bool,
}

impl ConstraintType {
    /// A kind declared with neither target applies to both.
    pub fn new(name: impl Into<String>, applies_to_attribute: bool, applies_to_entity: bool) -> Self {
        let (applies_to_attribute, applies_to_entity) = if !applies_to_attribute && !applies_to_entity {
            (true, true)
        } else {
            (applies_to_attribute, applies_to_entity)
        };
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
            applies_to_attribute,
            applies_to_entity,
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, false, true)
    }

    pub fn with_parameters(mut self, parameter_types: Vec<DataTypeId>) -> Self {
        self.parameter_types = parameter_types;
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Constraint type \"{0}\" is already registered")]
    DuplicateConstraint(String),
}

/// Catalog of scalar data types and constraint kinds.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    data_types: Vec<DataType>,
    constraint_types: Vec<ConstraintType>,
}

const BUILTIN_DATA_TYPES: [&str; 7] = ["int", "string", "time", "date", "float", "decimal", "bool"];

impl TypeRegistry {
    pub fn builtin() -> Self {
        let data_types = BUILTIN_DATA_TYPES
            .iter()
            .map(|name| DataType { name: name.to_string() })
            .collect();

        let constraint_types = vec![
            ConstraintType::attribute("unique"),
            ConstraintType::attribute("ordered"),
            ConstraintType::new("dbname", true, true).with_parameters(vec![DataTypeId::STRING]),
            ConstraintType::attribute("fk_cols").with_parameters(vec![DataTypeId::STRING]),
            ConstraintType::attribute("positive"),
            ConstraintType::attribute("upper_case"),
            ConstraintType::attribute("lower_case"),
            ConstraintType::attribute("email"),
        ];

        Self {
            data_types,
            constraint_types,
        }
    }

    /// Start from the builtin catalog and register extra constraint kinds.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: Self::builtin(),
        }
    }

    pub fn data_type(&self, name: &str) -> Option<DataTypeId> {
        self.data_types.iter().position(|t| t.name == name).map(DataTypeId)
    }

    pub fn get_data_type(&self, id: DataTypeId) -> Option<&DataType> {
        self.data_types.get(id.0)
    }

    pub fn constraint_type(&self, name: &str) -> Option<ConstraintTypeId> {
        self.constraint_types
            .iter()
            .position(|t| t.name == name)
            .map(ConstraintTypeId)
    }

    pub fn get_constraint_type(&self, id: ConstraintTypeId) -> Option<&ConstraintType> {
        self.constraint_types.get(id.0)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub struct RegistryBuilder {
    registry: TypeRegistry,
}

impl RegistryBuilder {
    pub fn constraint(mut self, constraint: ConstraintType) -> Result<Self, RegistryError> {
        if self.registry.constraint_type(&constraint.name).is_some() {
            return Err(RegistryError::DuplicateConstraint(constraint.name));
        }
        self.registry.constraint_types.push(constraint);
        Ok(self)
    }

    pub fn build(self) -> TypeRegistry {
        self.registry
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_data_types() {
        let registry = TypeRegistry::builtin();
        assert_eq!(registry.data_type("int"), Some(DataTypeId::INT));
        assert_eq!(registry.data_type("bool"), Some(DataTypeId::BOOL));
        assert_eq!(registry.data_type("varchar"), None);
        assert_eq!(
            registry.get_data_type(DataTypeId::DECIMAL).map(|t| t.name.as_str()),
            Some("decimal")
        );
    }

    #[test]
    fn test_builtin_constraint_targets() {
        let registry = TypeRegistry::builtin();
        let unique = registry.constraint_type("unique").unwrap();
        let unique = registry.get_constraint_type(unique).unwrap();
        assert!(unique.applies_to_attribute);
        assert!(!unique.applies_to_entity);

        let dbname = registry.constraint_type("dbname").unwrap();
        let dbname = registry.get_constraint_type(dbname).unwrap();
        assert!(dbname.applies_to_attribute);
        assert!(dbname.applies_to_entity);
    }

    #[test]
    fn test_constraint_without_target_applies_everywhere() {
        let c = ConstraintType::new("note", false, false);
        assert!(c.applies_to_attribute);
        assert!(c.applies_to_entity);
    }

    #[test]
    fn test_builder_registers_entity_constraint() {
        let registry = TypeRegistry::builder()
            .constraint(ConstraintType::entity("abstract"))
            .unwrap()
            .build();
        let id = registry.constraint_type("abstract").unwrap();
        let kind = registry.get_constraint_type(id).unwrap();
        assert!(!kind.applies_to_attribute);
        assert!(kind.applies_to_entity);
    }

    #[test]
    fn test_builder_rejects_duplicate() {
        let result = TypeRegistry::builder().constraint(ConstraintType::attribute("unique"));
        assert!(matches!(result, Err(RegistryError::DuplicateConstraint(name)) if name == "unique"));
    }
}
