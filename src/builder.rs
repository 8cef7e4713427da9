//! Programmatic construction of resolved models.
//!
//! Elements are declared first and filled in afterwards, so an attribute can
//! reference an entity declared later in the model.

use crate::ast::{Attribute, Compartment, Constraint, Element, Entity, EntityId, Enum, EnumId, Model};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Element #{0} is not an entity of this model")]
    NotAnEntity(usize),
}

#[derive(Debug, Default)]
pub struct ModelBuilder {
    elements: Vec<Element>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&mut self, name: impl Into<String>) -> EntityId {
        self.elements.push(Element::Entity(Entity::new(name)));
        EntityId(self.elements.len() - 1)
    }

    pub fn enumeration(&mut self, enumeration: Enum) -> EnumId {
        self.elements.push(Element::Enum(enumeration));
        EnumId(self.elements.len() - 1)
    }

    /// Edit a declared entity.
    pub fn define(&mut self, id: EntityId, f: impl FnOnce(&mut Entity)) -> Result<&mut Self, BuildError> {
        match self.elements.get_mut(id.0) {
            Some(Element::Entity(entity)) => f(entity),
            _ => return Err(BuildError::NotAnEntity(id.0)),
        }
        Ok(self)
    }

    pub fn attribute(&mut self, id: EntityId, attr: Attribute) -> Result<&mut Self, BuildError> {
        self.define(id, |e| e.attributes.push(attr))
    }

    pub fn compartment(&mut self, id: EntityId, compartment: Compartment) -> Result<&mut Self, BuildError> {
        self.define(id, |e| e.compartments.push(compartment))
    }

    pub fn constraint(&mut self, id: EntityId, constraint: Constraint) -> Result<&mut Self, BuildError> {
        self.define(id, |e| e.constraints.push(constraint))
    }

    pub fn build(self) -> Model {
        Model {
            elements: self.elements,
        }
    }
}
