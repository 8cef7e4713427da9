//! Semantic checks over a resolved model.
//!
//! Validation is a two-phase walk per entity, in model order: every
//! attribute (free ones, then compartment ones) is normalized and checked,
//! then the entity itself. The first violation aborts the walk.

use std::collections::HashSet;
use std::ops::Deref;

use log::{debug, trace};

use crate::ast::{AttrType, Attribute, Bound, Constraint, Element, Entity, Model, Multiplicity};
use crate::multiplicity;
use crate::types::{ConstraintType, TypeRegistry};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Attribute \"{attribute}\" of entity \"{entity}\". Lower bound must be 0 or 1.")]
    LowerBound { entity: String, attribute: String },
    #[error("Attribute \"{attribute}\" of entity \"{entity}\". Upper bound must be 1 or *.")]
    UpperBound { entity: String, attribute: String },
    #[error("Attribute \"{attribute}\" of entity \"{entity}\". Key attributes can't have * multiplicity.")]
    ManyKey { entity: String, attribute: String },
    #[error(
        "Attribute \"{attribute}\" of entity \"{entity}\". Only references to entities can have * multiplicity."
    )]
    ManyNonReference { entity: String, attribute: String },
    #[error("Constraint \"{constraint}\" can't be applied to attribute \"{attribute}\" of entity \"{entity}\".")]
    ConstraintNotForAttribute {
        entity: String,
        attribute: String,
        constraint: String,
    },
    #[error("Constraint \"{constraint}\" can't be applied to entity \"{entity}\".")]
    ConstraintNotForEntity { entity: String, constraint: String },
    #[error(
        "Entity \"{entity}\" has multiple references to \"{target}\" without other side name. Use other side name to disambiguate."
    )]
    AmbiguousReference { entity: String, target: String },
    #[error("Entity \"{entity}\" has multiple attributes named \"{attribute}\".")]
    DuplicateAttribute { entity: String, attribute: String },
    #[error("Unknown constraint type #{index} on \"{owner}\".")]
    UnknownConstraintType { owner: String, index: usize },
}

/// A model that passed every semantic check. Only the validator creates one.
#[derive(Debug, Clone)]
pub struct ValidatedModel(Model);

impl Deref for ValidatedModel {
    type Target = Model;

    fn deref(&self) -> &Model {
        &self.0
    }
}

pub struct Validator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, mut model: Model) -> Result<ValidatedModel, SemanticError> {
        for index in 0..model.elements.len() {
            let Element::Entity(entity) = &mut model.elements[index] else {
                continue;
            };
            self.validate_attributes(entity)?;

            if let Element::Entity(entity) = &model.elements[index] {
                self.validate_entity(entity, &model)?;
            }
        }
        debug!(elements = model.elements.len(); "Model validated");
        Ok(ValidatedModel(model))
    }

    fn validate_attributes(&self, entity: &mut Entity) -> Result<(), SemanticError> {
        let Entity {
            name,
            attributes,
            compartments,
            ..
        } = entity;

        for attr in attributes.iter_mut() {
            self.validate_attribute(attr, name)?;
        }
        for compartment in compartments.iter_mut() {
            for attr in compartment.attributes.iter_mut() {
                self.validate_attribute(attr, name)?;
            }
        }
        Ok(())
    }

    /// Normalize the attribute's multiplicity, then check it and its constraints.
    pub fn validate_attribute(&self, attr: &mut Attribute, entity: &str) -> Result<Multiplicity, SemanticError> {
        trace!(entity = entity, attribute = attr.name.as_str(); "Validating attribute");
        let m = multiplicity::normalize(attr);

        let names = || (entity.to_string(), attr.name.clone());

        if !matches!(m.lower, Bound::Number(0 | 1)) {
            let (entity, attribute) = names();
            return Err(SemanticError::LowerBound { entity, attribute });
        }
        if matches!(m.upper, Some(Bound::Number(n)) if n != 1) {
            let (entity, attribute) = names();
            return Err(SemanticError::UpperBound { entity, attribute });
        }
        if m.upper == Some(Bound::Many) {
            if attr.key {
                let (entity, attribute) = names();
                return Err(SemanticError::ManyKey { entity, attribute });
            }
            if !matches!(attr.typ, AttrType::Entity(_)) {
                let (entity, attribute) = names();
                return Err(SemanticError::ManyNonReference { entity, attribute });
            }
        }

        for constraint in &attr.constraints {
            let kind = self.constraint_type(constraint, &attr.name)?;
            if !kind.applies_to_attribute {
                let (entity, attribute) = names();
                return Err(SemanticError::ConstraintNotForAttribute {
                    entity,
                    attribute,
                    constraint: kind.name.clone(),
                });
            }
        }

        Ok(m)
    }

    /// Entity-level checks. Expects every attribute to be validated already.
    pub fn validate_entity(&self, entity: &Entity, model: &Model) -> Result<(), SemanticError> {
        debug!(entity = entity.name.as_str(); "Validating entity");

        for constraint in &entity.constraints {
            let kind = self.constraint_type(constraint, &entity.name)?;
            if !kind.applies_to_entity {
                return Err(SemanticError::ConstraintNotForEntity {
                    entity: entity.name.clone(),
                    constraint: kind.name.clone(),
                });
            }
        }

        let mut unlabeled_targets = HashSet::new();
        for attr in entity.all_attributes() {
            let Some(target) = attr.target_entity() else {
                continue;
            };
            if attr.other_side().is_some() {
                continue;
            }
            if !unlabeled_targets.insert(target) {
                let target = model.entity(target).map_or("?", |e| e.name.as_str());
                return Err(SemanticError::AmbiguousReference {
                    entity: entity.name.clone(),
                    target: target.to_string(),
                });
            }
        }

        let mut names = HashSet::new();
        for attr in entity.all_attributes() {
            if !names.insert(attr.name.as_str()) {
                return Err(SemanticError::DuplicateAttribute {
                    entity: entity.name.clone(),
                    attribute: attr.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn constraint_type(&self, constraint: &Constraint, owner: &str) -> Result<&'r ConstraintType, SemanticError> {
        self.registry
            .get_constraint_type(constraint.kind)
            .ok_or_else(|| SemanticError::UnknownConstraintType {
                owner: owner.to_string(),
                index: constraint.kind.index(),
            })
    }
}
