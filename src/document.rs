//! JSON interchange form of a model.
//!
//! Types, `extends` links and constraint kinds are given by name and
//! resolved against the model's own elements and the [`TypeRegistry`].
//! Model elements shadow builtin data types of the same name.
//!
//! ```json
//! { "elements": [
//!     { "kind": "entity", "name": "Order", "attributes": [
//!         { "name": "items", "type": "Item", "multiplicity": { "lower": "*" },
//!           "ref": { "containment": true } } ] },
//!     { "kind": "entity", "name": "Item" }
//! ] }
//! ```

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::ast::{
    AttrType, Attribute, Bound, Compartment, Constraint, ConstraintParam, Entity, EntityId, Enum,
    EnumId, EnumLiteral, Model, Multiplicity, Precision, Reference,
};
use crate::builder::{BuildError, ModelBuilder};
use crate::types::TypeRegistry;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid model document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Element \"{0}\" is defined more than once")]
    DuplicateElement(String),
    #[error("Attribute \"{attribute}\" of entity \"{entity}\" has unknown type \"{name}\"")]
    UnknownType {
        entity: String,
        attribute: String,
        name: String,
    },
    #[error("Unknown constraint \"{name}\" on \"{owner}\"")]
    UnknownConstraint { owner: String, name: String },
    #[error("Entity \"{entity}\" extends \"{name}\" which is not an entity")]
    UnknownExtends { entity: String, name: String },
    #[error("Invalid multiplicity bound \"{0}\", expected a number or \"*\"")]
    InvalidBound(String),
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(Debug, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub elements: Vec<ElementDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementDoc {
    Entity(EntityDoc),
    Enum(EnumDoc),
}

#[derive(Debug, Deserialize)]
pub struct EntityDoc {
    pub name: String,
    pub label: Option<String>,
    pub extends: Option<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDoc>,
    pub desc: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDoc>,
    #[serde(default)]
    pub compartments: Vec<CompartmentDoc>,
}

#[derive(Debug, Deserialize)]
pub struct CompartmentDoc {
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDoc>,
}

#[derive(Debug, Deserialize)]
pub struct AttributeDoc {
    pub name: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub typ: String,
    pub precision: Option<PrecisionDoc>,
    pub multiplicity: Option<MultiplicityDoc>,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub constraints: Vec<ConstraintDoc>,
    #[serde(rename = "ref")]
    pub reference: Option<ReferenceDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PrecisionDoc {
    Single(u32),
    Pair(u32, u32),
}

#[derive(Debug, Deserialize)]
pub struct MultiplicityDoc {
    pub lower: BoundDoc,
    pub upper: Option<BoundDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoundDoc {
    Number(u32),
    Symbol(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct ReferenceDoc {
    pub other_side: Option<String>,
    #[serde(default)]
    pub containment: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConstraintDoc {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParamDoc {
    Int(i64),
    Str(String),
}

#[derive(Debug, Deserialize)]
pub struct EnumDoc {
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub literals: Vec<LiteralDoc>,
}

#[derive(Debug, Deserialize)]
pub struct LiteralDoc {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
enum Declared {
    Entity(EntityId),
    Enum(EnumId),
}

impl ModelDocument {
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Resolve every name and build the model tree.
    pub fn into_model(self, registry: &TypeRegistry) -> Result<Model, DocumentError> {
        let mut builder = ModelBuilder::new();
        let mut declared: HashMap<String, Declared> = HashMap::new();
        let mut entities = Vec::new();

        for element in self.elements {
            let name = match &element {
                ElementDoc::Entity(e) => e.name.clone(),
                ElementDoc::Enum(e) => e.name.clone(),
            };
            if declared.contains_key(&name) {
                return Err(DocumentError::DuplicateElement(name));
            }
            match element {
                ElementDoc::Entity(doc) => {
                    let id = builder.entity(name.clone());
                    declared.insert(name, Declared::Entity(id));
                    entities.push((id, doc));
                }
                ElementDoc::Enum(doc) => {
                    let id = builder.enumeration(enum_from_doc(doc));
                    declared.insert(name, Declared::Enum(id));
                }
            }
        }

        let resolver = Resolver {
            declared: &declared,
            registry,
        };
        for (id, doc) in entities {
            let entity = resolver.entity(doc)?;
            builder.define(id, |e| *e = entity)?;
        }

        let model = builder.build();
        debug!(elements = model.elements.len(); "Model document resolved");
        Ok(model)
    }
}

fn enum_from_doc(doc: EnumDoc) -> Enum {
    Enum {
        name: doc.name,
        label: doc.label,
        literals: doc
            .literals
            .into_iter()
            .map(|l| EnumLiteral {
                name: l.name,
                code: l.code,
                label: l.label,
            })
            .collect(),
    }
}

struct Resolver<'a> {
    declared: &'a HashMap<String, Declared>,
    registry: &'a TypeRegistry,
}

impl Resolver<'_> {
    fn entity(&self, doc: EntityDoc) -> Result<Entity, DocumentError> {
        let extends = match doc.extends {
            Some(parent) => match self.declared.get(&parent) {
                Some(Declared::Entity(id)) => Some(*id),
                _ => {
                    return Err(DocumentError::UnknownExtends {
                        entity: doc.name,
                        name: parent,
                    });
                }
            },
            None => None,
        };

        let constraints = self.constraints(doc.constraints, &doc.name)?;
        let attributes = self.attributes(doc.attributes, &doc.name)?;
        let compartments = doc
            .compartments
            .into_iter()
            .map(|c| -> Result<Compartment, DocumentError> {
                Ok(Compartment {
                    name: c.name,
                    label: c.label,
                    attributes: self.attributes(c.attributes, &doc.name)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Entity {
            name: doc.name,
            label: doc.label,
            extends,
            constraints,
            desc: doc.desc,
            attributes,
            compartments,
        })
    }

    fn attributes(&self, docs: Vec<AttributeDoc>, entity: &str) -> Result<Vec<Attribute>, DocumentError> {
        docs.into_iter().map(|a| self.attribute(a, entity)).collect()
    }

    fn attribute(&self, doc: AttributeDoc, entity: &str) -> Result<Attribute, DocumentError> {
        let typ = match self.declared.get(&doc.typ) {
            Some(Declared::Entity(id)) => AttrType::Entity(*id),
            Some(Declared::Enum(id)) => AttrType::Enum(*id),
            None => match self.registry.data_type(&doc.typ) {
                Some(id) => AttrType::Data(id),
                None => {
                    return Err(DocumentError::UnknownType {
                        entity: entity.to_string(),
                        attribute: doc.name,
                        name: doc.typ,
                    });
                }
            },
        };

        let multiplicity = doc
            .multiplicity
            .map(|m| -> Result<Multiplicity, DocumentError> {
                Ok(Multiplicity {
                    lower: bound(&m.lower)?,
                    upper: m.upper.as_ref().map(bound).transpose()?,
                })
            })
            .transpose()?;

        let owner = format!("{}.{}", entity, doc.name);
        let constraints = self.constraints(doc.constraints, &owner)?;

        Ok(Attribute {
            name: doc.name,
            label: doc.label,
            typ,
            precision: doc.precision.map(|p| match p {
                PrecisionDoc::Single(x) => Precision { x, y: None },
                PrecisionDoc::Pair(x, y) => Precision { x, y: Some(y) },
            }),
            multiplicity,
            key: doc.key,
            constraints,
            reference: doc.reference.map(|r| Reference {
                other_side: r.other_side,
                containment: r.containment,
            }),
        })
    }

    fn constraints(&self, docs: Vec<ConstraintDoc>, owner: &str) -> Result<Vec<Constraint>, DocumentError> {
        docs.into_iter()
            .map(|c| -> Result<Constraint, DocumentError> {
                let kind = self
                    .registry
                    .constraint_type(&c.name)
                    .ok_or_else(|| DocumentError::UnknownConstraint {
                        owner: owner.to_string(),
                        name: c.name.clone(),
                    })?;
                let params = c
                    .params
                    .into_iter()
                    .map(|p| match p {
                        ParamDoc::Int(n) => ConstraintParam::Int(n),
                        ParamDoc::Str(s) if is_identifier(&s) => ConstraintParam::Ident(s),
                        ParamDoc::Str(s) => ConstraintParam::Str(s),
                    })
                    .collect();
                Ok(Constraint { kind, params })
            })
            .collect()
    }
}

fn bound(doc: &BoundDoc) -> Result<Bound, DocumentError> {
    match doc {
        BoundDoc::Number(n) => Ok(Bound::Number(*n)),
        BoundDoc::Symbol(s) if s == "*" => Ok(Bound::Many),
        BoundDoc::Symbol(s) => s
            .parse()
            .map(Bound::Number)
            .map_err(|_| DocumentError::InvalidBound(s.clone())),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a JSON document and resolve it into a model.
pub fn load_model(source: &str, registry: &TypeRegistry) -> Result<Model, DocumentError> {
    ModelDocument::from_json(source)?.into_model(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataTypeId;

    const ORDERS: &str = r#"{
        "elements": [
            { "kind": "entity", "name": "Order", "label": "Purchase order",
              "constraints": [ { "name": "dbname", "params": ["orders"] } ],
              "attributes": [
                { "name": "number", "type": "int", "key": true },
                { "name": "items", "type": "Item", "multiplicity": { "lower": "*" },
                  "ref": { "containment": true } },
                { "name": "status", "type": "Status" }
              ],
              "compartments": [
                { "name": "billing", "label": "Billing",
                  "attributes": [ { "name": "total", "type": "decimal", "precision": [10, 2] } ] }
              ] },
            { "kind": "entity", "name": "Item", "extends": "Order" },
            { "kind": "enum", "name": "Status",
              "literals": [ { "name": "OPEN", "code": "o", "label": "Open" } ] }
        ]
    }"#;

    #[test]
    fn test_load_orders() {
        let registry = TypeRegistry::builtin();
        let model = load_model(ORDERS, &registry).unwrap();
        assert_eq!(model.elements.len(), 3);

        let order = model.entity(EntityId(0)).unwrap();
        assert_eq!(order.label.as_deref(), Some("Purchase order"));
        assert_eq!(order.constraints[0].params, vec![ConstraintParam::Ident("orders".to_string())]);
        assert_eq!(order.attributes[0].typ, AttrType::Data(DataTypeId::INT));
        assert!(order.attributes[0].key);
        assert_eq!(order.attributes[1].typ, AttrType::Entity(EntityId(1)));
        assert!(order.attributes[1].is_containment());
        assert_eq!(
            order.attributes[1].multiplicity,
            Some(Multiplicity {
                lower: Bound::Many,
                upper: None,
            })
        );
        assert_eq!(order.attributes[2].typ, AttrType::Enum(EnumId(2)));
        assert_eq!(
            order.compartments[0].attributes[0].precision,
            Some(Precision { x: 10, y: Some(2) })
        );

        let item = model.entity(EntityId(1)).unwrap();
        assert_eq!(item.extends, Some(EntityId(0)));
        assert_eq!(model.enumeration(EnumId(2)).unwrap().literals.len(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::builtin();
        let source = r#"{ "elements": [ { "kind": "entity", "name": "A",
            "attributes": [ { "name": "x", "type": "varchar" } ] } ] }"#;
        assert!(matches!(
            load_model(source, &registry),
            Err(DocumentError::UnknownType { name, .. }) if name == "varchar"
        ));
    }

    #[test]
    fn test_unknown_constraint() {
        let registry = TypeRegistry::builtin();
        let source = r#"{ "elements": [ { "kind": "entity", "name": "A",
            "attributes": [ { "name": "x", "type": "int", "constraints": [ { "name": "shiny" } ] } ] } ] }"#;
        assert!(matches!(
            load_model(source, &registry),
            Err(DocumentError::UnknownConstraint { owner, .. }) if owner == "A.x"
        ));
    }

    #[test]
    fn test_duplicate_element() {
        let registry = TypeRegistry::builtin();
        let source = r#"{ "elements": [ { "kind": "entity", "name": "A" }, { "kind": "enum", "name": "A" } ] }"#;
        assert!(matches!(
            load_model(source, &registry),
            Err(DocumentError::DuplicateElement(name)) if name == "A"
        ));
    }

    #[test]
    fn test_extends_enum_rejected() {
        let registry = TypeRegistry::builtin();
        let source = r#"{ "elements": [ { "kind": "enum", "name": "E" },
            { "kind": "entity", "name": "A", "extends": "E" } ] }"#;
        assert!(matches!(
            load_model(source, &registry),
            Err(DocumentError::UnknownExtends { .. })
        ));
    }

    #[test]
    fn test_invalid_bound() {
        let registry = TypeRegistry::builtin();
        let source = r#"{ "elements": [ { "kind": "entity", "name": "A",
            "attributes": [ { "name": "x", "type": "int", "multiplicity": { "lower": "many" } } ] } ] }"#;
        assert!(matches!(
            load_model(source, &registry),
            Err(DocumentError::InvalidBound(s)) if s == "many"
        ));
    }

    #[test]
    fn test_malformed_json() {
        let registry = TypeRegistry::builtin();
        assert!(matches!(load_model("{", &registry), Err(DocumentError::Json(_))));
    }
}
