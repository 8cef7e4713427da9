use std::collections::HashSet;

use log::trace;

use crate::ast::{AttrType, Attribute, Element, Entity, Enum, Model, Multiplicity, Precision};
use crate::types::TypeRegistry;
use crate::validate::ValidatedModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Entity,
    /// Entity with two or more key attributes referencing other entities.
    Association,
    Enum,
}

#[derive(Debug, Clone)]
pub struct GraphIR {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub label: Option<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Field(Field),
    Compartment(String),
    Literal { name: String, code: String, label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: bool,
    pub name: String,
    pub label: Option<String>,
    pub type_name: String,
    pub precision: Option<Precision>,
    /// `None` for the default `[1,1]`.
    pub multiplicity: Option<Multiplicity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub key: bool,
    pub name: String,
    pub multiplicity: Option<Multiplicity>,
    pub containment: bool,
}

pub fn node_id(index: usize) -> String {
    format!("n{}", index)
}

impl GraphIR {
    /// Only validated models are exported: every multiplicity is already resolved.
    pub fn from_model(model: &ValidatedModel, registry: &TypeRegistry) -> Self {
        let model: &Model = model;
        let mut ir = GraphIR {
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let mut processed = HashSet::new();

        for (index, element) in model.elements.iter().enumerate() {
            if !processed.insert(index) {
                continue;
            }
            match element {
                Element::Entity(entity) => ir.add_entity(index, entity, model, registry),
                Element::Enum(enumeration) => ir.add_enum(index, enumeration),
            }
        }

        ir
    }

    fn add_entity(&mut self, index: usize, entity: &Entity, model: &Model, registry: &TypeRegistry) {
        let mut rows: Vec<Row> = entity
            .attributes
            .iter()
            .filter_map(|a| field(a, model, registry))
            .map(Row::Field)
            .collect();

        for comp in &entity.compartments {
            rows.push(Row::Compartment(comp.title().to_string()));
            rows.extend(
                comp.attributes
                    .iter()
                    .filter_map(|a| field(a, model, registry))
                    .map(Row::Field),
            );
        }

        let key_references = entity
            .all_attributes()
            .filter(|a| a.key && matches!(a.typ, AttrType::Entity(_)))
            .count();
        let kind = if key_references >= 2 {
            NodeKind::Association
        } else {
            NodeKind::Entity
        };
        trace!(entity = entity.name.as_str(), kind:?; "Entity node");

        let id = node_id(index);
        for attr in entity.all_attributes() {
            if let AttrType::Entity(target) = attr.typ {
                self.edges.push(Edge {
                    from: id.clone(),
                    to: node_id(target.index()),
                    key: attr.key,
                    name: attr.name.clone(),
                    multiplicity: shown_multiplicity(attr),
                    containment: attr.is_containment(),
                });
            }
        }

        self.nodes.push(Node {
            id,
            kind,
            name: entity.name.clone(),
            label: entity.label.clone(),
            rows,
        });
    }

    fn add_enum(&mut self, index: usize, enumeration: &Enum) {
        let rows = enumeration
            .literals
            .iter()
            .map(|lit| Row::Literal {
                name: lit.name.clone(),
                code: lit.code.clone(),
                label: lit.label.clone(),
            })
            .collect();

        self.nodes.push(Node {
            id: node_id(index),
            kind: NodeKind::Enum,
            name: enumeration.name.clone(),
            label: enumeration.label.clone(),
            rows,
        });
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Inline field for scalar and enum typed attributes. References become edges.
fn field(attr: &Attribute, model: &Model, registry: &TypeRegistry) -> Option<Field> {
    if matches!(attr.typ, AttrType::Entity(_)) {
        return None;
    }
    Some(Field {
        key: attr.key,
        name: attr.name.clone(),
        label: attr.label.clone(),
        type_name: model.type_name(&attr.typ, registry).unwrap_or("?").to_string(),
        precision: attr.precision,
        multiplicity: shown_multiplicity(attr),
    })
}

fn shown_multiplicity(attr: &Attribute) -> Option<Multiplicity> {
    attr.multiplicity.filter(|m| !m.is_one())
}
