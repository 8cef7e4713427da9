//! Resolved ER model tree.
//!
//! Cross references are arena ids into [`Model::elements`], so every
//! attribute type and `extends` link already points at a concrete element.

use std::fmt;

use crate::types::{ConstraintTypeId, DataTypeId, TypeRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl EnumId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Entity(Entity),
    Enum(Enum),
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::Entity(e) => &e.name,
            Element::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub label: Option<String>,
    pub extends: Option<EntityId>,
    pub constraints: Vec<Constraint>,
    pub desc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub compartments: Vec<Compartment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compartment {
    pub name: String,
    pub label: Option<String>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub label: Option<String>,
    pub typ: AttrType,
    pub precision: Option<Precision>,
    pub multiplicity: Option<Multiplicity>,
    /// Part of the entity's identifying key.
    pub key: bool,
    pub constraints: Vec<Constraint>,
    pub reference: Option<Reference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Data(DataTypeId),
    Entity(EntityId),
    Enum(EnumId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub x: u32,
    pub y: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub other_side: Option<String>,
    pub containment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Number(u32),
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplicity {
    pub lower: Bound,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub label: Option<String>,
    pub literals: Vec<EnumLiteral>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLiteral {
    pub name: String,
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintTypeId,
    pub params: Vec<ConstraintParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintParam {
    Int(i64),
    Str(String),
    Ident(String),
}

impl Model {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        match self.elements.get(id.0) {
            Some(Element::Entity(e)) => Some(e),
            _ => None,
        }
    }

    pub fn enumeration(&self, id: EnumId) -> Option<&Enum> {
        match self.elements.get(id.0) {
            Some(Element::Enum(e)) => Some(e),
            _ => None,
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.elements.iter().filter_map(|e| match e {
            Element::Entity(entity) => Some(entity),
            Element::Enum(_) => None,
        })
    }

    /// Display name of an attribute type: the scalar, entity or enum name.
    pub fn type_name<'a>(&'a self, typ: &AttrType, registry: &'a TypeRegistry) -> Option<&'a str> {
        match *typ {
            AttrType::Data(id) => registry.get_data_type(id).map(|t| t.name.as_str()),
            AttrType::Entity(id) => self.entity(id).map(|e| e.name.as_str()),
            AttrType::Enum(id) => self.enumeration(id).map(|e| e.name.as_str()),
        }
    }
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            extends: None,
            constraints: Vec::new(),
            desc: None,
            attributes: Vec::new(),
            compartments: Vec::new(),
        }
    }

    /// Free attributes followed by every compartment's attributes.
    pub fn all_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .chain(self.compartments.iter().flat_map(|c| c.attributes.iter()))
    }
}

impl Compartment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            attributes: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

impl Attribute {
    pub fn new(name: impl Into<String>, typ: AttrType) -> Self {
        Self {
            name: name.into(),
            label: None,
            typ,
            precision: None,
            multiplicity: None,
            key: false,
            constraints: Vec::new(),
            reference: None,
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_multiplicity(mut self, lower: Bound, upper: Option<Bound>) -> Self {
        self.multiplicity = Some(Multiplicity { lower, upper });
        self
    }

    pub fn with_precision(mut self, x: u32, y: Option<u32>) -> Self {
        self.precision = Some(Precision { x, y });
        self
    }

    pub fn with_constraint(mut self, kind: ConstraintTypeId) -> Self {
        self.constraints.push(Constraint::new(kind));
        self
    }

    pub fn with_reference(mut self, other_side: Option<&str>, containment: bool) -> Self {
        self.reference = Some(Reference {
            other_side: other_side.map(str::to_string),
            containment,
        });
        self
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        match self.typ {
            AttrType::Entity(id) => Some(id),
            _ => None,
        }
    }

    pub fn other_side(&self) -> Option<&str> {
        self.reference.as_ref().and_then(|r| r.other_side.as_deref())
    }

    pub fn is_containment(&self) -> bool {
        self.reference.as_ref().is_some_and(|r| r.containment)
    }
}

impl Enum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            literals: Vec::new(),
        }
    }

    pub fn literal(mut self, name: &str, code: &str, label: &str) -> Self {
        self.literals.push(EnumLiteral {
            name: name.to_string(),
            code: code.to_string(),
            label: label.to_string(),
        });
        self
    }
}

impl Constraint {
    pub fn new(kind: ConstraintTypeId) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }
}

/// Find the constraint of the given kind attached to an entity or attribute.
pub fn get_constraint<'a>(
    constraints: &'a [Constraint],
    registry: &TypeRegistry,
    name: &str,
) -> Option<&'a Constraint> {
    let kind = registry.constraint_type(name)?;
    constraints.iter().find(|c| c.kind == kind)
}

impl Multiplicity {
    pub const ONE: Self = Self {
        lower: Bound::Number(1),
        upper: Some(Bound::Number(1)),
    };

    pub fn is_one(&self) -> bool {
        *self == Self::ONE
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{}", n),
            Bound::Many => f.write_str("*"),
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{},{}]", self.lower, upper),
            None => write!(f, "[{}]", self.lower),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_attributes_order() {
        let mut entity = Entity::new("Person");
        entity.attributes.push(Attribute::new("name", AttrType::Data(DataTypeId::STRING)));
        let mut comp = Compartment::new("contact");
        comp.attributes.push(Attribute::new("email", AttrType::Data(DataTypeId::STRING)));
        comp.attributes.push(Attribute::new("phone", AttrType::Data(DataTypeId::STRING)));
        entity.compartments.push(comp);

        let names: Vec<&str> = entity.all_attributes().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "phone"]);
    }

    #[test]
    fn test_type_name_resolution() {
        let registry = TypeRegistry::builtin();
        let model = Model {
            elements: vec![
                Element::Entity(Entity::new("Order")),
                Element::Enum(Enum::new("Status")),
            ],
        };
        assert_eq!(model.type_name(&AttrType::Data(DataTypeId::DATE), &registry), Some("date"));
        assert_eq!(model.type_name(&AttrType::Entity(EntityId(0)), &registry), Some("Order"));
        assert_eq!(model.type_name(&AttrType::Enum(EnumId(1)), &registry), Some("Status"));
        assert_eq!(model.type_name(&AttrType::Entity(EntityId(1)), &registry), None);
    }

    #[test]
    fn test_get_constraint() {
        let registry = TypeRegistry::builtin();
        let unique = registry.constraint_type("unique").unwrap();
        let attr = Attribute::new("code", AttrType::Data(DataTypeId::STRING)).with_constraint(unique);
        assert!(get_constraint(&attr.constraints, &registry, "unique").is_some());
        assert!(get_constraint(&attr.constraints, &registry, "email").is_none());
        assert!(get_constraint(&attr.constraints, &registry, "nonexistent").is_none());
    }

    #[test]
    fn test_multiplicity_display() {
        let m = Multiplicity {
            lower: Bound::Number(0),
            upper: Some(Bound::Many),
        };
        assert_eq!(m.to_string(), "[0,*]");
        assert!(Multiplicity::ONE.is_one());
        assert!(!m.is_one());
    }
}
