//! Common entity capabilities and the insertion envelope
//!
//! Every bulk-data entity has a stable identity, serializes to a canonical
//! field list, reports the IDs it refers to and can check its own structural
//! validity. [`Entity`] wraps a freshly constructed entity on its way into a
//! [`crate::BdfModel`]; the variant decides the storage category.

use crate::constraints::{Mpc, SpcConstraint};
use crate::coords::Coord;
use crate::elements::Element;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::generic::GenericCard;
use crate::loads::{Conv, Darea, Load};
use crate::masses::Mass;
use crate::materials::{Mat4, StructuralMaterial};
use crate::nodes::Grid;
use crate::params::Param;
use crate::properties::{Pmass, Property};
use crate::rigid::RigidElement;
use crate::sets::Set1;
use crate::slots::Slot;
use crate::writer;
use std::fmt;

/// Category an ID reference points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefTarget {
    /// GRID or SPOINT
    Node,
    /// Coordinate system
    Coord,
    /// Element property
    Property,
    /// Scalar mass property (PMASS)
    MassProperty,
    /// Structural or thermal material
    Material,
    /// Element
    Element,
    /// Static load set
    Load,
    /// Tabular function
    Table,
}

impl RefTarget {
    /// Category label used in lookup errors
    pub fn label(self) -> &'static str {
        match self {
            RefTarget::Node => "Node",
            RefTarget::Coord => "Coord",
            RefTarget::Property => "Property",
            RefTarget::MassProperty => "PropertyMass",
            RefTarget::Material => "Material",
            RefTarget::Element => "Element",
            RefTarget::Load => "Load",
            RefTarget::Table => "Table",
        }
    }
}

/// One outgoing ID reference of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Category the ID lives in
    pub target: RefTarget,
    /// Referenced ID
    pub id: i32,
    /// Field name on the referencing entity
    pub field: &'static str,
}

impl Reference {
    /// Build a reference
    pub fn new(target: RefTarget, id: i32, field: &'static str) -> Self {
        Reference { target, id, field }
    }

    /// Build a reference only when the ID is set (non-zero)
    pub fn optional(target: RefTarget, id: i32, field: &'static str) -> Option<Self> {
        (id != 0).then_some(Reference { target, id, field })
    }
}

/// Capabilities shared by every bulk-data entity
pub trait BulkEntry: fmt::Debug {
    /// Card name, e.g. `CQUAD4`
    fn card_type(&self) -> &str;

    /// Identity within the entity's category
    fn id(&self) -> i32;

    /// Canonical field list, index 0 being the card name
    fn raw_fields(&self) -> Vec<Field>;

    /// Comment carried from the text deck
    fn comment(&self) -> &str {
        ""
    }

    /// IDs this entity refers to in other categories
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Check structural invariants, positive identity by default
    fn verify(&self) -> Result<()> {
        if self.id() <= 0 {
            return Err(ModelError::verify(
                self.card_type(),
                self.id(),
                "id must be a positive integer",
            ));
        }
        Ok(())
    }

    /// Free-field text form of the card
    fn write_card(&self) -> String {
        writer::write_card(self.comment(), &self.raw_fields())
    }
}

/// Check that every listed ID is positive
pub(crate) fn verify_positive(card: &str, id: i32, what: &str, ids: &[i32]) -> Result<()> {
    if let Some(bad) = ids.iter().find(|&&v| v <= 0) {
        return Err(ModelError::verify(card, id, format!("{what} must be positive, found {bad}")));
    }
    Ok(())
}

/// A constructed entity awaiting insertion into a model
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Grid(Grid),
    /// Scalar points, one card may declare many
    SPoints(Vec<i32>),
    Coord(Coord),
    Element(Element),
    Mass(Mass),
    Rigid(RigidElement),
    Property(Property),
    PropertyMass(Pmass),
    Material(StructuralMaterial),
    ThermalMaterial(Mat4),
    Load(Load),
    Darea(Darea),
    Conv(Conv),
    Spc(SpcConstraint),
    Mpc(Mpc),
    Set(Set1),
    Param(Param),
    /// Card stored by identity and raw fields only
    Generic(Slot, GenericCard),
}

impl Entity {
    /// Card name of the wrapped entity
    pub fn card_type(&self) -> &str {
        match self {
            Entity::SPoints(_) => "SPOINT",
            other => other.as_entry().map_or("", |e| e.card_type()),
        }
    }

    /// Identity of the wrapped entity; the first point for SPOINT lists
    pub fn id(&self) -> i32 {
        match self {
            Entity::SPoints(ids) => ids.first().copied().unwrap_or(0),
            other => other.as_entry().map_or(0, |e| e.id()),
        }
    }

    /// Storage category of the wrapped entity
    pub fn slot(&self) -> Slot {
        match self {
            Entity::Grid(_) => Slot::Nodes,
            Entity::SPoints(_) => Slot::Spoints,
            Entity::Coord(_) => Slot::Coords,
            Entity::Element(_) => Slot::Elements,
            Entity::Mass(_) => Slot::Masses,
            Entity::Rigid(_) => Slot::RigidElements,
            Entity::Property(_) => Slot::Properties,
            Entity::PropertyMass(_) => Slot::PropertiesMass,
            Entity::Material(_) => Slot::Materials,
            Entity::ThermalMaterial(_) => Slot::ThermalMaterials,
            Entity::Load(_) => Slot::Loads,
            Entity::Darea(_) => Slot::Dareas,
            Entity::Conv(_) => Slot::Bcs,
            Entity::Spc(_) => Slot::Spcs,
            Entity::Mpc(_) => Slot::Mpcs,
            Entity::Set(_) => Slot::Sets,
            Entity::Param(_) => Slot::Params,
            Entity::Generic(slot, _) => *slot,
        }
    }

    /// The wrapped entity as a trait object; `None` for SPOINT lists
    pub fn as_entry(&self) -> Option<&dyn BulkEntry> {
        let entry: &dyn BulkEntry = match self {
            Entity::SPoints(_) => return None,
            Entity::Grid(e) => e,
            Entity::Coord(e) => e,
            Entity::Element(e) => e,
            Entity::Mass(e) => e,
            Entity::Rigid(e) => e,
            Entity::Property(e) => e,
            Entity::PropertyMass(e) => e,
            Entity::Material(e) => e,
            Entity::ThermalMaterial(e) => e,
            Entity::Load(e) => e,
            Entity::Darea(e) => e,
            Entity::Conv(e) => e,
            Entity::Spc(e) => e,
            Entity::Mpc(e) => e,
            Entity::Set(e) => e,
            Entity::Param(e) => e,
            Entity::Generic(_, e) => e,
        };
        Some(entry)
    }

    /// Structural check of the wrapped entity
    pub fn verify(&self) -> Result<()> {
        match self {
            Entity::SPoints(ids) => verify_positive("SPOINT", self.id(), "point ids", ids),
            other => other.as_entry().map_or(Ok(()), |e| e.verify()),
        }
    }
}
