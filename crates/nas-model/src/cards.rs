//! Text-card construction: card name → entity constructor

use crate::constraints::{Mpc, Spc, Spc1, SpcConstraint};
use crate::coords::Coord;
use crate::elements::{
    Cbar, Cbeam, Cgap, Chbdyg, Conrod, Element, Rod, RodCard, ScalarCard, ScalarElement, Shell,
    ShellCard, Solid,
};
use crate::entity::Entity;
use crate::error::{ModelError, Result};
use crate::field::BdfCard;
use crate::generic::GenericCard;
use crate::loads::{Conv, Darea, Grav, Load, LoadCombination, PointLoad, PointLoadKind};
use crate::masses::{Conm1, Conm2, Mass};
use crate::materials::{Mat1, Mat4, Mat8, StructuralMaterial};
use crate::nodes::{Grid, spoints_from_card};
use crate::params::Param;
use crate::properties::{
    Pbar, Pcomp, Pdamp, Pdamp5, Pdampt, Pelas, Pmass, Property, Prod, Pshear, Pshell, Psolid,
    Ptube, Pvisc,
};
use crate::rigid::{Rbar, Rbe2, RigidElement};
use crate::sets::Set1;
use crate::slots::{Slot, SlotConfig};

/// Build the entities defined by one text card
///
/// Most cards define one entity; multi-entry cards (PELAS, PDAMP, PVISC,
/// PMASS, DAREA) may define several.
///
/// # Errors
/// `Configuration` for card types without a storage slot, `Field` for
/// malformed fields.
pub fn entities_from_card(card: &BdfCard, comment: &str, slots: &SlotConfig) -> Result<Vec<Entity>> {
    let name = card.name();
    let slot = slots.slot_of(&name)?;

    if let Some(scalar) = ScalarCard::from_name(&name) {
        let element = ScalarElement::add_card(scalar, card, comment)?;
        return if scalar.is_mass() {
            one(Entity::Mass(Mass::Scalar(element)))
        } else {
            one(Entity::Element(Element::Scalar(element)))
        };
    }
    if let Some(shell) = ShellCard::from_name(&name) {
        return one(Entity::Element(Element::Shell(Shell::add_card(shell, card, comment)?)));
    }

    match name.as_str() {
        "GRID" => one(Entity::Grid(Grid::add_card(card, comment)?)),
        "SPOINT" => one(Entity::SPoints(spoints_from_card(card)?)),
        "CORD2R" | "CORD2C" | "CORD2S" => one(Entity::Coord(Coord::add_card(card, comment)?)),

        "CROD" => one(element(Element::Rod(Rod::add_card(RodCard::Crod, card, comment)?))),
        "CTUBE" => one(element(Element::Rod(Rod::add_card(RodCard::Ctube, card, comment)?))),
        "CONROD" => one(element(Element::Conrod(Conrod::add_card(card, comment)?))),
        "CBAR" => one(element(Element::Bar(Cbar::add_card(card, comment)?))),
        "CBEAM" => one(element(Element::Beam(Cbeam::add_card(card, comment)?))),
        "CGAP" => one(element(Element::Gap(Cgap::add_card(card, comment)?))),
        "CTETRA" | "CPENTA" | "CHEXA" => one(element(Element::Solid(Solid::add_card(card, comment)?))),
        "CHBDYG" => one(element(Element::Chbdyg(Chbdyg::add_card(card, comment)?))),

        "CONM1" => one(Entity::Mass(Mass::Conm1(Conm1::add_card(card, comment)?))),
        "CONM2" => one(Entity::Mass(Mass::Conm2(Conm2::add_card(card, comment)?))),
        "RBAR" => one(Entity::Rigid(RigidElement::Rbar(Rbar::add_card(card, comment)?))),
        "RBE2" => one(Entity::Rigid(RigidElement::Rbe2(Rbe2::add_card(card, comment)?))),

        "PELAS" => Ok(properties(Pelas::from_card(card, comment)?, Property::Pelas)),
        "PDAMP" => Ok(properties(Pdamp::from_card(card, comment)?, Property::Pdamp)),
        "PVISC" => Ok(properties(Pvisc::from_card(card, comment)?, Property::Pvisc)),
        "PDAMP5" => one(property(Property::Pdamp5(Pdamp5::add_card(card, comment)?))),
        "PDAMPT" => one(property(Property::Pdampt(Pdampt::add_card(card, comment)?))),
        "PROD" => one(property(Property::Prod(Prod::add_card(card, comment)?))),
        "PTUBE" => one(property(Property::Ptube(Ptube::add_card(card, comment)?))),
        "PBAR" => one(property(Property::Pbar(Pbar::add_card(card, comment)?))),
        "PSHEAR" => one(property(Property::Pshear(Pshear::add_card(card, comment)?))),
        "PSHELL" => one(property(Property::Pshell(Pshell::add_card(card, comment)?))),
        "PCOMP" => one(property(Property::Pcomp(Pcomp::add_card(card, comment)?))),
        "PSOLID" => one(property(Property::Psolid(Psolid::add_card(card, comment)?))),
        "PMASS" => Ok(Pmass::from_card(card, comment)?
            .into_iter()
            .map(Entity::PropertyMass)
            .collect()),

        "MAT1" => one(Entity::Material(StructuralMaterial::Mat1(Mat1::add_card(card, comment)?))),
        "MAT8" => one(Entity::Material(StructuralMaterial::Mat8(Mat8::add_card(card, comment)?))),
        "MAT4" => one(Entity::ThermalMaterial(Mat4::add_card(card, comment)?)),

        "FORCE" => one(load(Load::Point(PointLoad::add_card(PointLoadKind::Force, card, comment)?))),
        "MOMENT" => one(load(Load::Point(PointLoad::add_card(PointLoadKind::Moment, card, comment)?))),
        "GRAV" => one(load(Load::Grav(Grav::add_card(card, comment)?))),
        "LOAD" => one(load(Load::Combination(LoadCombination::add_card(card, comment)?))),
        "DAREA" => Ok(Darea::from_card(card, comment)?.into_iter().map(Entity::Darea).collect()),
        "CONV" => one(Entity::Conv(Conv::add_card(card, comment)?)),

        "SPC" => one(Entity::Spc(SpcConstraint::Spc(Spc::add_card(card, comment)?))),
        "SPC1" => one(Entity::Spc(SpcConstraint::Spc1(Spc1::add_card(card, comment)?))),
        "MPC" => one(Entity::Mpc(Mpc::add_card(card, comment)?)),
        "SET1" => one(Entity::Set(Set1::add_card(card, comment)?)),
        "PARAM" => one(Entity::Param(Param::add_card(card, comment)?)),

        _ => one(generic(slot, card, comment)?),
    }
}

fn one(entity: Entity) -> Result<Vec<Entity>> {
    Ok(vec![entity])
}

fn element(element: Element) -> Entity {
    Entity::Element(element)
}

fn property(property: Property) -> Entity {
    Entity::Property(property)
}

fn properties<T>(items: Vec<T>, wrap: fn(T) -> Property) -> Vec<Entity> {
    items.into_iter().map(|p| Entity::Property(wrap(p))).collect()
}

fn load(load: Load) -> Entity {
    Entity::Load(load)
}

/// Cards kept by identity only. A registered card type in a typed category
/// with no dedicated constructor is a registry mismatch.
fn generic(slot: Slot, card: &BdfCard, comment: &str) -> Result<Entity> {
    match slot {
        Slot::Dmigs => Ok(Entity::Generic(slot, GenericCard::add_named_card(card, comment)?)),
        Slot::Properties => Ok(Entity::Property(Property::Other(GenericCard::add_card(card, comment)?))),
        Slot::Nodes
        | Slot::Spoints
        | Slot::Coords
        | Slot::Elements
        | Slot::Masses
        | Slot::RigidElements
        | Slot::PropertiesMass
        | Slot::Materials
        | Slot::ThermalMaterials
        | Slot::Loads
        | Slot::Dareas
        | Slot::Bcs
        | Slot::Spcs
        | Slot::Mpcs
        | Slot::Sets
        | Slot::Params => Err(ModelError::Configuration(format!(
            "card type {:?} is registered under {slot} but has no constructor",
            card.name()
        ))),
        _ => Ok(Entity::Generic(slot, GenericCard::add_card(card, comment)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(tokens: &[&str]) -> Result<Vec<Entity>> {
        entities_from_card(&BdfCard::from_tokens(tokens), "", &SlotConfig::default())
    }

    #[test]
    fn cmass_goes_to_masses() {
        let entities = build(&["CMASS2", "5", "0.1", "1", "3"]).expect("CMASS2");
        assert_eq!(entities[0].slot(), Slot::Masses);
        let entities = build(&["CELAS2", "6", "1.0+3", "1", "3"]).expect("CELAS2");
        assert_eq!(entities[0].slot(), Slot::Elements);
    }

    #[test]
    fn multi_entry_cards() {
        let entities = build(&["PELAS", "1", "100.", "", "", "2", "200."]).expect("PELAS");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].id(), 2);
    }

    #[test]
    fn generic_and_named_cards() {
        let entities = build(&["EIGRL", "10", "", "", "6"]).expect("EIGRL");
        assert_eq!(entities[0].slot(), Slot::Methods);
        let entities = build(&["DMIG", "K2GG", "0", "6", "1"]).expect("DMIG");
        assert_eq!(entities[0].slot(), Slot::Dmigs);
        let entities = build(&["PBUSH", "7", "K", "1.0"]).expect("PBUSH");
        assert_eq!(entities[0].slot(), Slot::Properties);
    }

    #[test]
    fn unknown_card_is_a_configuration_error() {
        let err = build(&["CFOO", "1"]).expect_err("CFOO has no slot");
        assert!(matches!(err, ModelError::Configuration(_)));
        assert!(err.to_string().contains("nodes"));
    }

    #[test]
    fn registered_card_without_constructor() {
        let mut slots = SlotConfig::default();
        slots.register(Slot::Elements, "CBUSH");
        slots.rebuild();
        let err = entities_from_card(&BdfCard::from_tokens(&["CBUSH", "1"]), "", &slots)
            .expect_err("CBUSH has no constructor");
        assert!(matches!(err, ModelError::Configuration(_)));
    }
}
