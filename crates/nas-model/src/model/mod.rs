//! The model graph: one ID-keyed arena per entity category
//!
//! Entities own no references to each other. Relations are stored as IDs
//! and resolved on demand through the lookup layer ([`get`]), the derived
//! indices ([`maps`]) and the cross-reference views ([`xref`]).

pub mod get;
pub mod maps;
pub mod write;
pub mod xref;

use crate::cards::entities_from_card;
use crate::constraints::{Mpc, SpcConstraint};
use crate::coords::{Coord, CoordKind};
use crate::elements::Element;
use crate::entity::{BulkEntry, Entity};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::generic::GenericCard;
use crate::loads::{Conv, Darea, Load};
use crate::masses::Mass;
use crate::materials::{Mat4, StructuralMaterial};
use crate::nodes::Grid;
use crate::params::Param;
use crate::properties::{Pmass, Property};
use crate::rigid::RigidElement;
use crate::sets::Set1;
use crate::slots::{Slot, SlotConfig};
use nas_bdf::Deck;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// How entities are inserted into a model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Replace an existing entity with the same key instead of failing
    #[serde(default)]
    pub allow_overwrites: bool,
    /// Category → card-type table
    #[serde(default)]
    pub slots: SlotConfig,
}

/// A card the model has no storage category for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCard {
    pub card_type: String,
    pub line: usize,
}

/// In-memory bulk-data model
///
/// Single-entry categories map an ID to one entity. Load, constraint and
/// boundary-condition categories map a set ID to every entry of that set in
/// insertion order.
#[derive(Debug, Clone)]
pub struct BdfModel {
    pub nodes: BTreeMap<i32, Grid>,
    pub spoints: BTreeSet<i32>,
    pub coords: BTreeMap<i32, Coord>,
    pub elements: BTreeMap<i32, Element>,
    pub masses: BTreeMap<i32, Mass>,
    pub rigid_elements: BTreeMap<i32, RigidElement>,
    pub properties: BTreeMap<i32, Property>,
    pub properties_mass: BTreeMap<i32, Pmass>,
    pub materials: BTreeMap<i32, StructuralMaterial>,
    pub thermal_materials: BTreeMap<i32, Mat4>,
    pub loads: BTreeMap<i32, Vec<Load>>,
    pub dareas: BTreeMap<i32, Vec<Darea>>,
    pub bcs: BTreeMap<i32, Vec<Conv>>,
    pub spcs: BTreeMap<i32, Vec<SpcConstraint>>,
    pub mpcs: BTreeMap<i32, Vec<Mpc>>,
    pub sets: BTreeMap<i32, Set1>,
    pub params: BTreeMap<String, Param>,
    /// DMIG header and column cards, grouped by matrix name
    pub dmigs: BTreeMap<String, Vec<GenericCard>>,
    pub dload_entries: BTreeMap<i32, Vec<GenericCard>>,
    /// Every other identity-only category
    pub generic: BTreeMap<Slot, BTreeMap<i32, GenericCard>>,
    /// Number of cards read per card type
    pub card_count: BTreeMap<String, usize>,
    /// Cards skipped because no category stores them
    pub rejected: Vec<RejectedCard>,
    config: ModelConfig,
    is_xref: bool,
}

impl Default for BdfModel {
    fn default() -> Self {
        BdfModel::new(ModelConfig::default())
    }
}

impl BdfModel {
    /// An empty model holding only the basic coordinate system
    ///
    /// The card-type → category map is rebuilt once here, so a table loaded
    /// from configuration is consistent before the first card arrives.
    pub fn new(mut config: ModelConfig) -> Self {
        config.slots.rebuild();
        let basic = Coord {
            kind: CoordKind::Rectangular,
            cid: 0,
            rid: 0,
            a: [0.0; 3],
            b: [0.0, 0.0, 1.0],
            c: [1.0, 0.0, 0.0],
            comment: String::new(),
        };
        BdfModel {
            nodes: BTreeMap::new(),
            spoints: BTreeSet::new(),
            coords: BTreeMap::from([(0, basic)]),
            elements: BTreeMap::new(),
            masses: BTreeMap::new(),
            rigid_elements: BTreeMap::new(),
            properties: BTreeMap::new(),
            properties_mass: BTreeMap::new(),
            materials: BTreeMap::new(),
            thermal_materials: BTreeMap::new(),
            loads: BTreeMap::new(),
            dareas: BTreeMap::new(),
            bcs: BTreeMap::new(),
            spcs: BTreeMap::new(),
            mpcs: BTreeMap::new(),
            sets: BTreeMap::new(),
            params: BTreeMap::new(),
            dmigs: BTreeMap::new(),
            dload_entries: BTreeMap::new(),
            generic: BTreeMap::new(),
            card_count: BTreeMap::new(),
            rejected: Vec::new(),
            config,
            is_xref: false,
        }
    }

    /// Build a model from a tokenized text deck
    ///
    /// Cards of unknown type are rejected with a warning and counted. Cards
    /// that fail to build are collected and reported together.
    pub fn build_from_deck(deck: &Deck, config: ModelConfig) -> Result<Self> {
        let mut model = BdfModel::new(config);
        let mut errors = Vec::new();

        for raw in &deck.cards {
            let card = BdfCard::from_tokens(&raw.fields);
            let card_type = card.name();
            if model.config.slots.slot_of(&card_type).is_err() {
                warn!(card = %card_type, line = raw.line_start, "rejecting card with no storage category");
                model.rejected.push(RejectedCard {
                    card_type,
                    line: raw.line_start,
                });
                continue;
            }
            let entities = match entities_from_card(&card, &raw.comment, &model.config.slots) {
                Ok(entities) => entities,
                Err(e) => {
                    errors.push(format!("line {}: {e}", raw.line_start));
                    continue;
                }
            };
            for entity in entities {
                if let Err(e) = model.add_entity(entity) {
                    errors.push(format!("line {}: {e}", raw.line_start));
                }
            }
        }

        if !errors.is_empty() {
            return Err(ModelError::Deck { messages: errors });
        }
        info!(
            cards = deck.cards.len(),
            rejected = model.rejected.len(),
            nodes = model.nodes.len(),
            elements = model.elements.len(),
            "built model from deck"
        );
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn slot_config(&self) -> &SlotConfig {
        &self.config.slots
    }

    /// Register an extra card type and rebuild the card-type → category map
    pub fn register_card_type(&mut self, slot: Slot, card_type: &str) {
        self.config.slots.register(slot, card_type);
        self.config.slots.rebuild();
    }

    /// Recompute the card-type → category map from the declared table
    pub fn rebuild_slot_map(&mut self) {
        self.config.slots.rebuild();
    }

    /// True after a successful [`BdfModel::cross_reference`]
    pub fn is_xref(&self) -> bool {
        self.is_xref
    }

    /// Insert one entity into its category and count its card type
    ///
    /// # Errors
    /// `Duplicate` / `DuplicateName` when the key is taken and overwrites are
    /// disabled.
    pub fn add_entity(&mut self, entity: Entity) -> Result<()> {
        let card_type = entity.card_type().to_string();
        let allow = self.config.allow_overwrites;
        match entity {
            Entity::Grid(e) => insert(&mut self.nodes, "Node", e.nid, e, allow)?,
            Entity::SPoints(ids) => self.spoints.extend(ids),
            Entity::Coord(e) => insert(&mut self.coords, "Coord", e.cid, e, allow)?,
            Entity::Element(e) => insert(&mut self.elements, "Element", e.eid(), e, allow)?,
            Entity::Mass(e) => insert(&mut self.masses, "Mass", e.id(), e, allow)?,
            Entity::Rigid(e) => insert(&mut self.rigid_elements, "RigidElement", e.id(), e, allow)?,
            Entity::Property(e) => insert(&mut self.properties, "Property", e.pid(), e, allow)?,
            Entity::PropertyMass(e) => insert(&mut self.properties_mass, "PropertyMass", e.pid, e, allow)?,
            Entity::Material(e) => insert(&mut self.materials, "Material", e.id(), e, allow)?,
            Entity::ThermalMaterial(e) => insert(&mut self.thermal_materials, "ThermalMaterial", e.mid, e, allow)?,
            Entity::Load(e) => self.loads.entry(e.sid()).or_default().push(e),
            Entity::Darea(e) => self.dareas.entry(e.sid).or_default().push(e),
            Entity::Conv(e) => self.bcs.entry(e.eid).or_default().push(e),
            Entity::Spc(e) => self.spcs.entry(e.sid()).or_default().push(e),
            Entity::Mpc(e) => self.mpcs.entry(e.sid).or_default().push(e),
            Entity::Set(e) => insert(&mut self.sets, "Set", e.sid, e, allow)?,
            Entity::Param(e) => insert_named(&mut self.params, "PARAM", e.key.clone(), e, allow)?,
            Entity::Generic(Slot::Dmigs, e) => {
                let name = e.name.clone().unwrap_or_default();
                insert_dmig(&mut self.dmigs, name, e, allow)?
            }
            Entity::Generic(Slot::DloadEntries, e) => self.dload_entries.entry(e.id).or_default().push(e),
            Entity::Generic(slot, e) => {
                let arena = self.generic.entry(slot).or_default();
                insert(arena, slot.name(), e.id, e, allow)?
            }
        }
        *self.card_count.entry(card_type).or_insert(0) += 1;
        self.is_xref = false;
        Ok(())
    }

    /// Entities stored in a category, as trait objects in ID order
    ///
    /// SPOINTs carry no entity and are not listed.
    pub fn slot_entries(&self, slot: Slot) -> Vec<&dyn BulkEntry> {
        fn single<T: BulkEntry>(map: &BTreeMap<i32, T>) -> Vec<&dyn BulkEntry> {
            map.values().map(|e| e as &dyn BulkEntry).collect()
        }
        fn multi<T: BulkEntry>(map: &BTreeMap<i32, Vec<T>>) -> Vec<&dyn BulkEntry> {
            map.values().flatten().map(|e| e as &dyn BulkEntry).collect()
        }
        match slot {
            Slot::Nodes => single(&self.nodes),
            Slot::Spoints => Vec::new(),
            Slot::Coords => self
                .coords
                .values()
                .filter(|c| c.cid != 0)
                .map(|e| e as &dyn BulkEntry)
                .collect(),
            Slot::Elements => single(&self.elements),
            Slot::Masses => single(&self.masses),
            Slot::RigidElements => single(&self.rigid_elements),
            Slot::Properties => single(&self.properties),
            Slot::PropertiesMass => single(&self.properties_mass),
            Slot::Materials => single(&self.materials),
            Slot::ThermalMaterials => single(&self.thermal_materials),
            Slot::Loads => multi(&self.loads),
            Slot::Dareas => multi(&self.dareas),
            Slot::Bcs => multi(&self.bcs),
            Slot::Spcs => multi(&self.spcs),
            Slot::Mpcs => multi(&self.mpcs),
            Slot::Sets => single(&self.sets),
            Slot::Params => self.params.values().map(|e| e as &dyn BulkEntry).collect(),
            Slot::Dmigs => self.dmigs.values().flatten().map(|e| e as &dyn BulkEntry).collect(),
            Slot::DloadEntries => multi(&self.dload_entries),
            other => self.generic.get(&other).map(single).unwrap_or_default(),
        }
    }

    /// Number of stored entries in a category
    pub fn slot_len(&self, slot: Slot) -> usize {
        match slot {
            Slot::Spoints => self.spoints.len(),
            other => self.slot_entries(other).len(),
        }
    }

    /// Every node ID, GRIDs and SPOINTs together
    pub fn node_ids(&self) -> BTreeSet<i32> {
        self.nodes.keys().chain(&self.spoints).copied().collect()
    }

    /// Check every entity's own invariants, stopping at the first failure
    pub fn verify(&self) -> Result<()> {
        for slot in Slot::ALL {
            for entry in self.slot_entries(slot) {
                entry.verify()?;
            }
        }
        debug!("model verified");
        Ok(())
    }
}

fn insert<T>(map: &mut BTreeMap<i32, T>, category: &'static str, id: i32, entity: T, allow: bool) -> Result<()> {
    if !allow && map.contains_key(&id) {
        return Err(ModelError::Duplicate { category, id });
    }
    map.insert(id, entity);
    Ok(())
}

fn insert_named<T>(
    map: &mut BTreeMap<String, T>,
    category: &'static str,
    name: String,
    entity: T,
    allow: bool,
) -> Result<()> {
    if !allow && map.contains_key(&name) {
        return Err(ModelError::DuplicateName { category, name });
    }
    map.insert(name, entity);
    Ok(())
}

/// Add a DMIG card to its matrix
///
/// Column cards append. A second header (column index 0) for the same name
/// is a duplicate unless overwrites are allowed, in which case the matrix
/// starts over from that header.
fn insert_dmig(map: &mut BTreeMap<String, Vec<GenericCard>>, name: String, card: GenericCard, allow: bool) -> Result<()> {
    fn is_header(card: &GenericCard) -> bool {
        matches!(card.field(2), Field::Int(0))
    }
    let Some(cards) = map.get_mut(&name) else {
        map.insert(name, vec![card]);
        return Ok(());
    };
    if is_header(&card) && cards.iter().any(is_header) {
        if !allow {
            return Err(ModelError::DuplicateName { category: "DMIG", name });
        }
        cards.clear();
    }
    cards.push(card);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
SPOINT,10,11
CROD,5,7,1,2
PROD,7,3,0.5
MAT1,3,2.0+5,,0.3
FORCE,100,2,,10.,1.,0.,0.
FORCE,100,1,,5.,1.,0.,0.
PARAM,POST,-1
EIGRL,20,,,6
CFOO,1,2
ENDDATA
";

    fn model() -> BdfModel {
        let deck = Deck::parse_str(DECK).expect("deck should parse");
        BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("model should build")
    }

    #[test]
    fn categories_are_filled() {
        let model = model();
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.spoints.len(), 2);
        assert_eq!(model.loads[&100].len(), 2);
        assert_eq!(model.slot_len(Slot::Methods), 1);
        assert_eq!(model.card_count["FORCE"], 2);
        assert_eq!(model.rejected.len(), 1);
        assert_eq!(model.rejected[0].card_type, "CFOO");
        model.verify().expect("model should verify");
    }

    #[test]
    fn duplicates_fail_unless_allowed() {
        let mut model = model();
        let err = model
            .add_entity(Entity::Grid(Grid::new(1, [5.0; 3])))
            .expect_err("node 1 exists");
        assert_eq!(err, ModelError::Duplicate { category: "Node", id: 1 });

        let mut model = BdfModel::new(ModelConfig {
            allow_overwrites: true,
            ..ModelConfig::default()
        });
        model.add_entity(Entity::Grid(Grid::new(1, [0.0; 3]))).expect("first");
        model.add_entity(Entity::Grid(Grid::new(1, [5.0; 3]))).expect("overwrite");
        assert_eq!(model.nodes[&1].xyz, [5.0; 3]);
    }

    #[test]
    fn dmig_columns_stay_with_their_header() {
        let text = "DMIG,STIF,0,6,1,0\nDMIG,STIF,1,1,,1,1,1.5\nDMIG,STIF,2,3,,2,3,2.5\n";
        let deck = Deck::parse_str(text).expect("deck should parse");
        let mut model = BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("columns are not duplicates");
        let matrix = model.dmig("stif").expect("STIF");
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[2].field(2), &Field::Int(2));
        assert_eq!(model.card_count["DMIG"], 3);
        assert_eq!(model.write_bulk().lines().filter(|l| l.starts_with("DMIG,STIF")).count(), 3);

        let header = BdfCard::from_tokens(&["DMIG", "STIF", "0", "6", "1", "0"]);
        let again = entities_from_card(&header, "", &SlotConfig::default()).expect("DMIG");
        let err = model
            .add_entity(again.into_iter().next().expect("one entity"))
            .expect_err("second header");
        assert!(matches!(err, ModelError::DuplicateName { category: "DMIG", .. }));
    }

    #[test]
    fn bad_cards_are_reported_together() {
        let deck = Deck::parse_str("GRID,x\nGRID,1\nCROD,2,1,1\n").expect("deck should parse");
        let err = BdfModel::build_from_deck(&deck, ModelConfig::default()).expect_err("two bad cards");
        match err {
            ModelError::Deck { messages } => assert_eq!(messages.len(), 2),
            other => panic!("unexpected error {other}"),
        }
    }
}
