//! Storage categories and the card-type to category table

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A storage category of the model graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Nodes,
    Spoints,
    Coords,
    Elements,
    Masses,
    RigidElements,
    Properties,
    PropertiesMass,
    Phbdys,
    Materials,
    ThermalMaterials,
    HyperelasticMaterials,
    Loads,
    Dareas,
    Dloads,
    DloadEntries,
    Delays,
    Bcs,
    Spcs,
    Mpcs,
    Sets,
    SeSets,
    Params,
    Aero,
    Aeros,
    Caeros,
    Paeros,
    Splines,
    Aestats,
    Aelists,
    Aefacts,
    Aelinks,
    Aeparams,
    Gusts,
    Flfacts,
    Flutters,
    Dconstrs,
    Dresps,
    Desvars,
    Ddvals,
    Dvprels,
    Dvmrels,
    Dvcrels,
    Methods,
    Cmethods,
    Tables,
    RandomTables,
    Nlparms,
    Dmigs,
    Dequations,
}

impl Slot {
    /// Every category, in declaration order
    pub const ALL: [Slot; 50] = [
        Slot::Nodes,
        Slot::Spoints,
        Slot::Coords,
        Slot::Elements,
        Slot::Masses,
        Slot::RigidElements,
        Slot::Properties,
        Slot::PropertiesMass,
        Slot::Phbdys,
        Slot::Materials,
        Slot::ThermalMaterials,
        Slot::HyperelasticMaterials,
        Slot::Loads,
        Slot::Dareas,
        Slot::Dloads,
        Slot::DloadEntries,
        Slot::Delays,
        Slot::Bcs,
        Slot::Spcs,
        Slot::Mpcs,
        Slot::Sets,
        Slot::SeSets,
        Slot::Params,
        Slot::Aero,
        Slot::Aeros,
        Slot::Caeros,
        Slot::Paeros,
        Slot::Splines,
        Slot::Aestats,
        Slot::Aelists,
        Slot::Aefacts,
        Slot::Aelinks,
        Slot::Aeparams,
        Slot::Gusts,
        Slot::Flfacts,
        Slot::Flutters,
        Slot::Dconstrs,
        Slot::Dresps,
        Slot::Desvars,
        Slot::Ddvals,
        Slot::Dvprels,
        Slot::Dvmrels,
        Slot::Dvcrels,
        Slot::Methods,
        Slot::Cmethods,
        Slot::Tables,
        Slot::RandomTables,
        Slot::Nlparms,
        Slot::Dmigs,
        Slot::Dequations,
    ];

    /// Category name as used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            Slot::Nodes => "nodes",
            Slot::Spoints => "spoints",
            Slot::Coords => "coords",
            Slot::Elements => "elements",
            Slot::Masses => "masses",
            Slot::RigidElements => "rigid_elements",
            Slot::Properties => "properties",
            Slot::PropertiesMass => "properties_mass",
            Slot::Phbdys => "phbdys",
            Slot::Materials => "materials",
            Slot::ThermalMaterials => "thermal_materials",
            Slot::HyperelasticMaterials => "hyperelastic_materials",
            Slot::Loads => "loads",
            Slot::Dareas => "dareas",
            Slot::Dloads => "dloads",
            Slot::DloadEntries => "dload_entries",
            Slot::Delays => "delays",
            Slot::Bcs => "bcs",
            Slot::Spcs => "spcs",
            Slot::Mpcs => "mpcs",
            Slot::Sets => "sets",
            Slot::SeSets => "se_sets",
            Slot::Params => "params",
            Slot::Aero => "aero",
            Slot::Aeros => "aeros",
            Slot::Caeros => "caeros",
            Slot::Paeros => "paeros",
            Slot::Splines => "splines",
            Slot::Aestats => "aestats",
            Slot::Aelists => "aelists",
            Slot::Aefacts => "aefacts",
            Slot::Aelinks => "aelinks",
            Slot::Aeparams => "aeparams",
            Slot::Gusts => "gusts",
            Slot::Flfacts => "flfacts",
            Slot::Flutters => "flutters",
            Slot::Dconstrs => "dconstrs",
            Slot::Dresps => "dresps",
            Slot::Desvars => "desvars",
            Slot::Ddvals => "ddvals",
            Slot::Dvprels => "dvprels",
            Slot::Dvmrels => "dvmrels",
            Slot::Dvcrels => "dvcrels",
            Slot::Methods => "methods",
            Slot::Cmethods => "cmethods",
            Slot::Tables => "tables",
            Slot::RandomTables => "random_tables",
            Slot::Nlparms => "nlparms",
            Slot::Dmigs => "dmigs",
            Slot::Dequations => "dequations",
        }
    }

    /// Parse a category name
    pub fn from_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Categories whose entries are keyed by a set ID holding several cards
    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Slot::Loads | Slot::Dareas | Slot::DloadEntries | Slot::Bcs | Slot::Spcs | Slot::Mpcs
        )
    }

    /// Categories keyed by name rather than by integer ID
    pub fn is_named(self) -> bool {
        matches!(self, Slot::Params | Slot::Dmigs)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Card types stored in each category
const DEFAULT_SLOTS: &[(Slot, &[&str])] = &[
    (Slot::Nodes, &["GRID"]),
    (Slot::Spoints, &["SPOINT"]),
    (Slot::Coords, &["CORD2R", "CORD2C", "CORD2S"]),
    (
        Slot::Elements,
        &[
            "CELAS1", "CELAS2", "CELAS3", "CELAS4", "CDAMP1", "CDAMP2", "CDAMP3", "CDAMP4",
            "CDAMP5", "CVISC", "CROD", "CTUBE", "CONROD", "CBAR", "CBEAM", "CGAP", "CSHEAR",
            "CTRIA3", "CTRIA6", "CQUAD4", "CQUADR", "CQUADX", "CQUAD8", "CQUAD", "CTETRA",
            "CPENTA", "CHEXA", "CHBDYG",
        ],
    ),
    (Slot::Masses, &["CMASS1", "CMASS2", "CMASS3", "CMASS4", "CONM1", "CONM2"]),
    (Slot::RigidElements, &["RBAR", "RBE2"]),
    (
        Slot::Properties,
        &[
            "PELAS", "PDAMP", "PDAMP5", "PDAMPT", "PVISC", "PROD", "PTUBE", "PBAR", "PSHELL",
            "PCOMP", "PSHEAR", "PSOLID", "PGAP", "PBEAM", "PBUSH",
        ],
    ),
    (Slot::PropertiesMass, &["PMASS"]),
    (Slot::Phbdys, &["PHBDY"]),
    (Slot::Materials, &["MAT1", "MAT8"]),
    (Slot::ThermalMaterials, &["MAT4"]),
    (Slot::HyperelasticMaterials, &["MATHP"]),
    (Slot::Loads, &["FORCE", "MOMENT", "GRAV", "LOAD"]),
    (Slot::Dareas, &["DAREA"]),
    (Slot::Dloads, &["DLOAD"]),
    (Slot::DloadEntries, &["TLOAD1", "TLOAD2", "RLOAD1", "RLOAD2"]),
    (Slot::Delays, &["DELAY"]),
    (Slot::Bcs, &["CONV"]),
    (Slot::Spcs, &["SPC", "SPC1"]),
    (Slot::Mpcs, &["MPC"]),
    (Slot::Sets, &["SET1"]),
    (Slot::SeSets, &["SESET"]),
    (Slot::Params, &["PARAM"]),
    (Slot::Aero, &["AERO"]),
    (Slot::Aeros, &["AEROS"]),
    (Slot::Caeros, &["CAERO1", "CAERO2", "CAERO3", "CAERO4", "CAERO5"]),
    (Slot::Paeros, &["PAERO1", "PAERO2", "PAERO3", "PAERO4", "PAERO5"]),
    (Slot::Splines, &["SPLINE1", "SPLINE2", "SPLINE3", "SPLINE4", "SPLINE5"]),
    (Slot::Aestats, &["AESTAT"]),
    (Slot::Aelists, &["AELIST"]),
    (Slot::Aefacts, &["AEFACT"]),
    (Slot::Aelinks, &["AELINK"]),
    (Slot::Aeparams, &["AEPARM"]),
    (Slot::Gusts, &["GUST"]),
    (Slot::Flfacts, &["FLFACT"]),
    (Slot::Flutters, &["FLUTTER"]),
    (Slot::Dconstrs, &["DCONSTR"]),
    (Slot::Dresps, &["DRESP1", "DRESP2", "DRESP3"]),
    (Slot::Desvars, &["DESVAR"]),
    (Slot::Ddvals, &["DDVAL"]),
    (Slot::Dvprels, &["DVPREL1", "DVPREL2"]),
    (Slot::Dvmrels, &["DVMREL1", "DVMREL2"]),
    (Slot::Dvcrels, &["DVCREL1", "DVCREL2"]),
    (Slot::Methods, &["EIGR", "EIGRL", "EIGB"]),
    (Slot::Cmethods, &["EIGC"]),
    (Slot::Tables, &["TABLED1", "TABLED2", "TABLED3", "TABLED4", "TABLEM1", "TABLES1"]),
    (Slot::RandomTables, &["TABRND1", "TABRNDG"]),
    (Slot::Nlparms, &["NLPARM"]),
    (Slot::Dmigs, &["DMIG"]),
    (Slot::Dequations, &["DEQATN"]),
];

/// Category → card-type table with its inverse
///
/// The inverse map is only rebuilt by an explicit [`SlotConfig::rebuild`]
/// call. Lookups never rebuild on the fly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    slots: BTreeMap<Slot, Vec<String>>,
    #[serde(skip)]
    type_to_slot: BTreeMap<String, Slot>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        let slots = DEFAULT_SLOTS
            .iter()
            .map(|(slot, cards)| (*slot, cards.iter().map(|c| c.to_string()).collect()))
            .collect();
        let mut config = SlotConfig {
            slots,
            type_to_slot: BTreeMap::new(),
        };
        config.rebuild();
        config
    }
}

impl SlotConfig {
    /// Register an additional card type under a category. The inverse map is
    /// stale until [`SlotConfig::rebuild`] is called.
    pub fn register(&mut self, slot: Slot, card_type: &str) {
        let cards = self.slots.entry(slot).or_default();
        let card_type = card_type.to_ascii_uppercase();
        if !cards.contains(&card_type) {
            cards.push(card_type);
        }
    }

    /// Recompute the card-type → category map from the declared table
    pub fn rebuild(&mut self) {
        self.type_to_slot = self
            .slots
            .iter()
            .flat_map(|(slot, cards)| cards.iter().map(move |c| (c.clone(), *slot)))
            .collect();
    }

    /// Card types declared for a category
    pub fn card_types(&self, slot: Slot) -> &[String] {
        self.slots.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Category of a card type
    ///
    /// # Errors
    /// `Configuration` naming the card and listing the known category names.
    pub fn slot_of(&self, card_type: &str) -> Result<Slot> {
        self.type_to_slot.get(card_type).copied().ok_or_else(|| {
            let names = self
                .slots
                .keys()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ");
            ModelError::Configuration(format!(
                "card type {card_type:?} has no storage slot; slots=[{names}]"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_resolves() {
        let config = SlotConfig::default();
        assert_eq!(config.slot_of("CQUAD4").expect("known card"), Slot::Elements);
        assert_eq!(config.slot_of("MAT4").expect("known card"), Slot::ThermalMaterials);
        assert_eq!(config.slot_of("PMASS").expect("known card"), Slot::PropertiesMass);
    }

    #[test]
    fn unknown_card_lists_slots() {
        let config = SlotConfig::default();
        let err = config.slot_of("CFOO").expect_err("unknown card must fail");
        let msg = err.to_string();
        assert!(msg.contains("CFOO"));
        assert!(msg.contains("elements"));
        assert!(msg.contains("rigid_elements"));
    }

    #[test]
    fn register_requires_rebuild() {
        let mut config = SlotConfig::default();
        config.register(Slot::Elements, "cbush");
        assert!(config.slot_of("CBUSH").is_err());
        config.rebuild();
        config.rebuild();
        assert_eq!(config.slot_of("CBUSH").expect("registered card"), Slot::Elements);
    }

    #[test]
    fn slot_names_round_trip() {
        for slot in Slot::ALL {
            assert_eq!(Slot::from_name(slot.name()), Some(slot));
        }
    }
}
