//! Marker-keyed decode registries
//!
//! Each table owns a registry from a 3-integer marker to the card it carries
//! and how to decode it. The registries are static data built once on first
//! use.

use crate::cursor::{Endian, Layout, unpack};
use crate::error::Result;
use crate::{dynamics, geom1, geom2};
use nas_model::{Entity, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// The 3-integer key opening every data record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Marker(pub i32, pub i32, pub i32);

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Build one entity from exactly one stride of bytes
pub type DecodeFn = fn(&[u8], Endian) -> Result<Entity>;

/// What to do with a record carrying a known marker
#[derive(Clone, Copy)]
pub enum DecodeRule {
    /// Fixed-stride records, each decoded by `decode`
    Decode { stride: usize, decode: DecodeFn },
    /// Recognized but not decoded; the payload is consumed whole
    Skip,
}

impl fmt::Debug for DecodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeRule::Decode { stride, .. } => write!(f, "Decode {{ stride: {stride} }}"),
            DecodeRule::Skip => write!(f, "Skip"),
        }
    }
}

/// A decode rule whose stride comes from `layout`
pub const fn decode(layout: Layout, decode: DecodeFn) -> DecodeRule {
    DecodeRule::Decode {
        stride: layout.stride(),
        decode,
    }
}

/// Unpack a whole record chunk with `layout`
pub fn words(chunk: &[u8], layout: &Layout, endian: Endian) -> Result<Vec<Word>> {
    Ok(unpack(chunk, 0, layout, endian)?.0)
}

/// One registry row
pub type RuleRow = (Marker, &'static str, DecodeRule);

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    /// Card name; empty for records that are known but unnamed
    pub name: &'static str,
    pub rule: DecodeRule,
}

/// Binary tables with a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    Geom1,
    Geom2,
    Dynamics,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Geom1, TableKind::Geom2, TableKind::Dynamics];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Geom1 => "GEOM1",
            TableKind::Geom2 => "GEOM2",
            TableKind::Dynamics => "DYNAMICS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TableKind::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Declared rows of the table's registry
    pub fn rows(self) -> &'static [RuleRow] {
        match self {
            TableKind::Geom1 => geom1::RULES,
            TableKind::Geom2 => geom2::RULES,
            TableKind::Dynamics => dynamics::RULES,
        }
    }

    /// The table's registry
    pub fn registry(self) -> &'static Registry {
        static GEOM1: LazyLock<Registry> = LazyLock::new(|| Registry::new(TableKind::Geom1));
        static GEOM2: LazyLock<Registry> = LazyLock::new(|| Registry::new(TableKind::Geom2));
        static DYNAMICS: LazyLock<Registry> = LazyLock::new(|| Registry::new(TableKind::Dynamics));
        match self {
            TableKind::Geom1 => &GEOM1,
            TableKind::Geom2 => &GEOM2,
            TableKind::Dynamics => &DYNAMICS,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker → rule map of one table
#[derive(Debug)]
pub struct Registry {
    table: TableKind,
    entries: BTreeMap<Marker, RegistryEntry>,
}

impl Registry {
    fn new(table: TableKind) -> Self {
        let entries = table
            .rows()
            .iter()
            .map(|&(marker, name, rule)| (marker, RegistryEntry { name, rule }))
            .collect();
        Registry { table, entries }
    }

    pub fn table(&self) -> TableKind {
        self.table
    }

    pub fn lookup(&self, marker: Marker) -> Option<&RegistryEntry> {
        self.entries.get(&marker)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marker of a decoded card, if the table decodes it
    pub fn marker_of(&self, name: &str) -> Option<Marker> {
        self.entries
            .iter()
            .find(|(_, e)| e.name == name && matches!(e.rule, DecodeRule::Decode { .. }))
            .map(|(&m, _)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Marker, &RegistryEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn markers_are_unique_per_table() {
        for table in TableKind::ALL {
            let rows = table.rows();
            let unique: BTreeSet<Marker> = rows.iter().map(|r| r.0).collect();
            assert_eq!(unique.len(), rows.len(), "{table} has a repeated marker");
            assert_eq!(table.registry().len(), rows.len());
        }
    }

    #[test]
    fn strides_match_the_wire_format() {
        let expected = [
            ("CBAR", 64),
            ("CBEAM", 72),
            ("CDAMP1", 24),
            ("CDAMP2", 24),
            ("CDAMP3", 16),
            ("CDAMP4", 16),
            ("CDAMP5", 16),
            ("CELAS1", 24),
            ("CELAS2", 32),
            ("CELAS3", 16),
            ("CELAS4", 16),
            ("CGAP", 36),
            ("CHBDYG", 64),
            ("CHEXA", 88),
            ("CMASS1", 24),
            ("CMASS2", 24),
            ("CMASS3", 16),
            ("CMASS4", 16),
            ("CONM1", 96),
            ("CONM2", 52),
            ("CONROD", 32),
            ("CONV", 80),
            ("CPENTA", 68),
            ("CQUAD", 44),
            ("CQUAD4", 56),
            ("CQUAD8", 64),
            ("CQUADR", 56),
            ("CQUADX", 56),
            ("CROD", 16),
            ("CTETP", 108),
            ("CTETRA", 48),
            ("CTRIA3", 52),
            ("CTRIA6", 52),
            ("CTUBE", 16),
            ("CVISC", 16),
            ("SPOINT", 4),
        ];
        let registry = TableKind::Geom2.registry();
        for (name, stride) in expected {
            let found: Vec<usize> = registry
                .iter()
                .filter(|(_, e)| e.name == name)
                .filter_map(|(_, e)| match e.rule {
                    DecodeRule::Decode { stride, .. } => Some(stride),
                    DecodeRule::Skip => None,
                })
                .collect();
            assert!(!found.is_empty(), "{name} is not decoded");
            assert!(found.iter().all(|&s| s == stride), "{name} stride {found:?} != {stride}");
        }
        assert_eq!(registry.iter().filter(|(_, e)| e.name == "CQUAD4").count(), 2);
    }

    #[test]
    fn known_markers() {
        assert_eq!(TableKind::Geom2.registry().marker_of("CELAS1"), Some(Marker(601, 6, 73)));
        assert_eq!(TableKind::Geom1.registry().marker_of("GRID"), Some(Marker(4501, 45, 1)));
        assert_eq!(TableKind::Dynamics.registry().marker_of("DAREA"), Some(Marker(27, 17, 182)));
        assert_eq!(TableKind::from_name("geom2"), Some(TableKind::Geom2));
    }
}
