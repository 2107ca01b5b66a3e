//! Heat-transfer boundary surface elements

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// Surface types of CHBDYG and their binary codes
const SURFACE_TYPES: [(i32, &str); 5] = [
    (3, "REV"),
    (4, "AREA3"),
    (5, "AREA4"),
    (7, "AREA6"),
    (8, "AREA8"),
];

/// CHBDYG: geometric surface element for thermal boundary conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chbdyg {
    pub eid: i32,
    /// REV, AREA3, AREA4, AREA6 or AREA8
    pub surface_type: String,
    pub iview_front: i32,
    pub iview_back: i32,
    pub rad_mid_front: i32,
    pub rad_mid_back: i32,
    /// Up to eight surface nodes, 0 when unused
    pub nodes: [i32; 8],
    #[serde(default)]
    pub comment: String,
}

impl Chbdyg {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(17)?;
        let surface_type = card.string(3, "Type")?;
        if !SURFACE_TYPES.iter().any(|(_, name)| *name == surface_type) {
            return Err(ModelError::field(
                "CHBDYG",
                3,
                "Type",
                format!("unknown surface type {surface_type:?}"),
            ));
        }
        let mut nodes = [0; 8];
        for (i, node) in nodes.iter_mut().enumerate() {
            *node = card.integer_or_blank(9 + i, "node", 0)?;
        }
        Ok(Chbdyg {
            eid: card.integer(1, "eid")?,
            surface_type,
            iview_front: card.integer_or_blank(4, "iview_front", 0)?,
            iview_back: card.integer_or_blank(5, "iview_back", 0)?,
            rad_mid_front: card.integer_or_blank(6, "rad_mid_front", 0)?,
            rad_mid_back: card.integer_or_blank(7, "rad_mid_back", 0)?,
            nodes,
            comment: comment.to_string(),
        })
    }

    /// `(eid, blank, type, iviewf, iviewb, radmidf, radmidb, blank, g1..g8)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        data.require(16)?;
        let code = data.int(2)?;
        let surface_type = SURFACE_TYPES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| name.to_string())
            .ok_or_else(|| {
                ModelError::field("CHBDYG", 2, "Type", format!("unknown surface type code {code}"))
            })?;
        Ok(Chbdyg {
            eid: data.int(0)?,
            surface_type,
            iview_front: data.int(3)?,
            iview_back: data.int(4)?,
            rad_mid_front: data.int(5)?,
            rad_mid_back: data.int(6)?,
            nodes: data.ints::<8>(8)?,
            comment: String::new(),
        })
    }

    /// Non-zero surface nodes
    pub fn node_ids(&self) -> Vec<i32> {
        self.nodes.iter().copied().filter(|&n| n != 0).collect()
    }
}

impl BulkEntry for Chbdyg {
    fn card_type(&self) -> &str {
        "CHBDYG"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let opt = |v: i32| if v == 0 { Field::Blank } else { Field::Int(v) };
        let mut fields = vec![
            Field::text("CHBDYG"),
            Field::Int(self.eid),
            Field::Blank,
            Field::text(&self.surface_type),
            opt(self.iview_front),
            opt(self.iview_back),
            opt(self.rad_mid_front),
            opt(self.rad_mid_back),
            Field::Blank,
        ];
        fields.extend(self.nodes.iter().map(|&n| opt(n)));
        fields
    }

    fn references(&self) -> Vec<Reference> {
        self.node_ids()
            .into_iter()
            .map(|n| Reference::new(RefTarget::Node, n, "nodes"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CHBDYG", self.eid, "eid", &[self.eid])?;
        if self.node_ids().is_empty() {
            return Err(ModelError::verify("CHBDYG", self.eid, "no surface nodes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn binary_type_code_maps_to_name() {
        let mut words: Vec<Word> = [20, 0, 5, 0, 0, 0, 0, 0].into_iter().map(Word::Int).collect();
        words.extend([1, 2, 3, 4, 0, 0, 0, 0].into_iter().map(Word::Int));
        let surface = Chbdyg::add_op2_data(RecordData::new("CHBDYG", &words)).expect("CHBDYG");
        assert_eq!(surface.surface_type, "AREA4");
        assert_eq!(surface.node_ids(), vec![1, 2, 3, 4]);
        let back = Chbdyg::add_card(&BdfCard::new(surface.raw_fields()), "").expect("CHBDYG text");
        assert_eq!(surface, back);
    }

    #[test]
    fn unknown_surface_type() {
        let card = BdfCard::from_tokens(&["CHBDYG", "1", "", "AREA5"]);
        assert!(Chbdyg::add_card(&card, "").is_err());
    }
}
