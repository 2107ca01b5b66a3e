//! Structural grid points and scalar points

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// A structural grid point (GRID)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    /// Node ID
    pub nid: i32,
    /// Coordinate system the location is defined in (0 = basic)
    pub cp: i32,
    /// Location in the `cp` system
    pub xyz: [f64; 3],
    /// Displacement coordinate system
    pub cd: i32,
    /// Permanent single-point constraint components
    pub ps: i32,
    /// Superelement ID
    pub seid: i32,
    /// Canonical node this one was merged into by equivalencing
    #[serde(default)]
    pub replaced_by: Option<i32>,
    /// Comment from the text deck
    #[serde(default)]
    pub comment: String,
}

impl Grid {
    /// Create a node in the basic system
    pub fn new(nid: i32, xyz: [f64; 3]) -> Self {
        Grid {
            nid,
            xyz,
            ..Default::default()
        }
    }

    /// Build from a text card
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(9)?;
        Ok(Grid {
            nid: card.integer(1, "nid")?,
            cp: card.integer_or_blank(2, "cp", 0)?,
            xyz: [
                card.double_or_blank(3, "x1", 0.0)?,
                card.double_or_blank(4, "x2", 0.0)?,
                card.double_or_blank(5, "x3", 0.0)?,
            ],
            cd: card.integer_or_blank(6, "cd", 0)?,
            ps: card.components_or_blank(7, "ps", 0)?,
            seid: card.integer_or_blank(8, "seid", 0)?,
            replaced_by: None,
            comment: comment.to_string(),
        })
    }

    /// Build from a binary tuple `(nid, cp, x1, x2, x3, cd, ps, seid)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        data.require(8)?;
        Ok(Grid {
            nid: data.int(0)?,
            cp: data.int(1)?,
            xyz: data.floats::<3>(2)?,
            cd: data.int(5)?,
            ps: data.int(6)?,
            seid: data.int(7)?,
            replaced_by: None,
            comment: String::new(),
        })
    }

    /// True once equivalencing merged this node into another
    pub fn is_replaced(&self) -> bool {
        self.replaced_by.is_some()
    }
}

impl BulkEntry for Grid {
    fn card_type(&self) -> &str {
        "GRID"
    }

    fn id(&self) -> i32 {
        self.nid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let opt = |v: i32| if v == 0 { Field::Blank } else { Field::Int(v) };
        vec![
            Field::text("GRID"),
            Field::Int(self.nid),
            opt(self.cp),
            Field::Float(self.xyz[0]),
            Field::Float(self.xyz[1]),
            Field::Float(self.xyz[2]),
            opt(self.cd),
            opt(self.ps),
            opt(self.seid),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional(RefTarget::Coord, self.cp, "cp"),
            Reference::optional(RefTarget::Coord, self.cd, "cd"),
        ]
        .into_iter()
        .flatten()
        .filter(|r| r.id > 0)
        .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("GRID", self.nid, "nid", &[self.nid])?;
        if self.cp < 0 {
            return Err(ModelError::verify("GRID", self.nid, format!("cp={} is negative", self.cp)));
        }
        if self.cd < -1 {
            return Err(ModelError::verify("GRID", self.nid, format!("cd={} is invalid", self.cd)));
        }
        if self.xyz.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::verify("GRID", self.nid, "location is not finite"));
        }
        Ok(())
    }
}

/// Parse an SPOINT card into its point IDs (`THRU` ranges expanded)
pub fn spoints_from_card(card: &BdfCard) -> Result<Vec<i32>> {
    let ids = card.integer_list(1, "ids")?;
    if ids.is_empty() {
        return Err(ModelError::field("SPOINT", 1, "ids", "is required but blank"));
    }
    Ok(ids)
}

/// Field list of an SPOINT card holding `ids`
pub fn spoint_fields(ids: &[i32]) -> Vec<Field> {
    std::iter::once(Field::text("SPOINT"))
        .chain(ids.iter().copied().map(Field::Int))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn grid_from_text_with_defaults() {
        let card = BdfCard::from_tokens(&["GRID", "10", "", "1.0", "2.", "-3.5-1"]);
        let grid = Grid::add_card(&card, "node").expect("GRID should parse");
        assert_eq!(grid.nid, 10);
        assert_eq!(grid.cp, 0);
        assert_eq!(grid.xyz, [1.0, 2.0, -0.35]);
        assert_eq!(grid.comment, "node");
        grid.verify().expect("GRID should verify");
    }

    #[test]
    fn grid_rejects_extra_fields() {
        let card = BdfCard::from_tokens(&["GRID", "1", "0", "0.", "0.", "0.", "0", "0", "0", "9"]);
        assert!(Grid::add_card(&card, "").is_err());
    }

    #[test]
    fn grid_binary_matches_text() {
        let words = vec![
            Word::Int(3),
            Word::Int(1),
            Word::Float(1.0),
            Word::Float(0.0),
            Word::Float(2.0),
            Word::Int(0),
            Word::Int(123),
            Word::Int(0),
        ];
        let grid = Grid::add_op2_data(RecordData::new("GRID", &words)).expect("GRID tuple");
        let card = BdfCard::new(grid.raw_fields());
        let back = Grid::add_card(&card, "").expect("GRID text");
        assert_eq!(grid, back);
    }

    #[test]
    fn spoint_thru() {
        let card = BdfCard::from_tokens(&["SPOINT", "1", "THRU", "4", "10"]);
        assert_eq!(spoints_from_card(&card).expect("SPOINT"), vec![1, 2, 3, 4, 10]);
    }
}
