//! Static loads, dynamic load areas and convection boundary conditions

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// FORCE or MOMENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLoadKind {
    Force,
    Moment,
}

/// A concentrated force or moment at a grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    pub kind: PointLoadKind,
    pub sid: i32,
    pub node: i32,
    pub cid: i32,
    /// Scale factor
    pub mag: f64,
    /// Direction vector
    pub xyz: [f64; 3],
    #[serde(default)]
    pub comment: String,
}

impl PointLoad {
    pub fn add_card(kind: PointLoadKind, card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(8)?;
        Ok(PointLoad {
            kind,
            sid: card.integer(1, "sid")?,
            node: card.integer(2, "node")?,
            cid: card.integer_or_blank(3, "cid", 0)?,
            mag: card.double(4, "mag")?,
            xyz: [
                card.double_or_blank(5, "X1", 0.0)?,
                card.double_or_blank(6, "X2", 0.0)?,
                card.double_or_blank(7, "X3", 0.0)?,
            ],
            comment: comment.to_string(),
        })
    }

    /// Scaled load vector in the load's coordinate system
    pub fn scaled_vector(&self) -> [f64; 3] {
        self.xyz.map(|v| v * self.mag)
    }
}

/// GRAV: gravity acceleration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grav {
    pub sid: i32,
    pub cid: i32,
    /// Acceleration scale factor
    pub scale: f64,
    pub n: [f64; 3],
    /// Main bulk data only flag
    pub mb: i32,
    #[serde(default)]
    pub comment: String,
}

impl Grav {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(8)?;
        let grav = Grav {
            sid: card.integer(1, "sid")?,
            cid: card.integer_or_blank(2, "cid", 0)?,
            scale: card.double(3, "scale")?,
            n: [
                card.double_or_blank(4, "N1", 0.0)?,
                card.double_or_blank(5, "N2", 0.0)?,
                card.double_or_blank(6, "N3", 0.0)?,
            ],
            mb: card.integer_or_blank(7, "mb", 0)?,
            comment: comment.to_string(),
        };
        if grav.n == [0.0; 3] {
            return Err(ModelError::field("GRAV", 4, "N", "direction vector is zero"));
        }
        Ok(grav)
    }
}

/// LOAD: linear combination of load sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCombination {
    pub sid: i32,
    /// Overall scale factor
    pub scale: f64,
    /// (scale, load set) pairs
    pub terms: Vec<(f64, i32)>,
    #[serde(default)]
    pub comment: String,
}

impl LoadCombination {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let mut terms = Vec::new();
        let mut i = 3;
        while i < card.len() {
            terms.push((card.double(i, "scale")?, card.integer(i + 1, "load_id")?));
            i += 2;
        }
        if terms.is_empty() {
            return Err(ModelError::field("LOAD", 3, "scale", "at least one load set is required"));
        }
        Ok(LoadCombination {
            sid: card.integer(1, "sid")?,
            scale: card.double(2, "scale")?,
            terms,
            comment: comment.to_string(),
        })
    }
}

/// A static load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Load {
    Point(PointLoad),
    Grav(Grav),
    Combination(LoadCombination),
}

impl Load {
    /// Load set ID
    pub fn sid(&self) -> i32 {
        match self {
            Load::Point(l) => l.sid,
            Load::Grav(l) => l.sid,
            Load::Combination(l) => l.sid,
        }
    }

    /// Nodes the load acts on
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            Load::Point(l) => vec![l.node],
            Load::Grav(_) | Load::Combination(_) => Vec::new(),
        }
    }

    /// Apply `map` to every loaded node
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        if let Load::Point(l) = self {
            l.node = map(l.node);
        }
    }
}

impl BulkEntry for Load {
    fn card_type(&self) -> &str {
        match self {
            Load::Point(l) => match l.kind {
                PointLoadKind::Force => "FORCE",
                PointLoadKind::Moment => "MOMENT",
            },
            Load::Grav(_) => "GRAV",
            Load::Combination(_) => "LOAD",
        }
    }

    fn id(&self) -> i32 {
        self.sid()
    }

    fn comment(&self) -> &str {
        match self {
            Load::Point(l) => &l.comment,
            Load::Grav(l) => &l.comment,
            Load::Combination(l) => &l.comment,
        }
    }

    fn raw_fields(&self) -> Vec<Field> {
        let name = Field::text(self.card_type());
        match self {
            Load::Point(l) => {
                let mut fields = vec![
                    name,
                    Field::Int(l.sid),
                    Field::Int(l.node),
                    Field::Int(l.cid),
                    Field::Float(l.mag),
                ];
                fields.extend(l.xyz.map(Field::Float));
                fields
            }
            Load::Grav(l) => {
                let mut fields = vec![name, Field::Int(l.sid), Field::Int(l.cid), Field::Float(l.scale)];
                fields.extend(l.n.map(Field::Float));
                fields.push(Field::Int(l.mb));
                fields
            }
            Load::Combination(l) => {
                let mut fields = vec![name, Field::Int(l.sid), Field::Float(l.scale)];
                for &(scale, load_id) in &l.terms {
                    fields.extend([Field::Float(scale), Field::Int(load_id)]);
                }
                fields
            }
        }
    }

    fn references(&self) -> Vec<Reference> {
        match self {
            Load::Point(l) => std::iter::once(Reference::new(RefTarget::Node, l.node, "node"))
                .chain(Reference::optional(RefTarget::Coord, l.cid, "cid"))
                .collect(),
            Load::Grav(l) => Reference::optional(RefTarget::Coord, l.cid, "cid")
                .into_iter()
                .collect(),
            Load::Combination(l) => l
                .terms
                .iter()
                .map(|&(_, load_id)| Reference::new(RefTarget::Load, load_id, "load_ids"))
                .collect(),
        }
    }

    fn verify(&self) -> Result<()> {
        verify_positive(self.card_type(), self.sid(), "sid", &[self.sid()])?;
        if let Load::Combination(l) = self
            && let Some(&(_, own)) = l.terms.iter().find(|(_, id)| *id == l.sid)
        {
            return Err(ModelError::verify("LOAD", l.sid, format!("references its own set {own}")));
        }
        Ok(())
    }
}

/// DAREA: dynamic load scale factor at a grid component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Darea {
    pub sid: i32,
    pub node: i32,
    pub component: i32,
    pub scale: f64,
    #[serde(default)]
    pub comment: String,
}

impl Darea {
    /// A DAREA card defines one or two entries
    pub fn from_card(card: &BdfCard, comment: &str) -> Result<Vec<Self>> {
        card.ensure_max_len(8)?;
        let sid = card.integer(1, "sid")?;
        let mut out = Vec::new();
        for (i, start) in [2, 5].into_iter().enumerate() {
            if i > 0 && (start..start + 3).all(|j| card.field(j).is_blank()) {
                continue;
            }
            out.push(Darea {
                sid,
                node: card.integer(start, "p")?,
                component: card.components_or_blank(start + 1, "c", 0)?,
                scale: card.double(start + 2, "scale")?,
                comment: if i == 0 { comment.to_string() } else { String::new() },
            });
        }
        Ok(out)
    }

    /// `(sid, p, c, a)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        let [sid, node, component] = data.ints::<3>(0)?;
        Ok(Darea {
            sid,
            node,
            component,
            scale: data.float(3)?,
            comment: String::new(),
        })
    }

    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        self.node = map(self.node);
    }
}

impl BulkEntry for Darea {
    fn card_type(&self) -> &str {
        "DAREA"
    }

    fn id(&self) -> i32 {
        self.sid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("DAREA"),
            Field::Int(self.sid),
            Field::Int(self.node),
            Field::Int(self.component),
            Field::Float(self.scale),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Node, self.node, "p")]
    }
}

/// CONV: free convection boundary condition on a surface element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conv {
    /// Surface element
    pub eid: i32,
    /// Convection property
    pub pconid: i32,
    /// Point for film temperature
    pub flmnd: i32,
    /// Control point for free convection
    pub cntrlnd: i32,
    /// Ambient points
    pub ta: [i32; 8],
    /// Ambient point weights, written after `ta` when any differs from 1.0
    pub weights: [f64; 8],
    #[serde(default)]
    pub comment: String,
}

impl Conv {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(21)?;
        let ta1 = card.integer_or_blank(5, "TA1", 0)?;
        let mut ta = [ta1; 8];
        for (i, slot) in ta.iter_mut().enumerate().skip(1) {
            *slot = card.integer_or_blank(5 + i, "TA", ta1)?;
        }
        let mut weights = [1.0; 8];
        for (i, slot) in weights.iter_mut().enumerate() {
            *slot = card.double_or_blank(13 + i, "WT", 1.0)?;
        }
        Ok(Conv {
            eid: card.integer(1, "eid")?,
            pconid: card.integer(2, "pconid")?,
            flmnd: card.integer_or_blank(3, "flmnd", 0)?,
            cntrlnd: card.integer_or_blank(4, "cntrlnd", 0)?,
            ta,
            weights,
            comment: comment.to_string(),
        })
    }

    /// `(eid, pconid, flmnd, cntrlnd, ta1..ta8, wt1..wt8)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        let [eid, pconid, flmnd, cntrlnd] = data.ints::<4>(0)?;
        Ok(Conv {
            eid,
            pconid,
            flmnd,
            cntrlnd,
            ta: data.ints::<8>(4)?,
            weights: data.floats::<8>(12)?,
            comment: String::new(),
        })
    }

    /// Apply `map` to the film, control and ambient points
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        for n in [&mut self.flmnd, &mut self.cntrlnd].into_iter().chain(self.ta.iter_mut()) {
            if *n > 0 {
                *n = map(*n);
            }
        }
    }
}

impl BulkEntry for Conv {
    fn card_type(&self) -> &str {
        "CONV"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CONV"),
            Field::Int(self.eid),
            Field::Int(self.pconid),
            Field::Int(self.flmnd),
            Field::Int(self.cntrlnd),
        ];
        fields.extend(self.ta.map(Field::Int));
        if self.weights.iter().any(|&w| w != 1.0) {
            fields.extend(self.weights.map(Field::Float));
        }
        fields
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Element, self.eid, "eid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CONV", self.eid, "eid/pconid", &[self.eid, self.pconid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn force_scaled_vector() {
        let card = BdfCard::from_tokens(&["FORCE", "1", "10", "", "100.", "0.", "0.", "1."]);
        let force = PointLoad::add_card(PointLoadKind::Force, &card, "").expect("FORCE");
        assert_eq!(force.scaled_vector(), [0.0, 0.0, 100.0]);
        let load = Load::Point(force);
        assert_eq!(load.card_type(), "FORCE");
        assert_eq!(load.references().len(), 1);
    }

    #[test]
    fn load_combination_terms() {
        let card = BdfCard::from_tokens(&["LOAD", "100", "1.", "2.", "1", "0.5", "2"]);
        let load = Load::Combination(LoadCombination::add_card(&card, "").expect("LOAD"));
        let ids: Vec<i32> = load.references().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        load.verify().expect("LOAD should verify");
    }

    #[test]
    fn darea_binary_and_text_agree() {
        let card = BdfCard::from_tokens(&["DAREA", "3", "6", "2", "8.2", "15", "1", "10.1"]);
        let areas = Darea::from_card(&card, "").expect("DAREA");
        assert_eq!(areas.len(), 2);
        let words = vec![Word::Int(3), Word::Int(15), Word::Int(1), Word::Float(10.1)];
        let binary = Darea::add_op2_data(RecordData::new("DAREA", &words)).expect("DAREA tuple");
        assert_eq!(areas[1], binary);
    }

    #[test]
    fn conv_ambient_points_default_to_first() {
        let card = BdfCard::from_tokens(&["CONV", "101", "1", "", "", "201"]);
        let conv = Conv::add_card(&card, "").expect("CONV");
        assert_eq!(conv.ta, [201; 8]);
        assert_eq!(conv.weights, [1.0; 8]);
        assert_eq!(conv.raw_fields().len(), 13);
    }

    #[test]
    fn conv_weights_survive_the_text_card() {
        let mut words = vec![Word::Int(101), Word::Int(1), Word::Int(0), Word::Int(0)];
        words.extend((201..209).map(Word::Int));
        words.extend([0.5, 0.25, 0.125, 1.0, 2.0, 0.75, 1.5, 3.0].map(Word::Float));
        let binary = Conv::add_op2_data(RecordData::new("CONV", &words)).expect("CONV tuple");
        assert_eq!(binary.raw_fields().len(), 21);

        let text = Conv::add_card(&BdfCard::new(binary.raw_fields()), "").expect("CONV text");
        assert_eq!(text, binary);
    }
}
