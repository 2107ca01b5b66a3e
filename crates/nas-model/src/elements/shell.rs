//! Shell and membrane elements

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// Shell card variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShellCard {
    Ctria3,
    Ctria6,
    Cquad4,
    Cquadr,
    Cquadx,
    Cquad8,
    Cquad,
    Cshear,
}

impl ShellCard {
    pub fn name(self) -> &'static str {
        match self {
            ShellCard::Ctria3 => "CTRIA3",
            ShellCard::Ctria6 => "CTRIA6",
            ShellCard::Cquad4 => "CQUAD4",
            ShellCard::Cquadr => "CQUADR",
            ShellCard::Cquadx => "CQUADX",
            ShellCard::Cquad8 => "CQUAD8",
            ShellCard::Cquad => "CQUAD",
            ShellCard::Cshear => "CSHEAR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "CTRIA3" => ShellCard::Ctria3,
            "CTRIA6" => ShellCard::Ctria6,
            "CQUAD4" => ShellCard::Cquad4,
            "CQUADR" => ShellCard::Cquadr,
            "CQUADX" => ShellCard::Cquadx,
            "CQUAD8" => ShellCard::Cquad8,
            "CQUAD" => ShellCard::Cquad,
            "CSHEAR" => ShellCard::Cshear,
            _ => return None,
        })
    }

    /// Total node slots
    pub fn node_count(self) -> usize {
        match self {
            ShellCard::Ctria3 => 3,
            ShellCard::Ctria6 => 6,
            ShellCard::Cquad4 | ShellCard::Cquadr | ShellCard::Cquadx | ShellCard::Cshear => 4,
            ShellCard::Cquad8 => 8,
            ShellCard::Cquad => 9,
        }
    }

    /// Corner nodes; the rest are optional mid-side nodes
    pub fn corner_count(self) -> usize {
        match self {
            ShellCard::Ctria3 | ShellCard::Ctria6 => 3,
            _ => 4,
        }
    }

    /// Thickness values carried on the card
    fn thickness_count(self) -> usize {
        match self {
            ShellCard::Ctria3 | ShellCard::Ctria6 => 3,
            ShellCard::Cquad | ShellCard::Cshear => 0,
            _ => 4,
        }
    }
}

/// Material orientation: an angle or a coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThetaMcid {
    /// Angle in degrees
    Theta(f64),
    /// Coordinate system ID
    Mcid(i32),
}

impl Default for ThetaMcid {
    fn default() -> Self {
        ThetaMcid::Theta(0.0)
    }
}

impl ThetaMcid {
    fn from_card(card: &BdfCard, index: usize) -> Result<Self> {
        match card.integer_double_string_or_blank(index, "theta_mcid")? {
            Field::Blank => Ok(ThetaMcid::default()),
            Field::Int(mcid) => Ok(ThetaMcid::Mcid(mcid)),
            Field::Float(theta) => Ok(ThetaMcid::Theta(theta)),
            Field::Text(s) => Err(ModelError::field(
                &card.name(),
                index,
                "theta_mcid",
                format!("expected integer or real, found {s:?}"),
            )),
        }
    }

    fn field(self) -> Field {
        match self {
            ThetaMcid::Theta(t) => Field::Float(t),
            ThetaMcid::Mcid(m) => Field::Int(m),
        }
    }
}

/// A shell element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub card: ShellCard,
    pub eid: i32,
    pub pid: i32,
    /// Connectivity; mid-side slots hold 0 when absent
    pub nodes: Vec<i32>,
    pub theta_mcid: ThetaMcid,
    pub zoffset: f64,
    /// Thickness interpretation flag
    pub tflag: i32,
    /// Corner thicknesses, `None` to take the property thickness
    pub thickness: Vec<Option<f64>>,
    #[serde(default)]
    pub comment: String,
}

/// Text field positions of the options after the node list
struct TextLayout {
    theta: Option<usize>,
    zoffs: Option<usize>,
    tflag: Option<usize>,
    thickness: Option<usize>,
    max_len: usize,
}

fn text_layout(card: ShellCard) -> TextLayout {
    match card {
        ShellCard::Ctria3 => TextLayout {
            theta: Some(6),
            zoffs: Some(7),
            tflag: Some(10),
            thickness: Some(11),
            max_len: 14,
        },
        ShellCard::Cquad4 | ShellCard::Cquadr | ShellCard::Cquadx => TextLayout {
            theta: Some(7),
            zoffs: Some(8),
            tflag: Some(10),
            thickness: Some(11),
            max_len: 15,
        },
        ShellCard::Ctria6 => TextLayout {
            theta: Some(9),
            zoffs: Some(10),
            tflag: Some(14),
            thickness: Some(11),
            max_len: 15,
        },
        ShellCard::Cquad8 => TextLayout {
            theta: Some(15),
            zoffs: Some(16),
            tflag: Some(17),
            thickness: Some(11),
            max_len: 18,
        },
        ShellCard::Cquad => TextLayout {
            theta: Some(12),
            zoffs: None,
            tflag: None,
            thickness: None,
            max_len: 13,
        },
        ShellCard::Cshear => TextLayout {
            theta: None,
            zoffs: None,
            tflag: None,
            thickness: None,
            max_len: 7,
        },
    }
}

impl Shell {
    /// Build from a text card
    pub fn add_card(card_type: ShellCard, card: &BdfCard, comment: &str) -> Result<Self> {
        let layout = text_layout(card_type);
        card.ensure_max_len(layout.max_len)?;
        let eid = card.integer(1, "eid")?;
        let corners = card_type.corner_count();
        let mut nodes = Vec::with_capacity(card_type.node_count());
        for i in 0..card_type.node_count() {
            let node = if i < corners {
                card.integer(3 + i, "node")?
            } else {
                card.integer_or_blank(3 + i, "node", 0)?
            };
            nodes.push(node);
        }
        let thickness = match layout.thickness {
            Some(start) => (0..card_type.thickness_count())
                .map(|i| card.double_or_none(start + i, "thickness"))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Shell {
            card: card_type,
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes,
            theta_mcid: match layout.theta {
                Some(i) => ThetaMcid::from_card(card, i)?,
                None => ThetaMcid::default(),
            },
            zoffset: match layout.zoffs {
                Some(i) => card.double_or_blank(i, "zoffset", 0.0)?,
                None => 0.0,
            },
            tflag: match layout.tflag {
                Some(i) => card.integer_or_blank(i, "tflag", 0)?,
                None => 0,
            },
            thickness,
            comment: comment.to_string(),
        })
    }

    /// Build from a binary tuple
    ///
    /// * CTRIA3: `(eid, pid, n1..n3, theta, zoffs, blank, blank, tflag, t1..t3)`
    /// * CQUAD4/R/X: `(eid, pid, n1..n4, theta, zoffs, blank, tflag, t1..t4)`
    /// * CTRIA6: `(eid, pid, n1..n6, theta, t1..t3, tflag)`
    /// * CQUAD8: `(eid, pid, n1..n8, t1..t4, theta, tflag)`
    /// * CQUAD: `(eid, pid, n1..n9)`
    pub fn add_op2_data(card_type: ShellCard, data: RecordData<'_>) -> Result<Self> {
        let n = card_type.node_count();
        let eid = data.int(0)?;
        let pid = data.int(1)?;
        let nodes = (0..n).map(|i| data.int(2 + i)).collect::<Result<Vec<_>>>()?;
        let floats = |start: usize, count: usize| -> Result<Vec<Option<f64>>> {
            (0..count).map(|i| data.float(start + i).map(Some)).collect()
        };
        let (theta, zoffset, tflag, thickness) = match card_type {
            ShellCard::Ctria3 => (data.float(5)?, data.float(6)?, data.int(9)?, floats(10, 3)?),
            ShellCard::Cquad4 | ShellCard::Cquadr | ShellCard::Cquadx => {
                (data.float(6)?, data.float(7)?, data.int(9)?, floats(10, 4)?)
            }
            ShellCard::Ctria6 => (data.float(8)?, 0.0, data.int(12)?, floats(9, 3)?),
            ShellCard::Cquad8 => (data.float(14)?, 0.0, data.int(15)?, floats(10, 4)?),
            ShellCard::Cquad | ShellCard::Cshear => (0.0, 0.0, 0, Vec::new()),
        };
        Ok(Shell {
            card: card_type,
            eid,
            pid,
            nodes,
            theta_mcid: ThetaMcid::Theta(theta),
            zoffset,
            tflag,
            thickness,
            comment: String::new(),
        })
    }

    /// Non-zero nodes in connectivity order
    pub fn node_ids(&self) -> Vec<i32> {
        self.nodes.iter().copied().filter(|&n| n != 0).collect()
    }
}

impl BulkEntry for Shell {
    fn card_type(&self) -> &str {
        self.card.name()
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let layout = text_layout(self.card);
        let mut fields = vec![Field::Blank; layout.max_len];
        fields[0] = Field::text(self.card.name());
        fields[1] = Field::Int(self.eid);
        fields[2] = Field::Int(self.pid);
        for (i, &n) in self.nodes.iter().enumerate() {
            fields[3 + i] = if n == 0 { Field::Blank } else { Field::Int(n) };
        }
        if let Some(i) = layout.theta {
            fields[i] = self.theta_mcid.field();
        }
        if let Some(i) = layout.zoffs {
            fields[i] = Field::Float(self.zoffset);
        }
        if let Some(i) = layout.tflag {
            fields[i] = Field::Int(self.tflag);
        }
        if let Some(start) = layout.thickness {
            for (i, t) in self.thickness.iter().enumerate() {
                fields[start + i] = Field::opt_float(*t);
            }
        }
        fields
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .node_ids()
            .into_iter()
            .map(|n| Reference::new(RefTarget::Node, n, "nodes"))
            .collect();
        refs.push(Reference::new(RefTarget::Property, self.pid, "pid"));
        if let ThetaMcid::Mcid(mcid) = self.theta_mcid {
            refs.extend(Reference::optional(RefTarget::Coord, mcid, "mcid"));
        }
        refs
    }

    fn verify(&self) -> Result<()> {
        let name = self.card.name();
        verify_positive(name, self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_positive(name, self.eid, "corner nodes", &self.nodes[..self.card.corner_count()])?;
        if self.nodes.len() != self.card.node_count() {
            return Err(ModelError::verify(
                name,
                self.eid,
                format!("expected {} node slots, found {}", self.card.node_count(), self.nodes.len()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn cquad4_binary_to_text() {
        let mut words: Vec<Word> = [11, 1, 1, 2, 3, 4].into_iter().map(Word::Int).collect();
        words.extend([Word::Float(30.0), Word::Float(0.1), Word::Int(0), Word::Int(1)]);
        words.extend([0.5, 0.5, 0.6, 0.6].into_iter().map(Word::Float));
        let quad = Shell::add_op2_data(ShellCard::Cquad4, RecordData::new("CQUAD4", &words))
            .expect("CQUAD4 tuple");
        assert_eq!(quad.nodes, vec![1, 2, 3, 4]);
        assert_eq!(quad.thickness, vec![Some(0.5), Some(0.5), Some(0.6), Some(0.6)]);
        let back = Shell::add_card(ShellCard::Cquad4, &BdfCard::new(quad.raw_fields()), "")
            .expect("CQUAD4 text");
        assert_eq!(quad, back);
    }

    #[test]
    fn ctria3_mcid_from_text() {
        let card = BdfCard::from_tokens(&["CTRIA3", "5", "2", "1", "2", "3", "7"]);
        let tri = Shell::add_card(ShellCard::Ctria3, &card, "").expect("CTRIA3");
        assert_eq!(tri.theta_mcid, ThetaMcid::Mcid(7));
        assert_eq!(tri.thickness, vec![None, None, None]);
        assert!(tri.references().iter().any(|r| r.target == RefTarget::Coord && r.id == 7));
    }

    #[test]
    fn ctria6_missing_midside_nodes() {
        let card = BdfCard::from_tokens(&["CTRIA6", "8", "1", "1", "2", "3", "", "5"]);
        let tri = Shell::add_card(ShellCard::Ctria6, &card, "").expect("CTRIA6");
        assert_eq!(tri.nodes, vec![1, 2, 3, 0, 5, 0]);
        assert_eq!(tri.node_ids(), vec![1, 2, 3, 5]);
        tri.verify().expect("mid-side nodes are optional");
    }

    #[test]
    fn cquad8_round_trip() {
        let mut words: Vec<Word> = (1..=10).map(Word::Int).collect();
        words.extend([0.1, 0.1, 0.1, 0.1, 45.0].into_iter().map(Word::Float));
        words.push(Word::Int(0));
        let quad = Shell::add_op2_data(ShellCard::Cquad8, RecordData::new("CQUAD8", &words))
            .expect("CQUAD8 tuple");
        assert_eq!(quad.theta_mcid, ThetaMcid::Theta(45.0));
        let back = Shell::add_card(ShellCard::Cquad8, &BdfCard::new(quad.raw_fields()), "")
            .expect("CQUAD8 text");
        assert_eq!(quad, back);
    }
}
