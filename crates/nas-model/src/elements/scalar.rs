//! Scalar springs, dampers and masses
//!
//! CELASi, CDAMPi, CVISC and CMASSi come in four shapes that differ only in
//! whether the coefficient is a property reference or an inline value and
//! whether the ends are grid/component pairs or scalar points. One struct
//! covers all of them; [`ScalarCard::shape`] picks the field layout.

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// Card variants of the scalar family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarCard {
    Celas1,
    Celas2,
    Celas3,
    Celas4,
    Cdamp1,
    Cdamp2,
    Cdamp3,
    Cdamp4,
    Cdamp5,
    Cvisc,
    Cmass1,
    Cmass2,
    Cmass3,
    Cmass4,
}

/// Field layout of a scalar card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarShape {
    /// `EID PID G1 C1 G2 C2`
    Connection,
    /// `EID VALUE G1 C1 G2 C2`
    ValueConnection,
    /// `EID PID S1 S2`
    Points,
    /// `EID VALUE S1 S2`
    ValuePoints,
}

impl ScalarCard {
    /// Card name
    pub fn name(self) -> &'static str {
        match self {
            ScalarCard::Celas1 => "CELAS1",
            ScalarCard::Celas2 => "CELAS2",
            ScalarCard::Celas3 => "CELAS3",
            ScalarCard::Celas4 => "CELAS4",
            ScalarCard::Cdamp1 => "CDAMP1",
            ScalarCard::Cdamp2 => "CDAMP2",
            ScalarCard::Cdamp3 => "CDAMP3",
            ScalarCard::Cdamp4 => "CDAMP4",
            ScalarCard::Cdamp5 => "CDAMP5",
            ScalarCard::Cvisc => "CVISC",
            ScalarCard::Cmass1 => "CMASS1",
            ScalarCard::Cmass2 => "CMASS2",
            ScalarCard::Cmass3 => "CMASS3",
            ScalarCard::Cmass4 => "CMASS4",
        }
    }

    /// Variant from a card name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "CELAS1" => ScalarCard::Celas1,
            "CELAS2" => ScalarCard::Celas2,
            "CELAS3" => ScalarCard::Celas3,
            "CELAS4" => ScalarCard::Celas4,
            "CDAMP1" => ScalarCard::Cdamp1,
            "CDAMP2" => ScalarCard::Cdamp2,
            "CDAMP3" => ScalarCard::Cdamp3,
            "CDAMP4" => ScalarCard::Cdamp4,
            "CDAMP5" => ScalarCard::Cdamp5,
            "CVISC" => ScalarCard::Cvisc,
            "CMASS1" => ScalarCard::Cmass1,
            "CMASS2" => ScalarCard::Cmass2,
            "CMASS3" => ScalarCard::Cmass3,
            "CMASS4" => ScalarCard::Cmass4,
            _ => return None,
        })
    }

    /// Field layout
    pub fn shape(self) -> ScalarShape {
        use ScalarCard::*;
        match self {
            Celas1 | Cdamp1 | Cmass1 => ScalarShape::Connection,
            Celas2 | Cdamp2 | Cmass2 => ScalarShape::ValueConnection,
            Celas3 | Cdamp3 | Cdamp5 | Cvisc | Cmass3 => ScalarShape::Points,
            Celas4 | Cdamp4 | Cmass4 => ScalarShape::ValuePoints,
        }
    }

    /// True for CMASSi, which live with the masses
    pub fn is_mass(self) -> bool {
        matches!(
            self,
            ScalarCard::Cmass1 | ScalarCard::Cmass2 | ScalarCard::Cmass3 | ScalarCard::Cmass4
        )
    }

    /// Category the property reference points into
    fn property_target(self) -> RefTarget {
        if self.is_mass() {
            RefTarget::MassProperty
        } else {
            RefTarget::Property
        }
    }
}

/// Where a scalar element takes its coefficient from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coefficient {
    /// Property ID
    Property(i32),
    /// Inline stiffness, damping or mass value
    Value(f64),
}

/// A scalar spring, damper or mass element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarElement {
    pub card: ScalarCard,
    pub eid: i32,
    pub coefficient: Coefficient,
    /// End points; 0 means grounded
    pub nodes: [i32; 2],
    /// Component numbers (0 for scalar points)
    pub components: [i32; 2],
    /// Structural damping (CELAS2 only)
    pub ge: f64,
    /// Stress coefficient (CELAS2 only)
    pub s: f64,
    #[serde(default)]
    pub comment: String,
}

impl ScalarElement {
    /// Build from a text card
    pub fn add_card(card_type: ScalarCard, card: &BdfCard, comment: &str) -> Result<Self> {
        let eid = card.integer(1, "eid")?;
        let mut element = ScalarElement {
            card: card_type,
            eid,
            coefficient: Coefficient::Property(eid),
            nodes: [0; 2],
            components: [0; 2],
            ge: 0.0,
            s: 0.0,
            comment: comment.to_string(),
        };
        match card_type.shape() {
            ScalarShape::Connection | ScalarShape::ValueConnection => {
                let max = if card_type == ScalarCard::Celas2 { 9 } else { 7 };
                card.ensure_max_len(max)?;
                element.nodes = [
                    card.integer_or_blank(3, "g1", 0)?,
                    card.integer_or_blank(5, "g2", 0)?,
                ];
                element.components = [
                    card.components_or_blank(4, "c1", 0)?,
                    card.components_or_blank(6, "c2", 0)?,
                ];
                if card_type == ScalarCard::Celas2 {
                    element.ge = card.double_or_blank(7, "ge", 0.0)?;
                    element.s = card.double_or_blank(8, "s", 0.0)?;
                }
            }
            ScalarShape::Points | ScalarShape::ValuePoints => {
                card.ensure_max_len(5)?;
                element.nodes = [
                    card.integer_or_blank(3, "s1", 0)?,
                    card.integer_or_blank(4, "s2", 0)?,
                ];
            }
        }
        element.coefficient = match card_type.shape() {
            ScalarShape::Connection | ScalarShape::Points => {
                Coefficient::Property(card.integer_or_blank(2, "pid", eid)?)
            }
            ScalarShape::ValueConnection | ScalarShape::ValuePoints => {
                Coefficient::Value(card.double_or_blank(2, "value", 0.0)?)
            }
        };
        Ok(element)
    }

    /// Build from a binary tuple
    ///
    /// Connection shapes are `(eid, pid|value, g1, g2, c1, c2[, ge, s])`,
    /// point shapes are `(eid, pid|value, s1, s2)`.
    pub fn add_op2_data(card_type: ScalarCard, data: RecordData<'_>) -> Result<Self> {
        let shape = card_type.shape();
        let eid = data.int(0)?;
        let coefficient = match shape {
            ScalarShape::Connection | ScalarShape::Points => Coefficient::Property(data.int(1)?),
            ScalarShape::ValueConnection | ScalarShape::ValuePoints => {
                Coefficient::Value(data.float(1)?)
            }
        };
        let mut element = ScalarElement {
            card: card_type,
            eid,
            coefficient,
            nodes: data.ints::<2>(2)?,
            components: [0; 2],
            ge: 0.0,
            s: 0.0,
            comment: String::new(),
        };
        if matches!(shape, ScalarShape::Connection | ScalarShape::ValueConnection) {
            element.components = data.ints::<2>(4)?;
        }
        if card_type == ScalarCard::Celas2 {
            element.ge = data.float(6)?;
            element.s = data.float(7)?;
        }
        Ok(element)
    }

    /// Property ID when the coefficient comes from a property
    pub fn pid(&self) -> Option<i32> {
        match self.coefficient {
            Coefficient::Property(pid) => Some(pid),
            Coefficient::Value(_) => None,
        }
    }

    /// Non-grounded end points
    pub fn node_ids(&self) -> Vec<i32> {
        self.nodes.iter().copied().filter(|&n| n != 0).collect()
    }
}

impl BulkEntry for ScalarElement {
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
        let coefficient = match self.coefficient {
            Coefficient::Property(pid) => Field::Int(pid),
            Coefficient::Value(v) => Field::Float(v),
        };
        let node = |n: i32| if n == 0 { Field::Blank } else { Field::Int(n) };
        let mut fields = vec![Field::text(self.card.name()), Field::Int(self.eid), coefficient];
        match self.card.shape() {
            ScalarShape::Connection | ScalarShape::ValueConnection => {
                fields.extend([
                    node(self.nodes[0]),
                    node(self.components[0]),
                    node(self.nodes[1]),
                    node(self.components[1]),
                ]);
                if self.card == ScalarCard::Celas2 {
                    fields.extend([Field::Float(self.ge), Field::Float(self.s)]);
                }
            }
            ScalarShape::Points | ScalarShape::ValuePoints => {
                fields.extend([node(self.nodes[0]), node(self.nodes[1])]);
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
        if let Some(pid) = self.pid() {
            refs.push(Reference::new(self.card.property_target(), pid, "pid"));
        }
        refs
    }

    fn verify(&self) -> Result<()> {
        verify_positive(self.card.name(), self.eid, "eid", &[self.eid])?;
        if let Some(pid) = self.pid() {
            verify_positive(self.card.name(), self.eid, "pid", &[pid])?;
        }
        if self.nodes.iter().any(|&n| n < 0) {
            return Err(ModelError::verify(self.card.name(), self.eid, "node ids must not be negative"));
        }
        if self.nodes == [0, 0] {
            return Err(ModelError::verify(self.card.name(), self.eid, "both ends are grounded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn celas1_text_order_differs_from_binary() {
        let card = BdfCard::from_tokens(&["CELAS1", "1", "2", "10", "1", "20", "3"]);
        let text = ScalarElement::add_card(ScalarCard::Celas1, &card, "").expect("CELAS1");
        let words: Vec<Word> = [1, 2, 10, 20, 1, 3].into_iter().map(Word::Int).collect();
        let binary = ScalarElement::add_op2_data(ScalarCard::Celas1, RecordData::new("CELAS1", &words))
            .expect("CELAS1 tuple");
        assert_eq!(text, binary);
        assert_eq!(text.pid(), Some(2));
        assert_eq!(text.node_ids(), vec![10, 20]);
    }

    #[test]
    fn celas2_round_trip() {
        let words = vec![
            Word::Int(5),
            Word::Float(1000.0),
            Word::Int(1),
            Word::Int(0),
            Word::Int(3),
            Word::Int(0),
            Word::Float(0.02),
            Word::Float(1.5),
        ];
        let spring = ScalarElement::add_op2_data(ScalarCard::Celas2, RecordData::new("CELAS2", &words))
            .expect("CELAS2 tuple");
        let back = ScalarElement::add_card(ScalarCard::Celas2, &BdfCard::new(spring.raw_fields()), "")
            .expect("CELAS2 text");
        assert_eq!(spring, back);
        assert_eq!(spring.node_ids(), vec![1]);
        spring.verify().expect("grounded spring is valid");
    }

    #[test]
    fn cmass3_points_reference_mass_property() {
        let card = BdfCard::from_tokens(&["CMASS3", "7", "", "100", "101"]);
        let mass = ScalarElement::add_card(ScalarCard::Cmass3, &card, "").expect("CMASS3");
        assert_eq!(mass.pid(), Some(7));
        let refs = mass.references();
        assert!(refs.iter().any(|r| r.target == RefTarget::MassProperty && r.id == 7));
    }

    #[test]
    fn fully_grounded_fails_verify() {
        let card = BdfCard::from_tokens(&["CDAMP4", "3", "1.5"]);
        let damper = ScalarElement::add_card(ScalarCard::Cdamp4, &card, "").expect("CDAMP4");
        assert!(damper.verify().is_err());
    }
}
