//! Concentrated and scalar mass elements

use crate::elements::ScalarElement;
use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// CONM2: lumped mass with offset and inertia
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conm2 {
    pub eid: i32,
    pub nid: i32,
    pub cid: i32,
    pub mass: f64,
    /// Offset from the node
    pub x: [f64; 3],
    /// I11, I21, I22, I31, I32, I33
    pub inertia: [f64; 6],
    #[serde(default)]
    pub comment: String,
}

impl Conm2 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(15)?;
        let mut x = [0.0; 3];
        for (i, v) in x.iter_mut().enumerate() {
            *v = card.double_or_blank(5 + i, "x", 0.0)?;
        }
        let mut inertia = [0.0; 6];
        for (i, v) in inertia.iter_mut().enumerate() {
            *v = card.double_or_blank(9 + i, "I", 0.0)?;
        }
        Ok(Conm2 {
            eid: card.integer(1, "eid")?,
            nid: card.integer(2, "nid")?,
            cid: card.integer_or_blank(3, "cid", 0)?,
            mass: card.double_or_blank(4, "mass", 0.0)?,
            x,
            inertia,
            comment: comment.to_string(),
        })
    }

    /// `(eid, g, cid, m, x1, x2, x3, i11, i21, i22, i31, i32, i33)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        let [eid, nid, cid] = data.ints::<3>(0)?;
        Ok(Conm2 {
            eid,
            nid,
            cid,
            mass: data.float(3)?,
            x: data.floats::<3>(4)?,
            inertia: data.floats::<6>(7)?,
            comment: String::new(),
        })
    }
}

impl BulkEntry for Conm2 {
    fn card_type(&self) -> &str {
        "CONM2"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CONM2"),
            Field::Int(self.eid),
            Field::Int(self.nid),
            Field::Int(self.cid),
            Field::Float(self.mass),
        ];
        fields.extend(self.x.map(Field::Float));
        fields.push(Field::Blank);
        fields.extend(self.inertia.map(Field::Float));
        fields
    }

    fn references(&self) -> Vec<Reference> {
        std::iter::once(Reference::new(RefTarget::Node, self.nid, "nid"))
            .chain(Reference::optional(RefTarget::Coord, self.cid, "cid").filter(|r| r.id > 0))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CONM2", self.eid, "eid/nid", &[self.eid, self.nid])?;
        if self.mass < 0.0 {
            return Err(ModelError::verify("CONM2", self.eid, format!("mass={} is negative", self.mass)));
        }
        Ok(())
    }
}

/// CONM1: 6x6 symmetric mass matrix, lower triangle stored row by row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conm1 {
    pub eid: i32,
    pub nid: i32,
    pub cid: i32,
    pub mass_matrix: [f64; 21],
    #[serde(default)]
    pub comment: String,
}

impl Conm1 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(25)?;
        let mut mass_matrix = [0.0; 21];
        for (i, v) in mass_matrix.iter_mut().enumerate() {
            *v = card.double_or_blank(4 + i, "M", 0.0)?;
        }
        Ok(Conm1 {
            eid: card.integer(1, "eid")?,
            nid: card.integer(2, "nid")?,
            cid: card.integer_or_blank(3, "cid", 0)?,
            mass_matrix,
            comment: comment.to_string(),
        })
    }

    /// `(eid, g, cid, m11, m21, m22, ..., m66)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        let [eid, nid, cid] = data.ints::<3>(0)?;
        Ok(Conm1 {
            eid,
            nid,
            cid,
            mass_matrix: data.floats::<21>(3)?,
            comment: String::new(),
        })
    }

    /// Full symmetric 6x6 mass matrix
    pub fn matrix(&self) -> nalgebra::Matrix6<f64> {
        let mut m = nalgebra::Matrix6::zeros();
        let mut k = 0;
        for i in 0..6 {
            for j in 0..=i {
                m[(i, j)] = self.mass_matrix[k];
                m[(j, i)] = self.mass_matrix[k];
                k += 1;
            }
        }
        m
    }
}

impl BulkEntry for Conm1 {
    fn card_type(&self) -> &str {
        "CONM1"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CONM1"),
            Field::Int(self.eid),
            Field::Int(self.nid),
            Field::Int(self.cid),
        ];
        fields.extend(self.mass_matrix.map(Field::Float));
        fields
    }

    fn references(&self) -> Vec<Reference> {
        std::iter::once(Reference::new(RefTarget::Node, self.nid, "nid"))
            .chain(Reference::optional(RefTarget::Coord, self.cid, "cid").filter(|r| r.id > 0))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CONM1", self.eid, "eid/nid", &[self.eid, self.nid])
    }
}

/// A mass element of any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mass {
    /// CMASS1-4
    Scalar(ScalarElement),
    Conm1(Conm1),
    Conm2(Conm2),
}

impl Mass {
    fn entry(&self) -> &dyn BulkEntry {
        match self {
            Mass::Scalar(e) => e,
            Mass::Conm1(e) => e,
            Mass::Conm2(e) => e,
        }
    }

    /// Nodes the mass is attached to
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            Mass::Scalar(e) => e.node_ids(),
            Mass::Conm1(e) => vec![e.nid],
            Mass::Conm2(e) => vec![e.nid],
        }
    }

    /// Apply `map` to every attached node
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        match self {
            Mass::Scalar(e) => {
                for n in e.nodes.iter_mut().filter(|n| **n != 0) {
                    *n = map(*n);
                }
            }
            Mass::Conm1(e) => e.nid = map(e.nid),
            Mass::Conm2(e) => e.nid = map(e.nid),
        }
    }
}

impl BulkEntry for Mass {
    fn card_type(&self) -> &str {
        self.entry().card_type()
    }

    fn id(&self) -> i32 {
        self.entry().id()
    }

    fn comment(&self) -> &str {
        self.entry().comment()
    }

    fn raw_fields(&self) -> Vec<Field> {
        self.entry().raw_fields()
    }

    fn references(&self) -> Vec<Reference> {
        self.entry().references()
    }

    fn verify(&self) -> Result<()> {
        self.entry().verify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn conm2_binary_round_trip() {
        let mut words = vec![Word::Int(100), Word::Int(5), Word::Int(0)];
        words.extend([2.5, 0.1, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0].into_iter().map(Word::Float));
        let conm = Conm2::add_op2_data(RecordData::new("CONM2", &words)).expect("CONM2 tuple");
        assert_eq!(conm.mass, 2.5);
        assert_eq!(conm.inertia, [1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let back = Conm2::add_card(&BdfCard::new(conm.raw_fields()), "").expect("CONM2 text");
        assert_eq!(conm, back);
    }

    #[test]
    fn conm1_matrix_is_symmetric() {
        let mut words = vec![Word::Int(1), Word::Int(2), Word::Int(0)];
        words.extend((1..=21).map(|v| Word::Float(v as f64)));
        let conm = Conm1::add_op2_data(RecordData::new("CONM1", &words)).expect("CONM1 tuple");
        let m = conm.matrix();
        assert_eq!(m, m.transpose());
        assert_eq!(m[(5, 5)], 21.0);
        assert_eq!(m[(1, 0)], 2.0);
    }

    #[test]
    fn negative_mass_fails_verify() {
        let card = BdfCard::from_tokens(&["CONM2", "1", "2", "", "-1.0"]);
        let conm = Conm2::add_card(&card, "").expect("CONM2");
        assert!(conm.verify().is_err());
    }
}
