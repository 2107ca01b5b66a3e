//! Scalar element properties: springs, dampers, viscous dampers, masses
//!
//! Several of these cards pack more than one property per card. The
//! `from_card` constructors return every property the card defines.

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::Result;
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// Split a card into the positions of its repeated property groups
fn groups(card: &BdfCard, width: usize, stride: usize, count: usize) -> Vec<usize> {
    (0..count)
        .map(|i| 1 + i * stride)
        .filter(|&start| (start..start + width).any(|j| !card.field(j).is_blank()))
        .collect()
}

/// PELAS: scalar spring property, two per card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pelas {
    pub pid: i32,
    pub k: f64,
    pub ge: f64,
    pub s: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pelas {
    pub fn from_card(card: &BdfCard, comment: &str) -> Result<Vec<Self>> {
        card.ensure_max_len(9)?;
        groups(card, 4, 4, 2)
            .into_iter()
            .enumerate()
            .map(|(i, start)| {
                Ok(Pelas {
                    pid: card.integer(start, "pid")?,
                    k: card.double(start + 1, "k")?,
                    ge: card.double_or_blank(start + 2, "ge", 0.0)?,
                    s: card.double_or_blank(start + 3, "s", 0.0)?,
                    comment: if i == 0 { comment.to_string() } else { String::new() },
                })
            })
            .collect()
    }
}

impl BulkEntry for Pelas {
    fn card_type(&self) -> &str {
        "PELAS"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PELAS"),
            Field::Int(self.pid),
            Field::Float(self.k),
            Field::Float(self.ge),
            Field::Float(self.s),
        ]
    }
}

/// PDAMP: scalar damper property, up to four per card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pdamp {
    pub pid: i32,
    /// Damping coefficient
    pub b: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pdamp {
    pub fn from_card(card: &BdfCard, comment: &str) -> Result<Vec<Self>> {
        card.ensure_max_len(9)?;
        groups(card, 2, 2, 4)
            .into_iter()
            .enumerate()
            .map(|(i, start)| {
                Ok(Pdamp {
                    pid: card.integer(start, "pid")?,
                    b: card.double(start + 1, "b")?,
                    comment: if i == 0 { comment.to_string() } else { String::new() },
                })
            })
            .collect()
    }
}

impl BulkEntry for Pdamp {
    fn card_type(&self) -> &str {
        "PDAMP"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![Field::text("PDAMP"), Field::Int(self.pid), Field::Float(self.b)]
    }
}

/// PDAMP5: heat-transfer damper property referencing a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pdamp5 {
    pub pid: i32,
    pub mid: i32,
    /// Damping multiplier
    pub b: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pdamp5 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(4)?;
        Ok(Pdamp5 {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            b: card.double(3, "b")?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Pdamp5 {
    fn card_type(&self) -> &str {
        "PDAMP5"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PDAMP5"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Float(self.b),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Material, self.mid, "mid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PDAMP5", self.pid, "pid/mid", &[self.pid, self.mid])
    }
}

/// PDAMPT: frequency-dependent damper property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pdampt {
    pub pid: i32,
    /// Table of damping versus frequency, 0 when unset
    pub tbid: i32,
    #[serde(default)]
    pub comment: String,
}

impl Pdampt {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(3)?;
        Ok(Pdampt {
            pid: card.integer(1, "pid")?,
            tbid: card.integer_or_blank(2, "tbid", 0)?,
            comment: comment.to_string(),
        })
    }

    /// Damping table, `None` when unset
    pub fn tbid(&self) -> Option<i32> {
        (self.tbid != 0).then_some(self.tbid)
    }
}

impl BulkEntry for Pdampt {
    fn card_type(&self) -> &str {
        "PDAMPT"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PDAMPT"),
            Field::Int(self.pid),
            Field::opt_int(self.tbid()),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        Reference::optional(RefTarget::Table, self.tbid, "tbid")
            .into_iter()
            .collect()
    }
}

/// PVISC: viscous damper property, two per card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pvisc {
    pub pid: i32,
    /// Extensional damping
    pub ce: f64,
    /// Rotational damping
    pub cr: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pvisc {
    pub fn from_card(card: &BdfCard, comment: &str) -> Result<Vec<Self>> {
        card.ensure_max_len(8)?;
        groups(card, 3, 4, 2)
            .into_iter()
            .enumerate()
            .map(|(i, start)| {
                Ok(Pvisc {
                    pid: card.integer(start, "pid")?,
                    ce: card.double(start + 1, "ce")?,
                    cr: card.double_or_blank(start + 2, "cr", 0.0)?,
                    comment: if i == 0 { comment.to_string() } else { String::new() },
                })
            })
            .collect()
    }
}

impl BulkEntry for Pvisc {
    fn card_type(&self) -> &str {
        "PVISC"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PVISC"),
            Field::Int(self.pid),
            Field::Float(self.ce),
            Field::Float(self.cr),
        ]
    }
}

/// PMASS: scalar mass property, up to four per card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pmass {
    pub pid: i32,
    pub mass: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pmass {
    pub fn from_card(card: &BdfCard, comment: &str) -> Result<Vec<Self>> {
        card.ensure_max_len(9)?;
        groups(card, 2, 2, 4)
            .into_iter()
            .enumerate()
            .map(|(i, start)| {
                Ok(Pmass {
                    pid: card.integer(start, "pid")?,
                    mass: card.double_or_blank(start + 1, "mass", 0.0)?,
                    comment: if i == 0 { comment.to_string() } else { String::new() },
                })
            })
            .collect()
    }
}

impl BulkEntry for Pmass {
    fn card_type(&self) -> &str {
        "PMASS"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![Field::text("PMASS"), Field::Int(self.pid), Field::Float(self.mass)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdamp_packs_several_properties() {
        let card = BdfCard::from_tokens(&["PDAMP", "1", "10.", "2", "20.", "", "", "4", "40."]);
        let props = Pdamp::from_card(&card, "dampers").expect("PDAMP");
        let pids: Vec<i32> = props.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 2, 4]);
        assert_eq!(props[2].b, 40.0);
        assert_eq!(props[0].comment, "dampers");
        assert_eq!(props[1].comment, "");
    }

    #[test]
    fn pvisc_second_group_starts_at_field_five() {
        let card = BdfCard::from_tokens(&["PVISC", "3", "1.5", "", "", "4", "2.5", "0.5"]);
        let props = Pvisc::from_card(&card, "").expect("PVISC");
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].cr, 0.0);
        assert_eq!(props[1].pid, 4);
        assert_eq!(props[1].cr, 0.5);
    }

    #[test]
    fn pdamp5_requires_exact_length() {
        let ok = BdfCard::from_tokens(&["PDAMP5", "1", "2", "3.0"]);
        let prop = Pdamp5::add_card(&ok, "").expect("PDAMP5");
        assert_eq!(prop.references()[0].target, RefTarget::Material);
        let long = BdfCard::from_tokens(&["PDAMP5", "1", "2", "3.0", "4"]);
        assert!(Pdamp5::add_card(&long, "").is_err());
        let short = BdfCard::from_tokens(&["PDAMP5", "1", "2"]);
        assert!(Pdamp5::add_card(&short, "").is_err());
    }

    #[test]
    fn pdampt_blank_table() {
        let card = BdfCard::from_tokens(&["PDAMPT", "7"]);
        let prop = Pdampt::add_card(&card, "").expect("PDAMPT");
        assert_eq!(prop.tbid(), None);
        assert!(prop.references().is_empty());
        let back = Pdampt::add_card(&BdfCard::new(prop.raw_fields()), "").expect("PDAMPT text");
        assert_eq!(prop, back);
    }
}
