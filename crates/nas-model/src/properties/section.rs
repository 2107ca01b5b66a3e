//! Line, shear-panel and solid properties

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// PROD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prod {
    pub pid: i32,
    pub mid: i32,
    pub a: f64,
    pub j: f64,
    pub c: f64,
    pub nsm: f64,
    #[serde(default)]
    pub comment: String,
}

impl Prod {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(7)?;
        Ok(Prod {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            a: card.double(3, "A")?,
            j: card.double_or_blank(4, "j", 0.0)?,
            c: card.double_or_blank(5, "c", 0.0)?,
            nsm: card.double_or_blank(6, "nsm", 0.0)?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Prod {
    fn card_type(&self) -> &str {
        "PROD"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PROD"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Float(self.a),
            Field::Float(self.j),
            Field::Float(self.c),
            Field::Float(self.nsm),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Material, self.mid, "mid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PROD", self.pid, "pid/mid", &[self.pid, self.mid])
    }
}

/// PTUBE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ptube {
    pub pid: i32,
    pub mid: i32,
    /// Outer diameter at end A
    pub od: f64,
    /// Wall thickness, half the diameter for a solid rod
    pub t: f64,
    pub nsm: f64,
    /// Outer diameter at end B
    pub od2: f64,
    #[serde(default)]
    pub comment: String,
}

impl Ptube {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(7)?;
        let od = card.double(3, "OD1")?;
        Ok(Ptube {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            od,
            t: card.double_or_blank(4, "t", od / 2.0)?,
            nsm: card.double_or_blank(5, "nsm", 0.0)?,
            od2: card.double_or_blank(6, "OD2", od)?,
            comment: comment.to_string(),
        })
    }

    /// Cross-section area at end A
    pub fn area(&self) -> f64 {
        let inner = self.od - 2.0 * self.t;
        std::f64::consts::PI / 4.0 * (self.od * self.od - inner * inner)
    }
}

impl BulkEntry for Ptube {
    fn card_type(&self) -> &str {
        "PTUBE"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PTUBE"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Float(self.od),
            Field::Float(self.t),
            Field::Float(self.nsm),
            Field::Float(self.od2),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Material, self.mid, "mid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PTUBE", self.pid, "pid/mid", &[self.pid, self.mid])?;
        if self.t > self.od / 2.0 {
            return Err(ModelError::verify(
                "PTUBE",
                self.pid,
                format!("wall thickness {} exceeds the radius {}", self.t, self.od / 2.0),
            ));
        }
        Ok(())
    }
}

/// PBAR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pbar {
    pub pid: i32,
    pub mid: i32,
    pub a: f64,
    pub i1: f64,
    pub i2: f64,
    pub j: f64,
    pub nsm: f64,
    /// Stress recovery points C, D, E, F as (y, z) pairs
    pub recovery: [f64; 8],
    /// Shear area factors
    pub k1: Option<f64>,
    pub k2: Option<f64>,
    pub i12: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pbar {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(20)?;
        let mut recovery = [0.0; 8];
        for (i, v) in recovery.iter_mut().enumerate() {
            *v = card.double_or_blank(9 + i, "recovery", 0.0)?;
        }
        Ok(Pbar {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            a: card.double_or_blank(3, "A", 0.0)?,
            i1: card.double_or_blank(4, "I1", 0.0)?,
            i2: card.double_or_blank(5, "I2", 0.0)?,
            j: card.double_or_blank(6, "J", 0.0)?,
            nsm: card.double_or_blank(7, "nsm", 0.0)?,
            recovery,
            k1: card.double_or_none(17, "K1")?,
            k2: card.double_or_none(18, "K2")?,
            i12: card.double_or_blank(19, "I12", 0.0)?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Pbar {
    fn card_type(&self) -> &str {
        "PBAR"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("PBAR"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Float(self.a),
            Field::Float(self.i1),
            Field::Float(self.i2),
            Field::Float(self.j),
            Field::Float(self.nsm),
            Field::Blank,
        ];
        fields.extend(self.recovery.map(Field::Float));
        fields.extend([
            Field::opt_float(self.k1),
            Field::opt_float(self.k2),
            Field::Float(self.i12),
        ]);
        fields
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Material, self.mid, "mid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PBAR", self.pid, "pid/mid", &[self.pid, self.mid])?;
        if self.i1 * self.i2 < self.i12 * self.i12 {
            return Err(ModelError::verify("PBAR", self.pid, "I1*I2 must not be less than I12^2"));
        }
        Ok(())
    }
}

/// PSHEAR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pshear {
    pub pid: i32,
    pub mid: i32,
    pub t: f64,
    pub nsm: f64,
    pub f1: f64,
    pub f2: f64,
    #[serde(default)]
    pub comment: String,
}

impl Pshear {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(7)?;
        Ok(Pshear {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            t: card.double(3, "t")?,
            nsm: card.double_or_blank(4, "nsm", 0.0)?,
            f1: card.double_or_blank(5, "f1", 0.0)?,
            f2: card.double_or_blank(6, "f2", 0.0)?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Pshear {
    fn card_type(&self) -> &str {
        "PSHEAR"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PSHEAR"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Float(self.t),
            Field::Float(self.nsm),
            Field::Float(self.f1),
            Field::Float(self.f2),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RefTarget::Material, self.mid, "mid")]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PSHEAR", self.pid, "pid/mid", &[self.pid, self.mid])
    }
}

/// PSOLID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Psolid {
    pub pid: i32,
    pub mid: i32,
    /// Material coordinate system
    pub cordm: i32,
    /// Integration network, integer or keyword
    pub integ: Field,
    /// Stress output location, integer or keyword
    pub stress: Field,
    /// Integration scheme, integer or keyword
    pub isop: Field,
    /// Fluid/structure selector
    pub fctn: String,
    #[serde(default)]
    pub comment: String,
}

impl Psolid {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(8)?;
        Ok(Psolid {
            pid: card.integer(1, "pid")?,
            mid: card.integer(2, "mid")?,
            cordm: card.integer_or_blank(3, "cordm", 0)?,
            integ: card.integer_double_string_or_blank(4, "in")?,
            stress: card.integer_double_string_or_blank(5, "stress")?,
            isop: card.integer_double_string_or_blank(6, "isop")?,
            fctn: card.string_or_blank(7, "fctn", "SMECH")?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Psolid {
    fn card_type(&self) -> &str {
        "PSOLID"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PSOLID"),
            Field::Int(self.pid),
            Field::Int(self.mid),
            Field::Int(self.cordm),
            self.integ.clone(),
            self.stress.clone(),
            self.isop.clone(),
            Field::text(&self.fctn),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::new(RefTarget::Material, self.mid, "mid")];
        refs.extend(Reference::optional(RefTarget::Coord, self.cordm, "cordm").filter(|r| r.id > 0));
        refs
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PSOLID", self.pid, "pid/mid", &[self.pid, self.mid])
    }
}
