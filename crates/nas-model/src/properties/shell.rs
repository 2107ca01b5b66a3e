//! Shell and composite laminate properties

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// PSHELL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pshell {
    pub pid: i32,
    /// Membrane material
    pub mid1: Option<i32>,
    pub t: Option<f64>,
    /// Bending material
    pub mid2: Option<i32>,
    /// Bending stiffness ratio 12I/T^3
    pub twelve_it3: f64,
    /// Transverse shear material
    pub mid3: Option<i32>,
    /// Shear thickness ratio TS/T
    pub tst: f64,
    pub nsm: f64,
    /// Fiber distances for stress recovery
    pub z1: Option<f64>,
    pub z2: Option<f64>,
    /// Membrane-bending coupling material
    pub mid4: Option<i32>,
    #[serde(default)]
    pub comment: String,
}

impl Pshell {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(12)?;
        Ok(Pshell {
            pid: card.integer(1, "pid")?,
            mid1: card.integer_or_none(2, "mid1")?,
            t: card.double_or_none(3, "t")?,
            mid2: card.integer_or_none(4, "mid2")?,
            twelve_it3: card.double_or_blank(5, "12I/t^3", 1.0)?,
            mid3: card.integer_or_none(6, "mid3")?,
            tst: card.double_or_blank(7, "ts/t", 0.833333)?,
            nsm: card.double_or_blank(8, "nsm", 0.0)?,
            z1: card.double_or_none(9, "z1")?,
            z2: card.double_or_none(10, "z2")?,
            mid4: card.integer_or_none(11, "mid4")?,
            comment: comment.to_string(),
        })
    }

    /// Distinct material IDs, membrane first
    pub fn material_ids(&self) -> Vec<i32> {
        let mut mids = Vec::new();
        for mid in [self.mid1, self.mid2, self.mid3, self.mid4].into_iter().flatten() {
            if mid > 0 && !mids.contains(&mid) {
                mids.push(mid);
            }
        }
        mids
    }
}

impl BulkEntry for Pshell {
    fn card_type(&self) -> &str {
        "PSHELL"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("PSHELL"),
            Field::Int(self.pid),
            Field::opt_int(self.mid1),
            Field::opt_float(self.t),
            Field::opt_int(self.mid2),
            Field::Float(self.twelve_it3),
            Field::opt_int(self.mid3),
            Field::Float(self.tst),
            Field::Float(self.nsm),
            Field::opt_float(self.z1),
            Field::opt_float(self.z2),
            Field::opt_int(self.mid4),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        self.material_ids()
            .into_iter()
            .map(|mid| Reference::new(RefTarget::Material, mid, "mid"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PSHELL", self.pid, "pid", &[self.pid])?;
        if self.material_ids().is_empty() {
            return Err(ModelError::verify("PSHELL", self.pid, "no material defined"));
        }
        Ok(())
    }
}

/// One ply of a PCOMP laminate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ply {
    pub mid: i32,
    pub t: f64,
    pub theta: f64,
    /// Stress output request, YES or NO
    pub sout: String,
}

/// PCOMP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pcomp {
    pub pid: i32,
    /// Offset of the bottom surface, half the laminate thickness below the
    /// reference plane when unset
    pub z0: Option<f64>,
    pub nsm: f64,
    /// Allowable interlaminar shear stress
    pub sb: f64,
    /// Failure theory
    pub ft: Option<String>,
    pub tref: f64,
    pub ge: f64,
    /// Laminate option, e.g. SYM
    pub lam: Option<String>,
    pub plies: Vec<Ply>,
    #[serde(default)]
    pub comment: String,
}

impl Pcomp {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let mut plies: Vec<Ply> = Vec::new();
        let mut start = 9;
        while start < card.len() {
            let previous = plies.last();
            let mid = match (card.integer_or_none(start, "mid")?, previous) {
                (Some(mid), _) => mid,
                (None, Some(prev)) => prev.mid,
                (None, None) => card.integer(start, "mid")?,
            };
            let t = match (card.double_or_none(start + 1, "t")?, previous) {
                (Some(t), _) => t,
                (None, Some(prev)) => prev.t,
                (None, None) => card.double(start + 1, "t")?,
            };
            plies.push(Ply {
                mid,
                t,
                theta: card.double_or_blank(start + 2, "theta", 0.0)?,
                sout: card.string_or_blank(start + 3, "sout", "NO")?,
            });
            start += 4;
        }
        if plies.is_empty() {
            return Err(ModelError::field("PCOMP", 9, "mid", "is required but blank"));
        }
        Ok(Pcomp {
            pid: card.integer(1, "pid")?,
            z0: card.double_or_none(2, "z0")?,
            nsm: card.double_or_blank(3, "nsm", 0.0)?,
            sb: card.double_or_blank(4, "sb", 0.0)?,
            ft: card.string_or_none(5, "ft")?,
            tref: card.double_or_blank(6, "tref", 0.0)?,
            ge: card.double_or_blank(7, "ge", 0.0)?,
            lam: card.string_or_none(8, "lam")?,
            plies,
            comment: comment.to_string(),
        })
    }

    /// True for symmetric laminates where the plies are mirrored
    pub fn is_symmetrical(&self) -> bool {
        self.lam.as_deref() == Some("SYM")
    }

    /// Total laminate thickness
    pub fn total_thickness(&self) -> f64 {
        let t: f64 = self.plies.iter().map(|p| p.t).sum();
        if self.is_symmetrical() { 2.0 * t } else { t }
    }

    /// Each ply material once, in ply order
    pub fn material_ids(&self) -> Vec<i32> {
        let mut mids = Vec::new();
        for ply in &self.plies {
            if !mids.contains(&ply.mid) {
                mids.push(ply.mid);
            }
        }
        mids
    }
}

impl BulkEntry for Pcomp {
    fn card_type(&self) -> &str {
        "PCOMP"
    }

    fn id(&self) -> i32 {
        self.pid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("PCOMP"),
            Field::Int(self.pid),
            Field::opt_float(self.z0),
            Field::Float(self.nsm),
            Field::Float(self.sb),
            self.ft.clone().map_or(Field::Blank, Field::Text),
            Field::Float(self.tref),
            Field::Float(self.ge),
            self.lam.clone().map_or(Field::Blank, Field::Text),
        ];
        for ply in &self.plies {
            fields.extend([
                Field::Int(ply.mid),
                Field::Float(ply.t),
                Field::Float(ply.theta),
                Field::text(&ply.sout),
            ]);
        }
        fields
    }

    fn references(&self) -> Vec<Reference> {
        self.material_ids()
            .into_iter()
            .map(|mid| Reference::new(RefTarget::Material, mid, "mid"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("PCOMP", self.pid, "pid", &[self.pid])?;
        verify_positive("PCOMP", self.pid, "ply mids", &self.material_ids())?;
        if let Some(ply) = self.plies.iter().find(|p| p.t <= 0.0) {
            return Err(ModelError::verify("PCOMP", self.pid, format!("ply thickness {} is not positive", ply.t)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcomp_plies_inherit_material_and_thickness() {
        let card = BdfCard::from_tokens(&[
            "PCOMP", "10", "", "", "", "", "", "", "SYM", "1", "0.1", "0.", "YES", "", "", "45.", "",
            "2", "", "90.",
        ]);
        let pcomp = Pcomp::add_card(&card, "").expect("PCOMP");
        assert_eq!(pcomp.plies.len(), 3);
        assert_eq!(pcomp.plies[1].mid, 1);
        assert_eq!(pcomp.plies[1].t, 0.1);
        assert_eq!(pcomp.plies[2].mid, 2);
        assert_eq!(pcomp.material_ids(), vec![1, 2]);
        assert!(pcomp.is_symmetrical());
        assert!((pcomp.total_thickness() - 0.6).abs() < 1e-12);
        let back = Pcomp::add_card(&BdfCard::new(pcomp.raw_fields()), "").expect("PCOMP text");
        assert_eq!(pcomp, back);
    }

    #[test]
    fn pshell_material_ids_are_unique() {
        let card = BdfCard::from_tokens(&["PSHELL", "1", "4", "0.2", "4", "", "5"]);
        let pshell = Pshell::add_card(&card, "").expect("PSHELL");
        assert_eq!(pshell.material_ids(), vec![4, 5]);
        let back = Pshell::add_card(&BdfCard::new(pshell.raw_fields()), "").expect("PSHELL text");
        assert_eq!(pshell, back);
    }
}
