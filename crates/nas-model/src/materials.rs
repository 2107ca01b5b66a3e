//! Structural and thermal materials

use crate::entity::{BulkEntry, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// MAT1: isotropic elastic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat1 {
    pub mid: i32,
    /// Young's modulus
    pub e: f64,
    /// Shear modulus
    pub g: f64,
    /// Poisson's ratio
    pub nu: f64,
    pub rho: f64,
    /// Thermal expansion coefficient
    pub a: f64,
    pub tref: f64,
    pub ge: f64,
    /// Stress limits for margin output
    pub st: f64,
    pub sc: f64,
    pub ss: f64,
    /// Material coordinate system for output
    pub mcsid: i32,
    #[serde(default)]
    pub comment: String,
}

impl Mat1 {
    /// Create a material from E and nu, deriving G
    pub fn new(mid: i32, e: f64, nu: f64) -> Self {
        Mat1 {
            mid,
            e,
            g: e / (2.0 * (1.0 + nu)),
            nu,
            rho: 0.0,
            a: 0.0,
            tref: 0.0,
            ge: 0.0,
            st: 0.0,
            sc: 0.0,
            ss: 0.0,
            mcsid: 0,
            comment: String::new(),
        }
    }

    /// Build from a text card. Two of E, G and nu determine the third.
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(13)?;
        let mid = card.integer(1, "mid")?;
        let e = card.double_or_none(2, "E")?;
        let g = card.double_or_none(3, "G")?;
        let nu = card.double_or_none(4, "nu")?;
        let (e, g, nu) = match (e, g, nu) {
            (Some(e), Some(g), Some(nu)) => (e, g, nu),
            (Some(e), Some(g), None) => (e, g, e / (2.0 * g) - 1.0),
            (Some(e), None, Some(nu)) => (e, e / (2.0 * (1.0 + nu)), nu),
            (None, Some(g), Some(nu)) => (2.0 * g * (1.0 + nu), g, nu),
            (Some(e), None, None) => (e, 0.0, 0.0),
            (None, Some(g), None) => (0.0, g, 0.0),
            (None, None, _) => {
                return Err(ModelError::field("MAT1", 2, "E", "either E or G must be defined"));
            }
        };
        Ok(Mat1 {
            mid,
            e,
            g,
            nu,
            rho: card.double_or_blank(5, "rho", 0.0)?,
            a: card.double_or_blank(6, "a", 0.0)?,
            tref: card.double_or_blank(7, "tref", 0.0)?,
            ge: card.double_or_blank(8, "ge", 0.0)?,
            st: card.double_or_blank(9, "St", 0.0)?,
            sc: card.double_or_blank(10, "Sc", 0.0)?,
            ss: card.double_or_blank(11, "Ss", 0.0)?,
            mcsid: card.integer_or_blank(12, "mcsid", 0)?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Mat1 {
    fn card_type(&self) -> &str {
        "MAT1"
    }

    fn id(&self) -> i32 {
        self.mid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("MAT1"),
            Field::Int(self.mid),
            Field::Float(self.e),
            Field::Float(self.g),
            Field::Float(self.nu),
            Field::Float(self.rho),
            Field::Float(self.a),
            Field::Float(self.tref),
            Field::Float(self.ge),
            Field::Float(self.st),
            Field::Float(self.sc),
            Field::Float(self.ss),
            Field::Int(self.mcsid),
        ]
    }

    fn verify(&self) -> Result<()> {
        verify_positive("MAT1", self.mid, "mid", &[self.mid])?;
        if !(-1.0..0.5).contains(&self.nu) {
            return Err(ModelError::verify("MAT1", self.mid, format!("nu={} is outside [-1, 0.5)", self.nu)));
        }
        Ok(())
    }
}

/// MAT8: orthotropic shell material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat8 {
    pub mid: i32,
    pub e11: f64,
    pub e22: f64,
    pub nu12: f64,
    pub g12: f64,
    pub g1z: f64,
    pub g2z: f64,
    pub rho: f64,
    pub a1: f64,
    pub a2: f64,
    pub tref: f64,
    /// Allowables: Xt, Xc, Yt, Yc, S
    pub allowables: [f64; 5],
    pub ge: f64,
    pub f12: f64,
    pub strn: f64,
    #[serde(default)]
    pub comment: String,
}

impl Mat8 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(20)?;
        let xt = card.double_or_blank(12, "Xt", 0.0)?;
        let yt = card.double_or_blank(14, "Yt", 0.0)?;
        Ok(Mat8 {
            mid: card.integer(1, "mid")?,
            e11: card.double(2, "E11")?,
            e22: card.double(3, "E22")?,
            nu12: card.double(4, "nu12")?,
            g12: card.double_or_blank(5, "g12", 0.0)?,
            g1z: card.double_or_blank(6, "g1z", 1e8)?,
            g2z: card.double_or_blank(7, "g2z", 1e8)?,
            rho: card.double_or_blank(8, "rho", 0.0)?,
            a1: card.double_or_blank(9, "A1", 0.0)?,
            a2: card.double_or_blank(10, "A2", 0.0)?,
            tref: card.double_or_blank(11, "TRef", 0.0)?,
            allowables: [
                xt,
                card.double_or_blank(13, "Xc", xt)?,
                yt,
                card.double_or_blank(15, "Yc", yt)?,
                card.double_or_blank(16, "S", 0.0)?,
            ],
            ge: card.double_or_blank(17, "ge", 0.0)?,
            f12: card.double_or_blank(18, "F12", 0.0)?,
            strn: card.double_or_blank(19, "strn", 0.0)?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Mat8 {
    fn card_type(&self) -> &str {
        "MAT8"
    }

    fn id(&self) -> i32 {
        self.mid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("MAT8"),
            Field::Int(self.mid),
            Field::Float(self.e11),
            Field::Float(self.e22),
            Field::Float(self.nu12),
            Field::Float(self.g12),
            Field::Float(self.g1z),
            Field::Float(self.g2z),
            Field::Float(self.rho),
            Field::Float(self.a1),
            Field::Float(self.a2),
            Field::Float(self.tref),
        ];
        fields.extend(self.allowables.map(Field::Float));
        fields.extend([Field::Float(self.ge), Field::Float(self.f12), Field::Float(self.strn)]);
        fields
    }
}

/// A structural material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuralMaterial {
    Mat1(Mat1),
    Mat8(Mat8),
}

impl StructuralMaterial {
    fn entry(&self) -> &dyn BulkEntry {
        match self {
            StructuralMaterial::Mat1(m) => m,
            StructuralMaterial::Mat8(m) => m,
        }
    }

    /// Mass density
    pub fn rho(&self) -> f64 {
        match self {
            StructuralMaterial::Mat1(m) => m.rho,
            StructuralMaterial::Mat8(m) => m.rho,
        }
    }
}

impl BulkEntry for StructuralMaterial {
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

    fn verify(&self) -> Result<()> {
        self.entry().verify()
    }
}

/// MAT4: isotropic thermal material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub mid: i32,
    /// Thermal conductivity
    pub k: f64,
    /// Heat capacity
    pub cp: f64,
    pub rho: f64,
    /// Free convection heat transfer coefficient
    pub h: Option<f64>,
    /// Dynamic viscosity
    pub mu: Option<f64>,
    /// Heat generation capability
    pub hgen: f64,
    pub ref_enthalpy: Option<f64>,
    pub tch: Option<f64>,
    pub tdelta: Option<f64>,
    pub qlat: Option<f64>,
    #[serde(default)]
    pub comment: String,
}

impl Mat4 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(12)?;
        Ok(Mat4 {
            mid: card.integer(1, "mid")?,
            k: card.double_or_blank(2, "k", 0.0)?,
            cp: card.double_or_blank(3, "cp", 0.0)?,
            rho: card.double_or_blank(4, "rho", 1.0)?,
            h: card.double_or_none(5, "H")?,
            mu: card.double_or_none(6, "mu")?,
            hgen: card.double_or_blank(7, "hgen", 1.0)?,
            ref_enthalpy: card.double_or_none(8, "refEnthalpy")?,
            tch: card.double_or_none(9, "tch")?,
            tdelta: card.double_or_none(10, "tdelta")?,
            qlat: card.double_or_none(11, "qlat")?,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Mat4 {
    fn card_type(&self) -> &str {
        "MAT4"
    }

    fn id(&self) -> i32 {
        self.mid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("MAT4"),
            Field::Int(self.mid),
            Field::Float(self.k),
            Field::Float(self.cp),
            Field::Float(self.rho),
            Field::opt_float(self.h),
            Field::opt_float(self.mu),
            Field::Float(self.hgen),
            Field::opt_float(self.ref_enthalpy),
            Field::opt_float(self.tch),
            Field::opt_float(self.tdelta),
            Field::opt_float(self.qlat),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat1_derives_shear_modulus() {
        let card = BdfCard::from_tokens(&["MAT1", "1", "2.0+5", "", "0.25", "7.8-9"]);
        let mat = Mat1::add_card(&card, "").expect("MAT1");
        assert_eq!(mat.g, 80000.0);
        assert_eq!(mat.rho, 7.8e-9);
        mat.verify().expect("MAT1 should verify");
    }

    #[test]
    fn mat1_needs_a_modulus() {
        let card = BdfCard::from_tokens(&["MAT1", "1", "", "", "0.3"]);
        assert!(Mat1::add_card(&card, "").is_err());
    }

    #[test]
    fn mat8_round_trip() {
        let card = BdfCard::from_tokens(&[
            "MAT8", "2", "1.5+5", "1.0+4", "0.3", "5.0+3", "", "", "1.6-9", "", "", "", "1500.",
        ]);
        let mat = Mat8::add_card(&card, "").expect("MAT8");
        assert_eq!(mat.allowables[0], 1500.0);
        assert_eq!(mat.allowables[1], 1500.0);
        let back = Mat8::add_card(&BdfCard::new(mat.raw_fields()), "").expect("MAT8 text");
        assert_eq!(mat, back);
    }

    #[test]
    fn mat4_defaults() {
        let card = BdfCard::from_tokens(&["MAT4", "3", "204."]);
        let mat = Mat4::add_card(&card, "").expect("MAT4");
        assert_eq!(mat.rho, 1.0);
        assert_eq!(mat.h, None);
        let back = Mat4::add_card(&BdfCard::new(mat.raw_fields()), "").expect("MAT4 text");
        assert_eq!(mat, back);
    }
}
