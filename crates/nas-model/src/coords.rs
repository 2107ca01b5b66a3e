//! Coordinate systems defined by three points (CORD2R, CORD2C, CORD2S)

use crate::entity::{BulkEntry, RefTarget, Reference};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Coordinate system flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordKind {
    /// Rectangular (x, y, z)
    Rectangular,
    /// Cylindrical (r, theta in degrees, z)
    Cylindrical,
    /// Spherical (r, theta, phi in degrees)
    Spherical,
}

impl CoordKind {
    /// Card name
    pub fn card_name(self) -> &'static str {
        match self {
            CoordKind::Rectangular => "CORD2R",
            CoordKind::Cylindrical => "CORD2C",
            CoordKind::Spherical => "CORD2S",
        }
    }

    /// Flavour from a card name
    pub fn from_card_name(name: &str) -> Option<Self> {
        match name {
            "CORD2R" => Some(CoordKind::Rectangular),
            "CORD2C" => Some(CoordKind::Cylindrical),
            "CORD2S" => Some(CoordKind::Spherical),
            _ => None,
        }
    }

    /// Map a local coordinate triple to rectangular components
    pub fn to_rectangular(self, p: [f64; 3]) -> Vector3<f64> {
        match self {
            CoordKind::Rectangular => Vector3::new(p[0], p[1], p[2]),
            CoordKind::Cylindrical => {
                let theta = p[1].to_radians();
                Vector3::new(p[0] * theta.cos(), p[0] * theta.sin(), p[2])
            }
            CoordKind::Spherical => {
                let theta = p[1].to_radians();
                let phi = p[2].to_radians();
                Vector3::new(
                    p[0] * theta.sin() * phi.cos(),
                    p[0] * theta.sin() * phi.sin(),
                    p[0] * theta.cos(),
                )
            }
        }
    }
}

/// A coordinate system defined by an origin, a point on the z axis and a
/// point in the x-z plane, all given in the reference system `rid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub kind: CoordKind,
    pub cid: i32,
    /// Reference system the three points are given in
    pub rid: i32,
    /// Origin
    pub a: [f64; 3],
    /// Point on the z axis
    pub b: [f64; 3],
    /// Point in the x-z plane
    pub c: [f64; 3],
    #[serde(default)]
    pub comment: String,
}

/// Origin and axes of a coordinate system in the basic frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub kind: CoordKind,
    pub origin: Point3<f64>,
    /// Columns are the unit x, y and z axes
    pub axes: Matrix3<f64>,
}

impl Frame {
    /// The basic rectangular frame
    pub fn basic() -> Self {
        Frame {
            kind: CoordKind::Rectangular,
            origin: Point3::origin(),
            axes: Matrix3::identity(),
        }
    }

    /// Transform a local coordinate triple into the basic frame
    pub fn to_basic(&self, p: [f64; 3]) -> Point3<f64> {
        self.origin + self.axes * self.kind.to_rectangular(p)
    }
}

impl Coord {
    /// Build from a text card
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let name = card.name();
        let kind = CoordKind::from_card_name(&name)
            .ok_or_else(|| ModelError::field(&name, 0, "name", "is not a CORD2x card"))?;
        card.ensure_max_len(13)?;
        let mut points = [[0.0; 3]; 3];
        for (i, point) in points.iter_mut().enumerate() {
            for (j, value) in point.iter_mut().enumerate() {
                *value = card.double_or_blank(3 + 3 * i + j, "point", 0.0)?;
            }
        }
        Ok(Coord {
            kind,
            cid: card.integer(1, "cid")?,
            rid: card.integer_or_blank(2, "rid", 0)?,
            a: points[0],
            b: points[1],
            c: points[2],
            comment: comment.to_string(),
        })
    }

    /// Build from a binary tuple `(cid, one, two, rid, a1..a3, b1..b3, c1..c3)`
    pub fn add_op2_data(kind: CoordKind, data: RecordData<'_>) -> Result<Self> {
        data.require(13)?;
        Ok(Coord {
            kind,
            cid: data.int(0)?,
            rid: data.int(3)?,
            a: data.floats::<3>(4)?,
            b: data.floats::<3>(7)?,
            c: data.floats::<3>(10)?,
            comment: String::new(),
        })
    }

    /// Frame of this system given the frame of its reference system
    pub fn frame_in(&self, reference: &Frame) -> Result<Frame> {
        let a = reference.to_basic(self.a);
        let b = reference.to_basic(self.b);
        let c = reference.to_basic(self.c);
        let ez = b - a;
        let ey = ez.cross(&(c - a));
        if ez.norm() == 0.0 || ey.norm() == 0.0 {
            return Err(ModelError::Coordinate {
                cid: self.cid,
                message: "defining points are collinear".to_string(),
            });
        }
        let ez = ez.normalize();
        let ey = ey.normalize();
        let ex = ey.cross(&ez);
        Ok(Frame {
            kind: self.kind,
            origin: a,
            axes: Matrix3::from_columns(&[ex, ey, ez]),
        })
    }
}

impl BulkEntry for Coord {
    fn card_type(&self) -> &str {
        self.kind.card_name()
    }

    fn id(&self) -> i32 {
        self.cid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text(self.kind.card_name()),
            Field::Int(self.cid),
            if self.rid == 0 { Field::Blank } else { Field::Int(self.rid) },
        ];
        fields.extend(
            self.a
                .iter()
                .chain(&self.b)
                .chain(&self.c)
                .copied()
                .map(Field::Float),
        );
        fields
    }

    fn references(&self) -> Vec<Reference> {
        Reference::optional(RefTarget::Coord, self.rid, "rid")
            .into_iter()
            .collect()
    }
}
