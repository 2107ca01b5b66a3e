//! Two-node line elements: rods, bars, beams and gaps

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// Orientation of a bar, beam or gap cross-section
///
/// Binary records carry a flag word selecting how the three orientation
/// words are read: flags 0 and 1 hold a real vector (basic system or the
/// displacement system of end A), flag 2 holds a grid ID in the first word.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Orientation {
    /// Orientation vector
    Vector { flag: i32, x: [f64; 3] },
    /// Orientation toward a grid point
    Grid { g0: i32 },
}

/// Flag used for vectors given on text cards
pub const VECTOR_IN_GA_SYSTEM: i32 = 1;
/// Flag selecting the grid-point orientation
pub const ORIENTATION_GRID: i32 = 2;

impl Orientation {
    /// Binary flag word of this orientation
    pub fn flag(&self) -> i32 {
        match self {
            Orientation::Vector { flag, .. } => *flag,
            Orientation::Grid { .. } => ORIENTATION_GRID,
        }
    }

    /// Read `X1/G0 X2 X3` from a text card starting at `index`
    pub fn from_card(card: &BdfCard, index: usize) -> Result<Self> {
        if let Some(g0) = card.integer_or_none(index, "g0").ok().flatten() {
            return Ok(Orientation::Grid { g0 });
        }
        Ok(Orientation::Vector {
            flag: VECTOR_IN_GA_SYSTEM,
            x: [
                card.double_or_blank(index, "x1", 0.0)?,
                card.double_or_blank(index + 1, "x2", 0.0)?,
                card.double_or_blank(index + 2, "x3", 0.0)?,
            ],
        })
    }

    /// Read the orientation from a binary tuple given the flag word
    /// position and the first orientation word position
    pub fn from_op2(data: RecordData<'_>, flag_index: usize, first: usize) -> Result<Self> {
        match data.int(flag_index)? {
            flag @ (0 | 1) => Ok(Orientation::Vector {
                flag,
                x: data.floats::<3>(first)?,
            }),
            ORIENTATION_GRID => Ok(Orientation::Grid { g0: data.int(first)? }),
            other => Err(ModelError::field(
                data.card(),
                flag_index,
                "f",
                format!("orientation flag {other} is not 0, 1 or 2"),
            )),
        }
    }

    /// The three `X1/G0 X2 X3` fields
    pub fn fields(&self) -> [Field; 3] {
        match self {
            Orientation::Vector { x, .. } => x.map(Field::Float),
            Orientation::Grid { g0 } => [Field::Int(*g0), Field::Blank, Field::Blank],
        }
    }

    fn reference(&self) -> Option<Reference> {
        match self {
            Orientation::Grid { g0 } => Reference::optional(RefTarget::Node, *g0, "g0"),
            Orientation::Vector { .. } => None,
        }
    }
}

fn end_refs(nodes: &[i32; 2]) -> impl Iterator<Item = Reference> + '_ {
    nodes
        .iter()
        .map(|&n| Reference::new(RefTarget::Node, n, "nodes"))
}

fn verify_ends(card: &str, eid: i32, nodes: &[i32; 2]) -> Result<()> {
    verify_positive(card, eid, "node ids", nodes)?;
    if nodes[0] == nodes[1] {
        return Err(ModelError::verify(card, eid, format!("both ends are node {}", nodes[0])));
    }
    Ok(())
}

/// Rod kinds sharing the `EID PID G1 G2` layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RodCard {
    Crod,
    Ctube,
}

impl RodCard {
    pub fn name(self) -> &'static str {
        match self {
            RodCard::Crod => "CROD",
            RodCard::Ctube => "CTUBE",
        }
    }
}

/// CROD / CTUBE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rod {
    pub card: RodCard,
    pub eid: i32,
    pub pid: i32,
    pub nodes: [i32; 2],
    #[serde(default)]
    pub comment: String,
}

impl Rod {
    pub fn add_card(card_type: RodCard, card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(5)?;
        let eid = card.integer(1, "eid")?;
        Ok(Rod {
            card: card_type,
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes: [card.integer(3, "n1")?, card.integer(4, "n2")?],
            comment: comment.to_string(),
        })
    }

    /// `(eid, pid, n1, n2)`
    pub fn add_op2_data(card_type: RodCard, data: RecordData<'_>) -> Result<Self> {
        let [eid, pid, n1, n2] = data.ints::<4>(0)?;
        Ok(Rod {
            card: card_type,
            eid,
            pid,
            nodes: [n1, n2],
            comment: String::new(),
        })
    }
}

impl BulkEntry for Rod {
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
        vec![
            Field::text(self.card.name()),
            Field::Int(self.eid),
            Field::Int(self.pid),
            Field::Int(self.nodes[0]),
            Field::Int(self.nodes[1]),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        end_refs(&self.nodes)
            .chain([Reference::new(RefTarget::Property, self.pid, "pid")])
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive(self.card.name(), self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_ends(self.card.name(), self.eid, &self.nodes)
    }
}

/// CONROD: rod with inline section properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conrod {
    pub eid: i32,
    pub nodes: [i32; 2],
    pub mid: i32,
    pub a: f64,
    pub j: f64,
    pub c: f64,
    pub nsm: f64,
    #[serde(default)]
    pub comment: String,
}

impl Conrod {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(9)?;
        Ok(Conrod {
            eid: card.integer(1, "eid")?,
            nodes: [card.integer(2, "n1")?, card.integer(3, "n2")?],
            mid: card.integer(4, "mid")?,
            a: card.double_or_blank(5, "A", 0.0)?,
            j: card.double_or_blank(6, "j", 0.0)?,
            c: card.double_or_blank(7, "c", 0.0)?,
            nsm: card.double_or_blank(8, "nsm", 0.0)?,
            comment: comment.to_string(),
        })
    }

    /// `(eid, n1, n2, mid, a, j, c, nsm)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        let [eid, n1, n2, mid] = data.ints::<4>(0)?;
        let [a, j, c, nsm] = data.floats::<4>(4)?;
        Ok(Conrod {
            eid,
            nodes: [n1, n2],
            mid,
            a,
            j,
            c,
            nsm,
            comment: String::new(),
        })
    }
}

impl BulkEntry for Conrod {
    fn card_type(&self) -> &str {
        "CONROD"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        vec![
            Field::text("CONROD"),
            Field::Int(self.eid),
            Field::Int(self.nodes[0]),
            Field::Int(self.nodes[1]),
            Field::Int(self.mid),
            Field::Float(self.a),
            Field::Float(self.j),
            Field::Float(self.c),
            Field::Float(self.nsm),
        ]
    }

    fn references(&self) -> Vec<Reference> {
        end_refs(&self.nodes)
            .chain([Reference::new(RefTarget::Material, self.mid, "mid")])
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CONROD", self.eid, "eid/mid", &[self.eid, self.mid])?;
        verify_ends("CONROD", self.eid, &self.nodes)
    }
}

/// CBAR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cbar {
    pub eid: i32,
    pub pid: i32,
    pub nodes: [i32; 2],
    pub orientation: Orientation,
    /// Offset vector interpretation
    pub offt: String,
    /// Pin flags at ends A and B
    pub pa: i32,
    pub pb: i32,
    /// Offset vectors at ends A and B
    pub wa: [f64; 3],
    pub wb: [f64; 3],
    #[serde(default)]
    pub comment: String,
}

impl Cbar {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(17)?;
        let eid = card.integer(1, "eid")?;
        Ok(Cbar {
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes: [card.integer(3, "ga")?, card.integer(4, "gb")?],
            orientation: Orientation::from_card(card, 5)?,
            offt: card.string_or_blank(8, "offt", "GGG")?,
            pa: card.components_or_blank(9, "pa", 0)?,
            pb: card.components_or_blank(10, "pb", 0)?,
            wa: read_vector(card, 11)?,
            wb: read_vector(card, 14)?,
            comment: comment.to_string(),
        })
    }

    /// `(eid, pid, ga, gb, x1|g0, x2, x3, f, pa, pb, w1a, w2a, w3a, w1b, w2b, w3b)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        data.require(16)?;
        let [eid, pid, ga, gb] = data.ints::<4>(0)?;
        Ok(Cbar {
            eid,
            pid,
            nodes: [ga, gb],
            orientation: Orientation::from_op2(data, 7, 4)?,
            offt: "GGG".to_string(),
            pa: data.int(8)?,
            pb: data.int(9)?,
            wa: data.floats::<3>(10)?,
            wb: data.floats::<3>(13)?,
            comment: String::new(),
        })
    }
}

fn read_vector(card: &BdfCard, index: usize) -> Result<[f64; 3]> {
    Ok([
        card.double_or_blank(index, "w1", 0.0)?,
        card.double_or_blank(index + 1, "w2", 0.0)?,
        card.double_or_blank(index + 2, "w3", 0.0)?,
    ])
}

fn pin(value: i32) -> Field {
    if value == 0 { Field::Blank } else { Field::Int(value) }
}

impl BulkEntry for Cbar {
    fn card_type(&self) -> &str {
        "CBAR"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CBAR"),
            Field::Int(self.eid),
            Field::Int(self.pid),
            Field::Int(self.nodes[0]),
            Field::Int(self.nodes[1]),
        ];
        fields.extend(self.orientation.fields());
        fields.push(Field::text(&self.offt));
        fields.extend([pin(self.pa), pin(self.pb)]);
        fields.extend(self.wa.iter().chain(&self.wb).copied().map(Field::Float));
        fields
    }

    fn references(&self) -> Vec<Reference> {
        end_refs(&self.nodes)
            .chain(self.orientation.reference())
            .chain([Reference::new(RefTarget::Property, self.pid, "pid")])
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CBAR", self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_ends("CBAR", self.eid, &self.nodes)
    }
}

/// CBEAM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cbeam {
    pub eid: i32,
    pub pid: i32,
    pub nodes: [i32; 2],
    pub orientation: Orientation,
    pub offt: String,
    pub pa: i32,
    pub pb: i32,
    pub wa: [f64; 3],
    pub wb: [f64; 3],
    /// Scalar points for warping at ends A and B
    pub sa: i32,
    pub sb: i32,
    #[serde(default)]
    pub comment: String,
}

impl Cbeam {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(19)?;
        let eid = card.integer(1, "eid")?;
        Ok(Cbeam {
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes: [card.integer(3, "ga")?, card.integer(4, "gb")?],
            orientation: Orientation::from_card(card, 5)?,
            offt: card.string_or_blank(8, "offt", "GGG")?,
            pa: card.components_or_blank(9, "pa", 0)?,
            pb: card.components_or_blank(10, "pb", 0)?,
            wa: read_vector(card, 11)?,
            wb: read_vector(card, 14)?,
            sa: card.integer_or_blank(17, "sa", 0)?,
            sb: card.integer_or_blank(18, "sb", 0)?,
            comment: comment.to_string(),
        })
    }

    /// `(eid, pid, ga, gb, sa, sb, x1|g0, x2, x3, f, pa, pb, w1a..w3b)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        data.require(18)?;
        let [eid, pid, ga, gb, sa, sb] = data.ints::<6>(0)?;
        Ok(Cbeam {
            eid,
            pid,
            nodes: [ga, gb],
            orientation: Orientation::from_op2(data, 9, 6)?,
            offt: "GGG".to_string(),
            pa: data.int(10)?,
            pb: data.int(11)?,
            wa: data.floats::<3>(12)?,
            wb: data.floats::<3>(15)?,
            sa,
            sb,
            comment: String::new(),
        })
    }
}

impl BulkEntry for Cbeam {
    fn card_type(&self) -> &str {
        "CBEAM"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CBEAM"),
            Field::Int(self.eid),
            Field::Int(self.pid),
            Field::Int(self.nodes[0]),
            Field::Int(self.nodes[1]),
        ];
        fields.extend(self.orientation.fields());
        fields.push(Field::text(&self.offt));
        fields.extend([pin(self.pa), pin(self.pb)]);
        fields.extend(self.wa.iter().chain(&self.wb).copied().map(Field::Float));
        fields.extend([pin(self.sa), pin(self.sb)]);
        fields
    }

    fn references(&self) -> Vec<Reference> {
        end_refs(&self.nodes)
            .chain(self.orientation.reference())
            .chain([Reference::new(RefTarget::Property, self.pid, "pid")])
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CBEAM", self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_ends("CBEAM", self.eid, &self.nodes)
    }
}

/// CGAP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cgap {
    pub eid: i32,
    pub pid: i32,
    pub nodes: [i32; 2],
    pub orientation: Orientation,
    /// Element coordinate system, 0 when unset
    pub cid: i32,
    #[serde(default)]
    pub comment: String,
}

impl Cgap {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(9)?;
        let eid = card.integer(1, "eid")?;
        Ok(Cgap {
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes: [card.integer(3, "ga")?, card.integer(4, "gb")?],
            orientation: Orientation::from_card(card, 5)?,
            cid: card.integer_or_blank(8, "cid", 0)?,
            comment: comment.to_string(),
        })
    }

    /// `(eid, pid, ga, gb, x1|g0, x2, x3, f, cid)`
    pub fn add_op2_data(data: RecordData<'_>) -> Result<Self> {
        data.require(9)?;
        let [eid, pid, ga, gb] = data.ints::<4>(0)?;
        Ok(Cgap {
            eid,
            pid,
            nodes: [ga, gb],
            orientation: Orientation::from_op2(data, 7, 4)?,
            cid: data.int(8)?,
            comment: String::new(),
        })
    }
}

impl BulkEntry for Cgap {
    fn card_type(&self) -> &str {
        "CGAP"
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text("CGAP"),
            Field::Int(self.eid),
            Field::Int(self.pid),
            Field::Int(self.nodes[0]),
            Field::Int(self.nodes[1]),
        ];
        fields.extend(self.orientation.fields());
        fields.push(pin(self.cid));
        fields
    }

    fn references(&self) -> Vec<Reference> {
        end_refs(&self.nodes)
            .chain(self.orientation.reference())
            .chain([Reference::new(RefTarget::Property, self.pid, "pid")])
            .chain(Reference::optional(RefTarget::Coord, self.cid, "cid"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("CGAP", self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_ends("CGAP", self.eid, &self.nodes)
    }
}
