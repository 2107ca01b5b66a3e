//! Rigid elements (RBAR, RBE2)

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// RBAR: rigid bar with independent/dependent component sets at each end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rbar {
    pub eid: i32,
    pub ga: i32,
    pub gb: i32,
    pub cna: i32,
    pub cnb: i32,
    pub cma: i32,
    pub cmb: i32,
    /// Thermal expansion coefficient
    pub alpha: f64,
    #[serde(default)]
    pub comment: String,
}

impl Rbar {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(9)?;
        Ok(Rbar {
            eid: card.integer(1, "eid")?,
            ga: card.integer(2, "ga")?,
            gb: card.integer(3, "gb")?,
            cna: card.components_or_blank(4, "cna", 0)?,
            cnb: card.components_or_blank(5, "cnb", 0)?,
            cma: card.components_or_blank(6, "cma", 0)?,
            cmb: card.components_or_blank(7, "cmb", 0)?,
            alpha: card.double_or_blank(8, "alpha", 0.0)?,
            comment: comment.to_string(),
        })
    }
}

/// RBE2: one independent node driving a set of dependent nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rbe2 {
    pub eid: i32,
    /// Independent node
    pub gn: i32,
    /// Dependent components
    pub cm: i32,
    /// Dependent nodes
    pub gmi: Vec<i32>,
    pub alpha: f64,
    #[serde(default)]
    pub comment: String,
}

impl Rbe2 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let mut gmi = Vec::new();
        let mut alpha = 0.0;
        for i in 4..card.len() {
            match card.integer_double_string_or_blank(i, "gmi")? {
                Field::Blank => {}
                Field::Int(n) => gmi.push(n),
                Field::Float(a) if i + 1 == card.len() => alpha = a,
                other => {
                    return Err(ModelError::field(
                        "RBE2",
                        i,
                        "gmi",
                        format!("expected node id, found {other:?}"),
                    ));
                }
            }
        }
        if gmi.is_empty() {
            return Err(ModelError::field("RBE2", 4, "gmi", "is required but blank"));
        }
        Ok(Rbe2 {
            eid: card.integer(1, "eid")?,
            gn: card.integer(2, "gn")?,
            cm: card.components_or_blank(3, "cm", 0)?,
            gmi,
            alpha,
            comment: comment.to_string(),
        })
    }
}

/// A rigid element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RigidElement {
    Rbar(Rbar),
    Rbe2(Rbe2),
}

impl RigidElement {
    /// Independent nodes
    pub fn independent_nodes(&self) -> Vec<i32> {
        match self {
            RigidElement::Rbar(e) => [(e.ga, e.cna), (e.gb, e.cnb)]
                .into_iter()
                .filter(|&(_, c)| c != 0)
                .map(|(n, _)| n)
                .collect(),
            RigidElement::Rbe2(e) => vec![e.gn],
        }
    }

    /// Dependent nodes
    pub fn dependent_nodes(&self) -> Vec<i32> {
        match self {
            RigidElement::Rbar(e) => [(e.ga, e.cma), (e.gb, e.cmb)]
                .into_iter()
                .filter(|&(_, c)| c != 0)
                .map(|(n, _)| n)
                .collect(),
            RigidElement::Rbe2(e) => e.gmi.clone(),
        }
    }

    /// Every node the element touches
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            RigidElement::Rbar(e) => vec![e.ga, e.gb],
            RigidElement::Rbe2(e) => std::iter::once(e.gn).chain(e.gmi.iter().copied()).collect(),
        }
    }

    /// Apply `map` to every node
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        match self {
            RigidElement::Rbar(e) => {
                e.ga = map(e.ga);
                e.gb = map(e.gb);
            }
            RigidElement::Rbe2(e) => {
                e.gn = map(e.gn);
                e.gmi.iter_mut().for_each(|n| *n = map(*n));
            }
        }
    }
}

impl BulkEntry for RigidElement {
    fn card_type(&self) -> &str {
        match self {
            RigidElement::Rbar(_) => "RBAR",
            RigidElement::Rbe2(_) => "RBE2",
        }
    }

    fn id(&self) -> i32 {
        match self {
            RigidElement::Rbar(e) => e.eid,
            RigidElement::Rbe2(e) => e.eid,
        }
    }

    fn comment(&self) -> &str {
        match self {
            RigidElement::Rbar(e) => &e.comment,
            RigidElement::Rbe2(e) => &e.comment,
        }
    }

    fn raw_fields(&self) -> Vec<Field> {
        let comp = |c: i32| if c == 0 { Field::Blank } else { Field::Int(c) };
        match self {
            RigidElement::Rbar(e) => vec![
                Field::text("RBAR"),
                Field::Int(e.eid),
                Field::Int(e.ga),
                Field::Int(e.gb),
                comp(e.cna),
                comp(e.cnb),
                comp(e.cma),
                comp(e.cmb),
                Field::Float(e.alpha),
            ],
            RigidElement::Rbe2(e) => {
                let mut fields = vec![
                    Field::text("RBE2"),
                    Field::Int(e.eid),
                    Field::Int(e.gn),
                    comp(e.cm),
                ];
                fields.extend(e.gmi.iter().copied().map(Field::Int));
                if e.alpha != 0.0 {
                    fields.push(Field::Float(e.alpha));
                }
                fields
            }
        }
    }

    fn references(&self) -> Vec<Reference> {
        self.node_ids()
            .into_iter()
            .map(|n| Reference::new(RefTarget::Node, n, "nodes"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive(self.card_type(), self.id(), "eid", &[self.id()])?;
        verify_positive(self.card_type(), self.id(), "node ids", &self.node_ids())
    }
}
