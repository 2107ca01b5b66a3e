//! Single- and multi-point constraints

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// Enforced component of an SPC entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpcTerm {
    pub node: i32,
    pub components: i32,
    /// Enforced displacement
    pub enforced: f64,
}

/// SPC: enforced displacements at up to two grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spc {
    pub sid: i32,
    pub terms: Vec<SpcTerm>,
    #[serde(default)]
    pub comment: String,
}

impl Spc {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        card.ensure_max_len(8)?;
        let mut terms = vec![SpcTerm {
            node: card.integer(2, "G1")?,
            components: card.components_or_blank(3, "C1", 0)?,
            enforced: card.double_or_blank(4, "D1", 0.0)?,
        }];
        if let Some(node) = card.integer_or_none(5, "G2")? {
            terms.push(SpcTerm {
                node,
                components: card.components_or_blank(6, "C2", 0)?,
                enforced: card.double_or_blank(7, "D2", 0.0)?,
            });
        }
        Ok(Spc {
            sid: card.integer(1, "sid")?,
            terms,
            comment: comment.to_string(),
        })
    }
}

/// SPC1: fixed components on a list of grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spc1 {
    pub sid: i32,
    pub components: i32,
    pub nodes: Vec<i32>,
    #[serde(default)]
    pub comment: String,
}

impl Spc1 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let nodes = card.integer_list(3, "nodes")?;
        if nodes.is_empty() {
            return Err(ModelError::field("SPC1", 3, "G1", "is required but blank"));
        }
        Ok(Spc1 {
            sid: card.integer(1, "sid")?,
            components: card.components_or_blank(2, "components", 0)?,
            nodes,
            comment: comment.to_string(),
        })
    }
}

/// A single-point constraint card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpcConstraint {
    Spc(Spc),
    Spc1(Spc1),
}

impl SpcConstraint {
    /// Constraint set ID
    pub fn sid(&self) -> i32 {
        match self {
            SpcConstraint::Spc(c) => c.sid,
            SpcConstraint::Spc1(c) => c.sid,
        }
    }

    /// Constrained nodes
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            SpcConstraint::Spc(c) => c.terms.iter().map(|t| t.node).collect(),
            SpcConstraint::Spc1(c) => c.nodes.clone(),
        }
    }

    /// Apply `map` to every constrained node
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        match self {
            SpcConstraint::Spc(c) => c.terms.iter_mut().for_each(|t| t.node = map(t.node)),
            SpcConstraint::Spc1(c) => c.nodes.iter_mut().for_each(|n| *n = map(*n)),
        }
    }
}

impl BulkEntry for SpcConstraint {
    fn card_type(&self) -> &str {
        match self {
            SpcConstraint::Spc(_) => "SPC",
            SpcConstraint::Spc1(_) => "SPC1",
        }
    }

    fn id(&self) -> i32 {
        self.sid()
    }

    fn comment(&self) -> &str {
        match self {
            SpcConstraint::Spc(c) => &c.comment,
            SpcConstraint::Spc1(c) => &c.comment,
        }
    }

    fn raw_fields(&self) -> Vec<Field> {
        match self {
            SpcConstraint::Spc(c) => {
                let mut fields = vec![Field::text("SPC"), Field::Int(c.sid)];
                for t in &c.terms {
                    fields.extend([Field::Int(t.node), Field::Int(t.components), Field::Float(t.enforced)]);
                }
                fields
            }
            SpcConstraint::Spc1(c) => {
                let mut fields = vec![Field::text("SPC1"), Field::Int(c.sid), Field::Int(c.components)];
                fields.extend(c.nodes.iter().copied().map(Field::Int));
                fields
            }
        }
    }

    fn references(&self) -> Vec<Reference> {
        self.node_ids()
            .into_iter()
            .map(|nid| Reference::new(RefTarget::Node, nid, "nodes"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive(self.card_type(), self.sid(), "sid/nodes", &[self.sid()])?;
        verify_positive(self.card_type(), self.sid(), "nodes", &self.node_ids())
    }
}

/// One term of a multi-point constraint equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MpcTerm {
    pub node: i32,
    pub component: i32,
    pub coefficient: f64,
}

/// MPC: linear relation between grid components, the first term dependent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mpc {
    pub sid: i32,
    pub terms: Vec<MpcTerm>,
    #[serde(default)]
    pub comment: String,
}

/// Field index of the first entry of each term on an MPC card. The first
/// line carries two terms, each continuation line two more after a blank.
fn mpc_term_start(term: usize) -> usize {
    let line = term / 2;
    let base = if line == 0 { 2 } else { 8 * line + 2 };
    base + 3 * (term % 2)
}

impl Mpc {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let mut terms = Vec::new();
        let mut term = 0;
        loop {
            let start = mpc_term_start(term);
            if start >= card.len() {
                break;
            }
            if let Some(node) = card.integer_or_none(start, "G")? {
                terms.push(MpcTerm {
                    node,
                    component: card.components_or_blank(start + 1, "C", 0)?,
                    coefficient: card.double(start + 2, "A")?,
                });
            }
            term += 1;
        }
        if terms.is_empty() {
            return Err(ModelError::field("MPC", 2, "G1", "is required but blank"));
        }
        Ok(Mpc {
            sid: card.integer(1, "sid")?,
            terms,
            comment: comment.to_string(),
        })
    }

    /// Nodes in the equation, dependent first
    pub fn node_ids(&self) -> Vec<i32> {
        self.terms.iter().map(|t| t.node).collect()
    }

    /// Apply `map` to every node of the equation
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        for t in &mut self.terms {
            t.node = map(t.node);
        }
    }
}

impl BulkEntry for Mpc {
    fn card_type(&self) -> &str {
        "MPC"
    }

    fn id(&self) -> i32 {
        self.sid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::text("MPC"), Field::Int(self.sid)];
        for (i, t) in self.terms.iter().enumerate() {
            let start = mpc_term_start(i);
            fields.resize(start, Field::Blank);
            fields.extend([Field::Int(t.node), Field::Int(t.component), Field::Float(t.coefficient)]);
        }
        fields
    }

    fn references(&self) -> Vec<Reference> {
        self.node_ids()
            .into_iter()
            .map(|nid| Reference::new(RefTarget::Node, nid, "nodes"))
            .collect()
    }

    fn verify(&self) -> Result<()> {
        verify_positive("MPC", self.sid, "sid", &[self.sid])?;
        if self.terms[0].coefficient == 0.0 {
            return Err(ModelError::verify("MPC", self.sid, "dependent coefficient is zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spc1_expands_thru() {
        let card = BdfCard::from_tokens(&["SPC1", "1", "123456", "1", "THRU", "4"]);
        let spc = SpcConstraint::Spc1(Spc1::add_card(&card, "").expect("SPC1"));
        assert_eq!(spc.node_ids(), vec![1, 2, 3, 4]);
        spc.verify().expect("SPC1 should verify");
    }

    #[test]
    fn spc_second_grid_is_optional() {
        let card = BdfCard::from_tokens(&["SPC", "2", "10", "3", "0.1"]);
        let spc = Spc::add_card(&card, "").expect("SPC");
        assert_eq!(spc.terms.len(), 1);
        assert_eq!(spc.terms[0].enforced, 0.1);
    }

    #[test]
    fn mpc_terms_across_continuation() {
        let card = BdfCard::from_tokens(&[
            "MPC", "7", "1", "1", "1.0", "2", "1", "-0.5", "", "", "3", "2", "-0.5",
        ]);
        let mut mpc = Mpc::add_card(&card, "").expect("MPC");
        assert_eq!(mpc.node_ids(), vec![1, 2, 3]);
        let back = Mpc::add_card(&BdfCard::new(mpc.raw_fields()), "").expect("MPC text");
        assert_eq!(mpc, back);
        mpc.replace_node_ids(|n| if n == 3 { 2 } else { n });
        assert_eq!(mpc.node_ids(), vec![1, 2, 2]);
    }
}
