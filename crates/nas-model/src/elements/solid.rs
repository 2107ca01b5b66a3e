//! Solid elements (CTETRA, CPENTA, CHEXA)

use crate::entity::{BulkEntry, RefTarget, Reference, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use crate::op2_data::RecordData;
use serde::{Deserialize, Serialize};

/// Solid topology, linear or quadratic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolidKind {
    Tetra4,
    Tetra10,
    Penta6,
    Penta15,
    Hexa8,
    Hexa20,
}

impl SolidKind {
    /// Card name shared by the linear and quadratic variants
    pub fn card_name(self) -> &'static str {
        match self {
            SolidKind::Tetra4 | SolidKind::Tetra10 => "CTETRA",
            SolidKind::Penta6 | SolidKind::Penta15 => "CPENTA",
            SolidKind::Hexa8 | SolidKind::Hexa20 => "CHEXA",
        }
    }

    pub fn node_count(self) -> usize {
        match self {
            SolidKind::Tetra4 => 4,
            SolidKind::Tetra10 => 10,
            SolidKind::Penta6 => 6,
            SolidKind::Penta15 => 15,
            SolidKind::Hexa8 => 8,
            SolidKind::Hexa20 => 20,
        }
    }

    pub fn corner_count(self) -> usize {
        match self {
            SolidKind::Tetra4 | SolidKind::Tetra10 => 4,
            SolidKind::Penta6 | SolidKind::Penta15 => 6,
            SolidKind::Hexa8 | SolidKind::Hexa20 => 8,
        }
    }

    /// Linear and quadratic variants of a card name
    pub fn variants(card_name: &str) -> Option<(SolidKind, SolidKind)> {
        match card_name {
            "CTETRA" => Some((SolidKind::Tetra4, SolidKind::Tetra10)),
            "CPENTA" => Some((SolidKind::Penta6, SolidKind::Penta15)),
            "CHEXA" => Some((SolidKind::Hexa8, SolidKind::Hexa20)),
            _ => None,
        }
    }

    /// Choose the variant from a full node list: any non-zero mid-side
    /// node selects the quadratic element
    pub fn select(card_name: &str, nodes: &[i32]) -> Option<SolidKind> {
        let (linear, quadratic) = SolidKind::variants(card_name)?;
        let corners = linear.corner_count();
        if nodes.iter().skip(corners).any(|&n| n > 0) {
            Some(quadratic)
        } else {
            Some(linear)
        }
    }
}

/// A solid element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub kind: SolidKind,
    pub eid: i32,
    pub pid: i32,
    /// Corner nodes then mid-side nodes; absent mid-side nodes are 0
    pub nodes: Vec<i32>,
    #[serde(default)]
    pub comment: String,
}

impl Solid {
    /// Build from a text card; the node count picks the variant
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let name = card.name();
        let (_, quadratic) = SolidKind::variants(&name)
            .ok_or_else(|| ModelError::field(&name, 0, "name", "is not a solid card"))?;
        card.ensure_max_len(3 + quadratic.node_count())?;
        let eid = card.integer(1, "eid")?;
        let all = (0..quadratic.node_count())
            .map(|i| card.integer_or_blank(3 + i, "node", 0))
            .collect::<Result<Vec<_>>>()?;
        let kind = SolidKind::select(&name, &all).unwrap_or(quadratic);
        let mut nodes = all;
        nodes.truncate(kind.node_count());
        let solid = Solid {
            kind,
            eid,
            pid: card.integer_or_blank(2, "pid", eid)?,
            nodes,
            comment: comment.to_string(),
        };
        if let Some(i) = solid.nodes[..kind.corner_count()].iter().position(|&n| n == 0) {
            return Err(ModelError::field(&name, 3 + i, "node", "is required but blank"));
        }
        Ok(solid)
    }

    /// Build from `(eid, pid, n1..nN)` where N is the quadratic node count
    pub fn add_op2_data(card_name: &str, data: RecordData<'_>) -> Result<Self> {
        let (_, quadratic) = SolidKind::variants(card_name)
            .ok_or_else(|| ModelError::field(card_name, 0, "name", "is not a solid card"))?;
        let eid = data.int(0)?;
        let pid = data.int(1)?;
        let all = (0..quadratic.node_count())
            .map(|i| data.int(2 + i))
            .collect::<Result<Vec<_>>>()?;
        let kind = SolidKind::select(card_name, &all).unwrap_or(quadratic);
        let mut nodes = all;
        nodes.truncate(kind.node_count());
        Ok(Solid {
            kind,
            eid,
            pid,
            nodes,
            comment: String::new(),
        })
    }

    /// Build a linear tetrahedron from a CTETP tuple `(eid, pid, n1..n4, ...)`
    pub fn add_ctetp_data(data: RecordData<'_>) -> Result<Self> {
        let eid = data.int(0)?;
        let pid = data.int(1)?;
        let nodes = data.ints::<4>(2)?.to_vec();
        Ok(Solid {
            kind: SolidKind::Tetra4,
            eid,
            pid,
            nodes,
            comment: String::new(),
        })
    }

    /// Non-zero nodes in connectivity order
    pub fn node_ids(&self) -> Vec<i32> {
        self.nodes.iter().copied().filter(|&n| n != 0).collect()
    }
}

impl BulkEntry for Solid {
    fn card_type(&self) -> &str {
        self.kind.card_name()
    }

    fn id(&self) -> i32 {
        self.eid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::text(self.kind.card_name()),
            Field::Int(self.eid),
            Field::Int(self.pid),
        ];
        fields.extend(
            self.nodes
                .iter()
                .map(|&n| if n == 0 { Field::Blank } else { Field::Int(n) }),
        );
        fields
    }

    fn references(&self) -> Vec<Reference> {
        self.node_ids()
            .into_iter()
            .map(|n| Reference::new(RefTarget::Node, n, "nodes"))
            .chain([Reference::new(RefTarget::Property, self.pid, "pid")])
            .collect()
    }

    fn verify(&self) -> Result<()> {
        let name = self.kind.card_name();
        verify_positive(name, self.eid, "eid/pid", &[self.eid, self.pid])?;
        verify_positive(name, self.eid, "corner nodes", &self.nodes[..self.kind.corner_count()])?;
        let mut corners = self.nodes[..self.kind.corner_count()].to_vec();
        corners.sort_unstable();
        corners.dedup();
        if corners.len() != self.kind.corner_count() {
            return Err(ModelError::verify(name, self.eid, "repeated corner node"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op2_data::Word;

    #[test]
    fn ctetra_selects_variant_from_midside_nodes() {
        let mut words: Vec<Word> = [1, 1, 1, 2, 3, 4].into_iter().map(Word::Int).collect();
        words.extend(std::iter::repeat_n(Word::Int(0), 6));
        let tet = Solid::add_op2_data("CTETRA", RecordData::new("CTETRA", &words)).expect("CTETRA");
        assert_eq!(tet.kind, SolidKind::Tetra4);
        assert_eq!(tet.nodes.len(), 4);

        words[9] = Word::Int(8);
        let tet = Solid::add_op2_data("CTETRA", RecordData::new("CTETRA", &words)).expect("CTETRA");
        assert_eq!(tet.kind, SolidKind::Tetra10);
        assert_eq!(tet.nodes.len(), 10);
        assert_eq!(tet.node_ids(), vec![1, 2, 3, 4, 8]);
    }

    #[test]
    fn chexa20_text_round_trip() {
        let mut tokens = vec!["CHEXA".to_string(), "3".to_string(), "1".to_string()];
        tokens.extend((1..=20).map(|n| n.to_string()));
        let hexa = Solid::add_card(&BdfCard::from_tokens(&tokens), "").expect("CHEXA");
        assert_eq!(hexa.kind, SolidKind::Hexa20);
        let back = Solid::add_card(&BdfCard::new(hexa.raw_fields()), "").expect("CHEXA text");
        assert_eq!(hexa, back);
        hexa.verify().expect("CHEXA should verify");
    }

    #[test]
    fn missing_corner_is_an_error() {
        let card = BdfCard::from_tokens(&["CPENTA", "3", "1", "1", "2", "3", "4", "5"]);
        assert!(Solid::add_card(&card, "").is_err());
    }
}
