//! Element catalogue
//!
//! [`Element`] is the closed set of element kinds stored in the model's
//! element category. Topology queries (node lists, edges, dimensionality)
//! live here so the lookup layer and equivalencing can treat every element
//! uniformly.

pub mod line;
pub mod scalar;
pub mod shell;
pub mod solid;
pub mod thermal;

pub use line::{Cbar, Cbeam, Cgap, Conrod, Orientation, Rod, RodCard};
pub use scalar::{Coefficient, ScalarCard, ScalarElement, ScalarShape};
pub use shell::{Shell, ShellCard, ThetaMcid};
pub use solid::{Solid, SolidKind};
pub use thermal::Chbdyg;

use crate::entity::{BulkEntry, Reference};
use crate::error::Result;
use crate::field::Field;
use serde::{Deserialize, Serialize};

/// Topological dimension of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementDim {
    /// Scalar springs, dampers
    Zero,
    /// Rods, bars, beams, gaps
    One,
    /// Shells and surfaces
    Two,
    /// Solids
    Three,
}

/// Which dimensions a derived-index traversal considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimFilter {
    pub zero: bool,
    pub one: bool,
    pub two: bool,
    pub three: bool,
}

impl Default for DimFilter {
    fn default() -> Self {
        DimFilter {
            zero: false,
            one: true,
            two: true,
            three: true,
        }
    }
}

impl DimFilter {
    /// Every dimension
    pub fn all() -> Self {
        DimFilter {
            zero: true,
            one: true,
            two: true,
            three: true,
        }
    }

    pub fn accepts(&self, dim: ElementDim) -> bool {
        match dim {
            ElementDim::Zero => self.zero,
            ElementDim::One => self.one,
            ElementDim::Two => self.two,
            ElementDim::Three => self.three,
        }
    }
}

/// Corner-index pairs of each face/volume topology
const LINE_EDGES: &[(usize, usize)] = &[(0, 1)];
const TRI_EDGES: &[(usize, usize)] = &[(0, 1), (1, 2), (2, 0)];
const QUAD_EDGES: &[(usize, usize)] = &[(0, 1), (1, 2), (2, 3), (3, 0)];
const TET_EDGES: &[(usize, usize)] = &[(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)];
const PENTA_EDGES: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 0),
    (3, 4),
    (4, 5),
    (5, 3),
    (0, 3),
    (1, 4),
    (2, 5),
];
const HEXA_EDGES: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// An element of any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Scalar(ScalarElement),
    Rod(Rod),
    Conrod(Conrod),
    Bar(Cbar),
    Beam(Cbeam),
    Gap(Cgap),
    Shell(Shell),
    Solid(Solid),
    Chbdyg(Chbdyg),
}

impl Element {
    fn entry(&self) -> &dyn BulkEntry {
        match self {
            Element::Scalar(e) => e,
            Element::Rod(e) => e,
            Element::Conrod(e) => e,
            Element::Bar(e) => e,
            Element::Beam(e) => e,
            Element::Gap(e) => e,
            Element::Shell(e) => e,
            Element::Solid(e) => e,
            Element::Chbdyg(e) => e,
        }
    }

    /// Element ID
    pub fn eid(&self) -> i32 {
        self.entry().id()
    }

    /// Property ID, `None` for elements without one
    pub fn pid(&self) -> Option<i32> {
        match self {
            Element::Scalar(e) => e.pid(),
            Element::Rod(e) => Some(e.pid),
            Element::Bar(e) => Some(e.pid),
            Element::Beam(e) => Some(e.pid),
            Element::Gap(e) => Some(e.pid),
            Element::Shell(e) => Some(e.pid),
            Element::Solid(e) => Some(e.pid),
            Element::Conrod(_) | Element::Chbdyg(_) => None,
        }
    }

    /// Connectivity, grounded/absent slots dropped, order preserved
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            Element::Scalar(e) => e.node_ids(),
            Element::Rod(e) => e.nodes.to_vec(),
            Element::Conrod(e) => e.nodes.to_vec(),
            Element::Bar(e) => e.nodes.to_vec(),
            Element::Beam(e) => e.nodes.to_vec(),
            Element::Gap(e) => e.nodes.to_vec(),
            Element::Shell(e) => e.node_ids(),
            Element::Solid(e) => e.node_ids(),
            Element::Chbdyg(e) => e.node_ids(),
        }
    }

    /// Topological dimension
    pub fn dim(&self) -> ElementDim {
        match self {
            Element::Scalar(_) => ElementDim::Zero,
            Element::Rod(_) | Element::Conrod(_) | Element::Bar(_) | Element::Beam(_) | Element::Gap(_) => {
                ElementDim::One
            }
            Element::Shell(_) | Element::Chbdyg(_) => ElementDim::Two,
            Element::Solid(_) => ElementDim::Three,
        }
    }

    fn corners_and_topology(&self) -> (Vec<i32>, &'static [(usize, usize)]) {
        match self {
            Element::Scalar(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Rod(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Conrod(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Bar(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Beam(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Gap(e) => (e.nodes.to_vec(), LINE_EDGES),
            Element::Shell(e) => {
                let corners = e.nodes[..e.card.corner_count()].to_vec();
                let topology = if corners.len() == 3 { TRI_EDGES } else { QUAD_EDGES };
                (corners, topology)
            }
            Element::Solid(e) => {
                let corners = e.nodes[..e.kind.corner_count()].to_vec();
                let topology = match e.kind {
                    SolidKind::Tetra4 | SolidKind::Tetra10 => TET_EDGES,
                    SolidKind::Penta6 | SolidKind::Penta15 => PENTA_EDGES,
                    SolidKind::Hexa8 | SolidKind::Hexa20 => HEXA_EDGES,
                };
                (corners, topology)
            }
            Element::Chbdyg(e) => {
                let corners = e.node_ids();
                let topology = match corners.len() {
                    2 => LINE_EDGES,
                    3 | 6 => TRI_EDGES,
                    _ => QUAD_EDGES,
                };
                let n = if corners.len() == 6 { 3 } else { corners.len().min(4) };
                (corners[..n].to_vec(), topology)
            }
        }
    }

    /// Undirected edges between corner nodes, each stored smaller ID first
    ///
    /// Edges touching a grounded slot or collapsing onto a single node are
    /// left out.
    pub fn edges(&self) -> Vec<(i32, i32)> {
        let (corners, topology) = self.corners_and_topology();
        topology
            .iter()
            .filter_map(|&(i, j)| {
                let (a, b) = (*corners.get(i)?, *corners.get(j)?);
                if a == 0 || b == 0 || a == b {
                    return None;
                }
                Some(if a < b { (a, b) } else { (b, a) })
            })
            .collect()
    }

    /// Apply `map` to every node reference, including orientation grids
    pub fn replace_node_ids(&mut self, map: impl Fn(i32) -> i32) {
        let apply = |n: &mut i32| {
            if *n != 0 {
                *n = map(*n);
            }
        };
        match self {
            Element::Scalar(e) => e.nodes.iter_mut().for_each(apply),
            Element::Rod(e) => e.nodes.iter_mut().for_each(apply),
            Element::Conrod(e) => e.nodes.iter_mut().for_each(apply),
            Element::Bar(e) => {
                e.nodes.iter_mut().for_each(apply);
                if let Orientation::Grid { g0 } = &mut e.orientation {
                    apply(g0);
                }
            }
            Element::Beam(e) => {
                e.nodes.iter_mut().for_each(apply);
                if let Orientation::Grid { g0 } = &mut e.orientation {
                    apply(g0);
                }
            }
            Element::Gap(e) => {
                e.nodes.iter_mut().for_each(apply);
                if let Orientation::Grid { g0 } = &mut e.orientation {
                    apply(g0);
                }
            }
            Element::Shell(e) => e.nodes.iter_mut().for_each(apply),
            Element::Solid(e) => e.nodes.iter_mut().for_each(apply),
            Element::Chbdyg(e) => e.nodes.iter_mut().for_each(apply),
        }
    }

    /// Node IDs that appear more than once in the connectivity
    pub fn repeated_nodes(&self) -> Vec<i32> {
        let mut ids = self.node_ids();
        ids.sort_unstable();
        let mut repeated: Vec<i32> = ids.windows(2).filter(|w| w[0] == w[1]).map(|w| w[0]).collect();
        repeated.dedup();
        repeated
    }
}

impl BulkEntry for Element {
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
    use crate::field::BdfCard;

    fn quad(nodes: [&str; 4]) -> Element {
        let mut tokens = vec!["CQUAD4", "1", "1"];
        tokens.extend(nodes);
        let card = BdfCard::from_tokens(&tokens);
        Element::Shell(Shell::add_card(ShellCard::Cquad4, &card, "").expect("CQUAD4"))
    }

    #[test]
    fn quad_edges_are_canonical() {
        let element = quad(["4", "3", "2", "1"]);
        let edges = element.edges();
        assert_eq!(edges, vec![(3, 4), (2, 3), (1, 2), (1, 4)]);
        assert!(edges.iter().all(|(a, b)| a < b));
        assert_eq!(element.dim(), ElementDim::Two);
    }

    #[test]
    fn hexa_has_twelve_edges() {
        let mut tokens = vec!["CHEXA".to_string(), "2".to_string(), "1".to_string()];
        tokens.extend((1..=8).map(|n| n.to_string()));
        let hexa = Solid::add_card(&BdfCard::from_tokens(&tokens), "").expect("CHEXA");
        assert_eq!(Element::Solid(hexa).edges().len(), 12);
    }

    #[test]
    fn replace_creates_repeated_nodes() {
        let mut element = quad(["1", "2", "3", "4"]);
        element.replace_node_ids(|n| if n == 2 { 1 } else { n });
        assert_eq!(element.node_ids(), vec![1, 1, 3, 4]);
        assert_eq!(element.repeated_nodes(), vec![1]);
        assert_eq!(element.edges().len(), 3);
    }

    #[test]
    fn dim_filter_defaults_skip_scalars() {
        let filter = DimFilter::default();
        assert!(!filter.accepts(ElementDim::Zero));
        assert!(filter.accepts(ElementDim::Three));
        assert!(DimFilter::all().accepts(ElementDim::Zero));
    }
}
