//! Node equivalencing
//!
//! Nodes closer than a tolerance are merged into the smallest ID of their
//! cluster:
//!
//! 1. Index every node of interest in a k-d tree (basic-frame positions)
//! 2. Query each node's `k` nearest neighbours within the tolerance
//! 3. Union every compatible candidate pair, the root always being the
//!    smaller ID, so merge chains resolve to the cluster minimum whatever
//!    the pair order
//! 4. Rewrite every node reference in the model and flag degenerate elements

use crate::error::{DegenerateElement, EquivalenceError, Result};
use crate::kdtree::KdTree;
use nas_model::generic::GenericCard;
use nas_model::{BdfModel, BulkEntry, Field};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Equivalencing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceConfig {
    /// Largest distance between two merged nodes
    pub tolerance: f64,
    /// Neighbours examined per node
    pub neighbor_count: usize,
    /// Fail instead of reporting elements that become degenerate
    pub strict: bool,
    /// Only consider nodes referenced by an element
    pub only_element_nodes: bool,
    /// Run the neighbour queries on the rayon pool
    pub parallel: bool,
}

impl Default for EquivalenceConfig {
    fn default() -> Self {
        EquivalenceConfig {
            tolerance: 1e-5,
            neighbor_count: 10,
            strict: false,
            only_element_nodes: false,
            parallel: true,
        }
    }
}

impl EquivalenceConfig {
    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EquivalenceError::Config(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.neighbor_count == 0 {
            return Err(EquivalenceError::Config("neighbor_count must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Outcome of one equivalencing pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct EquivalenceResult {
    /// Merged-away node → surviving node
    pub canonical: BTreeMap<i32, i32>,
    /// Elements whose connectivity now repeats a node
    pub degenerate: Vec<DegenerateElement>,
    /// Candidate pairs left apart because `cd`, `ps` or `seid` differ
    pub incompatible: Vec<(i32, i32)>,
    /// Cards still holding a merged-away node ID that were not rewritten
    pub stale: Vec<StaleReference>,
}

/// A card whose ID lists mention merged-away nodes
///
/// SET1 lists and verbatim cards do not say which of their integers are
/// grid IDs, so they are reported instead of rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleReference {
    pub card_type: String,
    /// Card ID, or the matrix name for DMIG
    pub key: String,
    pub nids: Vec<i32>,
}

impl EquivalenceResult {
    pub fn merged(&self) -> usize {
        self.canonical.len()
    }
}

/// Canonical map plus the candidate pairs that could not be merged
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    pub canonical: BTreeMap<i32, i32>,
    pub incompatible: Vec<(i32, i32)>,
}

/// Disjoint sets over node IDs whose representative is the set minimum
#[derive(Debug, Default)]
struct MinIdUnion {
    parent: BTreeMap<i32, i32>,
}

impl MinIdUnion {
    fn find(&mut self, nid: i32) -> i32 {
        let mut root = nid;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        let mut current = nid;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: i32, b: i32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent.insert(keep, keep);
        self.parent.insert(drop, keep);
    }

    /// Every ID whose representative is not itself
    fn into_canonical(mut self) -> BTreeMap<i32, i32> {
        let ids: Vec<i32> = self.parent.keys().copied().collect();
        ids.into_iter()
            .filter_map(|nid| {
                let root = self.find(nid);
                (root != nid).then_some((nid, root))
            })
            .collect()
    }
}

/// Resolve merge pairs into a node → cluster-minimum map
pub fn resolve_clusters(pairs: &[(i32, i32)]) -> BTreeMap<i32, i32> {
    let mut sets = MinIdUnion::default();
    for &(a, b) in pairs {
        sets.union(a, b);
    }
    sets.into_canonical()
}

fn nodes_of_interest(model: &BdfModel, config: &EquivalenceConfig) -> Vec<i32> {
    let live = model.nodes.values().filter(|g| !g.is_replaced()).map(|g| g.nid);
    if config.only_element_nodes {
        let referenced: BTreeSet<i32> = model.elements.values().flat_map(|e| e.node_ids()).collect();
        live.filter(|nid| referenced.contains(nid)).collect()
    } else {
        live.collect()
    }
}

/// Find which nodes merge into which, without touching the model
pub fn plan_merges(model: &BdfModel, config: &EquivalenceConfig) -> Result<MergePlan> {
    config.validate()?;
    let nids = nodes_of_interest(model, config);
    let points = nids
        .iter()
        .map(|&nid| model.node_position(nid))
        .collect::<nas_model::Result<Vec<_>>>()?;
    let tree = KdTree::new(points);

    // the node itself is always its own first hit
    let k = config.neighbor_count + 1;
    let query = |i: usize| -> Vec<(i32, i32)> {
        tree.nearest_within(&tree.point(i), k, config.tolerance)
            .into_iter()
            .filter(|n| n.index != i)
            .map(|n| {
                let (a, b) = (nids[i], nids[n.index]);
                if a < b { (a, b) } else { (b, a) }
            })
            .collect()
    };
    let mut candidates: Vec<(i32, i32)> = if config.parallel {
        (0..nids.len()).into_par_iter().flat_map_iter(query).collect()
    } else {
        (0..nids.len()).flat_map(query).collect()
    };
    candidates.sort_unstable();
    candidates.dedup();
    debug!(nodes = nids.len(), candidates = candidates.len(), "equivalence candidates");

    let mut pairs = Vec::with_capacity(candidates.len());
    let mut incompatible = Vec::new();
    for (a, b) in candidates {
        let (ga, gb) = (&model.nodes[&a], &model.nodes[&b]);
        if ga.cd == gb.cd && ga.ps == gb.ps && ga.seid == gb.seid {
            pairs.push((a, b));
        } else {
            warn!(
                a,
                b,
                cd = ?(ga.cd, gb.cd),
                ps = ?(ga.ps, gb.ps),
                seid = ?(ga.seid, gb.seid),
                "coincident nodes differ in cd/ps/seid, not merged"
            );
            incompatible.push((a, b));
        }
    }

    Ok(MergePlan {
        canonical: resolve_clusters(&pairs),
        incompatible,
    })
}

/// Merge coincident nodes and rewrite every node reference
///
/// Merged-away GRIDs stay in the model flagged with `replaced_by`, moved
/// onto their canonical node, and are left out when the model is written.
///
/// # Errors
/// `Degenerate` under `strict` when an element ends up with a repeated
/// node; the model has already been rewritten at that point.
pub fn equivalence_nodes(model: &mut BdfModel, config: &EquivalenceConfig) -> Result<EquivalenceResult> {
    let MergePlan { canonical, incompatible } = plan_merges(model, config)?;
    if canonical.is_empty() {
        info!(incompatible = incompatible.len(), "no nodes to merge");
        return Ok(EquivalenceResult {
            canonical,
            incompatible,
            ..EquivalenceResult::default()
        });
    }

    for (&nid, &keep) in &canonical {
        let (xyz, cp) = {
            let target = &model.nodes[&keep];
            (target.xyz, target.cp)
        };
        if let Some(grid) = model.nodes.get_mut(&nid) {
            grid.xyz = xyz;
            grid.cp = cp;
            grid.replaced_by = Some(keep);
        }
    }

    let map = |nid: i32| canonical.get(&nid).copied().unwrap_or(nid);
    let mut touched = Vec::new();
    for (&eid, element) in model.elements.iter_mut() {
        if element.node_ids().iter().any(|n| canonical.contains_key(n)) {
            element.replace_node_ids(map);
            touched.push(eid);
        }
    }
    model.masses.values_mut().for_each(|m| m.replace_node_ids(map));
    model.rigid_elements.values_mut().for_each(|r| r.replace_node_ids(map));
    model.loads.values_mut().flatten().for_each(|l| l.replace_node_ids(map));
    model.dareas.values_mut().flatten().for_each(|d| d.replace_node_ids(map));
    model.bcs.values_mut().flatten().for_each(|c| c.replace_node_ids(map));
    model.spcs.values_mut().flatten().for_each(|s| s.replace_node_ids(map));
    model.mpcs.values_mut().flatten().for_each(|m| m.replace_node_ids(map));
    model.uncross_reference();

    let mut degenerate = Vec::new();
    for eid in touched {
        let element = &model.elements[&eid];
        let repeated = element.repeated_nodes();
        if !repeated.is_empty() {
            warn!(eid, card = element.card_type(), ?repeated, "element became degenerate");
            degenerate.push(DegenerateElement {
                eid,
                card_type: element.card_type().to_string(),
                repeated,
            });
        }
    }

    let stale = stale_references(model, &canonical);
    for card in &stale {
        warn!(card = %card.card_type, key = %card.key, nids = ?card.nids, "card may reference merged-away nodes");
    }

    info!(
        merged = canonical.len(),
        degenerate = degenerate.len(),
        stale = stale.len(),
        incompatible = incompatible.len(),
        tolerance = config.tolerance,
        "equivalenced nodes"
    );
    if config.strict && !degenerate.is_empty() {
        return Err(EquivalenceError::Degenerate { elements: degenerate });
    }
    Ok(EquivalenceResult {
        canonical,
        degenerate,
        incompatible,
        stale,
    })
}

/// SET1 grid lists and verbatim cards mentioning a merged-away node
fn stale_references(model: &BdfModel, canonical: &BTreeMap<i32, i32>) -> Vec<StaleReference> {
    let mut stale = Vec::new();

    // skin sets list elements
    for set in model.sets.values().filter(|s| !s.skin) {
        let nids = merged_ids(set.ids.iter().copied(), canonical);
        if !nids.is_empty() {
            stale.push(StaleReference {
                card_type: set.card_type().to_string(),
                key: set.sid.to_string(),
                nids,
            });
        }
    }

    let verbatim = model
        .generic
        .values()
        .flat_map(|cards| cards.values())
        .chain(model.dload_entries.values().flatten())
        .chain(model.dmigs.values().flatten());
    for card in verbatim {
        let nids = merged_ids(card_integers(card), canonical);
        if !nids.is_empty() {
            stale.push(StaleReference {
                card_type: card.card_type.clone(),
                key: card.name.clone().unwrap_or_else(|| card.id.to_string()),
                nids,
            });
        }
    }
    stale
}

/// Sorted, unique IDs of `ids` that were merged away
fn merged_ids(ids: impl Iterator<Item = i32>, canonical: &BTreeMap<i32, i32>) -> Vec<i32> {
    let hits: BTreeSet<i32> = ids.filter(|n| canonical.contains_key(n)).collect();
    hits.into_iter().collect()
}

/// Integer fields after the card's own identity
fn card_integers(card: &GenericCard) -> impl Iterator<Item = i32> + '_ {
    card.fields.iter().skip(2).filter_map(|f| match f {
        Field::Int(n) => Some(*n),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_resolve_to_the_minimum_in_any_order() {
        let pairs = [(7, 9), (3, 9), (9, 12), (20, 21)];
        let expected = BTreeMap::from([(7, 3), (9, 3), (12, 3), (21, 20)]);
        let mut order = pairs.to_vec();
        for _ in 0..order.len() {
            order.rotate_left(1);
            assert_eq!(resolve_clusters(&order), expected);
            let reversed: Vec<(i32, i32)> = order.iter().rev().map(|&(a, b)| (b, a)).collect();
            assert_eq!(resolve_clusters(&reversed), expected);
        }
    }

    #[test]
    fn no_pairs_no_merges() {
        assert!(resolve_clusters(&[]).is_empty());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let model = BdfModel::default();
        let config = EquivalenceConfig {
            tolerance: f64::NAN,
            ..EquivalenceConfig::default()
        };
        let err = plan_merges(&model, &config).expect_err("NaN tolerance");
        assert!(matches!(err, EquivalenceError::Config(_)));

        let config = EquivalenceConfig {
            neighbor_count: 0,
            ..EquivalenceConfig::default()
        };
        assert!(plan_merges(&model, &config).is_err());
    }
}
