//! Derived indices, computed on demand in one pass over a category

use super::BdfModel;
use super::get::not_found;
use crate::elements::DimFilter;
use crate::entity::BulkEntry;
use crate::error::{ModelError, Result};
use crate::slots::{Slot, SlotConfig};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// An undirected edge, smaller node ID first
pub type Edge = (i32, i32);

/// Edge and node adjacency built by [`BdfModel::get_maps`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMaps {
    pub edge_to_eids: BTreeMap<Edge, Vec<i32>>,
    pub eid_to_edges: BTreeMap<i32, Vec<Edge>>,
    pub nid_to_edges: BTreeMap<i32, Vec<Edge>>,
    pub nid_to_eids: BTreeMap<i32, Vec<i32>>,
}

/// Canonical key of an undirected edge
pub fn canonical_edge(a: i32, b: i32) -> Edge {
    if a <= b { (a, b) } else { (b, a) }
}

impl BdfModel {
    fn slot_config_for(&self, reset_type_to_slot_map: bool) -> std::borrow::Cow<'_, SlotConfig> {
        if reset_type_to_slot_map {
            let mut rebuilt = self.config.slots.clone();
            rebuilt.rebuild();
            std::borrow::Cow::Owned(rebuilt)
        } else {
            std::borrow::Cow::Borrowed(&self.config.slots)
        }
    }

    /// IDs stored under each requested card type, sorted
    ///
    /// A card type with no category is an error when `stop_on_missing_card`
    /// is set and an empty list otherwise. `reset_type_to_slot_map` resolves
    /// card types against a freshly rebuilt map.
    pub fn get_card_ids_by_card_types(
        &self,
        card_types: &[&str],
        reset_type_to_slot_map: bool,
        stop_on_missing_card: bool,
    ) -> Result<BTreeMap<String, Vec<i32>>> {
        let slots = self.slot_config_for(reset_type_to_slot_map);
        let mut out = BTreeMap::new();
        for &card_type in card_types {
            let card_type = card_type.to_ascii_uppercase();
            let ids = match slots.slot_of(&card_type) {
                Ok(Slot::Spoints) => self.spoints.iter().copied().collect(),
                Ok(slot) => {
                    let mut ids: Vec<i32> = self
                        .slot_entries(slot)
                        .into_iter()
                        .filter(|e| e.card_type() == card_type)
                        .map(|e| e.id())
                        .collect();
                    ids.sort_unstable();
                    ids.dedup();
                    ids
                }
                Err(e) if stop_on_missing_card => return Err(e),
                Err(e) => {
                    warn!(card = %card_type, error = %e, "card type has no category");
                    Vec::new()
                }
            };
            out.insert(card_type, ids);
        }
        Ok(out)
    }

    /// Entities stored under each requested card type, in ID order
    pub fn get_cards_by_card_types(
        &self,
        card_types: &[&str],
        reset_type_to_slot_map: bool,
        stop_on_missing_card: bool,
    ) -> Result<BTreeMap<String, Vec<&dyn BulkEntry>>> {
        let slots = self.slot_config_for(reset_type_to_slot_map);
        let mut out = BTreeMap::new();
        for &card_type in card_types {
            let card_type = card_type.to_ascii_uppercase();
            let cards = match slots.slot_of(&card_type) {
                Ok(slot) => self
                    .slot_entries(slot)
                    .into_iter()
                    .filter(|e| e.card_type() == card_type)
                    .collect(),
                Err(e) if stop_on_missing_card => return Err(e),
                Err(e) => {
                    warn!(card = %card_type, error = %e, "card type has no category");
                    Vec::new()
                }
            };
            out.insert(card_type, cards);
        }
        Ok(out)
    }

    /// Edge and node adjacency of the elements whose dimension passes
    /// `filter`, built in one traversal
    pub fn get_maps(&self, filter: DimFilter) -> ModelMaps {
        let mut maps = ModelMaps::default();
        for (&eid, element) in &self.elements {
            if !filter.accepts(element.dim()) {
                continue;
            }
            let mut nids = element.node_ids();
            nids.sort_unstable();
            nids.dedup();
            for nid in nids {
                maps.nid_to_eids.entry(nid).or_default().push(eid);
            }
            let edges = element.edges();
            for &(a, b) in &edges {
                let edge = canonical_edge(a, b);
                maps.edge_to_eids.entry(edge).or_default().push(eid);
                for nid in [a, b] {
                    let node_edges = maps.nid_to_edges.entry(nid).or_default();
                    if !node_edges.contains(&edge) {
                        node_edges.push(edge);
                    }
                }
            }
            maps.eid_to_edges.insert(eid, edges);
        }
        maps
    }

    /// Node → element adjacency over every node; unused nodes map to an
    /// empty list
    pub fn get_node_id_to_element_ids_map(&self) -> BTreeMap<i32, Vec<i32>> {
        let mut map: BTreeMap<i32, Vec<i32>> = self.node_ids().into_iter().map(|nid| (nid, Vec::new())).collect();
        for (&eid, element) in &self.elements {
            let mut nids = element.node_ids();
            nids.sort_unstable();
            nids.dedup();
            for nid in nids {
                map.entry(nid).or_default().push(eid);
            }
        }
        map
    }

    /// Property → element adjacency over every property. Elements without a
    /// property, or with property 0, are left out.
    pub fn get_property_id_to_element_ids_map(&self) -> BTreeMap<i32, Vec<i32>> {
        let mut map: BTreeMap<i32, Vec<i32>> = self.properties.keys().map(|&pid| (pid, Vec::new())).collect();
        for (&eid, element) in &self.elements {
            if let Some(pid) = element.pid().filter(|&pid| pid > 0) {
                map.entry(pid).or_default().push(eid);
            }
        }
        map
    }

    /// Material → property adjacency over every material. A property using
    /// one material several times (PCOMP plies) is listed once.
    pub fn get_material_id_to_property_ids_map(&self) -> BTreeMap<i32, Vec<i32>> {
        let mut map: BTreeMap<i32, Vec<i32>> = self
            .materials
            .keys()
            .chain(self.thermal_materials.keys())
            .map(|&mid| (mid, Vec::new()))
            .collect();
        for (&pid, property) in &self.properties {
            for mid in property.material_ids() {
                map.entry(mid).or_default().push(pid);
            }
        }
        map
    }

    /// Elements using any of `pids`, sorted
    pub fn get_element_ids_list_with_pids(&self, pids: &[i32]) -> Vec<i32> {
        let wanted: BTreeSet<i32> = pids.iter().copied().collect();
        self.elements
            .iter()
            .filter(|(_, e)| e.pid().is_some_and(|pid| wanted.contains(&pid)))
            .map(|(&eid, _)| eid)
            .collect()
    }

    /// Elements per requested property
    ///
    /// # Errors
    /// `NotFound` for a property the model does not hold; `Verify` for a
    /// property no element uses when `stop_if_no_eids` is set.
    pub fn get_element_ids_dict_with_pids(
        &self,
        pids: &[i32],
        stop_if_no_eids: bool,
    ) -> Result<BTreeMap<i32, Vec<i32>>> {
        let by_pid = self.get_property_id_to_element_ids_map();
        let mut out = BTreeMap::new();
        for &pid in pids {
            let eids = by_pid
                .get(&pid)
                .ok_or_else(|| not_found("Property", pid, "", self.properties.keys().copied().collect()))?;
            if eids.is_empty() {
                if stop_if_no_eids {
                    let card = self.properties.get(&pid).map_or("PROPERTY", |p| p.card_type());
                    return Err(ModelError::verify(card, pid, "no elements use this property"));
                }
                warn!(pid, "no elements use this property");
            }
            out.insert(pid, eids.clone());
        }
        Ok(out)
    }

    /// Rigid elements touching any of `nids`, sorted
    pub fn get_rigid_elements_with_node_ids(&self, nids: &BTreeSet<i32>) -> Vec<i32> {
        self.rigid_elements
            .iter()
            .filter(|(_, r)| r.node_ids().iter().any(|n| nids.contains(n)))
            .map(|(&eid, _)| eid)
            .collect()
    }

    /// Nodes used by the given elements or masses
    pub fn get_node_ids_with_elements(&self, eids: &[i32]) -> Result<BTreeSet<i32>> {
        let mut nids = BTreeSet::new();
        for &eid in eids {
            if let Some(element) = self.elements.get(&eid) {
                nids.extend(element.node_ids());
            } else if let Some(mass) = self.masses.get(&eid) {
                nids.extend(mass.node_ids());
            } else {
                let valid: BTreeSet<i32> = self.elements.keys().chain(self.masses.keys()).copied().collect();
                return Err(not_found("Element", eid, "", valid.into_iter().collect()));
            }
        }
        nids.remove(&0);
        Ok(nids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use nas_bdf::Deck;

    const DECK: &str = "\
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
GRID,3,,1.,1.,0.
GRID,4,,0.,1.,0.
GRID,5,,2.,0.,0.
CQUAD4,10,1,1,2,3,4
CTRIA3,11,1,2,5,3
CELAS2,20,1.0+3,1,1,2,1
CROD,30,2,1,5
PSHELL,1,100,0.1
PROD,2,200,1.0
PSHELL,3,100,0.2
PCOMP,4
,100,0.1,0.,,200,0.1,45.
,100,0.1,90.
MAT1,100,2.0+5,,0.3
MAT1,200,7.0+4,,0.33
RBE2,40,5,123456,3
";

    fn model() -> BdfModel {
        let deck = Deck::parse_str(DECK).expect("deck should parse");
        BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("model should build")
    }

    #[test]
    fn shared_edge_has_both_elements() {
        let maps = model().get_maps(DimFilter::default());
        assert_eq!(maps.edge_to_eids[&(2, 3)], vec![10, 11]);
        assert!(maps.edge_to_eids.keys().all(|(a, b)| a < b));
        assert!(!maps.eid_to_edges.contains_key(&20));
        assert_eq!(maps.eid_to_edges[&30], vec![(1, 5)]);
        assert_eq!(maps.nid_to_eids[&5], vec![11, 30]);
    }

    #[test]
    fn scalar_elements_need_the_zero_dim_filter() {
        let maps = model().get_maps(DimFilter::all());
        assert_eq!(maps.eid_to_edges[&20], vec![(1, 2)]);
    }

    #[test]
    fn property_and_material_maps() {
        let model = model();
        let pid_to_eids = model.get_property_id_to_element_ids_map();
        assert_eq!(pid_to_eids[&1], vec![10, 11]);
        assert!(pid_to_eids[&3].is_empty());
        let mid_to_pids = model.get_material_id_to_property_ids_map();
        assert_eq!(mid_to_pids[&100], vec![1, 3, 4]);
        assert_eq!(mid_to_pids[&200], vec![2, 4]);
    }

    #[test]
    fn element_ids_with_pids() {
        let model = model();
        assert_eq!(model.get_element_ids_list_with_pids(&[1, 2]), vec![10, 11, 30]);
        let by_pid = model.get_element_ids_dict_with_pids(&[1, 3], false).expect("known pids");
        assert!(by_pid[&3].is_empty());
        model
            .get_element_ids_dict_with_pids(&[3], true)
            .expect_err("pid 3 is unused");
        model
            .get_element_ids_dict_with_pids(&[99], false)
            .expect_err("pid 99 does not exist");
    }

    #[test]
    fn card_ids_by_card_types() {
        let model = model();
        let ids = model
            .get_card_ids_by_card_types(&["CQUAD4", "CTRIA3", "CFOO"], false, false)
            .expect("soft fail on CFOO");
        assert_eq!(ids["CQUAD4"], vec![10]);
        assert_eq!(ids["CTRIA3"], vec![11]);
        assert!(ids["CFOO"].is_empty());
        let err = model
            .get_card_ids_by_card_types(&["CFOO"], true, true)
            .expect_err("CFOO has no category");
        assert!(matches!(err, ModelError::Configuration(_)));
        let cards = model
            .get_cards_by_card_types(&["MAT1"], false, true)
            .expect("MAT1 is registered");
        assert_eq!(cards["MAT1"].len(), 2);
    }

    #[test]
    fn node_and_rigid_queries() {
        let model = model();
        let nid_to_eids = model.get_node_id_to_element_ids_map();
        assert_eq!(nid_to_eids[&1], vec![10, 20, 30]);
        let nodes = model.get_node_ids_with_elements(&[11]).expect("element 11");
        assert_eq!(nodes.into_iter().collect::<Vec<_>>(), vec![2, 3, 5]);
        let rigid = model.get_rigid_elements_with_node_ids(&BTreeSet::from([3]));
        assert_eq!(rigid, vec![40]);
        model.get_node_ids_with_elements(&[99]).expect_err("element 99 missing");
    }
}
