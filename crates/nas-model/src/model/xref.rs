//! Cross-reference validation and borrowed relation views

use super::BdfModel;
use super::get::{MaterialRef, NodeRef};
use crate::elements::Element;
use crate::entity::RefTarget;
use crate::error::{ModelError, Result};
use crate::properties::Property;
use crate::slots::Slot;
use nalgebra::Point3;
use tracing::{debug, info, warn};

/// An element with its property and nodes resolved
#[derive(Debug, Clone)]
pub struct ElementRef<'a> {
    pub element: &'a Element,
    pub property: Option<PropertyRef<'a>>,
    pub nodes: Vec<NodeRef<'a>>,
}

/// A property with its materials resolved
#[derive(Debug, Clone)]
pub struct PropertyRef<'a> {
    pub property: &'a Property,
    pub materials: Vec<MaterialRef<'a>>,
}

impl BdfModel {
    /// True when `id` resolves in the category `target` names
    pub fn has_target(&self, target: RefTarget, id: i32) -> bool {
        match target {
            RefTarget::Node => self.nodes.contains_key(&id) || self.spoints.contains(&id),
            RefTarget::Coord => self.coords.contains_key(&id),
            RefTarget::Property => self.properties.contains_key(&id),
            RefTarget::MassProperty => self.properties_mass.contains_key(&id),
            RefTarget::Material => self.materials.contains_key(&id) || self.thermal_materials.contains_key(&id),
            RefTarget::Element => self.elements.contains_key(&id),
            RefTarget::Load => self.loads.contains_key(&id),
            RefTarget::Table => self
                .generic
                .get(&Slot::Tables)
                .is_some_and(|tables| tables.contains_key(&id)),
        }
    }

    /// Resolve every stored ID reference
    ///
    /// All dangling references are collected before failing, one message per
    /// miss. On success the model is marked cross-referenced.
    pub fn cross_reference(&mut self) -> Result<()> {
        let mut missing = Vec::new();
        let mut checked = 0usize;
        for slot in Slot::ALL {
            for entry in self.slot_entries(slot) {
                for reference in entry.references() {
                    checked += 1;
                    if !self.has_target(reference.target, reference.id) {
                        missing.push(format!(
                            "{} {}: {}={} references a missing {} {}",
                            entry.card_type(),
                            entry.id(),
                            reference.field,
                            reference.id,
                            reference.target.label(),
                            reference.id
                        ));
                    }
                }
            }
        }
        if !missing.is_empty() {
            warn!(missing = missing.len(), "cross-reference failed");
            return Err(ModelError::CrossReference { missing });
        }
        self.is_xref = true;
        info!(references = checked, "model cross-referenced");
        Ok(())
    }

    /// Drop the cross-referenced state before mutating or re-serializing
    pub fn uncross_reference(&mut self) {
        if self.is_xref {
            debug!("model uncross-referenced");
        }
        self.is_xref = false;
    }

    /// Element view with its property, materials and nodes resolved
    pub fn element_ref(&self, eid: i32) -> Result<ElementRef<'_>> {
        let element = self.element(eid, "")?;
        let context = format!("which is required by element {eid}");
        let property = match element.pid().filter(|&pid| pid > 0) {
            Some(pid) => Some(self.property_ref(pid, &context)?),
            None => None,
        };
        let nodes = element
            .node_ids()
            .into_iter()
            .map(|nid| self.node(nid, &context))
            .collect::<Result<Vec<_>>>()?;
        Ok(ElementRef {
            element,
            property,
            nodes,
        })
    }

    /// Property view with its materials resolved
    pub fn property_ref(&self, pid: i32, context: &str) -> Result<PropertyRef<'_>> {
        let property = self.property(pid, context)?;
        let context = format!("which is required by property {pid}");
        let materials = property
            .material_ids()
            .into_iter()
            .map(|mid| self.material(mid, &context))
            .collect::<Result<Vec<_>>>()?;
        Ok(PropertyRef { property, materials })
    }

    /// Location of a node in the basic frame
    pub fn node_position(&self, nid: i32) -> Result<Point3<f64>> {
        let grid = self
            .nodes
            .get(&nid)
            .ok_or_else(|| super::get::not_found("Node", nid, "", self.nodes.keys().copied().collect()))?;
        if grid.cp == 0 {
            return Ok(Point3::from(grid.xyz));
        }
        let frame = self.coord_frame(grid.cp)?;
        Ok(frame.to_basic(grid.xyz))
    }

    /// Frame of a coordinate system in the basic frame, following `rid`
    fn coord_frame(&self, cid: i32) -> Result<crate::coords::Frame> {
        let mut chain = Vec::new();
        let mut current = cid;
        while current != 0 {
            if chain.len() > self.coords.len() {
                return Err(ModelError::Coordinate {
                    cid,
                    message: "reference chain is cyclic".to_string(),
                });
            }
            let coord = self.coord(current, "")?;
            chain.push(coord);
            current = coord.rid;
        }
        let mut frame = crate::coords::Frame::basic();
        for coord in chain.iter().rev() {
            frame = coord.frame_in(&frame)?;
        }
        Ok(frame)
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
GRID,3,5,1.,0.,0.
CORD2R,5,,10.,0.,0.,10.,0.,1.
,11.,0.,0.
CROD,10,7,1,2
PROD,7,3,0.5
MAT1,3,2.0+5,,0.3
FORCE,100,2,,10.,1.,0.,0.
";

    fn model(extra: &str) -> BdfModel {
        let deck = Deck::parse_str(&format!("{DECK}{extra}")).expect("deck should parse");
        BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("model should build")
    }

    #[test]
    fn complete_model_cross_references() {
        let mut model = model("");
        model.cross_reference().expect("all references resolve");
        assert!(model.is_xref());
        model.uncross_reference();
        assert!(!model.is_xref());
    }

    #[test]
    fn every_miss_is_reported() {
        let mut model = model("CROD,11,8,1,99\nFORCE,101,98,,1.,1.,0.,0.\n");
        let err = model.cross_reference().expect_err("dangling references");
        match err {
            ModelError::CrossReference { missing } => {
                assert_eq!(missing.len(), 3);
                assert!(missing.iter().any(|m| m.contains("missing Node 99")));
                assert!(missing.iter().any(|m| m.contains("missing Property 8")));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(!model.is_xref());
    }

    #[test]
    fn element_view_resolves_property_and_material() {
        let model = model("");
        let view = model.element_ref(10).expect("element 10");
        assert_eq!(view.nodes.len(), 2);
        let property = view.property.expect("CROD has a property");
        assert_eq!(property.property.pid(), 7);
        assert_eq!(property.materials[0].mid(), 3);
    }

    #[test]
    fn node_in_local_system_is_moved_to_basic() {
        let model = model("");
        let p = model.node_position(3).expect("node 3");
        assert!((p - Point3::new(11.0, 0.0, 0.0)).norm() < 1e-12);
        let p = model.node_position(2).expect("node 2");
        assert_eq!(p, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn cyclic_coordinate_chain_fails() {
        let model = model(
            "CORD2R,6,7,0.,0.,0.,0.,0.,1.\n,1.,0.,0.\nCORD2R,7,6,0.,0.,0.,0.,0.,1.\n,1.,0.,0.\nGRID,4,6,0.,0.,0.\n",
        );
        let err = model.node_position(4).expect_err("6 and 7 reference each other");
        assert!(err.to_string().contains("cyclic"));
    }
}
