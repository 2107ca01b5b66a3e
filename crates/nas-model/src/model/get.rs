//! Lookup layer: one accessor per category
//!
//! Every accessor takes an ID and a context string describing the caller
//! (e.g. `"which is required by CQUAD4 eid=10"`). A miss is a `NotFound`
//! error listing the sorted IDs the category does hold; no accessor returns
//! a placeholder entity.

use super::BdfModel;
use crate::constraints::{Mpc, SpcConstraint};
use crate::coords::Coord;
use crate::elements::Element;
use crate::entity::BulkEntry;
use crate::error::{ModelError, Result};
use crate::generic::GenericCard;
use crate::loads::{Conv, Darea, Load};
use crate::masses::Mass;
use crate::materials::{Mat4, StructuralMaterial};
use crate::nodes::Grid;
use crate::params::Param;
use crate::properties::{Pmass, Property};
use crate::rigid::RigidElement;
use crate::sets::Set1;
use crate::slots::Slot;
use std::collections::BTreeMap;

/// A node reference resolved to a GRID or an SPOINT
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Grid(&'a Grid),
    Spoint(i32),
}

impl NodeRef<'_> {
    pub fn nid(&self) -> i32 {
        match self {
            NodeRef::Grid(g) => g.nid,
            NodeRef::Spoint(id) => *id,
        }
    }
}

/// A material resolved from either material category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialRef<'a> {
    Structural(&'a StructuralMaterial),
    Thermal(&'a Mat4),
}

impl MaterialRef<'_> {
    pub fn mid(&self) -> i32 {
        match self {
            MaterialRef::Structural(m) => m.id(),
            MaterialRef::Thermal(m) => m.mid,
        }
    }
}

fn context_suffix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("; {context}")
    }
}

pub(crate) fn not_found(category: &'static str, id: i32, context: &str, valid_ids: Vec<i32>) -> ModelError {
    ModelError::NotFound {
        category,
        id,
        context: context_suffix(context),
        valid_ids,
    }
}

fn lookup<'a, T>(map: &'a BTreeMap<i32, T>, category: &'static str, id: i32, context: &str) -> Result<&'a T> {
    map.get(&id)
        .ok_or_else(|| not_found(category, id, context, map.keys().copied().collect()))
}

fn lookup_set<'a, T>(
    map: &'a BTreeMap<i32, Vec<T>>,
    category: &'static str,
    id: i32,
    context: &str,
) -> Result<&'a [T]> {
    lookup(map, category, id, context).map(Vec::as_slice)
}

fn lookup_named<'a, T>(map: &'a BTreeMap<String, T>, category: &'static str, name: &str) -> Result<&'a T> {
    map.get(name).ok_or_else(|| ModelError::NameNotFound {
        category,
        name: name.to_string(),
        valid: map.keys().cloned().collect(),
    })
}

macro_rules! generic_accessors {
    ($($(#[$doc:meta])* $name:ident => $slot:ident, $label:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, id: i32, context: &str) -> Result<&GenericCard> {
                self.generic_card(Slot::$slot, $label, id, context)
            }
        )*
    };
}

impl BdfModel {
    /// GRID or SPOINT by ID
    pub fn node(&self, nid: i32, context: &str) -> Result<NodeRef<'_>> {
        if let Some(grid) = self.nodes.get(&nid) {
            return Ok(NodeRef::Grid(grid));
        }
        if self.spoints.contains(&nid) {
            return Ok(NodeRef::Spoint(nid));
        }
        Err(not_found("Node", nid, context, self.node_ids().into_iter().collect()))
    }

    /// Node by ID where `0` means "no node"
    pub fn node_or_empty(&self, nid: i32, context: &str) -> Result<Option<NodeRef<'_>>> {
        if nid == 0 {
            return Ok(None);
        }
        self.node(nid, context).map(Some)
    }

    /// Several nodes, reporting every missing ID at once
    pub fn nodes_by_ids(&self, nids: &[i32], context: &str) -> Result<Vec<NodeRef<'_>>> {
        let mut found = Vec::with_capacity(nids.len());
        let mut missing = Vec::new();
        for &nid in nids {
            match self.node(nid, context) {
                Ok(node) => found.push(node),
                Err(_) => missing.push(nid),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }
        Err(ModelError::NotFound {
            category: "Nodes",
            id: missing[0],
            context: format!(" (missing {missing:?}){}", context_suffix(context)),
            valid_ids: self.node_ids().into_iter().collect(),
        })
    }

    pub fn element(&self, eid: i32, context: &str) -> Result<&Element> {
        lookup(&self.elements, "Element", eid, context)
    }

    pub fn elements_by_ids(&self, eids: &[i32], context: &str) -> Result<Vec<&Element>> {
        eids.iter()
            .map(|&eid| lookup(&self.elements, "Elements", eid, context))
            .collect()
    }

    pub fn mass(&self, eid: i32, context: &str) -> Result<&Mass> {
        lookup(&self.masses, "Mass", eid, context)
    }

    pub fn rigid_element(&self, eid: i32, context: &str) -> Result<&RigidElement> {
        lookup(&self.rigid_elements, "RigidElement", eid, context)
    }

    pub fn property(&self, pid: i32, context: &str) -> Result<&Property> {
        lookup(&self.properties, "Property", pid, context)
    }

    pub fn properties_by_ids(&self, pids: &[i32], context: &str) -> Result<Vec<&Property>> {
        pids.iter()
            .map(|&pid| lookup(&self.properties, "Properties", pid, context))
            .collect()
    }

    pub fn property_mass(&self, pid: i32, context: &str) -> Result<&Pmass> {
        lookup(&self.properties_mass, "PropertyMass", pid, context)
    }

    /// Structural material first, then thermal
    pub fn material(&self, mid: i32, context: &str) -> Result<MaterialRef<'_>> {
        if let Some(m) = self.materials.get(&mid) {
            return Ok(MaterialRef::Structural(m));
        }
        if let Some(m) = self.thermal_materials.get(&mid) {
            return Ok(MaterialRef::Thermal(m));
        }
        let mut valid: Vec<i32> = self
            .materials
            .keys()
            .chain(self.thermal_materials.keys())
            .copied()
            .collect();
        valid.sort_unstable();
        valid.dedup();
        Err(not_found("Material", mid, context, valid))
    }

    pub fn materials_by_ids(&self, mids: &[i32], context: &str) -> Result<Vec<MaterialRef<'_>>> {
        mids.iter().map(|&mid| self.material(mid, context)).collect()
    }

    pub fn structural_material(&self, mid: i32, context: &str) -> Result<&StructuralMaterial> {
        lookup(&self.materials, "StructuralMaterial", mid, context)
    }

    pub fn thermal_material(&self, mid: i32, context: &str) -> Result<&Mat4> {
        lookup(&self.thermal_materials, "ThermalMaterial", mid, context)
    }

    /// Every static load entry of a load set
    pub fn load(&self, sid: i32, context: &str) -> Result<&[Load]> {
        lookup_set(&self.loads, "Load", sid, context)
    }

    pub fn darea(&self, sid: i32, context: &str) -> Result<&[Darea]> {
        lookup_set(&self.dareas, "DArea", sid, context)
    }

    /// Convection conditions on a surface element
    pub fn bc(&self, eid: i32, context: &str) -> Result<&[Conv]> {
        lookup_set(&self.bcs, "BC", eid, context)
    }

    pub fn dload_entries(&self, sid: i32, context: &str) -> Result<&[GenericCard]> {
        lookup_set(&self.dload_entries, "DLoad entries", sid, context)
    }

    pub fn spc(&self, sid: i32, context: &str) -> Result<&[SpcConstraint]> {
        lookup_set(&self.spcs, "SPC", sid, context)
    }

    pub fn mpc(&self, sid: i32, context: &str) -> Result<&[Mpc]> {
        lookup_set(&self.mpcs, "MPC", sid, context)
    }

    pub fn set(&self, sid: i32, context: &str) -> Result<&Set1> {
        lookup(&self.sets, "Set", sid, context)
    }

    /// Coordinate system; `0` is the basic system
    pub fn coord(&self, cid: i32, context: &str) -> Result<&Coord> {
        lookup(&self.coords, "Coord", cid, context)
    }

    pub fn param(&self, key: &str) -> Result<&Param> {
        lookup_named(&self.params, "PARAM", &key.to_ascii_uppercase())
    }

    /// Header and column cards of a DMIG matrix, in deck order
    pub fn dmig(&self, name: &str) -> Result<&[GenericCard]> {
        lookup_named(&self.dmigs, "DMIG", &name.to_ascii_uppercase()).map(Vec::as_slice)
    }

    /// Card from an identity-only category
    pub fn generic_card(&self, slot: Slot, category: &'static str, id: i32, context: &str) -> Result<&GenericCard> {
        match self.generic.get(&slot) {
            Some(map) => lookup(map, category, id, context),
            None => Err(not_found(category, id, context, Vec::new())),
        }
    }

    generic_accessors! {
        phbdy => Phbdys, "Phbdy";
        hyperelastic_material => HyperelasticMaterials, "HyperelasticMaterial";
        dload => Dloads, "DLoad";
        delay => Delays, "Delay";
        /// Superelement set
        set_super => SeSets, "SetSuper";
        aero => Aero, "Aero";
        aeros => Aeros, "Aeros";
        caero => Caeros, "CAero";
        paero => Paeros, "PAero";
        spline => Splines, "Spline";
        aestat => Aestats, "AEStat";
        aelist => Aelists, "AEList";
        aefact => Aefacts, "AEFact";
        aelink => Aelinks, "AELink";
        aeparam => Aeparams, "AEParam";
        gust => Gusts, "Gust";
        flfact => Flfacts, "FLFACT";
        flutter => Flutters, "Flutter";
        dconstr => Dconstrs, "DConstr";
        dresp => Dresps, "DResp";
        desvar => Desvars, "Desvar";
        ddval => Ddvals, "DDVal";
        dvprel => Dvprels, "DVprel";
        dvmrel => Dvmrels, "DVmrel";
        dvcrel => Dvcrels, "DVcrel";
        /// Real eigenvalue method
        method => Methods, "Method";
        /// Complex eigenvalue method
        cmethod => Cmethods, "CMethod";
        table => Tables, "Table";
        random_table => RandomTables, "RandomTable";
        nlparm => Nlparms, "NLParm";
        dequation => Dequations, "DEQATN";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::materials::Mat1;

    fn model_with_materials(mids: &[i32]) -> BdfModel {
        let mut model = BdfModel::default();
        for &mid in mids {
            let mat = StructuralMaterial::Mat1(Mat1::new(mid, 2.0e5, 0.3));
            model.add_entity(Entity::Material(mat)).expect("material should insert");
        }
        model
    }

    #[test]
    fn material_miss_lists_valid_ids() {
        let model = model_with_materials(&[3, 1, 2]);
        let err = model.material(999, "").expect_err("999 is not loaded");
        assert!(err.to_string().contains("1, 2, 3"));
    }

    #[test]
    fn empty_category_lists_nothing() {
        let model = BdfModel::default();
        let err = model.property(1, "which is required by CQUAD4 eid=10").expect_err("no properties");
        let msg = err.to_string();
        assert!(msg.contains("required by CQUAD4 eid=10"));
        assert!(msg.ends_with("Allowed Property ids=[]"));
        let err = model.flutter(30, "").expect_err("no flutter cards");
        assert!(err.to_string().ends_with("ids=[]"));
    }

    #[test]
    fn node_resolves_spoints_and_empty() {
        let mut model = BdfModel::default();
        model.add_entity(Entity::Grid(Grid::new(1, [0.0; 3]))).expect("grid");
        model.add_entity(Entity::SPoints(vec![7])).expect("spoint");
        assert_eq!(model.node(7, "").expect("spoint 7").nid(), 7);
        assert!(model.node_or_empty(0, "").expect("0 is empty").is_none());
        let err = model.node(2, "").expect_err("node 2 missing");
        assert!(err.to_string().contains("[1, 7]"));
    }

    #[test]
    fn named_lookup_lists_names() {
        let model = BdfModel::default();
        let err = model.param("POST").expect_err("no params");
        assert!(matches!(err, ModelError::NameNotFound { .. }));
    }

    #[test]
    fn coord_zero_is_basic() {
        let model = BdfModel::default();
        assert_eq!(model.coord(0, "").expect("basic system").cid, 0);
    }
}
