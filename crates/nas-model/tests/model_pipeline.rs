//! End-to-end tests for the text construction path.
//!
//! 1. Tokenize a bulk-data deck
//! 2. Build the model graph
//! 3. Query it through the lookup layer and derived maps
//! 4. Cross-reference and write it back out

use nas_bdf::Deck;
use nas_model::{BdfModel, DimFilter, ModelConfig, ModelError, ModelSummary};

const PLATE: &str = r#"
SOL 101
CEND
BEGIN BULK
$ corner nodes
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
GRID,3,,1.,1.,0.
GRID,4,,0.,1.,0.
GRID,5,,2.,0.,0.
GRID,6,,2.,1.,0.
CQUAD4,1,10,1,2,3,4
CQUAD4,2,10,2,5,6,3
PSHELL,10,1,0.05,1
MAT1,1,2.1+5,,0.3,7.85-9
MAT1,2,7.0+4,,0.33
MAT1,3,1.1+5,,0.34
SPC1,100,123456,1,4
FORCE,200,5,,1000.,1.,0.,0.
FORCE,200,6,,1000.,1.,0.,0.
PARAM,POST,-1
ENDDATA
"#;

fn plate() -> BdfModel {
    let deck = Deck::parse_str(PLATE).expect("Failed to parse plate deck");
    BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("Failed to build plate model")
}

#[test]
fn plate_builds_and_cross_references() {
    let mut model = plate();
    assert_eq!(model.nodes.len(), 6);
    assert_eq!(model.elements.len(), 2);
    assert_eq!(model.loads[&200].len(), 2);
    model.cross_reference().expect("plate references should resolve");

    let view = model.element_ref(2).expect("element 2 view");
    assert_eq!(view.nodes.iter().map(|n| n.nid()).collect::<Vec<_>>(), vec![2, 5, 6, 3]);
    let property = view.property.expect("CQUAD4 has a PSHELL");
    assert_eq!(property.materials.len(), 1);
}

#[test]
fn missing_material_lists_valid_ids() {
    let model = plate();
    let err = model.material(999, "").expect_err("material 999 does not exist");
    assert!(matches!(err, ModelError::NotFound { id: 999, .. }));
    assert!(err.to_string().contains("Allowed Material ids=[1, 2, 3]"));

    let err = model.mass(1, "").expect_err("plate has no masses");
    assert!(err.to_string().ends_with("ids=[]"));
}

#[test]
fn shared_edge_links_both_quads() {
    let model = plate();
    let maps = model.get_maps(DimFilter::default());
    assert_eq!(maps.edge_to_eids[&(2, 3)], vec![1, 2]);
    assert_eq!(maps.edge_to_eids.len(), 7);
    assert_eq!(model.get_node_id_to_element_ids_map()[&3], vec![1, 2]);
}

#[test]
fn written_deck_round_trips_through_a_file() {
    let model = plate();
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("plate.bdf");
    model.write_bulk_file(&path).expect("deck should be written");

    let deck = Deck::parse_file(&path).expect("written deck should parse");
    let back = BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("written deck should build");
    assert_eq!(back.nodes, model.nodes);
    assert_eq!(back.elements, model.elements);
    assert_eq!(back.properties, model.properties);
    assert_eq!(back.materials, model.materials);
    assert_eq!(
        ModelSummary::from_model(&back).card_count,
        ModelSummary::from_model(&model).card_count
    );
}
