//! End-to-end tests for node equivalencing.
//!
//! 1. Build a model from a small deck with near-coincident nodes
//! 2. Merge nodes within the tolerance
//! 3. Check every node reference was rewritten to the cluster minimum
//! 4. Run again to check nothing else merges

use nas_bdf::Deck;
use nas_mesh::{EquivalenceConfig, EquivalenceError, equivalence_nodes, plan_merges};
use nas_model::{BdfModel, ModelConfig};
use std::collections::BTreeMap;

const TWO_TRIANGLES: &str = r#"
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,0.,0.,0.0005
GRID,3,,0.,0.,10.
GRID,4,,10.,0.,0.
GRID,5,,0.,10.,0.
CTRIA3,10,1,1,3,4
CTRIA3,11,1,2,3,5
PSHELL,1,1,0.1
MAT1,1,2.1+5,,0.3
CONM2,20,2,,5.
SPC1,100,123,2,4
FORCE,200,2,,10.,0.,0.,1.
ENDDATA
"#;

fn build(text: &str) -> BdfModel {
    let deck = Deck::parse_str(text).expect("Failed to parse deck");
    BdfModel::build_from_deck(&deck, ModelConfig::default()).expect("Failed to build model")
}

fn config(tolerance: f64) -> EquivalenceConfig {
    EquivalenceConfig {
        tolerance,
        ..EquivalenceConfig::default()
    }
}

#[test]
fn close_node_merges_into_the_smaller_id() {
    let mut model = build(TWO_TRIANGLES);
    model.cross_reference().expect("deck references should resolve");

    let result = equivalence_nodes(&mut model, &config(0.001)).expect("equivalence should succeed");
    assert_eq!(result.canonical, BTreeMap::from([(2, 1)]));
    assert_eq!(result.merged(), 1);
    assert!(result.degenerate.is_empty());
    assert!(result.stale.is_empty());
    assert!(!model.is_xref());

    for element in model.elements.values() {
        assert!(!element.node_ids().contains(&2), "element {} still uses node 2", element.eid());
    }
    assert_eq!(model.elements[&11].node_ids(), vec![1, 3, 5]);
    assert_eq!(model.masses[&20].node_ids(), vec![1]);
    assert_eq!(model.spcs[&100][0].node_ids(), vec![1, 4]);
    assert_eq!(model.loads[&200][0].node_ids(), vec![1]);

    let merged = &model.nodes[&2];
    assert_eq!(merged.replaced_by, Some(1));
    assert_eq!(merged.xyz, [0.0, 0.0, 0.0]);

    let text = model.write_bulk();
    assert!(!text.lines().any(|l| l.starts_with("GRID,2,")));
    model.cross_reference().expect("rewritten references should resolve");
}

#[test]
fn second_pass_merges_nothing() {
    let mut model = build(TWO_TRIANGLES);
    equivalence_nodes(&mut model, &config(0.001)).expect("first pass");
    let again = equivalence_nodes(&mut model, &config(0.001)).expect("second pass");
    assert!(again.canonical.is_empty());
}

#[test]
fn tolerance_below_the_gap_merges_nothing() {
    let model = build(TWO_TRIANGLES);
    let plan = plan_merges(&model, &config(0.0001)).expect("plan");
    assert!(plan.canonical.is_empty());
}

#[test]
fn clusters_resolve_to_their_minimum_regardless_of_query_order() {
    let deck = r#"
BEGIN BULK
GRID,9,,0.,0.,0.
GRID,4,,0.,0.,0.0008
GRID,7,,0.,0.,0.0016
GRID,2,,5.,5.,5.
GRID,8,,5.,5.,5.0001
ENDDATA
"#;
    let model = build(deck);
    let expected = BTreeMap::from([(7, 4), (9, 4), (8, 2)]);
    for parallel in [false, true] {
        let plan = plan_merges(
            &model,
            &EquivalenceConfig {
                parallel,
                ..config(0.001)
            },
        )
        .expect("plan");
        assert_eq!(plan.canonical, expected);
    }
}

#[test]
fn incompatible_nodes_are_reported_not_merged() {
    let deck = r#"
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,0.,0.,0.,1
GRID,3,,1.,0.,0.,,123
GRID,4,,1.,0.,0.
ENDDATA
"#;
    let mut model = build(deck);
    let result = equivalence_nodes(&mut model, &config(0.001)).expect("equivalence");
    assert!(result.canonical.is_empty());
    assert_eq!(result.incompatible, vec![(1, 2), (3, 4)]);
}

#[test]
fn collapsed_element_is_reported_or_fatal_under_strict() {
    let deck = r#"
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,0.,0.,0.0005
GRID,3,,1.,0.,0.
CTRIA3,5,1,1,2,3
ENDDATA
"#;
    let mut model = build(deck);
    let result = equivalence_nodes(&mut model, &config(0.001)).expect("lenient pass");
    assert_eq!(result.degenerate.len(), 1);
    assert_eq!(result.degenerate[0].eid, 5);
    assert_eq!(result.degenerate[0].repeated, vec![1]);
    assert_eq!(model.elements[&5].node_ids(), vec![1, 1, 3]);

    let mut model = build(deck);
    let strict = EquivalenceConfig {
        strict: true,
        ..config(0.001)
    };
    let err = equivalence_nodes(&mut model, &strict).expect_err("strict mode rejects degenerate elements");
    assert!(matches!(err, EquivalenceError::Degenerate { ref elements } if elements.len() == 1));
    assert!(err.to_string().contains("CTRIA3 5"));
}

#[test]
fn sets_and_verbatim_cards_holding_merged_nodes_are_reported() {
    let deck = r#"
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,0.,0.,0.0005
GRID,3,,1.,0.,0.
SET1,30,2,3
SET1,31,SKIN,2
EIGRL,40,,,2
ENDDATA
"#;
    let mut model = build(deck);
    let result = equivalence_nodes(&mut model, &config(0.001)).expect("equivalence");
    assert_eq!(result.canonical, BTreeMap::from([(2, 1)]));

    let stale: Vec<(&str, &str, &[i32])> = result
        .stale
        .iter()
        .map(|s| (s.card_type.as_str(), s.key.as_str(), s.nids.as_slice()))
        .collect();
    assert_eq!(stale, vec![("SET1", "30", &[2][..]), ("EIGRL", "40", &[2][..])]);
    assert_eq!(model.sets[&30].ids, vec![2, 3]);
}

#[test]
fn only_element_nodes_leaves_free_nodes_alone() {
    let deck = r#"
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,0.,0.,0.0001
GRID,3,,1.,0.,0.
GRID,4,,1.,0.,0.0001
CROD,1,1,1,3
PROD,1,1,1.
MAT1,1,2.1+5,,0.3
ENDDATA
"#;
    let model = build(deck);
    let all = plan_merges(&model, &config(0.001)).expect("plan");
    assert_eq!(all.canonical, BTreeMap::from([(2, 1), (4, 3)]));

    let restricted = EquivalenceConfig {
        only_element_nodes: true,
        ..config(0.001)
    };
    assert!(plan_merges(&model, &restricted).expect("plan").canonical.is_empty());
}
