//! End-to-end tests for binary table decoding.
//!
//! 1. Pack synthetic records with the layout cursor
//! 2. Frame them as sub-blocks behind their markers
//! 3. Decode GEOM1/GEOM2/DYNAMICS tables through the registries
//! 4. Merge the decoded entities into a model and query it

use nas_model::{BdfModel, ModelError, Word};
use nas_op2::{
    DecodeConfig, DecodeError, Endian, FieldKind, Layout, Marker, TableKind, UnknownMarkerPolicy, decode_table,
    decode_table_into, encode_record, read_table_files, read_tables,
};

const CELAS1: Marker = Marker(601, 6, 73);
const CROD: Marker = Marker(3001, 30, 48);
const GRID: Marker = Marker(4501, 45, 1);
const DAREA: Marker = Marker(27, 17, 182);

const INTS_6: Layout = Layout::new(&[(FieldKind::I32, 6)]);
const INTS_4: Layout = Layout::new(&[(FieldKind::I32, 4)]);
const GRID_LAYOUT: Layout = Layout::new(&[(FieldKind::I32, 2), (FieldKind::F32, 3), (FieldKind::I32, 3)]);
const DAREA_LAYOUT: Layout = Layout::new(&[(FieldKind::I32, 3), (FieldKind::F32, 1)]);

fn marker_bytes(marker: Marker, endian: Endian) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [marker.0, marker.1, marker.2] {
        endian.write_i32(&mut out, v).expect("write to vec");
    }
    out
}

/// One framed sub-block holding `body` after the marker
fn raw_sub_block(marker: Marker, body: &[u8], endian: Endian) -> Vec<u8> {
    let mut payload = marker_bytes(marker, endian);
    payload.extend_from_slice(body);
    encode_record(&payload, endian).expect("small payload")
}

fn sub_block(marker: Marker, layout: &Layout, records: &[Vec<Word>], endian: Endian) -> Vec<u8> {
    let mut body = Vec::new();
    for words in records {
        body.extend(layout.pack(words, endian).expect("words match layout"));
    }
    raw_sub_block(marker, &body, endian)
}

fn ints(values: &[i32]) -> Vec<Word> {
    values.iter().map(|&v| Word::Int(v)).collect()
}

fn grid(nid: i32, xyz: [f64; 3]) -> Vec<Word> {
    let mut words = ints(&[nid, 0]);
    words.extend(xyz.map(Word::Float));
    words.extend(ints(&[0, 0, 0]));
    words
}

fn geom1(endian: Endian) -> Vec<u8> {
    sub_block(
        GRID,
        &GRID_LAYOUT,
        &[grid(1, [0.0, 0.0, 0.0]), grid(2, [1.0, 0.0, 0.0]), grid(3, [2.0, 0.0, 0.0])],
        endian,
    )
}

fn geom2(endian: Endian) -> Vec<u8> {
    let mut buf = sub_block(CROD, &INTS_4, &[ints(&[10, 5, 1, 2]), ints(&[11, 5, 2, 3])], endian);
    buf.extend(sub_block(CELAS1, &INTS_6, &[ints(&[20, 7, 3, 0, 1, 0])], endian));
    buf
}

fn dynamics(endian: Endian) -> Vec<u8> {
    let mut words = ints(&[4, 3, 2]);
    words.push(Word::Float(2.5));
    sub_block(DAREA, &DAREA_LAYOUT, &[words], endian)
}

#[test]
fn celas1_payload_of_two_records() {
    let body = INTS_6
        .pack(&ints(&[1, 100, 10, 11, 1, 1]), Endian::Little)
        .expect("words match layout")
        .repeat(2);
    assert_eq!(body.len(), 48);
    let buf = raw_sub_block(CELAS1, &body, Endian::Little);

    let decoded = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect("48 bytes is two records");
    assert_eq!(decoded.entities.len(), 2);
    assert_eq!(decoded.report.counts.get("CELAS1"), Some(&2));
}

#[test]
fn celas1_payload_off_stride_is_structural() {
    let buf = raw_sub_block(CELAS1, &[0u8; 50], Endian::Little);
    let err = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect_err("50 is not a multiple of 24");
    match err {
        DecodeError::Structural { marker, offset, message, .. } => {
            assert_eq!(marker, Some(CELAS1));
            assert_eq!(offset, 16);
            assert!(message.contains("not a multiple of stride 24"), "{message}");
        }
        other => panic!("expected a structural error, got {other:?}"),
    }
}

#[test]
fn unknown_marker_fails_by_default() {
    let buf = raw_sub_block(Marker(1, 2, 3), &[0u8; 8], Endian::Little);
    let err = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect_err("marker is not registered");
    assert!(matches!(err, DecodeError::UnknownMarker { marker: Marker(1, 2, 3), .. }));
    assert!(err.to_string().contains("(1, 2, 3)"));
}

#[test]
fn unknown_marker_skip_policy_counts_and_resynchronizes() {
    let mut buf = raw_sub_block(Marker(1, 2, 3), &[0u8; 8], Endian::Little);
    buf.extend(geom2(Endian::Little));
    let config = DecodeConfig {
        unknown_markers: UnknownMarkerPolicy::Skip,
        ..DecodeConfig::default()
    };

    let decoded = decode_table(TableKind::Geom2, &buf, &config).expect("unknown marker is skipped");
    assert_eq!(decoded.report.skipped(), 1);
    assert_eq!(decoded.report.skipped_markers.get(&Marker(1, 2, 3)), Some(&1));
    assert_eq!(decoded.entities.len(), 3);
}

#[test]
fn nonpositive_ids_are_dropped() {
    let buf = sub_block(CROD, &INTS_4, &[ints(&[0, 5, 1, 2]), ints(&[-4, 5, 1, 2]), ints(&[8, 5, 1, 2])], Endian::Little);

    let decoded = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect("valid table");
    assert_eq!(decoded.entities.len(), 1);
    assert_eq!(decoded.report.dropped_ids, 2);

    let keep_all = DecodeConfig {
        skip_nonpositive_ids: false,
        ..DecodeConfig::default()
    };
    let decoded = decode_table(TableKind::Geom2, &buf, &keep_all).expect("valid table");
    assert_eq!(decoded.entities.len(), 3);
}

#[test]
fn big_endian_tables_decode_with_matching_config() {
    let config = DecodeConfig {
        endian: Endian::Big,
        ..DecodeConfig::default()
    };
    let buf = geom1(Endian::Big);
    assert_eq!(Endian::detect(&buf), Some(Endian::Big));

    let mut model = BdfModel::default();
    let report = decode_table_into(&mut model, TableKind::Geom1, &buf, &config).expect("big-endian GEOM1");
    assert_eq!(report.counts.get("GRID"), Some(&3));
    model.node(2, "").expect("grid 2 decoded");
    assert_eq!(model.nodes[&2].xyz, [1.0, 0.0, 0.0]);
}

#[test]
fn parallel_read_matches_sequential_merge() {
    let endian = Endian::Little;
    let (g1, g2, dy) = (geom1(endian), geom2(endian), dynamics(endian));
    let config = DecodeConfig::default();

    let (parallel, reports) = read_tables(
        &[(TableKind::Geom1, g1.as_slice()), (TableKind::Geom2, g2.as_slice()), (TableKind::Dynamics, dy.as_slice())],
        &config,
    )
    .expect("three valid tables");
    assert_eq!(reports.len(), 3);

    let mut sequential = BdfModel::default();
    for (kind, buf) in [(TableKind::Geom1, &g1), (TableKind::Geom2, &g2), (TableKind::Dynamics, &dy)] {
        decode_table_into(&mut sequential, kind, buf, &config).expect("valid table");
    }

    assert_eq!(parallel.write_bulk(), sequential.write_bulk());
    assert_eq!(parallel.card_count, sequential.card_count);
    assert_eq!(parallel.elements.keys().copied().collect::<Vec<_>>(), vec![10, 11, 20]);
    assert_eq!(parallel.darea(4, "").expect("DAREA 4").len(), 1);
}

#[test]
fn decoded_model_cross_references() {
    let endian = Endian::Little;
    let (g1, g2) = (geom1(endian), geom2(endian));
    let tables = [(TableKind::Geom1, g1.as_slice()), (TableKind::Geom2, g2.as_slice())];
    let (mut model, _) = read_tables(&tables, &DecodeConfig::default()).expect("valid tables");

    let err = model.cross_reference().expect_err("PROD 5 and PELAS 7 are not in the tables");
    let ModelError::CrossReference { missing } = err else {
        panic!("expected dangling references, got {err:?}");
    };
    let text = missing.join("\n");
    assert!(text.contains("CROD 10"), "{text}");
    assert!(text.contains("CROD 11"), "{text}");
    assert!(text.contains("CELAS1 20"), "{text}");
    assert_eq!(missing.len(), 3);
}

#[test]
fn tables_read_from_files() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("geom1.bin");
    std::fs::write(&path, geom1(Endian::Little)).expect("Failed to write table");

    let (model, reports) =
        read_table_files(&[(TableKind::Geom1, path.as_path())], &DecodeConfig::default()).expect("table file");
    assert_eq!(model.nodes.len(), 3);
    assert_eq!(reports[0].records, 1);
}
