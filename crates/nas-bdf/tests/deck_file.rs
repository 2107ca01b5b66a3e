//! Reading decks from disk.

use nas_bdf::Deck;
use std::io::Write;

#[test]
fn parse_file_reads_bulk_section() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
    writeln!(
        file,
        "SOL 103\nCEND\nBEGIN BULK\nGRID,1,,0.,0.,0.\nCQUAD4,10,1,1,2,3,4\n$ end\nENDDATA"
    )
    .expect("deck should be written");

    let deck = Deck::parse_file(file.path()).expect("deck should parse");
    assert_eq!(deck.header.len(), 2);
    let names: Vec<String> = deck.cards.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["GRID", "CQUAD4"]);
}

#[test]
fn missing_file_reports_line_zero() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let err = Deck::parse_file(dir.path().join("missing.bdf")).expect_err("file does not exist");
    assert_eq!(err.line, 0);
    assert!(err.to_string().contains("failed to read"));
}
