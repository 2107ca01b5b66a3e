//! Minimal Nastran bulk-data deck tokenizer.
//!
//! Splits a deck into cards of raw field tokens. Free-field (comma), small
//! field (8 character) and large field (16 character, `*`) lines are
//! supported, as are continuation lines and `$` comments. Field values are
//! not interpreted here.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Fields on the first line of a card after the name, and on every
/// continuation line
const FIELDS_PER_LINE: usize = 8;

/// Fields on a large-field line; two of them make one logical line
const LARGE_FIELDS_PER_LINE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deck {
    /// Executive and case control lines before `BEGIN BULK`
    pub header: Vec<String>,
    pub cards: Vec<RawCard>,
    /// Non-fatal issues, e.g. skipped `INCLUDE` statements
    pub warnings: Vec<String>,
}

/// One bulk-data card as raw tokens, index 0 being the card name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCard {
    pub fields: Vec<String>,
    /// `$` comment lines directly above the card, without the `$`
    pub comment: String,
    pub line_start: usize,
}

impl RawCard {
    /// Card name in upper case, without a large-field `*`
    pub fn name(&self) -> String {
        self.fields
            .first()
            .map(|f| f.trim_end_matches('*').to_ascii_uppercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, ParseError>;

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ParseError {
            line: 0,
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse_str(&raw)
    }

    pub fn parse_str(raw: &str) -> Result<Self> {
        let lines: Vec<&str> = raw.lines().collect();
        let bulk_start = lines
            .iter()
            .position(|l| is_begin_bulk(l))
            .map_or(0, |i| i + 1);

        let mut deck = Deck {
            header: lines[..bulk_start.saturating_sub(1)]
                .iter()
                .map(|l| l.trim_end().to_string())
                .collect(),
            ..Deck::default()
        };
        let mut comment = String::new();

        for (i, line) in lines.iter().enumerate().skip(bulk_start) {
            let line_no = i + 1;
            let (content, line_comment) = split_comment(line);
            if content.trim().is_empty() {
                if let Some(text) = line_comment {
                    comment.push_str(text);
                    comment.push('\n');
                }
                continue;
            }
            let content = expand_tabs(content);
            let upper = content.trim().to_ascii_uppercase();
            if upper.starts_with("ENDDATA") {
                break;
            }
            if upper.starts_with("INCLUDE") {
                warn!(line = line_no, "INCLUDE statements are not followed");
                deck.warnings.push(format!("line {line_no}: skipped {}", content.trim()));
                continue;
            }

            let (marker, fields) = split_line(&content, line_no)?;
            if is_continuation(&marker) {
                let card = deck.cards.last_mut().ok_or_else(|| ParseError {
                    line: line_no,
                    message: "continuation line before the first card".to_string(),
                })?;
                let line_width = if marker.trim().starts_with('*') {
                    LARGE_FIELDS_PER_LINE
                } else {
                    FIELDS_PER_LINE
                };
                pad_to_line(&mut card.fields, line_width);
                card.fields.extend(fields);
                continue;
            }

            let mut card_fields = Vec::with_capacity(1 + FIELDS_PER_LINE);
            card_fields.push(marker.trim().to_string());
            card_fields.extend(fields);
            deck.cards.push(RawCard {
                fields: card_fields,
                comment: std::mem::take(&mut comment).trim_end_matches('\n').to_string(),
                line_start: line_no,
            });
        }

        for card in &mut deck.cards {
            while card.fields.len() > 1 && card.fields.last().is_some_and(|f| f.is_empty()) {
                card.fields.pop();
            }
        }
        Ok(deck)
    }
}

fn is_begin_bulk(line: &str) -> bool {
    let upper = line.trim().to_ascii_uppercase();
    upper.starts_with("BEGIN") && upper.contains("BULK")
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.split_once('$') {
        Some((content, comment)) => (content, Some(comment.trim_end())),
        None => (line, None),
    }
}

/// Expand tabs to 8 column stops
fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - out.chars().count() % 8;
            out.extend(std::iter::repeat_n(' ', pad));
        } else {
            out.push(c);
        }
    }
    out
}

fn is_continuation(marker: &str) -> bool {
    let marker = marker.trim();
    marker.is_empty() || marker.starts_with('+') || marker.starts_with('*')
}

/// Continuation fields start on a whole line boundary
fn pad_to_line(fields: &mut Vec<String>, line_width: usize) {
    let data = fields.len().saturating_sub(1);
    let padded = data.div_ceil(line_width).max(1) * line_width;
    fields.resize(1 + padded, String::new());
}

/// Split one line into its leading marker (card name or continuation
/// marker) and up to eight data fields
fn split_line(line: &str, line_no: usize) -> Result<(String, Vec<String>)> {
    if line.contains(',') {
        let mut tokens = line.split(',').map(|t| t.trim().to_string());
        let marker = tokens.next().unwrap_or_default();
        let mut fields: Vec<String> = tokens.collect();
        if fields.len() > FIELDS_PER_LINE + 1 {
            return Err(ParseError {
                line: line_no,
                message: format!("free-field line has {} fields, at most 9 allowed", fields.len()),
            });
        }
        // a ninth field is the trailing continuation marker
        fields.truncate(FIELDS_PER_LINE);
        return Ok((marker, fields));
    }

    let chars: Vec<char> = line.chars().collect();
    let column = |start: usize, width: usize| -> String {
        chars
            .iter()
            .skip(start)
            .take(width)
            .collect::<String>()
            .trim()
            .to_string()
    };
    let marker = column(0, 8);
    let large = marker.ends_with('*');
    let (count, width) = if large {
        (LARGE_FIELDS_PER_LINE, 16)
    } else {
        (FIELDS_PER_LINE, 8)
    };
    let fields = (0..count).map(|i| column(8 + i * width, width)).collect();
    Ok((marker, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_free_and_small_field_cards() {
        let small = format!("{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}", "GRID", "2", "", "1.", "0.", "0.");
        let src = format!(
            "SOL 101\nCEND\nBEGIN BULK\n$ corner node\nGRID,1,,0.,0.,0.\n{small}\nENDDATA\nGRID,3,,9.,9.,9.\n"
        );
        let deck = Deck::parse_str(&src).expect("parser should succeed");
        assert_eq!(deck.header, vec!["SOL 101", "CEND"]);
        assert_eq!(deck.cards.len(), 2);
        assert_eq!(deck.cards[0].fields, vec!["GRID", "1", "", "0.", "0.", "0."]);
        assert_eq!(deck.cards[0].comment, " corner node");
        assert_eq!(deck.cards[1].fields, vec!["GRID", "2", "", "1.", "0.", "0."]);
        assert_eq!(deck.cards[1].line_start, 6);
    }

    #[test]
    fn continuation_fields_start_a_new_line() {
        let src = "MPC,7,1,1,1.0\n,,3,2,-0.5\n";
        let deck = Deck::parse_str(src).expect("parser should succeed");
        let fields = &deck.cards[0].fields;
        assert_eq!(fields.len(), 13);
        assert_eq!(fields[9], "");
        assert_eq!(fields[10], "3");
    }

    #[test]
    fn large_field_pairs_make_one_line() {
        let first = format!("{:<8}{:>16}{:>16}{:>16}{:>16}", "GRID*", "5", "", "1.0", "2.0");
        let second = format!("{:<8}{:>16}", "*", "3.0");
        let src = format!("{first}\n{second}\n");
        let deck = Deck::parse_str(&src).expect("parser should succeed");
        assert_eq!(deck.cards[0].name(), "GRID");
        assert_eq!(deck.cards[0].fields, vec!["GRID*", "5", "", "1.0", "2.0", "3.0"]);
    }

    #[test]
    fn include_is_reported() {
        let deck = Deck::parse_str("INCLUDE 'other.bdf'\nSPOINT,1\n").expect("parser should succeed");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.warnings.len(), 1);
    }

    #[test]
    fn fails_on_orphan_continuation() {
        let err = Deck::parse_str("\n+,1,2\n").expect_err("should fail");
        assert_eq!(err.line, 2);
    }
}
