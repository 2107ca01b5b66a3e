//! Bulk-data field values and typed coercion of text cards
//!
//! A text card arrives as a list of raw tokens (index 0 is the card name).
//! Each entity pulls its fields through the coercion helpers on [`BdfCard`],
//! which know the Nastran conventions: blank fields take defaults, integer
//! fields reject decimals, and real fields accept the implicit-exponent
//! forms such as `1.-3` or `-2.5+4`.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single bulk-data field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Field {
    /// Empty field
    #[default]
    Blank,
    /// Integer field
    Int(i32),
    /// Real field
    Float(f64),
    /// Character field, or an unparsed token from a text deck
    Text(String),
}

impl Field {
    /// True for blank fields and whitespace-only tokens
    pub fn is_blank(&self) -> bool {
        match self {
            Field::Blank => true,
            Field::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Build a field from an optional integer, blank when `None`
    pub fn opt_int(value: Option<i32>) -> Self {
        value.map_or(Field::Blank, Field::Int)
    }

    /// Build a field from an optional real, blank when `None`
    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(Field::Blank, Field::Float)
    }

    /// Build a character field
    pub fn text(value: impl Into<String>) -> Self {
        Field::Text(value.into())
    }

    /// Classify a raw token into an integer, real or character field
    pub fn classify(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            return Field::Blank;
        }
        if let Some(value) = parse_int(token) {
            return Field::Int(value);
        }
        if let Some(value) = parse_nastran_float(token) {
            return Field::Float(value);
        }
        Field::Text(token.to_string())
    }
}

impl fmt::Display for Field {
    /// Free-field text rendering. Reals always carry a decimal point or an
    /// exponent so they read back as reals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Blank => Ok(()),
            Field::Int(v) => write!(f, "{v}"),
            Field::Float(v) => write!(f, "{v:?}"),
            Field::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Parse a Nastran integer token
pub fn parse_int(token: &str) -> Option<i32> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Parse a Nastran real token
///
/// Accepts ordinary forms (`1.5`, `1.5e3`), Fortran `D` exponents and the
/// implicit-exponent shorthand where the `E` is dropped (`1.5-3`, `-.2+4`).
/// A token without a decimal point or an exponent is not a real.
pub fn parse_nastran_float(token: &str) -> Option<f64> {
    let upper = token.trim().to_ascii_uppercase().replace('D', "E");
    if upper.is_empty() {
        return None;
    }
    if !upper.contains('.') && !upper.contains('E') {
        return None;
    }
    if upper.contains('E') {
        return upper.parse().ok();
    }
    // implicit exponent: the first sign after the mantissa starts it
    let bytes = upper.as_bytes();
    let split = bytes
        .iter()
        .enumerate()
        .skip(1)
        .find(|&(_, b)| *b == b'+' || *b == b'-')
        .map(|(i, _)| i);
    match split {
        Some(i) => format!("{}E{}", &upper[..i], &upper[i..]).parse().ok(),
        None => upper.parse().ok(),
    }
}

/// A bulk-data card as a list of fields, index 0 being the card name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BdfCard {
    fields: Vec<Field>,
}

impl BdfCard {
    /// Build a card from typed fields
    pub fn new(fields: Vec<Field>) -> Self {
        let mut card = BdfCard { fields };
        card.trim_trailing_blanks();
        card
    }

    /// Build a card from raw text tokens. Tokens are kept as text until a
    /// coercion asks for a type.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let fields = tokens
            .iter()
            .map(|t| {
                let t = t.as_ref().trim();
                if t.is_empty() {
                    Field::Blank
                } else {
                    Field::Text(t.to_string())
                }
            })
            .collect();
        BdfCard::new(fields)
    }

    fn trim_trailing_blanks(&mut self) {
        while self.fields.len() > 1 && self.fields.last().is_some_and(Field::is_blank) {
            self.fields.pop();
        }
    }

    /// Card name in upper case, without a large-field `*`
    pub fn name(&self) -> String {
        match self.fields.first() {
            Some(Field::Text(s)) => s.trim_end_matches('*').to_ascii_uppercase(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Number of fields including the name, trailing blanks removed
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the card has no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `index`, blank when past the end
    pub fn field(&self, index: usize) -> &Field {
        static BLANK: Field = Field::Blank;
        self.fields.get(index).unwrap_or(&BLANK)
    }

    /// All fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Reject cards with more than `max` fields (name included)
    pub fn ensure_max_len(&self, max: usize) -> Result<()> {
        if self.len() > max {
            return Err(ModelError::TooManyFields {
                card: self.name(),
                max,
                found: self.len(),
            });
        }
        Ok(())
    }

    fn err(&self, index: usize, name: &str, message: impl Into<String>) -> ModelError {
        ModelError::field(&self.name(), index, name, message)
    }

    /// Integer field, required
    pub fn integer(&self, index: usize, name: &str) -> Result<i32> {
        self.integer_or_none(index, name)?
            .ok_or_else(|| self.err(index, name, "is required but blank"))
    }

    /// Integer field, `default` when blank
    pub fn integer_or_blank(&self, index: usize, name: &str, default: i32) -> Result<i32> {
        Ok(self.integer_or_none(index, name)?.unwrap_or(default))
    }

    /// Integer field, `None` when blank
    pub fn integer_or_none(&self, index: usize, name: &str) -> Result<Option<i32>> {
        match self.field(index) {
            Field::Blank => Ok(None),
            Field::Int(v) => Ok(Some(*v)),
            Field::Float(v) => Err(self.err(index, name, format!("expected integer, found real {v:?}"))),
            Field::Text(s) if s.trim().is_empty() => Ok(None),
            Field::Text(s) => parse_int(s.trim())
                .map(Some)
                .ok_or_else(|| self.err(index, name, format!("expected integer, found {s:?}"))),
        }
    }

    /// Real field, required
    pub fn double(&self, index: usize, name: &str) -> Result<f64> {
        self.double_or_none(index, name)?
            .ok_or_else(|| self.err(index, name, "is required but blank"))
    }

    /// Real field, `default` when blank
    pub fn double_or_blank(&self, index: usize, name: &str, default: f64) -> Result<f64> {
        Ok(self.double_or_none(index, name)?.unwrap_or(default))
    }

    /// Real field, `None` when blank
    pub fn double_or_none(&self, index: usize, name: &str) -> Result<Option<f64>> {
        match self.field(index) {
            Field::Blank => Ok(None),
            Field::Float(v) => Ok(Some(*v)),
            Field::Int(v) => Err(self.err(index, name, format!("expected real, found integer {v}"))),
            Field::Text(s) if s.trim().is_empty() => Ok(None),
            Field::Text(s) => {
                if parse_int(s.trim()).is_some() {
                    return Err(self.err(index, name, format!("expected real, found integer {s}")));
                }
                parse_nastran_float(s)
                    .map(Some)
                    .ok_or_else(|| self.err(index, name, format!("expected real, found {s:?}")))
            }
        }
    }

    /// Character field, required
    pub fn string(&self, index: usize, name: &str) -> Result<String> {
        self.string_or_none(index, name)?
            .ok_or_else(|| self.err(index, name, "is required but blank"))
    }

    /// Character field, `default` when blank
    pub fn string_or_blank(&self, index: usize, name: &str, default: &str) -> Result<String> {
        Ok(self
            .string_or_none(index, name)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Character field, `None` when blank. Numeric tokens are rejected.
    pub fn string_or_none(&self, index: usize, name: &str) -> Result<Option<String>> {
        match self.field(index) {
            Field::Blank => Ok(None),
            Field::Text(s) if s.trim().is_empty() => Ok(None),
            Field::Text(s) => {
                let s = s.trim();
                if matches!(Field::classify(s), Field::Text(_)) {
                    Ok(Some(s.to_ascii_uppercase()))
                } else {
                    Err(self.err(index, name, format!("expected string, found number {s}")))
                }
            }
            other => Err(self.err(index, name, format!("expected string, found {other}"))),
        }
    }

    /// Integer or real field, required
    pub fn integer_or_double(&self, index: usize, name: &str) -> Result<Field> {
        match self.integer_double_string_or_blank(index, name)? {
            f @ (Field::Int(_) | Field::Float(_)) => Ok(f),
            Field::Blank => Err(self.err(index, name, "is required but blank")),
            other => Err(self.err(index, name, format!("expected integer or real, found {other:?}"))),
        }
    }

    /// Any field type, classified
    pub fn integer_double_string_or_blank(&self, index: usize, _name: &str) -> Result<Field> {
        Ok(match self.field(index) {
            Field::Text(s) => {
                let f = Field::classify(s);
                if let Field::Text(t) = f {
                    Field::Text(t.to_ascii_uppercase())
                } else {
                    f
                }
            }
            other => other.clone(),
        })
    }

    /// Node component string such as `123456`, kept as the integer it spells
    pub fn components_or_blank(&self, index: usize, name: &str, default: i32) -> Result<i32> {
        let value = self.integer_or_blank(index, name, default)?;
        if value != 0 && !value.to_string().bytes().all(|b| (b'1'..=b'6').contains(&b)) {
            return Err(self.err(index, name, format!("invalid component number {value}")));
        }
        Ok(value)
    }

    /// Sequential integers from `start` to the end of the card, blanks skipped.
    /// `THRU` ranges are expanded.
    pub fn integer_list(&self, start: usize, name: &str) -> Result<Vec<i32>> {
        let mut out = Vec::new();
        let mut i = start;
        while i < self.len() {
            let field = self.field(i);
            if field.is_blank() {
                i += 1;
                continue;
            }
            if let Field::Text(s) = field
                && s.trim().eq_ignore_ascii_case("THRU")
            {
                let lo = out
                    .last()
                    .copied()
                    .ok_or_else(|| self.err(i, name, "THRU without a starting value"))?;
                let hi = self.integer(i + 1, name)?;
                if hi < lo {
                    return Err(self.err(i + 1, name, format!("THRU range {lo} to {hi} is descending")));
                }
                out.extend(lo + 1..=hi);
                i += 2;
                continue;
            }
            out.push(self.integer(i, name)?);
            i += 1;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(tokens: &[&str]) -> BdfCard {
        BdfCard::from_tokens(tokens)
    }

    #[test]
    fn nastran_float_forms() {
        assert_eq!(parse_nastran_float("1.5"), Some(1.5));
        assert_eq!(parse_nastran_float("1."), Some(1.0));
        assert_eq!(parse_nastran_float(".5"), Some(0.5));
        assert_eq!(parse_nastran_float("1.-3"), Some(1.0e-3));
        assert_eq!(parse_nastran_float("-2.5+2"), Some(-250.0));
        assert_eq!(parse_nastran_float("3.0D2"), Some(300.0));
        assert_eq!(parse_nastran_float("1e-8"), Some(1.0e-8));
        assert_eq!(parse_nastran_float("12"), None);
        assert_eq!(parse_nastran_float("ABC"), None);
    }

    #[test]
    fn trailing_blanks_are_trimmed() {
        let c = card(&["GRID", "1", "", "0.", "", ""]);
        assert_eq!(c.len(), 4);
        assert_eq!(c.name(), "GRID");
    }

    #[test]
    fn integer_coercion() {
        let c = card(&["CROD", "10", "", "1.5", "x"]);
        assert_eq!(c.integer(1, "eid").expect("integer should parse"), 10);
        assert_eq!(c.integer_or_blank(2, "pid", 10).expect("blank should default"), 10);
        assert!(c.integer(2, "pid").is_err());
        assert!(c.integer(3, "n1").is_err());
        assert!(c.integer(4, "n2").is_err());
    }

    #[test]
    fn double_coercion_rejects_integers() {
        let c = card(&["MAT1", "1", "2.1+5", "7"]);
        assert_eq!(c.double(2, "E").expect("real should parse"), 2.1e5);
        let err = c.double(3, "G").expect_err("integer in real field must fail");
        assert!(err.to_string().contains("expected real"));
        assert_eq!(c.double_or_blank(4, "nu", 0.3).expect("blank should default"), 0.3);
    }

    #[test]
    fn string_coercion() {
        let c = card(&["PARAM", "post", "-1"]);
        assert_eq!(c.string(1, "key").expect("string should parse"), "POST");
        assert!(c.string(2, "value").is_err());
        assert_eq!(c.string_or_blank(3, "x", "YES").expect("blank should default"), "YES");
    }

    #[test]
    fn integer_list_expands_thru() {
        let c = card(&["SET1", "1", "2", "5", "THRU", "8", "", "20"]);
        let ids = c.integer_list(2, "ids").expect("list should parse");
        assert_eq!(ids, vec![2, 5, 6, 7, 8, 20]);
    }

    #[test]
    fn max_len_is_enforced() {
        let c = card(&["PDAMP5", "1", "2", "3.0", "4"]);
        assert!(c.ensure_max_len(4).is_err());
        assert!(c.ensure_max_len(5).is_ok());
    }

    #[test]
    fn display_keeps_real_marker() {
        assert_eq!(Field::Float(3.0).to_string(), "3.0");
        assert_eq!(Field::Float(1e-8).to_string(), "1e-8");
        assert_eq!(Field::Int(-4).to_string(), "-4");
        assert_eq!(Field::classify("1e-8"), Field::Float(1e-8));
    }
}
