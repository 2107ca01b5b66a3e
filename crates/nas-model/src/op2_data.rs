//! Positional access to decoded binary tuples
//!
//! The binary reader unpacks each fixed-width record into a list of
//! [`Word`]s whose order is fixed by the record layout. Entities read their
//! fields back out by position through [`RecordData`].

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// One unpacked word of a binary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Word {
    /// Signed 32-bit integer
    Int(i32),
    /// 32- or 64-bit real, widened
    Float(f64),
    /// Fixed-length byte block
    Bytes(Vec<u8>),
}

/// A decoded binary tuple tagged with the card it belongs to
#[derive(Debug, Clone, Copy)]
pub struct RecordData<'a> {
    card: &'static str,
    words: &'a [Word],
}

impl<'a> RecordData<'a> {
    /// Wrap the words of one record
    pub fn new(card: &'static str, words: &'a [Word]) -> Self {
        RecordData { card, words }
    }

    /// Card name the record decodes to
    pub fn card(&self) -> &'static str {
        self.card
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when the record has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Fail unless at least `n` words are present
    pub fn require(&self, n: usize) -> Result<()> {
        if self.words.len() < n {
            return Err(ModelError::ShortTuple {
                card: self.card.to_string(),
                expected: n,
                found: self.words.len(),
            });
        }
        Ok(())
    }

    fn word(&self, index: usize) -> Result<&Word> {
        self.require(index + 1)?;
        Ok(&self.words[index])
    }

    /// Integer word at `index`
    pub fn int(&self, index: usize) -> Result<i32> {
        match self.word(index)? {
            Word::Int(v) => Ok(*v),
            other => Err(ModelError::field(
                self.card,
                index,
                "word",
                format!("expected integer word, found {other:?}"),
            )),
        }
    }

    /// Real word at `index`
    pub fn float(&self, index: usize) -> Result<f64> {
        match self.word(index)? {
            Word::Float(v) => Ok(*v),
            other => Err(ModelError::field(
                self.card,
                index,
                "word",
                format!("expected real word, found {other:?}"),
            )),
        }
    }

    /// `N` consecutive integer words starting at `start`
    pub fn ints<const N: usize>(&self, start: usize) -> Result<[i32; N]> {
        let mut out = [0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.int(start + i)?;
        }
        Ok(out)
    }

    /// `N` consecutive real words starting at `start`
    pub fn floats<const N: usize>(&self, start: usize) -> Result<[f64; N]> {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.float(start + i)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_access() {
        let words = vec![Word::Int(7), Word::Float(1.5), Word::Int(3), Word::Int(4)];
        let data = RecordData::new("CROD", &words);
        assert_eq!(data.int(0).expect("int word"), 7);
        assert_eq!(data.float(1).expect("real word"), 1.5);
        assert_eq!(data.ints::<2>(2).expect("int words"), [3, 4]);
        assert!(data.int(1).is_err());
        assert!(matches!(data.int(9), Err(ModelError::ShortTuple { expected: 10, .. })));
    }
}
