//! Binary record cursor
//!
//! Layouts are declared as run-length lists of field kinds. [`unpack`] reads
//! one layout at an explicit offset and hands back the words together with
//! the offset just past them; nothing about the position is kept between
//! calls.

use crate::error::{DecodeError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use nas_model::Word;
use serde::{Deserialize, Serialize};

/// Byte order of a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(bytes),
            Endian::Big => BigEndian::read_i32(bytes),
        }
    }

    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(bytes),
            Endian::Big => BigEndian::read_f32(bytes),
        }
    }

    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(bytes),
            Endian::Big => BigEndian::read_f64(bytes),
        }
    }

    pub fn write_i32(self, out: &mut Vec<u8>, value: i32) -> std::io::Result<()> {
        match self {
            Endian::Little => out.write_i32::<LittleEndian>(value),
            Endian::Big => out.write_i32::<BigEndian>(value),
        }
    }

    fn write_f32(self, out: &mut Vec<u8>, value: f32) -> std::io::Result<()> {
        match self {
            Endian::Little => out.write_f32::<LittleEndian>(value),
            Endian::Big => out.write_f32::<BigEndian>(value),
        }
    }

    fn write_f64(self, out: &mut Vec<u8>, value: f64) -> std::io::Result<()> {
        match self {
            Endian::Little => out.write_f64::<LittleEndian>(value),
            Endian::Big => out.write_f64::<BigEndian>(value),
        }
    }
}

/// One packed field type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    I32,
    F32,
    F64,
    /// Fixed-length byte block
    Bytes(usize),
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::I32 | FieldKind::F32 => 4,
            FieldKind::F64 => 8,
            FieldKind::Bytes(n) => n,
        }
    }
}

/// A fixed record layout: runs of `(kind, count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout(&'static [(FieldKind, usize)]);

impl Layout {
    pub const fn new(runs: &'static [(FieldKind, usize)]) -> Self {
        Layout(runs)
    }

    /// Bytes per record
    pub const fn stride(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.0.len() {
            total += self.0[i].0.width() * self.0[i].1;
            i += 1;
        }
        total
    }

    /// Words per record
    pub fn word_count(&self) -> usize {
        self.0.iter().map(|&(_, n)| n).sum()
    }

    fn kinds(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.0
            .iter()
            .flat_map(|&(kind, n)| std::iter::repeat_n(kind, n))
    }

    /// Pack words into bytes; the inverse of [`unpack`]
    ///
    /// Ints may stand in for reals (written as their bit pattern) so
    /// synthetic records can carry integer flags in real slots.
    pub fn pack(&self, words: &[Word], endian: Endian) -> Result<Vec<u8>> {
        if words.len() != self.word_count() {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: self.word_count(),
                available: words.len(),
            });
        }
        let mut out = Vec::with_capacity(self.stride());
        for (kind, word) in self.kinds().zip(words) {
            match (kind, word) {
                (FieldKind::I32, Word::Int(v)) => endian.write_i32(&mut out, *v)?,
                (FieldKind::F32, Word::Float(v)) => endian.write_f32(&mut out, *v as f32)?,
                (FieldKind::F32, Word::Int(v)) => endian.write_i32(&mut out, *v)?,
                (FieldKind::F64, Word::Float(v)) => endian.write_f64(&mut out, *v)?,
                (FieldKind::Bytes(n), Word::Bytes(b)) if b.len() == n => out.extend_from_slice(b),
                (kind, word) => {
                    return Err(DecodeError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("cannot pack {word:?} as {kind:?}"),
                    )));
                }
            }
        }
        Ok(out)
    }
}

/// Unpack one `layout` starting at `offset`
///
/// Returns the words and `offset + layout.stride()`.
pub fn unpack(buf: &[u8], offset: usize, layout: &Layout, endian: Endian) -> Result<(Vec<Word>, usize)> {
    let stride = layout.stride();
    let end = offset.checked_add(stride).filter(|&end| end <= buf.len());
    let Some(end) = end else {
        return Err(DecodeError::Truncated {
            offset,
            needed: stride,
            available: buf.len().saturating_sub(offset),
        });
    };
    let mut words = Vec::with_capacity(layout.word_count());
    let mut at = offset;
    for kind in layout.kinds() {
        let bytes = &buf[at..at + kind.width()];
        words.push(match kind {
            FieldKind::I32 => Word::Int(endian.read_i32(bytes)),
            FieldKind::F32 => Word::Float(f64::from(endian.read_f32(bytes))),
            FieldKind::F64 => Word::Float(endian.read_f64(bytes)),
            FieldKind::Bytes(_) => Word::Bytes(bytes.to_vec()),
        });
        at += kind.width();
    }
    Ok((words, end))
}

/// Read `count` consecutive 32-bit ints at `offset`
pub fn read_ints(buf: &[u8], offset: usize, count: usize, endian: Endian) -> Result<Vec<i32>> {
    let needed = 4 * count;
    if buf.len() < offset + needed {
        return Err(DecodeError::Truncated {
            offset,
            needed,
            available: buf.len().saturating_sub(offset),
        });
    }
    Ok(buf[offset..offset + needed]
        .chunks_exact(4)
        .map(|b| endian.read_i32(b))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: Layout = Layout::new(&[(FieldKind::I32, 2), (FieldKind::F32, 1), (FieldKind::F64, 1), (FieldKind::Bytes(4), 1)]);

    #[test]
    fn stride_sums_runs() {
        assert_eq!(MIXED.stride(), 24);
        assert_eq!(MIXED.word_count(), 5);
    }

    #[test]
    fn unpack_advances_by_stride() {
        let words = vec![
            Word::Int(7),
            Word::Int(-3),
            Word::Float(1.5),
            Word::Float(0.1),
            Word::Bytes(b"GRID".to_vec()),
        ];
        for endian in [Endian::Little, Endian::Big] {
            let mut buf = vec![0xAA; 4];
            buf.extend(MIXED.pack(&words, endian).expect("words match layout"));
            let (back, next) = unpack(&buf, 4, &MIXED, endian).expect("buffer holds one record");
            assert_eq!(next, 28);
            assert_eq!(back, words);
        }
    }

    #[test]
    fn short_buffer_is_an_error() {
        let buf = [0u8; 20];
        let err = unpack(&buf, 0, &MIXED, Endian::Little).expect_err("20 < 24");
        assert!(matches!(err, DecodeError::Truncated { needed: 24, available: 20, .. }));
    }

    #[test]
    fn big_endian_ints() {
        let buf = [0, 0, 0, 5, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(read_ints(&buf, 0, 2, Endian::Big).expect("two ints"), vec![5, -1]);
    }
}
