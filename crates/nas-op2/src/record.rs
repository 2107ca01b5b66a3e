//! Fortran unformatted record framing
//!
//! A table is a stream of records `[len:i32][payload][len:i32]`. Both length
//! words carry the payload size in bytes and must agree.

use crate::cursor::Endian;
use crate::error::{DecodeError, Result};

/// Largest payload considered plausible when sniffing byte order
const MAX_RECORD_LEN: i32 = 1 << 28;

/// One framed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Offset of the payload within the table buffer
    pub offset: usize,
    pub payload: &'a [u8],
}

impl Endian {
    /// Guess the byte order from the first record-length word
    ///
    /// The order under which the leading length is positive, plausible and
    /// matched by the trailing length wins.
    pub fn detect(buf: &[u8]) -> Option<Endian> {
        if buf.len() < 8 {
            return None;
        }
        [Endian::Little, Endian::Big].into_iter().find(|&endian| {
            let len = endian.read_i32(&buf[..4]);
            if !(0..=MAX_RECORD_LEN).contains(&len) {
                return false;
            }
            let end = 4 + len as usize;
            buf.len() >= end + 4 && endian.read_i32(&buf[end..end + 4]) == len
        })
    }
}

fn framing_error(table: &str, offset: usize, index: usize, message: String) -> DecodeError {
    DecodeError::Structural {
        table: table.to_string(),
        marker: None,
        offset,
        index,
        message,
    }
}

/// Split a table buffer into its records
pub fn split_records<'a>(table: &str, buf: &'a [u8], endian: Endian) -> Result<Vec<Record<'a>>> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let index = records.len();
        if buf.len() - offset < 8 {
            return Err(framing_error(
                table,
                offset,
                index,
                format!("{} trailing bytes do not hold a record", buf.len() - offset),
            ));
        }
        let len = endian.read_i32(&buf[offset..offset + 4]);
        let Ok(len) = usize::try_from(len) else {
            return Err(framing_error(table, offset, index, format!("negative record length {len}")));
        };
        let start = offset + 4;
        let end = start + len;
        if buf.len() < end + 4 {
            return Err(framing_error(
                table,
                offset,
                index,
                format!("record of {len} bytes runs past the end of the table"),
            ));
        }
        let trailing = endian.read_i32(&buf[end..end + 4]);
        if usize::try_from(trailing).ok() != Some(len) {
            return Err(framing_error(
                table,
                end,
                index,
                format!("leading length {len} does not match trailing length {trailing}"),
            ));
        }
        records.push(Record {
            offset: start,
            payload: &buf[start..end],
        });
        offset = end + 4;
    }
    Ok(records)
}

/// Frame a payload as one record
pub fn encode_record(payload: &[u8], endian: Endian) -> Result<Vec<u8>> {
    let len = i32::try_from(payload.len()).map_err(|_| DecodeError::Truncated {
        offset: 0,
        needed: payload.len(),
        available: i32::MAX as usize,
    })?;
    let mut out = Vec::with_capacity(payload.len() + 8);
    endian.write_i32(&mut out, len)?;
    out.extend_from_slice(payload);
    endian.write_i32(&mut out, len)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_split_in_order() {
        let mut buf = encode_record(&[1, 2, 3, 4], Endian::Big).expect("small payload");
        buf.extend(encode_record(&[], Endian::Big).expect("empty payload"));
        buf.extend(encode_record(&[9; 8], Endian::Big).expect("small payload"));
        let records = split_records("GEOM2", &buf, Endian::Big).expect("well framed");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].payload, &[1, 2, 3, 4]);
        assert!(records[1].payload.is_empty());
        assert_eq!(records[2].offset, 24);
    }

    #[test]
    fn mismatched_lengths_are_structural() {
        let mut buf = encode_record(&[0; 8], Endian::Little).expect("small payload");
        buf[12] = 9;
        let err = split_records("GEOM1", &buf, Endian::Little).expect_err("trailing length differs");
        assert!(err.is_structural());
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn detect_byte_order() {
        let little = encode_record(&[0; 12], Endian::Little).expect("small payload");
        let big = encode_record(&[0; 12], Endian::Big).expect("small payload");
        assert_eq!(Endian::detect(&little), Some(Endian::Little));
        assert_eq!(Endian::detect(&big), Some(Endian::Big));
        assert_eq!(Endian::detect(&[1, 2]), None);
    }
}
