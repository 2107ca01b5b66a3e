//! DYNAMICS: dynamic loads, eigenvalue and frequency controls
//!
//! Only DAREA is decoded. Every other record is recognized and skipped.

use crate::cursor::{Endian, FieldKind::*, Layout};
use crate::error::Result;
use crate::registry::{DecodeRule::Skip, Marker, RuleRow, decode, words};
use nas_model::loads::Darea;
use nas_model::{Entity, RecordData};

const DAREA: Layout = Layout::new(&[(I32, 3), (F32, 1)]);

fn darea(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &DAREA, endian)?;
    Ok(Entity::Darea(Darea::add_op2_data(RecordData::new("DAREA", &words))?))
}

pub const RULES: &[RuleRow] = &[
    (Marker(5307, 53, 379), "ACSRCE", Skip),
    (Marker(27, 17, 182), "DAREA", decode(DAREA, darea)),
    (Marker(37, 18, 183), "DELAY", Skip),
    (Marker(57, 5, 123), "DLOAD", Skip),
    (Marker(77, 19, 184), "DPHASE", Skip),
    (Marker(107, 1, 86), "EIGB", Skip),
    (Marker(207, 2, 87), "EIGC", Skip),
    (Marker(257, 4, 158), "EIGP", Skip),
    (Marker(307, 3, 85), "EIGR", Skip),
    (Marker(308, 8, 348), "EIGRL", Skip),
    (Marker(707, 7, 124), "EPOINT", Skip),
    (Marker(1307, 13, 126), "FREQ", Skip),
    (Marker(1007, 10, 125), "FREQ1", Skip),
    (Marker(1107, 11, 166), "FREQ2", Skip),
    (Marker(1407, 14, 39), "FREQ3", Skip),
    (Marker(1507, 15, 40), "FREQ4", Skip),
    (Marker(1607, 16, 41), "FREQ5", Skip),
    (Marker(3707, 37, 556), "NLRGAP", Skip),
    (Marker(3107, 31, 127), "NONLIN1", Skip),
    (Marker(3207, 32, 128), "NONLIN2", Skip),
    (Marker(3207, 33, 129), "NONLIN3", Skip),
    (Marker(3207, 34, 130), "NONLIN4", Skip),
    (Marker(2107, 21, 195), "RANDPS", Skip),
    (Marker(2207, 22, 196), "RANDT1", Skip),
    (Marker(5107, 51, 131), "RLOAD1", Skip),
    (Marker(5207, 52, 132), "RLOAD2", Skip),
    (Marker(8910, 89, 606), "ROTORB", Skip),
    (Marker(8210, 82, 599), "ROTORD", Skip),
    (Marker(8410, 84, 600), "ROTORG", Skip),
    (Marker(5707, 57, 135), "SEQEP", Skip),
    (Marker(6207, 62, 136), "TF", Skip),
    (Marker(6607, 66, 137), "TIC", Skip),
    (Marker(7107, 71, 138), "TLOAD1", Skip),
    (Marker(7207, 72, 139), "TLOAD2", Skip),
    (Marker(8307, 83, 142), "TSTEP", Skip),
    (Marker(4807, 48, 306), "DYNRED", Skip),
    (Marker(10701, 107, 117), "", Skip),
    (Marker(10801, 108, 242), "", Skip),
    (Marker(3807, 38, 505), "", Skip),
    (Marker(11001, 110, 310), "", Skip),
    (Marker(10901, 109, 260), "", Skip),
    (Marker(3307, 33, 129), "", Skip),
    (Marker(11101, 111, 368), "", Skip),
];
