//! GEOM1: grid points and coordinate systems

use crate::cursor::{Endian, FieldKind::*, Layout};
use crate::error::Result;
use crate::registry::{DecodeRule::Skip, Marker, RuleRow, decode, words};
use nas_model::coords::{Coord, CoordKind};
use nas_model::nodes::Grid;
use nas_model::{Entity, RecordData};

const GRID: Layout = Layout::new(&[(I32, 2), (F32, 3), (I32, 3)]);
const CORD2: Layout = Layout::new(&[(I32, 4), (F32, 9)]);

fn grid(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &GRID, endian)?;
    Ok(Entity::Grid(Grid::add_op2_data(RecordData::new("GRID", &words))?))
}

fn cord2(kind: CoordKind, chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CORD2, endian)?;
    Ok(Entity::Coord(Coord::add_op2_data(kind, RecordData::new(kind.card_name(), &words))?))
}

fn cord2c(chunk: &[u8], endian: Endian) -> Result<Entity> {
    cord2(CoordKind::Cylindrical, chunk, endian)
}

fn cord2r(chunk: &[u8], endian: Endian) -> Result<Entity> {
    cord2(CoordKind::Rectangular, chunk, endian)
}

fn cord2s(chunk: &[u8], endian: Endian) -> Result<Entity> {
    cord2(CoordKind::Spherical, chunk, endian)
}

pub const RULES: &[RuleRow] = &[
    (Marker(1701, 17, 6), "CORD1C", Skip),
    (Marker(1801, 18, 5), "CORD1R", Skip),
    (Marker(1901, 19, 7), "CORD1S", Skip),
    (Marker(2001, 20, 9), "CORD2C", decode(CORD2, cord2c)),
    (Marker(2101, 21, 8), "CORD2R", decode(CORD2, cord2r)),
    (Marker(2201, 22, 10), "CORD2S", decode(CORD2, cord2s)),
    (Marker(4501, 45, 1), "GRID", decode(GRID, grid)),
    (Marker(5301, 53, 4), "SEQGP", Skip),
];

#[cfg(test)]
mod tests {
    use super::*;
    use nas_model::Word;

    #[test]
    fn grid_record() {
        let mut words = vec![Word::Int(12), Word::Int(0)];
        words.extend([1.0, 2.0, 3.5].map(Word::Float));
        words.extend([0, 123, 0].map(Word::Int));
        let chunk = GRID.pack(&words, Endian::Big).expect("words match layout");
        assert_eq!(chunk.len(), 32);
        let Entity::Grid(grid) = grid(&chunk, Endian::Big).expect("GRID") else {
            panic!("GRID record should decode to a grid");
        };
        assert_eq!(grid.nid, 12);
        assert_eq!(grid.xyz, [1.0, 2.0, 3.5]);
        assert_eq!(grid.ps, 123);
    }

    #[test]
    fn cord2_record_keeps_reference_system() {
        let mut words = [5, 2, 2, 3].map(Word::Int).to_vec();
        words.extend([0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0].map(Word::Float));
        let chunk = CORD2.pack(&words, Endian::Little).expect("words match layout");
        assert_eq!(chunk.len(), 52);
        let Entity::Coord(coord) = cord2c(&chunk, Endian::Little).expect("CORD2C") else {
            panic!("CORD2C record should decode to a coordinate system");
        };
        assert_eq!(coord.cid, 5);
        assert_eq!(coord.rid, 3);
        assert_eq!(coord.kind, CoordKind::Cylindrical);
    }
}
