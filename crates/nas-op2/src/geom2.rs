//! GEOM2: element connectivity records
//!
//! Orientation-bearing elements (CBAR, CBEAM, CGAP) are decoded in two
//! phases. The common prefix is read with the vector layout, then the flag
//! word picks the final layout: `0`/`1` keep the orientation vector, `2`
//! rereads the first orientation word as the G0 grid.

use crate::cursor::{Endian, FieldKind::*, Layout};
use crate::error::Result;
use crate::registry::{DecodeRule::Skip, Marker, RuleRow, decode, words};
use nas_model::elements::line::{Cbar, Cbeam, Cgap, Conrod, ORIENTATION_GRID, Rod, RodCard};
use nas_model::elements::scalar::{ScalarCard, ScalarElement};
use nas_model::elements::shell::{Shell, ShellCard};
use nas_model::elements::solid::Solid;
use nas_model::elements::thermal::Chbdyg;
use nas_model::loads::Conv;
use nas_model::masses::{Conm1, Conm2, Mass};
use nas_model::{Element, Entity, RecordData, Word};

const INTS_4: Layout = Layout::new(&[(I32, 4)]);
const INTS_6: Layout = Layout::new(&[(I32, 6)]);
const VALUE_CONNECTION: Layout = Layout::new(&[(I32, 1), (F32, 1), (I32, 4)]);
const VALUE_POINTS: Layout = Layout::new(&[(I32, 1), (F32, 1), (I32, 2)]);
const CELAS2: Layout = Layout::new(&[(I32, 1), (F32, 1), (I32, 4), (F32, 2)]);

const CBAR_VECTOR: Layout = Layout::new(&[(I32, 4), (F32, 3), (I32, 3), (F32, 6)]);
const CBAR_GRID: Layout = Layout::new(&[(I32, 5), (F32, 2), (I32, 3), (F32, 6)]);
const CBEAM_VECTOR: Layout = Layout::new(&[(I32, 6), (F32, 3), (I32, 3), (F32, 6)]);
const CBEAM_GRID: Layout = Layout::new(&[(I32, 7), (F32, 2), (I32, 3), (F32, 6)]);
const CGAP_VECTOR: Layout = Layout::new(&[(I32, 4), (F32, 3), (I32, 2)]);
const CGAP_GRID: Layout = Layout::new(&[(I32, 5), (F32, 2), (I32, 2)]);

const CONROD: Layout = Layout::new(&[(I32, 4), (F32, 4)]);
const CONM1: Layout = Layout::new(&[(I32, 3), (F32, 21)]);
const CONM2: Layout = Layout::new(&[(I32, 3), (F32, 10)]);
const CONV: Layout = Layout::new(&[(I32, 12), (F32, 8)]);
const CHBDYG: Layout = Layout::new(&[(I32, 16)]);

const CTRIA3: Layout = Layout::new(&[(I32, 5), (F32, 2), (I32, 3), (F32, 3)]);
const CQUAD4: Layout = Layout::new(&[(I32, 6), (F32, 2), (I32, 2), (F32, 4)]);
const CTRIA6: Layout = Layout::new(&[(I32, 8), (F32, 4), (I32, 1)]);
const CQUAD8: Layout = Layout::new(&[(I32, 10), (F32, 5), (I32, 1)]);
const CQUAD: Layout = Layout::new(&[(I32, 11)]);

const CTETRA: Layout = Layout::new(&[(I32, 12)]);
const CPENTA: Layout = Layout::new(&[(I32, 17)]);
const CHEXA: Layout = Layout::new(&[(I32, 22)]);
const CTETP: Layout = Layout::new(&[(I32, 27)]);
const SPOINT: Layout = Layout::new(&[(I32, 1)]);

fn scalar(card: ScalarCard, chunk: &[u8], layout: &Layout, endian: Endian) -> Result<Entity> {
    let words = words(chunk, layout, endian)?;
    let element = ScalarElement::add_op2_data(card, RecordData::new(card.name(), &words))?;
    Ok(if card.is_mass() {
        Entity::Mass(Mass::Scalar(element))
    } else {
        Entity::Element(Element::Scalar(element))
    })
}

macro_rules! scalar_decoders {
    ($($name:ident => $card:ident, $layout:ident;)*) => {
        $(
            fn $name(chunk: &[u8], endian: Endian) -> Result<Entity> {
                scalar(ScalarCard::$card, chunk, &$layout, endian)
            }
        )*
    };
}

scalar_decoders! {
    celas1 => Celas1, INTS_6;
    celas2 => Celas2, CELAS2;
    celas3 => Celas3, INTS_4;
    celas4 => Celas4, VALUE_POINTS;
    cdamp1 => Cdamp1, INTS_6;
    cdamp2 => Cdamp2, VALUE_CONNECTION;
    cdamp3 => Cdamp3, INTS_4;
    cdamp4 => Cdamp4, VALUE_POINTS;
    cdamp5 => Cdamp5, INTS_4;
    cvisc => Cvisc, INTS_4;
    cmass1 => Cmass1, INTS_6;
    cmass2 => Cmass2, VALUE_CONNECTION;
    cmass3 => Cmass3, INTS_4;
    cmass4 => Cmass4, VALUE_POINTS;
}

/// Read the flag word, then unpack with the layout it selects
fn oriented(chunk: &[u8], endian: Endian, flag_index: usize, vector: &Layout, grid: &Layout) -> Result<Vec<Word>> {
    let flag = endian.read_i32(&chunk[4 * flag_index..4 * flag_index + 4]);
    let layout = if flag == ORIENTATION_GRID { grid } else { vector };
    words(chunk, layout, endian)
}

fn cbar(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = oriented(chunk, endian, 7, &CBAR_VECTOR, &CBAR_GRID)?;
    Ok(Entity::Element(Element::Bar(Cbar::add_op2_data(RecordData::new("CBAR", &words))?)))
}

fn cbeam(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = oriented(chunk, endian, 9, &CBEAM_VECTOR, &CBEAM_GRID)?;
    Ok(Entity::Element(Element::Beam(Cbeam::add_op2_data(RecordData::new("CBEAM", &words))?)))
}

fn cgap(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = oriented(chunk, endian, 7, &CGAP_VECTOR, &CGAP_GRID)?;
    Ok(Entity::Element(Element::Gap(Cgap::add_op2_data(RecordData::new("CGAP", &words))?)))
}

fn rod(card: RodCard, chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &INTS_4, endian)?;
    Ok(Entity::Element(Element::Rod(Rod::add_op2_data(card, RecordData::new(card.name(), &words))?)))
}

fn crod(chunk: &[u8], endian: Endian) -> Result<Entity> {
    rod(RodCard::Crod, chunk, endian)
}

fn ctube(chunk: &[u8], endian: Endian) -> Result<Entity> {
    rod(RodCard::Ctube, chunk, endian)
}

fn conrod(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CONROD, endian)?;
    Ok(Entity::Element(Element::Conrod(Conrod::add_op2_data(RecordData::new("CONROD", &words))?)))
}

fn conm1(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CONM1, endian)?;
    Ok(Entity::Mass(Mass::Conm1(Conm1::add_op2_data(RecordData::new("CONM1", &words))?)))
}

fn conm2(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CONM2, endian)?;
    Ok(Entity::Mass(Mass::Conm2(Conm2::add_op2_data(RecordData::new("CONM2", &words))?)))
}

fn conv(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CONV, endian)?;
    Ok(Entity::Conv(Conv::add_op2_data(RecordData::new("CONV", &words))?))
}

fn chbdyg(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CHBDYG, endian)?;
    Ok(Entity::Element(Element::Chbdyg(Chbdyg::add_op2_data(RecordData::new("CHBDYG", &words))?)))
}

fn shell(card: ShellCard, chunk: &[u8], layout: &Layout, endian: Endian) -> Result<Entity> {
    let words = words(chunk, layout, endian)?;
    Ok(Entity::Element(Element::Shell(Shell::add_op2_data(card, RecordData::new(card.name(), &words))?)))
}

fn ctria3(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Ctria3, chunk, &CTRIA3, endian)
}

fn cquad4(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Cquad4, chunk, &CQUAD4, endian)
}

fn cquadr(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Cquadr, chunk, &CQUAD4, endian)
}

fn cquadx(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Cquadx, chunk, &CQUAD4, endian)
}

fn ctria6(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Ctria6, chunk, &CTRIA6, endian)
}

fn cquad8(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Cquad8, chunk, &CQUAD8, endian)
}

fn cquad(chunk: &[u8], endian: Endian) -> Result<Entity> {
    shell(ShellCard::Cquad, chunk, &CQUAD, endian)
}

fn solid(card: &'static str, chunk: &[u8], layout: &Layout, endian: Endian) -> Result<Entity> {
    let words = words(chunk, layout, endian)?;
    Ok(Entity::Element(Element::Solid(Solid::add_op2_data(card, RecordData::new(card, &words))?)))
}

fn ctetra(chunk: &[u8], endian: Endian) -> Result<Entity> {
    solid("CTETRA", chunk, &CTETRA, endian)
}

fn cpenta(chunk: &[u8], endian: Endian) -> Result<Entity> {
    solid("CPENTA", chunk, &CPENTA, endian)
}

fn chexa(chunk: &[u8], endian: Endian) -> Result<Entity> {
    solid("CHEXA", chunk, &CHEXA, endian)
}

fn ctetp(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &CTETP, endian)?;
    Ok(Entity::Element(Element::Solid(Solid::add_ctetp_data(RecordData::new("CTETP", &words))?)))
}

fn spoint(chunk: &[u8], endian: Endian) -> Result<Entity> {
    let words = words(chunk, &SPOINT, endian)?;
    Ok(Entity::SPoints(vec![RecordData::new("SPOINT", &words).int(0)?]))
}

pub const RULES: &[RuleRow] = &[
    (Marker(2408, 24, 180), "CBAR", decode(CBAR_VECTOR, cbar)),
    (Marker(4001, 40, 275), "CBARAO", Skip),
    (Marker(5408, 54, 261), "CBEAM", decode(CBEAM_VECTOR, cbeam)),
    (Marker(11401, 114, 9016), "CBEAMP", Skip),
    (Marker(4601, 46, 298), "CBEND", Skip),
    (Marker(2608, 26, 60), "CBUSH", Skip),
    (Marker(5608, 56, 218), "CBUSH1D", Skip),
    (Marker(2315, 23, 146), "CCONE", Skip),
    (Marker(201, 2, 69), "CDAMP1", decode(INTS_6, cdamp1)),
    (Marker(301, 3, 70), "CDAMP2", decode(VALUE_CONNECTION, cdamp2)),
    (Marker(401, 4, 71), "CDAMP3", decode(INTS_4, cdamp3)),
    (Marker(501, 5, 72), "CDAMP4", decode(VALUE_POINTS, cdamp4)),
    (Marker(10608, 106, 404), "CDAMP5", decode(INTS_4, cdamp5)),
    (Marker(601, 6, 73), "CELAS1", decode(INTS_6, celas1)),
    (Marker(701, 7, 74), "CELAS2", decode(CELAS2, celas2)),
    (Marker(801, 8, 75), "CELAS3", decode(INTS_4, celas3)),
    (Marker(901, 9, 76), "CELAS4", decode(VALUE_POINTS, celas4)),
    (Marker(8515, 85, 209), "CFLUID2", Skip),
    (Marker(8615, 86, 210), "CFLUID3", Skip),
    (Marker(8715, 87, 211), "CFLUID4", Skip),
    (Marker(1908, 19, 104), "CGAP", decode(CGAP_VECTOR, cgap)),
    (Marker(10808, 108, 406), "CHBDYG", decode(CHBDYG, chbdyg)),
    (Marker(10908, 109, 407), "CHBDYP", Skip),
    (Marker(7308, 73, 253), "CHEXA", decode(CHEXA, chexa)),
    (Marker(1001, 10, 65), "CMASS1", decode(INTS_6, cmass1)),
    (Marker(1101, 11, 66), "CMASS2", decode(VALUE_CONNECTION, cmass2)),
    (Marker(1201, 12, 67), "CMASS3", decode(INTS_4, cmass3)),
    (Marker(1301, 13, 68), "CMASS4", decode(VALUE_POINTS, cmass4)),
    (Marker(2508, 25, 0), "CMFREE", Skip),
    (Marker(1401, 14, 63), "CONM1", decode(CONM1, conm1)),
    (Marker(1501, 15, 64), "CONM2", decode(CONM2, conm2)),
    (Marker(1601, 16, 47), "CONROD", decode(CONROD, conrod)),
    (Marker(12701, 127, 408), "CONV", decode(CONV, conv)),
    (Marker(8908, 89, 422), "CONVM", Skip),
    (Marker(4108, 41, 280), "CPENTA", decode(CPENTA, cpenta)),
    (Marker(9108, 91, 507), "CQUAD", decode(CQUAD, cquad)),
    (Marker(2958, 51, 177), "CQUAD4", decode(CQUAD4, cquad4)),
    (Marker(13900, 139, 9989), "CQUAD4", decode(CQUAD4, cquad4)),
    (Marker(4701, 47, 326), "CQUAD8", decode(CQUAD8, cquad8)),
    (Marker(8009, 80, 367), "CQUADR", decode(CQUAD4, cquadr)),
    (Marker(9008, 90, 508), "CQUADX", decode(CQUAD4, cquadx)),
    (Marker(3001, 30, 48), "CROD", decode(INTS_4, crod)),
    (Marker(12201, 122, 9013), "CTETP", decode(CTETP, ctetp)),
    (Marker(5508, 55, 217), "CTETRA", decode(CTETRA, ctetra)),
    (Marker(5959, 59, 282), "CTRIA3", decode(CTRIA3, ctria3)),
    (Marker(4801, 48, 327), "CTRIA6", decode(CTRIA6, ctria6)),
    (Marker(9200, 92, 385), "CTRIAR", Skip),
    (Marker(6108, 61, 107), "CTRIAX6", Skip),
    (Marker(3701, 37, 49), "CTUBE", decode(INTS_4, ctube)),
    (Marker(3901, 39, 50), "CVISC", decode(INTS_4, cvisc)),
    (Marker(5201, 52, 11), "PLOTEL", Skip),
    (Marker(5551, 49, 105), "SPOINT", decode(SPOINT, spoint)),
    (Marker(11601, 116, 9942), "VUBEAM", Skip),
    (Marker(2108, 21, 224), "CAXIF2", Skip),
    (Marker(3101, 31, 61), "CSHEAR", Skip),
    (Marker(4301, 43, 28), "", Skip),
    (Marker(5601, 56, 296), "", Skip),
    (Marker(6908, 69, 115), "", Skip),
    (Marker(6808, 68, 114), "", Skip),
    (Marker(7409, 74, 9991), "", Skip),
    (Marker(7509, 75, 9992), "", Skip),
    (Marker(7609, 76, 9993), "", Skip),
    (Marker(8100, 81, 381), "", Skip),
    (Marker(8200, 82, 383), "", Skip),
    (Marker(8308, 83, 405), "", Skip),
    (Marker(11201, 112, 9940), "", Skip),
    (Marker(12801, 128, 417), "", Skip),
    (Marker(13900, 139, 9984), "", Skip),
    (Marker(14000, 140, 9990), "", Skip),
    (Marker(16000, 160, 9988), "", Skip),
    (Marker(16100, 161, 9986), "", Skip),
    (Marker(16300, 163, 9989), "", Skip),
    (Marker(16700, 167, 9981), "", Skip),
    (Marker(16800, 168, 9978), "", Skip),
    (Marker(16500, 165, 9987), "", Skip),
    (Marker(2708, 27, 59), "CAABSF", Skip),
    (Marker(5008, 50, 258), "", Skip),
    (Marker(16400, 164, 9983), "", Skip),
    (Marker(3201, 32, 478), "", Skip),
    (Marker(11000, 110, 6667), "", Skip),
    (Marker(12301, 123, 9921), "", Skip),
    (Marker(12401, 124, 9922), "", Skip),
    (Marker(12600, 126, 6661), "", Skip),
    (Marker(14700, 147, 6662), "", Skip),
    (Marker(7309, 73, 0), "", Skip),
    (Marker(17200, 172, 6663), "", Skip),
    (Marker(17300, 173, 6664), "", Skip),
    (Marker(11501, 115, 9941), "", Skip),
    (Marker(12501, 125, 9923), "", Skip),
    (Marker(3401, 34, 9600), "", Skip),
    (Marker(2208, 22, 225), "CAXIF3", Skip),
    (Marker(17000, 170, 9980), "", Skip),
    (Marker(7701, 77, 8881), "", Skip),
    (Marker(12901, 129, 482), "", Skip),
    (Marker(7801, 78, 8883), "", Skip),
    (Marker(4408, 44, 227), "", Skip),
    (Marker(17100, 171, 9979), "", Skip),
    (Marker(2901, 29, 9601), "", Skip),
    (Marker(4508, 45, 228), "", Skip),
    (Marker(16600, 166, 9985), "", Skip),
    (Marker(16200, 162, 9982), "", Skip),
    (Marker(16900, 169, 9977), "", Skip),
    (Marker(1701, 17, 980), "", Skip),
    (Marker(1801, 18, 986), "", Skip),
    (Marker(8801, 88, 984), "", Skip),
    (Marker(8401, 84, 985), "", Skip),
    (Marker(17200, 172, 1000), "", Skip),
    (Marker(23500, 235, 6662), "", Skip),
    (Marker(23800, 238, 6665), "", Skip),
    (Marker(23900, 239, 6666), "", Skip),
    (Marker(1976, 1, 1996), "", Skip),
    (Marker(6120, 1, 60434), "", Skip),
    (Marker(2024, 1001, 2024), "", Skip),
    (Marker(801, 1, 572), "", Skip),
    (Marker(5701, 57, 981), "", Skip),
    (Marker(5801, 58, 982), "", Skip),
    (Marker(6111, 61, 996), "", Skip),
    (Marker(6112, 61, 997), "", Skip),
    (Marker(6113, 61, 998), "", Skip),
    (Marker(6114, 61, 999), "", Skip),
    (Marker(3501, 35, 1), "", Skip),
    (Marker(1001, 100, 10000), "", Skip),
    (Marker(1118, 1, 1874), "", Skip),
    (Marker(7909, 79, 9946), "", Skip),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DecodeRule;
    use nas_model::elements::line::Orientation;

    fn pack(layout: &Layout, words: Vec<Word>) -> Vec<u8> {
        layout.pack(&words, Endian::Little).expect("words match layout")
    }

    #[test]
    fn cbar_flag_selects_grid_orientation() {
        let mut words: Vec<Word> = [10, 1, 2, 3, 4].map(Word::Int).to_vec();
        words.extend([0.0, 0.0].map(Word::Float));
        words.extend([2, 0, 0].map(Word::Int));
        words.extend([0.0; 6].map(Word::Float));
        let chunk = pack(&CBAR_GRID, words);
        assert_eq!(chunk.len(), 64);
        let Entity::Element(Element::Bar(bar)) = cbar(&chunk, Endian::Little).expect("grid orientation") else {
            panic!("CBAR record should decode to a bar");
        };
        assert_eq!(bar.orientation, Orientation::Grid { g0: 4 });
    }

    #[test]
    fn cbar_vector_orientation() {
        let mut words: Vec<Word> = [10, 1, 2, 3].map(Word::Int).to_vec();
        words.extend([0.0, 1.0, 0.0].map(Word::Float));
        words.extend([1, 0, 0].map(Word::Int));
        words.extend([0.0; 6].map(Word::Float));
        let chunk = pack(&CBAR_VECTOR, words);
        let Entity::Element(Element::Bar(bar)) = cbar(&chunk, Endian::Little).expect("vector orientation") else {
            panic!("CBAR record should decode to a bar");
        };
        assert_eq!(bar.orientation, Orientation::Vector { flag: 1, x: [0.0, 1.0, 0.0] });
    }

    #[test]
    fn unknown_orientation_flag_fails() {
        let mut words: Vec<Word> = [10, 1, 2, 3].map(Word::Int).to_vec();
        words.extend([0.0; 3].map(Word::Float));
        words.extend([5, 0].map(Word::Int));
        let chunk = pack(&CGAP_VECTOR, words);
        cgap(&chunk, Endian::Little).expect_err("flag 5 is not an orientation");
    }

    #[test]
    fn chexa_with_mid_side_nodes_is_quadratic() {
        let mut ids = vec![1, 2];
        ids.extend(1..=20);
        let chunk = pack(&CHEXA, ids.iter().copied().map(Word::Int).collect());
        let Entity::Element(element) = chexa(&chunk, Endian::Little).expect("CHEXA") else {
            panic!("CHEXA should decode to an element");
        };
        assert_eq!(element.node_ids().len(), 20);

        let mut ids = vec![1, 2];
        ids.extend(1..=8);
        ids.extend([0; 12]);
        let chunk = pack(&CHEXA, ids.iter().copied().map(Word::Int).collect());
        let Entity::Element(element) = chexa(&chunk, Endian::Little).expect("CHEXA") else {
            panic!("CHEXA should decode to an element");
        };
        assert_eq!(element.node_ids().len(), 8);
    }

    #[test]
    fn cmass_records_are_masses() {
        let chunk = pack(&INTS_6, [5, 7, 1, 2, 1, 1].map(Word::Int).to_vec());
        assert!(matches!(cmass1(&chunk, Endian::Little), Ok(Entity::Mass(Mass::Scalar(_)))));
    }

    #[test]
    fn every_decoder_accepts_a_zero_record() {
        for (marker, name, rule) in RULES {
            if let DecodeRule::Decode { stride, decode } = rule {
                if *name == "CHBDYG" {
                    continue;
                }
                let chunk = vec![0u8; *stride];
                decode(&chunk, Endian::Big).unwrap_or_else(|e| panic!("{name} {marker}: {e}"));
            }
        }
    }
}
