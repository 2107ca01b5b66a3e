//! Free-field bulk-data card writer

use crate::field::Field;

/// Data fields per physical line after the name/continuation field
const FIELDS_PER_LINE: usize = 8;

/// Render a card as comma-separated free-field text
///
/// `fields[0]` is the card name. Trailing blanks are dropped, every line
/// carries at most eight data fields and continuation lines start with an
/// empty continuation field. The comment, if any, is written above the card
/// with a `$` prefix on each line.
pub fn write_card(comment: &str, fields: &[Field]) -> String {
    let mut out = String::new();
    for line in comment.lines() {
        out.push('$');
        out.push_str(line);
        out.push('\n');
    }

    let end = fields
        .iter()
        .rposition(|f| !f.is_blank())
        .map_or(0, |i| i + 1);
    let fields = &fields[..end.max(1).min(fields.len())];
    if fields.is_empty() {
        return out;
    }

    out.push_str(&fields[0].to_string());
    for (i, field) in fields[1..].iter().enumerate() {
        if i > 0 && i % FIELDS_PER_LINE == 0 {
            out.push('\n');
        }
        out.push(',');
        out.push_str(&field.to_string());
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_card_on_one_line() {
        let fields = vec![
            Field::text("CROD"),
            Field::Int(1),
            Field::Int(2),
            Field::Int(3),
            Field::Int(4),
            Field::Blank,
        ];
        assert_eq!(write_card("", &fields), "CROD,1,2,3,4\n");
    }

    #[test]
    fn long_card_continues() {
        let mut fields = vec![Field::text("SET1")];
        fields.extend((1..=10).map(Field::Int));
        let text = write_card("a set", &fields);
        assert_eq!(text, "$a set\nSET1,1,2,3,4,5,6,7,8\n,9,10\n");
    }

    #[test]
    fn interior_blanks_are_kept() {
        let fields = vec![Field::text("GRID"), Field::Int(5), Field::Blank, Field::Float(1.0)];
        assert_eq!(write_card("", &fields), "GRID,5,,1.0\n");
    }
}
