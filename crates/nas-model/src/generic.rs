//! Cards stored by identity and raw field list

use crate::entity::BulkEntry;
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// A card whose fields are kept verbatim
///
/// Used for the aero, optimization, dynamics and table categories where the
/// model only needs identity and faithful re-serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericCard {
    pub card_type: String,
    /// Integer identity, 0 for name-keyed cards
    pub id: i32,
    /// Name identity for name-keyed cards (DMIG)
    pub name: Option<String>,
    /// Every field including the card name
    pub fields: Vec<Field>,
    #[serde(default)]
    pub comment: String,
}

impl GenericCard {
    /// Card keyed by the integer in field 1
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        Ok(GenericCard {
            card_type: card.name(),
            id: card.integer(1, "id")?,
            name: None,
            fields: classify_all(card),
            comment: comment.to_string(),
        })
    }

    /// Card keyed by the name in field 1
    pub fn add_named_card(card: &BdfCard, comment: &str) -> Result<Self> {
        Ok(GenericCard {
            card_type: card.name(),
            id: 0,
            name: Some(card.string(1, "name")?),
            fields: classify_all(card),
            comment: comment.to_string(),
        })
    }

    /// Field at `index`, blank past the end
    pub fn field(&self, index: usize) -> &Field {
        static BLANK: Field = Field::Blank;
        self.fields.get(index).unwrap_or(&BLANK)
    }
}

fn classify_all(card: &BdfCard) -> Vec<Field> {
    card.fields()
        .iter()
        .enumerate()
        .map(|(i, f)| match f {
            Field::Text(s) if i == 0 => Field::Text(s.to_ascii_uppercase()),
            Field::Text(s) => Field::classify(s),
            other => other.clone(),
        })
        .collect()
}

impl BulkEntry for GenericCard {
    fn card_type(&self) -> &str {
        &self.card_type
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        self.fields.clone()
    }

    fn verify(&self) -> Result<()> {
        if self.name.is_none() && self.id <= 0 {
            return Err(ModelError::verify(&self.card_type, self.id, "id must be a positive integer"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_classified() {
        let card = BdfCard::from_tokens(&["eigrl", "10", "", "", "20", "", "", "MASS"]);
        let eigrl = GenericCard::add_card(&card, "").expect("EIGRL");
        assert_eq!(eigrl.card_type, "EIGRL");
        assert_eq!(eigrl.id, 10);
        assert_eq!(eigrl.field(4), &Field::Int(20));
        assert_eq!(eigrl.field(7), &Field::text("MASS"));
        eigrl.verify().expect("EIGRL should verify");
    }

    #[test]
    fn named_card() {
        let card = BdfCard::from_tokens(&["DMIG", "STIF", "0", "6", "1"]);
        let dmig = GenericCard::add_named_card(&card, "").expect("DMIG");
        assert_eq!(dmig.name.as_deref(), Some("STIF"));
        dmig.verify().expect("named cards have no integer id");
    }
}
