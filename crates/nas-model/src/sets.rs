//! ID sets

use crate::entity::{BulkEntry, verify_positive};
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// SET1: a list of structural IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set1 {
    pub sid: i32,
    /// Set refers to the skin of the listed elements
    pub skin: bool,
    /// Sorted, unique IDs
    pub ids: Vec<i32>,
    #[serde(default)]
    pub comment: String,
}

impl Set1 {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let skin = matches!(card.field(2), Field::Text(s) if s.trim().eq_ignore_ascii_case("SKIN"));
        let mut ids = card.integer_list(if skin { 3 } else { 2 }, "ids")?;
        if ids.is_empty() {
            return Err(ModelError::field("SET1", 2, "ID1", "is required but blank"));
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(Set1 {
            sid: card.integer(1, "sid")?,
            skin,
            ids,
            comment: comment.to_string(),
        })
    }
}

impl BulkEntry for Set1 {
    fn card_type(&self) -> &str {
        "SET1"
    }

    fn id(&self) -> i32 {
        self.sid
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::text("SET1"), Field::Int(self.sid)];
        if self.skin {
            fields.push(Field::text("SKIN"));
        }
        fields.extend(self.ids.iter().copied().map(Field::Int));
        fields
    }

    fn verify(&self) -> Result<()> {
        verify_positive("SET1", self.sid, "ids", &self.ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sorted_and_unique() {
        let card = BdfCard::from_tokens(&["SET1", "3", "31", "THRU", "33", "12", "31"]);
        let set = Set1::add_card(&card, "").expect("SET1");
        assert_eq!(set.ids, vec![12, 31, 32, 33]);
        assert!(!set.skin);
    }

    #[test]
    fn skin_flag() {
        let card = BdfCard::from_tokens(&["SET1", "4", "SKIN", "5"]);
        let set = Set1::add_card(&card, "").expect("SET1");
        assert!(set.skin);
        assert_eq!(set.raw_fields()[2], Field::text("SKIN"));
    }
}
