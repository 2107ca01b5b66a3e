//! Model summary for reporting

use crate::model::BdfModel;
use crate::slots::Slot;
use serde::Serialize;
use std::collections::BTreeMap;

/// Card counts and category sizes of a model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSummary {
    /// Cards read per card type
    pub card_count: BTreeMap<String, usize>,
    /// Non-empty categories and their entry counts
    pub categories: BTreeMap<&'static str, usize>,
    /// Card types with no storage category, with their occurrence count
    pub rejected: BTreeMap<String, usize>,
    pub is_xref: bool,
}

impl ModelSummary {
    pub fn from_model(model: &BdfModel) -> Self {
        let categories = Slot::ALL
            .into_iter()
            .map(|slot| (slot.name(), model.slot_len(slot)))
            .filter(|&(_, n)| n > 0)
            .collect();
        let mut rejected = BTreeMap::new();
        for card in &model.rejected {
            *rejected.entry(card.card_type.clone()).or_insert(0) += 1;
        }
        ModelSummary {
            card_count: model.card_count.clone(),
            categories,
            rejected,
            is_xref: model.is_xref(),
        }
    }

    /// Total number of stored cards
    pub fn total_cards(&self) -> usize {
        self.card_count.values().sum()
    }
}
