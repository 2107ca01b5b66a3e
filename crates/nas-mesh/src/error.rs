use nas_model::ModelError;
use serde::Serialize;
use thiserror::Error;

/// An element whose connectivity repeats a node after merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegenerateElement {
    pub eid: i32,
    pub card_type: String,
    /// Node IDs appearing more than once
    pub repeated: Vec<i32>,
}

#[derive(Error, Debug)]
pub enum EquivalenceError {
    #[error("invalid equivalence settings: {0}")]
    Config(String),

    #[error("{} element(s) became degenerate; first: {}", .elements.len(), first(.elements))]
    Degenerate { elements: Vec<DegenerateElement> },

    #[error(transparent)]
    Model(#[from] ModelError),
}

fn first(elements: &[DegenerateElement]) -> String {
    elements.first().map_or_else(String::new, |e| {
        format!("{} {} repeats nodes {:?}", e.card_type, e.eid, e.repeated)
    })
}

pub type Result<T> = std::result::Result<T, EquivalenceError>;
