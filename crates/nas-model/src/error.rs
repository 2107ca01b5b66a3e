//! Error types for the bulk-data model

use thiserror::Error;

/// Errors raised while building, querying or validating a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A lookup by ID missed. The message lists every valid ID in the category
    /// so a caller can see what was actually loaded.
    #[error("{category} {id} not found{context}.  Allowed {category} ids={}", format_ids(.valid_ids))]
    NotFound {
        category: &'static str,
        id: i32,
        context: String,
        valid_ids: Vec<i32>,
    },

    /// A named lookup (PARAM, DMIG) missed
    #[error("{category} {name:?} not found.  Allowed {category} names=[{}]", .valid.join(", "))]
    NameNotFound {
        category: &'static str,
        name: String,
        valid: Vec<String>,
    },

    /// A field on a text card could not be coerced to the requested type
    #[error("{card}: field {index} ({name}) {message}")]
    Field {
        card: String,
        index: usize,
        name: String,
        message: String,
    },

    /// A card had more fields than its layout allows
    #[error("{card}: expected at most {max} fields, found {found}")]
    TooManyFields {
        card: String,
        max: usize,
        found: usize,
    },

    /// A decoded binary tuple was shorter than the entity layout requires
    #[error("{card}: binary tuple has {found} words, expected at least {expected}")]
    ShortTuple {
        card: String,
        expected: usize,
        found: usize,
    },

    /// An entity failed its self-consistency check
    #[error("{card} {id}: {message}")]
    Verify {
        card: String,
        id: i32,
        message: String,
    },

    /// A category/card-type configuration problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cross-referencing found dangling references
    #[error("cross-reference failed with {} missing reference(s); first: {}", .missing.len(), .missing.first().map(String::as_str).unwrap_or(""))]
    CrossReference { missing: Vec<String> },

    /// An entity with the same key already exists and overwrites are disabled
    #[error("duplicate {category} {id}")]
    Duplicate { category: &'static str, id: i32 },

    /// A name-keyed entity (PARAM, DMIG) already exists and overwrites are
    /// disabled
    #[error("duplicate {category} {name:?}")]
    DuplicateName { category: &'static str, name: String },

    /// A coordinate system chain could not be resolved
    #[error("coordinate system {cid}: {message}")]
    Coordinate { cid: i32, message: String },

    /// One or more cards of a text deck failed to build
    #[error("model building encountered {} error(s):\n{}", .messages.len(), .messages.join("\n"))]
    Deck { messages: Vec<String> },
}

/// Format a sorted ID list the way lookups report it
fn format_ids(ids: &[i32]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

/// Result alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Build a `Field` error
    pub fn field(card: &str, index: usize, name: &str, message: impl Into<String>) -> Self {
        ModelError::Field {
            card: card.to_string(),
            index,
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Build a `Verify` error
    pub fn verify(card: &str, id: i32, message: impl Into<String>) -> Self {
        ModelError::Verify {
            card: card.to_string(),
            id,
            message: message.into(),
        }
    }
}
