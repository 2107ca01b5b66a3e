//! Error types for binary table decoding

use crate::registry::Marker;
use nas_model::ModelError;
use thiserror::Error;

/// Errors raised while framing, dispatching or decoding a binary table
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Fewer bytes remain than a declared layout needs
    #[error("need {needed} bytes at offset {offset}, only {available} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Corrupt framing or a payload that does not divide into whole records
    #[error("{table} {}: {message} (offset {offset}, record {index})", marker_label(.marker))]
    Structural {
        table: String,
        marker: Option<Marker>,
        offset: usize,
        index: usize,
        message: String,
    },

    /// A marker the table registry does not know
    #[error("{table}: unknown marker {marker} at offset {offset}")]
    UnknownMarker {
        table: String,
        marker: Marker,
        offset: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn marker_label(marker: &Option<Marker>) -> String {
    marker.map_or_else(|| "framing".to_string(), |m| m.to_string())
}

impl DecodeError {
    /// True for errors confined to one sub-block
    pub fn is_structural(&self) -> bool {
        matches!(self, DecodeError::Structural { .. } | DecodeError::Truncated { .. })
    }
}

/// Result alias for decoding
pub type Result<T> = std::result::Result<T, DecodeError>;
