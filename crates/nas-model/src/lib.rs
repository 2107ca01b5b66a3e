//! Nastran bulk-data entity model.
//!
//! This crate provides:
//! - **Typed field coercion** for text cards ([`BdfCard`])
//! - **Entity object model**: nodes, coordinate systems, elements, masses,
//!   rigid elements, properties, materials, loads, constraints, sets, PARAMs
//!   and identity-only generic cards, each built from a text card or a
//!   decoded binary tuple ([`RecordData`])
//! - **Card registry** mapping card types to storage categories ([`SlotConfig`])
//! - **Model graph** ([`BdfModel`]) with typed lookups, derived adjacency
//!   maps, cross-reference validation and free-field serialization

pub mod cards;
pub mod constraints;
pub mod coords;
pub mod elements;
pub mod entity;
pub mod error;
pub mod field;
pub mod generic;
pub mod loads;
pub mod masses;
pub mod materials;
pub mod model;
pub mod nodes;
pub mod op2_data;
pub mod params;
pub mod properties;
pub mod rigid;
pub mod sets;
pub mod slots;
pub mod summary;
pub mod writer;

pub use elements::{DimFilter, Element, ElementDim};
pub use entity::{BulkEntry, Entity, RefTarget, Reference};
pub use error::{ModelError, Result};
pub use field::{BdfCard, Field};
pub use model::get::{MaterialRef, NodeRef};
pub use model::maps::ModelMaps;
pub use model::xref::{ElementRef, PropertyRef};
pub use model::{BdfModel, ModelConfig, RejectedCard};
pub use op2_data::{RecordData, Word};
pub use slots::{Slot, SlotConfig};
pub use summary::ModelSummary;
