//! # nas-op2
//!
//! Decoding of the geometry tables of Nastran OP2 files.
//!
//! - [`cursor`]: stateless typed unpacking at an explicit offset
//! - [`record`]: Fortran record framing and byte-order detection
//! - [`registry`]: marker → card/decode-rule tables for GEOM1, GEOM2 and DYNAMICS
//! - [`dispatch`]: the per-sub-block decode state machine
//! - [`reader`]: parallel decoding of several tables into one model

pub mod cursor;
pub mod dispatch;
pub mod dynamics;
pub mod error;
pub mod geom1;
pub mod geom2;
pub mod reader;
pub mod record;
pub mod registry;

pub use cursor::{Endian, FieldKind, Layout, read_ints, unpack};
pub use dispatch::{DecodeConfig, DecodeReport, DecodedTable, UnknownMarkerPolicy, decode_table, decode_table_into};
pub use error::{DecodeError, Result};
pub use reader::{read_table_files, read_tables};
pub use record::{Record, encode_record, split_records};
pub use registry::{DecodeRule, Marker, Registry, RegistryEntry, TableKind};
