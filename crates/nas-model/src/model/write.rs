//! Free-field serialization of a whole model

use super::BdfModel;
use crate::entity::BulkEntry;
use crate::nodes::spoint_fields;
use crate::slots::Slot;
use crate::writer;
use std::io::{self, Write};
use std::path::Path;

impl BdfModel {
    /// The bulk-data section as free-field text
    ///
    /// Categories are written in a fixed order and entities sorted by ID.
    /// Nodes merged away by equivalencing and the basic coordinate system are
    /// left out.
    pub fn write_bulk(&self) -> String {
        let mut out = String::from("BEGIN BULK\n");
        for slot in Slot::ALL {
            match slot {
                Slot::Nodes => {
                    for grid in self.nodes.values().filter(|g| !g.is_replaced()) {
                        out.push_str(&grid.write_card());
                    }
                }
                Slot::Spoints => {
                    if !self.spoints.is_empty() {
                        let ids: Vec<i32> = self.spoints.iter().copied().collect();
                        out.push_str(&writer::write_card("", &spoint_fields(&ids)));
                    }
                }
                other => {
                    for entry in self.slot_entries(other) {
                        out.push_str(&entry.write_card());
                    }
                }
            }
        }
        out.push_str("ENDDATA\n");
        out
    }

    /// Write the bulk-data section to `writer`
    pub fn write_bulk_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.write_bulk().as_bytes())?;
        writer.flush()
    }

    /// Write the bulk-data section to a file
    pub fn write_bulk_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_bulk_to(io::BufWriter::new(file))
    }
}
