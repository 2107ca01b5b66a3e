//! Multi-table decoding into one model
//!
//! Tables are independent, so they are decoded on the rayon pool. The
//! decoded entity lists are then merged into the model one table at a time
//! in input order, which keeps the result identical to a sequential read.

use crate::dispatch::{DecodeConfig, DecodeReport, decode_table};
use crate::error::Result;
use crate::registry::TableKind;
use nas_model::{BdfModel, ModelConfig};
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

/// Decode several tables and merge them into a fresh model
pub fn read_tables(tables: &[(TableKind, &[u8])], config: &DecodeConfig) -> Result<(BdfModel, Vec<DecodeReport>)> {
    let decoded = tables
        .par_iter()
        .map(|&(kind, buf)| decode_table(kind, buf, config))
        .collect::<Result<Vec<_>>>()?;

    let mut model = BdfModel::new(ModelConfig {
        allow_overwrites: config.allow_overwrites,
        ..ModelConfig::default()
    });
    let mut reports = Vec::with_capacity(decoded.len());
    for table in decoded {
        reports.push(table.merge_into(&mut model)?);
    }
    info!(
        tables = reports.len(),
        nodes = model.nodes.len(),
        elements = model.elements.len(),
        "merged binary tables"
    );
    Ok((model, reports))
}

/// Decode tables stored one per file
pub fn read_table_files(files: &[(TableKind, &Path)], config: &DecodeConfig) -> Result<(BdfModel, Vec<DecodeReport>)> {
    let buffers = files
        .iter()
        .map(|&(kind, path)| -> Result<(TableKind, Vec<u8>)> { Ok((kind, std::fs::read(path)?)) })
        .collect::<Result<Vec<_>>>()?;
    let tables: Vec<(TableKind, &[u8])> = buffers.iter().map(|(kind, buf)| (*kind, buf.as_slice())).collect();
    read_tables(&tables, config)
}
