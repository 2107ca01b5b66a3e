//! Entity decoder dispatch
//!
//! Each framed record of a table is one sub-block: a 3-integer marker
//! followed by a payload of fixed-stride entity records. A small state
//! machine walks one sub-block at a time:
//!
//! 1. `AwaitMarker` reads the marker and resolves it through the table
//!    registry.
//! 2. `DecodeEntityBatch` checks that the payload divides into whole records
//!    and decodes them in order.
//! 3. `Done` or `Error` ends the sub-block.
//!
//! Decoding produces an ordered list of entities; merging them into a model
//! is a separate sequential step so tables can be decoded in parallel.

use crate::cursor::{Endian, read_ints};
use crate::error::{DecodeError, Result};
use crate::record::{Record, split_records};
use crate::registry::{DecodeRule, Marker, Registry, RegistryEntry, TableKind};
use nas_model::{BdfModel, Entity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Bytes of the marker opening every sub-block
pub const MARKER_BYTES: usize = 12;

/// What to do with a marker the registry does not know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownMarkerPolicy {
    /// Stop decoding with [`DecodeError::UnknownMarker`]
    #[default]
    Fail,
    /// Skip the sub-block and count it
    Skip,
}

/// Binary decode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub endian: Endian,
    pub unknown_markers: UnknownMarkerPolicy,
    /// Later records replace earlier ones with the same ID
    pub allow_overwrites: bool,
    /// Drop records whose ID is zero or negative
    pub skip_nonpositive_ids: bool,
    /// Record structural errors and continue with the next sub-block
    pub recover_structural: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            endian: Endian::Little,
            unknown_markers: UnknownMarkerPolicy::Fail,
            allow_overwrites: true,
            skip_nonpositive_ids: true,
            recover_structural: false,
        }
    }
}

/// What happened while decoding one table
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub table: TableKind,
    /// Sub-blocks seen
    pub records: usize,
    /// Decoded entities per card type
    pub counts: BTreeMap<String, usize>,
    /// Recognized sub-blocks that are not decoded, per card name
    pub undecoded: BTreeMap<String, usize>,
    /// Unknown markers skipped under [`UnknownMarkerPolicy::Skip`]
    #[serde(serialize_with = "markers_as_text")]
    pub skipped_markers: BTreeMap<Marker, usize>,
    /// Records dropped for a non-positive ID
    pub dropped_ids: usize,
    /// Sub-blocks abandoned under `recover_structural`
    pub structural_errors: Vec<String>,
}

fn markers_as_text<S: serde::Serializer>(
    markers: &BTreeMap<Marker, usize>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(markers.iter().map(|(marker, n)| (marker.to_string(), n)))
}

impl DecodeReport {
    fn new(table: TableKind) -> Self {
        DecodeReport {
            table,
            records: 0,
            counts: BTreeMap::new(),
            undecoded: BTreeMap::new(),
            skipped_markers: BTreeMap::new(),
            dropped_ids: 0,
            structural_errors: Vec::new(),
        }
    }

    /// Number of sub-blocks skipped for an unknown marker
    pub fn skipped(&self) -> usize {
        self.skipped_markers.values().sum()
    }

    /// Total decoded entities
    pub fn entity_count(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Entities of one table in record order, not yet in a model
#[derive(Debug)]
pub struct DecodedTable {
    pub entities: Vec<Entity>,
    pub report: DecodeReport,
}

impl DecodedTable {
    /// Insert every entity into `model` in decode order
    pub fn merge_into(self, model: &mut BdfModel) -> Result<DecodeReport> {
        for entity in self.entities {
            model.add_entity(entity)?;
        }
        Ok(self.report)
    }
}

enum State<'r> {
    AwaitMarker,
    DecodeEntityBatch {
        marker: Marker,
        entry: &'r RegistryEntry,
    },
    Done,
    Error(DecodeError),
}

struct TableDecoder<'c> {
    registry: &'static Registry,
    config: &'c DecodeConfig,
    entities: Vec<Entity>,
    report: DecodeReport,
}

impl<'c> TableDecoder<'c> {
    fn new(registry: &'static Registry, config: &'c DecodeConfig) -> Self {
        TableDecoder {
            registry,
            config,
            entities: Vec::new(),
            report: DecodeReport::new(registry.table()),
        }
    }

    fn table_name(&self) -> String {
        self.registry.table().name().to_string()
    }

    fn structural(&self, marker: Option<Marker>, offset: usize, index: usize, message: String) -> DecodeError {
        DecodeError::Structural {
            table: self.table_name(),
            marker,
            offset,
            index,
            message,
        }
    }

    /// Run one sub-block through the state machine
    fn run(&mut self, index: usize, record: &Record<'_>) -> Result<()> {
        self.report.records += 1;
        let mut state = State::AwaitMarker;
        loop {
            state = match state {
                State::AwaitMarker => self.await_marker(index, record),
                State::DecodeEntityBatch { marker, entry } => self.decode_batch(marker, entry, record),
                State::Done => return Ok(()),
                State::Error(e) => return Err(e),
            };
        }
    }

    fn await_marker(&mut self, index: usize, record: &Record<'_>) -> State<'static> {
        if record.payload.len() < MARKER_BYTES {
            return State::Error(self.structural(
                None,
                record.offset,
                index,
                format!("payload of {} bytes is too short for a marker", record.payload.len()),
            ));
        }
        let marker = match read_ints(record.payload, 0, 3, self.config.endian) {
            Ok(words) => Marker(words[0], words[1], words[2]),
            Err(e) => return State::Error(e),
        };
        match self.registry.lookup(marker) {
            Some(entry) => State::DecodeEntityBatch { marker, entry },
            None => match self.config.unknown_markers {
                UnknownMarkerPolicy::Fail => State::Error(DecodeError::UnknownMarker {
                    table: self.table_name(),
                    marker,
                    offset: record.offset,
                }),
                UnknownMarkerPolicy::Skip => {
                    warn!(table = %self.registry.table(), %marker, offset = record.offset, "skipping unknown marker");
                    *self.report.skipped_markers.entry(marker).or_insert(0) += 1;
                    State::Done
                }
            },
        }
    }

    fn decode_batch(&mut self, marker: Marker, entry: &RegistryEntry, record: &Record<'_>) -> State<'static> {
        let (stride, decode) = match entry.rule {
            DecodeRule::Skip => {
                let name = if entry.name.is_empty() { marker.to_string() } else { entry.name.to_string() };
                debug!(table = %self.registry.table(), %marker, card = %name, "sub-block not decoded");
                *self.report.undecoded.entry(name).or_insert(0) += 1;
                return State::Done;
            }
            DecodeRule::Decode { stride, decode } => (stride, decode),
        };

        let body = &record.payload[MARKER_BYTES..];
        let body_offset = record.offset + MARKER_BYTES;
        if body.len() % stride != 0 {
            return State::Error(self.structural(
                Some(marker),
                body_offset,
                0,
                format!("{} payload of {} bytes is not a multiple of stride {stride}", entry.name, body.len()),
            ));
        }

        let n_entities = body.len() / stride;
        let mut batch = Vec::with_capacity(n_entities);
        for (i, chunk) in body.chunks_exact(stride).enumerate() {
            match decode(chunk, self.config.endian) {
                Ok(entity) => batch.push(entity),
                Err(e) => {
                    return State::Error(self.structural(
                        Some(marker),
                        body_offset + i * stride,
                        i,
                        format!("{} entity {i} of {n_entities}: {e}", entry.name),
                    ));
                }
            }
        }

        let mut kept = 0;
        for entity in batch {
            if self.config.skip_nonpositive_ids && entity.id() <= 0 {
                self.report.dropped_ids += 1;
                continue;
            }
            *self.report.counts.entry(entity.card_type().to_string()).or_insert(0) += 1;
            self.entities.push(entity);
            kept += 1;
        }
        debug!(
            table = %self.registry.table(),
            %marker,
            card = entry.name,
            records = n_entities,
            kept,
            "decoded entity batch"
        );
        State::Done
    }

    fn finish(self) -> DecodedTable {
        DecodedTable {
            entities: self.entities,
            report: self.report,
        }
    }
}

/// Decode one framed table into an ordered entity list
///
/// # Errors
/// Framing errors and unknown markers (under [`UnknownMarkerPolicy::Fail`])
/// always abort. A sub-block that does not divide into whole records aborts
/// unless `recover_structural` is set, in which case it is recorded in the
/// report and decoding resumes with the next sub-block.
pub fn decode_table(table: TableKind, buf: &[u8], config: &DecodeConfig) -> Result<DecodedTable> {
    let records = split_records(table.name(), buf, config.endian)?;
    let mut decoder = TableDecoder::new(table.registry(), config);
    for (index, record) in records.iter().enumerate() {
        match decoder.run(index, record) {
            Ok(()) => {}
            Err(e) if e.is_structural() && config.recover_structural => {
                warn!(table = %table, record = index, error = %e, "abandoning sub-block");
                decoder.report.structural_errors.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }
    let decoded = decoder.finish();
    info!(
        table = %table,
        records = decoded.report.records,
        entities = decoded.entities.len(),
        skipped = decoded.report.skipped(),
        "decoded table"
    );
    Ok(decoded)
}

/// Decode one table straight into `model`
pub fn decode_table_into(
    model: &mut BdfModel,
    table: TableKind,
    buf: &[u8],
    config: &DecodeConfig,
) -> Result<DecodeReport> {
    decode_table(table, buf, config)?.merge_into(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{FieldKind, Layout};
    use crate::record::encode_record;
    use nas_model::Word;

    const CROD: Layout = Layout::new(&[(FieldKind::I32, 4)]);

    fn sub_block(marker: Marker, records: &[[i32; 4]], endian: Endian) -> Vec<u8> {
        let mut payload = Vec::new();
        for v in [marker.0, marker.1, marker.2] {
            endian.write_i32(&mut payload, v).expect("write to vec");
        }
        for r in records {
            let words: Vec<Word> = r.iter().map(|&v| Word::Int(v)).collect();
            payload.extend(CROD.pack(&words, endian).expect("words match layout"));
        }
        encode_record(&payload, endian).expect("small payload")
    }

    #[test]
    fn crod_batch_decodes_in_order() {
        let buf = sub_block(Marker(3001, 30, 48), &[[7, 1, 1, 2], [3, 1, 2, 3]], Endian::Little);
        let decoded = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect("valid table");
        let ids: Vec<i32> = decoded.entities.iter().map(Entity::id).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(decoded.report.counts.get("CROD"), Some(&2));
    }

    #[test]
    fn skip_rule_counts_undecoded_records() {
        let buf = sub_block(Marker(5301, 53, 4), &[[1, 2, 3, 4]], Endian::Little);
        let decoded = decode_table(TableKind::Geom1, &buf, &DecodeConfig::default()).expect("known marker");
        assert!(decoded.entities.is_empty());
        assert_eq!(decoded.report.undecoded.get("SEQGP"), Some(&1));
        assert_eq!(decoded.report.skipped(), 0);
    }

    #[test]
    fn short_payload_is_structural() {
        let buf = encode_record(&[0; 8], Endian::Little).expect("small payload");
        let err = decode_table(TableKind::Geom2, &buf, &DecodeConfig::default()).expect_err("no marker");
        assert!(err.is_structural());
    }

    #[test]
    fn recovery_moves_to_the_next_sub_block() {
        let mut bad = Vec::new();
        for v in [3001, 30, 48, 1, 2] {
            Endian::Little.write_i32(&mut bad, v).expect("write to vec");
        }
        let mut buf = encode_record(&bad, Endian::Little).expect("small payload");
        buf.extend(sub_block(Marker(3001, 30, 48), &[[9, 1, 1, 2]], Endian::Little));

        let config = DecodeConfig {
            recover_structural: true,
            ..DecodeConfig::default()
        };
        let decoded = decode_table(TableKind::Geom2, &buf, &config).expect("recovered");
        assert_eq!(decoded.entities.len(), 1);
        assert_eq!(decoded.report.structural_errors.len(), 1);
        assert!(decoded.report.structural_errors[0].contains("not a multiple of stride 16"));
    }
}
