// src/telemetry/mod.rs — Normalize decoded log messages into a per-type dataset

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::decoder::{FieldValue, LogReader};
use crate::infra::errors::AerologError;
use crate::util;

/// One normalized log message: field name → JSON-safe value.
pub type TelemetryRecord = Map<String, Value>;

/// Structural record type describing other layouts; never part of a dataset.
const STRUCTURAL_TYPE: &str = "FMT";

/// All telemetry from one uploaded log, grouped by message type, records
/// in decode order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetryDataset(HashMap<String, Vec<TelemetryRecord>>);

impl TelemetryDataset {
    pub fn records(&self, msg_type: &str) -> Option<&[TelemetryRecord]> {
        self.0.get(msg_type).map(Vec::as_slice)
    }

    pub fn push(&mut self, msg_type: String, record: TelemetryRecord) {
        self.0.entry(msg_type).or_default().push(record);
    }

    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of distinct message types.
    pub fn type_count(&self) -> usize {
        self.0.len()
    }

    /// Total record count across all message types.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decode a saved log file into a dataset.
///
/// Structural FMT records are consumed by the reader but excluded from the
/// result. Individual undecodable stretches are skipped; the whole call
/// fails only when the file cannot be read or contains no decodable
/// messages at all.
pub fn parse_log_file(path: &Path) -> Result<TelemetryDataset, AerologError> {
    let mut reader = LogReader::open(path).map_err(|e| AerologError::Decode {
        message: format!("cannot open log file: {e}"),
    })?;

    let mut dataset = TelemetryDataset::default();
    while let Some(msg) = reader.next_message() {
        if msg.msg_type == STRUCTURAL_TYPE {
            continue;
        }
        let mut record = TelemetryRecord::new();
        for (name, value) in msg.fields {
            record.insert(name, normalize_value(value));
        }
        dataset.push(msg.msg_type, record);
    }

    if reader.decoded() == 0 {
        return Err(AerologError::Decode {
            message: "no recognizable log messages in file".into(),
        });
    }
    if reader.skipped() > 0 {
        tracing::debug!(skipped = reader.skipped(), "skipped undecodable log bytes");
    }
    tracing::info!(
        message_types = dataset.type_count(),
        records = dataset.len(),
        "parsed telemetry"
    );
    Ok(dataset)
}

/// Project a decoded field value to JSON. Byte fields become lossy UTF-8
/// text, arrays become number arrays, and non-finite floats (which JSON
/// cannot carry) become null.
fn normalize_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Signed(n) => Value::from(n),
        FieldValue::Unsigned(n) => Value::from(n),
        FieldValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Bytes(b) => Value::String(util::nul_trimmed_lossy(&b)),
        FieldValue::SignedArray(v) => Value::Array(v.into_iter().map(Value::from).collect()),
    }
}
