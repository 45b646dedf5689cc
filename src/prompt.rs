// src/prompt.rs — System-prompt construction from sampled telemetry

use serde_json::Value;

use crate::telemetry::TelemetryDataset;
use crate::util;

/// Message types worth surfacing to the model.
const SAMPLE_TYPES: [&str; 6] = ["GPS", "BAT", "ERR", "RCIN", "BARO", "MSG"];

/// Records kept per sampled message type.
const RECORDS_PER_TYPE: usize = 3;

/// Hard cap on the serialized telemetry sample, in bytes.
const SAMPLE_BUDGET: usize = 2000;

const PREAMBLE: &str = "\
You are an intelligent UAV telemetry assistant.
Use the official ArduPilot log message definitions: https://ardupilot.org/plane/docs/logmessages.html
Interpret telemetry data and answer user queries about UAV behavior.
Watch for common anomalies: sudden GPS altitude or fix-type jumps, battery \
voltage sag or temperature spikes, high-severity ERR subsystem codes, and \
loss of RC signal on the input channels.";

/// Build the system prompt for a chat turn.
///
/// Keeps the first few records of each recognized message type, serializes
/// the sample to JSON, and appends it to the preamble under a hard byte
/// budget (a blunt cutoff, not content-aware). An empty dataset yields the
/// bare preamble with no telemetry block.
pub fn build_system_prompt(telemetry: &TelemetryDataset) -> String {
    let mut sample = serde_json::Map::new();
    for msg_type in SAMPLE_TYPES {
        let Some(records) = telemetry.records(msg_type) else {
            continue;
        };
        let head: Vec<Value> = records
            .iter()
            .take(RECORDS_PER_TYPE)
            .cloned()
            .map(Value::Object)
            .collect();
        if !head.is_empty() {
            sample.insert(msg_type.to_string(), Value::Array(head));
        }
    }

    if sample.is_empty() {
        return PREAMBLE.to_string();
    }

    let serialized = Value::Object(sample).to_string();
    format!(
        "{PREAMBLE}\n\nSample telemetry:\n{}",
        util::truncate_str(&serialized, SAMPLE_BUDGET)
    )
}
