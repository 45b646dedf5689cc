// src/decoder/mod.rs — Self-describing DataFlash (.bin) log reader
//
// A DataFlash log carries its own schema: FMT records (message type 0x80)
// describe the wire layout of every other message type, so the reader
// bootstraps from the FMT definition itself and registers layouts as it
// encounters them. Decoding is robust: bytes that do not frame a known
// message are skipped one at a time until the stream resynchronizes.

pub mod format;

use std::collections::HashMap;
use std::io;
use std::path::Path;

pub use format::{FieldDef, FieldType, FieldValue, MessageFormat};

use crate::util;

pub const HEAD1: u8 = 0xA3;
pub const HEAD2: u8 = 0x95;

/// Message type id reserved for FMT records.
pub const FMT_MSG_ID: u8 = 0x80;

/// One decoded log message: type name plus fields in catalog order.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub msg_type: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl LogMessage {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Sequential reader over one log file.
pub struct LogReader {
    data: Vec<u8>,
    offset: usize,
    formats: HashMap<u8, MessageFormat>,
    decoded: u64,
    skipped: u64,
}

enum Step {
    /// The remaining bytes cannot hold the framed message; end of stream.
    Eof,
    /// Not a decodable message at this offset; skip one byte and retry.
    Resync,
    Message(LogMessage, usize),
}

impl LogReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mut formats = HashMap::new();
        // FMT describes itself; seed it so the first FMT record decodes.
        let fmt = MessageFormat::from_definition("FMT", 89, "BBnNZ", "Type,Length,Name,Format,Columns")
            .expect("FMT bootstrap definition is well-formed");
        formats.insert(FMT_MSG_ID, fmt);

        Self {
            data,
            offset: 0,
            formats,
            decoded: 0,
            skipped: 0,
        }
    }

    /// Next decodable message, or `None` at end-of-stream.
    pub fn next_message(&mut self) -> Option<LogMessage> {
        loop {
            self.seek_header()?;

            let msg_id = self.data[self.offset + 2];
            let step = match self.formats.get(&msg_id) {
                None => Step::Resync,
                Some(fmt) if self.offset + fmt.length > self.data.len() => Step::Eof,
                Some(fmt) => {
                    let body = &self.data[self.offset + 3..self.offset + fmt.length];
                    match fmt.decode_body(body) {
                        Some(fields) => Step::Message(
                            LogMessage {
                                msg_type: fmt.name.clone(),
                                fields,
                            },
                            fmt.length,
                        ),
                        None => Step::Resync,
                    }
                }
            };

            match step {
                Step::Eof => {
                    self.offset = self.data.len();
                    return None;
                }
                Step::Resync => {
                    self.offset += 1;
                    self.skipped += 1;
                }
                Step::Message(msg, length) => {
                    self.offset += length;
                    self.decoded += 1;
                    if msg.msg_type == "FMT" {
                        self.register_format(&msg);
                    }
                    return Some(msg);
                }
            }
        }
    }

    /// Messages decoded so far.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// Bytes skipped while resynchronizing.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn seek_header(&mut self) -> Option<()> {
        while self.offset + 3 <= self.data.len() {
            if self.data[self.offset] == HEAD1 && self.data[self.offset + 1] == HEAD2 {
                return Some(());
            }
            self.offset += 1;
        }
        None
    }

    fn register_format(&mut self, msg: &LogMessage) {
        let Some(FieldValue::Unsigned(type_id)) = msg.field("Type") else {
            return;
        };
        let Some(FieldValue::Unsigned(length)) = msg.field("Length") else {
            return;
        };
        let (Some(FieldValue::Bytes(name)), Some(FieldValue::Bytes(chars)), Some(FieldValue::Bytes(columns))) =
            (msg.field("Name"), msg.field("Format"), msg.field("Columns"))
        else {
            return;
        };

        let name = util::nul_trimmed_lossy(name);
        let chars = util::nul_trimmed_lossy(chars);
        let columns = util::nul_trimmed_lossy(columns);

        match MessageFormat::from_definition(&name, *length as usize, &chars, &columns) {
            Some(fmt) => {
                self.formats.insert(*type_id as u8, fmt);
            }
            None => {
                tracing::debug!(%name, "dropping undecodable FMT definition");
            }
        }
    }
}
