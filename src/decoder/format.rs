// src/decoder/format.rs — DataFlash message formats and field decoding

/// Field type codes from the ArduPilot log format catalog.
///
/// One code per character of a FMT record's `Format` column. The scaled
/// codes (`c`, `C`, `e`, `E`) carry fixed-point values stored ×100;
/// `L` is a latitude/longitude stored as degrees ×1e7 and kept raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Char4,
    Char16,
    Char64,
    CentiInt16,
    CentiUInt16,
    CentiInt32,
    CentiUInt32,
    LatLon,
    FlightMode,
    Int16Array,
}

impl FieldType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'b' => Self::Int8,
            b'B' => Self::UInt8,
            b'h' => Self::Int16,
            b'H' => Self::UInt16,
            b'i' => Self::Int32,
            b'I' => Self::UInt32,
            b'q' => Self::Int64,
            b'Q' => Self::UInt64,
            b'f' => Self::Float,
            b'd' => Self::Double,
            b'n' => Self::Char4,
            b'N' => Self::Char16,
            b'Z' => Self::Char64,
            b'c' => Self::CentiInt16,
            b'C' => Self::CentiUInt16,
            b'e' => Self::CentiInt32,
            b'E' => Self::CentiUInt32,
            b'L' => Self::LatLon,
            b'M' => Self::FlightMode,
            b'a' => Self::Int16Array,
            _ => return None,
        })
    }

    /// Encoded width in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::FlightMode => 1,
            Self::Int16 | Self::UInt16 | Self::CentiInt16 | Self::CentiUInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::CentiInt32 | Self::CentiUInt32 => 4,
            Self::Int64 | Self::UInt64 => 8,
            Self::Float => 4,
            Self::Double => 8,
            Self::Char4 => 4,
            Self::Char16 => 16,
            Self::Char64 => 64,
            Self::LatLon => 4,
            Self::Int16Array => 64,
        }
    }

    /// Decode one value from the front of `buf` (little-endian, as logged
    /// by the flight controller). `None` when `buf` is too short.
    pub fn decode(self, buf: &[u8]) -> Option<FieldValue> {
        if buf.len() < self.size() {
            return None;
        }
        let value = match self {
            Self::Int8 => FieldValue::Signed(buf[0] as i8 as i64),
            Self::UInt8 | Self::FlightMode => FieldValue::Unsigned(buf[0] as u64),
            Self::Int16 => FieldValue::Signed(i16::from_le_bytes([buf[0], buf[1]]) as i64),
            Self::UInt16 => FieldValue::Unsigned(u16::from_le_bytes([buf[0], buf[1]]) as u64),
            Self::Int32 | Self::LatLon => {
                FieldValue::Signed(i32::from_le_bytes(buf[..4].try_into().ok()?) as i64)
            }
            Self::UInt32 => {
                FieldValue::Unsigned(u32::from_le_bytes(buf[..4].try_into().ok()?) as u64)
            }
            Self::Int64 => FieldValue::Signed(i64::from_le_bytes(buf[..8].try_into().ok()?)),
            Self::UInt64 => FieldValue::Unsigned(u64::from_le_bytes(buf[..8].try_into().ok()?)),
            Self::Float => {
                FieldValue::Float(f32::from_le_bytes(buf[..4].try_into().ok()?) as f64)
            }
            Self::Double => FieldValue::Float(f64::from_le_bytes(buf[..8].try_into().ok()?)),
            Self::CentiInt16 => {
                FieldValue::Float(i16::from_le_bytes([buf[0], buf[1]]) as f64 * 0.01)
            }
            Self::CentiUInt16 => {
                FieldValue::Float(u16::from_le_bytes([buf[0], buf[1]]) as f64 * 0.01)
            }
            Self::CentiInt32 => {
                FieldValue::Float(i32::from_le_bytes(buf[..4].try_into().ok()?) as f64 * 0.01)
            }
            Self::CentiUInt32 => {
                FieldValue::Float(u32::from_le_bytes(buf[..4].try_into().ok()?) as f64 * 0.01)
            }
            Self::Char4 | Self::Char16 | Self::Char64 => {
                FieldValue::Bytes(buf[..self.size()].to_vec())
            }
            Self::Int16Array => {
                let values = buf[..64]
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]) as i64)
                    .collect();
                FieldValue::SignedArray(values)
            }
        };
        Some(value)
    }
}

/// A decoded field value, prior to JSON normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    /// Fixed-width string field, still NUL-padded.
    Bytes(Vec<u8>),
    SignedArray(Vec<i64>),
}

/// Wire layout of one message type, registered from a FMT record.
#[derive(Debug, Clone)]
pub struct MessageFormat {
    pub name: String,
    /// Total message length on the wire, including the 3-byte header.
    pub length: usize,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ftype: FieldType,
}

impl MessageFormat {
    /// Build a format from the pieces of a FMT record.
    ///
    /// Rejects definitions that cannot be decoded: an unknown type code, a
    /// column count that disagrees with the format string, or declared
    /// field widths that do not fit the declared message length.
    pub fn from_definition(
        name: &str,
        length: usize,
        format_chars: &str,
        columns: &str,
    ) -> Option<Self> {
        let names: Vec<&str> = if columns.is_empty() {
            Vec::new()
        } else {
            columns.split(',').collect()
        };
        if names.len() != format_chars.len() {
            return None;
        }

        let mut fields = Vec::with_capacity(names.len());
        let mut body_size = 0usize;
        for (code, column) in format_chars.bytes().zip(names) {
            let ftype = FieldType::from_code(code)?;
            body_size += ftype.size();
            fields.push(FieldDef {
                name: column.to_string(),
                ftype,
            });
        }
        if length < 3 || body_size > length - 3 {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            length,
            fields,
        })
    }

    /// Decode a message body against this format, in catalog field order.
    pub fn decode_body(&self, body: &[u8]) -> Option<Vec<(String, FieldValue)>> {
        let mut out = Vec::with_capacity(self.fields.len());
        let mut offset = 0;
        for field in &self.fields {
            let value = field.ftype.decode(&body[offset.min(body.len())..])?;
            offset += field.ftype.size();
            out.push((field.name.clone(), value));
        }
        Some(out)
    }
}
