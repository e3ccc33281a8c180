//! TLV encoder.
//!
//! Depth-first traversal of a value tree into the wire layout described in
//! the [module docs](crate::codec). Nested maps and lists are encoded into an
//! independent sub-encoder first, so the payload length is always known
//! before the type+length header is written and no backpatching is needed.
//!
//! A failed encode never exposes partial output: the buffer is owned by the
//! encoder and only returned on full success.

use std::collections::HashMap;

use crate::error::{Result, WiremapError};
use crate::value::Value;

use super::{
    MAX_PAYLOAD_LEN, TAG_BOOL, TAG_FLOAT64, TAG_INT64, TAG_MAP, TAG_SLICE, TAG_STRING,
};

/// Encode a value tree into its TLV byte layout.
///
/// The output carries no outer length header; that is added by the transport
/// framing layer ([`crate::framing::FrameWriter`]).
///
/// # Errors
///
/// Returns [`WiremapError::PayloadTooLarge`] if any string, key or composite
/// sub-buffer exceeds 65 535 bytes.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use wiremap::{codec, Value};
///
/// let mut map = HashMap::new();
/// map.insert("ok".to_owned(), Value::Bool(true));
///
/// let bytes = codec::encode(&map).unwrap();
/// // key TLV (3 + 2 bytes) + value TLV (3 + 1 bytes)
/// assert_eq!(bytes.len(), 9);
/// ```
pub fn encode(map: &HashMap<String, Value>) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode_map(map)?;
    Ok(encoder.into_bytes())
}

/// Incremental TLV encoder backing [`encode`].
///
/// Useful directly when several maps are encoded into one buffer, or when a
/// list payload is built without an enclosing map.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append every entry of `map` as a `(key TLV, value TLV)` pair.
    pub fn encode_map(&mut self, map: &HashMap<String, Value>) -> Result<()> {
        for (key, val) in map {
            self.write_entry(key, val)?;
        }
        Ok(())
    }

    /// Consume the encoder and return the finished buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn write_entry(&mut self, key: &str, val: &Value) -> Result<()> {
        self.write_primitive(TAG_STRING, key.as_bytes())?;
        self.write_value(val)
    }

    /// Write one complete TLV record: tag, 2-byte BE length, payload.
    fn write_primitive(&mut self, tag: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(WiremapError::PayloadTooLarge { len: payload.len() });
        }
        self.buf.push(tag);
        self.buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(payload);
        Ok(())
    }

    /// Dispatch over the closed variant set and write one value TLV.
    pub fn write_value(&mut self, val: &Value) -> Result<()> {
        match val {
            Value::Str(s) => self.write_primitive(TAG_STRING, s.as_bytes()),
            Value::Int64(i) => self.write_primitive(TAG_INT64, &i.to_be_bytes()),
            Value::Float64(f) => self.write_primitive(TAG_FLOAT64, &f.to_be_bytes()),
            Value::Bool(b) => self.write_primitive(TAG_BOOL, &[u8::from(*b)]),
            Value::Map(m) => {
                // Full recursive encode into a sub-buffer, then wrap it as a
                // single map TLV in the parent.
                let mut sub = Encoder::new();
                sub.encode_map(m)?;
                self.write_primitive(TAG_MAP, &sub.buf)
            }
            Value::List(items) => {
                let mut sub = Encoder::new();
                for item in items {
                    sub.write_value(item)?;
                }
                self.write_primitive(TAG_SLICE, &sub.buf)
            }
        }
    }
}
