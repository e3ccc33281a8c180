//! TLV decoder.
//!
//! Decodes the wire layout described in the [module docs](crate::codec) back
//! into a value tree. Two entry points:
//!
//! - [`decode`] consumes a fixed byte buffer until it is exhausted. End of
//!   input exactly at an entry boundary terminates the map; end of input
//!   inside a TLV header or payload is a [`WiremapError::TruncatedMessage`].
//! - [`decode_stream`] reads one 4-byte length header off a connection and
//!   decodes exactly that many payload bytes.
//!
//! All decode errors abort the enclosing message; corruption anywhere
//! invalidates the whole message, there is no best-effort skip.

use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, WiremapError};
use crate::framing::FRAME_HEADER_SIZE;
use crate::value::Value;

use super::{
    TAG_BOOL, TAG_FLOAT64, TAG_INT64, TAG_MAP, TAG_SLICE, TAG_STRING, TLV_HEADER_SIZE,
};

/// Decode a bare TLV buffer into a value map.
///
/// # Errors
///
/// See the [error taxonomy](crate::error::WiremapError): truncation, unknown
/// or misplaced type tags, and malformed fixed-width payloads all fail, and
/// the error covers the whole message.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use wiremap::{codec, Value};
///
/// let mut map = HashMap::new();
/// map.insert("x".to_owned(), Value::from("y"));
///
/// let bytes = codec::encode(&map).unwrap();
/// assert_eq!(codec::decode(&bytes).unwrap(), map);
/// ```
pub fn decode(buf: &[u8]) -> Result<HashMap<String, Value>> {
    Decoder::new(buf).decode_map()
}

/// Decode one length-prefixed message from a connection-backed stream.
///
/// Reads the 4-byte big-endian length header, then exactly that many payload
/// bytes, then decodes the payload as a top-level map.
///
/// # Errors
///
/// - [`WiremapError::ConnectionClosed`] if the stream ends cleanly before the
///   first header byte.
/// - [`WiremapError::TruncatedFrame`] if the stream ends inside the header or
///   the declared payload region.
/// - Any [`decode`] error for the payload itself.
pub async fn decode_stream<R>(reader: &mut R) -> Result<HashMap<String, Value>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    let n = read_full(reader, &mut header).await?;
    if n == 0 {
        return Err(WiremapError::ConnectionClosed);
    }
    if n < FRAME_HEADER_SIZE {
        return Err(WiremapError::TruncatedFrame {
            expected: FRAME_HEADER_SIZE,
            read: n,
        });
    }

    let len = u32::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; len];
    let n = read_full(reader, &mut payload).await?;
    if n < len {
        return Err(WiremapError::TruncatedFrame {
            expected: len,
            read: n,
        });
    }

    decode(&payload)
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Cursor-based TLV decoder scoped to one declared region.
///
/// Nested maps and lists recurse into a fresh `Decoder` scoped to exactly
/// their declared payload bytes, so a nested value can never read past its
/// own region.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over a fixed buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Decode `(key, value)` pairs until the region is exhausted.
    pub fn decode_map(&mut self) -> Result<HashMap<String, Value>> {
        let mut map = HashMap::new();
        while self.remaining() > 0 {
            self.require_header()?;
            let key = self.read_key()?;
            let val = self.read_value()?;
            map.insert(key, val);
        }
        Ok(map)
    }

    /// Decode value TLVs until the region is exhausted (list payload form).
    pub fn decode_list(&mut self) -> Result<Vec<Value>> {
        let mut list = Vec::new();
        while self.remaining() > 0 {
            self.require_header()?;
            list.push(self.read_value()?);
        }
        Ok(list)
    }

    /// A trailing fragment shorter than one TLV header is truncation, no
    /// matter what its bytes look like; the tag is only interpreted once a
    /// whole header is present.
    fn require_header(&self) -> Result<()> {
        if self.remaining() < TLV_HEADER_SIZE {
            return Err(WiremapError::TruncatedMessage {
                needed: TLV_HEADER_SIZE,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consume exactly `n` bytes, or fail with `TruncatedMessage`.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(WiremapError::TruncatedMessage {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_tag(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_len(&mut self) -> Result<usize> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
    }

    /// Read one key TLV; the tag must be the string tag.
    fn read_key(&mut self) -> Result<String> {
        let tag = self.read_tag()?;
        if tag != TAG_STRING {
            return Err(WiremapError::ProtocolViolation { tag });
        }
        let len = self.read_len()?;
        let payload = self.take(len)?;
        Ok(std::str::from_utf8(payload)?.to_owned())
    }

    /// Read one value TLV, dispatching on the type tag.
    fn read_value(&mut self) -> Result<Value> {
        let tag = self.read_tag()?;
        let len = self.read_len()?;
        let payload = self.take(len)?;

        match tag {
            TAG_STRING => Ok(Value::Str(std::str::from_utf8(payload)?.to_owned())),
            TAG_INT64 => Ok(Value::Int64(i64::from_be_bytes(fixed8("int64", payload)?))),
            TAG_FLOAT64 => Ok(Value::Float64(f64::from_be_bytes(fixed8(
                "float64", payload,
            )?))),
            TAG_BOOL => {
                if payload.len() != 1 {
                    return Err(WiremapError::MalformedValue {
                        kind: "bool",
                        expected: 1,
                        actual: payload.len(),
                    });
                }
                Ok(Value::Bool(payload[0] == 0x01))
            }
            TAG_MAP => Ok(Value::Map(Decoder::new(payload).decode_map()?)),
            TAG_SLICE => Ok(Value::List(Decoder::new(payload).decode_list()?)),
            other => Err(WiremapError::UnknownTypeTag(other)),
        }
    }
}

/// Check an 8-byte fixed-width payload and copy it out.
fn fixed8(kind: &'static str, payload: &[u8]) -> Result<[u8; 8]> {
    if payload.len() != 8 {
        return Err(WiremapError::MalformedValue {
            kind,
            expected: 8,
            actual: payload.len(),
        });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(payload);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::framing::build_frame;

    fn sample_map() -> HashMap<String, Value> {
        let mut inner = HashMap::new();
        inner.insert("nested".to_owned(), Value::Int64(7));

        let mut map = HashMap::new();
        map.insert("name".to_owned(), Value::from("wiremap"));
        map.insert("count".to_owned(), Value::Int64(-42));
        map.insert("ratio".to_owned(), Value::Float64(3.25));
        map.insert("ok".to_owned(), Value::Bool(true));
        map.insert("sub".to_owned(), Value::Map(inner));
        map.insert(
            "items".to_owned(),
            Value::List(vec![Value::Int64(1), Value::from("x"), Value::Bool(false)]),
        );
        map
    }

    #[test]
    fn test_roundtrip() {
        let map = sample_map();
        let bytes = encode(&map).unwrap();
        assert_eq!(decode(&bytes).unwrap(), map);
    }

    #[test]
    fn test_empty_buffer_is_empty_map() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_nested_fidelity() {
        // {"a": {"b": [1, "x", true]}}
        let mut inner = HashMap::new();
        inner.insert(
            "b".to_owned(),
            Value::List(vec![Value::Int64(1), Value::from("x"), Value::Bool(true)]),
        );
        let mut map = HashMap::new();
        map.insert("a".to_owned(), Value::Map(inner));

        let decoded = decode(&encode(&map).unwrap()).unwrap();
        let list = decoded["a"].as_map().unwrap()["b"].as_list().unwrap();
        assert_eq!(list[0].as_i64().unwrap(), 1);
        assert_eq!(list[1].as_str().unwrap(), "x");
        assert!(list[2].as_bool().unwrap());
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_truncation_at_every_prefix_is_error_not_panic() {
        let bytes = encode(&sample_map()).unwrap();

        for cut in 1..bytes.len() {
            let result = decode(&bytes[..cut]);
            // Every strict prefix either truncates mid-entry or, by chance,
            // still ends mid-structure somewhere; none may panic or succeed
            // with the full tree.
            if let Ok(map) = result {
                assert_ne!(map, sample_map());
            }
        }
    }

    #[test]
    fn test_truncated_inside_tlv_header() {
        let mut map = HashMap::new();
        map.insert("key".to_owned(), Value::Int64(1));
        let bytes = encode(&map).unwrap();

        // Cut inside the value TLV's 2-byte length field.
        let cut = 3 + 3 + 2; // key TLV + value tag + 1 length byte
        let err = decode(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, WiremapError::TruncatedMessage { .. }));
    }

    #[test]
    fn test_truncated_inside_payload() {
        let mut map = HashMap::new();
        map.insert("key".to_owned(), Value::from("hello"));
        let bytes = encode(&map).unwrap();

        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::TruncatedMessage { needed: 5, available: 4 }
        ));
    }

    #[test]
    fn test_trailing_partial_entry_is_truncated() {
        let mut map = HashMap::new();
        map.insert("k".to_owned(), Value::Bool(true));
        let mut bytes = encode(&map).unwrap();

        // A single stray tag byte after a complete entry.
        bytes.push(TAG_STRING);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, WiremapError::TruncatedMessage { .. }));
    }

    #[test]
    fn test_trailing_fragment_with_nonstring_tag_is_truncated() {
        let mut map = HashMap::new();
        map.insert("k".to_owned(), Value::Bool(true));
        let mut bytes = encode(&map).unwrap();

        // A lone non-string tag byte: too short to be a header at all, so
        // it must read as truncation, not as a key-type violation.
        bytes.push(TAG_INT64);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::TruncatedMessage { needed: 3, available: 1 }
        ));
    }

    #[test]
    fn test_trailing_fragment_in_list_is_truncated() {
        // Key TLV "k", then a list whose payload ends with 2 stray bytes.
        let mut bytes = vec![TAG_STRING, 0x00, 0x01, b'k'];
        bytes.extend_from_slice(&[TAG_SLICE, 0x00, 0x02, TAG_INT64, 0x00]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::TruncatedMessage { needed: 3, available: 2 }
        ));
    }

    #[test]
    fn test_unknown_type_tag_carries_byte() {
        // Valid key TLV, then a value with tag 0xFF.
        let mut bytes = vec![TAG_STRING, 0x00, 0x01, b'k'];
        bytes.extend_from_slice(&[0xFF, 0x00, 0x00]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, WiremapError::UnknownTypeTag(0xFF)));
    }

    #[test]
    fn test_non_string_key_is_protocol_violation() {
        // Key TLV with the int64 tag.
        let mut bytes = vec![TAG_INT64, 0x00, 0x08];
        bytes.extend_from_slice(&1i64.to_be_bytes());
        bytes.extend_from_slice(&[TAG_BOOL, 0x00, 0x01, 0x01]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, WiremapError::ProtocolViolation { tag: TAG_INT64 }));
    }

    #[test]
    fn test_malformed_int64_length() {
        // int64 with a 4-byte payload.
        let mut bytes = vec![TAG_STRING, 0x00, 0x01, b'k'];
        bytes.extend_from_slice(&[TAG_INT64, 0x00, 0x04, 0, 0, 0, 1]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::MalformedValue { kind: "int64", expected: 8, actual: 4 }
        ));
    }

    #[test]
    fn test_malformed_bool_length() {
        let mut bytes = vec![TAG_STRING, 0x00, 0x01, b'k'];
        bytes.extend_from_slice(&[TAG_BOOL, 0x00, 0x02, 0x01, 0x00]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::MalformedValue { kind: "bool", expected: 1, actual: 2 }
        ));
    }

    #[test]
    fn test_invalid_utf8_in_string() {
        let bytes = vec![TAG_STRING, 0x00, 0x02, 0xC3, 0x28];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, WiremapError::InvalidUtf8(_)));
    }

    #[test]
    fn test_nested_error_aborts_whole_message() {
        // Outer map: good entry, then a map whose payload holds a bad tag.
        let mut bytes = encode(&{
            let mut m = HashMap::new();
            m.insert("good".to_owned(), Value::Bool(true));
            m
        })
        .unwrap();
        bytes.extend_from_slice(&[TAG_STRING, 0x00, 0x01, b'm']);
        bytes.extend_from_slice(&[TAG_MAP, 0x00, 0x03, 0xFE, 0x00, 0x00]);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, WiremapError::ProtocolViolation { tag: 0xFE }));
    }

    #[tokio::test]
    async fn test_decode_stream_roundtrip() {
        let map = sample_map();
        let framed = build_frame(&encode(&map).unwrap());

        let mut cursor = std::io::Cursor::new(framed);
        let decoded = decode_stream(&mut cursor).await.unwrap();
        assert_eq!(decoded, map);
    }

    #[tokio::test]
    async fn test_decode_stream_clean_close() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let err = decode_stream(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WiremapError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_decode_stream_truncated_payload() {
        let map = sample_map();
        let mut framed = build_frame(&encode(&map).unwrap());
        framed.truncate(framed.len() - 3);

        let mut cursor = std::io::Cursor::new(framed);
        let err = decode_stream(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WiremapError::TruncatedFrame { .. }));
    }

    #[tokio::test]
    async fn test_decode_stream_partial_header() {
        let mut cursor = std::io::Cursor::new(vec![0x00, 0x00]);
        let err = decode_stream(&mut cursor).await.unwrap_err();
        assert!(matches!(
            err,
            WiremapError::TruncatedFrame { expected: 4, read: 2 }
        ));
    }
}
