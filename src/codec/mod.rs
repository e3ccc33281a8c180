//! Codec module - TLV encoding and decoding of value trees.
//!
//! Every scalar or composite value is serialized as a self-describing
//! (type, length, payload) record:
//!
//! ```text
//! ┌──────────┬───────────┬────────────────┐
//! │ type tag │ length    │ payload        │
//! │ 1 byte   │ 2 bytes BE│ length bytes   │
//! └──────────┴───────────┴────────────────┘
//! ```
//!
//! A map payload is a concatenation of `(key TLV, value TLV)` pairs with no
//! pair-count prefix; a list payload is a concatenation of value TLVs. Both
//! are consumed until the declared region is exhausted. The 4-byte transport
//! length header is *not* part of this encoding; it belongs to the framing
//! layer ([`crate::framing`]).
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use wiremap::{codec, Value};
//!
//! let mut map = HashMap::new();
//! map.insert("answer".to_owned(), Value::Int64(42));
//!
//! let bytes = codec::encode(&map).unwrap();
//! let decoded = codec::decode(&bytes).unwrap();
//! assert_eq!(decoded, map);
//! ```

mod decoder;
mod encoder;

pub use decoder::{decode, decode_stream, Decoder};
pub use encoder::{encode, Encoder};

/// Type tag for a UTF-8 string payload.
pub const TAG_STRING: u8 = 0x01;
/// Type tag for a signed 64-bit integer (8-byte BE payload).
pub const TAG_INT64: u8 = 0x02;
/// Type tag for an IEEE-754 binary64 float (8-byte BE payload).
pub const TAG_FLOAT64: u8 = 0x03;
/// Type tag for a boolean (1-byte payload, 0x00/0x01).
pub const TAG_BOOL: u8 = 0x04;
/// Type tag for a nested map payload.
pub const TAG_MAP: u8 = 0x05;
/// Type tag for a nested list payload.
pub const TAG_SLICE: u8 = 0x06;

/// Size of a TLV header in bytes (1 tag byte + 2 length bytes).
pub const TLV_HEADER_SIZE: usize = 3;

/// Maximum payload length of a single TLV record (16-bit length field).
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;
