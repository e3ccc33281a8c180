//! Error types for wiremap.

use thiserror::Error;

/// Main error type for all encode, decode and framing operations.
#[derive(Debug, Error)]
pub enum WiremapError {
    /// I/O error on the underlying connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value payload exceeds the 16-bit length field at encode time.
    ///
    /// Nothing is written: the encoder discards its buffer rather than
    /// emitting a stream a decoder could mistake for a complete message.
    #[error("payload of {len} bytes exceeds the {max}-byte limit", max = u16::MAX)]
    PayloadTooLarge {
        /// Byte length of the offending payload.
        len: usize,
    },

    /// A dynamic input value has no counterpart in the supported variant set.
    ///
    /// Only reachable at construction boundaries (e.g. the JSON bridge);
    /// [`Value`](crate::Value) itself is closed.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A typed accessor was asked to view a value as the wrong variant.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The variant the accessor expected.
        expected: &'static str,
        /// The variant actually present.
        actual: &'static str,
    },

    /// End of input in the middle of a TLV header or payload.
    #[error("truncated message: needed {needed} bytes, {available} available")]
    TruncatedMessage {
        /// Bytes the decoder needed to continue.
        needed: usize,
        /// Bytes remaining in the declared region.
        available: usize,
    },

    /// The connection ended mid-frame, after a valid length header.
    ///
    /// Distinct from clean end-of-stream: a header declared `expected` payload
    /// bytes but only `read` arrived before the connection closed.
    #[error("truncated frame: expected {expected} payload bytes, got {read}")]
    TruncatedFrame {
        /// Payload length declared by the frame header.
        expected: usize,
        /// Payload bytes actually received.
        read: usize,
    },

    /// A fixed-width scalar payload has the wrong byte count.
    #[error("malformed {kind} value: expected {expected} payload bytes, got {actual}")]
    MalformedValue {
        /// Name of the scalar kind being decoded.
        kind: &'static str,
        /// Required payload length.
        expected: usize,
        /// Declared payload length.
        actual: usize,
    },

    /// A map key's type tag is not the string tag.
    #[error("protocol violation: expected string key, got type tag 0x{tag:02x}")]
    ProtocolViolation {
        /// The offending tag byte.
        tag: u8,
    },

    /// A value's type tag is outside the defined set.
    #[error("unknown type tag 0x{0:02x}")]
    UnknownTypeTag(u8),

    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A frame header declared a payload larger than the configured limit.
    #[error("frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared payload length.
        len: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The pipeline's peer task went away.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using WiremapError.
pub type Result<T> = std::result::Result<T, WiremapError>;
