//! Frame struct and transport header helpers.
//!
//! A frame is one complete length-delimited message extracted from a
//! continuous byte stream, tagged with the sequence id the reader assigned at
//! extraction time. Uses `bytes::Bytes` for the payload so hand-off through
//! the pipeline queue transfers ownership without copying.

use bytes::Bytes;

/// Size of the transport length header in bytes (big-endian `u32`).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Default maximum frame payload size (16 MB).
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// One complete message extracted from a stream.
///
/// A frame exists only transiently between extraction and consumption by the
/// decode stage, and is owned exclusively by whichever stage currently holds
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sequence id, strictly increasing and contiguous per connection,
    /// starting at 0. Assigned by the frame reader; never reused.
    pub seq: u64,
    /// Raw message payload, not yet decoded.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame from a sequence id and payload.
    pub fn new(seq: u64, payload: Bytes) -> Self {
        Self { seq, payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check whether the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Encode the 4-byte transport header for a payload of `len` bytes.
#[inline]
pub fn encode_frame_header(len: u32) -> [u8; FRAME_HEADER_SIZE] {
    len.to_be_bytes()
}

/// Build a complete transport frame (header + payload) as one byte vector.
///
/// # Example
///
/// ```
/// use wiremap::framing::{build_frame, FRAME_HEADER_SIZE};
///
/// let bytes = build_frame(b"hello");
/// assert_eq!(bytes.len(), FRAME_HEADER_SIZE + 5);
/// assert_eq!(&bytes[..FRAME_HEADER_SIZE], &[0, 0, 0, 5]);
/// ```
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&encode_frame_header(payload.len() as u32));
    buf.extend_from_slice(payload);
    buf
}
