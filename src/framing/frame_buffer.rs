//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management and a two-state
//! machine for fragmented frames:
//! - `WaitingForHeader`: need at least 4 bytes
//! - `WaitingForPayload`: header parsed, need N more payload bytes
//!
//! Sequence ids are assigned here, at extraction time, so they are contiguous
//! per buffer regardless of how the incoming bytes were chunked.

use bytes::{Bytes, BytesMut};

use crate::error::{Result, WiremapError};

use super::frame::{Frame, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_SIZE};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for a complete 4-byte length header.
    WaitingForHeader,
    /// Header parsed, waiting for the declared payload bytes.
    WaitingForPayload { len: usize },
}

/// Buffer that turns a chunked byte stream into complete [`Frame`]s.
///
/// All data is stored in a single `BytesMut`; completed payloads are split
/// off and frozen without copying.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes from stream reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Next sequence id to assign.
    next_seq: u64,
    /// Maximum allowed payload length.
    max_frame_len: u32,
}

impl FrameBuffer {
    /// Create a frame buffer with the default 16 MB frame limit.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a frame buffer with a custom frame size limit.
    pub fn with_max_frame_len(max_frame_len: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForHeader,
            next_seq: 0,
            max_frame_len,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is buffered internally for the next push; the returned
    /// vector may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`WiremapError::FrameTooLarge`] if a header declares a payload
    /// above the configured limit. No bytes of such a frame are consumed, and
    /// frames extracted earlier in the same push are delivered first: the
    /// error is only returned once no complete frame precedes it, so it
    /// resurfaces on the next call.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        loop {
            match self.try_extract_one() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => return Ok(frames),
                Err(e) if frames.is_empty() => return Err(e),
                // The offending header is still buffered untouched; the
                // caller sees the completed frames now and this same error
                // on the next push.
                Err(_) => return Ok(frames),
            }
        }
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::WaitingForHeader => {
                if self.buffer.len() < FRAME_HEADER_SIZE {
                    return Ok(None);
                }

                let mut header = [0u8; FRAME_HEADER_SIZE];
                header.copy_from_slice(&self.buffer[..FRAME_HEADER_SIZE]);
                let len = u32::from_be_bytes(header);

                if len > self.max_frame_len {
                    return Err(WiremapError::FrameTooLarge {
                        len,
                        max: self.max_frame_len,
                    });
                }

                let _ = self.buffer.split_to(FRAME_HEADER_SIZE);

                if len == 0 {
                    return Ok(Some(self.emit(Bytes::new())));
                }

                self.state = State::WaitingForPayload { len: len as usize };
                self.try_extract_one()
            }

            State::WaitingForPayload { len } => {
                if self.buffer.len() < len {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(len).freeze();
                self.state = State::WaitingForHeader;
                Ok(Some(self.emit(payload)))
            }
        }
    }

    fn emit(&mut self, payload: Bytes) -> Frame {
        let seq = self.next_seq;
        self.next_seq += 1;
        Frame::new(seq, payload)
    }

    /// Bytes still missing from an in-flight frame, as `(expected, read)`.
    ///
    /// `None` when the buffer is between frames; stray header bytes do not
    /// count, since a connection is allowed to close mid-header.
    pub fn pending_payload(&self) -> Option<(usize, usize)> {
        match self.state {
            State::WaitingForHeader => None,
            State::WaitingForPayload { len } => Some((len, self.buffer.len())),
        }
    }

    /// Number of buffered, not-yet-framed bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer holds no pending bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Sequence id that the next extracted frame will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::build_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&build_frame(b"hello")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].seq, 0);
        assert_eq!(frames[0].payload(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sequence_ids_contiguous() {
        let mut buffer = FrameBuffer::new();

        let mut combined = build_frame(b"first");
        combined.extend(build_frame(b"second"));
        combined.extend(build_frame(b"third"));

        let frames = buffer.push(&combined).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].seq, 0);
        assert_eq!(frames[1].seq, 1);
        assert_eq!(frames[2].seq, 2);

        // Ids keep counting across pushes, never reused.
        let frames = buffer.push(&build_frame(b"fourth")).unwrap();
        assert_eq!(frames[0].seq, 3);
        assert_eq!(buffer.next_seq(), 4);
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"test");

        let frames = buffer.push(&bytes[..2]).unwrap();
        assert!(frames.is_empty());
        assert!(buffer.pending_payload().is_none());

        let frames = buffer.push(&bytes[2..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"test");
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = b"a longer payload that arrives in pieces";
        let bytes = build_frame(payload);

        let frames = buffer.push(&bytes[..FRAME_HEADER_SIZE + 10]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.pending_payload(), Some((payload.len(), 10)));

        let frames = buffer.push(&bytes[FRAME_HEADER_SIZE + 10..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &payload[..]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = build_frame(b"hi");

        let mut all = Vec::new();
        for byte in &bytes {
            all.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].seq, 0);
        assert_eq!(all[0].payload(), b"hi");
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&build_frame(b"")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_frame_too_large() {
        let mut buffer = FrameBuffer::with_max_frame_len(8);
        let err = buffer.push(&build_frame(&[0u8; 9])).unwrap_err();

        assert!(matches!(
            err,
            WiremapError::FrameTooLarge { len: 9, max: 8 }
        ));
    }

    #[test]
    fn test_frames_before_oversized_header_still_delivered() {
        let mut buffer = FrameBuffer::with_max_frame_len(8);

        let mut data = build_frame(b"ok");
        data.extend(build_frame(&[0u8; 9]));

        // The valid frame comes out; the error waits for the next call.
        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].seq, 0);
        assert_eq!(frames[0].payload(), b"ok");
        assert_eq!(buffer.next_seq(), 1);

        let err = buffer.push(&[]).unwrap_err();
        assert!(matches!(
            err,
            WiremapError::FrameTooLarge { len: 9, max: 8 }
        ));
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();
        let first = build_frame(b"first");
        let second = build_frame(b"second");

        let mut data = first.clone();
        data.extend_from_slice(&second[..3]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"first");

        let frames = buffer.push(&second[3..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].seq, 1);
        assert_eq!(frames[0].payload(), b"second");
    }
}
