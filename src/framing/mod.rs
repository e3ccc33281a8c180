//! Stream framing - length-delimited message extraction and emission.
//!
//! A single connection carries a sequence of independent top-level messages,
//! each prefixed with a 4-byte big-endian length header:
//!
//! ```text
//! ┌────────────┬────────────────┐
//! │ length     │ payload        │
//! │ 4 bytes BE │ length bytes   │
//! └────────────┴────────────────┘
//! ```
//!
//! The header is a transport concern only; it is not part of the TLV value
//! encoding ([`crate::codec`]). This module provides:
//!
//! - [`Frame`] - one extracted message plus its sequence id
//! - [`FrameBuffer`] - push-based state machine over partial reads
//! - [`FrameReader`] - async read loop over a connection
//! - [`FrameWriter`] - length-prefixed write side

mod frame;
mod frame_buffer;
mod reader;
mod writer;

pub use frame::{
    build_frame, encode_frame_header, Frame, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_SIZE,
};
pub use frame_buffer::FrameBuffer;
pub use reader::FrameReader;
pub use writer::FrameWriter;
