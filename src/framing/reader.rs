//! Per-connection frame read loop.
//!
//! [`FrameReader`] owns the read half of a connection and yields complete
//! frames in arrival order. It never interprets the payload; interpretation
//! belongs strictly downstream in the decode stage.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, WiremapError};

use super::frame::{Frame, DEFAULT_MAX_FRAME_LEN};
use super::frame_buffer::FrameBuffer;

/// Read buffer size for each stream read.
const READ_BUF_SIZE: usize = 8 * 1024;

/// Extracts length-delimited frames from a continuous byte stream.
///
/// # Example
///
/// ```no_run
/// # async fn example(stream: tokio::net::TcpStream) -> wiremap::Result<()> {
/// use wiremap::framing::FrameReader;
///
/// let mut reader = FrameReader::new(stream);
/// while let Some(frame) = reader.next_frame().await? {
///     println!("frame {} with {} bytes", frame.seq, frame.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: FrameBuffer,
    read_buf: Vec<u8>,
    /// Frames extracted but not yet handed out.
    pending: VecDeque<Frame>,
    /// Set once the stream has ended or errored; further calls return None.
    done: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a frame reader with the default frame size limit.
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_len(reader, DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a frame reader with a custom frame size limit.
    pub fn with_max_frame_len(reader: R, max_frame_len: u32) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::with_max_frame_len(max_frame_len),
            read_buf: vec![0u8; READ_BUF_SIZE],
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Read the next complete frame off the connection.
    ///
    /// Returns `Ok(None)` on clean end-of-stream: the connection closed
    /// between frames, or inside a not-yet-complete 4-byte header. Closure
    /// after a valid header but before the declared payload arrived is data
    /// loss and fails with [`WiremapError::TruncatedFrame`].
    ///
    /// Frames extracted before a framing error are delivered first; the
    /// error itself is returned exactly once, after which the reader is
    /// terminal and further calls return `Ok(None)`.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            if self.done {
                return Ok(None);
            }

            let n = self.reader.read(&mut self.read_buf).await?;
            if n == 0 {
                self.done = true;
                // An error stalled behind frames already handed out
                // surfaces now, before the stream is declared over.
                self.buffer.push(&[])?;
                if let Some((expected, read)) = self.buffer.pending_payload() {
                    return Err(WiremapError::TruncatedFrame { expected, read });
                }
                return Ok(None);
            }

            match self.buffer.push(&self.read_buf[..n]) {
                Ok(frames) => self.pending.extend(frames),
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    /// Sequence id the next extracted frame will receive.
    pub fn next_seq(&self) -> u64 {
        self.buffer.next_seq()
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
