//! Frame writer for the sending side of a connection.
//!
//! Prefixes each message payload with the 4-byte big-endian length header and
//! writes both with a single vectored write where possible, falling back to
//! `write_all` on partial writes.

use std::collections::HashMap;
use std::io::IoSlice;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec;
use crate::error::{Result, WiremapError};
use crate::value::Value;

use super::frame::{encode_frame_header, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_SIZE};

/// Writes length-prefixed frames to a byte stream.
///
/// # Example
///
/// ```no_run
/// # async fn example(stream: tokio::net::TcpStream) -> wiremap::Result<()> {
/// use std::collections::HashMap;
/// use wiremap::framing::FrameWriter;
/// use wiremap::Value;
///
/// let mut writer = FrameWriter::new(stream);
///
/// let mut map = HashMap::new();
/// map.insert("ping".to_owned(), Value::Bool(true));
/// writer.write_map(&map).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    max_frame_len: u32,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Create a frame writer with the default frame size limit.
    pub fn new(writer: W) -> Self {
        Self::with_max_frame_len(writer, DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a frame writer with a custom frame size limit.
    pub fn with_max_frame_len(writer: W, max_frame_len: u32) -> Self {
        Self {
            writer,
            max_frame_len,
        }
    }

    /// Write one payload as a length-prefixed frame and flush.
    ///
    /// # Errors
    ///
    /// Returns [`WiremapError::FrameTooLarge`] if the payload exceeds the
    /// configured limit, before anything is written.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() as u64 > u64::from(self.max_frame_len) {
            return Err(WiremapError::FrameTooLarge {
                len: payload.len() as u32,
                max: self.max_frame_len,
            });
        }

        let header = encode_frame_header(payload.len() as u32);

        // Fast path: header and payload in one vectored syscall.
        let total = FRAME_HEADER_SIZE + payload.len();
        let written = self
            .writer
            .write_vectored(&[IoSlice::new(&header), IoSlice::new(payload)])
            .await?;

        if written < total {
            // Partial write: finish byte-exactly with write_all.
            if written < FRAME_HEADER_SIZE {
                self.writer.write_all(&header[written..]).await?;
                self.writer.write_all(payload).await?;
            } else {
                self.writer
                    .write_all(&payload[written - FRAME_HEADER_SIZE..])
                    .await?;
            }
        }

        self.writer.flush().await?;
        Ok(())
    }

    /// Encode a value map and write it as one frame.
    pub async fn write_map(&mut self, map: &HashMap<String, Value>) -> Result<()> {
        let payload = codec::encode(map)?;
        self.write_frame(&payload).await
    }

    /// Flush and shut down the underlying stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Consume the writer and return the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
