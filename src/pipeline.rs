//! Per-connection read/decode pipeline.
//!
//! Wires exactly one [`FrameReader`](crate::framing::FrameReader) to exactly
//! one decode stage through a bounded mpsc channel:
//!
//! ```text
//! connection ─► reader task ─► mpsc::Sender<Frame> ─► decode task ─► results
//! ```
//!
//! The reader task suspends only on the connection read; the decode task
//! suspends only on an empty queue. A frame is handed off by value, never
//! shared, so no locking is needed on its contents. When the queue is full
//! the reader's `send().await` blocks, throttling the network read rate to
//! the decode rate instead of growing memory; frames are never dropped.
//!
//! Multiple connections get independent pipelines; nothing is shared across
//! them.

use std::collections::HashMap;

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec;
use crate::error::Result;
use crate::framing::{Frame, FrameReader, DEFAULT_MAX_FRAME_LEN};
use crate::value::Value;

/// Default capacity of the frame hand-off queue and the results queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Configuration for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity of the bounded frame hand-off queue.
    pub queue_capacity: usize,
    /// Maximum accepted frame payload length.
    pub max_frame_len: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// One decoded message, tagged with the frame's sequence id.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Sequence id assigned by the frame reader at extraction time.
    pub seq: u64,
    /// The decoded top-level map.
    pub map: HashMap<String, Value>,
}

/// A running per-connection pipeline.
///
/// The consumer observes decoded maps (or per-frame errors) one at a time,
/// in the exact order the frames arrived on the connection.
///
/// # Example
///
/// ```no_run
/// # async fn example(stream: tokio::net::TcpStream) {
/// use wiremap::Pipeline;
///
/// let mut pipeline = Pipeline::spawn(stream);
/// while let Some(result) = pipeline.next().await {
///     match result {
///         Ok(msg) => println!("message {}: {} entries", msg.seq, msg.map.len()),
///         Err(e) => eprintln!("bad frame: {e}"),
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    results: mpsc::Receiver<Result<DecodedMessage>>,
    shutdown: Option<oneshot::Sender<()>>,
    reader_task: JoinHandle<()>,
    decode_task: JoinHandle<()>,
}

impl Pipeline {
    /// Spawn a pipeline over a connection with the default configuration.
    pub fn spawn<R>(stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::spawn_with_config(stream, PipelineConfig::default())
    }

    /// Spawn a pipeline over a connection.
    ///
    /// Starts one reader task and one decode task; the connection is owned
    /// exclusively by the reader task from here on.
    pub fn spawn_with_config<R>(stream: R, config: PipelineConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::channel(config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let reader = FrameReader::with_max_frame_len(stream, config.max_frame_len);
        let reader_task = tokio::spawn(read_loop(reader, frame_tx, shutdown_rx));
        let decode_task = tokio::spawn(decode_loop(frame_rx, result_tx));

        Self {
            results: result_rx,
            shutdown: Some(shutdown_tx),
            reader_task,
            decode_task,
        }
    }

    /// Receive the next decoded message (or per-frame error), in order.
    ///
    /// Returns `None` once the connection has ended and all buffered frames
    /// have been drained.
    pub async fn next(&mut self) -> Option<Result<DecodedMessage>> {
        self.results.recv().await
    }

    /// Signal the reader task to stop promptly.
    ///
    /// The hand-off queue closes and the decode task drains remaining
    /// buffered frames before terminating; already-read frames are still
    /// delivered through [`next`](Self::next).
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for both tasks to terminate.
    pub async fn join(mut self) {
        let _ = (&mut self.reader_task).await;
        let _ = (&mut self.decode_task).await;
    }
}

/// Reader task: extract frames and hand them off until EOF, error or
/// shutdown.
async fn read_loop<R>(
    mut reader: FrameReader<R>,
    frame_tx: mpsc::Sender<Result<Frame>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::debug!("pipeline shutdown requested, stopping reader");
                return;
            }
            next = reader.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => {
                // Blocking send is the backpressure point: a full queue
                // throttles this loop to the decode rate.
                if frame_tx.send(Ok(frame)).await.is_err() {
                    tracing::debug!("frame consumer gone, stopping reader");
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!("connection closed cleanly after {} frames", reader.next_seq());
                return;
            }
            Err(e) => {
                tracing::error!("framing error: {e}");
                let _ = frame_tx.send(Err(e)).await;
                return;
            }
        }
    }
}

/// Decode task: drain the hand-off queue, decoding each frame in FIFO order.
async fn decode_loop(
    mut frame_rx: mpsc::Receiver<Result<Frame>>,
    result_tx: mpsc::Sender<Result<DecodedMessage>>,
) {
    while let Some(next) = frame_rx.recv().await {
        let result = next.and_then(|frame| {
            codec::decode(&frame.payload)
                .map(|map| DecodedMessage {
                    seq: frame.seq,
                    map,
                })
                .map_err(|e| {
                    tracing::warn!("frame {} failed to decode: {e}", frame.seq);
                    e
                })
        });

        // One bad frame does not terminate the pipeline; the consumer
        // decides whether to keep reading.
        if result_tx.send(result).await.is_err() {
            tracing::debug!("result consumer gone, stopping decoder");
            return;
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Without this, an abandoned pipeline's reader would block forever
        // on a connection that never closes.
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
