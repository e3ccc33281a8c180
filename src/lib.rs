//! # wiremap
//!
//! Self-describing binary serialization for dynamically-typed key/value
//! trees, paired with a stream-framing layer and a per-connection pipeline
//! that decouples network reads from decode work.
//!
//! ## Architecture
//!
//! - **Value model** ([`Value`]): a closed tagged union over strings, 64-bit
//!   integers, 64-bit floats, booleans, nested maps and nested lists.
//! - **Codec** ([`codec`]): recursive (type, length, payload) wire encoding
//!   that round-trips arbitrary value trees.
//! - **Framing** ([`framing`]): 4-byte length-delimited message extraction
//!   from a continuous byte stream, tolerant of partial reads.
//! - **Pipeline** ([`Pipeline`]): one reader task and one decode task per
//!   connection, joined by a bounded hand-off queue.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use wiremap::{codec, Value};
//!
//! let mut map = HashMap::new();
//! map.insert("greeting".to_owned(), Value::from("hello"));
//! map.insert("count".to_owned(), Value::Int64(3));
//!
//! let bytes = codec::encode(&map).unwrap();
//! assert_eq!(codec::decode(&bytes).unwrap(), map);
//! ```

pub mod codec;
pub mod error;
pub mod framing;
pub mod value;

mod pipeline;

pub use error::{Result, WiremapError};
pub use pipeline::{DecodedMessage, Pipeline, PipelineConfig, DEFAULT_QUEUE_CAPACITY};
pub use value::{Value, ValueKind};
