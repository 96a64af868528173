//! # hang-ingest: decode pipeline for hang video tracks
//!
//! `hang-ingest` sits between a MoQ subscription and a frame consumer (a host
//! application, a renderer, a test harness). The subscription delivers encoded
//! video chunks from a callback thread; this crate turns them into a
//! monotonically timestamped sequence of RGBA frames.
//!
//! ## Overview
//!
//! - **annexb**: Reframe length-prefixed (avc1/hvc1 style) chunks into start-code bitstreams.
//! - **catalog**: Extract the codec string and description from a hang catalog.
//! - **decode**: The decoder backend seam, with an optional FFmpeg backend.
//! - **pipeline**: One decoder generation: submit, drain, convert and timestamp.
//! - **source**: Session lifecycle and the locking needed to tear down while chunks are in flight.
//!
mod error;

pub mod annexb;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod decode;
pub mod frame;
pub mod log;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod timestamp;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use pipeline::*;
pub use sink::*;
pub use source::*;
pub use timestamp::*;
