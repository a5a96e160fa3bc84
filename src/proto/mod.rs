//! RESP wire layer.
//!
//! Frames, the streaming codec, and the crate error type. This is the
//! minimal protocol surface the pooled connections need to exchange
//! commands and replies with the server.
//!
//! ## Modules
//!
//! - [`codec`] - Encoder and decoder for RESP frames
//! - [`error`] - Error type shared by every layer of the crate
//! - [`frame`] - Frame types representing RESP data structures

pub mod codec;
/// Error types.
pub mod error;
pub mod frame;
