//! RESP encoder and decoder.
//!
//! # Modules
//!
//! - [`encoder`] - Frame encoding to bytes
//! - [`decoder`] - Streaming frame decoder from bytes

/// Streaming RESP decoder.
pub mod decoder;
/// RESP encoder.
pub mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;
