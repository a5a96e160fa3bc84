//! RESP frame types.
//!
//! Simple strings, errors, integers, bulk strings, arrays and nulls.

/// Frame type definitions.
pub mod types;

pub use types::Frame;
