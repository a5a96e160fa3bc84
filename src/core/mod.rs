//! Connections, pooling and the plumbing shared by every command.
//!
//! ## Modules
//!
//! - [`connection`] - Single connection with deadlines
//! - [`command`] - Command construction and reply conversion
//! - [`manager`] - `bb8` connection factory
//! - [`pool`] - Master/replica pool
//! - [`multi`] - Pools keyed by master address
//! - [`builder`] - Pool builder and options

/// Connection strings and master/replica addresses.
pub mod addr;
/// Pool builder configuration.
pub mod builder;
/// Command construction helpers.
pub mod command;
/// Low-level connection management.
pub mod connection;
/// `INFO` sections and reply parsing.
pub mod info;
/// Connection factory for the pool.
pub mod manager;
/// Several master/replica pools behind one handle.
pub mod multi;
/// Master/replica connection pool.
pub mod pool;
/// Server version parsing and comparison.
pub mod version;
