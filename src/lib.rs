//! # Tandem
//!
//! Pooled client for Redis-protocol servers deployed as one master with
//! read replicas.
//!
//! Every command is one method on [`ConnPool`]: writes go to the master,
//! reads rotate across the replicas, and commands newer than the master's
//! server version fail with [`Error::NotSupported`] before touching the
//! network. Connections are pooled with `bb8`.
//!
//! ## Features
//!
//! - `json` - load [`Address`] lists from JSON
//!
//! ## Example
//!
//! ```no_run
//! use tandem::{PoolBuilder, SetOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PoolBuilder::new()
//!         .master("127.0.0.1:6379")
//!         .replica("127.0.0.1:6380")
//!         .build()
//!         .await?;
//!
//!     pool.set_with("session:42", "alice", SetOptions::default().ex(60)).await?;
//!     let session = pool.get("session:42").await?;
//!     println!("{session:?}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod core;
pub mod proto;

pub use crate::commands::{
    Aggregate, BitFieldOp, BitOp, Condition, GeoMember, GeoRadiusOptions, GeoUnit, KeyType,
    LexBound, Limit, MigrateOptions, ObjectSubcommand, Overflow, Position, ReplicaInfo, Role,
    ScanOptions, ScoreBound, SetOptions, SortOptions, StoreOptions, ZAddOptions,
};
pub use crate::core::addr::{conn_string, Address, ConnAddr};
pub use crate::core::builder::{PoolBuilder, PoolOptions};
pub use crate::core::command::Cmd;
pub use crate::core::connection::Connection;
pub use crate::core::info::Section;
pub use crate::core::manager::ConnectionManager;
pub use crate::core::multi::MultiPool;
pub use crate::core::pool::{ConnPool, PooledConn};
pub use crate::core::version::{ServerVersion, MIN_SUPPORTED};
pub use crate::proto::error::{Error, Result};
pub use crate::proto::frame::Frame;
