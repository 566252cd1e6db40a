//! Mode-aware Redis command dispatcher
//!
//! `redis-bridge` exposes the Redis command set as typed methods on one
//! [`Client`] session. The same method works in three execution modes:
//!
//! - **Direct**: the command is sent at once and the converted value comes
//!   back as [`Reply::Ready`].
//! - **Pipelined**: between [`Client::open_pipeline`] and
//!   [`Client::close_pipeline`] commands are queued and a [`Deferred`]
//!   ticket is returned; the ticket is redeemed on the [`BatchResults`].
//! - **Transactional**: between [`Client::multi`] and [`Client::exec`]
//!   commands are queued the same way and run atomically.
//!
//! Commands that the current mode or deployment cannot run fail with
//! [`RedisError::NotSupported`] before any network I/O. Standalone,
//! sentinel, cluster and client-side sharded deployments are supported.
//!
//! # Quick Start
//!
//! ```no_run
//! use redis_bridge::{Client, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::new("redis://localhost:6379");
//!     let mut client = Client::connect(config).await?;
//!
//!     client.set_bit("flags", 7, true).await?;
//!     let set = client.get_bit("flags", 7).await?.into_value()?;
//!     println!("bit 7 is {}", set);
//!
//!     client.open_pipeline()?;
//!     let whole = client.bit_count("flags").await?.queued();
//!     let range = client.bit_count_range("flags", 0, -1).await?.queued();
//!     let mut results = client.close_pipeline().await?;
//!     if let (Some(whole), Some(range)) = (whole, range) {
//!         assert_eq!(results.take(whole)?, results.take(range)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::future_not_send)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::too_many_arguments)]

pub mod client;
pub mod cluster;
pub mod commands;
pub mod connection;
pub mod convert;
pub mod diagnostics;
pub mod dispatch;
pub mod driver;
pub mod protocol;
pub mod pubsub;
pub mod registry;
pub mod script;
pub mod sentinel;
pub mod serializer;
pub mod sharded;

pub use client::Client;
pub use diagnostics::{CommandArguments, CommandInvocation, InvocationSink, TracingSink};
pub use dispatch::{
    BatchResults, Converter, Deferred, Operation, Reply, ToArg, TransactionResult,
};
pub use driver::{Driver, Frame};
pub use pubsub::{PubSubListener, PubSubMessage};
pub use registry::{Command, CommandSpec};
pub use script::Script;

pub use redis_bridge_core::*;
