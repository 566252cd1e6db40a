//! Core types for the redis-bridge command dispatcher
//!
//! This crate provides the error taxonomy, RESP values, execution modes,
//! topologies and the domain types shared by every command family.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod mode;
pub mod types;
pub mod uri;
pub mod value;

pub use config::{ConnectionConfig, SentinelConfig, SentinelEndpoint, TopologyMode};
pub use error::{NotSupportedReason, RedisError, RedisResult};
pub use mode::{ExecutionMode, Modes, Topologies, Topology};
pub use types::*;
pub use uri::RedisUri;
pub use value::RespValue;
