//! Command families
//!
//! Each module adds one family of Redis commands to [`Client`]. A command
//! method only builds an [`Operation`] (the wire words, keys and arguments
//! plus the converter for the reply) and hands it to [`Client::dispatch`],
//! so every command behaves the same in direct, pipelined and transactional
//! mode.
//!
//! [`Client`]: crate::Client
//! [`Client::dispatch`]: crate::Client::dispatch
//! [`Operation`]: crate::dispatch::Operation

pub mod acl;
pub mod bitmap;
pub mod cluster;
pub mod connection;
pub mod debug;
pub mod geo;
pub mod hash;
pub mod hyperloglog;
pub mod key;
pub mod list;
pub mod pubsub;
pub mod replication;
pub mod scripting;
pub mod server;
pub mod set;
pub mod sorted_set;
pub mod stream;
pub mod string;
pub mod transaction;

/// Optional `COUNT n` suffix
pub(crate) fn count_option(count: Option<u64>) -> Vec<String> {
    count.map_or_else(Vec::new, |n| vec!["COUNT".to_string(), n.to_string()])
}
