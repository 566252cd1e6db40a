//! Cluster administration commands
//!
//! These are only accepted on a cluster client; anywhere else they fail
//! with [`RedisError::NotSupported`] before anything is sent.
//!
//! [`RedisError::NotSupported`]: redis_bridge_core::RedisError::NotSupported

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{ClusterInfo, ClusterSlot, RedisResult, Status};

impl Client {
    /// Hash slot the server computes for `key`
    ///
    /// The key is an argument here, not a routing key: any node answers.
    pub async fn cluster_key_slot(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::ClusterKeySlot, convert::integer).arg("key", key.as_ref()),
        )
        .await
    }

    /// Cluster state as seen by one node
    pub async fn cluster_info(&mut self) -> RedisResult<Reply<ClusterInfo>> {
        self.dispatch(Operation::new(Command::ClusterInfo, convert::cluster_info))
            .await
    }

    /// Id of the node answering
    pub async fn cluster_my_id(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::ClusterMyId, convert::string))
            .await
    }

    /// Raw `CLUSTER NODES` table
    pub async fn cluster_nodes(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::ClusterNodes, convert::string))
            .await
    }

    /// Slot ranges with their master and replicas
    pub async fn cluster_slots(&mut self) -> RedisResult<Reply<Vec<ClusterSlot>>> {
        self.dispatch(Operation::new(Command::ClusterSlots, convert::cluster_slots))
            .await
    }

    /// Number of keys in `slot`, asked of the node that owns it
    pub async fn cluster_count_keys_in_slot(&mut self, slot: u16) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::ClusterCountKeysInSlot, convert::integer)
                .arg("slot", slot)
                .slot(slot),
        )
        .await
    }

    /// Up to `count` keys stored in `slot`
    pub async fn cluster_get_keys_in_slot(
        &mut self,
        slot: u16,
        count: u64,
    ) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(
            Operation::new(Command::ClusterGetKeysInSlot, convert::string_list)
                .arg("slot", slot)
                .arg("count", count)
                .slot(slot),
        )
        .await
    }

    /// Connect a node at `host:port` to the cluster
    pub async fn cluster_meet(&mut self, host: &str, port: u16) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::ClusterMeet, convert::status_ok)
                .arg("host", host)
                .arg("port", port),
        )
        .await
    }

    /// Remove a node from the node table of the answering node
    pub async fn cluster_forget(&mut self, node_id: &str) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ClusterForget, convert::status_ok).arg("node_id", node_id))
            .await
    }

    /// Reset the answering node, `HARD` also drops its epochs and id
    pub async fn cluster_reset(&mut self, hard: bool) -> RedisResult<Reply<Status>> {
        let mode = if hard { "HARD" } else { "SOFT" };
        self.dispatch(Operation::new(Command::ClusterReset, convert::status_ok).arg("mode", mode))
            .await
    }
}
