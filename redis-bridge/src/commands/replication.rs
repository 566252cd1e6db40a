//! Replication commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Role, Status};

impl Client {
    /// Make the server a replica of `host:port`
    pub async fn replica_of(&mut self, host: &str, port: u16) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::ReplicaOf, convert::status_ok)
                .arg("host", host)
                .arg("port", port),
        )
        .await
    }

    /// Promote the server to master
    pub async fn replica_of_no_one(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::ReplicaOf, convert::status_ok)
                .token("NO")
                .token("ONE"),
        )
        .await
    }

    /// Replication role of the server
    pub async fn role(&mut self) -> RedisResult<Reply<Role>> {
        self.dispatch(Operation::new(Command::Role, convert::role))
            .await
    }

    /// Allow reads from a cluster replica on this connection
    pub async fn read_only(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ReadOnly, convert::status_ok))
            .await
    }

    /// Undo [`read_only`](Self::read_only)
    pub async fn read_write(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ReadWrite, convert::status_ok))
            .await
    }
}
