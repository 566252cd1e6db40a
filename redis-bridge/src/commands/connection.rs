//! Connection commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Status};

impl Client {
    /// `PONG` when the server is alive
    pub async fn ping(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::Ping, convert::string))
            .await
    }

    /// The message, echoed back
    pub async fn echo(&mut self, message: impl ToArg) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::Echo, convert::string).arg("message", message))
            .await
    }

    /// Switch the connection to another database
    pub async fn select(&mut self, database: u8) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::Select, convert::status_ok).arg("database", database))
            .await
    }

    /// Name this connection
    pub async fn client_set_name(&mut self, name: &str) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ClientSetName, convert::status_ok).arg("name", name))
            .await
    }

    /// Name of this connection, if set
    pub async fn client_get_name(&mut self) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::ClientGetName, convert::optional_string))
            .await
    }

    /// Server-side id of this connection
    pub async fn client_id(&mut self) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::ClientId, convert::integer))
            .await
    }

    /// One line per connected client, as reported by the server
    pub async fn client_list(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::ClientList, convert::string))
            .await
    }
}
