//! Object introspection and slow log

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, SlowLog, Status};

impl Client {
    /// Internal encoding of the value at `key`
    pub async fn object_encoding(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::ObjectEncoding, convert::optional_string).key("key", key))
            .await
    }

    /// Reference count of the value at `key`
    pub async fn object_ref_count(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<i64>>> {
        self.dispatch(Operation::new(Command::ObjectRefCount, convert::optional_integer).key("key", key))
            .await
    }

    /// Seconds since the value at `key` was last accessed
    pub async fn object_idle_time(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<i64>>> {
        self.dispatch(Operation::new(Command::ObjectIdleTime, convert::optional_integer).key("key", key))
            .await
    }

    /// Recent slow log entries, newest first
    pub async fn slowlog_get(&mut self, count: Option<u64>) -> RedisResult<Reply<Vec<SlowLog>>> {
        let mut operation = Operation::new(Command::SlowLogGet, convert::slowlog_list);
        if let Some(count) = count {
            operation = operation.arg("count", count);
        }
        self.dispatch(operation).await
    }

    /// Number of slow log entries
    pub async fn slowlog_len(&mut self) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::SlowLogLen, convert::integer))
            .await
    }

    /// Empty the slow log
    pub async fn slowlog_reset(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::SlowLogReset, convert::status_ok))
            .await
    }
}
