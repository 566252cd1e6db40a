//! List commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{ListPosition, RedisResult, Status};

impl Client {
    /// Prepend values, returning the new length
    pub async fn lpush<V: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::LPush, convert::integer)
                .key("key", key)
                .args("values", values),
        )
        .await
    }

    /// Append values, returning the new length
    pub async fn rpush<V: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::RPush, convert::integer)
                .key("key", key)
                .args("values", values),
        )
        .await
    }

    /// Prepend values only if the list exists
    pub async fn lpush_x<V: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::LPushX, convert::integer)
                .key("key", key)
                .args("values", values),
        )
        .await
    }

    /// Append values only if the list exists
    pub async fn rpush_x<V: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::RPushX, convert::integer)
                .key("key", key)
                .args("values", values),
        )
        .await
    }

    /// Remove and return the first element
    pub async fn lpop(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::LPop, convert::optional_string).key("key", key))
            .await
    }

    /// Remove and return the last element
    pub async fn rpop(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::RPop, convert::optional_string).key("key", key))
            .await
    }

    /// Elements between two inclusive indexes
    pub async fn lrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(
            Operation::new(Command::LRange, convert::string_list)
                .key("key", key)
                .arg("start", start)
                .arg("stop", stop),
        )
        .await
    }

    /// Length of the list
    pub async fn llen(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::LLen, convert::integer).key("key", key))
            .await
    }

    /// Element at `index`
    pub async fn lindex(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
    ) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(
            Operation::new(Command::LIndex, convert::optional_string)
                .key("key", key)
                .arg("index", index),
        )
        .await
    }

    /// Replace the element at `index`
    pub async fn lset(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
        value: impl ToArg,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::LSet, convert::status_ok)
                .key("key", key)
                .arg("index", index)
                .arg("value", value),
        )
        .await
    }

    /// Insert next to `pivot`; -1 when the pivot is missing
    pub async fn linsert(
        &mut self,
        key: impl AsRef<[u8]>,
        position: ListPosition,
        pivot: impl ToArg,
        value: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::LInsert, convert::integer)
                .key("key", key)
                .arg("position", position.as_str())
                .arg("pivot", pivot)
                .arg("value", value),
        )
        .await
    }

    /// Remove up to `count` occurrences of `value`
    ///
    /// A negative count removes from the tail, zero removes all.
    pub async fn lrem(
        &mut self,
        key: impl AsRef<[u8]>,
        count: i64,
        value: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::LRem, convert::integer)
                .key("key", key)
                .arg("count", count)
                .arg("value", value),
        )
        .await
    }

    /// Keep only the elements between two inclusive indexes
    pub async fn ltrim(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::LTrim, convert::status_ok)
                .key("key", key)
                .arg("start", start)
                .arg("stop", stop),
        )
        .await
    }

    /// Move the last element of `source` to the head of `destination`
    pub async fn rpoplpush(
        &mut self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(
            Operation::new(Command::RPopLPush, convert::optional_string)
                .key("source", source)
                .key("destination", destination),
        )
        .await
    }
}
