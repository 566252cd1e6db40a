//! Stream commands

use super::count_option;
use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, StreamEntry, StreamTrim};

impl Client {
    /// Append an entry, returning its id
    ///
    /// Pass `"*"` as `id` to let the server pick one.
    pub async fn xadd<F, V>(
        &mut self,
        key: impl AsRef<[u8]>,
        id: &str,
        fields: &[(F, V)],
    ) -> RedisResult<Reply<String>>
    where
        F: ToArg,
        V: ToArg,
    {
        let operation = fields.iter().fold(
            Operation::new(Command::XAdd, convert::string)
                .key("key", key)
                .arg("id", id),
            |operation, (field, value)| operation.arg("field", field).arg("value", value),
        );
        self.dispatch(operation).await
    }

    /// Number of entries
    pub async fn xlen(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::XLen, convert::integer).key("key", key))
            .await
    }

    /// Entries between two ids, oldest first; `"-"` and `"+"` are the ends
    pub async fn xrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: &str,
        end: &str,
        count: Option<u64>,
    ) -> RedisResult<Reply<Vec<StreamEntry>>> {
        self.dispatch(
            Operation::new(Command::XRange, convert::stream_entries)
                .key("key", key)
                .arg("start", start)
                .arg("end", end)
                .options("count", count_option(count)),
        )
        .await
    }

    /// Entries between two ids, newest first
    pub async fn xrevrange(
        &mut self,
        key: impl AsRef<[u8]>,
        end: &str,
        start: &str,
        count: Option<u64>,
    ) -> RedisResult<Reply<Vec<StreamEntry>>> {
        self.dispatch(
            Operation::new(Command::XRevRange, convert::stream_entries)
                .key("key", key)
                .arg("end", end)
                .arg("start", start)
                .options("count", count_option(count)),
        )
        .await
    }

    /// Delete entries, returning how many existed
    pub async fn xdel<I: ToArg>(&mut self, key: impl AsRef<[u8]>, ids: &[I]) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::XDel, convert::integer)
                .key("key", key)
                .args("ids", ids),
        )
        .await
    }

    /// Trim the stream, returning how many entries were evicted
    pub async fn xtrim(&mut self, key: impl AsRef<[u8]>, trim: &StreamTrim) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::XTrim, convert::integer)
                .key("key", key)
                .options("strategy", trim.to_args()),
        )
        .await
    }
}
