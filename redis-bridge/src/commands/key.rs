//! Key-space commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{KeyType, RedisResult, ScanArgument, ScanResult, Status};

impl Client {
    /// Delete keys, returning how many existed
    pub async fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Del, convert::integer).keys("keys", keys))
            .await
    }

    /// Delete keys, reclaiming memory in the background
    pub async fn unlink<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Unlink, convert::integer).keys("keys", keys))
            .await
    }

    /// Number of the given keys that exist
    pub async fn exists<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Exists, convert::integer).keys("keys", keys))
            .await
    }

    /// Expire `key` after `seconds`; failure if the key does not exist
    pub async fn expire(&mut self, key: impl AsRef<[u8]>, seconds: u64) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::Expire, convert::status_from_int)
                .key("key", key)
                .arg("seconds", seconds),
        )
        .await
    }

    /// Expire `key` after `milliseconds`
    pub async fn pexpire(
        &mut self,
        key: impl AsRef<[u8]>,
        milliseconds: u64,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::PExpire, convert::status_from_int)
                .key("key", key)
                .arg("milliseconds", milliseconds),
        )
        .await
    }

    /// Expire `key` at a Unix time in seconds
    pub async fn expire_at(
        &mut self,
        key: impl AsRef<[u8]>,
        unix_time: u64,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::ExpireAt, convert::status_from_int)
                .key("key", key)
                .arg("unix_time", unix_time),
        )
        .await
    }

    /// Expire `key` at a Unix time in milliseconds
    pub async fn pexpire_at(
        &mut self,
        key: impl AsRef<[u8]>,
        unix_time_millis: u64,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::PExpireAt, convert::status_from_int)
                .key("key", key)
                .arg("unix_time_millis", unix_time_millis),
        )
        .await
    }

    /// Remove the expiry of `key`
    pub async fn persist(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::Persist, convert::status_from_int).key("key", key))
            .await
    }

    /// Remaining lifetime in seconds; -1 without expiry, -2 when missing
    pub async fn ttl(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Ttl, convert::integer).key("key", key))
            .await
    }

    /// Remaining lifetime in milliseconds
    pub async fn pttl(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::PTtl, convert::integer).key("key", key))
            .await
    }

    /// Type of the value stored at `key`
    pub async fn key_type(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<KeyType>> {
        self.dispatch(Operation::new(Command::Type, convert::key_type).key("key", key))
            .await
    }

    /// Rename `key`, overwriting `new_key`
    pub async fn rename(
        &mut self,
        key: impl AsRef<[u8]>,
        new_key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::Rename, convert::status_ok)
                .key("key", key)
                .key("new_key", new_key),
        )
        .await
    }

    /// Rename `key` only if `new_key` does not exist
    pub async fn rename_nx(
        &mut self,
        key: impl AsRef<[u8]>,
        new_key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::RenameNx, convert::status_from_int)
                .key("key", key)
                .key("new_key", new_key),
        )
        .await
    }

    /// Keys matching a glob pattern
    pub async fn keys(&mut self, pattern: &str) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(Operation::new(Command::Keys, convert::string_list).arg("pattern", pattern))
            .await
    }

    /// One page of the key space starting at `cursor`
    pub async fn scan(&mut self, cursor: &str) -> RedisResult<Reply<ScanResult<Vec<String>>>> {
        self.scan_with(cursor, &ScanArgument::new()).await
    }

    /// One page of the key space with `MATCH` and `COUNT` options
    pub async fn scan_with(
        &mut self,
        cursor: &str,
        argument: &ScanArgument,
    ) -> RedisResult<Reply<ScanResult<Vec<String>>>> {
        self.dispatch(
            Operation::new(Command::Scan, convert::scan_strings)
                .arg("cursor", cursor)
                .options("options", argument.to_args()),
        )
        .await
    }

    /// A random key, `None` in an empty database
    pub async fn random_key(&mut self) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::RandomKey, convert::optional_string))
            .await
    }

    /// Update the access time of keys, returning how many exist
    pub async fn touch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Touch, convert::integer).keys("keys", keys))
            .await
    }
}
