//! Hash commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, ScanArgument, ScanResult};
use std::collections::HashMap;

impl Client {
    /// Set one field, returning 1 if it is new
    pub async fn hset(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
        value: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::HSet, convert::integer)
                .key("key", key)
                .arg("field", field)
                .arg("value", value),
        )
        .await
    }

    /// Set several fields, returning how many are new
    pub async fn hset_multiple<F, V>(
        &mut self,
        key: impl AsRef<[u8]>,
        pairs: &[(F, V)],
    ) -> RedisResult<Reply<i64>>
    where
        F: ToArg,
        V: ToArg,
    {
        let operation = pairs.iter().fold(
            Operation::new(Command::HSet, convert::integer).key("key", key),
            |operation, (field, value)| operation.arg("field", field).arg("value", value),
        );
        self.dispatch(operation).await
    }

    /// Set a field only if it does not exist
    pub async fn hset_nx(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
        value: impl ToArg,
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::HSetNx, convert::boolean)
                .key("key", key)
                .arg("field", field)
                .arg("value", value),
        )
        .await
    }

    /// Value of a field
    pub async fn hget(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
    ) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(
            Operation::new(Command::HGet, convert::optional_string)
                .key("key", key)
                .arg("field", field),
        )
        .await
    }

    /// Values of several fields, `None` for missing ones
    pub async fn hmget<F: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        fields: &[F],
    ) -> RedisResult<Reply<Vec<Option<String>>>> {
        self.dispatch(
            Operation::new(Command::HMGet, convert::optional_string_list)
                .key("key", key)
                .args("fields", fields),
        )
        .await
    }

    /// All fields and values
    pub async fn hget_all(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<HashMap<String, String>>> {
        self.dispatch(Operation::new(Command::HGetAll, convert::string_map).key("key", key))
            .await
    }

    /// Delete fields, returning how many existed
    pub async fn hdel<F: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        fields: &[F],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::HDel, convert::integer)
                .key("key", key)
                .args("fields", fields),
        )
        .await
    }

    /// Check whether a field exists
    pub async fn hexists(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::HExists, convert::boolean)
                .key("key", key)
                .arg("field", field),
        )
        .await
    }

    /// Increment an integer field
    pub async fn hincr_by(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
        increment: i64,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::HIncrBy, convert::integer)
                .key("key", key)
                .arg("field", field)
                .arg("increment", increment),
        )
        .await
    }

    /// Increment a floating point field
    pub async fn hincr_by_float(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
        increment: f64,
    ) -> RedisResult<Reply<f64>> {
        self.dispatch(
            Operation::new(Command::HIncrByFloat, convert::float)
                .key("key", key)
                .arg("field", field)
                .arg("increment", increment),
        )
        .await
    }

    /// Field names
    pub async fn hkeys(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(Operation::new(Command::HKeys, convert::string_list).key("key", key))
            .await
    }

    /// Field values
    pub async fn hvals(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(Operation::new(Command::HVals, convert::string_list).key("key", key))
            .await
    }

    /// Number of fields
    pub async fn hlen(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::HLen, convert::integer).key("key", key))
            .await
    }

    /// Length of a field's value
    pub async fn hstrlen(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::HStrLen, convert::integer)
                .key("key", key)
                .arg("field", field),
        )
        .await
    }

    /// A random field name, `None` for a missing hash
    pub async fn hrand_field(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::HRandField, convert::optional_string).key("key", key))
            .await
    }

    /// One page of fields and values starting at `cursor`
    pub async fn hscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: &str,
        argument: &ScanArgument,
    ) -> RedisResult<Reply<ScanResult<HashMap<String, String>>>> {
        self.dispatch(
            Operation::new(Command::HScan, convert::scan_map)
                .key("key", key)
                .arg("cursor", cursor)
                .options("options", argument.to_args()),
        )
        .await
    }
}
