//! String commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use bytes::Bytes;
use redis_bridge_core::{RedisError, RedisResult, SetArgument, Status};

impl Client {
    /// Set `key` to `value`
    pub async fn set(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl ToArg,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::Set, convert::status_ok)
                .key("key", key)
                .arg("value", value),
        )
        .await
    }

    /// Set `key` with expiry and condition options
    ///
    /// A condition that is not met (`NX` on an existing key, `XX` on a
    /// missing one) yields [`Status::Failure`]. Use [`set_get`] to read
    /// the previous value in the same call.
    ///
    /// [`set_get`]: Client::set_get
    ///
    /// # Errors
    ///
    /// An argument carrying the `GET` flag is refused with
    /// [`RedisError::Config`] before anything is sent.
    pub async fn set_with(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl ToArg,
        argument: &SetArgument,
    ) -> RedisResult<Reply<Status>> {
        if argument.returns_previous() {
            return Err(RedisError::Config(
                "SET with GET returns the previous value; use set_get".to_string(),
            ));
        }
        self.dispatch(
            Operation::new(Command::Set, convert::status_ok)
                .key("key", key)
                .arg("value", value)
                .options("options", argument.to_args()),
        )
        .await
    }

    /// `SET .. GET`: set `key` and return the value it replaced
    pub async fn set_get(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl ToArg,
        argument: &SetArgument,
    ) -> RedisResult<Reply<Option<String>>> {
        let options = argument.clone().get().to_args();
        self.dispatch(
            Operation::new(Command::Set, convert::optional_string)
                .key("key", key)
                .arg("value", value)
                .options("options", options),
        )
        .await
    }

    /// Value of `key` as text
    pub async fn get(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::Get, convert::optional_string).key("key", key))
            .await
    }

    /// Value of `key` as raw bytes
    pub async fn get_bytes(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<Bytes>>> {
        self.dispatch(Operation::new(Command::Get, convert::optional_bytes).key("key", key))
            .await
    }

    /// Replace the value of `key`, returning the old one
    pub async fn get_set(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl ToArg,
    ) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(
            Operation::new(Command::GetSet, convert::optional_string)
                .key("key", key)
                .arg("value", value),
        )
        .await
    }

    /// Read and delete `key`
    pub async fn get_del(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::GetDel, convert::optional_string).key("key", key))
            .await
    }

    /// Set `key` only if it does not exist
    pub async fn set_nx(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl ToArg,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::SetNx, convert::status_from_int)
                .key("key", key)
                .arg("value", value),
        )
        .await
    }

    /// Set `key` with a lifetime in seconds
    pub async fn set_ex(
        &mut self,
        key: impl AsRef<[u8]>,
        seconds: u64,
        value: impl ToArg,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::SetEx, convert::status_ok)
                .key("key", key)
                .arg("seconds", seconds)
                .arg("value", value),
        )
        .await
    }

    /// Set `key` with a lifetime in milliseconds
    pub async fn pset_ex(
        &mut self,
        key: impl AsRef<[u8]>,
        milliseconds: u64,
        value: impl ToArg,
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::PSetEx, convert::status_ok)
                .key("key", key)
                .arg("milliseconds", milliseconds)
                .arg("value", value),
        )
        .await
    }

    /// Values of several keys, `None` for missing ones
    pub async fn mget<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
    ) -> RedisResult<Reply<Vec<Option<String>>>> {
        self.dispatch(Operation::new(Command::MGet, convert::optional_string_list).keys("keys", keys))
            .await
    }

    /// Set several keys at once
    pub async fn mset<K, V>(&mut self, pairs: &[(K, V)]) -> RedisResult<Reply<Status>>
    where
        K: AsRef<[u8]>,
        V: ToArg,
    {
        self.dispatch(pairs_operation(Command::MSet, convert::status_ok, pairs))
            .await
    }

    /// Set several keys only if none of them exists
    pub async fn mset_nx<K, V>(&mut self, pairs: &[(K, V)]) -> RedisResult<Reply<Status>>
    where
        K: AsRef<[u8]>,
        V: ToArg,
    {
        self.dispatch(pairs_operation(Command::MSetNx, convert::status_from_int, pairs))
            .await
    }

    /// Increment by one
    pub async fn incr(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Incr, convert::integer).key("key", key))
            .await
    }

    /// Increment by `increment`
    pub async fn incr_by(&mut self, key: impl AsRef<[u8]>, increment: i64) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::IncrBy, convert::integer)
                .key("key", key)
                .arg("increment", increment),
        )
        .await
    }

    /// Increment by a floating point amount
    pub async fn incr_by_float(
        &mut self,
        key: impl AsRef<[u8]>,
        increment: f64,
    ) -> RedisResult<Reply<f64>> {
        self.dispatch(
            Operation::new(Command::IncrByFloat, convert::float)
                .key("key", key)
                .arg("increment", increment),
        )
        .await
    }

    /// Decrement by one
    pub async fn decr(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::Decr, convert::integer).key("key", key))
            .await
    }

    /// Decrement by `decrement`
    pub async fn decr_by(&mut self, key: impl AsRef<[u8]>, decrement: i64) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::DecrBy, convert::integer)
                .key("key", key)
                .arg("decrement", decrement),
        )
        .await
    }

    /// Append to the value, returning the new length
    pub async fn append(&mut self, key: impl AsRef<[u8]>, value: impl ToArg) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::Append, convert::integer)
                .key("key", key)
                .arg("value", value),
        )
        .await
    }

    /// Length of the value in bytes
    pub async fn strlen(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::StrLen, convert::integer).key("key", key))
            .await
    }

    /// Substring between two inclusive byte offsets
    pub async fn get_range(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        end: i64,
    ) -> RedisResult<Reply<String>> {
        self.dispatch(
            Operation::new(Command::GetRange, convert::string)
                .key("key", key)
                .arg("start", start)
                .arg("end", end),
        )
        .await
    }

    /// Overwrite part of the value, returning the new length
    pub async fn set_range(
        &mut self,
        key: impl AsRef<[u8]>,
        offset: u64,
        value: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SetRange, convert::integer)
                .key("key", key)
                .arg("offset", offset)
                .arg("value", value),
        )
        .await
    }
}

/// `CMD k1 v1 k2 v2 ..` with every key used for routing
fn pairs_operation<T, K, V>(
    command: Command,
    converter: crate::dispatch::Converter<T>,
    pairs: &[(K, V)],
) -> Operation<T>
where
    K: AsRef<[u8]>,
    V: ToArg,
{
    pairs
        .iter()
        .fold(Operation::new(command, converter), |operation, (key, value)| {
            operation.key("key", key).arg("value", value)
        })
}
