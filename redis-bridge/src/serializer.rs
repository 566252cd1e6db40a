//! JSON objects stored as Redis values
//!
//! [`Client::set_object`] writes any `serde::Serialize` value as a JSON
//! document and [`Client::get_object`] reads it back. The `*_object`
//! variants of the hash, list and set commands do the same for fields,
//! elements and members. A value that is not valid JSON for the requested
//! type is a [`RedisError::Type`].

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use bytes::Bytes;
use redis_bridge_core::{RedisError, RedisResult, RespValue, Status};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

impl Client {
    /// Store `value` as JSON under `key`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use redis_bridge::{Client, ConnectionConfig};
    /// # use serde::{Deserialize, Serialize};
    /// #[derive(Serialize, Deserialize)]
    /// struct User {
    ///     name: String,
    ///     age: u32,
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut client = Client::connect(ConnectionConfig::new("localhost:6379")).await?;
    /// let user = User { name: "ada".into(), age: 36 };
    /// client.set_object("user:1", &user).await?;
    /// let stored: Option<User> = client.get_object("user:1").await?.into_value()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_object<V: Serialize + ?Sized>(
        &mut self,
        key: impl AsRef<[u8]>,
        value: &V,
    ) -> RedisResult<Reply<Status>> {
        let document = document(value)?;
        self.dispatch(
            Operation::new(Command::Set, convert::status_ok)
                .key("key", key)
                .arg("value", document),
        )
        .await
    }

    /// Read the JSON document under `key`
    pub async fn get_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(Operation::new(Command::Get, json::<T>).key("key", key))
            .await
    }

    /// JSON documents of several keys, `None` where a key is missing
    pub async fn mget_object<T, K>(&mut self, keys: &[K]) -> RedisResult<Reply<Vec<Option<T>>>>
    where
        T: DeserializeOwned + Send + 'static,
        K: AsRef<[u8]>,
    {
        self.dispatch(Operation::new(Command::MGet, json_optional_list::<T>).keys("keys", keys))
            .await
    }

    /// Store `value` as JSON in a hash field, returning 1 for a new field
    pub async fn hset_object<V: Serialize + ?Sized>(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
        value: &V,
    ) -> RedisResult<Reply<i64>> {
        let document = document(value)?;
        self.dispatch(
            Operation::new(Command::HSet, convert::integer)
                .key("key", key)
                .arg("field", field)
                .arg("value", document),
        )
        .await
    }

    /// JSON document in a hash field
    pub async fn hget_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl ToArg,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(
            Operation::new(Command::HGet, json::<T>)
                .key("key", key)
                .arg("field", field),
        )
        .await
    }

    /// JSON documents of several hash fields
    pub async fn hmget_object<T, F>(
        &mut self,
        key: impl AsRef<[u8]>,
        fields: &[F],
    ) -> RedisResult<Reply<Vec<Option<T>>>>
    where
        T: DeserializeOwned + Send + 'static,
        F: ToArg,
    {
        self.dispatch(
            Operation::new(Command::HMGet, json_optional_list::<T>)
                .key("key", key)
                .args("fields", fields),
        )
        .await
    }

    /// Every field of a hash with its JSON document
    pub async fn hget_all_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<HashMap<String, T>>> {
        self.dispatch(Operation::new(Command::HGetAll, json_map::<T>).key("key", key))
            .await
    }

    /// JSON documents of every hash field
    pub async fn hvals_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Vec<T>>> {
        self.dispatch(Operation::new(Command::HVals, json_list::<T>).key("key", key))
            .await
    }

    /// Prepend values as JSON, returning the new length
    pub async fn lpush_object<V: Serialize>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        let documents = documents(values)?;
        self.dispatch(
            Operation::new(Command::LPush, convert::integer)
                .key("key", key)
                .args("values", documents),
        )
        .await
    }

    /// Append values as JSON, returning the new length
    pub async fn rpush_object<V: Serialize>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: &[V],
    ) -> RedisResult<Reply<i64>> {
        let documents = documents(values)?;
        self.dispatch(
            Operation::new(Command::RPush, convert::integer)
                .key("key", key)
                .args("values", documents),
        )
        .await
    }

    /// JSON element at `index`
    pub async fn lindex_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(
            Operation::new(Command::LIndex, json::<T>)
                .key("key", key)
                .arg("index", index),
        )
        .await
    }

    /// Remove and decode the first element
    pub async fn lpop_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(Operation::new(Command::LPop, json::<T>).key("key", key))
            .await
    }

    /// Remove and decode the last element
    pub async fn rpop_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(Operation::new(Command::RPop, json::<T>).key("key", key))
            .await
    }

    /// JSON elements between two inclusive indexes
    pub async fn lrange_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<T>>> {
        self.dispatch(
            Operation::new(Command::LRange, json_list::<T>)
                .key("key", key)
                .arg("start", start)
                .arg("stop", stop),
        )
        .await
    }

    /// Move the last element of `source` to the head of `destination`
    /// and decode it
    pub async fn rpoplpush_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(
            Operation::new(Command::RPopLPush, json::<T>)
                .key("source", source)
                .key("destination", destination),
        )
        .await
    }

    /// Add members as JSON, returning how many are new
    ///
    /// Members compare by their JSON text, so field order matters.
    pub async fn sadd_object<V: Serialize>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[V],
    ) -> RedisResult<Reply<i64>> {
        let documents = documents(members)?;
        self.dispatch(
            Operation::new(Command::SAdd, convert::integer)
                .key("key", key)
                .args("members", documents),
        )
        .await
    }

    /// Decoded members of a set, in server order
    pub async fn smembers_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Vec<T>>> {
        self.dispatch(Operation::new(Command::SMembers, json_list::<T>).key("key", key))
            .await
    }

    /// Remove and decode a random member
    pub async fn spop_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(Operation::new(Command::SPop, json::<T>).key("key", key))
            .await
    }

    /// Decode a random member, left in place
    pub async fn srand_member_object<T: DeserializeOwned + Send + 'static>(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> RedisResult<Reply<Option<T>>> {
        self.dispatch(Operation::new(Command::SRandMember, json::<T>).key("key", key))
            .await
    }

    /// Decoded members of the first set missing from the others
    pub async fn sdiff_object<T, K>(&mut self, keys: &[K]) -> RedisResult<Reply<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
        K: AsRef<[u8]>,
    {
        self.dispatch(Operation::new(Command::SDiff, json_list::<T>).keys("keys", keys))
            .await
    }
}

fn document<V: Serialize + ?Sized>(value: &V) -> RedisResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| RedisError::Type(format!("Cannot serialize value: {}", e)))
}

fn documents<V: Serialize>(values: &[V]) -> RedisResult<Vec<Bytes>> {
    values.iter().map(document).collect()
}

fn decode<T: DeserializeOwned>(value: RespValue) -> RedisResult<T> {
    let document = value.into_bytes()?;
    serde_json::from_slice(&document)
        .map_err(|e| RedisError::Type(format!("Malformed JSON document: {}", e)))
}

/// JSON document or nil
fn json<T: DeserializeOwned>(value: RespValue) -> RedisResult<Option<T>> {
    match value {
        RespValue::Null => Ok(None),
        other => decode(other).map(Some),
    }
}

/// Array of JSON documents
fn json_list<T: DeserializeOwned>(value: RespValue) -> RedisResult<Vec<T>> {
    value.into_array()?.into_iter().map(decode).collect()
}

/// Array of JSON documents with nil holes
fn json_optional_list<T: DeserializeOwned>(value: RespValue) -> RedisResult<Vec<Option<T>>> {
    value.into_array()?.into_iter().map(json).collect()
}

/// Flat `[field, document, ...]` array
fn json_map<T: DeserializeOwned>(value: RespValue) -> RedisResult<HashMap<String, T>> {
    convert::pairs(value.into_array()?)?
        .map(|(field, document)| Ok((field.into_string()?, decode(document)?)))
        .collect()
}
