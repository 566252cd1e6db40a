//! Bitmap commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{BitCountOption, BitFieldArgument, BitOperation, RedisResult};

impl Client {
    /// Set or clear the bit at `offset`, returning the previous bit
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use redis_bridge::{Client, ConnectionConfig};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut client = Client::connect(ConnectionConfig::new("localhost:6379")).await?;
    /// client.set_bit("flags", 7, true).await?;
    /// assert!(client.get_bit("flags", 7).await?.into_value()?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_bit(
        &mut self,
        key: impl AsRef<[u8]>,
        offset: u64,
        value: bool,
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::SetBit, convert::boolean)
                .key("key", key)
                .arg("offset", offset)
                .arg("value", value),
        )
        .await
    }

    /// Bit at `offset`; bits past the end read as clear
    pub async fn get_bit(&mut self, key: impl AsRef<[u8]>, offset: u64) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::GetBit, convert::boolean)
                .key("key", key)
                .arg("offset", offset),
        )
        .await
    }

    /// Number of set bits in the whole value
    pub async fn bit_count(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::BitCount, convert::integer).key("key", key))
            .await
    }

    /// Number of set bits between two byte offsets, both inclusive
    ///
    /// Negative offsets count from the end, so `(0, -1)` covers the whole
    /// value.
    pub async fn bit_count_range(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        end: i64,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::BitCount, convert::integer)
                .key("key", key)
                .arg("start", start)
                .arg("end", end),
        )
        .await
    }

    /// Number of set bits between two offsets counted in bytes or bits
    pub async fn bit_count_range_by(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        end: i64,
        unit: BitCountOption,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::BitCount, convert::integer)
                .key("key", key)
                .arg("start", start)
                .arg("end", end)
                .arg("unit", unit.as_str()),
        )
        .await
    }

    /// Position of the first bit set to `bit`, or -1
    pub async fn bit_pos(&mut self, key: impl AsRef<[u8]>, bit: bool) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::BitPos, convert::integer)
                .key("key", key)
                .arg("bit", bit),
        )
        .await
    }

    /// Position of the first bit set to `bit` within a byte range, or -1
    pub async fn bit_pos_range(
        &mut self,
        key: impl AsRef<[u8]>,
        bit: bool,
        start: i64,
        end: i64,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::BitPos, convert::integer)
                .key("key", key)
                .arg("bit", bit)
                .arg("start", start)
                .arg("end", end),
        )
        .await
    }

    /// Combine `keys` bitwise into `destination`, returning its length
    pub async fn bit_op<K: AsRef<[u8]>>(
        &mut self,
        operation: BitOperation,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::BitOp, convert::integer)
                .arg("operation", operation.as_str())
                .key("destination", destination)
                .keys("keys", keys),
        )
        .await
    }

    /// Run a `BITFIELD` program; one entry per GET, SET or INCRBY
    ///
    /// An entry is `None` when an `OVERFLOW FAIL` increment was refused.
    pub async fn bit_field(
        &mut self,
        key: impl AsRef<[u8]>,
        argument: &BitFieldArgument,
    ) -> RedisResult<Reply<Vec<Option<i64>>>> {
        self.dispatch(
            Operation::new(Command::BitField, convert::optional_integer_list)
                .key("key", key)
                .options("operations", argument.to_args()),
        )
        .await
    }

    /// Read-only `BITFIELD`, accepting GET operations only
    pub async fn bit_field_ro(
        &mut self,
        key: impl AsRef<[u8]>,
        argument: &BitFieldArgument,
    ) -> RedisResult<Reply<Vec<Option<i64>>>> {
        self.dispatch(
            Operation::new(Command::BitFieldRo, convert::optional_integer_list)
                .key("key", key)
                .options("operations", argument.to_args()),
        )
        .await
    }
}
