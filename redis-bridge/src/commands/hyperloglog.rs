//! HyperLogLog commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Status};

impl Client {
    /// Add elements; true if the estimate changed
    pub async fn pf_add<E: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        elements: &[E],
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::PfAdd, convert::boolean)
                .key("key", key)
                .args("elements", elements),
        )
        .await
    }

    /// Estimated cardinality of the union of the given keys
    pub async fn pf_count<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::PfCount, convert::integer).keys("keys", keys))
            .await
    }

    /// Merge `sources` into `destination`
    pub async fn pf_merge<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        sources: &[K],
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::PfMerge, convert::status_ok)
                .key("destination", destination)
                .keys("sources", sources),
        )
        .await
    }
}
