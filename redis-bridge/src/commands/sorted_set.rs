//! Sorted set commands
//!
//! Score bounds accept anything [`ToArg`], so exclusive bounds and
//! infinities are written the way Redis spells them: `"(1.5"`, `"-inf"`.

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{Aggregate, RedisResult, ScanArgument, ScanResult, Tuple};

impl Client {
    /// Add members with scores, returning how many are new
    pub async fn zadd<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[(f64, M)],
    ) -> RedisResult<Reply<i64>> {
        let operation = members.iter().fold(
            Operation::new(Command::ZAdd, convert::integer).key("key", key),
            |operation, (score, member)| operation.arg("score", score).arg("member", member),
        );
        self.dispatch(operation).await
    }

    /// Increment the score of a member
    pub async fn zincr_by(
        &mut self,
        key: impl AsRef<[u8]>,
        increment: f64,
        member: impl ToArg,
    ) -> RedisResult<Reply<f64>> {
        self.dispatch(
            Operation::new(Command::ZIncrBy, convert::float)
                .key("key", key)
                .arg("increment", increment)
                .arg("member", member),
        )
        .await
    }

    /// Score of a member
    pub async fn zscore(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl ToArg,
    ) -> RedisResult<Reply<Option<f64>>> {
        self.dispatch(
            Operation::new(Command::ZScore, convert::optional_float)
                .key("key", key)
                .arg("member", member),
        )
        .await
    }

    /// Rank of a member, lowest score first
    pub async fn zrank(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl ToArg,
    ) -> RedisResult<Reply<Option<i64>>> {
        self.dispatch(
            Operation::new(Command::ZRank, convert::optional_integer)
                .key("key", key)
                .arg("member", member),
        )
        .await
    }

    /// Rank of a member, highest score first
    pub async fn zrev_rank(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl ToArg,
    ) -> RedisResult<Reply<Option<i64>>> {
        self.dispatch(
            Operation::new(Command::ZRevRank, convert::optional_integer)
                .key("key", key)
                .arg("member", member),
        )
        .await
    }

    /// Number of members
    pub async fn zcard(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::ZCard, convert::integer).key("key", key))
            .await
    }

    /// Number of members with a score between `min` and `max`
    pub async fn zcount(
        &mut self,
        key: impl AsRef<[u8]>,
        min: impl ToArg,
        max: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::ZCount, convert::integer)
                .key("key", key)
                .arg("min", min)
                .arg("max", max),
        )
        .await
    }

    /// Members between two ranks
    pub async fn zrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(range(Command::ZRange, convert::string_list, key, start, stop))
            .await
    }

    /// Members and scores between two ranks
    pub async fn zrange_with_scores(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<Tuple>>> {
        self.dispatch(
            range(Command::ZRange, convert::tuple_list, key, start, stop).token("WITHSCORES"),
        )
        .await
    }

    /// Members between two ranks, highest score first
    pub async fn zrev_range(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(range(Command::ZRevRange, convert::string_list, key, start, stop))
            .await
    }

    /// Members and scores between two ranks, highest score first
    pub async fn zrev_range_with_scores(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<Vec<Tuple>>> {
        self.dispatch(
            range(Command::ZRevRange, convert::tuple_list, key, start, stop).token("WITHSCORES"),
        )
        .await
    }

    /// Members with a score between `min` and `max`
    pub async fn zrange_by_score(
        &mut self,
        key: impl AsRef<[u8]>,
        min: impl ToArg,
        max: impl ToArg,
    ) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(
            Operation::new(Command::ZRangeByScore, convert::string_list)
                .key("key", key)
                .arg("min", min)
                .arg("max", max),
        )
        .await
    }

    /// Members and scores with a score between `min` and `max`
    pub async fn zrange_by_score_with_scores(
        &mut self,
        key: impl AsRef<[u8]>,
        min: impl ToArg,
        max: impl ToArg,
    ) -> RedisResult<Reply<Vec<Tuple>>> {
        self.dispatch(
            Operation::new(Command::ZRangeByScore, convert::tuple_list)
                .key("key", key)
                .arg("min", min)
                .arg("max", max)
                .token("WITHSCORES"),
        )
        .await
    }

    /// Remove members, returning how many existed
    pub async fn zrem<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::ZRem, convert::integer)
                .key("key", key)
                .args("members", members),
        )
        .await
    }

    /// Remove members between two ranks
    pub async fn zrem_range_by_rank(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(range(Command::ZRemRangeByRank, convert::integer, key, start, stop))
            .await
    }

    /// Remove members with a score between `min` and `max`
    pub async fn zrem_range_by_score(
        &mut self,
        key: impl AsRef<[u8]>,
        min: impl ToArg,
        max: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::ZRemRangeByScore, convert::integer)
                .key("key", key)
                .arg("min", min)
                .arg("max", max),
        )
        .await
    }

    /// Store the intersection of sorted sets in `destination`
    ///
    /// `weights`, when given, must have one entry per key.
    pub async fn zinter_store<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
        weights: Option<&[f64]>,
        aggregate: Aggregate,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(combine(Command::ZInterStore, destination, keys, weights, aggregate))
            .await
    }

    /// Store the union of sorted sets in `destination`
    pub async fn zunion_store<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
        weights: Option<&[f64]>,
        aggregate: Aggregate,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(combine(Command::ZUnionStore, destination, keys, weights, aggregate))
            .await
    }

    /// Remove and return up to `count` members with the lowest scores
    pub async fn zpop_min(
        &mut self,
        key: impl AsRef<[u8]>,
        count: u64,
    ) -> RedisResult<Reply<Vec<Tuple>>> {
        self.dispatch(
            Operation::new(Command::ZPopMin, convert::tuple_list)
                .key("key", key)
                .arg("count", count),
        )
        .await
    }

    /// Remove and return up to `count` members with the highest scores
    pub async fn zpop_max(
        &mut self,
        key: impl AsRef<[u8]>,
        count: u64,
    ) -> RedisResult<Reply<Vec<Tuple>>> {
        self.dispatch(
            Operation::new(Command::ZPopMax, convert::tuple_list)
                .key("key", key)
                .arg("count", count),
        )
        .await
    }

    /// One page of members and scores starting at `cursor`
    pub async fn zscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: &str,
        argument: &ScanArgument,
    ) -> RedisResult<Reply<ScanResult<Vec<Tuple>>>> {
        self.dispatch(
            Operation::new(Command::ZScan, convert::scan_tuples)
                .key("key", key)
                .arg("cursor", cursor)
                .options("options", argument.to_args()),
        )
        .await
    }
}

fn range<T>(
    command: Command,
    converter: crate::dispatch::Converter<T>,
    key: impl AsRef<[u8]>,
    start: i64,
    stop: i64,
) -> Operation<T> {
    Operation::new(command, converter)
        .key("key", key)
        .arg("start", start)
        .arg("stop", stop)
}

/// `ZINTERSTORE`/`ZUNIONSTORE dest numkeys key.. [WEIGHTS w..] AGGREGATE a`
fn combine<K: AsRef<[u8]>>(
    command: Command,
    destination: impl AsRef<[u8]>,
    keys: &[K],
    weights: Option<&[f64]>,
    aggregate: Aggregate,
) -> Operation<i64> {
    let mut operation = Operation::new(command, convert::integer)
        .key("destination", destination)
        .arg("numkeys", keys.len())
        .keys("keys", keys);
    if let Some(weights) = weights {
        operation = operation.token("WEIGHTS").args("weights", weights);
    }
    operation.token("AGGREGATE").arg("aggregate", aggregate.as_str())
}
