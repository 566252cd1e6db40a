//! Set commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, ScanArgument, ScanResult};
use std::collections::HashSet;

impl Client {
    /// Add members, returning how many are new
    pub async fn sadd<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SAdd, convert::integer)
                .key("key", key)
                .args("members", members),
        )
        .await
    }

    /// Remove members, returning how many existed
    pub async fn srem<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SRem, convert::integer)
                .key("key", key)
                .args("members", members),
        )
        .await
    }

    /// All members
    pub async fn smembers(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<HashSet<String>>> {
        self.dispatch(Operation::new(Command::SMembers, convert::string_set).key("key", key))
            .await
    }

    /// Check membership
    pub async fn sismember(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl ToArg,
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::SIsMember, convert::boolean)
                .key("key", key)
                .arg("member", member),
        )
        .await
    }

    /// Number of members
    pub async fn scard(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::SCard, convert::integer).key("key", key))
            .await
    }

    /// Remove and return a random member
    pub async fn spop(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::SPop, convert::optional_string).key("key", key))
            .await
    }

    /// A random member, left in place
    pub async fn srand_member(&mut self, key: impl AsRef<[u8]>) -> RedisResult<Reply<Option<String>>> {
        self.dispatch(Operation::new(Command::SRandMember, convert::optional_string).key("key", key))
            .await
    }

    /// Move a member between sets; false if it was not in `source`
    pub async fn smove(
        &mut self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        member: impl ToArg,
    ) -> RedisResult<Reply<bool>> {
        self.dispatch(
            Operation::new(Command::SMove, convert::boolean)
                .key("source", source)
                .key("destination", destination)
                .arg("member", member),
        )
        .await
    }

    /// Members of the first set missing from the others
    pub async fn sdiff<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<HashSet<String>>> {
        self.dispatch(Operation::new(Command::SDiff, convert::string_set).keys("keys", keys))
            .await
    }

    /// Store the difference in `destination`, returning its size
    pub async fn sdiff_store<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SDiffStore, convert::integer)
                .key("destination", destination)
                .keys("keys", keys),
        )
        .await
    }

    /// Members common to all sets
    pub async fn sinter<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<HashSet<String>>> {
        self.dispatch(Operation::new(Command::SInter, convert::string_set).keys("keys", keys))
            .await
    }

    /// Store the intersection in `destination`, returning its size
    pub async fn sinter_store<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SInterStore, convert::integer)
                .key("destination", destination)
                .keys("keys", keys),
        )
        .await
    }

    /// Members of any set
    pub async fn sunion<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<HashSet<String>>> {
        self.dispatch(Operation::new(Command::SUnion, convert::string_set).keys("keys", keys))
            .await
    }

    /// Store the union in `destination`, returning its size
    pub async fn sunion_store<K: AsRef<[u8]>>(
        &mut self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::SUnionStore, convert::integer)
                .key("destination", destination)
                .keys("keys", keys),
        )
        .await
    }

    /// One page of members starting at `cursor`
    pub async fn sscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: &str,
        argument: &ScanArgument,
    ) -> RedisResult<Reply<ScanResult<Vec<String>>>> {
        self.dispatch(
            Operation::new(Command::SScan, convert::scan_strings)
                .key("key", key)
                .arg("cursor", cursor)
                .options("options", argument.to_args()),
        )
        .await
    }
}
