//! Client-side sharding over independent Redis servers
//!
//! Keys are spread over the servers of the connection string with a
//! weighted consistent-hash ring: every server contributes 160 points per
//! unit of weight, named `SHARD-{i}-NODE-{n}` and hashed with MurmurHash64A.
//! A key belongs to the first point at or after its own hash, wrapping
//! around at the end of the ring. The layout matches the one used by Jedis
//! `ShardedJedis`, so both place the same key on the same server.

use crate::connection::RedisConnection;
use crate::driver::{fan_out, Driver, Frame};
use async_trait::async_trait;
use bytes::Bytes;
use redis_bridge_core::{ConnectionConfig, RedisError, RedisResult, RedisUri, RespValue, Topology};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Points each server contributes per unit of weight
pub const POINTS_PER_WEIGHT: u32 = 160;

const MURMUR_SEED: u32 = 0x1234_ABCD;

/// MurmurHash64A as computed by Jedis, with a signed result
pub fn murmur_hash64a(data: &[u8], seed: u32) -> i64 {
    const M: u64 = 0xc6a4_a793_5bd1_e995;
    const R: u32 = 47;

    let mut h = u64::from(seed) ^ (data.len() as u64).wrapping_mul(M);

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let mut block = [0u8; 8];
        block.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(block);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut block = [0u8; 8];
        block[..tail.len()].copy_from_slice(tail);
        h ^= u64::from_le_bytes(block);
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h as i64
}

/// Weighted consistent-hash ring of shard indexes
#[derive(Debug, Clone)]
pub struct ShardRing {
    points: BTreeMap<i64, usize>,
}

impl ShardRing {
    /// Build the ring for shards with these weights
    pub fn new(weights: &[u32]) -> Self {
        let mut points = BTreeMap::new();
        for (shard, weight) in weights.iter().enumerate() {
            for n in 0..POINTS_PER_WEIGHT * weight {
                let name = format!("SHARD-{}-NODE-{}", shard, n);
                points.insert(murmur_hash64a(name.as_bytes(), MURMUR_SEED), shard);
            }
        }
        Self { points }
    }

    /// Shard owning a key
    pub fn shard_for(&self, key: &[u8]) -> Option<usize> {
        let hash = murmur_hash64a(key, MURMUR_SEED);
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, shard)| *shard)
    }

    /// Number of points on the ring
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check whether the ring has no shards
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

struct Shard {
    endpoint: RedisUri,
    connection: Option<RedisConnection>,
}

/// Driver spreading keys over independent servers
pub struct ShardedDriver {
    config: ConnectionConfig,
    shards: Vec<Shard>,
    ring: ShardRing,
}

impl ShardedDriver {
    /// Build the ring from the endpoints of the configuration
    ///
    /// Shards are connected on first use.
    pub async fn connect(config: &ConnectionConfig) -> RedisResult<Self> {
        let endpoints = config.endpoints()?;
        info!("Sharding over {} Redis servers", endpoints.len());
        Ok(Self::from_endpoints(config.clone(), endpoints))
    }

    pub(crate) fn from_endpoints(config: ConnectionConfig, endpoints: Vec<RedisUri>) -> Self {
        let weights: Vec<u32> = endpoints.iter().map(|e| e.weight).collect();
        let ring = ShardRing::new(&weights);
        let shards = endpoints
            .into_iter()
            .map(|endpoint| Shard {
                endpoint,
                connection: None,
            })
            .collect();
        Self {
            config,
            shards,
            ring,
        }
    }

    /// Endpoint owning a key
    pub fn endpoint_for(&self, key: &[u8]) -> Option<&RedisUri> {
        self.ring
            .shard_for(key)
            .and_then(|shard| self.shards.get(shard))
            .map(|shard| &shard.endpoint)
    }

    fn route(&self, keys: &[Bytes]) -> RedisResult<usize> {
        let mut shards = keys.iter().map(|key| self.ring.shard_for(key));
        match shards.next().flatten() {
            Some(first) if shards.all(|shard| shard == Some(first)) => Ok(first),
            _ => Err(RedisError::Config(
                "Keys do not map to a single shard".to_string(),
            )),
        }
    }

    async fn ensure_connection(&mut self, index: usize) -> RedisResult<()> {
        let config = &self.config;
        let shard = self
            .shards
            .get_mut(index)
            .ok_or_else(|| RedisError::Config(format!("No shard {}", index)))?;
        if shard
            .connection
            .as_ref()
            .map_or(true, RedisConnection::is_broken)
        {
            let connection = RedisConnection::connect(&shard.endpoint, config).await?;
            info!("Connected to shard {} at {}", index, shard.endpoint.address());
            shard.connection = Some(connection);
        }
        Ok(())
    }

    async fn connection(&mut self, index: usize) -> RedisResult<&mut RedisConnection> {
        self.ensure_connection(index).await?;
        self.shards
            .get_mut(index)
            .and_then(|shard| shard.connection.as_mut())
            .ok_or_else(|| RedisError::Connection(format!("Shard {} is not connected", index)))
    }

    fn observe<T>(&mut self, index: usize, result: RedisResult<T>) -> RedisResult<T> {
        if let Err(e @ (RedisError::Io(_) | RedisError::Connection(_) | RedisError::Timeout)) =
            &result
        {
            warn!("Dropping connection to shard {}: {}", index, e);
            if let Some(shard) = self.shards.get_mut(index) {
                shard.connection = None;
            }
        }
        result
    }
}

#[async_trait]
impl Driver for ShardedDriver {
    fn topology(&self) -> Topology {
        Topology::Sharded
    }

    /// At least one key, all on the same shard
    fn can_route(&self, keys: &[Bytes]) -> bool {
        self.route(keys).is_ok()
    }

    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
        let index = self.route(&frame.keys)?;
        let result = self.connection(index).await?.execute_frame(&frame).await;
        self.observe(index, result)
    }

    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
        let mut by_shard: HashMap<usize, Vec<usize>> = HashMap::new();
        for (position, frame) in frames.iter().enumerate() {
            let index = self.route(&frame.keys)?;
            self.ensure_connection(index).await?;
            by_shard.entry(index).or_default().push(position);
        }
        debug!("Pipeline spans {} shards", by_shard.len());

        let groups = self
            .shards
            .iter_mut()
            .enumerate()
            .filter_map(|(index, shard)| {
                let positions = by_shard.remove(&index)?;
                shard.connection.as_mut().map(|connection| (connection, positions))
            })
            .collect();
        let result = fan_out(groups, &frames).await;

        if matches!(
            result,
            Err(RedisError::Io(_) | RedisError::Connection(_) | RedisError::Timeout)
        ) {
            // The failing shard is unknown; reconnect all of them lazily
            for shard in &mut self.shards {
                shard.connection = None;
            }
        }
        result
    }
}
