//! Redis Cluster support
//!
//! This module provides functionality for Redis Cluster operations including:
//! - Slot calculation using CRC16
//! - MOVED and ASK redirect handling
//! - Cluster topology management
//! - Per-node pipelines

use crate::connection::RedisConnection;
use crate::convert;
use crate::driver::{fan_out, node_uri, Driver, Frame};
use crate::pubsub::{self, PubSubListener};
use async_trait::async_trait;
use bytes::Bytes;
use crc16::*;
use redis_bridge_core::{
    ClusterSlot, ConnectionConfig, RedisError, RedisResult, RespValue, Topology,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Total number of hash slots in Redis Cluster
pub const CLUSTER_SLOTS: u16 = 16384;

/// Calculate the hash slot for a given key
///
/// This implements the Redis Cluster key hashing algorithm:
/// - If the key contains {...}, only the part between the first { and first } is hashed
/// - Otherwise, the entire key is hashed
/// - The hash is CRC16 mod 16384
pub fn calculate_slot(key: &[u8]) -> u16 {
    let hash_key = extract_hash_tag(key);
    State::<XMODEM>::calculate(hash_key) % CLUSTER_SLOTS
}

/// Extract the hash tag from a key
///
/// Hash tags allow you to ensure multiple keys are allocated to the same hash slot.
/// For example: `{user1000}.following` and `{user1000}.followers` will hash to the same slot.
fn extract_hash_tag(key: &[u8]) -> &[u8] {
    if let Some(start) = key.iter().position(|&b| b == b'{') {
        if let Some(end) = key[start + 1..].iter().position(|&b| b == b'}') {
            let end = start + 1 + end;
            // Empty tags hash the whole key
            if end > start + 1 {
                return &key[start + 1..end];
            }
        }
    }
    key
}

/// Slot to master mapping
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    /// Mapping from slot to node address (host, port)
    slot_map: HashMap<u16, (String, u16)>,
    /// Masters in discovery order
    masters: Vec<(String, u16)>,
}

impl ClusterTopology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the node address for a given slot
    pub fn node_for_slot(&self, slot: u16) -> Option<&(String, u16)> {
        self.slot_map.get(&slot)
    }

    /// Get the node address for a given key
    pub fn node_for_key(&self, key: &[u8]) -> Option<&(String, u16)> {
        self.node_for_slot(calculate_slot(key))
    }

    /// First master discovered, for commands without keys
    pub fn first_master(&self) -> Option<&(String, u16)> {
        self.masters.first()
    }

    /// Update the slot mapping when a MOVED redirect occurs
    pub fn update_slot_mapping(&mut self, slot: u16, host: String, port: u16) {
        let node = (host, port);
        if !self.masters.contains(&node) {
            self.masters.push(node.clone());
        }
        self.slot_map.insert(slot, node);
    }

    /// Replace the mapping with a `CLUSTER SLOTS` reply
    pub fn update_from_cluster_slots(&mut self, slots: &[ClusterSlot]) {
        self.slot_map.clear();
        self.masters.clear();

        for entry in slots {
            let node = (entry.master.host.clone(), entry.master.port);
            for slot in entry.range.start..=entry.range.end {
                self.slot_map.insert(slot, node.clone());
            }
            if !self.masters.contains(&node) {
                self.masters.push(node);
            }
        }
    }

    /// Get the number of slots currently mapped
    pub fn mapped_slots_count(&self) -> usize {
        self.slot_map.len()
    }
}

/// Helper to handle MOVED and ASK redirects
pub struct RedirectHandler;

impl RedirectHandler {
    /// Resolve a redirect to `(host, port, asking)`, recording MOVED targets
    /// in the topology
    pub fn handle_redirect(
        topology: &mut ClusterTopology,
        error: &RedisError,
    ) -> RedisResult<(String, u16, bool)> {
        match error {
            RedisError::Moved { slot, host, port } => {
                topology.update_slot_mapping(*slot, host.clone(), *port);
                Ok((host.clone(), *port, false))
            }
            // ASK is temporary, don't update topology
            RedisError::Ask { host, port, .. } => Ok((host.clone(), *port, true)),
            _ => Err(RedisError::Cluster(format!(
                "Not a redirect error: {:?}",
                error
            ))),
        }
    }
}

/// Driver for Redis Cluster
pub struct ClusterDriver {
    config: ConnectionConfig,
    topology: ClusterTopology,
    connections: HashMap<String, RedisConnection>,
    max_redirects: usize,
}

impl ClusterDriver {
    /// Connect to the first reachable seed node and load the slot map
    pub async fn connect(config: &ConnectionConfig) -> RedisResult<Self> {
        info!("Connecting to Redis Cluster");

        let endpoints = config.endpoints()?;
        for endpoint in &endpoints {
            let mut connection = match RedisConnection::connect(endpoint, config).await {
                Ok(connection) => connection,
                Err(e) => {
                    warn!("Failed to connect to cluster node {}: {}", endpoint.address(), e);
                    continue;
                }
            };

            let slots = match connection
                .execute("CLUSTER SLOTS", &[])
                .await
                .and_then(convert::cluster_slots)
            {
                Ok(slots) => slots,
                Err(e) => {
                    warn!("Cluster node {} did not report slots: {}", endpoint.address(), e);
                    continue;
                }
            };
            let mut driver = Self::from_topology(config.clone(), ClusterTopology::new());
            driver.topology.update_from_cluster_slots(&slots);
            info!(
                "Discovered {} masters covering {} slots",
                driver.topology.masters.len(),
                driver.topology.mapped_slots_count()
            );
            driver
                .connections
                .insert(connection.address().to_string(), connection);
            return Ok(driver);
        }

        Err(RedisError::Cluster(
            "Failed to connect to any cluster node".to_string(),
        ))
    }

    pub(crate) fn from_topology(config: ConnectionConfig, topology: ClusterTopology) -> Self {
        let max_redirects = config.max_redirects;
        Self {
            config,
            topology,
            connections: HashMap::new(),
            max_redirects,
        }
    }

    /// Current slot map
    pub fn cluster_topology(&self) -> &ClusterTopology {
        &self.topology
    }

    fn target(&self, frame: &Frame) -> RedisResult<(String, u16)> {
        let slot = frame
            .slot
            .or_else(|| frame.keys.first().map(|key| calculate_slot(key)));
        slot.and_then(|slot| self.topology.node_for_slot(slot))
            .or_else(|| self.topology.first_master())
            .cloned()
            .ok_or_else(|| RedisError::Cluster(format!("No node serves {}", frame.name())))
    }

    async fn ensure_connection(&mut self, host: &str, port: u16) -> RedisResult<String> {
        let address = format!("{}:{}", host, port);
        let usable = self
            .connections
            .get(&address)
            .is_some_and(|connection| !connection.is_broken());
        if !usable {
            let endpoint = node_uri(host, port, &self.config);
            let connection = RedisConnection::connect(&endpoint, &self.config).await?;
            info!("Connected to cluster node {}", address);
            self.connections.insert(address.clone(), connection);
        }
        Ok(address)
    }

    async fn connection(&mut self, host: &str, port: u16) -> RedisResult<&mut RedisConnection> {
        let address = self.ensure_connection(host, port).await?;
        self.connections
            .get_mut(&address)
            .ok_or_else(|| RedisError::Cluster(format!("Lost connection to {}", address)))
    }
}

#[async_trait]
impl Driver for ClusterDriver {
    fn topology(&self) -> Topology {
        Topology::Cluster
    }

    /// Every key must hash to the same slot
    fn can_route(&self, keys: &[Bytes]) -> bool {
        let mut slots = keys.iter().map(|key| calculate_slot(key));
        match slots.next() {
            Some(first) => slots.all(|slot| slot == first),
            None => true,
        }
    }

    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
        let (mut host, mut port) = self.target(&frame)?;
        let mut asking = false;

        for _ in 0..=self.max_redirects {
            let connection = self.connection(&host, port).await?;
            if asking {
                connection.execute("ASKING", &[]).await?;
            }

            let result = connection.execute_frame(&frame).await;
            match result {
                Err(e) if e.is_redirect() => {
                    warn!("{} redirected: {}", frame.name(), e);
                    (host, port, asking) = RedirectHandler::handle_redirect(&mut self.topology, &e)?;
                }
                Err(e @ (RedisError::Io(_) | RedisError::Connection(_) | RedisError::Timeout)) => {
                    self.connections.remove(&format!("{}:{}", host, port));
                    return Err(e);
                }
                other => return other,
            }
        }

        Err(RedisError::MaxRetriesExceeded(self.max_redirects))
    }

    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
        let mut by_node: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, frame) in frames.iter().enumerate() {
            let (host, port) = self.target(frame)?;
            let address = self.ensure_connection(&host, port).await?;
            by_node.entry(address).or_default().push(index);
        }

        let involved: Vec<String> = by_node.keys().cloned().collect();
        let groups = self
            .connections
            .iter_mut()
            .filter_map(|(address, connection)| {
                by_node.remove(address).map(|indexes| (connection, indexes))
            })
            .collect();
        let mut replies = match fan_out(groups, &frames).await {
            Ok(replies) => replies,
            Err(e) => {
                // Sends to the other nodes were dropped mid-exchange
                warn!("Pipeline failed ({}); dropping {} node connections", e, involved.len());
                for address in &involved {
                    self.connections.remove(address);
                }
                return Err(e);
            }
        };

        // Entries answered with a redirect are re-issued one by one
        for (index, reply) in replies.iter_mut().enumerate() {
            let redirected = match reply {
                RespValue::Error(msg) => RedisError::parse_redirect(msg).is_some(),
                _ => false,
            };
            if redirected {
                *reply = match self.execute(frames[index].clone()).await {
                    Ok(value) => value,
                    Err(RedisError::Server(msg)) => RespValue::Error(msg),
                    Err(e) => return Err(e),
                };
            }
        }

        Ok(replies)
    }

    async fn subscribe(
        &mut self,
        frame: Frame,
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        let (host, port) = self.target(&frame)?;
        let connection = self.connection(&host, port).await?;
        pubsub::run(connection, &frame, listener).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Command;
    use redis_bridge_core::{ClusterSlotNode, SlotRange};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Node that answers each request with the next canned reply
    async fn node(replies: Vec<Vec<u8>>) -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            for reply in replies {
                if socket.read(&mut buf).await.unwrap() == 0 {
                    return;
                }
                socket.write_all(&reply).await.unwrap();
            }
        });
        ("127.0.0.1".to_string(), port)
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1:1").with_tcp_keepalive(None)
    }

    #[test]
    fn test_calculate_slot() {
        let slot = calculate_slot(b"mykey");
        assert!(slot < CLUSTER_SLOTS);

        let slot1 = calculate_slot(b"{user1000}.following");
        let slot2 = calculate_slot(b"{user1000}.followers");
        assert_eq!(
            slot1, slot2,
            "Keys with same hash tag should map to same slot"
        );

        // Reference value from the cluster documentation
        assert_eq!(calculate_slot(b"123456789"), 12739);
    }

    #[test]
    fn test_extract_hash_tag() {
        assert_eq!(extract_hash_tag(b"key"), b"key");
        assert_eq!(extract_hash_tag(b"{user}key"), b"user");
        assert_eq!(extract_hash_tag(b"prefix{user}key"), b"user");
        assert_eq!(extract_hash_tag(b"{}"), b"{}");
        assert_eq!(extract_hash_tag(b"no{hash"), b"no{hash");
    }

    #[test]
    fn test_topology_from_cluster_slots() {
        let mut topology = ClusterTopology::new();
        topology.update_from_cluster_slots(&[
            ClusterSlot {
                range: SlotRange::new(0, 8191),
                master: ClusterSlotNode {
                    host: "10.0.0.1".to_string(),
                    port: 7000,
                    id: None,
                },
                replicas: Vec::new(),
            },
            ClusterSlot {
                range: SlotRange::new(8192, 16383),
                master: ClusterSlotNode {
                    host: "10.0.0.2".to_string(),
                    port: 7001,
                    id: None,
                },
                replicas: Vec::new(),
            },
        ]);

        assert_eq!(topology.mapped_slots_count(), 16384);
        assert_eq!(
            topology.node_for_slot(100),
            Some(&("10.0.0.1".to_string(), 7000))
        );
        assert_eq!(
            topology.node_for_key(b"123456789"),
            Some(&("10.0.0.2".to_string(), 7001))
        );
        assert_eq!(
            topology.first_master(),
            Some(&("10.0.0.1".to_string(), 7000))
        );
    }

    #[test]
    fn test_redirect_handler() {
        let mut topology = ClusterTopology::new();

        let error = RedisError::Moved {
            slot: 9916,
            host: "10.90.6.213".to_string(),
            port: 6002,
        };
        let (host, port, asking) = RedirectHandler::handle_redirect(&mut topology, &error).unwrap();
        assert_eq!((host.as_str(), port, asking), ("10.90.6.213", 6002, false));
        assert_eq!(
            topology.node_for_slot(9916),
            Some(&("10.90.6.213".to_string(), 6002))
        );

        let error = RedisError::Ask {
            slot: 100,
            host: "localhost".to_string(),
            port: 7000,
        };
        let (_, _, asking) = RedirectHandler::handle_redirect(&mut topology, &error).unwrap();
        assert!(asking);
        assert!(topology.node_for_slot(100).is_none());

        assert!(RedirectHandler::handle_redirect(&mut topology, &RedisError::Timeout).is_err());
    }

    #[test]
    fn test_can_route_requires_one_slot() {
        let driver = ClusterDriver::from_topology(config(), ClusterTopology::new());
        assert!(driver.can_route(&[]));
        assert!(driver.can_route(&[Bytes::from("{u}.a"), Bytes::from("{u}.b")]));
        assert!(!driver.can_route(&[Bytes::from("123456789"), Bytes::from("mykey")]));
    }

    #[tokio::test]
    async fn test_follows_moved_redirect() {
        let slot = calculate_slot(b"k");
        let (host_b, port_b) = node(vec![b"$1\r\nv\r\n".to_vec()]).await;
        let moved = format!("-MOVED {} {}:{}\r\n", slot, host_b, port_b);
        let (host_a, port_a) = node(vec![moved.into_bytes()]).await;

        let mut topology = ClusterTopology::new();
        topology.update_slot_mapping(slot, host_a, port_a);
        let mut driver = ClusterDriver::from_topology(config(), topology);

        let reply = driver.execute(Frame::new(Command::Get).key("k")).await.unwrap();
        assert_eq!(reply, RespValue::BulkString(Bytes::from("v")));
        assert_eq!(
            driver.cluster_topology().node_for_slot(slot),
            Some(&(host_b, port_b))
        );
    }

    #[tokio::test]
    async fn test_ask_sends_asking_first() {
        let slot = calculate_slot(b"k");
        let (host_b, port_b) = node(vec![b"+OK\r\n".to_vec(), b"$1\r\nv\r\n".to_vec()]).await;
        let ask = format!("-ASK {} {}:{}\r\n", slot, host_b, port_b);
        let (host_a, port_a) = node(vec![ask.into_bytes()]).await;

        let mut topology = ClusterTopology::new();
        topology.update_slot_mapping(slot, host_a.clone(), port_a);
        let mut driver = ClusterDriver::from_topology(config(), topology);

        let reply = driver.execute(Frame::new(Command::Get).key("k")).await.unwrap();
        assert_eq!(reply, RespValue::BulkString(Bytes::from("v")));
        assert_eq!(
            driver.cluster_topology().node_for_slot(slot),
            Some(&(host_a, port_a))
        );
    }

    #[tokio::test]
    async fn test_redirect_limit() {
        let slot = calculate_slot(b"k");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let moved = format!("-MOVED {} 127.0.0.1:{}\r\n", slot, port);
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            while socket.read(&mut buf).await.unwrap_or(0) > 0 {
                if socket.write_all(moved.as_bytes()).await.is_err() {
                    return;
                }
            }
        });

        let mut topology = ClusterTopology::new();
        topology.update_slot_mapping(slot, "127.0.0.1".to_string(), port);
        let mut driver = ClusterDriver::from_topology(config().with_max_redirects(2), topology);

        assert!(matches!(
            driver.execute(Frame::new(Command::Get).key("k")).await,
            Err(RedisError::MaxRetriesExceeded(2))
        ));
    }

    #[tokio::test]
    async fn test_connect_skips_seed_without_slots() {
        let slots = b"*1\r\n*3\r\n:0\r\n:16383\r\n*2\r\n$8\r\n10.0.0.1\r\n:7000\r\n";
        let (_, port_b) = node(vec![slots.to_vec()]).await;
        let (_, port_a) =
            node(vec![b"-ERR This instance has cluster support disabled\r\n".to_vec()]).await;

        let seeds = format!("127.0.0.1:{},127.0.0.1:{}", port_a, port_b);
        let driver = ClusterDriver::connect(&ConnectionConfig::new(seeds).with_tcp_keepalive(None))
            .await
            .unwrap();
        assert_eq!(driver.cluster_topology().mapped_slots_count(), 16384);
        assert!(driver.connections.contains_key(&format!("127.0.0.1:{}", port_b)));
        assert!(!driver.connections.contains_key(&format!("127.0.0.1:{}", port_a)));
    }

    #[tokio::test]
    async fn test_failed_pipeline_drops_involved_connections() {
        // Accepts, then hangs up without answering
        let (host, port) = node(Vec::new()).await;

        let mut topology = ClusterTopology::new();
        topology.update_slot_mapping(calculate_slot(b"k"), host.clone(), port);
        let mut driver = ClusterDriver::from_topology(config(), topology);

        let frames = vec![
            Frame::new(Command::Get).key("k"),
            Frame::new(Command::Get).key("k"),
        ];
        assert!(driver.execute_pipeline(frames).await.is_err());
        assert!(!driver.connections.contains_key(&format!("{}:{}", host, port)));
    }
}
