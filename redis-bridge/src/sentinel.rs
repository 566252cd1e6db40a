//! Redis Sentinel support for high availability
//!
//! Sentinels act as a configuration provider: the driver asks them for the
//! address of the current master and then talks to that master like a
//! standalone server. When the master connection fails, the error is
//! returned as is and the next call asks the sentinels again.
//!
//! ```no_run
//! use redis_bridge::{Client, ConnectionConfig, SentinelConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sentinel_config = SentinelConfig::new("mymaster")
//!     .add_sentinel("127.0.0.1:26379")?
//!     .add_sentinel("127.0.0.1:26380")?
//!     .with_password("sentinel_password");
//!
//! let config = ConnectionConfig::new_with_sentinel(sentinel_config);
//! let mut client = Client::connect(config).await?;
//! client.set("key", "value").await?;
//! # Ok(())
//! # }
//! ```

use crate::connection::RedisConnection;
use crate::driver::{node_uri, Driver, Frame, StandaloneDriver};
use crate::pubsub::PubSubListener;
use async_trait::async_trait;
use bytes::Bytes;
use redis_bridge_core::{
    ConnectionConfig, RedisError, RedisResult, RedisUri, RespValue, SentinelConfig,
    SentinelEndpoint, Topology,
};
use tracing::{debug, info, warn};

/// Master address reported by a sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterInfo {
    /// Name the sentinels monitor the master under
    pub name: String,
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl MasterInfo {
    /// Get the address of the master
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Driver for a master discovered through sentinels
pub struct SentinelDriver {
    config: ConnectionConfig,
    sentinel: SentinelConfig,
    master: Option<StandaloneDriver>,
}

impl SentinelDriver {
    /// Resolve the master and connect to it
    ///
    /// # Errors
    ///
    /// Returns an error if no sentinels are configured or none of them
    /// knows the master.
    pub async fn connect(config: &ConnectionConfig) -> RedisResult<Self> {
        let sentinel = config.sentinel.clone().ok_or_else(|| {
            RedisError::Config("Sentinel topology requires a sentinel configuration".to_string())
        })?;
        if sentinel.sentinels.is_empty() {
            return Err(RedisError::Config("No sentinels configured".to_string()));
        }

        let mut driver = Self {
            config: config.clone(),
            sentinel,
            master: None,
        };
        driver.master().await?;
        Ok(driver)
    }

    /// Ask each sentinel in turn for the master address
    pub async fn discover_master(&self) -> RedisResult<MasterInfo> {
        for endpoint in &self.sentinel.sentinels {
            match self.query_sentinel(endpoint).await {
                Ok(Some(master)) => {
                    info!(
                        "Discovered master {} at {} via sentinel {}",
                        master.name,
                        master.address(),
                        endpoint.address()
                    );
                    return Ok(master);
                }
                Ok(None) => debug!(
                    "Sentinel {} does not know master {}",
                    endpoint.address(),
                    self.sentinel.master_name
                ),
                Err(e) => warn!("Failed to query sentinel {}: {}", endpoint.address(), e),
            }
        }

        Err(RedisError::Sentinel(format!(
            "Failed to discover master {} from any sentinel",
            self.sentinel.master_name
        )))
    }

    async fn query_sentinel(&self, endpoint: &SentinelEndpoint) -> RedisResult<Option<MasterInfo>> {
        let mut uri = RedisUri::new(endpoint.host.clone(), endpoint.port);
        uri.password.clone_from(&self.sentinel.password);

        let mut conn = RedisConnection::connect(&uri, &self.config).await?;
        let reply = conn
            .execute(
                "SENTINEL get-master-addr-by-name",
                &[Bytes::copy_from_slice(self.sentinel.master_name.as_bytes())],
            )
            .await?;

        Ok(parse_master_address(reply)?.map(|(host, port)| MasterInfo {
            name: self.sentinel.master_name.clone(),
            host,
            port,
        }))
    }

    async fn master(&mut self) -> RedisResult<&mut StandaloneDriver> {
        // A broken master connection may mean a failover; ask the sentinels again
        if self.master.as_ref().map_or(true, StandaloneDriver::is_broken) {
            let master = self.discover_master().await?;
            let endpoint = node_uri(&master.host, master.port, &self.config);
            let connection = RedisConnection::connect(&endpoint, &self.config).await?;
            self.master = Some(
                StandaloneDriver::from_connection(connection, endpoint, self.config.clone())
                    .with_topology(Topology::Sentinel),
            );
        }

        self.master
            .as_mut()
            .ok_or_else(|| RedisError::Sentinel("No master available".to_string()))
    }

    /// Forget the master after a transport failure
    fn observe<T>(&mut self, result: RedisResult<T>) -> RedisResult<T> {
        if let Err(e @ (RedisError::Io(_) | RedisError::Connection(_) | RedisError::Timeout)) =
            &result
        {
            warn!("Lost master connection ({}); re-resolving on next call", e);
            self.master = None;
        }
        result
    }
}

/// `[host, port]`, or nil when the sentinel does not monitor the master
fn parse_master_address(reply: RespValue) -> RedisResult<Option<(String, u16)>> {
    if reply.is_null() {
        return Ok(None);
    }

    let mut parts = reply.into_array()?.into_iter();
    let (Some(host), Some(port)) = (parts.next(), parts.next()) else {
        return Err(RedisError::Sentinel(
            "Malformed master address reply".to_string(),
        ));
    };
    let port = port.as_int()?;
    let port = u16::try_from(port)
        .map_err(|_| RedisError::Sentinel(format!("Invalid master port {}", port)))?;
    Ok(Some((host.into_string()?, port)))
}

#[async_trait]
impl Driver for SentinelDriver {
    fn topology(&self) -> Topology {
        Topology::Sentinel
    }

    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
        let result = self.master().await?.execute(frame).await;
        self.observe(result)
    }

    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
        let result = self.master().await?.execute_pipeline(frames).await;
        self.observe(result)
    }

    async fn execute_transaction(
        &mut self,
        frames: Vec<Frame>,
    ) -> RedisResult<Option<Vec<RespValue>>> {
        let result = self.master().await?.execute_transaction(frames).await;
        self.observe(result)
    }

    async fn subscribe(
        &mut self,
        frame: Frame,
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        let result = self.master().await?.subscribe(frame, listener).await;
        self.observe(result)
    }
}
