//! The driver seam
//!
//! A [`Driver`] owns the network side of a session: it executes single
//! frames, whole pipelines and whole transactions, and runs subscription
//! loops. The dispatcher only decides *whether* and *when* a frame goes to
//! the driver; routing and redirects stay behind this trait.

use crate::connection::RedisConnection;
use crate::pubsub::{self, PubSubListener};
use crate::registry::Command;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::try_join_all;
use redis_bridge_core::{
    ConnectionConfig, NotSupportedReason, RedisError, RedisResult, RedisUri, RespValue, Topology,
};
use tracing::{info, warn};

/// One command ready for the wire, with the keys used to route it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command being sent
    pub command: Command,
    /// Arguments after the command words
    pub args: Vec<Bytes>,
    /// Keys the command touches
    pub keys: Vec<Bytes>,
    /// Explicit cluster slot for slot-addressed commands
    pub slot: Option<u16>,
}

impl Frame {
    /// Frame without arguments
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            args: Vec::new(),
            keys: Vec::new(),
            slot: None,
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a key, both as argument and as routing key
    #[must_use]
    pub fn key(mut self, key: impl Into<Bytes>) -> Self {
        let key = key.into();
        self.args.push(key.clone());
        self.keys.push(key);
        self
    }

    /// Wire name of the command
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.command.name()
    }
}

/// Network side of a session
#[async_trait]
pub trait Driver: Send {
    /// Deployment shape this driver talks to
    fn topology(&self) -> Topology;

    /// Check whether a command on these keys can be served by one node
    fn can_route(&self, _keys: &[Bytes]) -> bool {
        true
    }

    /// Execute one frame
    ///
    /// Error replies come back as `Err`: redirects as
    /// [`RedisError::Moved`]/[`RedisError::Ask`], the rest as
    /// [`RedisError::Server`].
    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue>;

    /// Execute frames as one pipeline, replies in submission order
    ///
    /// Error replies stay in place as [`RespValue::Error`]; only transport
    /// failures fail the whole call.
    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>>;

    /// Execute frames between `MULTI` and `EXEC`
    ///
    /// `Ok(None)` means the transaction was aborted because a watched key
    /// changed.
    async fn execute_transaction(
        &mut self,
        frames: Vec<Frame>,
    ) -> RedisResult<Option<Vec<RespValue>>> {
        drop(frames);
        Err(RedisError::NotSupported {
            command: Command::Multi.name(),
            reason: NotSupportedReason::Topology(self.topology()),
        })
    }

    /// Send a subscribe frame and deliver pushed messages to `listener`
    /// until every subscription is gone
    async fn subscribe(
        &mut self,
        frame: Frame,
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        let _ = listener;
        Err(RedisError::NotSupported {
            command: frame.name(),
            reason: NotSupportedReason::Topology(self.topology()),
        })
    }
}

/// Driver for a single Redis server
///
/// A request that fails with a transport error or is dropped part-way
/// leaves the connection broken; the next call reconnects to the same
/// endpoint before sending anything.
pub struct StandaloneDriver {
    connection: RedisConnection,
    endpoint: RedisUri,
    config: ConnectionConfig,
    topology: Topology,
}

impl StandaloneDriver {
    /// Connect to the first endpoint of the configuration
    pub async fn connect(config: &ConnectionConfig) -> RedisResult<Self> {
        let endpoint = config
            .endpoints()?
            .into_iter()
            .next()
            .ok_or_else(|| RedisError::Config("No endpoints configured".to_string()))?;
        let connection = RedisConnection::connect(&endpoint, config).await?;
        info!("Connected to standalone Redis at {}", endpoint.address());
        Ok(Self::from_connection(connection, endpoint, config.clone()))
    }

    /// Wrap an established connection to `endpoint`
    #[must_use]
    pub fn from_connection(
        connection: RedisConnection,
        endpoint: RedisUri,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            connection,
            endpoint,
            config,
            topology: Topology::Standalone,
        }
    }

    /// Report a different topology, for masters resolved through sentinels
    #[must_use]
    pub(crate) fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Check whether the next call has to reconnect first
    pub(crate) fn is_broken(&self) -> bool {
        self.connection.is_broken()
    }

    async fn connection(&mut self) -> RedisResult<&mut RedisConnection> {
        if self.connection.is_broken() {
            warn!(
                "Reconnecting to {} after an interrupted request",
                self.endpoint.address()
            );
            self.connection = RedisConnection::connect(&self.endpoint, &self.config).await?;
        }
        Ok(&mut self.connection)
    }
}

#[async_trait]
impl Driver for StandaloneDriver {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
        self.connection().await?.execute_frame(&frame).await
    }

    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
        self.connection().await?.execute_pipeline(&frames).await
    }

    async fn execute_transaction(
        &mut self,
        frames: Vec<Frame>,
    ) -> RedisResult<Option<Vec<RespValue>>> {
        self.connection().await?.execute_transaction(&frames).await
    }

    async fn subscribe(
        &mut self,
        frame: Frame,
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        pubsub::run(self.connection().await?, &frame, listener).await
    }
}

/// Send each group of frames on its own connection concurrently and put the
/// replies back in submission order
pub(crate) async fn fan_out(
    groups: Vec<(&mut RedisConnection, Vec<usize>)>,
    frames: &[Frame],
) -> RedisResult<Vec<RespValue>> {
    let sends = groups.into_iter().map(|(connection, indexes)| async move {
        let batch: Vec<Frame> = indexes.iter().map(|&i| frames[i].clone()).collect();
        let replies = connection.execute_pipeline(&batch).await?;
        Ok::<_, RedisError>((indexes, replies))
    });

    let mut ordered: Vec<Option<RespValue>> = vec![None; frames.len()];
    for (indexes, replies) in try_join_all(sends).await? {
        if indexes.len() != replies.len() {
            return Err(RedisError::Protocol(format!(
                "Expected {} pipeline replies, got {}",
                indexes.len(),
                replies.len()
            )));
        }
        for (index, reply) in indexes.into_iter().zip(replies) {
            ordered[index] = Some(reply);
        }
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, reply)| {
            reply.ok_or_else(|| RedisError::Protocol(format!("No reply for pipeline entry {index}")))
        })
        .collect()
}

/// Endpoint for a discovered node, carrying the configured credentials
pub(crate) fn node_uri(host: &str, port: u16, config: &ConnectionConfig) -> RedisUri {
    let mut uri = RedisUri::new(host, port);
    uri.password.clone_from(&config.password);
    uri.username.clone_from(&config.username);
    uri.database = config.database;
    uri.client_name.clone_from(&config.client_name);
    uri
}
