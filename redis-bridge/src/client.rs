//! High-level Redis client
//!
//! This module provides the [`Client`] session. Every command family funnels
//! through [`Client::dispatch`], which records the invocation, refuses
//! commands the current mode or topology cannot run and then either executes
//! the command or queues it on the open pipeline or transaction.

use crate::cluster::ClusterDriver;
use crate::connection::RedisConnection;
use crate::diagnostics::{InvocationSink, TracingSink};
use crate::dispatch::{Batch, BatchResults, Operation, Reply, TransactionResult};
use crate::driver::{Driver, StandaloneDriver};
use crate::pubsub::PubSubListener;
use crate::registry::Command;
use crate::sentinel::SentinelDriver;
use crate::sharded::ShardedDriver;
use redis_bridge_core::{
    ConnectionConfig, ExecutionMode, NotSupportedReason, RedisError, RedisResult, Topology,
    TopologyMode,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A Redis session
///
/// A session is owned by one task at a time: every operation takes
/// `&mut self`. Wrap it in a `tokio::sync::Mutex` to share it.
pub struct Client {
    driver: Box<dyn Driver>,
    batch: Option<Batch>,
    batches: u64,
    sink: Arc<dyn InvocationSink>,
}

impl Client {
    /// Connect to Redis with the given configuration
    ///
    /// With [`TopologyMode::Auto`] a sentinel configuration selects the
    /// sentinel driver; otherwise the first endpoint is asked whether it
    /// runs in cluster mode.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use redis_bridge::{Client, ConnectionConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = ConnectionConfig::new("redis://localhost:6379");
    ///     let mut client = Client::connect(config).await?;
    ///     client.set("greeting", "hello").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: ConnectionConfig) -> RedisResult<Self> {
        info!("Connecting to Redis...");

        let driver: Box<dyn Driver> = match config.topology_mode {
            TopologyMode::Standalone => Box::new(StandaloneDriver::connect(&config).await?),
            TopologyMode::Sentinel => Box::new(SentinelDriver::connect(&config).await?),
            TopologyMode::Cluster => Box::new(ClusterDriver::connect(&config).await?),
            TopologyMode::Sharded => Box::new(ShardedDriver::connect(&config).await?),
            TopologyMode::Auto if config.sentinel.is_some() => {
                Box::new(SentinelDriver::connect(&config).await?)
            }
            TopologyMode::Auto => {
                let endpoint = config
                    .endpoints()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| RedisError::Config("No endpoints specified".to_string()))?;
                let mut probe = RedisConnection::connect(&endpoint, &config).await?;
                match probe.detect_topology().await? {
                    Topology::Cluster => Box::new(ClusterDriver::connect(&config).await?),
                    _ => Box::new(StandaloneDriver::from_connection(
                        probe,
                        endpoint,
                        config.clone(),
                    )),
                }
            }
        };

        info!("Connected to {} Redis", driver.topology());
        Ok(Self::with_boxed_driver(driver))
    }

    /// Session over an existing driver
    #[must_use]
    pub fn with_driver(driver: impl Driver + 'static) -> Self {
        Self::with_boxed_driver(Box::new(driver))
    }

    fn with_boxed_driver(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            batch: None,
            batches: 0,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostics sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl InvocationSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Deployment shape of the underlying driver
    pub fn topology(&self) -> Topology {
        self.driver.topology()
    }

    /// Current execution mode
    pub fn mode(&self) -> ExecutionMode {
        self.batch
            .as_ref()
            .map_or(ExecutionMode::Direct, Batch::mode)
    }

    /// Number of commands queued on the open pipeline or transaction
    pub fn queued(&self) -> usize {
        self.batch.as_ref().map_or(0, Batch::len)
    }

    /// Issue one operation
    ///
    /// In direct mode the reply is converted at once. In pipelined and
    /// transactional mode the operation is queued and a [`Deferred`] ticket
    /// is returned; the same converter runs when the batch is flushed.
    ///
    /// # Errors
    ///
    /// [`RedisError::NotSupported`] when the command cannot run in the
    /// current mode, against the current topology or on a single node; no
    /// I/O happens in that case. Driver and conversion errors are returned
    /// unchanged.
    ///
    /// [`Deferred`]: crate::dispatch::Deferred
    pub async fn dispatch<T: Send + 'static>(
        &mut self,
        operation: Operation<T>,
    ) -> RedisResult<Reply<T>> {
        self.admit(&operation)?;

        let (frame, converter) = operation.into_parts();
        match self.batch.as_mut() {
            Some(batch) => Ok(Reply::Queued(batch.push(frame, converter))),
            None => {
                let reply = self.driver.execute(frame).await?;
                converter(reply).map(Reply::Ready)
            }
        }
    }

    /// Record the invocation and run the capability checks
    fn admit<T>(&self, operation: &Operation<T>) -> RedisResult<()> {
        let mode = self.mode();
        self.sink.record(&operation.invocation(mode));

        let spec = operation.command().spec();
        if !spec.modes.allows(mode) {
            return Err(RedisError::NotSupported {
                command: spec.name,
                reason: NotSupportedReason::Mode(mode),
            });
        }

        let topology = self.driver.topology();
        if !spec.topologies.allows(topology) {
            return Err(RedisError::NotSupported {
                command: spec.name,
                reason: NotSupportedReason::Topology(topology),
            });
        }

        if !self.driver.can_route(&operation.frame().keys) {
            return Err(RedisError::NotSupported {
                command: spec.name,
                reason: NotSupportedReason::Unroutable,
            });
        }

        Ok(())
    }

    fn begin(&mut self, mode: ExecutionMode) -> RedisResult<()> {
        if let Some(batch) = &self.batch {
            return Err(RedisError::Protocol(format!(
                "Cannot enter {} mode while {}",
                mode,
                batch.mode()
            )));
        }
        self.batches += 1;
        self.batch = Some(Batch::new(self.batches, mode));
        Ok(())
    }

    fn end(&mut self, mode: ExecutionMode) -> RedisResult<Batch> {
        match self.batch.take() {
            Some(batch) if batch.mode() == mode => Ok(batch),
            other => {
                let current = other.as_ref().map_or(ExecutionMode::Direct, Batch::mode);
                self.batch = other;
                Err(RedisError::Protocol(format!(
                    "Not in {} mode (currently {})",
                    mode, current
                )))
            }
        }
    }

    /// Start queueing commands into a pipeline
    pub fn open_pipeline(&mut self) -> RedisResult<()> {
        self.begin(ExecutionMode::Pipelined)
    }

    /// Send the queued commands and convert their replies
    ///
    /// The session is back in direct mode even when sending fails.
    pub async fn close_pipeline(&mut self) -> RedisResult<BatchResults> {
        let mut batch = self.end(ExecutionMode::Pipelined)?;
        if batch.is_empty() {
            return batch.materialize(Vec::new());
        }

        debug!("Flushing pipeline of {} commands", batch.len());
        let replies = self.driver.execute_pipeline(batch.take_frames()).await?;
        batch.materialize(replies)
    }

    /// Drop the queued commands without sending them
    pub fn discard_pipeline(&mut self) -> RedisResult<usize> {
        let batch = self.end(ExecutionMode::Pipelined)?;
        Ok(batch.len())
    }

    /// Start a transaction
    ///
    /// Nothing is sent until [`exec`](Self::exec); `MULTI`, the queued
    /// commands and `EXEC` then go out in one write.
    pub fn multi(&mut self) -> RedisResult<()> {
        if self.batch.is_none() {
            self.admit(&Operation::new(Command::Multi, crate::convert::status_ok))?;
        }
        self.begin(ExecutionMode::Transactional)
    }

    /// Run the transaction
    ///
    /// Returns [`TransactionResult::Aborted`] when a watched key changed.
    pub async fn exec(&mut self) -> RedisResult<TransactionResult> {
        if self.mode() == ExecutionMode::Transactional {
            self.admit(&Operation::new(Command::Exec, crate::convert::identity))?;
        }
        let mut batch = self.end(ExecutionMode::Transactional)?;

        debug!("Executing transaction of {} commands", batch.len());
        match self.driver.execute_transaction(batch.take_frames()).await? {
            Some(replies) => Ok(TransactionResult::Committed(batch.materialize(replies)?)),
            None => {
                info!("Transaction aborted: a watched key changed");
                Ok(TransactionResult::Aborted)
            }
        }
    }

    /// Abandon the transaction
    pub fn discard(&mut self) -> RedisResult<()> {
        if self.mode() == ExecutionMode::Transactional {
            self.admit(&Operation::new(Command::Discard, crate::convert::status_ok))?;
        }
        self.end(ExecutionMode::Transactional).map(drop)
    }

    /// Subscribe to channels and deliver messages to `listener` until it
    /// breaks out of the loop
    pub async fn subscribe<C: AsRef<[u8]>>(
        &mut self,
        channels: &[C],
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        let operation = Operation::new(Command::Subscribe, crate::convert::identity)
            .args("channels", channels.iter().map(|c| c.as_ref()));
        self.admit(&operation)?;
        let (frame, _) = operation.into_parts();
        self.driver.subscribe(frame, listener).await
    }

    /// Subscribe to channel patterns
    pub async fn psubscribe<P: AsRef<[u8]>>(
        &mut self,
        patterns: &[P],
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        let operation = Operation::new(Command::PSubscribe, crate::convert::identity)
            .args("patterns", patterns.iter().map(|p| p.as_ref()));
        self.admit(&operation)?;
        let (frame, _) = operation.into_parts();
        self.driver.subscribe(frame, listener).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert;
    use crate::diagnostics::CommandInvocation;
    use crate::driver::Frame;
    use async_trait::async_trait;
    use bytes::Bytes;
    use redis_bridge_core::RespValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        frames: Vec<Frame>,
        pipelines: usize,
        transactions: usize,
    }

    struct ScriptedDriver {
        topology: Topology,
        calls: Arc<Mutex<Calls>>,
        abort: bool,
    }

    impl ScriptedDriver {
        fn new(topology: Topology) -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    topology,
                    calls: calls.clone(),
                    abort: false,
                },
                calls,
            )
        }

        fn reply(frame: &Frame) -> RespValue {
            match frame.command {
                Command::Incr => RespValue::Integer(1),
                Command::Get => RespValue::Null,
                _ => RespValue::SimpleString("OK".to_string()),
            }
        }
    }

    #[async_trait]
    impl Driver for ScriptedDriver {
        fn topology(&self) -> Topology {
            self.topology
        }

        fn can_route(&self, keys: &[Bytes]) -> bool {
            self.topology != Topology::Sharded || !keys.is_empty()
        }

        async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
            let reply = Self::reply(&frame);
            self.calls.lock().unwrap().frames.push(frame);
            Ok(reply)
        }

        async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
            let mut calls = self.calls.lock().unwrap();
            calls.pipelines += 1;
            let replies = frames.iter().map(Self::reply).collect();
            calls.frames.extend(frames);
            Ok(replies)
        }

        async fn execute_transaction(
            &mut self,
            frames: Vec<Frame>,
        ) -> RedisResult<Option<Vec<RespValue>>> {
            let mut calls = self.calls.lock().unwrap();
            calls.transactions += 1;
            if self.abort {
                return Ok(None);
            }
            let replies = frames.iter().map(Self::reply).collect();
            calls.frames.extend(frames);
            Ok(Some(replies))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingSink(Arc<Mutex<Vec<CommandInvocation>>>);

    impl InvocationSink for RecordingSink {
        fn record(&self, invocation: &CommandInvocation) {
            self.0.lock().unwrap().push(invocation.clone());
        }
    }

    fn incr(key: &str) -> Operation<i64> {
        Operation::new(Command::Incr, convert::integer).key("key", key)
    }

    #[tokio::test]
    async fn test_direct_dispatch_converts_reply() {
        let (driver, calls) = ScriptedDriver::new(Topology::Standalone);
        let mut client = Client::with_driver(driver);

        let value = client.dispatch(incr("a")).await.unwrap().into_value().unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.lock().unwrap().frames.len(), 1);
        assert_eq!(client.mode(), ExecutionMode::Direct);
    }

    #[tokio::test]
    async fn test_invocation_recorded_before_refusal() {
        let (driver, calls) = ScriptedDriver::new(Topology::Standalone);
        let sink = RecordingSink::default();
        let mut client = Client::with_driver(driver).with_sink(sink.clone());

        let op = Operation::new(Command::ClusterKeySlot, convert::integer).arg("key", "k");
        let err = client.dispatch(op).await.unwrap_err();

        assert!(matches!(
            err,
            RedisError::NotSupported {
                command: "CLUSTER KEYSLOT",
                reason: NotSupportedReason::Topology(Topology::Standalone),
            }
        ));
        assert_eq!(calls.lock().unwrap().frames.len(), 0);
        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].command, Command::ClusterKeySlot);
        assert_eq!(recorded[0].arguments.get("key"), Some("k"));
    }

    #[tokio::test]
    async fn test_mode_refusal() {
        let (driver, calls) = ScriptedDriver::new(Topology::Standalone);
        let mut client = Client::with_driver(driver);
        client.open_pipeline().unwrap();

        let op = Operation::new(Command::Publish, convert::integer)
            .arg("channel", "c")
            .arg("message", "m");
        let err = client.dispatch(op).await.unwrap_err();
        assert!(matches!(
            err,
            RedisError::NotSupported {
                reason: NotSupportedReason::Mode(ExecutionMode::Pipelined),
                ..
            }
        ));
        assert_eq!(client.queued(), 0);
        let results = client.close_pipeline().await.unwrap();
        assert!(results.is_empty());
        assert_eq!(calls.lock().unwrap().pipelines, 0);
    }

    #[tokio::test]
    async fn test_unroutable_on_sharded() {
        let (driver, calls) = ScriptedDriver::new(Topology::Sharded);
        let mut client = Client::with_driver(driver);

        let op = Operation::new(Command::MGet, convert::optional_string_list);
        let err = client.dispatch(op).await.unwrap_err();
        assert!(matches!(
            err,
            RedisError::NotSupported {
                reason: NotSupportedReason::Unroutable,
                ..
            }
        ));
        assert!(calls.lock().unwrap().frames.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_round_trip() {
        let (driver, calls) = ScriptedDriver::new(Topology::Standalone);
        let mut client = Client::with_driver(driver);

        client.open_pipeline().unwrap();
        let first = client.dispatch(incr("a")).await.unwrap().queued().unwrap();
        let get = Operation::new(Command::Get, convert::optional_string).key("key", "b");
        let second = client.dispatch(get).await.unwrap().queued().unwrap();
        assert_eq!(client.queued(), 2);
        assert_eq!(calls.lock().unwrap().frames.len(), 0);

        let mut results = client.close_pipeline().await.unwrap();
        assert_eq!(client.mode(), ExecutionMode::Direct);
        assert_eq!(results.take(first).unwrap(), 1);
        assert_eq!(results.take(second).unwrap(), None);
        assert_eq!(calls.lock().unwrap().pipelines, 1);
    }

    #[tokio::test]
    async fn test_invalid_transitions_keep_mode() {
        let (driver, _) = ScriptedDriver::new(Topology::Standalone);
        let mut client = Client::with_driver(driver);

        assert!(matches!(client.exec().await, Err(RedisError::Protocol(_))));
        assert!(matches!(
            client.close_pipeline().await,
            Err(RedisError::Protocol(_))
        ));

        client.multi().unwrap();
        assert!(matches!(client.open_pipeline(), Err(RedisError::Protocol(_))));
        assert!(matches!(
            client.close_pipeline().await,
            Err(RedisError::Protocol(_))
        ));
        assert_eq!(client.mode(), ExecutionMode::Transactional);
        client.discard().unwrap();
        assert_eq!(client.mode(), ExecutionMode::Direct);
    }

    #[tokio::test]
    async fn test_transaction_commit_and_abort() {
        let (driver, calls) = ScriptedDriver::new(Topology::Standalone);
        let mut client = Client::with_driver(driver);

        client.multi().unwrap();
        let ticket = client.dispatch(incr("a")).await.unwrap().queued().unwrap();
        let mut results = client.exec().await.unwrap().committed().unwrap();
        assert_eq!(results.take(ticket).unwrap(), 1);

        let (mut driver, _) = ScriptedDriver::new(Topology::Standalone);
        driver.abort = true;
        let mut client = Client::with_driver(driver);
        client.multi().unwrap();
        let _ = client.dispatch(incr("a")).await.unwrap();
        assert!(client.exec().await.unwrap().is_aborted());
        assert_eq!(client.mode(), ExecutionMode::Direct);

        assert_eq!(calls.lock().unwrap().transactions, 1);
    }

    #[tokio::test]
    async fn test_multi_refused_on_cluster() {
        let (driver, _) = ScriptedDriver::new(Topology::Cluster);
        let mut client = Client::with_driver(driver);
        assert!(client.multi().unwrap_err().is_not_supported());
        assert_eq!(client.mode(), ExecutionMode::Direct);
    }
}
