//! Lua scripts addressed by digest
//!
//! A [`Script`] keeps its source together with the SHA1 digest Redis uses
//! to cache it. Invoking it sends `EVALSHA` first and only ships the source
//! when the server answers `NOSCRIPT`.
//!
//! ```no_run
//! use redis_bridge::{convert, Client, ConnectionConfig, Script};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("redis://localhost:6379");
//! let mut client = Client::connect(config).await?;
//!
//! let script = Script::new(r"
//!     local current = tonumber(redis.call('GET', KEYS[1]) or 0)
//!     redis.call('SET', KEYS[1], current + tonumber(ARGV[1]))
//!     return current + tonumber(ARGV[1])
//! ");
//!
//! let total = script
//!     .invoke(&mut client, &["counter"], &[5], convert::integer)
//!     .await?
//!     .into_value()?;
//! println!("counter is now {}", total);
//! # Ok(())
//! # }
//! ```

use crate::client::Client;
use crate::dispatch::{Converter, Reply, ToArg};
use redis_bridge_core::{ExecutionMode, RedisError, RedisResult};
use sha1::{Digest, Sha1};
use tracing::debug;

/// A Lua script and its SHA1 digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    source: String,
    sha: String,
}

impl Script {
    /// Create a new script from Lua source code
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_bridge::Script;
    ///
    /// let script = Script::new("return redis.call('GET', KEYS[1])");
    /// assert_eq!(script.sha().len(), 40);
    /// ```
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let sha = calculate_sha1(&source);
        Self { source, sha }
    }

    /// Lowercase hex SHA1 of the source
    #[must_use]
    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// Lua source
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run the script on `client`
    ///
    /// In direct mode this sends `EVALSHA` and falls back to `EVAL` when
    /// the script is not cached. Inside a pipeline or transaction a
    /// `NOSCRIPT` reply could only be seen after the batch ran, so `EVAL`
    /// is queued instead.
    pub async fn invoke<T, K, A>(
        &self,
        client: &mut Client,
        keys: &[K],
        args: &[A],
        converter: Converter<T>,
    ) -> RedisResult<Reply<T>>
    where
        T: Send + 'static,
        K: AsRef<[u8]>,
        A: ToArg,
    {
        if client.mode() != ExecutionMode::Direct {
            return client.eval(&self.source, keys, args, converter).await;
        }

        match client.eval_sha(&self.sha, keys, args, converter).await {
            Err(RedisError::Server(msg)) if msg.starts_with("NOSCRIPT") => {
                debug!("Script {} not cached, sending source", self.sha);
                client.eval(&self.source, keys, args, converter).await
            }
            other => other,
        }
    }

    /// Cache the script on the server, returning the digest it reports
    pub async fn load(&self, client: &mut Client) -> RedisResult<Reply<String>> {
        client.script_load(&self.source).await
    }
}

fn calculate_sha1(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert;
    use crate::driver::{Driver, Frame};
    use crate::registry::Command;
    use async_trait::async_trait;
    use redis_bridge_core::{RespValue, Topology};
    use std::sync::{Arc, Mutex};

    /// Knows no cached scripts; every EVAL returns 42
    struct EmptyCache {
        sent: Arc<Mutex<Vec<Command>>>,
    }

    #[async_trait]
    impl Driver for EmptyCache {
        fn topology(&self) -> Topology {
            Topology::Standalone
        }

        async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
            self.sent.lock().unwrap().push(frame.command);
            match frame.command {
                Command::EvalSha => Err(RedisError::Server(
                    "NOSCRIPT No matching script. Please use EVAL.".to_string(),
                )),
                _ => Ok(RespValue::Integer(42)),
            }
        }

        async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
            let mut sent = self.sent.lock().unwrap();
            sent.extend(frames.iter().map(|f| f.command));
            Ok(frames.iter().map(|_| RespValue::Integer(42)).collect())
        }
    }

    fn client() -> (Client, Arc<Mutex<Vec<Command>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let client = Client::with_driver(EmptyCache { sent: sent.clone() });
        (client, sent)
    }

    #[test]
    fn test_sha1_calculation() {
        assert_eq!(
            calculate_sha1("hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(Script::new("return 1").sha(), Script::new("return 1").sha());
        assert_ne!(Script::new("return 1").sha(), Script::new("return 2").sha());
    }

    #[tokio::test]
    async fn test_direct_invoke_falls_back_to_eval() {
        let (mut client, sent) = client();
        let script = Script::new("return 42");

        let value = script
            .invoke(&mut client, &["k"], &[] as &[&str], convert::integer)
            .await
            .unwrap()
            .into_value()
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(*sent.lock().unwrap(), vec![Command::EvalSha, Command::Eval]);
    }

    #[tokio::test]
    async fn test_pipelined_invoke_queues_eval() {
        let (mut client, sent) = client();
        let script = Script::new("return 42");

        client.open_pipeline().unwrap();
        let deferred = script
            .invoke(&mut client, &["k"], &["1"], convert::integer)
            .await
            .unwrap()
            .queued()
            .unwrap();
        let mut results = client.close_pipeline().await.unwrap();

        assert_eq!(results.take(deferred).unwrap(), 42);
        assert_eq!(*sent.lock().unwrap(), vec![Command::Eval]);
    }
}
