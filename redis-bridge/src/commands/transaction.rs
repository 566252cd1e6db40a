//! Optimistic locking
//!
//! `MULTI`, `EXEC` and `DISCARD` change the session mode and live on
//! [`Client`] itself. `WATCH` only makes sense before `MULTI`, so it runs
//! directly.

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Status};

impl Client {
    /// Watch keys; the next transaction aborts if any of them changes
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use redis_bridge::{Client, ConnectionConfig, TransactionResult};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut client = Client::connect(ConnectionConfig::new("localhost:6379")).await?;
    /// client.watch(&["balance"]).await?;
    /// client.multi()?;
    /// let deferred = client.decr_by("balance", 10).await?.queued();
    /// match client.exec().await? {
    ///     TransactionResult::Committed(mut results) => {
    ///         if let Some(deferred) = deferred {
    ///             println!("new balance {}", results.take(deferred)?);
    ///         }
    ///     }
    ///     TransactionResult::Aborted => println!("balance changed, try again"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn watch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::Watch, convert::status_ok).keys("keys", keys))
            .await
    }

    /// Forget all watched keys
    pub async fn unwatch(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::Unwatch, convert::status_ok))
            .await
    }
}
