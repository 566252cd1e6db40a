//! Publish and introspection commands
//!
//! Subscribing lives on [`Client::subscribe`] and [`Client::psubscribe`],
//! which hand the connection over to a [`PubSubListener`] until it breaks
//! out of the loop.
//!
//! [`PubSubListener`]: crate::pubsub::PubSubListener

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::RedisResult;
use std::collections::HashMap;

impl Client {
    /// Publish a message, returning how many subscribers received it
    pub async fn publish(
        &mut self,
        channel: impl ToArg,
        message: impl ToArg,
    ) -> RedisResult<Reply<i64>> {
        self.dispatch(
            Operation::new(Command::Publish, convert::integer)
                .arg("channel", channel)
                .arg("message", message),
        )
        .await
    }

    /// Channels with at least one subscriber, optionally filtered by a glob
    pub async fn pubsub_channels(&mut self, pattern: Option<&str>) -> RedisResult<Reply<Vec<String>>> {
        let mut operation = Operation::new(Command::PubSubChannels, convert::string_list);
        if let Some(pattern) = pattern {
            operation = operation.arg("pattern", pattern);
        }
        self.dispatch(operation).await
    }

    /// Subscriber count per channel
    pub async fn pubsub_numsub<C: ToArg>(
        &mut self,
        channels: &[C],
    ) -> RedisResult<Reply<HashMap<String, i64>>> {
        self.dispatch(
            Operation::new(Command::PubSubNumSub, convert::integer_map).args("channels", channels),
        )
        .await
    }

    /// Number of pattern subscriptions
    pub async fn pubsub_numpat(&mut self) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::PubSubNumPat, convert::integer))
            .await
    }
}
