//! Pub/Sub subscription loop
//!
//! A subscription takes over its connection: after `SUBSCRIBE` or
//! `PSUBSCRIBE` the server only pushes events. [`run`] reads them on the
//! caller's task and hands each one to a [`PubSubListener`] until every
//! subscription is gone.
//!
//! ```no_run
//! use redis_bridge::{Client, ConnectionConfig, PubSubMessage};
//! use std::ops::ControlFlow;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = Client::connect(ConnectionConfig::new("redis://localhost:6379")).await?;
//!
//! let mut received = 0;
//! let mut listener = |message: PubSubMessage| {
//!     println!("{}: {:?}", message.channel, message.payload);
//!     received += 1;
//!     if received == 10 {
//!         ControlFlow::Break(())
//!     } else {
//!         ControlFlow::Continue(())
//!     }
//! };
//! client.subscribe(&["news"], &mut listener).await?;
//! # Ok(())
//! # }
//! ```

use crate::connection::RedisConnection;
use crate::driver::Frame;
use crate::registry::Command;
use bytes::Bytes;
use redis_bridge_core::{RedisError, RedisResult, RespValue};
use std::ops::ControlFlow;
use tracing::debug;

/// A message received from a Redis channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    /// The channel the message was received on
    pub channel: String,
    /// The message payload
    pub payload: Bytes,
    /// The pattern that matched (for pattern subscriptions)
    pub pattern: Option<String>,
}

impl PubSubMessage {
    /// Payload as text, replacing invalid UTF-8
    #[must_use]
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Receives the events of a subscription
///
/// Returning [`ControlFlow::Break`] from any callback unsubscribes from
/// everything; the loop ends once the server confirms.
pub trait PubSubListener {
    /// A message was published on a subscribed channel or pattern
    fn on_message(&mut self, message: PubSubMessage) -> ControlFlow<()>;

    /// The server confirmed a subscription; `count` is the number of active
    /// subscriptions
    fn on_subscribe(&mut self, channel: &str, count: i64) -> ControlFlow<()> {
        debug!("Subscribed to {} ({} active)", channel, count);
        ControlFlow::Continue(())
    }

    /// The server confirmed an unsubscription
    fn on_unsubscribe(&mut self, channel: &str, count: i64) {
        debug!("Unsubscribed from {} ({} active)", channel, count);
    }
}

impl<F> PubSubListener for F
where
    F: FnMut(PubSubMessage) -> ControlFlow<()>,
{
    fn on_message(&mut self, message: PubSubMessage) -> ControlFlow<()> {
        self(message)
    }
}

/// One event pushed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PubSubEvent {
    Subscribe { channel: String, count: i64 },
    Unsubscribe { channel: String, count: i64 },
    Message(PubSubMessage),
}

impl PubSubEvent {
    /// Parse a pushed array such as `["message", channel, payload]`
    pub(crate) fn parse(value: RespValue) -> RedisResult<Self> {
        let mut parts = value.into_array()?.into_iter();
        let kind = next_part(&mut parts)?.into_string()?;

        match kind.as_str() {
            "subscribe" | "psubscribe" => Ok(Self::Subscribe {
                channel: next_part(&mut parts)?.into_string()?,
                count: next_part(&mut parts)?.as_int()?,
            }),
            "unsubscribe" | "punsubscribe" => Ok(Self::Unsubscribe {
                channel: match next_part(&mut parts)? {
                    RespValue::Null => String::new(),
                    other => other.into_string()?,
                },
                count: next_part(&mut parts)?.as_int()?,
            }),
            "message" => Ok(Self::Message(PubSubMessage {
                channel: next_part(&mut parts)?.into_string()?,
                payload: next_part(&mut parts)?.into_bytes()?,
                pattern: None,
            })),
            "pmessage" => {
                let pattern = next_part(&mut parts)?.into_string()?;
                Ok(Self::Message(PubSubMessage {
                    channel: next_part(&mut parts)?.into_string()?,
                    payload: next_part(&mut parts)?.into_bytes()?,
                    pattern: Some(pattern),
                }))
            }
            other => Err(RedisError::Protocol(format!(
                "Unexpected pub/sub event: {other}"
            ))),
        }
    }
}

fn next_part(parts: &mut impl Iterator<Item = RespValue>) -> RedisResult<RespValue> {
    parts
        .next()
        .ok_or_else(|| RedisError::Protocol("Truncated pub/sub event".to_string()))
}

/// Send a subscribe frame and feed pushed events to `listener` until the
/// server reports no remaining subscriptions
pub(crate) async fn run(
    connection: &mut RedisConnection,
    frame: &Frame,
    listener: &mut (dyn PubSubListener + Send),
) -> RedisResult<()> {
    let unsubscribe = match frame.command {
        Command::PSubscribe => "PUNSUBSCRIBE",
        _ => "UNSUBSCRIBE",
    };
    connection.begin_exchange()?;
    connection.send(frame).await?;

    let mut stopping = false;
    loop {
        let event = match connection.read_push().await? {
            RespValue::Error(msg) => return Err(RedisError::from_server_reply(msg)),
            value => PubSubEvent::parse(value)?,
        };

        let flow = match event {
            PubSubEvent::Subscribe { channel, count } => listener.on_subscribe(&channel, count),
            PubSubEvent::Unsubscribe { channel, count } => {
                listener.on_unsubscribe(&channel, count);
                if count == 0 {
                    connection.end_exchange();
                    return Ok(());
                }
                ControlFlow::Continue(())
            }
            PubSubEvent::Message(message) if !stopping => listener.on_message(message),
            PubSubEvent::Message(_) => ControlFlow::Continue(()),
        };

        if flow.is_break() && !stopping {
            debug!("Listener stopped, sending {}", unsubscribe);
            stopping = true;
            connection.send_command(unsubscribe, &[]).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(parts: &[&str]) -> RespValue {
        RespValue::Array(parts.iter().map(|p| RespValue::from(*p)).collect())
    }

    #[test]
    fn test_parse_message() {
        let event = PubSubEvent::parse(push(&["message", "news", "hello"])).unwrap();
        assert_eq!(
            event,
            PubSubEvent::Message(PubSubMessage {
                channel: "news".to_string(),
                payload: Bytes::from("hello"),
                pattern: None,
            })
        );
    }

    #[test]
    fn test_parse_pmessage() {
        let event = PubSubEvent::parse(push(&["pmessage", "n*", "news", "hi"])).unwrap();
        match event {
            PubSubEvent::Message(message) => {
                assert_eq!(message.pattern.as_deref(), Some("n*"));
                assert_eq!(message.channel, "news");
                assert_eq!(message.payload_str(), "hi");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_parse_subscription_counts() {
        let value = RespValue::Array(vec![
            RespValue::from("subscribe"),
            RespValue::from("news"),
            RespValue::Integer(1),
        ]);
        assert_eq!(
            PubSubEvent::parse(value).unwrap(),
            PubSubEvent::Subscribe {
                channel: "news".to_string(),
                count: 1
            }
        );

        let value = RespValue::Array(vec![
            RespValue::from("unsubscribe"),
            RespValue::Null,
            RespValue::Integer(0),
        ]);
        assert_eq!(
            PubSubEvent::parse(value).unwrap(),
            PubSubEvent::Unsubscribe {
                channel: String::new(),
                count: 0
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PubSubEvent::parse(push(&["message", "news"])).is_err());
        assert!(PubSubEvent::parse(push(&["pong"])).is_err());
        assert!(PubSubEvent::parse(RespValue::Integer(1)).is_err());
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        let mut listener = |message: PubSubMessage| {
            seen.push(message.channel);
            ControlFlow::Break(())
        };
        let flow = listener.on_message(PubSubMessage {
            channel: "a".to_string(),
            payload: Bytes::new(),
            pattern: None,
        });
        assert!(flow.is_break());
        assert!(listener.on_subscribe("a", 1).is_continue());
        assert_eq!(seen, vec!["a".to_string()]);
    }
}
