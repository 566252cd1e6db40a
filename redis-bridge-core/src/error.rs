//! Error types for Redis operations

use std::fmt;
use std::io;
use thiserror::Error;

use crate::mode::{ExecutionMode, Topology};

/// Result type for Redis operations
pub type RedisResult<T> = Result<T, RedisError>;

/// Why a command was refused before reaching the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotSupportedReason {
    /// The command cannot run in the session's current execution mode
    Mode(ExecutionMode),
    /// The command is not offered by this kind of client
    Topology(Topology),
    /// The command's keys cannot be served by a single node
    Unroutable,
}

impl fmt::Display for NotSupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => write!(f, "not supported in {mode} mode"),
            Self::Topology(topology) => write!(f, "not supported by {topology} client"),
            Self::Unroutable => f.write_str("cannot be routed to a single node"),
        }
    }
}

/// Comprehensive error type for Redis operations
#[derive(Error, Debug)]
pub enum RedisError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol parsing error or client misuse of the protocol state
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned an error
    #[error("Server error: {0}")]
    Server(String),

    /// MOVED redirect in cluster mode
    #[error("MOVED redirect: slot {slot} to {host}:{port}")]
    Moved {
        /// Slot number that was moved
        slot: u16,
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// ASK redirect in cluster mode
    #[error("ASK redirect: slot {slot} to {host}:{port}")]
    Ask {
        /// Slot number for temporary redirect
        slot: u16,
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// A reply did not have the shape its converter expects
    #[error("Type conversion error: {0}")]
    Type(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Cluster error
    #[error("Cluster error: {0}")]
    Cluster(String),

    /// Sentinel error
    #[error("Sentinel error: {0}")]
    Sentinel(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Maximum redirect attempts exceeded
    #[error("Maximum retry attempts ({0}) exceeded")]
    MaxRetriesExceeded(usize),

    /// Command refused before any network interaction
    #[error("{command} is {reason}")]
    NotSupported {
        /// Wire name of the refused command
        command: &'static str,
        /// Why it was refused
        reason: NotSupportedReason,
    },
}

impl RedisError {
    /// Build the error for a `-ERR` style reply, recognising redirects
    pub fn from_server_reply(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::parse_redirect(&msg).unwrap_or(RedisError::Server(msg))
    }

    /// Parse a Redis error message to check for MOVED or ASK redirects
    pub fn parse_redirect(msg: &str) -> Option<Self> {
        let (kind, rest) = msg.split_once(' ')?;
        let mut parts = rest.split_whitespace();
        let slot = parts.next()?.parse::<u16>().ok()?;
        let (host, port) = parts.next()?.rsplit_once(':')?;
        let port = port.parse::<u16>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let host = host.to_string();

        // "MOVED 9916 10.90.6.213:6002" / "ASK 9916 10.90.6.213:6002"
        match kind {
            "MOVED" => Some(RedisError::Moved { slot, host, port }),
            "ASK" => Some(RedisError::Ask { slot, host, port }),
            _ => None,
        }
    }

    /// Check if this error is a redirect (MOVED or ASK)
    pub fn is_redirect(&self) -> bool {
        matches!(self, RedisError::Moved { .. } | RedisError::Ask { .. })
    }

    /// Check if this error was raised by the dispatcher's capability checks
    pub fn is_not_supported(&self) -> bool {
        matches!(self, RedisError::NotSupported { .. })
    }

    /// Get the target address from a redirect error
    pub fn redirect_target(&self) -> Option<(String, u16)> {
        match self {
            RedisError::Moved { host, port, .. } | RedisError::Ask { host, port, .. } => {
                Some((host.clone(), *port))
            }
            _ => None,
        }
    }

    /// Get the slot number from a redirect error
    pub fn redirect_slot(&self) -> Option<u16> {
        match self {
            RedisError::Moved { slot, .. } | RedisError::Ask { slot, .. } => Some(*slot),
            _ => None,
        }
    }
}
