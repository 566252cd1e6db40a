//! Configuration types for Redis connections

use crate::error::{RedisError, RedisResult};
use crate::uri::RedisUri;
use std::time::Duration;

/// Topology selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyMode {
    /// Sentinel when a sentinel config is present, otherwise ask the first
    /// endpoint whether cluster mode is enabled
    Auto,
    /// Force standalone mode
    Standalone,
    /// Resolve the master through sentinels
    Sentinel,
    /// Force cluster mode
    Cluster,
    /// Shard keys on the client across every endpoint
    Sharded,
}

/// Sentinel endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelEndpoint {
    /// Sentinel host
    pub host: String,
    /// Sentinel port
    pub port: u16,
}

impl SentinelEndpoint {
    /// Create a new sentinel endpoint
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse from address string (host:port)
    ///
    /// # Errors
    ///
    /// Returns an error if the address format is invalid.
    pub fn from_address(addr: &str) -> RedisResult<Self> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| RedisError::Config(format!("Invalid sentinel address: {addr}")))?;
        let port = port.parse::<u16>().map_err(|_| {
            RedisError::Config(format!("Invalid port in sentinel address: {addr}"))
        })?;

        Ok(Self::new(host, port))
    }

    /// Get the address string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for Redis Sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelConfig {
    /// Master name to resolve
    pub master_name: String,
    /// Sentinels, asked in order
    pub sentinels: Vec<SentinelEndpoint>,
    /// Password for sentinel authentication
    pub password: Option<String>,
}

impl SentinelConfig {
    /// Create a new sentinel configuration
    #[must_use]
    pub fn new(master_name: impl Into<String>) -> Self {
        Self {
            master_name: master_name.into(),
            sentinels: Vec::new(),
            password: None,
        }
    }

    /// Add a sentinel endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not `host:port`.
    pub fn add_sentinel(mut self, addr: impl AsRef<str>) -> RedisResult<Self> {
        self.sentinels
            .push(SentinelEndpoint::from_address(addr.as_ref())?);
        Ok(self)
    }

    /// Set sentinel password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Comma-separated endpoints, each `host:port` or a `redis://` URI
    pub connection_string: String,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Optional ACL user name
    pub username: Option<String>,

    /// Database number (not used in cluster mode)
    pub database: Option<u8>,

    /// Name announced with `CLIENT SETNAME`
    pub client_name: Option<String>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Read/write operation timeout
    pub operation_timeout: Duration,

    /// Enable TCP keepalive
    pub tcp_keepalive: Option<Duration>,

    /// Topology selection
    pub topology_mode: TopologyMode,

    /// Maximum number of redirects followed for one cluster command
    pub max_redirects: usize,

    /// Sentinel settings
    pub sentinel: Option<SentinelConfig>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_string: "redis://localhost:6379".to_string(),
            password: None,
            username: None,
            database: None,
            client_name: None,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(60)),
            topology_mode: TopologyMode::Auto,
            max_redirects: 3,
            sentinel: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with the given connection string
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Create a configuration that resolves its master through sentinels
    #[must_use]
    pub fn new_with_sentinel(sentinel: SentinelConfig) -> Self {
        Self {
            connection_string: String::new(),
            topology_mode: TopologyMode::Sentinel,
            sentinel: Some(sentinel),
            ..Default::default()
        }
    }

    /// Set the password for authentication
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the ACL user name
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the database number
    #[must_use]
    pub const fn with_database(mut self, database: u8) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the client name
    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the operation timeout
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set or disable TCP keepalive
    #[must_use]
    pub const fn with_tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.tcp_keepalive = keepalive;
        self
    }

    /// Set the topology mode
    #[must_use]
    pub const fn with_topology_mode(mut self, mode: TopologyMode) -> Self {
        self.topology_mode = mode;
        self
    }

    /// Set the maximum number of redirects
    #[must_use]
    pub const fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the sentinel configuration
    #[must_use]
    pub fn with_sentinel(mut self, sentinel: SentinelConfig) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Parse connection endpoints from the connection string
    ///
    /// Settings left unset on the builder are filled from each endpoint's
    /// URI; explicit builder settings win.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::Config`] if any endpoint is malformed or none
    /// is given.
    pub fn endpoints(&self) -> RedisResult<Vec<RedisUri>> {
        let endpoints = self
            .connection_string
            .split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(|endpoint| {
                // Only the first endpoint of "redis://h1:1,h2:2" carries the scheme
                let mut uri = RedisUri::parse(endpoint)?;
                if self.password.is_some() {
                    uri.password.clone_from(&self.password);
                }
                if self.username.is_some() {
                    uri.username.clone_from(&self.username);
                }
                if self.database.is_some() {
                    uri.database = self.database;
                }
                if self.client_name.is_some() {
                    uri.client_name.clone_from(&self.client_name);
                }
                Ok(uri)
            })
            .collect::<RedisResult<Vec<_>>>()?;

        if endpoints.is_empty() {
            return Err(RedisError::Config("No endpoints configured".to_string()));
        }
        Ok(endpoints)
    }
}
