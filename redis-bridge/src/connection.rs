//! Connection management and topology detection
//!
//! This module handles low-level TCP connections to Redis servers: the
//! connect handshake, request/reply exchange, pipelines, transactions and
//! automatic topology detection.

use crate::driver::Frame;
use crate::protocol::{RespDecoder, RespEncoder};
use bytes::{Buf, Bytes, BytesMut};
use redis_bridge_core::{
    config::ConnectionConfig,
    error::{RedisError, RedisResult},
    uri::RedisUri,
    value::RespValue,
    Topology,
};
use std::io::Cursor;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// A connection to a Redis server
pub struct RedisConnection {
    stream: TcpStream,
    read_buffer: BytesMut,
    operation_timeout: Duration,
    address: String,
    /// Set from the first write of a request until its last reply is read
    in_flight: bool,
}

impl RedisConnection {
    /// Connect to an endpoint and run the handshake: AUTH, SELECT and
    /// CLIENT SETNAME, each only when configured
    pub async fn connect(endpoint: &RedisUri, config: &ConnectionConfig) -> RedisResult<Self> {
        if endpoint.use_ssl {
            return Err(RedisError::Config(format!(
                "TLS endpoints are not supported: {endpoint}"
            )));
        }

        let addr = endpoint.address();
        debug!("Connecting to Redis at {}", addr);

        let stream = timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| RedisError::Timeout)?
            .map_err(|e| RedisError::Connection(format!("Failed to connect to {}: {}", addr, e)))?;

        // Set TCP keepalive if configured
        let stream = match config.tcp_keepalive {
            Some(keepalive_duration) => {
                let socket = socket2::Socket::from(stream.into_std()?);
                let keepalive = socket2::TcpKeepalive::new().with_time(keepalive_duration);
                socket.set_tcp_keepalive(&keepalive).map_err(|e| {
                    RedisError::Connection(format!("Failed to set TCP keepalive: {}", e))
                })?;
                TcpStream::from_std(socket.into())?
            }
            None => stream,
        };
        stream.set_nodelay(true)?;

        let mut conn = Self {
            stream,
            read_buffer: BytesMut::with_capacity(8192),
            operation_timeout: endpoint.timeout.unwrap_or(config.operation_timeout),
            address: addr,
            in_flight: false,
        };

        if let Some(password) = &endpoint.password {
            conn.authenticate(endpoint.username.as_deref(), password)
                .await?;
        }
        if let Some(db) = endpoint.database.filter(|&db| db != 0) {
            conn.execute("SELECT", &[Bytes::from(db.to_string())])
                .await?;
        }
        if let Some(name) = &endpoint.client_name {
            conn.execute("CLIENT SETNAME", &[Bytes::copy_from_slice(name.as_bytes())])
                .await?;
        }

        Ok(conn)
    }

    /// `host:port` this connection is attached to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Check whether an earlier request failed or was dropped before all
    /// its replies were read
    ///
    /// The reply stream of a broken connection is out of step with its
    /// requests; it must be replaced, not reused.
    pub fn is_broken(&self) -> bool {
        self.in_flight
    }

    /// Mark the start of a request/reply exchange
    pub(crate) fn begin_exchange(&mut self) -> RedisResult<()> {
        if self.in_flight {
            return Err(RedisError::Connection(format!(
                "Connection to {} is out of sync after an interrupted request",
                self.address
            )));
        }
        self.in_flight = true;
        Ok(())
    }

    /// Mark every reply of the current exchange as read
    pub(crate) fn end_exchange(&mut self) {
        self.in_flight = false;
    }

    /// Authenticate with the Redis server
    async fn authenticate(&mut self, username: Option<&str>, password: &str) -> RedisResult<()> {
        debug!("Authenticating with Redis server");
        let mut args = Vec::with_capacity(2);
        if let Some(username) = username {
            args.push(Bytes::copy_from_slice(username.as_bytes()));
        }
        args.push(Bytes::copy_from_slice(password.as_bytes()));

        match self.execute("AUTH", &args).await {
            Ok(RespValue::SimpleString(ref s)) if s == "OK" => Ok(()),
            Ok(other) => Err(RedisError::Auth(format!(
                "Unexpected authentication response: {:?}",
                other
            ))),
            Err(RedisError::Server(e)) => Err(RedisError::Auth(e)),
            Err(e) => Err(e),
        }
    }

    /// Execute a command given by name and return the reply
    ///
    /// An error reply becomes `Err`, with MOVED and ASK parsed into
    /// redirect errors.
    pub async fn execute(&mut self, name: &str, args: &[Bytes]) -> RedisResult<RespValue> {
        self.begin_exchange()?;
        let encoded = RespEncoder::encode_command(name, args);
        self.write(&encoded).await?;
        let response = self.read_timed().await?;
        self.end_exchange();
        into_result(response)
    }

    /// Execute a frame and return the reply
    pub async fn execute_frame(&mut self, frame: &Frame) -> RedisResult<RespValue> {
        self.execute(frame.name(), &frame.args).await
    }

    /// Write every frame at once and read one reply per frame
    ///
    /// Error replies are kept in place.
    pub async fn execute_pipeline(&mut self, frames: &[Frame]) -> RedisResult<Vec<RespValue>> {
        self.begin_exchange()?;
        let mut buf = BytesMut::new();
        for frame in frames {
            RespEncoder::encode_request(frame.name(), &frame.args, &mut buf);
        }
        self.write(&buf).await?;

        let mut replies = Vec::with_capacity(frames.len());
        for _ in frames {
            replies.push(self.read_timed().await?);
        }
        self.end_exchange();
        Ok(replies)
    }

    /// Wrap frames in MULTI/EXEC, send them in one write and return the
    /// EXEC reply
    ///
    /// Returns `Ok(None)` when EXEC replies null because a watched key
    /// changed. Commands rejected while queueing make the server abort
    /// with EXECABORT, which surfaces as [`RedisError::Server`].
    pub async fn execute_transaction(
        &mut self,
        frames: &[Frame],
    ) -> RedisResult<Option<Vec<RespValue>>> {
        self.begin_exchange()?;
        let mut buf = BytesMut::new();
        RespEncoder::encode_request("MULTI", &[], &mut buf);
        for frame in frames {
            RespEncoder::encode_request(frame.name(), &frame.args, &mut buf);
        }
        RespEncoder::encode_request("EXEC", &[], &mut buf);
        self.write(&buf).await?;

        // Every reply is read before any is judged, so an error leaves
        // nothing behind on the socket
        let multi = self.read_timed().await?;
        for frame in frames {
            // "+QUEUED", or an error that EXEC will report as EXECABORT
            if let RespValue::Error(msg) = self.read_timed().await? {
                warn!("{} rejected while queueing: {}", frame.name(), msg);
            }
        }
        let exec = self.read_timed().await?;
        self.end_exchange();

        into_result(multi)?;
        match into_result(exec)? {
            RespValue::Null => Ok(None),
            RespValue::Array(replies) if replies.len() == frames.len() => Ok(Some(replies)),
            other => Err(RedisError::Protocol(format!(
                "Unexpected EXEC reply for {} commands: {:?}",
                frames.len(),
                other
            ))),
        }
    }

    /// Send a frame without waiting for its reply
    pub async fn send(&mut self, frame: &Frame) -> RedisResult<()> {
        let encoded = RespEncoder::encode_command(frame.name(), &frame.args);
        self.write(&encoded).await
    }

    /// Send a command given by name without waiting for its reply
    pub async fn send_command(&mut self, name: &str, args: &[Bytes]) -> RedisResult<()> {
        let encoded = RespEncoder::encode_command(name, args);
        self.write(&encoded).await
    }

    /// Wait for the next pushed value, without the operation timeout
    pub async fn read_push(&mut self) -> RedisResult<RespValue> {
        self.read_response().await
    }

    async fn write(&mut self, bytes: &[u8]) -> RedisResult<()> {
        timeout(self.operation_timeout, self.stream.write_all(bytes))
            .await
            .map_err(|_| RedisError::Timeout)?
            .map_err(RedisError::Io)
    }

    async fn read_timed(&mut self) -> RedisResult<RespValue> {
        timeout(self.operation_timeout, self.read_response())
            .await
            .map_err(|_| RedisError::Timeout)?
    }

    /// Read a complete RESP response from the connection
    async fn read_response(&mut self) -> RedisResult<RespValue> {
        loop {
            // Try to decode from existing buffer
            let mut cursor = Cursor::new(&self.read_buffer[..]);
            if let Some(value) = RespDecoder::decode(&mut cursor)? {
                let pos = cursor.position() as usize;
                self.read_buffer.advance(pos);
                return Ok(value);
            }

            // Need more data - read from socket
            let n = self.stream.read_buf(&mut self.read_buffer).await?;
            if n == 0 {
                return Err(RedisError::Connection(
                    "Connection closed by server".to_string(),
                ));
            }
        }
    }

    /// Detect whether the server runs in cluster mode
    pub async fn detect_topology(&mut self) -> RedisResult<Topology> {
        info!("Detecting Redis topology");

        match self.execute("CLUSTER INFO", &[]).await {
            Ok(reply) => {
                let info = reply.into_string()?;
                if info.contains("cluster_state:") {
                    info!("Detected Redis Cluster");
                    return Ok(Topology::Cluster);
                }
                info!("Detected Standalone Redis");
                Ok(Topology::Standalone)
            }
            Err(RedisError::Server(e)) => {
                // "ERR This instance has cluster support disabled" and friends
                debug!("CLUSTER INFO refused: {}", e);
                info!("Detected Standalone Redis (cluster support disabled)");
                Ok(Topology::Standalone)
            }
            Err(e) => Err(e),
        }
    }
}

/// Turn an error reply into `Err`, parsing redirects
pub(crate) fn into_result(reply: RespValue) -> RedisResult<RespValue> {
    match reply {
        RespValue::Error(msg) => Err(RedisError::from_server_reply(msg)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one client, expect `request` and answer with `reply`
    async fn fake_server(exchanges: Vec<(&'static [u8], &'static [u8])>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            for (request, reply) in exchanges {
                let mut buf = vec![0u8; request.len()];
                socket.read_exact(&mut buf).await.unwrap();
                assert_eq!(buf, request);
                socket.write_all(reply).await.unwrap();
            }
        });
        addr
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("unused").with_tcp_keepalive(None)
    }

    #[test]
    fn test_into_result() {
        assert!(matches!(
            into_result(RespValue::Error("MOVED 1 h:2".to_string())),
            Err(RedisError::Moved { slot: 1, .. })
        ));
        assert!(matches!(
            into_result(RespValue::Error("ERR boom".to_string())),
            Err(RedisError::Server(_))
        ));
        assert_eq!(
            into_result(RespValue::Integer(3)).unwrap(),
            RespValue::Integer(3)
        );
    }

    #[tokio::test]
    async fn test_handshake_and_execute() {
        let addr = fake_server(vec![
            (
                b"*3\r\n$4\r\nAUTH\r\n$3\r\napp\r\n$2\r\npw\r\n",
                b"+OK\r\n",
            ),
            (b"*2\r\n$6\r\nSELECT\r\n$1\r\n2\r\n", b"+OK\r\n"),
            (b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n", b"$1\r\nv\r\n"),
        ])
        .await;

        let endpoint = RedisUri::parse(&format!("redis://app:pw@{addr}/2")).unwrap();
        let mut conn = RedisConnection::connect(&endpoint, &config()).await.unwrap();
        let reply = conn.execute("GET", &[Bytes::from("k")]).await.unwrap();
        assert_eq!(reply, RespValue::BulkString(Bytes::from("v")));
    }

    #[tokio::test]
    async fn test_pipeline_keeps_error_replies_in_place() {
        use crate::registry::Command;

        let addr = fake_server(vec![(
            b"*2\r\n$4\r\nINCR\r\n$1\r\na\r\n*2\r\n$4\r\nINCR\r\n$1\r\nb\r\n",
            b":1\r\n-WRONGTYPE not an integer\r\n",
        )])
        .await;

        let endpoint = RedisUri::parse(&addr).unwrap();
        let mut conn = RedisConnection::connect(&endpoint, &config()).await.unwrap();
        let frames = vec![
            Frame::new(Command::Incr).key("a"),
            Frame::new(Command::Incr).key("b"),
        ];
        let replies = conn.execute_pipeline(&frames).await.unwrap();
        assert_eq!(replies[0], RespValue::Integer(1));
        assert!(replies[1].is_error());
    }

    #[tokio::test]
    async fn test_transaction_aborted_by_watch() {
        use crate::registry::Command;

        let addr = fake_server(vec![(
            b"*1\r\n$5\r\nMULTI\r\n*2\r\n$4\r\nINCR\r\n$1\r\na\r\n*1\r\n$4\r\nEXEC\r\n",
            b"+OK\r\n+QUEUED\r\n*-1\r\n",
        )])
        .await;

        let endpoint = RedisUri::parse(&addr).unwrap();
        let mut conn = RedisConnection::connect(&endpoint, &config()).await.unwrap();
        let frames = vec![Frame::new(Command::Incr).key("a")];
        assert_eq!(conn.execute_transaction(&frames).await.unwrap(), None);
    }

    /// Accept one client and never answer it
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
        });
        addr
    }

    #[tokio::test]
    async fn test_timed_out_request_breaks_connection() {
        let addr = silent_server().await;
        let endpoint = RedisUri::parse(&addr).unwrap();
        let config = config().with_operation_timeout(Duration::from_millis(50));
        let mut conn = RedisConnection::connect(&endpoint, &config).await.unwrap();
        assert!(!conn.is_broken());

        let result = conn.execute("GET", &[Bytes::from("a")]).await;
        assert!(matches!(result, Err(RedisError::Timeout)));
        assert!(conn.is_broken());

        // The late reply to GET a would be read as the reply to GET b
        let result = conn.execute("GET", &[Bytes::from("b")]).await;
        assert!(matches!(result, Err(RedisError::Connection(_))));
    }

    #[tokio::test]
    async fn test_dropped_request_breaks_connection() {
        let addr = silent_server().await;
        let endpoint = RedisUri::parse(&addr).unwrap();
        let mut conn = RedisConnection::connect(&endpoint, &config()).await.unwrap();

        let dropped = timeout(
            Duration::from_millis(50),
            conn.execute("GET", &[Bytes::from("a")]),
        )
        .await;
        assert!(dropped.is_err());
        assert!(conn.is_broken());
    }

    #[tokio::test]
    async fn test_server_error_keeps_connection_usable() {
        let addr = fake_server(vec![
            (b"*2\r\n$4\r\nINCR\r\n$1\r\ns\r\n", b"-ERR not an integer\r\n"),
            (b"*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n", b":1\r\n"),
        ])
        .await;
        let endpoint = RedisUri::parse(&addr).unwrap();
        let mut conn = RedisConnection::connect(&endpoint, &config()).await.unwrap();

        let result = conn.execute("INCR", &[Bytes::from("s")]).await;
        assert!(matches!(result, Err(RedisError::Server(_))));
        assert!(!conn.is_broken());
        let reply = conn.execute("INCR", &[Bytes::from("n")]).await.unwrap();
        assert_eq!(reply, RespValue::Integer(1));
    }

    #[tokio::test]
    async fn test_tls_endpoint_is_refused() {
        let endpoint = RedisUri::parse("rediss://localhost:6380").unwrap();
        assert!(matches!(
            RedisConnection::connect(&endpoint, &config()).await,
            Err(RedisError::Config(_))
        ));
    }
}
