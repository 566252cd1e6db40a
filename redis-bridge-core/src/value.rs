//! RESP (REdis Serialization Protocol) value types

use crate::error::{RedisError, RedisResult};
use bytes::Bytes;

/// RESP protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple string: +OK\r\n
    SimpleString(String),
    /// Error: -ERR message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n
    BulkString(Bytes),
    /// Null bulk string or null array: $-1\r\n, *-1\r\n
    Null,
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Short name of the RESP type, used in conversion errors
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(_) => "bulk string",
            RespValue::Null => "null",
            RespValue::Array(_) => "array",
        }
    }

    /// Build the conversion error for a reply of the wrong shape
    #[must_use]
    pub fn unexpected(&self, expected: &str) -> RedisError {
        RedisError::Type(format!("expected {expected}, got {}", self.kind()))
    }

    /// Convert to a string if possible
    pub fn as_string(&self) -> RedisResult<String> {
        match self {
            RespValue::SimpleString(s) => Ok(s.clone()),
            RespValue::BulkString(b) => std::str::from_utf8(b)
                .map(str::to_owned)
                .map_err(|e| RedisError::Type(format!("Invalid UTF-8: {e}"))),
            _ => Err(self.unexpected("string")),
        }
    }

    /// Convert into a string, consuming the value
    pub fn into_string(self) -> RedisResult<String> {
        match self {
            RespValue::SimpleString(s) => Ok(s),
            RespValue::BulkString(b) => String::from_utf8(b.to_vec())
                .map_err(|e| RedisError::Type(format!("Invalid UTF-8: {e}"))),
            other => Err(other.unexpected("string")),
        }
    }

    /// Convert to an integer if possible
    pub fn as_int(&self) -> RedisResult<i64> {
        match self {
            RespValue::Integer(i) => Ok(*i),
            RespValue::BulkString(b) => std::str::from_utf8(b)
                .map_err(|e| RedisError::Type(format!("Invalid UTF-8: {e}")))?
                .parse::<i64>()
                .map_err(|e| RedisError::Type(format!("Cannot parse integer: {e}"))),
            _ => Err(self.unexpected("integer")),
        }
    }

    /// Convert to a float; Redis sends doubles as bulk strings
    pub fn as_float(&self) -> RedisResult<f64> {
        match self {
            RespValue::Integer(i) => Ok(*i as f64),
            RespValue::BulkString(_) | RespValue::SimpleString(_) => {
                let text = self.as_string()?;
                match text.as_str() {
                    "inf" | "+inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    _ => text
                        .parse::<f64>()
                        .map_err(|e| RedisError::Type(format!("Cannot parse float: {e}"))),
                }
            }
            _ => Err(self.unexpected("float")),
        }
    }

    /// Convert to bytes if possible
    pub fn as_bytes(&self) -> RedisResult<Bytes> {
        match self {
            RespValue::BulkString(b) => Ok(b.clone()),
            RespValue::SimpleString(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            _ => Err(self.unexpected("bytes")),
        }
    }

    /// Convert into bytes, consuming the value
    pub fn into_bytes(self) -> RedisResult<Bytes> {
        match self {
            RespValue::BulkString(b) => Ok(b),
            RespValue::SimpleString(s) => Ok(Bytes::from(s.into_bytes())),
            other => Err(other.unexpected("bytes")),
        }
    }

    /// Convert to an array if possible
    pub fn as_array(&self) -> RedisResult<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Ok(arr.clone()),
            _ => Err(self.unexpected("array")),
        }
    }

    /// Convert into an array, consuming the value
    pub fn into_array(self) -> RedisResult<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Ok(arr),
            other => Err(other.unexpected("array")),
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Extract error message if this is an error
    pub fn into_error(self) -> Option<String> {
        match self {
            RespValue::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        RespValue::BulkString(Bytes::from(s.into_bytes()))
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for RespValue {
    fn from(b: &[u8]) -> Self {
        RespValue::BulkString(Bytes::copy_from_slice(b))
    }
}

impl From<i64> for RespValue {
    fn from(i: i64) -> Self {
        RespValue::Integer(i)
    }
}

impl From<Vec<u8>> for RespValue {
    fn from(b: Vec<u8>) -> Self {
        RespValue::BulkString(Bytes::from(b))
    }
}

impl From<Bytes> for RespValue {
    fn from(b: Bytes) -> Self {
        RespValue::BulkString(b)
    }
}
