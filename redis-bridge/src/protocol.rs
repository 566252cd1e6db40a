//! RESP2 protocol implementation
//!
//! This module implements the Redis Serialization Protocol (RESP2) for
//! encoding requests and decoding replies.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use redis_bridge_core::{
    error::{RedisError, RedisResult},
    value::RespValue,
};
use std::io::Cursor;

const CRLF: &[u8] = b"\r\n";

/// Encodes RESP values and requests into bytes
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a RESP value into a buffer
    pub fn encode(value: &RespValue, buf: &mut BytesMut) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                buf.put_slice(e.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(data) => Self::encode_bulk(data, buf),
            RespValue::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(arr) => {
                Self::encode_len(b'*', arr.len(), buf);
                for item in arr {
                    Self::encode(item, buf);
                }
            }
        }
    }

    /// Encode a request: the command's words followed by its arguments, all
    /// as bulk strings
    ///
    /// `name` may hold several words, e.g. `"CLUSTER KEYSLOT"`.
    pub fn encode_request(name: &str, args: &[Bytes], buf: &mut BytesMut) {
        let words: Vec<&str> = name.split_whitespace().collect();
        Self::encode_len(b'*', words.len() + args.len(), buf);
        for word in words {
            Self::encode_bulk(word.as_bytes(), buf);
        }
        for arg in args {
            Self::encode_bulk(arg, buf);
        }
    }

    /// Encode a single request into a fresh buffer
    pub fn encode_command(name: &str, args: &[Bytes]) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_request(name, args, &mut buf);
        buf.freeze()
    }

    fn encode_bulk(data: &[u8], buf: &mut BytesMut) {
        Self::encode_len(b'$', data.len(), buf);
        buf.put_slice(data);
        buf.put_slice(CRLF);
    }

    fn encode_len(marker: u8, len: usize, buf: &mut BytesMut) {
        buf.put_u8(marker);
        buf.put_slice(len.to_string().as_bytes());
        buf.put_slice(CRLF);
    }
}

/// Decodes RESP values from bytes
pub struct RespDecoder;

impl RespDecoder {
    /// Decode a RESP value from a buffer
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete value;
    /// the caller keeps the bytes and retries after reading more.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        if !buf.has_remaining() {
            return Ok(None);
        }

        let type_byte = buf.chunk()[0];
        buf.advance(1);

        match type_byte {
            b'+' => Ok(Self::read_text(buf)?.map(RespValue::SimpleString)),
            b'-' => Ok(Self::read_text(buf)?.map(RespValue::Error)),
            b':' => Self::decode_integer(buf),
            b'$' => Self::decode_bulk_string(buf),
            b'*' => Self::decode_array(buf),
            _ => Err(RedisError::Protocol(format!(
                "Invalid RESP type byte: {}",
                type_byte as char
            ))),
        }
    }

    fn decode_integer(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        Ok(Self::read_number(buf, "integer")?.map(RespValue::Integer))
    }

    fn decode_bulk_string(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        let len = match Self::read_number(buf, "bulk string length")? {
            Some(len) => len,
            None => return Ok(None),
        };

        if len == -1 {
            return Ok(Some(RespValue::Null));
        }
        let len = usize::try_from(len)
            .map_err(|_| RedisError::Protocol(format!("Invalid bulk string length: {len}")))?;

        // Payload plus trailing CRLF
        if buf.remaining() < len + 2 {
            return Ok(None);
        }

        let data = Bytes::copy_from_slice(&buf.chunk()[..len]);
        buf.advance(len);
        if buf.chunk()[..2] != *CRLF {
            return Err(RedisError::Protocol(
                "Bulk string not terminated by CRLF".to_string(),
            ));
        }
        buf.advance(2);

        Ok(Some(RespValue::BulkString(data)))
    }

    fn decode_array(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        let len = match Self::read_number(buf, "array length")? {
            Some(len) => len,
            None => return Ok(None),
        };

        if len == -1 {
            return Ok(Some(RespValue::Null));
        }
        let len = usize::try_from(len)
            .map_err(|_| RedisError::Protocol(format!("Invalid array length: {len}")))?;

        let mut arr = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            match Self::decode(buf)? {
                Some(value) => arr.push(value),
                None => return Ok(None),
            }
        }

        Ok(Some(RespValue::Array(arr)))
    }

    fn read_number(buf: &mut Cursor<&[u8]>, what: &str) -> RedisResult<Option<i64>> {
        match Self::read_text(buf)? {
            Some(text) => text
                .parse::<i64>()
                .map(Some)
                .map_err(|e| RedisError::Protocol(format!("Invalid {what}: {e}"))),
            None => Ok(None),
        }
    }

    fn read_text(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<String>> {
        match Self::read_line(buf) {
            Some(line) => String::from_utf8(line)
                .map(Some)
                .map_err(|e| RedisError::Protocol(format!("Invalid UTF-8: {e}"))),
            None => Ok(None),
        }
    }

    fn read_line(buf: &mut Cursor<&[u8]>) -> Option<Vec<u8>> {
        let start = buf.position() as usize;
        let slice = buf.get_ref();

        let end = slice[start..]
            .windows(2)
            .position(|pair| pair == CRLF)
            .map(|offset| start + offset)?;
        let line = slice[start..end].to_vec();
        buf.set_position((end + 2) as u64);
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Option<RespValue> {
        let mut cursor = Cursor::new(data);
        RespDecoder::decode(&mut cursor).unwrap()
    }

    #[test]
    fn test_encode_simple_values() {
        let mut buf = BytesMut::new();
        RespEncoder::encode(&RespValue::SimpleString("OK".to_string()), &mut buf);
        RespEncoder::encode(&RespValue::Error("ERR unknown".to_string()), &mut buf);
        RespEncoder::encode(&RespValue::Integer(-7), &mut buf);
        RespEncoder::encode(&RespValue::Null, &mut buf);
        assert_eq!(&buf[..], b"+OK\r\n-ERR unknown\r\n:-7\r\n$-1\r\n");
    }

    #[test]
    fn test_encode_array() {
        let mut buf = BytesMut::new();
        let value = RespValue::Array(vec![
            RespValue::BulkString(Bytes::from("foo")),
            RespValue::BulkString(Bytes::from("bar")),
        ]);
        RespEncoder::encode(&value, &mut buf);
        assert_eq!(&buf[..], b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
    }

    #[test]
    fn test_encode_command() {
        let bytes = RespEncoder::encode_command("GET", &[Bytes::from("mykey")]);
        assert_eq!(&bytes[..], b"*2\r\n$3\r\nGET\r\n$5\r\nmykey\r\n");
    }

    #[test]
    fn test_encode_multi_word_command() {
        let bytes = RespEncoder::encode_command("CLUSTER KEYSLOT", &[Bytes::from("k")]);
        assert_eq!(
            &bytes[..],
            b"*3\r\n$7\r\nCLUSTER\r\n$7\r\nKEYSLOT\r\n$1\r\nk\r\n"
        );
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(
            decode_all(b"+OK\r\n"),
            Some(RespValue::SimpleString("OK".to_string()))
        );
        assert_eq!(
            decode_all(b"-ERR unknown\r\n"),
            Some(RespValue::Error("ERR unknown".to_string()))
        );
        assert_eq!(decode_all(b":1000\r\n"), Some(RespValue::Integer(1000)));
        assert_eq!(
            decode_all(b"$6\r\nfoobar\r\n"),
            Some(RespValue::BulkString(Bytes::from("foobar")))
        );
        assert_eq!(
            decode_all(b"$0\r\n\r\n"),
            Some(RespValue::BulkString(Bytes::new()))
        );
    }

    #[test]
    fn test_decode_nulls() {
        assert_eq!(decode_all(b"$-1\r\n"), Some(RespValue::Null));
        assert_eq!(decode_all(b"*-1\r\n"), Some(RespValue::Null));
    }

    #[test]
    fn test_decode_nested_array() {
        let value = decode_all(b"*2\r\n*1\r\n:1\r\n$3\r\nbar\r\n").unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::Array(vec![RespValue::Integer(1)]),
                RespValue::BulkString(Bytes::from("bar")),
            ])
        );
    }

    #[test]
    fn test_decode_incomplete_data() {
        assert!(decode_all(b"+OK\r").is_none());
        assert!(decode_all(b"$6\r\nfoo").is_none());
        assert!(decode_all(b"*2\r\n:1\r\n").is_none());
    }

    #[test]
    fn test_decode_consumes_exactly_one_value() {
        let data = b":1\r\n:2\r\n";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(
            RespDecoder::decode(&mut cursor).unwrap(),
            Some(RespValue::Integer(1))
        );
        assert_eq!(cursor.position(), 4);
        assert_eq!(
            RespDecoder::decode(&mut cursor).unwrap(),
            Some(RespValue::Integer(2))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut cursor = Cursor::new(&b"?what\r\n"[..]);
        assert!(RespDecoder::decode(&mut cursor).is_err());

        let mut cursor = Cursor::new(&b"$-5\r\n"[..]);
        assert!(RespDecoder::decode(&mut cursor).is_err());

        let mut cursor = Cursor::new(&b"$3\r\nfooXX"[..]);
        assert!(RespDecoder::decode(&mut cursor).is_err());
    }
}
