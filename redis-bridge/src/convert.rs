//! Reply converters
//!
//! Each converter is a plain function from a native [`RespValue`] to the
//! typed result of a command family. They hold no state, so direct,
//! pipelined and transactional calls convert identically. A reply of the
//! wrong shape is a [`RedisError::Type`]; null becomes `None` only for
//! `Option` results.

use bytes::Bytes;
use redis_bridge_core::{
    ClusterInfo, ClusterSlot, ClusterSlotNode, Geo, GeoRadius, Info, KeyType, RedisError,
    RedisResult, RedisServerTime, ReplicaInfo, RespValue, Role, ScanResult, SlotRange, SlowLog,
    Status, StreamEntry, Tuple,
};
use std::collections::{HashMap, HashSet};

/// Native reply, unchanged
pub fn identity(value: RespValue) -> RedisResult<RespValue> {
    Ok(value)
}

/// `+OK` is success, null is failure (e.g. `SET .. NX` not applied)
pub fn status_ok(value: RespValue) -> RedisResult<Status> {
    match value {
        RespValue::SimpleString(s) if s == "OK" => Ok(Status::Success),
        RespValue::SimpleString(_) | RespValue::Null => Ok(Status::Failure),
        other => Err(other.unexpected("status")),
    }
}

/// Non-zero integer is success
pub fn status_from_int(value: RespValue) -> RedisResult<Status> {
    match value {
        RespValue::Integer(n) => Ok(Status::from(n != 0)),
        other => Err(other.unexpected("integer status")),
    }
}

/// Integer reply read as a flag
pub fn boolean(value: RespValue) -> RedisResult<bool> {
    match value {
        RespValue::Integer(n) => Ok(n != 0),
        other => Err(other.unexpected("integer flag")),
    }
}

/// Integer, also from bulk digits
pub fn integer(value: RespValue) -> RedisResult<i64> {
    value.as_int()
}

/// Integer or nil
pub fn optional_integer(value: RespValue) -> RedisResult<Option<i64>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_int().map(Some),
    }
}

/// Double sent as a bulk string
pub fn float(value: RespValue) -> RedisResult<f64> {
    value.as_float()
}

/// Double or nil
pub fn optional_float(value: RespValue) -> RedisResult<Option<f64>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_float().map(Some),
    }
}

/// Bulk payload
pub fn bytes(value: RespValue) -> RedisResult<Bytes> {
    value.into_bytes()
}

/// Bulk payload or nil
pub fn optional_bytes(value: RespValue) -> RedisResult<Option<Bytes>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.into_bytes().map(Some),
    }
}

/// UTF-8 text
pub fn string(value: RespValue) -> RedisResult<String> {
    value.into_string()
}

/// UTF-8 text or nil
pub fn optional_string(value: RespValue) -> RedisResult<Option<String>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.into_string().map(Some),
    }
}

/// Array of bulk payloads
pub fn bytes_list(value: RespValue) -> RedisResult<Vec<Bytes>> {
    value.into_array()?.into_iter().map(bytes).collect()
}

/// Array of text
pub fn string_list(value: RespValue) -> RedisResult<Vec<String>> {
    value.into_array()?.into_iter().map(string).collect()
}

/// Array with nil holes, as returned by `MGET` and `HMGET`
pub fn optional_string_list(value: RespValue) -> RedisResult<Vec<Option<String>>> {
    value.into_array()?.into_iter().map(optional_string).collect()
}

/// Array with nil holes, as returned by `BITFIELD` with `OVERFLOW FAIL`
pub fn optional_integer_list(value: RespValue) -> RedisResult<Vec<Option<i64>>> {
    value
        .into_array()?
        .into_iter()
        .map(optional_integer)
        .collect()
}

/// Array of integer flags, as returned by `SCRIPT EXISTS`
pub fn boolean_list(value: RespValue) -> RedisResult<Vec<bool>> {
    value.into_array()?.into_iter().map(boolean).collect()
}

/// Array of distinct members
pub fn string_set(value: RespValue) -> RedisResult<HashSet<String>> {
    value.into_array()?.into_iter().map(string).collect()
}

/// Flat `[field, value, ...]` array
pub fn string_map(value: RespValue) -> RedisResult<HashMap<String, String>> {
    pairs(value.into_array()?)?
        .map(|(field, value)| Ok((field.into_string()?, value.into_string()?)))
        .collect()
}

/// Flat `[name, count, ...]` array, as returned by `PUBSUB NUMSUB`
pub fn integer_map(value: RespValue) -> RedisResult<HashMap<String, i64>> {
    pairs(value.into_array()?)?
        .map(|(name, count)| Ok((name.into_string()?, count.as_int()?)))
        .collect()
}

/// Flat `[member, score, ...]` array, as returned with `WITHSCORES`
pub fn tuple_list(value: RespValue) -> RedisResult<Vec<Tuple>> {
    pairs(value.into_array()?)?
        .map(|(member, score)| Ok(Tuple::new(member.into_bytes()?, score.as_float()?)))
        .collect()
}

/// `SCAN` and `SSCAN` page
pub fn scan_strings(value: RespValue) -> RedisResult<ScanResult<Vec<String>>> {
    let (cursor, page) = scan_page(value)?;
    Ok(ScanResult {
        cursor,
        results: string_list(page)?,
    })
}

/// `HSCAN` page
pub fn scan_map(value: RespValue) -> RedisResult<ScanResult<HashMap<String, String>>> {
    let (cursor, page) = scan_page(value)?;
    Ok(ScanResult {
        cursor,
        results: string_map(page)?,
    })
}

/// `ZSCAN` page
pub fn scan_tuples(value: RespValue) -> RedisResult<ScanResult<Vec<Tuple>>> {
    let (cursor, page) = scan_page(value)?;
    Ok(ScanResult {
        cursor,
        results: tuple_list(page)?,
    })
}

/// `GEOPOS`: one `[longitude, latitude]` pair or nil per member
pub fn geo_list(value: RespValue) -> RedisResult<Vec<Option<Geo>>> {
    value
        .into_array()?
        .into_iter()
        .map(|entry| match entry {
            RespValue::Null => Ok(None),
            other => geo(other).map(Some),
        })
        .collect()
}

/// `GEORADIUS` and `GEORADIUSBYMEMBER`
///
/// Without `WITH*` options every entry is a bare member. Otherwise it is an
/// array of the member followed by the distance (bulk string), the geohash
/// (integer) and the coordinates (array), each present only when requested.
pub fn geo_radius_list(value: RespValue) -> RedisResult<Vec<GeoRadius>> {
    value
        .into_array()?
        .into_iter()
        .map(|entry| match entry {
            RespValue::Array(parts) => {
                let mut parts = parts.into_iter();
                let member = parts
                    .next()
                    .ok_or_else(|| RedisError::Type("expected geo member, got empty array".to_string()))?
                    .into_bytes()?;
                let mut radius = GeoRadius {
                    member,
                    distance: None,
                    geohash: None,
                    geo: None,
                };
                for part in parts {
                    match part {
                        RespValue::Integer(hash) => radius.geohash = Some(hash),
                        RespValue::Array(_) => radius.geo = Some(geo(part)?),
                        other => radius.distance = Some(other.as_float()?),
                    }
                }
                Ok(radius)
            }
            other => Ok(GeoRadius {
                member: other.into_bytes()?,
                distance: None,
                geohash: None,
                geo: None,
            }),
        })
        .collect()
}

/// `TYPE`
pub fn key_type(value: RespValue) -> RedisResult<KeyType> {
    let name = value.into_string()?;
    KeyType::parse(&name).ok_or_else(|| RedisError::Type(format!("unknown key type {name}")))
}

/// `CLUSTER INFO`
pub fn cluster_info(value: RespValue) -> RedisResult<ClusterInfo> {
    let text = value.into_string()?;
    ClusterInfo::parse(&text)
        .ok_or_else(|| RedisError::Type("expected cluster_state in CLUSTER INFO".to_string()))
}

/// `CLUSTER SLOTS`: `[start, end, [host, port, id?], replicas...]` per range
pub fn cluster_slots(value: RespValue) -> RedisResult<Vec<ClusterSlot>> {
    value
        .into_array()?
        .into_iter()
        .map(|entry| {
            let mut parts = entry.into_array()?.into_iter();
            let start = slot_number(parts.next())?;
            let end = slot_number(parts.next())?;
            let master = parts
                .next()
                .ok_or_else(|| RedisError::Type("expected slot master, got nothing".to_string()))
                .and_then(slot_node)?;
            let replicas = parts.map(slot_node).collect::<RedisResult<Vec<_>>>()?;
            Ok(ClusterSlot {
                range: SlotRange::new(start, end),
                master,
                replicas,
            })
        })
        .collect()
}

/// `ROLE` for masters, replicas and sentinels
pub fn role(value: RespValue) -> RedisResult<Role> {
    let mut parts = value.into_array()?.into_iter();
    let kind = next(&mut parts, "role name")?.into_string()?;

    match kind.as_str() {
        "master" => {
            let offset = next(&mut parts, "replication offset")?.as_int()?;
            let replicas = next(&mut parts, "replica list")?
                .into_array()?
                .into_iter()
                .map(|replica| {
                    let mut fields = replica.into_array()?.into_iter();
                    Ok(ReplicaInfo {
                        host: next(&mut fields, "replica host")?.into_string()?,
                        port: port(next(&mut fields, "replica port")?)?,
                        offset: next(&mut fields, "replica offset")?.as_int()?,
                    })
                })
                .collect::<RedisResult<Vec<_>>>()?;
            Ok(Role::Master { offset, replicas })
        }
        "slave" | "replica" => Ok(Role::Replica {
            master_host: next(&mut parts, "master host")?.into_string()?,
            master_port: port(next(&mut parts, "master port")?)?,
            state: next(&mut parts, "link state")?.into_string()?,
            offset: next(&mut parts, "replication offset")?.as_int()?,
        }),
        "sentinel" => Ok(Role::Sentinel {
            masters: string_list(next(&mut parts, "master names")?)?,
        }),
        other => Err(RedisError::Type(format!("unknown role {other}"))),
    }
}

/// `INFO` text
pub fn info(value: RespValue) -> RedisResult<Info> {
    Ok(Info::parse(&value.into_string()?))
}

/// `TIME`: `[seconds, microseconds]` as bulk strings
pub fn server_time(value: RespValue) -> RedisResult<RedisServerTime> {
    let mut parts = value.into_array()?.into_iter();
    let seconds = next(&mut parts, "seconds")?.as_int()?;
    let microseconds = next(&mut parts, "microseconds")?.as_int()?;
    Ok(RedisServerTime {
        seconds: unsigned(seconds)?,
        microseconds: unsigned(microseconds)?,
    })
}

/// `XRANGE`: `[id, [field, value, ...]]` per entry
pub fn stream_entries(value: RespValue) -> RedisResult<Vec<StreamEntry>> {
    value
        .into_array()?
        .into_iter()
        .map(|entry| {
            let mut parts = entry.into_array()?.into_iter();
            let id = next(&mut parts, "entry id")?.into_string()?;
            let fields = string_map(next(&mut parts, "entry fields")?)?;
            Ok(StreamEntry::new(id, fields))
        })
        .collect()
}

/// `SLOWLOG GET`; servers before 4.0 omit the client address and name
pub fn slowlog_list(value: RespValue) -> RedisResult<Vec<SlowLog>> {
    value
        .into_array()?
        .into_iter()
        .map(|entry| {
            let mut parts = entry.into_array()?.into_iter();
            Ok(SlowLog {
                id: next(&mut parts, "slowlog id")?.as_int()?,
                timestamp: next(&mut parts, "slowlog timestamp")?.as_int()?,
                execution_time: next(&mut parts, "execution time")?.as_int()?,
                args: string_list(next(&mut parts, "slowlog arguments")?)?,
                client_address: parts.next().map(string).transpose()?,
                client_name: parts.next().map(string).transpose()?,
            })
        })
        .collect()
}

fn next(parts: &mut impl Iterator<Item = RespValue>, what: &str) -> RedisResult<RespValue> {
    parts
        .next()
        .ok_or_else(|| RedisError::Type(format!("expected {what}, got nothing")))
}

pub(crate) fn pairs(items: Vec<RespValue>) -> RedisResult<impl Iterator<Item = (RespValue, RespValue)>> {
    if items.len() % 2 != 0 {
        return Err(RedisError::Type(format!(
            "expected even number of elements, got {}",
            items.len()
        )));
    }
    let mut iter = items.into_iter();
    Ok(std::iter::from_fn(move || Some((iter.next()?, iter.next()?))))
}

fn scan_page(value: RespValue) -> RedisResult<(String, RespValue)> {
    let mut parts = value.into_array()?.into_iter();
    let cursor = next(&mut parts, "scan cursor")?.into_string()?;
    let page = next(&mut parts, "scan page")?;
    Ok((cursor, page))
}

fn geo(value: RespValue) -> RedisResult<Geo> {
    let mut parts = value.into_array()?.into_iter();
    Ok(Geo {
        longitude: next(&mut parts, "longitude")?.as_float()?,
        latitude: next(&mut parts, "latitude")?.as_float()?,
    })
}

fn slot_number(value: Option<RespValue>) -> RedisResult<u16> {
    let n = value
        .ok_or_else(|| RedisError::Type("expected slot number, got nothing".to_string()))?
        .as_int()?;
    u16::try_from(n).map_err(|_| RedisError::Type(format!("slot {n} out of range")))
}

fn slot_node(value: RespValue) -> RedisResult<ClusterSlotNode> {
    let mut parts = value.into_array()?.into_iter();
    Ok(ClusterSlotNode {
        host: next(&mut parts, "node host")?.into_string()?,
        port: port(next(&mut parts, "node port")?)?,
        id: parts.next().map(string).transpose()?,
    })
}

fn port(value: RespValue) -> RedisResult<u16> {
    let n = value.as_int()?;
    u16::try_from(n).map_err(|_| RedisError::Type(format!("port {n} out of range")))
}

fn unsigned(n: i64) -> RedisResult<u64> {
    u64::try_from(n).map_err(|_| RedisError::Type(format!("expected non-negative value, got {n}")))
}
