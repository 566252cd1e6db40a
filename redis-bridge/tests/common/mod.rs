//! In-memory driver shared by the integration tests
//!
//! `MemoryDriver` interprets a handful of commands against a map and counts
//! every call, so tests can check both results and the absence of I/O.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use redis_bridge::cluster::calculate_slot;
use redis_bridge::{
    Client, Command, CommandInvocation, Driver, Frame, InvocationSink, PubSubListener,
    PubSubMessage, RedisError, RedisResult, RespValue, Topology,
};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct Calls {
    pub direct: usize,
    pub pipelines: usize,
    pub transactions: usize,
    pub subscriptions: usize,
    pub commands: Vec<Command>,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.direct + self.pipelines + self.transactions + self.subscriptions
    }
}

#[derive(Debug, Default)]
struct Store {
    strings: HashMap<Bytes, Vec<u8>>,
    hashes: HashMap<Bytes, HashMap<Bytes, Bytes>>,
    lists: HashMap<Bytes, VecDeque<Bytes>>,
    sets: HashMap<Bytes, BTreeSet<Bytes>>,
}

pub struct MemoryDriver {
    topology: Topology,
    store: Store,
    calls: Arc<Mutex<Calls>>,
    abort_transactions: bool,
    messages: Vec<PubSubMessage>,
}

impl MemoryDriver {
    pub fn new(topology: Topology) -> (Self, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let driver = Self {
            topology,
            store: Store::default(),
            calls: calls.clone(),
            abort_transactions: false,
            messages: Vec::new(),
        };
        (driver, calls)
    }

    /// Answer every `EXEC` as if a watched key changed
    pub fn aborting(mut self) -> Self {
        self.abort_transactions = true;
        self
    }

    /// Messages delivered to the next subscription
    pub fn with_messages(mut self, messages: Vec<PubSubMessage>) -> Self {
        self.messages = messages;
        self
    }

    fn record(&self, frames: &[Frame]) {
        let mut calls = self.calls.lock().unwrap();
        calls.commands.extend(frames.iter().map(|f| f.command));
    }

    fn apply(&mut self, frame: &Frame) -> RespValue {
        let args = &frame.args;
        match frame.command {
            Command::Set => {
                let flag = |name: &str| args[2..].iter().any(|a| a.as_ref() == name.as_bytes());
                let previous = self.store.strings.get(&args[0]).cloned();
                let applies = !((flag("NX") && previous.is_some()) || (flag("XX") && previous.is_none()));
                if applies {
                    self.store.strings.insert(args[0].clone(), args[1].to_vec());
                }
                match (flag("GET"), applies) {
                    (true, _) => previous.map_or(RespValue::Null, |v| RespValue::BulkString(Bytes::from(v))),
                    (false, true) => RespValue::SimpleString("OK".to_string()),
                    (false, false) => RespValue::Null,
                }
            }
            Command::MGet => RespValue::Array(
                args.iter()
                    .map(|key| match self.store.strings.get(key) {
                        Some(value) => RespValue::BulkString(Bytes::from(value.clone())),
                        None => RespValue::Null,
                    })
                    .collect(),
            ),
            Command::Get => match self.store.strings.get(&args[0]) {
                Some(value) => RespValue::BulkString(Bytes::from(value.clone())),
                None => RespValue::Null,
            },
            Command::Incr => self.incr_by(&args[0], 1),
            Command::IncrBy => match parse_int(&args[1]) {
                Some(n) => self.incr_by(&args[0], n),
                None => not_an_integer(),
            },
            Command::Decr => self.incr_by(&args[0], -1),
            Command::Del => {
                let removed = args
                    .iter()
                    .filter(|key| {
                        self.store.strings.remove(*key).is_some()
                            | self.store.hashes.remove(*key).is_some()
                            | self.store.lists.remove(*key).is_some()
                            | self.store.sets.remove(*key).is_some()
                    })
                    .count();
                RespValue::Integer(removed as i64)
            }
            Command::Exists => RespValue::Integer(
                args.iter()
                    .filter(|key| {
                        self.store.strings.contains_key(*key) || self.store.hashes.contains_key(*key)
                    })
                    .count() as i64,
            ),
            Command::SetBit => {
                let (Some(offset), Some(bit)) = (parse_int(&args[1]), parse_int(&args[2])) else {
                    return RespValue::Error("ERR bit offset is not an integer".to_string());
                };
                let value = self.store.strings.entry(args[0].clone()).or_default();
                let byte = (offset / 8) as usize;
                let mask = 0x80u8 >> (offset % 8);
                if value.len() <= byte {
                    value.resize(byte + 1, 0);
                }
                let previous = value[byte] & mask != 0;
                if bit == 1 {
                    value[byte] |= mask;
                } else {
                    value[byte] &= !mask;
                }
                RespValue::Integer(i64::from(previous))
            }
            Command::GetBit => {
                let Some(offset) = parse_int(&args[1]) else {
                    return RespValue::Error("ERR bit offset is not an integer".to_string());
                };
                let byte = (offset / 8) as usize;
                let mask = 0x80u8 >> (offset % 8);
                let set = self
                    .store
                    .strings
                    .get(&args[0])
                    .and_then(|value| value.get(byte))
                    .map_or(false, |b| b & mask != 0);
                RespValue::Integer(i64::from(set))
            }
            Command::BitCount => {
                let value = self.store.strings.get(&args[0]).cloned().unwrap_or_default();
                let len = value.len() as i64;
                let (mut start, mut end) = match (args.get(1), args.get(2)) {
                    (Some(start), Some(end)) => {
                        (parse_int(start).unwrap_or(0), parse_int(end).unwrap_or(-1))
                    }
                    _ => (0, -1),
                };
                if start < 0 {
                    start += len;
                }
                if end < 0 {
                    end += len;
                }
                let start = start.max(0);
                let end = end.min(len - 1);
                if len == 0 || start > end {
                    return RespValue::Integer(0);
                }
                let count: u32 = value[start as usize..=end as usize]
                    .iter()
                    .map(|b| b.count_ones())
                    .sum();
                RespValue::Integer(i64::from(count))
            }
            Command::HSet => {
                let hash = self.store.hashes.entry(args[0].clone()).or_default();
                let added = args[1..]
                    .chunks(2)
                    .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                    .count();
                RespValue::Integer(added as i64)
            }
            Command::HGet => match self.store.hashes.get(&args[0]).and_then(|h| h.get(&args[1])) {
                Some(value) => RespValue::BulkString(value.clone()),
                None => RespValue::Null,
            },
            Command::HMGet => {
                let hash = self.store.hashes.get(&args[0]);
                RespValue::Array(
                    args[1..]
                        .iter()
                        .map(|field| match hash.and_then(|h| h.get(field)) {
                            Some(value) => RespValue::BulkString(value.clone()),
                            None => RespValue::Null,
                        })
                        .collect(),
                )
            }
            Command::HGetAll => RespValue::Array(
                self.store
                    .hashes
                    .get(&args[0])
                    .into_iter()
                    .flatten()
                    .flat_map(|(field, value)| {
                        [RespValue::BulkString(field.clone()), RespValue::BulkString(value.clone())]
                    })
                    .collect(),
            ),
            Command::HVals => bulk_array(self.store.hashes.get(&args[0]).into_iter().flat_map(|h| h.values())),
            Command::LPush | Command::RPush => {
                let list = self.store.lists.entry(args[0].clone()).or_default();
                for value in &args[1..] {
                    if frame.command == Command::LPush {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }
                RespValue::Integer(list.len() as i64)
            }
            Command::LPop => optional_bulk(self.store.lists.get_mut(&args[0]).and_then(VecDeque::pop_front)),
            Command::RPop => optional_bulk(self.store.lists.get_mut(&args[0]).and_then(VecDeque::pop_back)),
            Command::RPopLPush => {
                let Some(value) = self.store.lists.get_mut(&args[0]).and_then(VecDeque::pop_back) else {
                    return RespValue::Null;
                };
                let destination = self.store.lists.entry(args[1].clone()).or_default();
                destination.push_front(value.clone());
                RespValue::BulkString(value)
            }
            Command::LIndex => {
                let list = self.store.lists.get(&args[0]);
                let index = parse_int(&args[1]).unwrap_or(0);
                let len = list.map_or(0, VecDeque::len) as i64;
                let index = if index < 0 { index + len } else { index };
                optional_bulk(list.and_then(|l| usize::try_from(index).ok().and_then(|i| l.get(i)).cloned()))
            }
            Command::LRange => {
                let list: Vec<Bytes> = self.store.lists.get(&args[0]).into_iter().flatten().cloned().collect();
                let len = list.len() as i64;
                let (mut start, mut stop) = (parse_int(&args[1]).unwrap_or(0), parse_int(&args[2]).unwrap_or(-1));
                if start < 0 {
                    start += len;
                }
                if stop < 0 {
                    stop += len;
                }
                let start = start.max(0);
                let stop = stop.min(len - 1);
                if start > stop {
                    return RespValue::Array(Vec::new());
                }
                bulk_array(&list[start as usize..=stop as usize])
            }
            Command::SAdd => {
                let set = self.store.sets.entry(args[0].clone()).or_default();
                let added = args[1..].iter().filter(|m| set.insert((*m).clone())).count();
                RespValue::Integer(added as i64)
            }
            Command::SMembers => bulk_array(self.store.sets.get(&args[0]).into_iter().flatten()),
            Command::SPop => optional_bulk(self.store.sets.get_mut(&args[0]).and_then(BTreeSet::pop_first)),
            Command::SRandMember => {
                optional_bulk(self.store.sets.get(&args[0]).and_then(|s| s.first().cloned()))
            }
            Command::SDiff => {
                let mut members = self.store.sets.get(&args[0]).cloned().unwrap_or_default();
                for other in args[1..].iter().filter_map(|key| self.store.sets.get(key)) {
                    members.retain(|m| !other.contains(m));
                }
                bulk_array(&members)
            }
            Command::Ping => RespValue::SimpleString("PONG".to_string()),
            Command::Echo => RespValue::BulkString(args[0].clone()),
            Command::Watch | Command::Unwatch => RespValue::SimpleString("OK".to_string()),
            Command::Publish => RespValue::Integer(0),
            other => RespValue::Error(format!("ERR unknown command '{}'", other)),
        }
    }

    fn incr_by(&mut self, key: &Bytes, by: i64) -> RespValue {
        let current = match self.store.strings.get(key) {
            Some(value) => match std::str::from_utf8(value).ok().and_then(|s| s.parse::<i64>().ok()) {
                Some(n) => n,
                None => return not_an_integer(),
            },
            None => 0,
        };
        let next = current + by;
        self.store
            .strings
            .insert(key.clone(), next.to_string().into_bytes());
        RespValue::Integer(next)
    }
}

fn bulk_array<'a>(items: impl IntoIterator<Item = &'a Bytes>) -> RespValue {
    RespValue::Array(items.into_iter().cloned().map(RespValue::BulkString).collect())
}

fn optional_bulk(value: Option<Bytes>) -> RespValue {
    value.map_or(RespValue::Null, RespValue::BulkString)
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn not_an_integer() -> RespValue {
    RespValue::Error("ERR value is not an integer or out of range".to_string())
}

#[async_trait]
impl Driver for MemoryDriver {
    fn topology(&self) -> Topology {
        self.topology
    }

    fn can_route(&self, keys: &[Bytes]) -> bool {
        match self.topology {
            // Two shards: keys starting with an even byte on one, odd on the other
            Topology::Sharded => {
                let mut shards = keys.iter().map(|key| key.first().map(|b| b % 2));
                match shards.next() {
                    Some(first) => shards.all(|shard| shard == first),
                    None => false,
                }
            }
            Topology::Cluster => {
                let mut slots = keys.iter().map(|key| calculate_slot(key));
                match slots.next() {
                    Some(first) => slots.all(|slot| slot == first),
                    None => true,
                }
            }
            Topology::Standalone | Topology::Sentinel => true,
        }
    }

    async fn execute(&mut self, frame: Frame) -> RedisResult<RespValue> {
        self.calls.lock().unwrap().direct += 1;
        self.record(std::slice::from_ref(&frame));
        match self.apply(&frame) {
            RespValue::Error(msg) => Err(RedisError::from_server_reply(msg)),
            value => Ok(value),
        }
    }

    async fn execute_pipeline(&mut self, frames: Vec<Frame>) -> RedisResult<Vec<RespValue>> {
        self.calls.lock().unwrap().pipelines += 1;
        self.record(&frames);
        Ok(frames.iter().map(|frame| self.apply(frame)).collect())
    }

    async fn execute_transaction(
        &mut self,
        frames: Vec<Frame>,
    ) -> RedisResult<Option<Vec<RespValue>>> {
        self.calls.lock().unwrap().transactions += 1;
        self.record(&frames);
        if self.abort_transactions {
            return Ok(None);
        }
        Ok(Some(frames.iter().map(|frame| self.apply(frame)).collect()))
    }

    async fn subscribe(
        &mut self,
        frame: Frame,
        listener: &mut (dyn PubSubListener + Send),
    ) -> RedisResult<()> {
        self.calls.lock().unwrap().subscriptions += 1;
        self.record(std::slice::from_ref(&frame));

        let channels: Vec<String> = frame
            .args
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        let mut active = 0;
        for channel in &channels {
            active += 1;
            if listener.on_subscribe(channel, active).is_break() {
                break;
            }
        }

        for message in std::mem::take(&mut self.messages) {
            if listener.on_message(message) == ControlFlow::Break(()) {
                break;
            }
        }

        for channel in &channels {
            active -= 1;
            listener.on_unsubscribe(channel, active);
        }
        Ok(())
    }
}

/// Sink keeping every invocation it sees
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub invocations: Arc<Mutex<Vec<CommandInvocation>>>,
}

impl InvocationSink for RecordingSink {
    fn record(&self, invocation: &CommandInvocation) {
        self.invocations.lock().unwrap().push(invocation.clone());
    }
}

pub fn client(topology: Topology) -> (Client, Arc<Mutex<Calls>>) {
    let (driver, calls) = MemoryDriver::new(topology);
    (Client::with_driver(driver), calls)
}

pub fn message(channel: &str, payload: &str) -> PubSubMessage {
    PubSubMessage {
        channel: channel.to_string(),
        payload: Bytes::copy_from_slice(payload.as_bytes()),
        pattern: None,
    }
}
