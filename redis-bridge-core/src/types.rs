//! Domain types exposed by command results and accepted as command options

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Outcome of a command that either takes effect or does not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The command took effect
    Success,
    /// The command was rejected or had nothing to do
    Failure,
}

impl Status {
    /// Check for [`Status::Success`]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<bool> for Status {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Type of the value stored at a key, as reported by `TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Key does not exist
    None,
    /// String value
    String,
    /// List value
    List,
    /// Set value
    Set,
    /// Sorted set value
    ZSet,
    /// Hash value
    Hash,
    /// Stream value
    Stream,
}

impl KeyType {
    /// Parse the reply of `TYPE`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "string" => Some(Self::String),
            "list" => Some(Self::List),
            "set" => Some(Self::Set),
            "zset" => Some(Self::ZSet),
            "hash" => Some(Self::Hash),
            "stream" => Some(Self::Stream),
            _ => None,
        }
    }
}

/// Sorted set member together with its score
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    /// Member
    pub member: Bytes,
    /// Score
    pub score: f64,
}

impl Tuple {
    /// Create a new tuple
    #[must_use]
    pub fn new(member: impl Into<Bytes>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }

    /// Member decoded as UTF-8, lossily
    #[must_use]
    pub fn member_str(&self) -> String {
        String::from_utf8_lossy(&self.member).into_owned()
    }
}

/// One page of a `SCAN` family iteration
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult<T> {
    /// Cursor to pass to the next call
    pub cursor: String,
    /// Items of this page
    pub results: T,
}

impl<T> ScanResult<T> {
    /// A cursor of "0" ends the iteration
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor == "0"
    }
}

/// `MATCH` and `COUNT` options for the `SCAN` family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanArgument {
    pattern: Option<String>,
    count: Option<u64>,
}

impl ScanArgument {
    /// No options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return elements matching a glob pattern
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Hint for the number of elements per page
    #[must_use]
    pub const fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Wire tokens
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(pattern) = &self.pattern {
            args.push("MATCH".to_string());
            args.push(pattern.clone());
        }
        if let Some(count) = self.count {
            args.push("COUNT".to_string());
            args.push(count.to_string());
        }
        args
    }
}

/// Expiration and condition options for `SET`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetArgument {
    expire: Option<SetExpire>,
    condition: Option<SetCondition>,
    get: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetExpire {
    Ex(u64),
    Px(u64),
    ExAt(u64),
    PxAt(u64),
    KeepTtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetCondition {
    Nx,
    Xx,
}

impl SetArgument {
    /// No options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire after a duration, with millisecond precision when needed
    ///
    /// Whole seconds go out as `EX`, anything else as `PX`. A duration
    /// shorter than a millisecond becomes `PX 1`, since Redis rejects a
    /// zero expiry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expire = Some(if ttl.subsec_millis() == 0 && ttl.as_secs() > 0 {
            SetExpire::Ex(ttl.as_secs())
        } else {
            SetExpire::Px(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
        });
        self
    }

    /// Expire at a unix time in seconds
    #[must_use]
    pub const fn with_expire_at(mut self, unix_secs: u64) -> Self {
        self.expire = Some(SetExpire::ExAt(unix_secs));
        self
    }

    /// Expire at a unix time in milliseconds
    #[must_use]
    pub const fn with_pexpire_at(mut self, unix_millis: u64) -> Self {
        self.expire = Some(SetExpire::PxAt(unix_millis));
        self
    }

    /// Retain the current time to live
    #[must_use]
    pub const fn keep_ttl(mut self) -> Self {
        self.expire = Some(SetExpire::KeepTtl);
        self
    }

    /// Only set if the key does not exist
    #[must_use]
    pub const fn nx(mut self) -> Self {
        self.condition = Some(SetCondition::Nx);
        self
    }

    /// Only set if the key already exists
    #[must_use]
    pub const fn xx(mut self) -> Self {
        self.condition = Some(SetCondition::Xx);
        self
    }

    /// Ask for the previous value
    #[must_use]
    pub const fn get(mut self) -> Self {
        self.get = true;
        self
    }

    /// Whether `GET` was requested
    #[must_use]
    pub const fn returns_previous(&self) -> bool {
        self.get
    }

    /// Wire tokens
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.expire {
            Some(SetExpire::Ex(secs)) => args.extend(["EX".to_string(), secs.to_string()]),
            Some(SetExpire::Px(millis)) => args.extend(["PX".to_string(), millis.to_string()]),
            Some(SetExpire::ExAt(at)) => args.extend(["EXAT".to_string(), at.to_string()]),
            Some(SetExpire::PxAt(at)) => args.extend(["PXAT".to_string(), at.to_string()]),
            Some(SetExpire::KeepTtl) => args.push("KEEPTTL".to_string()),
            None => {}
        }
        match self.condition {
            Some(SetCondition::Nx) => args.push("NX".to_string()),
            Some(SetCondition::Xx) => args.push("XX".to_string()),
            None => {}
        }
        if self.get {
            args.push("GET".to_string());
        }
        args
    }
}

/// Bitwise operator for `BITOP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitOperation {
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Bitwise XOR
    Xor,
    /// Bitwise NOT, single source key
    Not,
}

impl BitOperation {
    /// Wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
        }
    }
}

/// Unit of the range given to `BITCOUNT` and `BITPOS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitCountOption {
    /// Range is in bytes
    Byte,
    /// Range is in bits
    Bit,
}

impl BitCountOption {
    /// Wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Bit => "BIT",
        }
    }
}

/// Overflow behaviour of `BITFIELD` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitFieldOverflow {
    /// Wrap around
    Wrap,
    /// Saturate at the type bounds
    Sat,
    /// Refuse the write and reply nil
    Fail,
}

/// Sub-operations of a `BITFIELD` call, applied in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitFieldArgument {
    args: Vec<String>,
}

impl BitFieldArgument {
    /// No sub-operations
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field; `encoding` is e.g. `u8` or `i16`
    #[must_use]
    pub fn get(mut self, encoding: &str, offset: i64) -> Self {
        self.args
            .extend(["GET".to_string(), encoding.to_string(), offset.to_string()]);
        self
    }

    /// Write a field and return its old value
    #[must_use]
    pub fn set(mut self, encoding: &str, offset: i64, value: i64) -> Self {
        self.args.extend([
            "SET".to_string(),
            encoding.to_string(),
            offset.to_string(),
            value.to_string(),
        ]);
        self
    }

    /// Add to a field and return its new value
    #[must_use]
    pub fn incr_by(mut self, encoding: &str, offset: i64, increment: i64) -> Self {
        self.args.extend([
            "INCRBY".to_string(),
            encoding.to_string(),
            offset.to_string(),
            increment.to_string(),
        ]);
        self
    }

    /// Overflow policy for the writes that follow
    #[must_use]
    pub fn overflow(mut self, overflow: BitFieldOverflow) -> Self {
        let mode = match overflow {
            BitFieldOverflow::Wrap => "WRAP",
            BitFieldOverflow::Sat => "SAT",
            BitFieldOverflow::Fail => "FAIL",
        };
        self.args.extend(["OVERFLOW".to_string(), mode.to_string()]);
        self
    }

    /// Wire tokens
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.args.clone()
    }
}

/// Where `LINSERT` places the new element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListPosition {
    /// Before the pivot
    Before,
    /// After the pivot
    After,
}

impl ListPosition {
    /// Wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
        }
    }
}

/// Score aggregation for `ZUNIONSTORE` and `ZINTERSTORE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Aggregate {
    /// Sum of the scores
    #[default]
    Sum,
    /// Minimum score
    Min,
    /// Maximum score
    Max,
}

impl Aggregate {
    /// Wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Sort order of geo queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Nearest first
    Asc,
    /// Farthest first
    Desc,
}

/// A longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    /// Longitude in degrees
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
}

impl Geo {
    /// Create a new position
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Distance unit of geo commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeoUnit {
    /// Meters
    #[default]
    M,
    /// Kilometers
    Km,
    /// Miles
    Mi,
    /// Feet
    Ft,
}

impl GeoUnit {
    /// Wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M => "m",
            Self::Km => "km",
            Self::Mi => "mi",
            Self::Ft => "ft",
        }
    }
}

/// One member returned by `GEORADIUS` and `GEORADIUSBYMEMBER`
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRadius {
    /// Member name
    pub member: Bytes,
    /// Distance from the center, when `WITHDIST` was given
    pub distance: Option<f64>,
    /// Raw geohash, when `WITHHASH` was given
    pub geohash: Option<i64>,
    /// Position, when `WITHCOORD` was given
    pub geo: Option<Geo>,
}

/// Options for `GEORADIUS` and `GEORADIUSBYMEMBER`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoRadiusArgument {
    with_coord: bool,
    with_dist: bool,
    with_hash: bool,
    count: Option<(u64, bool)>,
    order: Option<Order>,
}

impl GeoRadiusArgument {
    /// No options: the reply is a plain list of members
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include positions
    #[must_use]
    pub const fn with_coord(mut self) -> Self {
        self.with_coord = true;
        self
    }

    /// Include distances
    #[must_use]
    pub const fn with_dist(mut self) -> Self {
        self.with_dist = true;
        self
    }

    /// Include raw geohashes
    #[must_use]
    pub const fn with_hash(mut self) -> Self {
        self.with_hash = true;
        self
    }

    /// Limit the number of results; `any` stops at the first matches found
    #[must_use]
    pub const fn with_count(mut self, count: u64, any: bool) -> Self {
        self.count = Some((count, any));
        self
    }

    /// Sort by distance
    #[must_use]
    pub const fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Wire tokens
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.with_coord {
            args.push("WITHCOORD".to_string());
        }
        if self.with_dist {
            args.push("WITHDIST".to_string());
        }
        if self.with_hash {
            args.push("WITHHASH".to_string());
        }
        if let Some((count, any)) = self.count {
            args.push("COUNT".to_string());
            args.push(count.to_string());
            if any {
                args.push("ANY".to_string());
            }
        }
        match self.order {
            Some(Order::Asc) => args.push("ASC".to_string()),
            Some(Order::Desc) => args.push("DESC".to_string()),
            None => {}
        }
        args
    }
}

/// Represents a single entry in a Redis Stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Entry ID, e.g. "1234567890123-0"
    pub id: String,
    /// Field-value pairs of the entry
    pub fields: HashMap<String, String>,
}

impl StreamEntry {
    /// Create a new stream entry
    #[must_use]
    pub fn new(id: String, fields: HashMap<String, String>) -> Self {
        Self { id, fields }
    }

    /// Millisecond timestamp part of the ID
    #[must_use]
    pub fn timestamp(&self) -> Option<u64> {
        self.id.split_once('-')?.0.parse().ok()
    }

    /// Sequence part of the ID
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.id.split_once('-')?.1.parse().ok()
    }
}

/// Trimming strategy for `XTRIM`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTrim {
    /// Keep at most this many entries
    MaxLen {
        /// Maximum length
        threshold: u64,
        /// Allow the server to trim lazily (`~`)
        approximate: bool,
    },
    /// Drop entries with IDs lower than this
    MinId {
        /// Lowest ID kept
        id: String,
        /// Allow the server to trim lazily (`~`)
        approximate: bool,
    },
}

impl StreamTrim {
    /// Wire tokens
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let (strategy, threshold, approximate) = match self {
            Self::MaxLen {
                threshold,
                approximate,
            } => ("MAXLEN", threshold.to_string(), *approximate),
            Self::MinId { id, approximate } => ("MINID", id.clone(), *approximate),
        };
        let mut args = vec![strategy.to_string()];
        if approximate {
            args.push("~".to_string());
        }
        args.push(threshold);
        args
    }
}

/// Represents a slot range in a Redis cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    /// Start of the slot range (inclusive)
    pub start: u16,
    /// End of the slot range (inclusive)
    pub end: u16,
}

impl SlotRange {
    /// Create a new slot range
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Check if a slot is within this range
    #[must_use]
    pub const fn contains(&self, slot: u16) -> bool {
        slot >= self.start && slot <= self.end
    }
}

/// A node serving a slot range, as listed by `CLUSTER SLOTS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSlotNode {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Node ID, when the server reports it
    pub id: Option<String>,
}

/// One entry of `CLUSTER SLOTS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSlot {
    /// Slots covered by this entry
    pub range: SlotRange,
    /// Node serving writes
    pub master: ClusterSlotNode,
    /// Replicas of the master
    pub replicas: Vec<ClusterSlotNode>,
}

/// Overall cluster health reported by `CLUSTER INFO`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterState {
    /// All slots are served
    Ok,
    /// At least one slot is unserved
    Fail,
}

/// Parsed reply of `CLUSTER INFO`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    /// cluster_state
    pub state: ClusterState,
    /// cluster_slots_assigned
    pub slots_assigned: u32,
    /// cluster_slots_ok
    pub slots_ok: u32,
    /// cluster_slots_pfail
    pub slots_pfail: u32,
    /// cluster_slots_fail
    pub slots_fail: u32,
    /// cluster_known_nodes
    pub known_nodes: u32,
    /// cluster_size
    pub size: u32,
    /// cluster_current_epoch
    pub current_epoch: u64,
    /// cluster_my_epoch
    pub my_epoch: u64,
}

impl ClusterInfo {
    /// Parse the `field:value` lines of `CLUSTER INFO`
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let fields: HashMap<&str, &str> = text
            .lines()
            .filter_map(|line| line.trim().split_once(':'))
            .collect();
        let number = |name: &str| fields.get(name).and_then(|v| v.parse::<u64>().ok());

        let state = match *fields.get("cluster_state")? {
            "ok" => ClusterState::Ok,
            _ => ClusterState::Fail,
        };
        Some(Self {
            state,
            slots_assigned: number("cluster_slots_assigned").unwrap_or(0) as u32,
            slots_ok: number("cluster_slots_ok").unwrap_or(0) as u32,
            slots_pfail: number("cluster_slots_pfail").unwrap_or(0) as u32,
            slots_fail: number("cluster_slots_fail").unwrap_or(0) as u32,
            known_nodes: number("cluster_known_nodes").unwrap_or(0) as u32,
            size: number("cluster_size").unwrap_or(0) as u32,
            current_epoch: number("cluster_current_epoch").unwrap_or(0),
            my_epoch: number("cluster_my_epoch").unwrap_or(0),
        })
    }
}

/// A replica listed in a master's `ROLE` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaInfo {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Acknowledged replication offset
    pub offset: i64,
}

/// Parsed reply of `ROLE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// This server is a master
    Master {
        /// Current replication offset
        offset: i64,
        /// Connected replicas
        replicas: Vec<ReplicaInfo>,
    },
    /// This server replicates another one
    Replica {
        /// Master host
        master_host: String,
        /// Master port
        master_port: u16,
        /// Link state, e.g. "connected"
        state: String,
        /// Data received so far
        offset: i64,
    },
    /// This server is a sentinel
    Sentinel {
        /// Names of the monitored masters
        masters: Vec<String>,
    },
}

/// Server clock reported by `TIME`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedisServerTime {
    /// Unix time in seconds
    pub seconds: u64,
    /// Microseconds within the second
    pub microseconds: u64,
}

impl RedisServerTime {
    /// Time since the unix epoch
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_micros(self.seconds * 1_000_000 + self.microseconds)
    }
}

/// Parsed reply of `INFO`, keyed by lowercase section name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// Sections with their fields
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Info {
    /// Parse the `# Section` / `field:value` text of `INFO`
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current = String::from("default");
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(name) = line.strip_prefix('#') {
                current = name.trim().to_lowercase();
                sections.entry(current.clone()).or_default();
            } else if let Some((field, value)) = line.split_once(':') {
                sections
                    .entry(current.clone())
                    .or_default()
                    .insert(field.to_string(), value.to_string());
            }
        }
        Self { sections }
    }

    /// Look up a field in a section
    #[must_use]
    pub fn get(&self, section: &str, field: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())?
            .get(field)
            .map(String::as_str)
    }
}

/// One entry of `SLOWLOG GET`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowLog {
    /// Unique, increasing entry id
    pub id: i64,
    /// Unix time the command was processed
    pub timestamp: i64,
    /// Execution time in microseconds
    pub execution_time: i64,
    /// Command and arguments
    pub args: Vec<String>,
    /// Client address, on servers that report it
    pub client_address: Option<String>,
    /// Client name, on servers that report it
    pub client_name: Option<String>,
}

impl fmt::Display for SlowLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} at {} took {}us: {}",
            self.id,
            self.timestamp,
            self.execution_time,
            self.args.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_range_contains() {
        let range = SlotRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(150));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn test_set_argument_tokens() {
        let arg = SetArgument::new()
            .with_ttl(Duration::from_secs(10))
            .nx()
            .get();
        assert_eq!(arg.to_args(), vec!["EX", "10", "NX", "GET"]);

        let arg = SetArgument::new()
            .with_ttl(Duration::from_millis(1500))
            .xx();
        assert_eq!(arg.to_args(), vec!["PX", "1500", "XX"]);

        assert_eq!(SetArgument::new().keep_ttl().to_args(), vec!["KEEPTTL"]);
    }

    #[test]
    fn test_short_ttl_never_renders_zero() {
        let arg = SetArgument::new().with_ttl(Duration::from_micros(500));
        assert_eq!(arg.to_args(), vec!["PX", "1"]);

        let arg = SetArgument::new().with_ttl(Duration::ZERO);
        assert_eq!(arg.to_args(), vec!["PX", "1"]);

        let arg = SetArgument::new().with_ttl(Duration::from_millis(250));
        assert_eq!(arg.to_args(), vec!["PX", "250"]);

        let arg = SetArgument::new().with_ttl(Duration::from_secs(3));
        assert_eq!(arg.to_args(), vec!["EX", "3"]);
    }

    #[test]
    fn test_get_flag_is_reported() {
        assert!(!SetArgument::new().nx().returns_previous());
        assert!(SetArgument::new().nx().get().returns_previous());
    }

    #[test]
    fn test_geo_radius_argument_tokens() {
        let arg = GeoRadiusArgument::new()
            .with_dist()
            .with_coord()
            .with_count(5, true)
            .with_order(Order::Asc);
        assert_eq!(
            arg.to_args(),
            vec!["WITHCOORD", "WITHDIST", "COUNT", "5", "ANY", "ASC"]
        );
    }

    #[test]
    fn test_bit_field_argument_tokens() {
        let arg = BitFieldArgument::new()
            .overflow(BitFieldOverflow::Sat)
            .incr_by("u4", 0, 1)
            .get("i8", 8);
        assert_eq!(
            arg.to_args(),
            vec!["OVERFLOW", "SAT", "INCRBY", "u4", "0", "1", "GET", "i8", "8"]
        );
    }

    #[test]
    fn test_stream_trim_tokens() {
        let trim = StreamTrim::MaxLen {
            threshold: 1000,
            approximate: true,
        };
        assert_eq!(trim.to_args(), vec!["MAXLEN", "~", "1000"]);
    }

    #[test]
    fn test_stream_entry_id_parts() {
        let entry = StreamEntry::new("1526919030474-55".to_string(), HashMap::new());
        assert_eq!(entry.timestamp(), Some(1_526_919_030_474));
        assert_eq!(entry.sequence(), Some(55));
    }

    #[test]
    fn test_cluster_info_parse() {
        let text = "cluster_state:ok\r\ncluster_slots_assigned:16384\r\ncluster_slots_ok:16384\r\n\
                    cluster_known_nodes:6\r\ncluster_size:3\r\ncluster_current_epoch:6\r\n";
        let info = ClusterInfo::parse(text).unwrap();
        assert_eq!(info.state, ClusterState::Ok);
        assert_eq!(info.slots_assigned, 16384);
        assert_eq!(info.known_nodes, 6);
        assert_eq!(info.size, 3);
        assert_eq!(info.my_epoch, 0);
        assert!(ClusterInfo::parse("no state here").is_none());
    }

    #[test]
    fn test_info_parse() {
        let text = "# Server\r\nredis_version:7.2.4\r\n\r\n# Keyspace\r\ndb0:keys=1,expires=0\r\n";
        let info = Info::parse(text);
        assert_eq!(info.get("server", "redis_version"), Some("7.2.4"));
        assert_eq!(info.get("Keyspace", "db0"), Some("keys=1,expires=0"));
        assert_eq!(info.get("memory", "used_memory"), None);
    }

    #[test]
    fn test_key_type_parse() {
        assert_eq!(KeyType::parse("zset"), Some(KeyType::ZSet));
        assert_eq!(KeyType::parse("none"), Some(KeyType::None));
        assert_eq!(KeyType::parse("vectorset"), None);
    }

    #[test]
    fn test_status_from_bool() {
        assert!(Status::from(true).is_success());
        assert_eq!(Status::from(false), Status::Failure);
    }
}
