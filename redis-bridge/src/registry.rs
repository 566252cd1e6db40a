//! The command table
//!
//! Every command the client can issue is a [`Command`] variant. Its
//! [`CommandSpec`] names the wire words and the execution modes and
//! topologies it may be issued in; the dispatcher consults it before any
//! network I/O.

use redis_bridge_core::{Modes, Topologies};
use std::fmt;

/// Wire name and capability sets of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command words as sent, e.g. `"CLUSTER KEYSLOT"`
    pub name: &'static str,
    /// Modes the command may be issued in
    pub modes: Modes,
    /// Topologies the command may be issued against
    pub topologies: Topologies,
}

macro_rules! command_table {
    ($($variant:ident => $name:literal, $modes:ident, $topologies:ident;)+) => {
        /// A Redis command known to the dispatcher
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Command {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl Command {
            /// Every command in the table
            pub const ALL: &'static [Command] = &[$(Command::$variant),+];

            /// Wire name and capability sets
            #[must_use]
            pub const fn spec(self) -> CommandSpec {
                match self {
                    $(
                        Command::$variant => CommandSpec {
                            name: $name,
                            modes: Modes::$modes,
                            topologies: Topologies::$topologies,
                        },
                    )+
                }
            }
        }
    };
}

command_table! {
    // bitmap
    SetBit => "SETBIT", ALL, ALL;
    GetBit => "GETBIT", ALL, ALL;
    BitCount => "BITCOUNT", ALL, ALL;
    BitPos => "BITPOS", ALL, ALL;
    BitOp => "BITOP", ALL, ALL;
    BitField => "BITFIELD", ALL, ALL;
    BitFieldRo => "BITFIELD_RO", ALL, ALL;

    // string
    Set => "SET", ALL, ALL;
    Get => "GET", ALL, ALL;
    GetSet => "GETSET", ALL, ALL;
    GetDel => "GETDEL", ALL, ALL;
    SetNx => "SETNX", ALL, ALL;
    SetEx => "SETEX", ALL, ALL;
    PSetEx => "PSETEX", ALL, ALL;
    MGet => "MGET", ALL, ALL;
    MSet => "MSET", ALL, ALL;
    MSetNx => "MSETNX", ALL, ALL;
    Incr => "INCR", ALL, ALL;
    IncrBy => "INCRBY", ALL, ALL;
    IncrByFloat => "INCRBYFLOAT", ALL, ALL;
    Decr => "DECR", ALL, ALL;
    DecrBy => "DECRBY", ALL, ALL;
    Append => "APPEND", ALL, ALL;
    StrLen => "STRLEN", ALL, ALL;
    GetRange => "GETRANGE", ALL, ALL;
    SetRange => "SETRANGE", ALL, ALL;

    // key
    Del => "DEL", ALL, ALL;
    Unlink => "UNLINK", ALL, ALL;
    Exists => "EXISTS", ALL, ALL;
    Expire => "EXPIRE", ALL, ALL;
    PExpire => "PEXPIRE", ALL, ALL;
    ExpireAt => "EXPIREAT", ALL, ALL;
    PExpireAt => "PEXPIREAT", ALL, ALL;
    Persist => "PERSIST", ALL, ALL;
    Ttl => "TTL", ALL, ALL;
    PTtl => "PTTL", ALL, ALL;
    Type => "TYPE", ALL, ALL;
    Rename => "RENAME", ALL, ALL;
    RenameNx => "RENAMENX", ALL, ALL;
    Keys => "KEYS", ALL, NODE;
    Scan => "SCAN", NO_TRANSACTION, NODE;
    RandomKey => "RANDOMKEY", ALL, NODE;
    Touch => "TOUCH", ALL, ALL;

    // hash
    HSet => "HSET", ALL, ALL;
    HSetNx => "HSETNX", ALL, ALL;
    HGet => "HGET", ALL, ALL;
    HMGet => "HMGET", ALL, ALL;
    HGetAll => "HGETALL", ALL, ALL;
    HDel => "HDEL", ALL, ALL;
    HExists => "HEXISTS", ALL, ALL;
    HIncrBy => "HINCRBY", ALL, ALL;
    HIncrByFloat => "HINCRBYFLOAT", ALL, ALL;
    HKeys => "HKEYS", ALL, ALL;
    HVals => "HVALS", ALL, ALL;
    HLen => "HLEN", ALL, ALL;
    HStrLen => "HSTRLEN", ALL, ALL;
    HRandField => "HRANDFIELD", ALL, ALL;
    HScan => "HSCAN", ALL, ALL;

    // list
    LPush => "LPUSH", ALL, ALL;
    RPush => "RPUSH", ALL, ALL;
    LPushX => "LPUSHX", ALL, ALL;
    RPushX => "RPUSHX", ALL, ALL;
    LPop => "LPOP", ALL, ALL;
    RPop => "RPOP", ALL, ALL;
    LRange => "LRANGE", ALL, ALL;
    LLen => "LLEN", ALL, ALL;
    LIndex => "LINDEX", ALL, ALL;
    LSet => "LSET", ALL, ALL;
    LInsert => "LINSERT", ALL, ALL;
    LRem => "LREM", ALL, ALL;
    LTrim => "LTRIM", ALL, ALL;
    RPopLPush => "RPOPLPUSH", ALL, ALL;

    // set
    SAdd => "SADD", ALL, ALL;
    SRem => "SREM", ALL, ALL;
    SMembers => "SMEMBERS", ALL, ALL;
    SIsMember => "SISMEMBER", ALL, ALL;
    SCard => "SCARD", ALL, ALL;
    SPop => "SPOP", ALL, ALL;
    SRandMember => "SRANDMEMBER", ALL, ALL;
    SMove => "SMOVE", ALL, ALL;
    SDiff => "SDIFF", ALL, ALL;
    SDiffStore => "SDIFFSTORE", ALL, ALL;
    SInter => "SINTER", ALL, ALL;
    SInterStore => "SINTERSTORE", ALL, ALL;
    SUnion => "SUNION", ALL, ALL;
    SUnionStore => "SUNIONSTORE", ALL, ALL;
    SScan => "SSCAN", ALL, ALL;

    // sorted set
    ZAdd => "ZADD", ALL, ALL;
    ZIncrBy => "ZINCRBY", ALL, ALL;
    ZScore => "ZSCORE", ALL, ALL;
    ZRank => "ZRANK", ALL, ALL;
    ZRevRank => "ZREVRANK", ALL, ALL;
    ZCard => "ZCARD", ALL, ALL;
    ZCount => "ZCOUNT", ALL, ALL;
    ZRange => "ZRANGE", ALL, ALL;
    ZRevRange => "ZREVRANGE", ALL, ALL;
    ZRangeByScore => "ZRANGEBYSCORE", ALL, ALL;
    ZRem => "ZREM", ALL, ALL;
    ZRemRangeByRank => "ZREMRANGEBYRANK", ALL, ALL;
    ZRemRangeByScore => "ZREMRANGEBYSCORE", ALL, ALL;
    ZInterStore => "ZINTERSTORE", ALL, ALL;
    ZUnionStore => "ZUNIONSTORE", ALL, ALL;
    ZPopMin => "ZPOPMIN", ALL, ALL;
    ZPopMax => "ZPOPMAX", ALL, ALL;
    ZScan => "ZSCAN", ALL, ALL;

    // hyperloglog
    PfAdd => "PFADD", ALL, ALL;
    PfCount => "PFCOUNT", ALL, ALL;
    PfMerge => "PFMERGE", ALL, ALL;

    // geo
    GeoAdd => "GEOADD", ALL, ALL;
    GeoPos => "GEOPOS", ALL, ALL;
    GeoDist => "GEODIST", ALL, ALL;
    GeoHash => "GEOHASH", ALL, ALL;
    GeoRadius => "GEORADIUS", ALL, ALL;
    GeoRadiusByMember => "GEORADIUSBYMEMBER", ALL, ALL;

    // stream
    XAdd => "XADD", ALL, ALL;
    XLen => "XLEN", ALL, ALL;
    XRange => "XRANGE", ALL, ALL;
    XRevRange => "XREVRANGE", ALL, ALL;
    XDel => "XDEL", ALL, ALL;
    XTrim => "XTRIM", ALL, ALL;

    // pub/sub
    Publish => "PUBLISH", NO_PIPELINE, NOT_SHARDED;
    Subscribe => "SUBSCRIBE", DIRECT, NOT_SHARDED;
    PSubscribe => "PSUBSCRIBE", DIRECT, NOT_SHARDED;
    PubSubChannels => "PUBSUB CHANNELS", ALL, NOT_SHARDED;
    PubSubNumSub => "PUBSUB NUMSUB", ALL, NOT_SHARDED;
    PubSubNumPat => "PUBSUB NUMPAT", ALL, NOT_SHARDED;

    // transaction
    Multi => "MULTI", DIRECT, NODE;
    Exec => "EXEC", TRANSACTION, NODE;
    Discard => "DISCARD", TRANSACTION, NODE;
    Watch => "WATCH", DIRECT, NODE;
    Unwatch => "UNWATCH", DIRECT, NODE;

    // scripting
    Eval => "EVAL", ALL, ALL;
    EvalSha => "EVALSHA", ALL, ALL;
    ScriptLoad => "SCRIPT LOAD", ALL, NODE;
    ScriptExists => "SCRIPT EXISTS", ALL, NODE;
    ScriptFlush => "SCRIPT FLUSH", ALL, NODE;
    ScriptKill => "SCRIPT KILL", DIRECT, NODE;

    // connection
    Ping => "PING", ALL, NOT_SHARDED;
    Echo => "ECHO", ALL, NOT_SHARDED;
    Select => "SELECT", ALL, NODE;
    ClientSetName => "CLIENT SETNAME", ALL, NODE;
    ClientGetName => "CLIENT GETNAME", ALL, NODE;
    ClientId => "CLIENT ID", ALL, NODE;
    ClientList => "CLIENT LIST", ALL, NODE;

    // server and configuration
    Info => "INFO", ALL, NODE;
    DbSize => "DBSIZE", ALL, NODE;
    FlushDb => "FLUSHDB", ALL, NODE;
    FlushAll => "FLUSHALL", ALL, NODE;
    Time => "TIME", ALL, NODE;
    LastSave => "LASTSAVE", ALL, NODE;
    Save => "SAVE", ALL, NODE;
    BgSave => "BGSAVE", ALL, NODE;
    BgRewriteAof => "BGREWRITEAOF", ALL, NODE;
    ConfigGet => "CONFIG GET", ALL, NODE;
    ConfigSet => "CONFIG SET", ALL, NODE;
    ConfigResetStat => "CONFIG RESETSTAT", ALL, NODE;
    ConfigRewrite => "CONFIG REWRITE", ALL, NODE;

    // debug
    ObjectEncoding => "OBJECT ENCODING", ALL, ALL;
    ObjectRefCount => "OBJECT REFCOUNT", ALL, ALL;
    ObjectIdleTime => "OBJECT IDLETIME", ALL, ALL;
    SlowLogGet => "SLOWLOG GET", ALL, NODE;
    SlowLogLen => "SLOWLOG LEN", ALL, NODE;
    SlowLogReset => "SLOWLOG RESET", ALL, NODE;

    // cluster
    ClusterKeySlot => "CLUSTER KEYSLOT", NO_TRANSACTION, CLUSTER;
    ClusterInfo => "CLUSTER INFO", NO_TRANSACTION, CLUSTER;
    ClusterMyId => "CLUSTER MYID", NO_TRANSACTION, CLUSTER;
    ClusterNodes => "CLUSTER NODES", NO_TRANSACTION, CLUSTER;
    ClusterSlots => "CLUSTER SLOTS", NO_TRANSACTION, CLUSTER;
    ClusterCountKeysInSlot => "CLUSTER COUNTKEYSINSLOT", NO_TRANSACTION, CLUSTER;
    ClusterGetKeysInSlot => "CLUSTER GETKEYSINSLOT", NO_TRANSACTION, CLUSTER;
    ClusterMeet => "CLUSTER MEET", NO_TRANSACTION, CLUSTER;
    ClusterForget => "CLUSTER FORGET", NO_TRANSACTION, CLUSTER;
    ClusterReset => "CLUSTER RESET", NO_TRANSACTION, CLUSTER;

    // replication
    ReplicaOf => "REPLICAOF", ALL, NODE;
    Role => "ROLE", ALL, NODE;
    ReadOnly => "READONLY", DIRECT, CLUSTER;
    ReadWrite => "READWRITE", DIRECT, CLUSTER;

    // access control
    AclWhoAmI => "ACL WHOAMI", ALL, NODE;
    AclUsers => "ACL USERS", ALL, NODE;
    AclCat => "ACL CAT", ALL, NODE;
    AclList => "ACL LIST", ALL, NODE;
    AclSetUser => "ACL SETUSER", ALL, NODE;
    AclDelUser => "ACL DELUSER", ALL, NODE;
    AclGenPass => "ACL GENPASS", ALL, NODE;
}

impl Command {
    /// Wire name, e.g. `"CLUSTER KEYSLOT"`
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_bridge_core::{ExecutionMode, Topology};
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_uppercase() {
        let mut seen = HashSet::new();
        for command in Command::ALL {
            let name = command.name();
            assert!(seen.insert(name), "duplicate entry for {name}");
            assert_eq!(name, name.to_uppercase());
            assert!(!command.spec().modes.is_empty());
            assert!(!command.spec().topologies.is_empty());
        }
    }

    #[test]
    fn test_every_command_runs_directly_except_batch_terminators() {
        for command in Command::ALL {
            let direct = command.spec().modes.allows(ExecutionMode::Direct);
            let terminator = matches!(command, Command::Exec | Command::Discard);
            assert_eq!(direct, !terminator, "{command}");
        }
    }

    #[test]
    fn test_pubsub_capabilities() {
        let publish = Command::Publish.spec();
        assert!(publish.modes.allows(ExecutionMode::Transactional));
        assert!(!publish.modes.allows(ExecutionMode::Pipelined));

        let subscribe = Command::Subscribe.spec();
        assert!(!subscribe.modes.allows(ExecutionMode::Transactional));
        assert!(!subscribe.topologies.allows(Topology::Sharded));
    }

    #[test]
    fn test_cluster_commands_need_a_cluster() {
        let slot = Command::ClusterKeySlot.spec();
        assert!(slot.topologies.allows(Topology::Cluster));
        assert!(!slot.topologies.allows(Topology::Standalone));
        assert!(!slot.topologies.allows(Topology::Sentinel));
    }

    #[test]
    fn test_scan_is_not_transactional() {
        assert!(!Command::Scan.spec().modes.allows(ExecutionMode::Transactional));
        assert!(Command::HScan.spec().modes.allows(ExecutionMode::Transactional));
    }

    #[test]
    fn test_display_uses_wire_name() {
        assert_eq!(Command::ClusterKeySlot.to_string(), "CLUSTER KEYSLOT");
        assert_eq!(Command::BitFieldRo.to_string(), "BITFIELD_RO");
    }
}
