//! Execution modes, deployment topologies and the capability sets built
//! from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a session currently materializes command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Commands execute immediately and return their value
    #[default]
    Direct,
    /// Commands are batched and materialize when the pipeline is closed
    Pipelined,
    /// Commands are queued and materialize when the transaction commits
    Transactional,
}

impl ExecutionMode {
    /// Capability flag matching this mode
    #[must_use]
    pub const fn flag(self) -> Modes {
        match self {
            Self::Direct => Modes::DIRECT,
            Self::Pipelined => Modes::PIPELINE,
            Self::Transactional => Modes::TRANSACTION,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Pipelined => "pipelined",
            Self::Transactional => "transactional",
        })
    }
}

/// Redis deployment shape a client targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// A single Redis server
    Standalone,
    /// A master discovered through Redis Sentinel
    Sentinel,
    /// Redis Cluster with server-side slot routing
    Cluster,
    /// Independent servers sharded on the client by key hash
    Sharded,
}

impl Topology {
    /// Capability flag matching this topology
    #[must_use]
    pub const fn flag(self) -> Topologies {
        match self {
            Self::Standalone => Topologies::STANDALONE,
            Self::Sentinel => Topologies::SENTINEL,
            Self::Cluster => Topologies::CLUSTER,
            Self::Sharded => Topologies::SHARDED,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standalone => "standalone",
            Self::Sentinel => "sentinel",
            Self::Cluster => "cluster",
            Self::Sharded => "sharded",
        })
    }
}

bitflags::bitflags! {
    /// Execution modes a command may be issued in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modes: u8 {
        /// Immediate execution
        const DIRECT = 0b001;
        /// Inside an open pipeline
        const PIPELINE = 0b010;
        /// Between MULTI and EXEC
        const TRANSACTION = 0b100;
        /// Every mode
        const ALL = Self::DIRECT.bits() | Self::PIPELINE.bits() | Self::TRANSACTION.bits();
        /// Anything but a pipeline
        const NO_PIPELINE = Self::DIRECT.bits() | Self::TRANSACTION.bits();
        /// Anything but a transaction
        const NO_TRANSACTION = Self::DIRECT.bits() | Self::PIPELINE.bits();
    }
}

bitflags::bitflags! {
    /// Client topologies a command may be issued against
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Topologies: u8 {
        /// Single server
        const STANDALONE = 0b0001;
        /// Sentinel-managed master
        const SENTINEL = 0b0010;
        /// Redis Cluster
        const CLUSTER = 0b0100;
        /// Client-side sharding
        const SHARDED = 0b1000;
        /// Any client holding one logical server
        const NODE = Self::STANDALONE.bits() | Self::SENTINEL.bits();
        /// Any client with a server-side notion of the whole keyspace
        const NOT_SHARDED = Self::NODE.bits() | Self::CLUSTER.bits();
        /// Every topology
        const ALL = Self::NOT_SHARDED.bits() | Self::SHARDED.bits();
    }
}

impl Modes {
    /// Check whether `mode` is in this set
    #[must_use]
    pub const fn allows(self, mode: ExecutionMode) -> bool {
        self.contains(mode.flag())
    }
}

impl Topologies {
    /// Check whether `topology` is in this set
    #[must_use]
    pub const fn allows(self, topology: Topology) -> bool {
        self.contains(topology.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_sets() {
        assert!(Modes::ALL.allows(ExecutionMode::Transactional));
        assert!(!Modes::NO_PIPELINE.allows(ExecutionMode::Pipelined));
        assert!(Modes::NO_PIPELINE.allows(ExecutionMode::Transactional));
        assert!(!Modes::NO_TRANSACTION.allows(ExecutionMode::Transactional));
        assert!(Modes::DIRECT.allows(ExecutionMode::Direct));
        assert!(!Modes::DIRECT.allows(ExecutionMode::Pipelined));
    }

    #[test]
    fn test_topology_sets() {
        assert!(Topologies::NODE.allows(Topology::Sentinel));
        assert!(!Topologies::NODE.allows(Topology::Cluster));
        assert!(!Topologies::NOT_SHARDED.allows(Topology::Sharded));
        assert!(Topologies::ALL.allows(Topology::Sharded));
        assert!(!Topologies::CLUSTER.allows(Topology::Standalone));
    }

    #[test]
    fn test_default_mode_is_direct() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Direct);
        assert_eq!(ExecutionMode::Pipelined.to_string(), "pipelined");
        assert_eq!(Topology::Cluster.to_string(), "cluster");
    }
}
