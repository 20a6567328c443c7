//! Test Cluster Error Hierarchy
//!
//! Errors are layered the same way a cluster comes up: port probing,
//! per-node configuration assembly, node lifecycle, then cluster assembly.
//! Every layer wraps its cause instead of discarding it. The only errors
//! that are intentionally dropped are close failures during best-effort
//! rollback (see [`crate::RollbackPolicy`]).

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use config::ConfigError;

use crate::NodeConfig;
use crate::NodeState;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by the external index server runtime.
pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Port probing failed outside of node configuration
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Configuration for one node could not be assembled; no node was started
    #[error("building config for node {} of {}", .index + 1, .size)]
    NodeConfig {
        index: usize,
        size: usize,
        #[source]
        source: NodeConfigError,
    },

    /// A node failed to start and the nodes before it were rolled back
    #[error(transparent)]
    Start(#[from] Box<StartError>),

    /// A node of a running cluster failed to close during shutdown
    #[error("closing node {} of cluster", .index + 1)]
    Shutdown {
        index: usize,
        #[source]
        source: NodeError,
    },

    /// Harness configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("resolving new port addr {host}:0: {source}")]
    Resolve { host: String, source: io::Error },

    #[error("new port addr {host}:0 resolved to no address")]
    NoAddress { host: String },

    #[error("listening on {addr} to get new port: {source}")]
    Listen { addr: SocketAddr, source: io::Error },

    #[error("reading probe listener address: {0}")]
    LocalAddr(#[source] io::Error),

    /// The OS handed back port 0, which can never be bound by a node
    #[error("probe listener on {addr} reported no assigned port")]
    Unassigned { addr: SocketAddr },
}

#[derive(Debug, thiserror::Error)]
pub enum NodeConfigError {
    #[error("getting port: {0}")]
    ClientPort(#[source] AllocationError),

    #[error("getting gossip port: {0}")]
    GossipPort(#[source] AllocationError),

    #[error("creating data dir under {}: {}", .root.display(), .source)]
    DataDir { root: PathBuf, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Lifecycle operation requested from a state that does not allow it
    #[error("node {} cannot {} while {:?}", .index + 1, .operation, .state)]
    InvalidTransition {
        index: usize,
        operation: &'static str,
        state: NodeState,
    },

    /// Failure reported by the index server runtime
    #[error("index server: {source}")]
    Server { source: ServerError },
}

/// A node failed to start during cluster construction.
///
/// Carries the failing node's full configuration for diagnosis. Positions in
/// the message are 1-based (`starting node 2 of 3`), `index` is 0-based.
#[derive(Debug, thiserror::Error)]
#[error("starting node {} of {}, config: {:?}", .index + 1, .size, .config)]
pub struct StartError {
    pub index: usize,
    pub size: usize,
    pub config: NodeConfig,
    #[source]
    pub source: NodeError,
    /// Close failures observed while rolling back. Always empty under
    /// [`crate::RollbackPolicy::BestEffort`].
    pub rollback_failures: Vec<RollbackFailure>,
}

/// One close failure recorded during rollback.
#[derive(Debug)]
pub struct RollbackFailure {
    pub index: usize,
    pub source: NodeError,
}
