//! Ephemeral multi-node index server clusters for integration tests.
//!
//! The crate allocates ports, wires gossip membership (bind address, gossip
//! port, gossip seed, host list), starts nodes in order and rolls a cluster
//! back when one of its nodes fails to start. The index server itself is an
//! external collaborator reached through [`IndexServer`] and [`ServerFactory`].
//!
//! ```ignore
//! let cluster = new_cluster(3, |config: &NodeConfig| MyServer::new(config.clone())).await?;
//! assert_eq!(cluster.len(), 3);
//! cluster.shutdown().await?;
//! ```

mod cluster;
mod config;
mod constants;
mod errors;
mod network;
mod node;
pub(crate) mod utils;

pub use cluster::*;
pub use config::*;
pub use errors::*;
pub use network::*;
pub use node::*;

//-----------------------------------------------------------
// Test utils
