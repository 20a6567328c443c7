//! Running test clusters.
//!
//! [`ClusterBuilder`] brings a cluster up; a successful build hands every node
//! to a [`Cluster`], which owns them until [`Cluster::shutdown`] or
//! [`Cluster::into_nodes`].

mod builder;
pub use builder::*;

use std::fmt;

use tracing::info;
use tracing::warn;

use crate::utils::file_io::remove_data_dirs;
use crate::Error;
use crate::IndexServer;
use crate::Node;
use crate::Result;

/// Ordered, fixed-size set of running nodes.
///
/// Node 0 is the gossip seed every other node joined through.
pub struct Cluster<S> {
    nodes: Vec<Node<S>>,
    cleanup_data_dirs: bool,
}

impl<S> Cluster<S>
where
    S: IndexServer,
{
    pub(crate) fn new(
        nodes: Vec<Node<S>>,
        cleanup_data_dirs: bool,
    ) -> Self {
        Self {
            nodes,
            cleanup_data_dirs,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node<S>] {
        &self.nodes
    }

    pub fn node(
        &self,
        index: usize,
    ) -> Option<&Node<S>> {
        self.nodes.get(index)
    }

    pub fn node_mut(
        &mut self,
        index: usize,
    ) -> Option<&mut Node<S>> {
        self.nodes.get_mut(index)
    }

    /// Bind addresses of all nodes, in construction order
    pub fn hosts(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.config().bind.as_str()).collect()
    }

    /// Gossip seed shared by every node
    pub fn seed(&self) -> Option<&str> {
        self.nodes.first().map(|n| n.config().gossip_seed.as_str())
    }

    /// Gives up ownership of the nodes without closing them.
    pub fn into_nodes(self) -> Vec<Node<S>> {
        self.nodes
    }

    /// Closes every node in construction order.
    ///
    /// All nodes get a close attempt even if an earlier one fails; the first
    /// failure is returned.
    pub async fn shutdown(mut self) -> Result<()> {
        let mut first_failure = None;

        for node in self.nodes.iter_mut() {
            if let Err(source) = node.close().await {
                warn!(index = node.index(), error = %source, "node failed to close during shutdown");
                if first_failure.is_none() {
                    first_failure = Some(Error::Shutdown {
                        index: node.index(),
                        source,
                    });
                }
            }
        }

        if self.cleanup_data_dirs {
            remove_data_dirs(self.nodes.iter().map(Node::config)).await;
        }

        info!(size = self.nodes.len(), ok = first_failure.is_none(), "test cluster shut down");
        first_failure.map_or(Ok(()), Err)
    }
}

impl<S> fmt::Debug for Cluster<S> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Cluster").field("nodes", &self.nodes).finish()
    }
}
