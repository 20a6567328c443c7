//! Lifecycle handle of one cluster node.
//!
//! ## States
//! ```text
//! Configured -> Starting -> Running -> Closed
//!                        \-> Failed  -> Closed   (rollback only)
//! ```
//! A node only exists once its configuration does, so there is no observable
//! state before `Configured`. `Closed` is terminal and closing twice is a no-op.

use std::fmt;

use tracing::debug;
use tracing::info;

use crate::IndexServer;
use crate::NodeConfig;
use crate::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Configured,
    Starting,
    Running,
    Failed,
    Closed,
}

pub struct Node<S> {
    index: usize,
    config: NodeConfig,
    server: S,
    state: NodeState,
}

impl<S> Node<S>
where
    S: IndexServer,
{
    pub(crate) fn new(
        index: usize,
        config: NodeConfig,
        server: S,
    ) -> Self {
        Self {
            index,
            config,
            server,
            state: NodeState::Configured,
        }
    }

    /// Position in the cluster, 0-based
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == NodeState::Running
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut S {
        &mut self.server
    }

    pub(crate) fn into_config(self) -> NodeConfig {
        self.config
    }

    /// Runs the server. Only legal from `Configured`.
    pub async fn start(&mut self) -> std::result::Result<(), NodeError> {
        if self.state != NodeState::Configured {
            return Err(self.invalid_transition("start"));
        }

        self.state = NodeState::Starting;
        debug!(index = self.index, bind = %self.config.bind, "starting node");

        match self.server.run().await {
            Ok(()) => {
                self.state = NodeState::Running;
                info!(index = self.index, bind = %self.config.bind, seed = %self.config.gossip_seed, "node running");
                Ok(())
            }
            Err(source) => {
                self.state = NodeState::Failed;
                Err(NodeError::Server { source })
            }
        }
    }

    /// Closes the server.
    ///
    /// Legal from `Running`, and from `Starting`/`Failed` so a rollback can
    /// release whatever a failed start left behind. The node ends up `Closed`
    /// even when the server reports an error.
    pub async fn close(&mut self) -> std::result::Result<(), NodeError> {
        match self.state {
            NodeState::Closed => Ok(()),
            NodeState::Configured => Err(self.invalid_transition("close")),
            NodeState::Starting | NodeState::Running | NodeState::Failed => {
                let result = self.server.close().await;
                self.state = NodeState::Closed;
                debug!(index = self.index, ok = result.is_ok(), "node closed");
                result.map_err(|source| NodeError::Server { source })
            }
        }
    }

    fn invalid_transition(
        &self,
        operation: &'static str,
    ) -> NodeError {
        NodeError::InvalidTransition {
            index: self.index,
            operation,
            state: self.state,
        }
    }
}

impl<S> fmt::Debug for Node<S> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Node")
            .field("index", &self.index)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}
