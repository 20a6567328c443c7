//! Bootstraps a test cluster and rolls it back when a node fails to start.
//!
//! ## Steps
//! 1. Build one [`NodeConfig`] per node (two probed ports and a data dir each)
//! 2. Point every node after the first at node 0's gossip seed
//! 3. Hand every node the full list of bind addresses
//! 4. Start nodes one at a time, in index order; node 0 has to be listening
//!    before anyone can join through it
//! 5. If node `i` fails, close nodes `0..=i` in order and report which node failed
//!
//! There are no retries. A build either returns a cluster where every node is
//! running, or an error after everything it started has been closed.
//!
//! ## Example
//! ```ignore
//! let cluster = ClusterBuilder::new(|config: &NodeConfig| MyServer::new(config.clone()))
//!     .size(3)
//!     .config(HarnessConfig::new()?)
//!     .build()
//!     .await?;
//! // ...
//! cluster.shutdown().await?;
//! ```

use std::collections::VecDeque;

use tracing::error;
use tracing::info;
use tracing::warn;

use super::Cluster;
use crate::utils::file_io::remove_data_dirs;
use crate::Error;
use crate::HarnessConfig;
use crate::IndexServer;
use crate::Node;
use crate::NodeConfig;
use crate::NodeConfigFactory;
use crate::OsPortAllocator;
use crate::PortAllocator;
use crate::Result;
use crate::RollbackFailure;
use crate::RollbackPolicy;
use crate::ServerFactory;
use crate::StartError;

pub struct ClusterBuilder<F> {
    factory: F,
    size: usize,
    config: HarnessConfig,
    allocator: Option<Box<dyn PortAllocator>>,
}

impl<F> ClusterBuilder<F>
where
    F: ServerFactory,
{
    /// Single-node cluster with default harness settings
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            size: 1,
            config: HarnessConfig::default(),
            allocator: None,
        }
    }

    /// Number of nodes. Zero builds an empty cluster.
    pub fn size(
        mut self,
        size: usize,
    ) -> Self {
        self.size = size;
        self
    }

    pub fn config(
        mut self,
        config: HarnessConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn rollback(
        mut self,
        policy: RollbackPolicy,
    ) -> Self {
        self.config.rollback = policy;
        self
    }

    /// Overrides port probing. Defaults to [`OsPortAllocator`] on the configured probe host.
    pub fn allocator(
        mut self,
        allocator: impl PortAllocator + 'static,
    ) -> Self {
        self.allocator = Some(Box::new(allocator));
        self
    }

    pub async fn build(self) -> Result<Cluster<F::Server>> {
        let ClusterBuilder {
            factory,
            size,
            config,
            allocator,
        } = self;
        let config = config.validate()?;
        let allocator =
            allocator.unwrap_or_else(|| Box::new(OsPortAllocator::new(&config.probe_host)));
        let config_factory = NodeConfigFactory::with_allocator(&config, allocator);

        info!(size, "building test cluster");
        let configs = plan_configs(&config_factory, size, config.cleanup_data_dirs).await?;

        let mut nodes: Vec<Node<F::Server>> = Vec::with_capacity(size);
        let mut pending: VecDeque<NodeConfig> = configs.into();
        while let Some(node_config) = pending.pop_front() {
            let index = nodes.len();
            match start_node(&factory, index, size, node_config, &mut nodes, &config).await {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    if config.cleanup_data_dirs {
                        remove_data_dirs(&pending).await;
                    }
                    return Err(e);
                }
            }
        }

        info!(size, seed = ?nodes.first().map(|n| &n.config().gossip_seed), "test cluster running");
        Ok(Cluster::new(nodes, config.cleanup_data_dirs))
    }
}

/// Builds a cluster of `size` nodes with harness settings loaded from the environment.
pub async fn new_cluster<F>(
    size: usize,
    factory: F,
) -> Result<Cluster<F::Server>>
where
    F: ServerFactory,
{
    ClusterBuilder::new(factory).size(size).config(HarnessConfig::new()?).build().await
}

/// Configures and starts one standalone node that seeds itself.
pub async fn start_single_node<F>(
    factory: F,
    config: HarnessConfig,
) -> Result<Node<F::Server>>
where
    F: ServerFactory,
{
    let config = config.validate()?;
    let config_factory = NodeConfigFactory::new(&config);

    let mut node_config = config_factory
        .new_node_config()
        .map_err(|source| Error::NodeConfig {
            index: 0,
            size: 1,
            source,
        })?;
    let hosts = vec![node_config.bind.clone()];
    wire_membership(std::slice::from_mut(&mut node_config), &hosts);

    start_node(&factory, 0, 1, node_config, &mut [], &config).await
}

/// Steps 1-3: one config per node, wired for mutual membership.
async fn plan_configs<A>(
    config_factory: &NodeConfigFactory<A>,
    size: usize,
    cleanup_data_dirs: bool,
) -> Result<Vec<NodeConfig>>
where
    A: PortAllocator,
{
    let mut configs = Vec::with_capacity(size);
    let mut hosts = Vec::with_capacity(size);

    for index in 0..size {
        match config_factory.new_node_config() {
            Ok(node_config) => {
                hosts.push(node_config.bind.clone());
                configs.push(node_config);
            }
            Err(source) => {
                error!(index, size, error = %source, "failed to build node config");
                if cleanup_data_dirs {
                    remove_data_dirs(&configs).await;
                }
                return Err(Error::NodeConfig { index, size, source });
            }
        }
    }

    wire_membership(&mut configs, &hosts);
    Ok(configs)
}

/// Node 0 keeps its self-seed, every later node joins through it, and every
/// node gets the same host list.
pub(crate) fn wire_membership(
    configs: &mut [NodeConfig],
    hosts: &[String],
) {
    if let Some((seed_node, joiners)) = configs.split_first_mut() {
        for config in joiners {
            config.join_through(&seed_node.gossip_seed);
        }
    }

    for config in configs.iter_mut() {
        config.cluster.hosts = hosts.to_vec();
    }
}

/// Creates and starts node `index`. On failure, rolls back `started` and the
/// failing node itself before returning the start error.
async fn start_node<F>(
    factory: &F,
    index: usize,
    size: usize,
    node_config: NodeConfig,
    started: &mut [Node<F::Server>],
    harness: &HarnessConfig,
) -> Result<Node<F::Server>>
where
    F: ServerFactory,
{
    let server = factory.create(&node_config);
    let mut node = Node::new(index, node_config, server);

    let source = match node.start().await {
        Ok(()) => return Ok(node),
        Err(source) => source,
    };
    error!(index, size, error = %source, "node failed to start, rolling back");

    let rollback_failures =
        rollback(started.iter_mut().chain(std::iter::once(&mut node)), harness.rollback).await;

    if harness.cleanup_data_dirs {
        remove_data_dirs(started.iter().map(Node::config).chain(std::iter::once(node.config())))
            .await;
    }

    Err(Box::new(StartError {
        index,
        size,
        config: node.into_config(),
        source,
        rollback_failures,
    })
    .into())
}

/// Closes every node in order. Each close is attempted whatever happened to
/// the previous one; failures are logged, and kept only under
/// [`RollbackPolicy::Collect`].
async fn rollback<'a, S>(
    nodes: impl IntoIterator<Item = &'a mut Node<S>>,
    policy: RollbackPolicy,
) -> Vec<RollbackFailure>
where
    S: IndexServer + 'a,
{
    let mut failures = Vec::new();

    for node in nodes {
        if let Err(source) = node.close().await {
            warn!(index = node.index(), error = %source, "rollback close failed");
            if policy == RollbackPolicy::Collect {
                failures.push(RollbackFailure {
                    index: node.index(),
                    source,
                });
            }
        }
    }

    failures
}
