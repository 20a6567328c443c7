use std::path::PathBuf;

use tracing::debug;

use super::ClusterSection;
use super::ClusterType;
use super::HarnessConfig;
use super::NodeConfig;
use crate::NodeConfigError;
use crate::OsPortAllocator;
use crate::PortAllocator;

/// Builds one node's startup configuration.
///
/// Each call probes two ports (client, then gossip) and creates a fresh data
/// directory. The probes run one after another, so the client probe socket is
/// already closed when the gossip port is requested and the OS does not hand
/// out the same port twice within one node.
pub struct NodeConfigFactory<A = OsPortAllocator> {
    allocator: A,
    bind_host: String,
    data_dir_root: PathBuf,
    data_dir_prefix: String,
}

impl NodeConfigFactory<OsPortAllocator> {
    pub fn new(config: &HarnessConfig) -> Self {
        Self::with_allocator(config, OsPortAllocator::new(&config.probe_host))
    }
}

impl<A> NodeConfigFactory<A>
where
    A: PortAllocator,
{
    pub fn with_allocator(
        config: &HarnessConfig,
        allocator: A,
    ) -> Self {
        Self {
            allocator,
            bind_host: config.bind_host.clone(),
            data_dir_root: config.data_dir_root(),
            data_dir_prefix: config.data_dir_prefix.clone(),
        }
    }

    /// Returns a self-seeded config with an empty host list.
    ///
    /// # Errors
    /// Wraps whichever step failed; nothing is returned on failure.
    pub fn new_node_config(&self) -> std::result::Result<NodeConfig, NodeConfigError> {
        let port = self.allocator.find_free_port().map_err(NodeConfigError::ClientPort)?;
        let gossip_port = self.allocator.find_free_port().map_err(NodeConfigError::GossipPort)?;

        let data_dir = tempfile::Builder::new()
            .prefix(&self.data_dir_prefix)
            .keep(true)
            .tempdir_in(&self.data_dir_root)
            .map_err(|source| NodeConfigError::DataDir {
                root: self.data_dir_root.clone(),
                source,
            })?
            .path()
            .to_path_buf();

        let config = NodeConfig {
            bind: format!("{}:{}", self.bind_host, port),
            gossip_port,
            gossip_seed: format!("{}:{}", self.bind_host, gossip_port),
            cluster: ClusterSection {
                cluster_type: ClusterType::Gossip,
                hosts: Vec::new(),
            },
            data_dir,
        };
        debug!(bind = %config.bind, gossip_port, data_dir = ?config.data_dir, "node config ready");

        Ok(config)
    }
}
