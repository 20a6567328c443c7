use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Membership mode of the index server.
///
/// Only gossip membership is supported: nodes discover each other through a
/// seed address and periodic peer exchange.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    #[default]
    Gossip,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterType::Gossip => "gossip",
        }
    }
}

/// Cluster section of a node's configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ClusterSection {
    #[serde(rename = "type")]
    pub cluster_type: ClusterType,

    /// Bind addresses of every node in the cluster, in construction order
    #[serde(default)]
    pub hosts: Vec<String>,
}

/// Startup parameters of one index server node
///
/// Produced by [`crate::NodeConfigFactory`] with the node seeding itself and an
/// empty host list; cluster construction then points every node at node 0's
/// seed and broadcasts the full host list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Client bind address (`host:port`)
    pub bind: String,

    pub gossip_port: u16,

    /// Gossip address (`host:port`) this node joins the cluster through
    pub gossip_seed: String,

    pub cluster: ClusterSection,

    /// Temporary directory for persisted state, unique per node
    pub data_dir: PathBuf,
}

impl NodeConfig {
    /// Host part of the bind address
    pub fn host(&self) -> &str {
        split_host_port(&self.bind).map(|(host, _)| host).unwrap_or(&self.bind)
    }

    /// Port part of the bind address
    pub fn bind_port(&self) -> Option<u16> {
        split_host_port(&self.bind).and_then(|(_, port)| port.parse().ok())
    }

    /// This node's own gossip address (`host:gossip_port`)
    pub fn gossip_address(&self) -> String {
        format!("{}:{}", self.host(), self.gossip_port)
    }

    /// True when the node joins through its own gossip address
    pub fn is_seed(&self) -> bool {
        self.gossip_seed == self.gossip_address()
    }

    /// Points this node at another node's gossip address.
    pub fn join_through(
        &mut self,
        seed: &str,
    ) {
        self.gossip_seed = seed.to_string();
    }
}

fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    addr.rsplit_once(':')
}
