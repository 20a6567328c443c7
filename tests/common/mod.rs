#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use index_test_cluster::AllocationError;
use index_test_cluster::HarnessConfig;
use index_test_cluster::IndexServer;
use index_test_cluster::NodeConfig;
use index_test_cluster::OsPortAllocator;
use index_test_cluster::PortAllocator;
use index_test_cluster::ServerError;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tracing::debug;

pub const LOOPBACK: &str = "127.0.0.1";

/// Stand-in for the index server: holds the client and gossip ports open
/// while running, and dials its gossip seed when it is not the seed itself.
#[derive(Debug)]
pub struct LoopbackServer {
    config: NodeConfig,
    client: Option<TcpListener>,
    gossip: Option<TcpListener>,
}

impl LoopbackServer {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            config: config.clone(),
            client: None,
            gossip: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.client.is_some() && self.gossip.is_some()
    }
}

#[async_trait]
impl IndexServer for LoopbackServer {
    async fn run(&mut self) -> Result<(), ServerError> {
        let client = TcpListener::bind(&self.config.bind).await?;
        let gossip = TcpListener::bind(self.config.gossip_address()).await?;

        if !self.config.is_seed() {
            TcpStream::connect(&self.config.gossip_seed).await?;
            debug!("{} joined through {}", self.config.bind, self.config.gossip_seed);
        }

        self.client = Some(client);
        self.gossip = Some(gossip);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ServerError> {
        self.client.take();
        self.gossip.take();
        Ok(())
    }
}

/// Probes loopback, except that request number `call` (1-based) gets `port`
#[derive(Debug)]
pub struct PinnedPortAllocator {
    inner: OsPortAllocator,
    call: usize,
    port: u16,
    calls: AtomicUsize,
}

impl PinnedPortAllocator {
    pub fn new(
        call: usize,
        port: u16,
    ) -> Self {
        Self {
            inner: OsPortAllocator::new(LOOPBACK),
            call,
            port,
            calls: AtomicUsize::new(0),
        }
    }
}

impl PortAllocator for PinnedPortAllocator {
    fn find_free_port(&self) -> Result<u16, AllocationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.call {
            return Ok(self.port);
        }
        self.inner.find_free_port()
    }
}

pub fn loopback_config(root: &Path) -> HarnessConfig {
    HarnessConfig {
        bind_host: LOOPBACK.to_string(),
        probe_host: LOOPBACK.to_string(),
        data_dir_root: Some(root.to_path_buf()),
        ..Default::default()
    }
}

/// True when `addr` can be bound right now
pub fn is_free(addr: &str) -> bool {
    std::net::TcpListener::bind(addr).is_ok()
}

pub fn loopback_server(config: &NodeConfig) -> LoopbackServer {
    LoopbackServer::new(config)
}
