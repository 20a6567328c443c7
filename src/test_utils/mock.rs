use std::collections::VecDeque;
use std::sync::Mutex;

use super::LOOPBACK;
use crate::find_free_port_on;
use crate::AllocationError;
use crate::MockIndexServer;
use crate::MockPortAllocator;
use crate::NodeConfig;

/// Mock server whose `run` succeeds or fails, expecting exactly `closes` close calls
pub(crate) fn mock_server(
    run_ok: bool,
    closes: usize,
    close_ok: bool,
) -> MockIndexServer {
    let mut server = MockIndexServer::new();
    server.expect_run().times(1).returning(move || {
        if run_ok {
            Ok(())
        } else {
            Err("bind: address already in use".into())
        }
    });
    server.expect_close().times(closes).returning(move || {
        if close_ok {
            Ok(())
        } else {
            Err("close: listener already gone".into())
        }
    });
    server
}

/// Starts fine and is never closed
pub(crate) fn running_server() -> MockIndexServer {
    mock_server(true, 0, true)
}

/// Starts fine and is closed once
pub(crate) fn closed_server() -> MockIndexServer {
    mock_server(true, 1, true)
}

/// Fails to start and is closed once by the rollback
pub(crate) fn failing_server() -> MockIndexServer {
    mock_server(false, 1, true)
}

/// Hands out pre-scripted mock servers in order and records the configs they were built with
pub(crate) struct ScriptedServers {
    servers: Mutex<VecDeque<MockIndexServer>>,
    seen: Mutex<Vec<NodeConfig>>,
}

impl ScriptedServers {
    pub(crate) fn new(servers: Vec<MockIndexServer>) -> Self {
        Self {
            servers: Mutex::new(servers.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn create(
        &self,
        config: &NodeConfig,
    ) -> MockIndexServer {
        self.seen.lock().unwrap().push(config.clone());
        self.servers.lock().unwrap().pop_front().expect("no scripted server left")
    }

    /// Configs servers were created with, in creation order
    pub(crate) fn seen(&self) -> Vec<NodeConfig> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.servers.lock().unwrap().len()
    }
}

/// Allocator probing loopback that fails on the `failing_call`-th request (1-based)
pub(crate) fn allocator_failing_at(failing_call: usize) -> MockPortAllocator {
    let mut allocator = MockPortAllocator::new();
    let mut calls = 0;
    allocator.expect_find_free_port().returning(move || {
        calls += 1;
        if calls == failing_call {
            Err(AllocationError::NoAddress {
                host: "scripted".to_string(),
            })
        } else {
            find_free_port_on(LOOPBACK)
        }
    });
    allocator
}
