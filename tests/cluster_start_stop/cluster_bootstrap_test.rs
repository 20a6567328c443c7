use std::collections::HashSet;

use index_test_cluster::start_single_node;
use index_test_cluster::ClusterBuilder;
use index_test_cluster::ClusterType;
use index_test_cluster::NodeState;
use tokio::net::TcpStream;

use crate::common::is_free;
use crate::common::loopback_config;
use crate::common::loopback_server;

/// Case 1: start a 3 node cluster and check the gossip wiring, then stop it
#[tokio::test]
async fn test_three_node_cluster_membership_case1() {
    let root = tempfile::tempdir().unwrap();

    let cluster = ClusterBuilder::new(loopback_server)
        .size(3)
        .config(loopback_config(root.path()))
        .build()
        .await
        .unwrap();

    assert_eq!(cluster.len(), 3);
    assert!(cluster.nodes().iter().all(|n| n.state() == NodeState::Running));
    assert!(cluster.nodes().iter().all(|n| n.server().is_listening()));

    let hosts: Vec<String> = cluster.hosts().iter().map(|h| h.to_string()).collect();
    assert_eq!(hosts.iter().collect::<HashSet<_>>().len(), 3);

    let seed = cluster.node(0).unwrap().config();
    assert_eq!(seed.gossip_seed, format!("127.0.0.1:{}", seed.gossip_port));

    for node in cluster.nodes() {
        let config = node.config();
        assert_eq!(config.gossip_seed, seed.gossip_seed);
        assert_eq!(config.cluster.hosts, hosts);
        assert_eq!(config.cluster.cluster_type, ClusterType::Gossip);
        assert!(config.data_dir.is_dir());
    }

    cluster.shutdown().await.unwrap();
}

/// Case 2: every node accepts connections on its bind address while running
#[tokio::test]
async fn test_nodes_accept_connections_case2() {
    let root = tempfile::tempdir().unwrap();
    let cluster = ClusterBuilder::new(loopback_server)
        .size(2)
        .config(loopback_config(root.path()))
        .build()
        .await
        .unwrap();

    for bind in cluster.hosts() {
        assert!(TcpStream::connect(bind).await.is_ok());
    }

    cluster.shutdown().await.unwrap();
}

/// Case 3: shutdown releases every port and data dir
#[tokio::test]
async fn test_shutdown_releases_ports_case3() {
    let root = tempfile::tempdir().unwrap();
    let cluster = ClusterBuilder::new(loopback_server)
        .size(3)
        .config(loopback_config(root.path()))
        .build()
        .await
        .unwrap();
    let addrs: Vec<(String, String)> = cluster
        .nodes()
        .iter()
        .map(|n| (n.config().bind.clone(), n.config().gossip_address()))
        .collect();
    let data_dirs: Vec<_> = cluster.nodes().iter().map(|n| n.config().data_dir.clone()).collect();

    for (bind, gossip) in &addrs {
        assert!(!is_free(bind));
        assert!(!is_free(gossip));
    }

    cluster.shutdown().await.unwrap();

    for (bind, gossip) in &addrs {
        assert!(is_free(bind), "{bind} still taken");
        assert!(is_free(gossip), "{gossip} still taken");
    }
    assert!(data_dirs.iter().all(|d| !d.exists()));
}

/// Case 4: cluster sizes 1..=4 all come up complete
#[tokio::test]
async fn test_cluster_sizes_case4() {
    for size in 1..=4 {
        let root = tempfile::tempdir().unwrap();
        let cluster = ClusterBuilder::new(loopback_server)
            .size(size)
            .config(loopback_config(root.path()))
            .build()
            .await
            .unwrap();

        assert_eq!(cluster.len(), size);
        assert!(cluster.nodes().iter().all(|n| n.is_running()));
        assert!(cluster.nodes().iter().all(|n| n.config().cluster.hosts.len() == size));

        cluster.shutdown().await.unwrap();
    }
}

/// Case 5: a single standalone node seeds itself
#[tokio::test]
async fn test_single_node_case5() {
    let root = tempfile::tempdir().unwrap();

    let mut node = start_single_node(loopback_server, loopback_config(root.path()))
        .await
        .unwrap();

    assert!(node.is_running());
    assert!(node.config().is_seed());
    assert_eq!(node.config().cluster.hosts, vec![node.config().bind.clone()]);

    node.close().await.unwrap();
    assert!(is_free(&node.config().bind));
}
