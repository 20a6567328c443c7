use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::NodeConfig;

/// Removes a node data directory. A directory that is already gone counts as removed.
pub(crate) async fn remove_data_dir(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!("removed data dir: {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Removes the data directories of discarded nodes, logging failures.
pub(crate) async fn remove_data_dirs<'a>(configs: impl IntoIterator<Item = &'a NodeConfig>) {
    for config in configs {
        if let Err(e) = remove_data_dir(&config.data_dir).await {
            warn!("failed to remove data dir {:?}: {}", config.data_dir, e);
        }
    }
}
