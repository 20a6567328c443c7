// -
// Addresses

/// Host written into every node's bind address and gossip seed
pub(crate) const DEFAULT_BIND_HOST: &str = "localhost";

/// Wildcard host the port probe listens on
pub(crate) const WILDCARD_PROBE_HOST: &str = "0.0.0.0";

// -
// Storage

/// Prefix of each node's temporary data directory
pub(crate) const DATA_DIR_PREFIX: &str = "index-node-";

// -
// Configuration sources

/// Env var naming an optional harness config file
pub(crate) const CONFIG_PATH_ENV: &str = "HARNESS_CONFIG_PATH";

/// Prefix of env var overrides, e.g. `HARNESS__BIND_HOST`
pub(crate) const ENV_PREFIX: &str = "HARNESS";
