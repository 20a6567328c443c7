use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::NodeConfig;
use crate::ServerError;

/// Lifecycle of one external index server instance.
///
/// The harness never looks inside the runtime; it only needs to start it and
/// stop it again.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IndexServer: Send {
    /// Starts the server and returns once it is ready to serve, or failed.
    async fn run(&mut self) -> std::result::Result<(), ServerError>;

    /// Stops the server, releasing its ports and temporary state.
    async fn close(&mut self) -> std::result::Result<(), ServerError>;
}

/// Produces a server instance configured with a [`NodeConfig`].
///
/// Any `Fn(&NodeConfig) -> S` is a factory:
/// ```ignore
/// let cluster = ClusterBuilder::new(|config: &NodeConfig| MyServer::new(config.clone()))
///     .size(3)
///     .build()
///     .await?;
/// ```
pub trait ServerFactory {
    type Server: IndexServer;

    fn create(
        &self,
        config: &NodeConfig,
    ) -> Self::Server;
}

impl<F, S> ServerFactory for F
where
    F: Fn(&NodeConfig) -> S,
    S: IndexServer,
{
    type Server = S;

    fn create(
        &self,
        config: &NodeConfig,
    ) -> S {
        self(config)
    }
}
