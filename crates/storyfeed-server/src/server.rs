use storyfeed_core::{Feed, FeedConfig};
use tokio::net::TcpListener;

use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// storyfeed HTTP server over in-memory stores.
pub struct FeedServer {
    config: FeedConfig,
    feed: Feed,
}

impl FeedServer {
    pub fn new(config: FeedConfig) -> ServerResult<Self> {
        let feed = Feed::in_memory(&config)?;
        Ok(Self { config, feed })
    }

    /// Serve an existing feed, e.g. one wired to other stores.
    pub fn with_feed(config: FeedConfig, feed: Feed) -> Self {
        Self { config, feed }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.feed.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let bind_addr = self.config.server.bind_addr;
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!(%bind_addr, "storyfeed server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
