//! Engine bootstrap and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{AppError, ViewerConfig};
use crate::ingest::{IngestionHandle, IngestionPipeline, IngestionStats};
use crate::session::ViewerSession;
use crate::state::StateStore;
use crate::tiles::TileCache;

/// Grace period for ingestion tasks to wind down on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running engine: shared state, ingestion tasks and the tile cache.
///
/// Owns a dedicated Tokio runtime for the ingestion tasks so the caller's
/// render loop can stay synchronous, including blocking tile fetches.
///
/// # Example
///
/// ```ignore
/// let app = MeshViewApp::start(ViewerConfig::from_env()?, CancellationToken::new())?;
/// let mut session = app.session();
///
/// while !app.is_cancelled() {
///     let frame = session.frame(Instant::now());
///     // draw frame
/// }
///
/// app.shutdown();
/// ```
pub struct MeshViewApp {
    store: Arc<StateStore>,
    tiles: Arc<TileCache>,
    ingestion: IngestionHandle,
    config: ViewerConfig,
    runtime: Runtime,
}

impl MeshViewApp {
    /// Start the engine.
    ///
    /// Must be called from a non-async context.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime, tile cache or HTTP client cannot be
    /// created. Network reachability is not checked here.
    pub fn start(config: ViewerConfig, cancellation: CancellationToken) -> Result<Self, AppError> {
        info!(server = %config.server_url, "Starting meshview engine");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("meshview-ingest")
            .enable_all()
            .build()
            .map_err(|e| AppError::RuntimeCreation(e.to_string()))?;

        let tiles = Arc::new(TileCache::open(config.cache_dir.clone(), config.tile_source())?);
        info!(
            directory = %config.cache_dir.display(),
            template = %config.tile_url,
            "Tile cache ready"
        );

        let store = Arc::new(StateStore::new());
        let ingestion = {
            let _guard = runtime.enter();
            IngestionPipeline::start(Arc::clone(&store), config.ingestion(), cancellation)?
        };

        Ok(Self {
            store,
            tiles,
            ingestion,
            config,
            runtime,
        })
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    pub fn tiles(&self) -> Arc<TileCache> {
        Arc::clone(&self.tiles)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// A new render-side session over the shared state.
    pub fn session(&self) -> ViewerSession {
        ViewerSession::new(self.store())
    }

    pub fn stats(&self) -> IngestionStats {
        self.ingestion.stats()
    }

    pub fn is_cancelled(&self) -> bool {
        self.ingestion.is_cancelled()
    }

    /// Block until the cancellation token fires.
    pub fn wait_for_cancellation(&self) {
        let token = self.ingestion.cancellation();
        self.runtime.block_on(token.cancelled());
    }

    /// Stop ingestion and release the runtime. Returns the final counters.
    pub fn shutdown(self) -> IngestionStats {
        info!("Shutting down meshview engine");
        let stats = self.runtime.block_on(self.ingestion.shutdown());
        self.runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        info!(
            connections = stats.connections,
            events = stats.events_applied,
            polls = stats.polls_succeeded,
            "Shutdown complete"
        );
        stats
    }
}
