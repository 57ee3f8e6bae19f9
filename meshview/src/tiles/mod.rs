//! Disk-backed map tile cache.
//!
//! Tiles are stored on disk as `<root>/<z>/<x>/<y>.png` and decoded into
//! memory on first use. The in-memory table keeps the outcome of every
//! lookup for the lifetime of the cache, including failures: a tile that
//! could not be fetched or decoded is remembered as absent and is not
//! requested again until [`TileCache::clear`] is called or a new cache is
//! created.
//!
//! ```text
//! get(key) ──► memory ──hit──► Some(image) / None
//!                │
//!               miss
//!                ▼
//!              disk ──absent──► HttpClient::get ──► write file (best effort)
//!                │                                   │
//!                └──────────────► decode ◄───────────┘
//! ```

mod http;
mod source;

pub use http::{HttpClient, HttpError, ReqwestClient, CONNECT_TIMEOUT, USER_AGENT};
pub use source::{TileSource, DEFAULT_TILE_URL};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::TileKey;

/// A decoded tile shared with the renderer.
pub type TileImage = Arc<RgbaImage>;

/// Outcome of one tile lookup, filled once by whichever caller loads it.
type TileSlot = Arc<OnceLock<Option<TileImage>>>;

/// Errors while loading a single tile.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    Http(#[from] HttpError),

    #[error("Decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Lock-free counters for cache activity.
#[derive(Debug, Default)]
struct TileMetrics {
    memory_hits: AtomicU64,
    disk_loads: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of the tile cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    /// Lookups answered from memory (including remembered failures).
    pub memory_hits: u64,
    /// Tiles decoded from a file already on disk.
    pub disk_loads: u64,
    /// Network downloads attempted.
    pub fetches: u64,
    /// Lookups that ended without an image.
    pub failures: u64,
    /// Entries currently held in memory, including loads in progress.
    pub entries: usize,
}

/// Map tile cache over a disk directory and an HTTP tile source.
pub struct TileCache<C: HttpClient = ReqwestClient> {
    root: PathBuf,
    source: TileSource,
    client: C,
    entries: DashMap<TileKey, TileSlot>,
    metrics: TileMetrics,
}

impl TileCache<ReqwestClient> {
    /// Create a cache under `root` using the default reqwest client.
    pub fn open(root: impl Into<PathBuf>, source: TileSource) -> Result<Self, TileError> {
        Ok(Self::with_client(root, source, ReqwestClient::new()?))
    }
}

impl<C: HttpClient> TileCache<C> {
    pub fn with_client(root: impl Into<PathBuf>, source: TileSource, client: C) -> Self {
        Self {
            root: root.into(),
            source,
            client,
            entries: DashMap::new(),
            metrics: TileMetrics::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> &TileSource {
        &self.source
    }

    /// On-disk location of a tile.
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.root
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.png", key.y))
    }

    /// Return the tile image, loading it on first request.
    ///
    /// A miss blocks the caller on disk I/O and possibly a network fetch.
    /// Concurrent requests for the same tile wait for the first one instead
    /// of fetching again. The table itself is only locked to find the slot,
    /// so other tiles stay available while one is loading.
    pub fn get(&self, key: TileKey) -> Option<TileImage> {
        let slot = self.slot(key);
        if let Some(outcome) = slot.get() {
            self.metrics.memory_hits.fetch_add(1, Ordering::Relaxed);
            return outcome.clone();
        }

        slot.get_or_init(|| match self.load(key) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                warn!(tile = %key, error = %e, "Tile unavailable");
                None
            }
        })
        .clone()
    }

    /// Whether the tile's outcome is already held in memory.
    pub fn contains(&self, key: TileKey) -> bool {
        self.entries
            .get(&key)
            .is_some_and(|slot| slot.get().is_some())
    }

    fn slot(&self, key: TileKey) -> TileSlot {
        if let Some(slot) = self.entries.get(&key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.entries.entry(key).or_default().value())
    }

    /// Drop every in-memory entry. Files on disk are kept.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> TileStats {
        TileStats {
            memory_hits: self.metrics.memory_hits.load(Ordering::Relaxed),
            disk_loads: self.metrics.disk_loads.load(Ordering::Relaxed),
            fetches: self.metrics.fetches.load(Ordering::Relaxed),
            failures: self.metrics.failures.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn load(&self, key: TileKey) -> Result<RgbaImage, TileError> {
        let path = self.tile_path(key);

        let bytes = if path.exists() {
            self.metrics.disk_loads.fetch_add(1, Ordering::Relaxed);
            fs::read(&path)?
        } else {
            let bytes = self.fetch(key)?;
            self.persist(&path, &bytes);
            bytes
        };

        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    fn fetch(&self, key: TileKey) -> Result<Vec<u8>, HttpError> {
        self.metrics.fetches.fetch_add(1, Ordering::Relaxed);
        let url = self.source.url(key);
        debug!(tile = %key, url = %url, "Fetching tile");
        self.client.get(&url)
    }

    /// Write downloaded bytes to disk. Failures only cost a later refetch.
    fn persist(&self, path: &Path, bytes: &[u8]) {
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(path, bytes));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to write tile to disk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::http::tests::MockHttpClient;
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::sync::{mpsc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn cache_with(
        dir: &TempDir,
        response: Result<Vec<u8>, HttpError>,
    ) -> TileCache<MockHttpClient> {
        TileCache::with_client(
            dir.path(),
            TileSource::new("http://tiles.test/{z}/{x}/{y}.png"),
            MockHttpClient::new(response),
        )
    }

    #[test]
    fn test_miss_fetches_and_persists() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir, Ok(png_bytes(4, 4)));
        let key = TileKey::new(10, 619, 320);

        let image = cache.get(key).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert!(dir.path().join("10").join("619").join("320.png").exists());
        assert_eq!(
            cache.client.urls(),
            vec!["http://tiles.test/10/619/320.png".to_string()]
        );
    }

    #[test]
    fn test_second_request_is_served_from_memory() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir, Ok(png_bytes(2, 2)));
        let key = TileKey::new(3, 1, 1);

        let first = cache.get(key).unwrap();
        let second = cache.get(key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.client.calls(), 1);

        let stats = cache.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_existing_file_skips_network() {
        let dir = TempDir::new().unwrap();
        let key = TileKey::new(5, 7, 9);
        let path = dir.path().join("5").join("7");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("9.png"), png_bytes(3, 3)).unwrap();

        let cache = cache_with(&dir, Err(HttpError::Request("offline".into())));
        assert_eq!(cache.get(key).unwrap().dimensions(), (3, 3));
        assert_eq!(cache.client.calls(), 0);
        assert_eq!(cache.stats().disk_loads, 1);
    }

    #[test]
    fn test_failed_fetch_is_remembered() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(
            &dir,
            Err(HttpError::Status {
                status: 503,
                url: "http://tiles.test".into(),
            }),
        );
        let key = TileKey::new(1, 0, 0);

        assert!(cache.get(key).is_none());
        assert!(cache.get(key).is_none());
        assert_eq!(cache.client.calls(), 1);
        assert!(cache.contains(key));
        assert_eq!(cache.stats().failures, 1);
        assert!(!cache.tile_path(key).exists());
    }

    #[test]
    fn test_undecodable_download_is_placeholder() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir, Ok(b"<html>rate limited</html>".to_vec()));
        let key = TileKey::new(2, 1, 1);

        assert!(cache.get(key).is_none());
        assert_eq!(cache.client.calls(), 1);
        // Bytes are still written; decode failure is not a write failure
        assert!(cache.tile_path(key).exists());
    }

    #[test]
    fn test_clear_forgets_failures() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir, Err(HttpError::Request("offline".into())));
        let key = TileKey::new(1, 1, 0);

        assert!(cache.get(key).is_none());
        cache.clear();
        assert!(!cache.contains(key));
        assert!(cache.get(key).is_none());
        assert_eq!(cache.client.calls(), 2);
    }

    #[test]
    fn test_concurrent_requests_fetch_once() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir, Ok(png_bytes(2, 2)));
        let key = TileKey::new(8, 10, 20);
        let barrier = Barrier::new(8);

        let images: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get(key).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.client.calls(), 1);
        assert!(images.iter().all(|image| Arc::ptr_eq(image, &images[0])));
        assert_eq!(cache.stats().entries, 1);
    }

    /// Client that holds requests for one URL until released.
    struct GatedClient {
        gated_url: String,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
        inner: MockHttpClient,
    }

    impl HttpClient for GatedClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            if url == self.gated_url {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            self.inner.get(url)
        }
    }

    #[test]
    fn test_slow_tile_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let slow = TileKey::new(4, 1, 1);
        let fast = TileKey::new(4, 1, 2);
        let cache = TileCache::with_client(
            dir.path(),
            TileSource::new("http://tiles.test/{z}/{x}/{y}.png"),
            GatedClient {
                gated_url: "http://tiles.test/4/1/1.png".into(),
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
                inner: MockHttpClient::new(Ok(png_bytes(2, 2))),
            },
        );

        thread::scope(|scope| {
            let loading = scope.spawn(|| cache.get(slow));
            entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

            let (done_tx, done_rx) = mpsc::channel();
            scope.spawn(|| {
                let done_tx = done_tx;
                let in_progress = cache.contains(slow);
                let entries = cache.stats().entries;
                let image = cache.get(fast);
                done_tx.send((in_progress, entries, image.is_some())).unwrap();
            });
            let outcome = done_rx.recv_timeout(Duration::from_secs(5));

            release_tx.send(()).unwrap();
            assert!(loading.join().unwrap().is_some());
            assert_eq!(outcome.unwrap(), (false, 1, true));
        });

        assert!(cache.contains(slow));
        assert_eq!(cache.client.inner.calls(), 2);
    }
}
