//! Shared fixtures for iterate-engine integration tests
//!
//! - [`wof_tree`] writes a small Who's On First style repository to a temp dir
//! - [`TrackedSource`] wraps a [`MemorySource`] and counts open bodies and
//!   concurrent walks
//! - [`FailingSource`] fails every walk and records when it was called
//! - [`FlakySource`] fails its first walk part way through, then succeeds

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use futures::StreamExt;
use iterate_common::IterateError;
use iterate_engine::sources::MemorySource;
use iterate_engine::wof::id_to_rel_path;
use iterate_engine::{Record, RecordStream, Source};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// First of the `151...` localities in [`wof_tree`]
pub const FIRST_LOCALITY: i64 = 1511838301;

/// Number of `151...` localities in [`wof_tree`]
pub const LOCALITIES: usize = 36;

/// The one region in [`wof_tree`]
pub const REGION: i64 = 1360665043;

/// Install a test subscriber, once
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,iterate_engine=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn locality_ids() -> Vec<i64> {
    (0..LOCALITIES as i64).map(|i| FIRST_LOCALITY + i).collect()
}

fn feature(id: i64, placetype: &str) -> String {
    serde_json::json!({
        "type": "Feature",
        "id": id,
        "properties": {
            "wof:id": id,
            "wof:placetype": placetype,
        },
        "geometry": {"type": "Point", "coordinates": [-122.4, 37.7]}
    })
    .to_string()
}

fn write(root: &Path, rel_path: &str, body: &str) {
    let path = root.join(rel_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

/// A repository with 36 localities and one region under `data/`
pub fn wof_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");

    for id in locality_ids() {
        write(&data, &id_to_rel_path(id), &feature(id, "locality"));
    }
    write(&data, &id_to_rel_path(REGION), &feature(REGION, "region"));

    dir
}

/// Add an alternate geometry next to the first locality
pub fn add_alternate(repo: &TempDir) {
    let rel = id_to_rel_path(FIRST_LOCALITY).replace(
        ".geojson",
        "-alt-quattroshapes.geojson",
    );
    write(
        &repo.path().join("data"),
        &rel,
        &feature(FIRST_LOCALITY, "locality"),
    );
}

/// Body that counts how many instances are still open
struct TrackedBody {
    inner: Cursor<Arc<[u8]>>,
    open: Arc<AtomicUsize>,
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for TrackedBody {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lowers the active walk count when the walk's stream is dropped
struct WalkGuard(Arc<AtomicUsize>);

impl Drop for WalkGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serves `count` records for every URI and tracks open bodies and walks
#[derive(Clone, Default)]
pub struct TrackedSource {
    pub records_per_uri: usize,
    pub opened: Arc<AtomicUsize>,
    pub open: Arc<AtomicUsize>,
    pub active_walks: Arc<AtomicUsize>,
    pub max_active_walks: Arc<AtomicUsize>,
    /// Pause before each record so concurrent walks overlap
    pub delay: std::time::Duration,
}

impl TrackedSource {
    pub fn new(records_per_uri: usize) -> Self {
        Self {
            records_per_uri,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn active_walks(&self) -> usize {
        self.active_walks.load(Ordering::SeqCst)
    }

    pub fn max_active_walks(&self) -> usize {
        self.max_active_walks.load(Ordering::SeqCst)
    }
}

impl Source for TrackedSource {
    fn walk(&self, uri: &str, _cancel: CancellationToken) -> RecordStream {
        let active = self.active_walks.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_walks.fetch_max(active, Ordering::SeqCst);
        let guard = WalkGuard(Arc::clone(&self.active_walks));

        let uri = uri.to_string();
        let opened = Arc::clone(&self.opened);
        let open = Arc::clone(&self.open);
        let delay = self.delay;

        futures::stream::iter(0..self.records_per_uri)
            .then(move |i| {
                let _guard = &guard;
                let path = format!("{uri}/{i}.geojson");
                let opened = Arc::clone(&opened);
                let open = Arc::clone(&open);
                async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    opened.fetch_add(1, Ordering::SeqCst);
                    open.fetch_add(1, Ordering::SeqCst);
                    let body = TrackedBody {
                        inner: Cursor::new(Arc::from(b"{}".to_vec())),
                        open,
                    };
                    Ok(Record::new(path, body))
                }
            })
            .boxed()
    }
}

/// Fails every walk, remembering when each attempt started
#[derive(Clone, Default)]
pub struct FailingSource {
    pub attempts: Arc<Mutex<Vec<Instant>>>,
}

impl FailingSource {
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Source for FailingSource {
    fn walk(&self, uri: &str, _cancel: CancellationToken) -> RecordStream {
        self.attempts.lock().unwrap().push(Instant::now());
        let err = IterateError::read(uri, io::Error::other("connection reset"));
        futures::stream::iter([Err(err)]).boxed()
    }
}

/// Serves `records_per_uri` records per URI, but the first walk of each URI
/// fails after `fail_after` of them
#[derive(Clone, Default)]
pub struct FlakySource {
    pub records_per_uri: usize,
    pub fail_after: usize,
    pub walks: Arc<AtomicUsize>,
    pub open: Arc<AtomicUsize>,
}

impl FlakySource {
    pub fn new(records_per_uri: usize, fail_after: usize) -> Self {
        Self {
            records_per_uri,
            fail_after,
            ..Default::default()
        }
    }

    pub fn walks(&self) -> usize {
        self.walks.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl Source for FlakySource {
    fn walk(&self, uri: &str, _cancel: CancellationToken) -> RecordStream {
        let first = self.walks.fetch_add(1, Ordering::SeqCst) == 0;
        let count = if first {
            self.fail_after
        } else {
            self.records_per_uri
        };

        let mut items: Vec<iterate_common::Result<Record>> = (0..count)
            .map(|i| {
                self.open.fetch_add(1, Ordering::SeqCst);
                let body = TrackedBody {
                    inner: Cursor::new(Arc::from(b"{}".to_vec())),
                    open: Arc::clone(&self.open),
                };
                Ok(Record::new(format!("{uri}/{i}.geojson"), body))
            })
            .collect();

        if first {
            items.push(Err(IterateError::read(uri, io::Error::other("connection reset"))));
        }

        futures::stream::iter(items).boxed()
    }
}

/// A memory source holding `count` records named `{prefix}/{n}.geojson`
pub fn memory_source(prefix: &str, count: usize) -> MemorySource {
    (0..count).fold(MemorySource::new(), |source, i| {
        source.with_file(format!("{prefix}/{i}.geojson"), "{}")
    })
}
