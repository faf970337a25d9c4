//! Session-scoped preview cache. Keys derive from the stable video id plus
//! the extraction parameters, never from the stream URL, so a preview
//! survives URL parameter changes within the session.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::extractor::{ExtractionRequest, PreviewResult};
use crate::media::VideoId;

/// Key for one cached preview: (video id, seek offset in ms, target width).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct CacheKey {
    pub id: VideoId,
    pub seek_ms: u64,
    pub width: u32,
}

impl CacheKey {
    pub fn for_request(request: &ExtractionRequest) -> Self {
        Self {
            id: request.source.id,
            seek_ms: seek_ms_from_seconds(request.seek_offset_secs),
            width: request.target_width,
        }
    }
}

fn seek_ms_from_seconds(seek_secs: f64) -> u64 {
    if !seek_secs.is_finite() {
        return 0;
    }
    (seek_secs.max(0.0) * 1000.0).round() as u64
}

/// Session-scoped key/value store for preview results. Entries never expire
/// within a session; `clear` runs at process teardown. `put` on an existing
/// key overwrites, and callers are expected to write once per key.
///
/// A store backed by external session persistence may start empty after a
/// reload; the pipeline treats that as ordinary cache misses.
pub trait PreviewStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<PreviewResult>;
    fn put(&self, key: CacheKey, result: PreviewResult);
    fn clear(&self);
}

/// In-process store: unbounded map behind a mutex. The working set is
/// bounded by the videos viewed in one session, so there is no eviction.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, PreviewResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PreviewStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Option<PreviewResult> {
        self.entries.lock().get(key).cloned()
    }

    fn put(&self, key: CacheKey, result: PreviewResult) {
        log::debug!(
            target: "streamify::cache",
            "put: id={} seek_ms={} width={}",
            key.id,
            key.seek_ms,
            key.width
        );
        self.entries.lock().insert(key, result);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}
