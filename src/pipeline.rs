//! Orchestrates preview requests: cache first, then one extraction at a
//! time, emitting results in input order as each completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::cache::{CacheKey, PreviewStore};
use crate::extractor::{ExtractionRequest, PreviewResult, extract};
use crate::media::{FrameOpener, MediaSource, VideoId};

/// Fixed extraction parameters for a session. Matches the client defaults:
/// frame at 1 s, 320 px wide, 8 s budget per video.
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    pub seek_offset_secs: f64,
    pub target_width: u32,
    pub deadline: Duration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            seek_offset_secs: 1.0,
            target_width: 320,
            deadline: Duration::from_secs(8),
        }
    }
}

/// Sequential preview orchestrator. At most one extraction is in flight at a
/// time: concurrent decode pipelines against the shared raster surface are a
/// correctness and resource hazard, so throughput is traded for safety.
pub struct PreviewPipeline<O: FrameOpener> {
    opener: O,
    store: Arc<dyn PreviewStore>,
    options: PreviewOptions,
}

impl<O: FrameOpener + 'static> PreviewPipeline<O> {
    pub fn new(opener: O, store: Arc<dyn PreviewStore>) -> Self {
        Self::with_options(opener, store, PreviewOptions::default())
    }

    pub fn with_options(opener: O, store: Arc<dyn PreviewStore>, options: PreviewOptions) -> Self {
        Self {
            opener,
            store,
            options,
        }
    }

    pub fn options(&self) -> PreviewOptions {
        self.options
    }

    /// Produces previews for `sources` in order, one at a time. The channel
    /// has capacity 1, so production is consumer-paced; dropping the receiver
    /// stops further extractions and cancels the in-flight one.
    pub fn preview_all(
        self: Arc<Self>,
        sources: Vec<MediaSource>,
    ) -> mpsc::Receiver<(VideoId, PreviewResult)> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            self.run(sources, tx).await;
        });
        rx
    }

    async fn run(&self, sources: Vec<MediaSource>, tx: mpsc::Sender<(VideoId, PreviewResult)>) {
        for source in sources {
            if tx.is_closed() {
                log::debug!(
                    target: "streamify::preview",
                    "preview_all: consumer gone, abandoning remaining sources"
                );
                return;
            }

            let id = source.id;

            // Backend already published a thumbnail: link it through without
            // touching the extractor or the cache.
            if let Some(url) = source.thumbnail_url.clone() {
                if tx.send((id, PreviewResult::Linked { url })).await.is_err() {
                    return;
                }
                continue;
            }

            let request = ExtractionRequest {
                source,
                seek_offset_secs: self.options.seek_offset_secs,
                target_width: self.options.target_width,
            };
            let key = CacheKey::for_request(&request);

            let result = match self.store.get(&key) {
                Some(hit) => {
                    log::info!(
                        target: "streamify::preview",
                        "preview_all: cache hit for id={}",
                        id
                    );
                    hit
                }
                None => {
                    let extraction = extract(&self.opener, &request, self.options.deadline);
                    tokio::pin!(extraction);
                    let result = tokio::select! {
                        result = &mut extraction => result,
                        _ = tx.closed() => {
                            log::debug!(
                                target: "streamify::preview",
                                "preview_all: consumer gone, cancelling extraction for id={}",
                                id
                            );
                            return;
                        }
                    };
                    // Failures are cached too: a broken source stays broken
                    // for the session, and re-driving the decode pipeline at
                    // it is the expensive part.
                    self.store.put(key, result.clone());
                    result
                }
            };

            if tx.send((id, result)).await.is_err() {
                return;
            }
        }
    }
}
