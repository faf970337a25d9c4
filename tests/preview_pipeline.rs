//! Pipeline behavior against a stub decode backend: ordering, caching,
//! cancellation, and failure isolation.

mod support;

use std::sync::Arc;
use std::time::Duration;

use streamify_core::cache::{MemoryStore, PreviewStore};
use streamify_core::error::ExtractError;
use streamify_core::extractor::PreviewResult;
use streamify_core::media::VideoId;
use streamify_core::pipeline::{PreviewOptions, PreviewPipeline};

use support::{JPEG_MAGIC, Script, StubOpener, source};

fn pipeline(opener: StubOpener) -> Arc<PreviewPipeline<StubOpener>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let store: Arc<dyn PreviewStore> = Arc::new(MemoryStore::new());
    Arc::new(PreviewPipeline::new(opener, store))
}

fn pipeline_with_deadline(
    opener: StubOpener,
    deadline: Duration,
) -> Arc<PreviewPipeline<StubOpener>> {
    let store: Arc<dyn PreviewStore> = Arc::new(MemoryStore::new());
    Arc::new(PreviewPipeline::with_options(
        opener,
        store,
        PreviewOptions {
            deadline,
            ..PreviewOptions::default()
        },
    ))
}

async fn collect(
    pipeline: &Arc<PreviewPipeline<StubOpener>>,
    ids: &[i64],
) -> Vec<(VideoId, PreviewResult)> {
    let sources = ids.iter().map(|id| source(*id)).collect();
    let mut rx = Arc::clone(pipeline).preview_all(sources);
    let mut results = Vec::new();
    while let Some(item) = rx.recv().await {
        results.push(item);
    }
    results
}

#[tokio::test]
async fn emits_results_in_input_order() {
    let opener = StubOpener::new()
        .script(1, Script::MetadataError("no stream".into()))
        .script(2, Script::SlowFrame(Duration::from_millis(20), JPEG_MAGIC.to_vec()));
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline(opener);

    let results = collect(&pipeline, &[1, 2, 3]).await;

    let ids: Vec<i64> = results.iter().map(|(id, _)| id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(matches!(results[0].1, PreviewResult::Unavailable { .. }));
    assert!(matches!(results[1].1, PreviewResult::Image { .. }));
    assert!(matches!(results[2].1, PreviewResult::Image { .. }));
    // One bad video does not stop the rest, and every session was released.
    assert_eq!(recorder.opens(), 3);
    assert_eq!(recorder.releases(), 3);
}

#[tokio::test]
async fn second_pass_is_served_entirely_from_cache() {
    let opener = StubOpener::new();
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline(opener);

    let first = collect(&pipeline, &[42]).await;
    let second = collect(&pipeline, &[42]).await;

    assert_eq!(recorder.opens(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn failures_are_cached_and_not_retried() {
    let opener = StubOpener::new().script(9, Script::MetadataError("broken".into()));
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline(opener);

    let first = collect(&pipeline, &[9]).await;
    let second = collect(&pipeline, &[9]).await;

    assert_eq!(recorder.opens(), 1);
    assert!(matches!(first[0].1, PreviewResult::Unavailable { .. }));
    assert_eq!(first, second);
}

#[tokio::test]
async fn published_thumbnail_bypasses_extraction() {
    let opener = StubOpener::new();
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline(opener);

    let sources = vec![source(5).with_thumbnail_url("http://cdn/thumbs/5.jpg")];
    let mut rx = Arc::clone(&pipeline).preview_all(sources);
    let (id, result) = rx.recv().await.unwrap();

    assert_eq!(id, VideoId(5));
    assert_eq!(
        result,
        PreviewResult::Linked {
            url: "http://cdn/thumbs/5.jpg".into()
        }
    );
    assert_eq!(recorder.opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn source_without_metadata_times_out_within_deadline() {
    let opener = StubOpener::new().script(7, Script::NoMetadata);
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline_with_deadline(opener, Duration::from_secs(2));

    let results = collect(&pipeline, &[7]).await;

    assert_eq!(
        results[0].1,
        PreviewResult::Unavailable {
            reason: ExtractError::Timeout
        }
    );
    // No leaked decode session after the timeout.
    assert_eq!(recorder.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn capture_finishing_after_the_deadline_still_times_out() {
    let opener = StubOpener::new().script(
        3,
        Script::SlowFrame(Duration::from_secs(10), JPEG_MAGIC.to_vec()),
    );
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline_with_deadline(opener, Duration::from_secs(2));

    let results = collect(&pipeline, &[3]).await;

    assert_eq!(
        results[0].1,
        PreviewResult::Unavailable {
            reason: ExtractError::Timeout
        }
    );
    // Deadline and capture raced; the loser was dropped and exactly one
    // cleanup happened.
    assert_eq!(recorder.opens(), 1);
    assert_eq!(recorder.releases(), 1);
}

#[tokio::test]
async fn dropping_the_receiver_cancels_the_in_flight_extraction() {
    let opener = StubOpener::new().script(2, Script::StallCapture);
    let recorder = Arc::clone(&opener.recorder);
    let pipeline = pipeline(opener);

    let sources = vec![source(1), source(2), source(3)];
    let mut rx = Arc::clone(&pipeline).preview_all(sources);

    let (id, _) = rx.recv().await.unwrap();
    assert_eq!(id, VideoId(1));

    // Wait until the stalled extraction for id=2 is actually in flight,
    // then walk away.
    while recorder.opens() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    drop(rx);

    let mut waited = Duration::ZERO;
    while recorder.releases() < 2 && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    // Both sessions released, and the third source was never attached.
    assert_eq!(recorder.releases(), 2);
    assert_eq!(recorder.opens(), 2);
}
