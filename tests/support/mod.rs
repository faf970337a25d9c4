#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use streamify_core::error::ExtractError;
use streamify_core::media::{
    EncodedFrame, FrameOpener, FrameSource, MediaSource, SourceMetadata, VideoId,
};

pub const JPEG_MAGIC: [u8; 2] = [0xff, 0xd8];

pub fn source(id: i64) -> MediaSource {
    MediaSource::new(
        VideoId(id),
        format!("http://localhost:8080/api/videos/{id}/stream"),
    )
}

/// Per-source behavior of a stub decode session.
#[derive(Clone)]
pub enum Script {
    /// Capture resolves immediately with these bytes.
    Frame(Vec<u8>),
    /// Capture resolves after a delay.
    SlowFrame(Duration, Vec<u8>),
    /// Metadata never arrives.
    NoMetadata,
    /// Metadata errors out.
    MetadataError(String),
    /// Capture never resolves.
    StallCapture,
}

/// Counts the observable side effects of sessions created by a [`StubOpener`].
#[derive(Default)]
pub struct Recorder {
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Recorder {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

pub struct StubOpener {
    scripts: Mutex<HashMap<i64, Script>>,
    pub recorder: Arc<Recorder>,
}

impl StubOpener {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            recorder: Arc::new(Recorder::default()),
        }
    }

    pub fn script(self, id: i64, script: Script) -> Self {
        self.scripts.lock().insert(id, script);
        self
    }
}

impl FrameOpener for StubOpener {
    type Session = StubSession;

    fn open(&self, source: &MediaSource) -> Result<StubSession, ExtractError> {
        self.recorder.opens.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .get(&source.id.0)
            .cloned()
            .unwrap_or(Script::Frame(JPEG_MAGIC.to_vec()));
        Ok(StubSession {
            script,
            recorder: Arc::clone(&self.recorder),
            released: false,
        })
    }
}

pub struct StubSession {
    script: Script,
    recorder: Arc<Recorder>,
    released: bool,
}

impl StubSession {
    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.recorder.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl FrameSource for StubSession {
    async fn load_metadata(&mut self) -> Result<SourceMetadata, ExtractError> {
        match &self.script {
            Script::NoMetadata => std::future::pending().await,
            Script::MetadataError(msg) => Err(ExtractError::Metadata(msg.clone())),
            _ => Ok(SourceMetadata {
                duration_secs: 30.0,
                width: 1920,
                height: 1080,
            }),
        }
    }

    async fn seek(&mut self, _offset_secs: f64) -> Result<(), ExtractError> {
        Ok(())
    }

    async fn capture(&mut self, _width: u32, _height: u32) -> Result<EncodedFrame, ExtractError> {
        match &self.script {
            Script::Frame(bytes) => Ok(EncodedFrame {
                bytes: bytes.clone(),
                mime: "image/jpeg",
            }),
            Script::SlowFrame(delay, bytes) => {
                tokio::time::sleep(*delay).await;
                Ok(EncodedFrame {
                    bytes: bytes.clone(),
                    mime: "image/jpeg",
                })
            }
            Script::StallCapture => std::future::pending().await,
            Script::NoMetadata | Script::MetadataError(_) => {
                Err(ExtractError::Capture("capture after failed metadata".into()))
            }
        }
    }

    fn release(&mut self) {
        self.release_once();
    }
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.release_once();
    }
}
