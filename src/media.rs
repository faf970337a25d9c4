//! Media data model and the decode-pipeline capability seam. The traits here
//! are the only place the core touches platform media APIs; `crate::ffmpeg`
//! provides the concrete implementation.

use std::future::Future;

use serde::Serialize;

use crate::error::ExtractError;

/// Stable backend identity of a video. Cache keys derive from this, not from
/// the stream URL, so previews survive URL parameter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VideoId(pub i64);

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque locator for a streamable video resource, supplied per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub id: VideoId,
    pub url: String,
    /// Ready-made thumbnail published by the backend, when present. The
    /// pipeline links it directly instead of synthesizing a preview.
    pub thumbnail_url: Option<String>,
}

impl MediaSource {
    pub fn new(id: VideoId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            thumbnail_url: None,
        }
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// Metadata reported by the decode pipeline once the source is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// One still frame, already encoded to an image format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// One exclusive decode session over an attached source. The extractor drives
/// a session through metadata-load, seek, and capture, then releases it.
///
/// Contract for implementors:
/// - `release` must be idempotent; the extractor may call it after `Drop`
///   logic already ran, or vice versa.
/// - `Drop` must also release, so a session abandoned mid-await (consumer
///   cancellation) never leaks the underlying decode resource.
pub trait FrameSource: Send {
    fn load_metadata(
        &mut self,
    ) -> impl Future<Output = Result<SourceMetadata, ExtractError>> + Send;

    fn seek(&mut self, offset_secs: f64) -> impl Future<Output = Result<(), ExtractError>> + Send;

    /// Paints the settled frame onto a `width`×`height` raster and encodes it.
    fn capture(
        &mut self,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<EncodedFrame, ExtractError>> + Send;

    fn release(&mut self);
}

/// Capability to attach a [`MediaSource`] to a decode pipeline. Attaching is
/// cheap; the expensive work happens inside the returned session.
pub trait FrameOpener: Send + Sync {
    type Session: FrameSource;

    fn open(&self, source: &MediaSource) -> Result<Self::Session, ExtractError>;
}

/// Raster surface size for a capture: requested width, height derived from
/// the reported frame aspect. Falls back to 16:9 when dimensions are
/// unreported or zero.
pub fn raster_dims(target_width: u32, meta: &SourceMetadata) -> (u32, u32) {
    let w = target_width.max(1);
    let ratio = if meta.width > 0 && meta.height > 0 {
        meta.height as f64 / meta.width as f64
    } else {
        9.0 / 16.0
    };
    let h = ((w as f64 * ratio).floor() as u32).max(1);
    (w, h)
}
