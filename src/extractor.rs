//! Single-frame extraction: drives one decode session through
//! metadata-load → seek → capture under a hard deadline, with release
//! guaranteed on every exit path.

use std::time::Duration;

use crate::error::ExtractError;
use crate::media::{EncodedFrame, FrameOpener, FrameSource, MediaSource, raster_dims};

/// Seeking right up to the reported duration lands past the last frame on
/// some containers; stay this far short of the end.
const SEEK_END_GUARD_SECS: f64 = 0.1;

/// One preview request. `seek_offset_secs` is clamped against the reported
/// duration before the seek is issued.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub source: MediaSource,
    pub seek_offset_secs: f64,
    pub target_width: u32,
}

/// Outcome of one preview request. Failures are values, not errors: one bad
/// video must not abort previewing the rest of a list. Serializes for
/// session-persisted stores and the frontend.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PreviewResult {
    /// A synthesized still image.
    Image { bytes: Vec<u8>, mime: &'static str },
    /// The backend already published a thumbnail; no synthesis happened.
    Linked { url: String },
    /// Extraction failed; render a placeholder.
    Unavailable { reason: ExtractError },
}

impl PreviewResult {
    pub fn unavailable(reason: ExtractError) -> Self {
        Self::Unavailable { reason }
    }
}

pub(crate) fn clamp_seek_offset(requested: f64, duration_secs: f64) -> f64 {
    if !requested.is_finite() || duration_secs <= 0.0 {
        return 0.0;
    }
    requested
        .max(0.0)
        .min((duration_secs - SEEK_END_GUARD_SECS).max(0.0))
}

/// Extracts one still frame from `request.source`, or reports why it could
/// not. Never runs past `deadline` by more than scheduling jitter; the
/// session is released exactly once whichever exit fires first.
pub async fn extract<O: FrameOpener>(
    opener: &O,
    request: &ExtractionRequest,
    deadline: Duration,
) -> PreviewResult {
    log::debug!(
        target: "streamify::preview",
        "extract: id={} width={} seek={}",
        request.source.id,
        request.target_width,
        request.seek_offset_secs
    );

    let mut session = match opener.open(&request.source) {
        Ok(session) => session,
        Err(reason) => {
            log::warn!(
                target: "streamify::preview",
                "extract: attach failed for id={}: {}",
                request.source.id,
                reason
            );
            return PreviewResult::unavailable(reason);
        }
    };

    let outcome = tokio::time::timeout(deadline, drive(&mut session, request)).await;
    // Timeout already dropped the in-flight stage; this is the one
    // authoritative release for every terminal transition. Implementors keep
    // it idempotent, so the Drop-side release stays a no-op.
    session.release();

    match outcome {
        Ok(Ok(frame)) => PreviewResult::Image {
            bytes: frame.bytes,
            mime: frame.mime,
        },
        Ok(Err(reason)) => {
            log::warn!(
                target: "streamify::preview",
                "extract: id={} failed: {}",
                request.source.id,
                reason
            );
            PreviewResult::unavailable(reason)
        }
        Err(_) => {
            log::warn!(
                target: "streamify::preview",
                "extract: id={} timed out after {:?}",
                request.source.id,
                deadline
            );
            PreviewResult::unavailable(ExtractError::Timeout)
        }
    }
}

async fn drive<S: FrameSource>(
    session: &mut S,
    request: &ExtractionRequest,
) -> Result<EncodedFrame, ExtractError> {
    let meta = session.load_metadata().await?;
    // Zero or negative reported duration: skip seeking, capture the first
    // available frame.
    if meta.duration_secs > 0.0 {
        let offset = clamp_seek_offset(request.seek_offset_secs, meta.duration_secs);
        session.seek(offset).await?;
    }
    let (width, height) = raster_dims(request.target_width, &meta);
    session.capture(width, height).await
}
