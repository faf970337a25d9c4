//! FFmpeg-backed decode pipeline: the concrete [`FrameOpener`] /
//! [`FrameSource`] implementation. Metadata comes from ffprobe; the still
//! frame comes from a single-frame ffmpeg grab to stdout. Process I/O runs
//! on the blocking pool; `release` kills the active child so a timed-out or
//! abandoned extraction never leaks a decoder process.

pub mod discovery;
mod grab;
pub mod probe;

use std::sync::Arc;

use crate::error::ExtractError;
use crate::media::{EncodedFrame, FrameOpener, FrameSource, MediaSource, SourceMetadata, VideoId};

pub use grab::{JPEG_QUALITY, build_grab_args};
use grab::{ChildSlot, GrabSlot, new_child_slot, run_grab_blocking};

/// Opens ffmpeg-backed decode sessions. Stateless; one session per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegOpener;

impl FrameOpener for FfmpegOpener {
    type Session = FfmpegSession;

    fn open(&self, source: &MediaSource) -> Result<FfmpegSession, ExtractError> {
        Ok(FfmpegSession {
            id: source.id,
            url: source.url.clone(),
            seek_offset_secs: None,
            child: new_child_slot(),
            released: false,
        })
    }
}

/// One exclusive ffmpeg decode session. The seek is recorded and handed to
/// ffmpeg as `-ss` at capture time; input-side seeking in a fresh process is
/// how ffmpeg settles on a frame.
pub struct FfmpegSession {
    id: VideoId,
    url: String,
    seek_offset_secs: Option<f64>,
    child: ChildSlot,
    released: bool,
}

impl FrameSource for FfmpegSession {
    async fn load_metadata(&mut self) -> Result<SourceMetadata, ExtractError> {
        let url = self.url.clone();
        tokio::task::spawn_blocking(move || probe::probe_source_blocking(&url))
            .await
            .map_err(|e| ExtractError::Metadata(e.to_string()))?
    }

    async fn seek(&mut self, offset_secs: f64) -> Result<(), ExtractError> {
        self.seek_offset_secs = Some(offset_secs);
        Ok(())
    }

    async fn capture(&mut self, width: u32, height: u32) -> Result<EncodedFrame, ExtractError> {
        let args = build_grab_args(&self.url, self.seek_offset_secs, width, height);
        let slot = Arc::clone(&self.child);
        let bytes = tokio::task::spawn_blocking(move || run_grab_blocking(&args, &slot))
            .await
            .map_err(|e| ExtractError::Capture(e.to_string()))??;
        Ok(EncodedFrame {
            bytes,
            mime: "image/jpeg",
        })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // Mark the slot released first: a grab that registers its child after
        // this point kills it itself instead of running unowned.
        let child = {
            let mut guard = self.child.lock();
            match std::mem::replace(&mut *guard, GrabSlot::Released) {
                GrabSlot::Running(child) => Some(child),
                GrabSlot::Idle | GrabSlot::Released => None,
            }
        };
        if let Some(mut child) = child {
            log::info!(
                target: "streamify::ffmpeg::grab",
                "release: terminating grab process for id={}",
                self.id
            );
            if let Err(e) = child.kill() {
                // Must not mask the result already being returned.
                log::warn!(
                    target: "streamify::ffmpeg::grab",
                    "release: failed to kill grab process for id={}: {}",
                    self.id,
                    e
                );
            }
            let _ = child.wait();
        }
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        self.release();
    }
}
