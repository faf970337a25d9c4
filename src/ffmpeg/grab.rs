//! Single-frame grab: spawns ffmpeg, reads one MJPEG frame from stdout.
//! The child handle lives in a shared slot so the owning session can kill it
//! from another task on timeout or abandonment.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::error::ExtractError;

use super::discovery::ffmpeg_path;

/// Fixed lossy quality factor for the still image (`-q:v`, 2 = best,
/// 31 = worst). 4 lands near the client's JPEG quality 0.8.
pub const JPEG_QUALITY: u32 = 4;

/// Keep only the last lines of stderr for error reporting.
const STDERR_TAIL_LINES: usize = 3;

/// Lifecycle of the grab child as seen through the shared slot. The slot,
/// not the session flag, is the source of truth: `release` may run before
/// the blocking task has registered the child, and the registration must
/// then kill it on the spot rather than let it run unowned.
pub(super) enum GrabSlot {
    Idle,
    Running(Child),
    Released,
}

pub(super) type ChildSlot = Arc<Mutex<GrabSlot>>;

pub(super) fn new_child_slot() -> ChildSlot {
    Arc::new(Mutex::new(GrabSlot::Idle))
}

/// Registers a freshly spawned child in the slot. If the session was already
/// released the child is killed and reaped immediately and the grab reports
/// itself aborted.
pub(super) fn register_child(slot: &ChildSlot, child: Child) -> Result<(), ExtractError> {
    let mut guard = slot.lock();
    if matches!(*guard, GrabSlot::Released) {
        drop(guard);
        let mut child = child;
        log::warn!(
            target: "streamify::ffmpeg::grab",
            "grab registered after release; killing child"
        );
        if let Err(e) = child.kill() {
            log::warn!(
                target: "streamify::ffmpeg::grab",
                "failed to kill late-registered grab process: {}",
                e
            );
        }
        let _ = child.wait();
        return Err(ExtractError::Capture("grab aborted".into()));
    }
    *guard = GrabSlot::Running(child);
    Ok(())
}

/// Arguments for one frame grab. `-ss` before `-i` is input-side seeking:
/// fast, and settles on the nearest decodable frame.
pub fn build_grab_args(
    url: &str,
    seek_offset_secs: Option<f64>,
    width: u32,
    height: u32,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-v".into(), "error".into(), "-nostdin".into()];
    if let Some(offset) = seek_offset_secs {
        args.push("-ss".into());
        args.push(format!("{offset}"));
    }
    args.extend([
        "-i".into(),
        url.into(),
        "-frames:v".into(),
        "1".into(),
        "-vf".into(),
        format!("scale={width}:{height}"),
        "-f".into(),
        "image2pipe".into(),
        "-c:v".into(),
        "mjpeg".into(),
        "-q:v".into(),
        JPEG_QUALITY.to_string(),
        "pipe:1".into(),
    ]);
    args
}

/// Run the grab and block until the frame is read. The child is registered
/// in `slot` for the duration; if another task empties the slot (release),
/// the grab reports itself aborted instead of a frame.
pub(super) fn run_grab_blocking(args: &[String], slot: &ChildSlot) -> Result<Vec<u8>, ExtractError> {
    let ffmpeg = ffmpeg_path();
    log::debug!(
        target: "streamify::ffmpeg::grab",
        "spawning grab: {} {}",
        ffmpeg.display(),
        args.join(" ")
    );

    let mut child = Command::new(&ffmpeg)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExtractError::Capture(format!("failed to spawn ffmpeg: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExtractError::Capture("failed to capture stdout".into()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExtractError::Capture("failed to capture stderr".into()))?;

    register_child(slot, child)?;

    let stderr_handle = thread::spawn(move || {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    });

    let mut bytes = Vec::new();
    let read_result = stdout.read_to_end(&mut bytes);

    let stderr_text = stderr_handle.join().unwrap_or_default();

    let state = std::mem::replace(&mut *slot.lock(), GrabSlot::Idle);
    let status = match state {
        GrabSlot::Running(mut c) => c
            .wait()
            .map_err(|e| ExtractError::Capture(e.to_string()))?,
        GrabSlot::Released | GrabSlot::Idle => {
            // Release already killed and reaped the child.
            *slot.lock() = GrabSlot::Released;
            log::warn!(
                target: "streamify::ffmpeg::grab",
                "grab process was released externally"
            );
            return Err(ExtractError::Capture("grab aborted".into()));
        }
    };

    read_result.map_err(|e| ExtractError::Capture(e.to_string()))?;

    if !status.success() {
        let tail: Vec<&str> = stderr_text.lines().rev().take(STDERR_TAIL_LINES).collect();
        return Err(ExtractError::Capture(format!(
            "ffmpeg exited with {}: {}",
            status.code().unwrap_or(-1),
            tail.join("; ")
        )));
    }
    if bytes.is_empty() {
        return Err(ExtractError::Capture("no frame decoded".into()));
    }

    log::debug!(
        target: "streamify::ffmpeg::grab",
        "grab complete: {} bytes",
        bytes.len()
    );
    Ok(bytes)
}
