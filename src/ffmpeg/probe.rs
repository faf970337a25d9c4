//! FFprobe-based source metadata: duration and native frame dimensions.
//! Works against local files and HTTP stream URLs alike.

use std::process::Command;

use serde::Deserialize;

use crate::error::ExtractError;
use crate::media::SourceMetadata;

use super::discovery::ffprobe_path;

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    streams: Option<Vec<ProbeStream>>,
}

/// Parse ffprobe JSON output. Missing fields degrade to zero; the extractor
/// has documented fallbacks for zero duration and zero dimensions.
pub fn parse_probe_json(json: &str) -> Result<SourceMetadata, ExtractError> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ExtractError::Metadata(format!("failed to parse ffprobe JSON: {e}")))?;

    let duration_secs = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let video_stream = output
        .streams
        .as_ref()
        .and_then(|streams| streams.iter().find(|s| s.codec_type.as_deref() == Some("video")));
    let width = video_stream.and_then(|s| s.width).unwrap_or(0);
    let height = video_stream.and_then(|s| s.height).unwrap_or(0);

    Ok(SourceMetadata {
        duration_secs,
        width,
        height,
    })
}

/// Run ffprobe against `url` and return metadata. Blocking; callers wrap in
/// `spawn_blocking`.
pub fn probe_source_blocking(url: &str) -> Result<SourceMetadata, ExtractError> {
    let ffprobe = ffprobe_path();

    log::debug!(
        target: "streamify::ffmpeg::probe",
        "probe: url={}",
        url
    );

    let output = Command::new(&ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            url,
        ])
        .output()
        .map_err(|e| ExtractError::Metadata(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Metadata(format!(
            "ffprobe failed: {}",
            stderr.trim()
        )));
    }

    let json = String::from_utf8(output.stdout)
        .map_err(|_| ExtractError::Metadata("ffprobe output was not valid UTF-8".into()))?;

    parse_probe_json(&json)
}
