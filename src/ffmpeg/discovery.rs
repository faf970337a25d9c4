//! FFmpeg/FFprobe binary resolution: explicit env override first, then
//! whatever `PATH` provides.

use std::path::PathBuf;

pub const FFMPEG_ENV: &str = "STREAMIFY_FFMPEG";
pub const FFPROBE_ENV: &str = "STREAMIFY_FFPROBE";

pub fn ffmpeg_path() -> PathBuf {
    resolve(FFMPEG_ENV, "ffmpeg")
}

pub fn ffprobe_path() -> PathBuf {
    resolve(FFPROBE_ENV, "ffprobe")
}

fn resolve(env_key: &str, fallback: &str) -> PathBuf {
    match std::env::var_os(env_key) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(fallback),
    }
}
