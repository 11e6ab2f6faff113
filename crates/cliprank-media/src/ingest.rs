//! Source video ingest via yt-dlp.
//!
//! Downloads the source video into the job arena, extracts a mono 16 kHz
//! WAV sidecar for the ASR endpoint, and probes the result. The returned
//! [`MediaAsset`] is read-only from here on.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use cliprank_models::{media_id_from_url, MediaAsset};

use crate::command::{require_tool, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// yt-dlp format selector: best mp4-compatible video up to 1080p.
const FORMAT_SELECTOR: &str = "bestvideo[height<=1080]+bestaudio/best[height<=1080]";

/// ASR-side audio: mono 16 kHz PCM, the shape whisper servers expect.
const AUDIO_SAMPLE_RATE: &str = "16000";

/// yt-dlp stderr markers for permanent refusals that must not be retried.
const PERMANENT_MARKERS: &[&str] = &[
    "Private video",
    "Video unavailable",
    "This video is not available",
    "HTTP Error 403",
    "HTTP Error 404",
    "HTTP Error 410",
    "Unsupported URL",
];

/// Fetch a source video to the scratch directory.
///
/// Guarantees on success: the video file exists, carries at least one
/// audio stream, and its probed duration is positive.
pub async fn fetch(source_url: &str, scratch_dir: &Path) -> MediaResult<MediaAsset> {
    require_tool("yt-dlp")?;
    tokio::fs::create_dir_all(scratch_dir).await?;

    let media_id = media_id_from_url(source_url);
    let video_path = scratch_dir.join(format!("{}.mp4", media_id));
    let audio_path = scratch_dir.join(format!("{}.wav", media_id));

    if !video_path.exists() {
        info!(media_id = %media_id, "Downloading source video");
        download_video(source_url, &video_path).await?;
    } else {
        debug!(media_id = %media_id, "Using existing download");
    }

    let info = probe_video(&video_path).await.map_err(|e| {
        MediaError::ingest_failed(format!("Downloaded file failed probe: {}", e))
    })?;

    if info.duration <= 0.0 {
        return Err(MediaError::ingest_refused(
            "Downloaded media has zero duration",
        ));
    }
    if !info.has_audio {
        return Err(MediaError::ingest_refused(
            "Downloaded media has no audio stream",
        ));
    }

    extract_audio_sidecar(&video_path, &audio_path).await?;

    info!(
        media_id = %media_id,
        duration = format!("{:.1}s", info.duration),
        "Ingest complete"
    );

    Ok(MediaAsset {
        id: media_id,
        local_path: video_path,
        audio_path,
        duration_seconds: info.duration,
        sample_rate_hint: info.sample_rate,
    })
}

async fn download_video(source_url: &str, output: &Path) -> MediaResult<()> {
    let output_str = output.to_string_lossy().to_string();
    let result = Command::new("yt-dlp")
        .arg("--format")
        .arg(FORMAT_SELECTOR)
        .arg("--merge-output-format")
        .arg("mp4")
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--output")
        .arg(&output_str)
        .arg(source_url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let cmd_output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::ToolNotFound("yt-dlp".to_string()));
        }
        Err(e) => {
            return Err(MediaError::ingest_failed(format!(
                "yt-dlp execution failed: {}",
                e
            )));
        }
    };

    if !cmd_output.status.success() {
        let stderr = String::from_utf8_lossy(&cmd_output.stderr);
        warn!(stderr = %stderr.trim(), "yt-dlp failed");
        return Err(classify_ytdlp_failure(&stderr));
    }

    if !output.exists() {
        return Err(MediaError::ingest_failed(
            "yt-dlp reported success but produced no file",
        ));
    }

    Ok(())
}

/// Map yt-dlp stderr onto retryable vs permanent ingest failures.
///
/// 408 and 429 stay retryable even though they are 4xx.
fn classify_ytdlp_failure(stderr: &str) -> MediaError {
    let retry_anyway = stderr.contains("HTTP Error 408") || stderr.contains("HTTP Error 429");
    let permanent = !retry_anyway && PERMANENT_MARKERS.iter().any(|m| stderr.contains(m));

    let message = format!(
        "yt-dlp failed: {}",
        stderr.lines().last().unwrap_or("unknown error").trim()
    );
    if permanent {
        MediaError::ingest_refused(message)
    } else {
        MediaError::ingest_failed(message)
    }
}

/// Extract the ASR audio sidecar: mono 16 kHz WAV.
async fn extract_audio_sidecar(video: &Path, audio: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video, audio)
        .no_video()
        .output_arg("-acodec")
        .output_arg("pcm_s16le")
        .output_arg("-ar")
        .output_arg(AUDIO_SAMPLE_RATE)
        .output_arg("-ac")
        .output_arg("1");

    FfmpegRunner::new().run(&cmd).await.map_err(|e| {
        MediaError::ingest_failed(format!("Audio extraction failed: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_classification() {
        let err = classify_ytdlp_failure("ERROR: Private video\n");
        assert!(!err.is_retryable());

        let err = classify_ytdlp_failure("ERROR: HTTP Error 404: Not Found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_throttling_stays_retryable() {
        let err = classify_ytdlp_failure("ERROR: HTTP Error 429: Too Many Requests");
        assert!(err.is_retryable());

        let err = classify_ytdlp_failure("ERROR: HTTP Error 408: Request Timeout");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_network_errors_retryable() {
        let err = classify_ytdlp_failure("ERROR: Unable to download webpage: timed out");
        assert!(err.is_retryable());
    }
}
