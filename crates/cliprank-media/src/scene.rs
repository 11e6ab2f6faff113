//! Content-aware scene cut detection.
//!
//! Runs ffmpeg's scene-change filter over the source and parses cut
//! timestamps from `showinfo` output. Detection failure is non-fatal by
//! contract: callers receive an empty list and the pipeline behaves as if
//! the video had no cuts.

use std::path::Path;
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, warn};

use cliprank_models::SceneCut;

use crate::command::require_tool;
use crate::error::{MediaError, MediaResult};

/// Default scene score threshold. On ffmpeg's 0..1 scene score this keeps
/// talking-head footage at roughly one cut per 90 seconds or fewer.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.4;

/// Detect scene cuts in a media file.
///
/// Returns cut timestamps normalized per the data model (ascending,
/// deduplicated within 0.5s). On any detection failure an empty list is
/// returned and a warning logged; downstream logic must already handle
/// zero cuts.
pub async fn detect_scene_cuts(
    path: impl AsRef<Path>,
    duration_seconds: f64,
    threshold: f64,
) -> Vec<SceneCut> {
    match run_detection(path.as_ref(), duration_seconds, threshold).await {
        Ok(cuts) => {
            info!(count = cuts.len(), "Scene detection complete");
            cuts
        }
        Err(e) => {
            warn!("Scene detection failed, continuing with zero cuts: {}", e);
            Vec::new()
        }
    }
}

async fn run_detection(
    path: &Path,
    duration_seconds: f64,
    threshold: f64,
) -> MediaResult<Vec<SceneCut>> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    require_tool("ffmpeg")?;

    let filter = format!("select='gt(scene,{})',showinfo", threshold);

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-i"])
        .arg(path)
        .args(["-vf", &filter, "-f", "null", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "Scene detection pass failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let times = parse_showinfo_times(&stderr);
    debug!(raw = times.len(), "Parsed scene-change frames");

    Ok(SceneCut::normalize(times, duration_seconds))
}

/// Pull `pts_time` values out of showinfo stderr lines.
fn parse_showinfo_times(stderr: &str) -> Vec<f64> {
    let re = Regex::new(r"pts_time:\s*([0-9]+(?:\.[0-9]+)?)").expect("static regex");
    stderr
        .lines()
        .filter(|line| line.contains("Parsed_showinfo"))
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_showinfo_times() {
        let stderr = "\
[Parsed_showinfo_1 @ 0x55] n:   0 pts:  12345 pts_time:12.345 duration_time:0.04\n\
[Parsed_showinfo_1 @ 0x55] n:   1 pts:  99999 pts_time:99.9 duration_time:0.04\n\
frame=  100 fps=25 q=-0.0 size=N/A\n";
        let times = parse_showinfo_times(stderr);
        assert_eq!(times.len(), 2);
        assert!((times[0] - 12.345).abs() < 1e-9);
        assert!((times[1] - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ignores_unrelated_lines() {
        let stderr = "Stream #0:0 pts_time:3.0 something\n";
        assert!(parse_showinfo_times(stderr).is_empty());
    }
}
