//! Render plan execution.
//!
//! Each plan becomes one ffmpeg invocation: seek-before-input at the cut
//! start, a portrait reframe + subtitle burn filter chain, AAC audio, and
//! faststart MP4 output. Stream copy is never used; reframing and caption
//! burn both require a re-encode.

use std::path::Path;

use tokio::sync::watch;
use tracing::{info, warn};

use cliprank_models::{EncodingConfig, RenderPlan};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;
use crate::reframe::{build_crop_filter, tracker_for};
use crate::subtitle::{escape_filter_path, write_ass_file};
use crate::thumbnail::generate_thumbnail;

/// Per-clip render timeout (15 minutes).
pub const RENDER_TIMEOUT_SECS: u64 = 15 * 60;

/// Execute a render plan with the given encoder settings.
///
/// On success the output file exists and is non-empty. On failure any
/// partial output is removed and a `RenderFailed` (or `Cancelled`) error
/// is returned; the caller decides whether to retry on the CPU profile.
pub async fn execute_plan(
    plan: &RenderPlan,
    encoding: &EncodingConfig,
    source_sample_rate: Option<u32>,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> MediaResult<()> {
    let source_info = probe_video(&plan.source_path).await?;

    let ass_path = plan.output_path.with_extension("ass");
    write_ass_file(&ass_path, &plan.subtitle_events).await?;

    // The crop geometry comes from the strategy's tracker; the center
    // tracker yields one static rectangle per frame.
    let (width, height) = plan.target_resolution;
    let tracker = tracker_for(plan.crop_strategy);
    let frame_count = ((plan.duration() * plan.target_fps as f64).ceil() as usize).max(1);
    let rects = tracker.plan(source_info.width, source_info.height, frame_count);
    let mut filter = build_crop_filter(&rects, width, height);
    if !plan.subtitle_events.is_empty() {
        filter.push_str(&format!(",ass={}", escape_filter_path(&ass_path)));
    }

    let cmd = FfmpegCommand::new(&plan.source_path, &plan.output_path)
        .seek(plan.cut_start)
        .duration(plan.duration())
        .video_filter(filter)
        .fps(plan.target_fps)
        .output_args(encoding.video_args())
        .output_args(encoding.audio_args(source_sample_rate))
        .faststart();

    let mut runner = FfmpegRunner::new().with_timeout(RENDER_TIMEOUT_SECS);
    if let Some(rx) = cancel_rx {
        runner = runner.with_cancel(rx);
    }

    info!(
        output = %plan.output_path.display(),
        start = format!("{:.2}s", plan.cut_start),
        duration = format!("{:.2}s", plan.duration()),
        "Rendering clip"
    );

    let result = runner.run(&cmd).await;
    tokio::fs::remove_file(&ass_path).await.ok();

    match result {
        Ok(()) => {}
        Err(MediaError::Cancelled) => return Err(MediaError::Cancelled),
        Err(e) => return Err(MediaError::RenderFailed(e.to_string())),
    }

    verify_output(&plan.output_path).await?;

    // Thumbnail next to the clip; failure is not a render failure.
    let thumb_path = plan.output_path.with_extension("jpg");
    if let Err(e) = generate_thumbnail(&plan.output_path, &thumb_path).await {
        warn!("Failed to generate thumbnail: {}", e);
    }

    Ok(())
}

async fn verify_output(path: &Path) -> MediaResult<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| MediaError::RenderFailed(format!("Output missing: {}", path.display())))?;
    if metadata.len() == 0 {
        tokio::fs::remove_file(path).await.ok();
        return Err(MediaError::RenderFailed(format!(
            "Output empty: {}",
            path.display()
        )));
    }
    Ok(())
}
